use std::env;

use anyhow::{Result, bail};
use stock_morphy::Singularizer;

fn main() -> Result<()> {
    let mut args = env::args().skip(1).peekable();
    let mut exceptions = None;
    if let Some(arg) = args.peek()
        && let Some(path) = arg.strip_prefix("--exceptions=")
    {
        exceptions = Some(path.to_string());
        args.next();
    }

    let words: Vec<String> = args.collect();
    let words = if words.is_empty() {
        bail!(
            "usage: cargo run -p stock-morphy --example singularize -- [--exceptions=<file>] <word>..."
        );
    } else if words.len() == 1 && words[0] == "--demo" {
        ["onions", "berries", "tomatoes", "leaves", "hummus", "glasses"]
            .map(String::from)
            .to_vec()
    } else {
        words
    };

    let singularizer = match exceptions {
        Some(path) => Singularizer::load(&path)?,
        None => Singularizer::new(),
    };

    for word in words {
        let word = word.to_lowercase();
        println!("\nSurface: {}", word);
        println!("  singular: {}", singularizer.singular(&word));
        for variant in singularizer.variants(&word) {
            println!("    {:<12} [{:?}]", variant.text, variant.source);
        }
    }

    Ok(())
}
