use std::io::Write;

use stock_morphy::Singularizer;

#[test]
fn loads_pairs_and_skips_comments() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "# plural singular").unwrap();
    writeln!(file, "Radishes radish").unwrap();
    writeln!(file, "edamames edamame  # trailing comment").unwrap();
    writeln!(file, "lonely").unwrap();
    writeln!(file).unwrap();

    let s = Singularizer::load(file.path()).expect("load exceptions");
    assert_eq!(s.singular("radishes"), "radish");
    assert_eq!(s.singular("edamames"), "edamame");
    assert_eq!(s.singular("lonely"), "lonely");
    assert!(s.variants("edamame").iter().any(|v| v.text == "edamames"));
}

#[test]
fn missing_file_falls_back_to_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let s = Singularizer::load(dir.path().join("absent.exc")).expect("missing is fine");
    assert_eq!(s.singular("leaves"), "leaf");
    assert_eq!(s.singular("onions"), "onion");
}
