use outreach_cli::commands::targets;
use std::io::Write;

fn write_csv(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("targets.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn test_inspect_normalizes_and_skips_bad_rows() {
    let (_dir, path) = write_csv(
        "profile,full_name\n\
         example.com/in/jane-doe?src=csv,Jane Doe\n\
         ,\n\
         https://example.com/in/john-roe/,John Roe\n",
    );

    let loaded = targets::inspect_targets(&path, "profile", Some("full_name")).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].profile_url, "https://example.com/in/jane-doe");
    assert_eq!(loaded[1].profile_url, "https://example.com/in/john-roe");
    assert_eq!(loaded[0].display_name(), "Jane Doe");

    targets::execute(&path, "profile", Some("full_name")).unwrap();
}

#[test]
fn test_inspect_falls_back_to_url_like_column() {
    let (_dir, path) = write_csv(
        "linkedin_url\n\
         https://example.com/in/jane-doe\n",
    );

    let loaded = targets::inspect_targets(&path, "profile", None).unwrap();
    assert_eq!(loaded.len(), 1);
}

#[test]
fn test_inspect_reports_missing_column() {
    let (_dir, path) = write_csv("name\nJane\n");
    assert!(targets::inspect_targets(&path, "profile", None).is_err());
}
