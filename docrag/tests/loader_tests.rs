//! Directory loader tests over real temporary files.

use std::fs;

use docrag::loader::DocumentLoader;

#[test]
fn missing_directory_fails_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    assert!(DocumentLoader::new(missing).is_err());
}

#[test]
fn file_path_is_rejected_as_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    fs::write(&file, "content").unwrap();
    assert!(DocumentLoader::new(file).is_err());
}

#[test]
fn empty_directory_loads_zero_documents() {
    let dir = tempfile::tempdir().unwrap();
    let report = DocumentLoader::new(dir.path()).unwrap().load_all().unwrap();
    assert!(report.documents.is_empty());
    assert!(report.skipped.is_empty());
    assert!(report.failed.is_empty());
}

#[test]
fn text_and_markdown_files_load_with_metadata() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "some plain notes").unwrap();
    fs::write(dir.path().join("readme.md"), "# Title\n\nBody text").unwrap();

    let report = DocumentLoader::new(dir.path()).unwrap().load_all().unwrap();
    assert_eq!(report.documents.len(), 2);

    let md = report.documents.iter().find(|d| d.metadata["file_name"] == "readme.md").unwrap();
    assert_eq!(md.metadata["file_type"], "markdown");
    assert!(md.metadata["source_file"].ends_with("readme.md"));
    assert!(md.content.contains("Body text"));
}

#[test]
fn csv_rows_become_lines() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("table.csv"), "name,age\nalice,30\nbob,25\n").unwrap();

    let report = DocumentLoader::new(dir.path()).unwrap().load_all().unwrap();
    assert_eq!(report.documents.len(), 1);
    let content = &report.documents[0].content;
    assert!(content.contains("name, age"));
    assert!(content.contains("alice, 30"));
    assert!(content.contains("bob, 25"));
}

#[test]
fn json_is_loaded_as_rendered_text() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("data.json"), r#"{"city": "Oslo", "population": 700000}"#).unwrap();

    let report = DocumentLoader::new(dir.path()).unwrap().load_all().unwrap();
    assert_eq!(report.documents.len(), 1);
    assert!(report.documents[0].content.contains("Oslo"));
    assert_eq!(report.documents[0].metadata["file_type"], "json");
}

#[test]
fn html_markup_is_stripped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("page.html"),
        "<html><body><h1>Heading</h1><p>Paragraph text.</p></body></html>",
    )
    .unwrap();

    let report = DocumentLoader::new(dir.path()).unwrap().load_all().unwrap();
    assert_eq!(report.documents.len(), 1);
    let content = &report.documents[0].content;
    assert!(content.contains("Heading"));
    assert!(content.contains("Paragraph text."));
    assert!(!content.contains("<p>"));
}

#[test]
fn unsupported_extension_is_skipped_with_siblings_loaded() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("keep.txt"), "keep me").unwrap();
    fs::write(dir.path().join("binary.exe"), [0u8, 1, 2]).unwrap();

    let report = DocumentLoader::new(dir.path()).unwrap().load_all().unwrap();
    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].ends_with("binary.exe"));
}

#[test]
fn parse_failure_is_isolated_to_its_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("good.txt"), "fine").unwrap();
    fs::write(dir.path().join("broken.json"), "{not valid json").unwrap();

    let report = DocumentLoader::new(dir.path()).unwrap().load_all().unwrap();
    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("broken.json"));
    assert!(!report.failed[0].1.is_empty());
}

#[test]
fn nested_directories_are_walked() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("deep.txt"), "deep content").unwrap();
    fs::write(dir.path().join("top.txt"), "top content").unwrap();

    let report = DocumentLoader::new(dir.path()).unwrap().load_all().unwrap();
    assert_eq!(report.documents.len(), 2);
}

#[test]
fn statistics_count_by_support_and_type() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "x").unwrap();
    fs::write(dir.path().join("b.md"), "y").unwrap();
    fs::write(dir.path().join("c.exe"), "z").unwrap();

    let stats = DocumentLoader::new(dir.path()).unwrap().file_statistics().unwrap();
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.supported_files, 2);
    assert_eq!(stats.unsupported_files, 1);
    assert_eq!(stats.files_by_type["text"], 1);
    assert_eq!(stats.files_by_type["markdown"], 1);
}

#[test]
fn supported_extensions_cover_the_advertised_formats() {
    let extensions = DocumentLoader::supported_extensions();
    for ext in ["pdf", "txt", "md", "csv", "json", "html", "xlsx", "docx", "pptx"] {
        assert!(extensions.contains(&ext), "missing extension: {ext}");
    }
}
