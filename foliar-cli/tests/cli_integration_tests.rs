//! Integration tests for the foliar CLI
//!
//! Each test spawns the built binary against a fixture PDF assembled with
//! lopdf in a temporary directory.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Test helper to get the CLI binary path
fn get_cli_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    if path.ends_with("deps") {
        path.pop(); // Remove "deps" directory
    }
    path.push("foliar");
    #[cfg(windows)]
    path.set_extension("exe");
    path
}

fn setup_temp_dir() -> TempDir {
    tempdir().expect("Failed to create temp directory")
}

fn run_cli_command(args: &[&str]) -> std::process::Output {
    Command::new(get_cli_path())
        .args(args)
        .output()
        .expect("Failed to run CLI")
}

/// Write a minimal PDF with `page_count` US Letter pages.
fn write_fixture(path: &Path, page_count: usize) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..page_count)
        .map(|index| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("page {}", index + 1))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]));
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_count as i64)),
            ("Kids", Object::Array(kids)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    fs::write(path, bytes).unwrap();
}

fn assert_pdf_exists_and_valid(path: &Path) {
    assert!(path.exists(), "PDF file should exist: {}", path.display());
    let content = fs::read(path).expect("Failed to read PDF file");
    assert!(
        content.starts_with(b"%PDF-"),
        "File should start with PDF header"
    );
}

#[test]
fn test_cli_stamp_command() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("input.pdf");
    let output = temp_dir.path().join("stamped.pdf");
    let logs = temp_dir.path().join("logs");
    write_fixture(&input, 4);

    let result = run_cli_command(&[
        "stamp",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--log-dir",
        logs.to_str().unwrap(),
    ]);

    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert_pdf_exists_and_valid(&output);

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Stamped 4 pages"));
    assert!(stdout.contains("0001"));
    assert!(stdout.contains("0004"));

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 4);
}

#[test]
fn test_cli_stamp_with_range_and_style() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("input.pdf");
    let output = temp_dir.path().join("stamped.pdf");
    let logs = temp_dir.path().join("logs");
    write_fixture(&input, 6);

    let result = run_cli_command(&[
        "stamp",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--start-page",
        "2",
        "--end-page",
        "4",
        "--start-number",
        "10",
        "--corner",
        "top-left",
        "--orientation",
        "vertical",
        "--log-dir",
        logs.to_str().unwrap(),
    ]);

    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert_pdf_exists_and_valid(&output);

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Stamped 3 pages"));
    assert!(stdout.contains("0010"));
    assert!(stdout.contains("0012"));
}

#[test]
fn test_cli_stamp_invalid_range_fails() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("input.pdf");
    let output = temp_dir.path().join("stamped.pdf");
    let logs = temp_dir.path().join("logs");
    write_fixture(&input, 10);

    let result = run_cli_command(&[
        "stamp",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--start-page",
        "5",
        "--end-page",
        "3",
        "--log-dir",
        logs.to_str().unwrap(),
    ]);

    assert!(!result.status.success());
    assert!(!output.exists());

    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("selects no pages"));
}

#[test]
fn test_cli_stamp_missing_input_fails() {
    let temp_dir = setup_temp_dir();
    let output = temp_dir.path().join("stamped.pdf");

    let logs = temp_dir.path().join("logs");
    let result = run_cli_command(&[
        "stamp",
        temp_dir.path().join("nope.pdf").to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--log-dir",
        logs.to_str().unwrap(),
    ]);

    assert!(!result.status.success());
    assert!(!output.exists());
}

#[test]
fn test_cli_info_command() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("input.pdf");
    write_fixture(&input, 3);

    let result = run_cli_command(&["info", input.to_str().unwrap()]);

    assert!(result.status.success());
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Pages:     3"));
    assert!(stdout.contains("Encrypted: no"));
}

#[test]
fn test_cli_rejects_unknown_corner() {
    let temp_dir = setup_temp_dir();
    let input = temp_dir.path().join("input.pdf");
    let output = temp_dir.path().join("stamped.pdf");
    write_fixture(&input, 1);

    let result = run_cli_command(&[
        "stamp",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--corner",
        "middle",
    ]);

    assert!(!result.status.success());
}
