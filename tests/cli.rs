use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::process::{Command, Output};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const DOC_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<w:body>"#;

fn text_para(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}

fn image_para(rel_id: &str) -> String {
    format!("<w:p><w:r><w:drawing><a:blip r:embed=\"{}\"/></w:drawing></w:r></w:p>", rel_id)
}

/// CHƯƠNG I / Bài 1.1 / [A] / Hình 1.1 / [B], then a table cell with [C] and a dangling id.
fn write_sample_docx(path: &Path) {
    let cell = format!("{}{}", image_para("rId3"), image_para("rId99"));
    let body = [
        text_para("CHƯƠNG I"),
        text_para("Bài 1.1 Cho tập hợp"),
        image_para("rId1"),
        text_para("Hình 1.1 minh họa"),
        image_para("rId2"),
        format!("<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>", cell),
    ]
    .concat();
    write_docx(path, &body);
}

fn write_docx(path: &Path, body: &str) {
    let document = format!("{}{}</w:body></w:document>", DOC_HEAD, body);
    let rels = r#"<?xml version="1.0"?>
        <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
        <Relationship Id="rId1" Type="image" Target="media/image1.png"/>
        <Relationship Id="rId2" Type="image" Target="media/image2.jpeg"/>
        <Relationship Id="rId3" Type="image" Target="media/image3.png"/>
        </Relationships>"#;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    let parts: [(&str, &[u8]); 5] = [
        ("word/document.xml", document.as_bytes()),
        ("word/_rels/document.xml.rels", rels.as_bytes()),
        ("word/media/image1.png", b"A"),
        ("word/media/image2.jpeg", b"B"),
        ("word/media/image3.png", b"C"),
    ];
    for (name, data) in parts {
        zip.start_file(name, options).expect("start part");
        zip.write_all(data).expect("write part");
    }
    let bytes = zip.finish().expect("finish zip").into_inner();
    fs::write(path, bytes).expect("write docx");
}

fn run(args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_image_labeler"))
        .args(args)
        .env_remove("IMAGE_LABELER_MARKER")
        .env_remove("IMAGE_LABELER_OUTPUT")
        .output()
        .expect("run CLI");
    assert!(
        output.status.success(),
        "cli exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

fn sorted_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn read_report(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).expect("read report")).expect("report json")
}

#[test]
fn cli_preview_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let docx = dir.path().join("Toan 6 ruot.docx");
    write_sample_docx(&docx);

    let output = run(&["preview", docx.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("01 - Toan 6- KNTT  - Bài 1.1.png"), "{}", stdout);
    assert!(stdout.contains("02 - Toan 6- KNTT  - Hình 1.1.jpeg"), "{}", stdout);
    assert!(stdout.contains("03 - Toan 6- KNTT  - Hình 1.1.png"), "{}", stdout);
    assert!(stdout.contains("UNRESOLVED rId99"), "{}", stdout);
    assert_eq!(sorted_names(dir.path()), vec!["Toan 6 ruot.docx"]);
}

#[test]
fn cli_preview_writes_requested_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let docx = dir.path().join("Toan 6 ruot.docx");
    let report = dir.path().join("preview.json");
    write_sample_docx(&docx);

    run(&["preview", docx.to_str().unwrap(), "--report", report.to_str().unwrap()]);

    let value = read_report(&report);
    assert_eq!(value["kind"], "preview");
    assert_eq!(value["report"]["images"].as_array().unwrap().len(), 3);
    assert_eq!(value["report"]["images"][1]["file_name"], "02 - Toan 6- KNTT  - Hình 1.1.jpeg");
    assert_eq!(value["report"]["unresolved"].as_array().unwrap().len(), 1);
}

#[test]
fn cli_extract_without_images_still_writes_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let docx = dir.path().join("Empty ruot.docx");
    let report = dir.path().join("extract.json");
    // The only image sits in a title paragraph, so nothing is collected
    let title_with_image = "<w:p><w:r><w:t>CHƯƠNG I</w:t></w:r>\
        <w:r><w:drawing><a:blip r:embed=\"rId1\"/></w:drawing></w:r></w:p>";
    write_docx(&docx, &[title_with_image, &text_para("Lời mở đầu")].concat());

    run(&[
        "extract",
        docx.to_str().unwrap(),
        "--output-dir",
        dir.path().join("images").to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);

    let value = read_report(&report);
    assert_eq!(value["kind"], "extract");
    assert_eq!(value["report"]["total"], 0);
    assert_eq!(value["report"]["skipped"].as_array().unwrap().len(), 1);
    assert!(!dir.path().join("images").exists());
}

#[test]
fn cli_extract_then_rename() {
    let dir = tempfile::tempdir().expect("tempdir");
    let docx = dir.path().join("Toan 6 ruot(TB2025).docx");
    let images = dir.path().join("images");
    let report = dir.path().join("extract.json");
    write_sample_docx(&docx);

    run(&[
        "extract",
        docx.to_str().unwrap(),
        "--output-dir",
        images.to_str().unwrap(),
        "--report",
        report.to_str().unwrap(),
    ]);

    assert_eq!(
        sorted_names(&images),
        vec![
            "01 - Toan 6- KNTT  - Bài 1.1.png",
            "02 - Toan 6- KNTT  - Hình 1.1.jpeg",
            "03 - Toan 6- KNTT  - Hình 1.1.png",
        ]
    );
    assert_eq!(fs::read(images.join("02 - Toan 6- KNTT  - Hình 1.1.jpeg")).unwrap(), b"B");

    let value = read_report(&report);
    assert_eq!(value["report"]["total"], 4);
    assert_eq!(value["report"]["failures"].as_array().unwrap().len(), 1);

    let metadata = dir.path().join("code.json");
    fs::write(
        &metadata,
        r#"[{"filename": "T6_Bài 1.1"},
            {"filename": "T6_Hình 1.1"},
            {"filename": "T6_Hình 1.1_dup"}]"#,
    )
    .unwrap();

    let dry_report = dir.path().join("dry.json");
    let dry = run(&[
        "rename",
        images.to_str().unwrap(),
        metadata.to_str().unwrap(),
        "--dry-run",
        "--report",
        dry_report.to_str().unwrap(),
    ]);
    assert!(String::from_utf8_lossy(&dry.stdout).contains("-> T6_Bài 1.1.png"));
    assert_eq!(sorted_names(&images).len(), 3);
    let value = read_report(&dry_report);
    assert_eq!(value["report"]["dry_run"], true);
    assert_eq!(value["report"]["renamed"].as_array().unwrap().len(), 3);

    run(&["rename", images.to_str().unwrap(), metadata.to_str().unwrap()]);
    // Both figure images map to the same stem but keep their own extensions
    assert_eq!(
        sorted_names(&images),
        vec!["T6_Bài 1.1.png", "T6_Hình 1.1.jpeg", "T6_Hình 1.1.png"]
    );

    // Second run has nothing left to do
    let again = dir.path().join("rename.json");
    run(&[
        "rename",
        images.to_str().unwrap(),
        metadata.to_str().unwrap(),
        "--report",
        again.to_str().unwrap(),
    ]);
    let value = read_report(&again);
    assert_eq!(value["report"]["renamed"].as_array().unwrap().len(), 0);
    assert_eq!(value["report"]["already_named"].as_array().unwrap().len(), 3);
}

#[test]
fn cli_rename_rejects_bad_metadata() {
    let dir = tempfile::tempdir().expect("tempdir");
    let metadata = dir.path().join("code.json");
    fs::write(&metadata, "not json").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_image_labeler"))
        .args(["rename", dir.path().to_str().unwrap(), metadata.to_str().unwrap()])
        .output()
        .expect("run CLI");
    assert!(!output.status.success());
}
