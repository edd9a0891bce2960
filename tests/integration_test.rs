use printpdf::lopdf::Document;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pimaco-labels"))
}

fn output_dir() -> &'static Path {
    Path::new("tests/output")
}

fn setup() {
    fs::create_dir_all(output_dir()).expect("Failed to create output directory");
}

fn cleanup_file(name: &str) -> PathBuf {
    let path = output_dir().join(name);
    if path.exists() {
        fs::remove_file(&path).ok();
    }
    path
}

/// Runs the binary against a private community list.
fn run(registry: &Path, args: &[&str]) -> Output {
    cargo_bin()
        .arg("--communities-file")
        .arg(registry)
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn assert_pdf(path: &Path) {
    assert!(path.exists(), "PDF file was not created");
    let bytes = fs::read(path).expect("Failed to read PDF");
    assert!(bytes.starts_with(b"%PDF"), "output is not a PDF");
    assert!(bytes.len() > 1000, "PDF file is too small, likely empty or corrupt");
}

fn pdf_pages(path: &Path) -> usize {
    Document::load(path).expect("Failed to parse PDF").get_pages().len()
}

fn write_roster_xlsx(path: &Path, members: usize) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    sheet.write_string(0, 0, "Paróquia São José - Dizimistas").unwrap();
    sheet.write_string(2, 0, "Nome do Dizimista").unwrap();
    sheet.write_string(2, 1, "Código Dizimista").unwrap();
    sheet.write_string(2, 2, "Comunidade").unwrap();

    for i in 0..members {
        let row = 3 + i as u32;
        sheet.write_string(row, 0, &format!("membro número {}", i + 1)).unwrap();
        sheet.write_number(row, 1, 1000.0 + i as f64).unwrap();
        sheet.write_string(row, 2, "capela são jorge").unwrap();
    }

    workbook.save(path).unwrap();
}

#[test]
fn test_manual_entries() {
    setup();
    let scratch = tempfile::tempdir().unwrap();
    let path = cleanup_file("test-manual-entries.pdf");

    let output = run(
        &scratch.path().join("communities.json"),
        &[
            "generate",
            "--entry", "5; João da Silva; 1234",
            "--entry", "2; Maria Souza",
            "-c", "Matriz",
            "-o", path.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_pdf(&path);
    let out = stdout(&output);
    assert!(out.contains("Labels: 2 (5 cells)"), "unexpected output: {}", out);
    assert!(out.contains("Pages: 1"));
    assert_eq!(pdf_pages(&path), 1);
}

#[test]
fn test_manual_file() {
    setup();
    let scratch = tempfile::tempdir().unwrap();
    let path = cleanup_file("test-manual-file.pdf");

    let output = run(
        &scratch.path().join("communities.json"),
        &[
            "generate",
            "-m", "tests/fixtures/manual.txt",
            "-c", "CAPELA SÃO JOSÉ",
            "-o", path.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_pdf(&path);
    assert!(stdout(&output).contains("Labels: 3 (7 cells)"));
}

#[test]
fn test_manual_from_stdin() {
    setup();
    let scratch = tempfile::tempdir().unwrap();
    let path = cleanup_file("test-manual-stdin.pdf");

    let mut child = cargo_bin()
        .arg("--communities-file")
        .arg(scratch.path().join("communities.json"))
        .args(["generate", "-m", "-", "-o", path.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all("1;ana;10\n2;bia;11\n".as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_pdf(&path);
}

#[test]
fn test_position_out_of_range() {
    let scratch = tempfile::tempdir().unwrap();
    let output = run(
        &scratch.path().join("communities.json"),
        &[
            "generate",
            "--entry", "1; Ana",
            "--entry", "34; Bia",
            "-o", "tests/output/should-not-exist.pdf",
        ],
    );

    assert!(!output.status.success(), "Command should have failed for position 34");
    let err = stderr(&output);
    assert!(err.contains("Line 2"), "unexpected error: {}", err);
    assert!(err.contains("between 1 and 33"));
}

#[test]
fn test_bad_position_format() {
    let scratch = tempfile::tempdir().unwrap();
    let output = run(
        &scratch.path().join("communities.json"),
        &["generate", "--entry", "five; Ana", "-o", "tests/output/should-not-exist.pdf"],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Line 1: position must be a number"));
}

#[test]
fn test_unknown_community() {
    let scratch = tempfile::tempdir().unwrap();
    let output = run(
        &scratch.path().join("communities.json"),
        &[
            "generate",
            "--entry", "1; Ana",
            "-c", "Capela Inexistente",
            "-o", "tests/output/should-not-exist.pdf",
        ],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Community not found"));
}

#[test]
fn test_spreadsheet_multi_page() {
    setup();
    let scratch = tempfile::tempdir().unwrap();
    let xlsx = scratch.path().join("dizimistas.xlsx");
    write_roster_xlsx(&xlsx, 40);
    let path = cleanup_file("test-spreadsheet.pdf");

    let output = run(
        &scratch.path().join("communities.json"),
        &["generate", "-e", xlsx.to_str().unwrap(), "-o", path.to_str().unwrap()],
    );

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_pdf(&path);
    let out = stdout(&output);
    assert!(out.contains("Labels: 40 (40 cells)"), "unexpected output: {}", out);
    assert!(out.contains("Pages: 2"));
    assert_eq!(pdf_pages(&path), 2);
}

#[test]
fn test_spreadsheet_two_full_sheets() {
    setup();
    let scratch = tempfile::tempdir().unwrap();
    let xlsx = scratch.path().join("dizimistas-66.xlsx");
    write_roster_xlsx(&xlsx, 66);
    let path = cleanup_file("test-spreadsheet-66.pdf");

    let output = run(
        &scratch.path().join("communities.json"),
        &["generate", "-e", xlsx.to_str().unwrap(), "-o", path.to_str().unwrap()],
    );

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("Pages: 2"));
    assert_eq!(pdf_pages(&path), 2, "a full last sheet must not add an empty page");
}

#[test]
fn test_spreadsheet_without_header() {
    let scratch = tempfile::tempdir().unwrap();
    let xlsx = scratch.path().join("no-header.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Membro").unwrap();
    sheet.write_string(1, 0, "Ana").unwrap();
    workbook.save(&xlsx).unwrap();

    let output = run(
        &scratch.path().join("communities.json"),
        &["generate", "-e", xlsx.to_str().unwrap(), "-o", "tests/output/should-not-exist.pdf"],
    );

    assert!(!output.status.success(), "Command should have failed without a NOME header");
    assert!(stderr(&output).contains("'NOME' not found"));
}

#[test]
fn test_missing_spreadsheet() {
    let scratch = tempfile::tempdir().unwrap();
    let output = run(
        &scratch.path().join("communities.json"),
        &["generate", "-e", "nonexistent.xlsx", "-o", "tests/output/should-not-exist.pdf"],
    );

    assert!(!output.status.success(), "Command should have failed for missing spreadsheet");
}

#[test]
fn test_source_is_required() {
    let scratch = tempfile::tempdir().unwrap();
    let output = run(&scratch.path().join("communities.json"), &["generate"]);

    assert!(!output.status.success());
}

#[test]
fn test_community_management() {
    let scratch = tempfile::tempdir().unwrap();
    let registry = scratch.path().join("config").join("communities.json");

    let output = run(&registry, &["communities", "add", "capela nova"]);
    assert!(output.status.success(), "add failed: {:?}", output);
    assert!(registry.exists(), "community list was not saved");

    let output = run(&registry, &["communities", "rename", "matriz", "Matriz Central"]);
    assert!(output.status.success(), "rename failed: {:?}", output);

    let output = run(&registry, &["communities", "remove", "VAZIO"]);
    assert!(output.status.success(), "remove failed: {:?}", output);

    let output = run(&registry, &["communities", "list"]);
    let listing = stdout(&output);
    assert!(listing.contains("CAPELA NOVA"));
    assert!(listing.contains(" 10. MATRIZ CENTRAL"), "unexpected listing: {}", listing);
    assert!(!listing.contains("VAZIO"));

    // renamed community is usable for generation
    setup();
    let path = cleanup_file("test-renamed-community.pdf");
    let output = run(
        &registry,
        &["generate", "--entry", "1; Ana", "-c", "matriz central", "-o", path.to_str().unwrap()],
    );
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_pdf(&path);
}

#[test]
fn test_duplicate_community_rejected() {
    let scratch = tempfile::tempdir().unwrap();
    let registry = scratch.path().join("communities.json");

    let output = run(&registry, &["communities", "add", "Matriz"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("already exists"));
}

#[test]
fn test_spreadsheet_ignores_broken_community_list() {
    setup();
    let scratch = tempfile::tempdir().unwrap();
    let registry = scratch.path().join("communities.json");
    fs::write(&registry, "{ not json").unwrap();
    let xlsx = scratch.path().join("dizimistas.xlsx");
    write_roster_xlsx(&xlsx, 3);
    let path = cleanup_file("test-broken-registry.pdf");

    let output = run(
        &registry,
        &["generate", "-e", xlsx.to_str().unwrap(), "-o", path.to_str().unwrap()],
    );
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert_pdf(&path);

    // manual entry needs the list to resolve the community
    let output = run(
        &registry,
        &["generate", "--entry", "1; Ana", "-o", "tests/output/should-not-exist.pdf"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read community list"));
}
