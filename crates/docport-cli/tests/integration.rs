//! Integration tests for the docport CLI
//!
//! These run the export command against rendered editor pages written to a
//! temporary directory.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use docport_cli::{export_command, load_tree, ExportArgs};
use docport_core::{ExportFormat, ExportOutcome};
use docport_ooxml::Package;
use docport_snapshot::decode_data_uri;
use tempfile::TempDir;

// 1x1 transparent PNG
const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Editor</title></head>
<body>
<nav><button>Export PDF</button><button>Export DOCX</button></nav>
<div id="editor" class="bn-container" data-mantine-color-scheme="light">
  <div class="bn-block-content" data-content-type="heading"><h2>Meeting notes</h2></div>
  <div class="bn-block-content" data-content-type="paragraph"><p>Attendees: all</p></div>
  <div class="bn-block-content" data-content-type="bulletListItem"><p>Budget</p></div>
  <div class="bn-block-content" data-content-type="image"><img src="images/dot.png" width="40"></div>
</div>
</body></html>"#;

/// Write the page and its image; returns the page path
fn write_page(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir.join("images")).unwrap();
    fs::write(dir.join("images/dot.png"), decode_data_uri(PIXEL).unwrap().bytes).unwrap();
    let page = dir.join("editor.html");
    fs::write(&page, PAGE).unwrap();
    page
}

fn args(input: PathBuf, output: &Path) -> ExportArgs {
    ExportArgs {
        input,
        root: Some("editor".to_string()),
        output: Some(output.to_path_buf()),
        ..Default::default()
    }
}

fn sheet_column(path: &Path) -> Vec<String> {
    let bytes = fs::read(path).unwrap();
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
    let range = workbook.worksheet_range("Document").unwrap();
    range
        .rows()
        .filter_map(|row| match &row[0] {
            Data::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_export_all() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = write_page(temp_dir.path());
    let out = temp_dir.path().join("out");

    let outcomes = export_command(&ExportFormat::ALL, &args(input, &out))
        .await
        .unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(ExportOutcome::is_delivered));

    assert!(fs::read(out.join("MyDocument.pdf")).unwrap().starts_with(b"%PDF-"));

    let docx = fs::read(out.join("MyDocument.docx")).unwrap();
    let package = Package::from_bytes(&docx).unwrap();
    let document = package.part_string("word/document.xml").unwrap();
    assert!(document.contains("Meeting notes"));
    assert!(!document.contains("Export PDF"));
    assert!(package.part_names().any(|p| p.starts_with("word/media/")));

    assert_eq!(
        sheet_column(&out.join("MyDocument.xlsx")),
        vec!["Content", "Meeting notes", "Attendees: all", "Budget"]
    );
}

#[tokio::test]
async fn test_name_flag_overrides_config() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_page(temp_dir.path());
    let config_out = temp_dir.path().join("from-config");
    let config = temp_dir.path().join("docport.toml");
    fs::write(
        &config,
        format!(
            "[export]\nfile_name = \"Configured\"\noutput_dir = {:?}\n",
            config_out.display().to_string()
        ),
    )
    .unwrap();

    let mut args = ExportArgs {
        input,
        root: Some("editor".to_string()),
        config: Some(config),
        ..Default::default()
    };
    export_command(&[ExportFormat::Xlsx], &args).await.unwrap();
    assert!(config_out.join("Configured.xlsx").exists());

    args.name = Some("Flagged".to_string());
    export_command(&[ExportFormat::Xlsx], &args).await.unwrap();
    assert!(config_out.join("Flagged.xlsx").exists());
}

#[tokio::test]
async fn test_unknown_root_fails_before_exporting() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_page(temp_dir.path());
    let out = temp_dir.path().join("out");

    let mut args = args(input, &out);
    args.root = Some("sidebar".to_string());
    let err = export_command(&ExportFormat::ALL, &args).await.unwrap_err();
    assert!(err.to_string().contains("Failed to parse input file"));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();
    let args = args(temp_dir.path().join("nope.html"), temp_dir.path());
    let err = export_command(&[ExportFormat::Docx], &args).await.unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}

#[tokio::test]
async fn test_invalid_name_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_page(temp_dir.path());
    let mut args = args(input, temp_dir.path());
    args.name = Some("../escape".to_string());

    let err = export_command(&[ExportFormat::Xlsx], &args).await.unwrap_err();
    assert_eq!(err.to_string(), "XLSX export failed");
    assert!(format!("{:#}", err).contains("Invalid file name"));
}

#[test]
fn test_extra_stylesheets_apply() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_page(temp_dir.path());
    let css = temp_dir.path().join("host.css");
    fs::write(&css, "h2 { display: none }").unwrap();

    let plain = load_tree(&input, Some("editor"), &[]).unwrap();
    assert!(plain.inner_text().contains("Meeting notes"));

    let styled = load_tree(&input, Some("editor"), &[css]).unwrap();
    assert!(!styled.inner_text().contains("Meeting notes"));
}
