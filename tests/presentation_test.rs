mod common;

use anyhow::Result;
use async_trait::async_trait;
use asset_relations::core::presentation::{PresentationSettings, JPEG_PICTURE_VIEW};
use asset_relations::domain::model::{Document, ExecResult};
use asset_relations::domain::ports::{CommandLineExecutor, CommandParameters};
use asset_relations::{InMemoryRepository, PresentationAssembler, PresentationRequest, RelationsError};
use common::picture;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// 模擬渲染器：把 HTML 複製成 PDF 並記錄參數
struct CopyingRenderer {
    succeed: bool,
    calls: Mutex<Vec<(String, CommandParameters)>>,
}

impl CopyingRenderer {
    fn new(succeed: bool) -> Self {
        Self {
            succeed,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn last_call(&self) -> (String, CommandParameters) {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl CommandLineExecutor for CopyingRenderer {
    async fn exec_command(
        &self,
        command: &str,
        params: &CommandParameters,
    ) -> asset_relations::Result<ExecResult> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), params.clone()));

        if self.succeed {
            std::fs::copy(&params["sourceFilePath"], &params["targetFilePath"])?;
        }
        Ok(ExecResult {
            successful: self.succeed,
            error: None,
            return_code: if self.succeed { 0 } else { 1 },
            command_line: format!("render {}", params["sourceFilePath"]),
            output: Vec::new(),
        })
    }
}

fn picture_with_view(dir: &Path, id: &str, bytes: &[u8]) -> Document {
    let view_path = dir.join(format!("{}.jpg", id));
    std::fs::write(&view_path, bytes).unwrap();
    let mut doc = picture(id, &format!("15BTMN{} Name.psd", id));
    doc.views.insert(JPEG_PICTURE_VIEW.to_string(), view_path);
    doc
}

fn zip_entries(data: &[u8]) -> Result<Vec<String>> {
    let archive = zip::ZipArchive::new(Cursor::new(data))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

fn zipped_file(data: &[u8], name: &str) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut content = String::new();
    archive.by_name(name)?.read_to_string(&mut content)?;
    Ok(content)
}

#[tokio::test]
async fn test_presentation_renders_pictures_with_views() -> Result<()> {
    let dir = TempDir::new()?;
    let repo = InMemoryRepository::new();
    let renderer = CopyingRenderer::new(true);
    let settings = PresentationSettings::default();

    let mut no_schema = picture_with_view(dir.path(), "003", b"three");
    no_schema.schemas.clear();
    let mut no_view = picture("004", "15BTMN004 Name.psd");
    no_view.views.clear();
    let docs = vec![
        picture_with_view(dir.path(), "001", b"one"),
        no_schema,
        no_view,
        picture_with_view(dir.path(), "002", b"two"),
    ];

    let request = PresentationRequest {
        title: Some("Bats & Cats".to_string()),
        file_name: Some("board.pdf".to_string()),
        style: "3x3".to_string(),
        include_site_zip: true,
    };
    let output = PresentationAssembler::new(&repo, &renderer, &settings)
        .assemble(&docs, &request)
        .await?;

    assert_eq!(output.image_count, 2);
    assert_eq!(output.pdf.filename, "board.pdf");
    assert_eq!(output.pdf.mime_type, "application/pdf");
    let site_zip = output.site_zip.as_ref().unwrap();
    assert_eq!(site_zip.filename, "board.zip");
    assert_eq!(site_zip.mime_type, "application/zip");

    // the fake renderer copies index.html to the PDF
    let html = String::from_utf8(output.pdf.data.clone())?;
    assert!(html.contains("<h2 style='text-align: center;'>Bats &amp; Cats</h2>"));
    assert_eq!(html.matches("class='floating-box keeptogether'").count(), 2);
    assert!(html.contains("img/img-1.jpg"));
    assert!(html.contains("img/img-2.jpg"));
    assert!(html.contains("width: 300px"));

    assert_eq!(
        zip_entries(&site_zip.data)?,
        vec!["img/img-1.jpg", "img/img-2.jpg", "index.html"]
    );
    assert_eq!(zipped_file(&site_zip.data, "img/img-2.jpg")?, "two");

    let (command, params) = renderer.last_call();
    assert_eq!(command, settings.command);
    assert_eq!(params["orientation"], "Portrait");
    assert!(params["sourceFilePath"].ends_with("index.html"));

    // 暫存目錄已清除
    assert!(!Path::new(&params["sourceFilePath"]).exists());
    Ok(())
}

#[tokio::test]
async fn test_defaults_for_style_and_file_name() -> Result<()> {
    let dir = TempDir::new()?;
    let repo = InMemoryRepository::new();
    let renderer = CopyingRenderer::new(true);
    let settings = PresentationSettings::default();
    let docs = vec![picture_with_view(dir.path(), "001", b"one")];

    let request = PresentationRequest {
        title: None,
        file_name: Some("  ".to_string()),
        style: "9x9".to_string(),
        include_site_zip: true,
    };
    let output = PresentationAssembler::new(&repo, &renderer, &settings)
        .assemble(&docs, &request)
        .await?;

    assert_eq!(output.pdf.filename, "Presentation-.pdf");
    assert_eq!(
        output.site_zip.as_ref().map(|zip| zip.filename.as_str()),
        Some("Presentation-.zip")
    );
    let html = String::from_utf8(output.pdf.data)?;
    assert!(!html.contains("<h2"));
    assert!(html.contains("width: 470px"));
    assert_eq!(renderer.last_call().1["orientation"], "Portrait");

    let request = PresentationRequest {
        style: "landscape 6x3".to_string(),
        ..PresentationRequest::default()
    };
    let output = PresentationAssembler::new(&repo, &renderer, &settings)
        .assemble(&docs, &request)
        .await?;
    assert_eq!(renderer.last_call().1["orientation"], "Landscape");
    // 沒要求就不打包網站
    assert!(output.site_zip.is_none());
    Ok(())
}

#[tokio::test]
async fn test_renderer_failure_cleans_up() -> Result<()> {
    let dir = TempDir::new()?;
    let repo = InMemoryRepository::new();
    let renderer = CopyingRenderer::new(false);
    let settings = PresentationSettings::default();
    let docs = vec![picture_with_view(dir.path(), "001", b"one")];

    let err = PresentationAssembler::new(&repo, &renderer, &settings)
        .assemble(&docs, &PresentationRequest::default())
        .await
        .unwrap_err();

    match err {
        RelationsError::CommandFailed {
            command,
            return_code,
            ..
        } => {
            assert_eq!(command, settings.command);
            assert_eq!(return_code, 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    let source = PathBuf::from(&renderer.last_call().1["sourceFilePath"]);
    assert!(!source.exists());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_template_renderer() -> Result<()> {
    use asset_relations::adapters::command::CommandTemplate;
    use asset_relations::TemplateCommandExecutor;
    use std::collections::BTreeMap;

    let dir = TempDir::new()?;
    let repo = InMemoryRepository::new();
    let mut commands = BTreeMap::new();
    commands.insert(
        "copy".to_string(),
        CommandTemplate {
            command: "cp".to_string(),
            parameters: "#{sourceFilePath} #{targetFilePath}".to_string(),
        },
    );
    let executor = TemplateCommandExecutor::new(commands);
    let settings = PresentationSettings {
        command: "copy".to_string(),
        ..PresentationSettings::default()
    };
    let docs = vec![picture_with_view(dir.path(), "001", b"one")];

    let output = PresentationAssembler::new(&repo, &executor, &settings)
        .assemble(&docs, &PresentationRequest::default())
        .await?;
    assert!(String::from_utf8(output.pdf.data)?.starts_with("<!DOCTYPE html>"));
    Ok(())
}
