//! Print-ready presentation of a list of pictures.
//!
//! The `OriginalJpeg` rendition is used rather than the original binary,
//! which may be a PSD or TIFF the renderer cannot display.

use crate::core::zipper::zip_directory;
use crate::domain::model::{Blob, Document};
use crate::domain::ports::{CommandLineExecutor, CommandParameters, DocumentRepository};
use crate::utils::error::{RelationsError, Result};
use crate::utils::validation::is_blank;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const JPEG_PICTURE_VIEW: &str = "OriginalJpeg";
pub const PICTURE_SCHEMA: &str = "picture";
pub const DEFAULT_FILE_NAME: &str = "Presentation-.pdf";
pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const ZIP_MIME_TYPE: &str = "application/zip";

const IMAGE_DIV_TEMPLATE: &str =
    "<div class='floating-box keeptogether'><img src='img/THE_IMAGE' class='imgThumb'></div>\n";

const PRINT_CSS: &str = "@media print {#mainCont .keeptogether {page-break-inside:avoid;}}\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationStyle {
    Grid3x3,
    Grid2x2,
    Landscape6x3,
}

impl PresentationStyle {
    /// Unknown selectors fall back to the 2x2 grid.
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_ascii_lowercase().as_str() {
            "3x3" => PresentationStyle::Grid3x3,
            "landscape 6x3" => PresentationStyle::Landscape6x3,
            _ => PresentationStyle::Grid2x2,
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            PresentationStyle::Landscape6x3 => Orientation::Landscape,
            PresentationStyle::Grid3x3 | PresentationStyle::Grid2x2 => Orientation::Portrait,
        }
    }

    pub fn css(&self) -> &'static str {
        match self {
            PresentationStyle::Grid3x3 => concat!(
                ".floating-box {float: left;width: 300px;height: 350px;margin: 10px;border: 1px solid grey;}\n",
                ".imgThumb {max-width: 300px;max-height: 350px;}\n",
                ".mainContainer {width: 1000px;}\n",
            ),
            PresentationStyle::Grid2x2 => concat!(
                ".floating-box {float: left;width: 470px;height: 600px;margin: 10px;border: 1px solid grey;}\n",
                ".imgThumb {max-width: 470px;max-height: 600px;}\n",
                ".mainContainer {width: 1000px;}\n",
            ),
            PresentationStyle::Landscape6x3 => concat!(
                ".floating-box {float: left;width: 210px;height: 250px;margin: 8px;border: 1px solid grey;}\n",
                ".imgThumb {max-width: 210px;max-height: 250px;}\n",
                ".mainContainer {width: 1400px;}\n",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationSettings {
    /// Name of the renderer command template.
    pub command: String,
    pub picture_view: String,
    pub default_file_name: String,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            command: crate::adapters::command::WKHTMLTOPDF_COMMAND.to_string(),
            picture_view: JPEG_PICTURE_VIEW.to_string(),
            default_file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresentationRequest {
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub style: String,
    /// Also return the zipped HTML mini-site.
    pub include_site_zip: bool,
}

#[derive(Debug, Clone)]
pub struct PresentationOutput {
    pub pdf: Blob,
    /// The HTML mini-site the PDF was rendered from, when requested.
    pub site_zip: Option<Blob>,
    pub image_count: usize,
}

pub struct PresentationAssembler<'a> {
    repository: &'a dyn DocumentRepository,
    executor: &'a dyn CommandLineExecutor,
    settings: &'a PresentationSettings,
}

impl<'a> PresentationAssembler<'a> {
    pub fn new(
        repository: &'a dyn DocumentRepository,
        executor: &'a dyn CommandLineExecutor,
        settings: &'a PresentationSettings,
    ) -> Self {
        Self {
            repository,
            executor,
            settings,
        }
    }

    /// Renders `docs` into one PDF. The working directory is removed whether
    /// or not rendering succeeds.
    pub async fn assemble(&self, docs: &[Document], request: &PresentationRequest) -> Result<PresentationOutput> {
        let style = PresentationStyle::from_selector(&request.style);
        let file_name = request
            .file_name
            .as_deref()
            .filter(|name| !is_blank(name))
            .unwrap_or(&self.settings.default_file_name)
            .to_string();

        let work_dir = tempfile::Builder::new()
            .prefix("wkhtmltopdf-")
            .tempdir()?;
        let site_dir = work_dir.path().join("site");

        let (index_path, image_count) = self
            .build_mini_site(&site_dir, docs, request.title.as_deref(), style)
            .await?;
        tracing::info!("🖼️ Mini-site built with {} images", image_count);

        let site_zip = if request.include_site_zip {
            let zip_path = work_dir.path().join("site.zip");
            zip_site(site_dir.clone(), zip_path.clone()).await?;
            Some(Blob {
                filename: zip_file_name(&file_name),
                mime_type: ZIP_MIME_TYPE.to_string(),
                data: tokio::fs::read(&zip_path).await?,
            })
        } else {
            None
        };

        let target_path = work_dir.path().join("presentation.pdf");
        let mut params = CommandParameters::new();
        params.insert("sourceFilePath".to_string(), path_string(&index_path));
        params.insert("targetFilePath".to_string(), path_string(&target_path));
        params.insert(
            "orientation".to_string(),
            style.orientation().as_str().to_string(),
        );

        let result = self
            .executor
            .exec_command(&self.settings.command, &params)
            .await?;
        if result.error.is_some() || !result.successful {
            return Err(RelationsError::CommandFailed {
                command: self.settings.command.clone(),
                command_line: result.command_line,
                return_code: result.return_code,
                error: result.error,
            });
        }

        let pdf = Blob {
            filename: file_name,
            mime_type: PDF_MIME_TYPE.to_string(),
            data: tokio::fs::read(&target_path).await?,
        };
        tracing::info!("📄 Rendered '{}' ({} bytes)", pdf.filename, pdf.data.len());

        Ok(PresentationOutput {
            pdf,
            site_zip,
            image_count,
        })
    }

    async fn build_mini_site(
        &self,
        site_dir: &Path,
        docs: &[Document],
        title: Option<&str>,
        style: PresentationStyle,
    ) -> Result<(PathBuf, usize)> {
        let img_dir = site_dir.join("img");
        tokio::fs::create_dir_all(&img_dir).await?;

        let mut html = String::from("<!DOCTYPE html><html>");
        html.push_str("<head><meta charset='utf-8'><style>\n");
        html.push_str(style.css());
        html.push_str(PRINT_CSS);
        html.push_str("</style></head>");

        html.push_str("<body>\n");
        html.push_str("<div id='mainCont' class='mainContainer'>\n");
        if let Some(title) = title.filter(|t| !is_blank(t)) {
            html.push_str(&format!(
                "<h2 style='text-align: center;'>{}</h2>\n",
                escape_html(title)
            ));
        }

        let mut count = 0;
        for doc in docs {
            if !doc.has_schema(PICTURE_SCHEMA) {
                continue;
            }
            let Some(image) = self
                .repository
                .picture_view(doc, &self.settings.picture_view)
                .await?
            else {
                tracing::debug!("No {} view for {}, skipped", self.settings.picture_view, doc.id);
                continue;
            };

            count += 1;
            let image_name = format!("img-{}.jpg", count);
            tokio::fs::write(img_dir.join(&image_name), image).await?;
            html.push_str(&IMAGE_DIV_TEMPLATE.replace("THE_IMAGE", &image_name));
        }

        html.push_str("</div>\n");
        html.push_str("</body>\n");
        html.push_str("</html>\n");

        let index_path = site_dir.join("index.html");
        tokio::fs::write(&index_path, html).await?;
        Ok((index_path, count))
    }
}

/// Zipping is plain blocking file I/O, so it runs off the async workers.
async fn zip_site(site_dir: PathBuf, zip_path: PathBuf) -> Result<usize> {
    tokio::task::spawn_blocking(move || zip_directory(&site_dir, &zip_path))
        .await
        .map_err(|e| RelationsError::IoError(std::io::Error::other(e)))?
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn zip_file_name(pdf_name: &str) -> String {
    let stem = Path::new(pdf_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Presentation-");
    format!("{}.zip", stem)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&#39;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_selection() {
        assert_eq!(PresentationStyle::from_selector("3x3"), PresentationStyle::Grid3x3);
        assert_eq!(PresentationStyle::from_selector("2x2"), PresentationStyle::Grid2x2);
        assert_eq!(
            PresentationStyle::from_selector("landscape 6x3"),
            PresentationStyle::Landscape6x3
        );
        assert_eq!(
            PresentationStyle::from_selector("Landscape 6x3"),
            PresentationStyle::Landscape6x3
        );
    }

    #[test]
    fn test_unknown_style_falls_back_to_2x2() {
        assert_eq!(PresentationStyle::from_selector("4x4"), PresentationStyle::Grid2x2);
        assert_eq!(PresentationStyle::from_selector(""), PresentationStyle::Grid2x2);
    }

    #[test]
    fn test_orientation() {
        assert_eq!(PresentationStyle::Grid3x3.orientation(), Orientation::Portrait);
        assert_eq!(PresentationStyle::Grid2x2.orientation(), Orientation::Portrait);
        assert_eq!(
            PresentationStyle::Landscape6x3.orientation().as_str(),
            "Landscape"
        );
    }

    #[test]
    fn test_zip_file_name() {
        assert_eq!(zip_file_name("Presentation-.pdf"), "Presentation-.zip");
        assert_eq!(zip_file_name("board review.pdf"), "board review.zip");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("Bats & <Cats>"), "Bats &amp; &lt;Cats&gt;");
    }
}
