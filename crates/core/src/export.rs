//! Summary export: a standalone styled document handed to a download sink.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::level::CefrLevel;
use crate::{GradedError, Result};

/// What kind of file the summary is saved as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// `.html`, served as `text/html`
    #[default]
    Html,
    /// The HTML document saved with a `.pdf` name and `application/pdf` type
    LegacyPdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::LegacyPdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Html => "text/html",
            ExportFormat::LegacyPdf => "application/pdf",
        }
    }
}

/// Configuration for summary export
#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub format: ExportFormat,
}

/// Title and address of the summarized page
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    pub title: Option<String>,
    pub url: Option<String>,
}

/// A rendered file ready to be downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub media_type: String,
    pub body: String,
}

/// Receives exported artifacts.
pub trait DownloadSink {
    /// Deliver an artifact, returning where it ended up.
    fn save(&mut self, artifact: &Artifact) -> Result<String>;
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The user's download directory, falling back to the current directory.
    pub fn downloads() -> Self {
        Self::new(dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&mut self, artifact: &Artifact) -> Result<String> {
        if !self.dir.is_dir() {
            return Err(GradedError::FileNotFound(self.dir.clone()));
        }
        let path = self.dir.join(&artifact.file_name);
        fs::write(&path, &artifact.body)?;
        info!(path = %path.display(), media_type = %artifact.media_type, "summary saved");
        Ok(path.display().to_string())
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub artifacts: Vec<Artifact>,
}

impl DownloadSink for MemorySink {
    fn save(&mut self, artifact: &Artifact) -> Result<String> {
        self.artifacts.push(artifact.clone());
        Ok(artifact.file_name.clone())
    }
}

/// Turn a page title into a safe file stem.
pub fn sanitize_file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .take(100)
        .collect();

    if stem.chars().all(|c| c == '_') { "page".to_string() } else { stem }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the summary as a standalone styled HTML document.
pub fn render_summary(summary: &str, level: CefrLevel, meta: &PageMeta) -> String {
    let title = html_escape(meta.title.as_deref().unwrap_or("Untitled page"));
    let body = html_escape(summary.trim()).replace("\r\n", "\n").replace('\n', "<br>\n");
    let source = meta
        .url
        .as_deref()
        .map(|u| {
            let u = html_escape(u);
            format!(r#"<p class="source">Source: <a href="{u}">{u}</a></p>"#)
        })
        .unwrap_or_default();
    let date = Local::now().format("%Y-%m-%d");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - {code} summary</title>
<style>
body {{ font-family: Georgia, "Times New Roman", serif; max-width: 720px; margin: 40px auto; padding: 0 20px; color: #222; line-height: 1.6; }}
h1 {{ font-size: 1.6em; margin-bottom: 0.2em; }}
.meta {{ color: #666; font-size: 0.9em; border-bottom: 1px solid #ddd; padding-bottom: 12px; }}
.level {{ display: inline-block; background: #2b6cb0; color: #fff; border-radius: 4px; padding: 2px 8px; font-weight: bold; }}
.summary {{ margin-top: 24px; font-size: 1.05em; }}
.source a {{ color: #2b6cb0; word-break: break-all; }}
</style>
</head>
<body>
<h1>{title}</h1>
<div class="meta">
<p><span class="level">{code}</span> {label} summary, generated {date}</p>
{source}
</div>
<div class="summary">{body}</div>
</body>
</html>
"#,
        code = level.code(),
        label = level.label(),
    )
}

/// Render the summary and name the file.
pub fn build_artifact(summary: &str, level: CefrLevel, meta: &PageMeta, config: &ExportConfig) -> Artifact {
    let stem = sanitize_file_stem(meta.title.as_deref().unwrap_or_default());
    Artifact {
        file_name: format!("{}_summary.{}", stem, config.format.extension()),
        media_type: config.format.media_type().to_string(),
        body: render_summary(summary, level, meta),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> PageMeta {
        PageMeta { title: Some("Rust & You: A Guide!".to_string()), url: Some("https://example.com/a?b=1&c=2".to_string()) }
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Rust & You: A Guide!"), "rust___you__a_guide_");
        assert_eq!(sanitize_file_stem(""), "page");
        assert_eq!(sanitize_file_stem("???"), "page");
        assert_eq!(sanitize_file_stem(&"x".repeat(300)).len(), 100);
    }

    #[test]
    fn test_render_escapes_and_breaks_lines() {
        let html = render_summary("Line <one>\nLine two", CefrLevel::B1, &meta());
        assert!(html.contains("Line &lt;one&gt;<br>\nLine two"));
        assert!(html.contains("<title>Rust &amp; You: A Guide! - B1 summary</title>"));
        assert!(html.contains("https://example.com/a?b=1&amp;c=2"));
        assert!(html.contains("Intermediate"));
    }

    #[test]
    fn test_artifact_formats() {
        let html = build_artifact("s", CefrLevel::A1, &meta(), &ExportConfig::default());
        assert_eq!(html.file_name, "rust___you__a_guide__summary.html");
        assert_eq!(html.media_type, "text/html");

        let legacy = build_artifact("s", CefrLevel::A1, &meta(), &ExportConfig { format: ExportFormat::LegacyPdf });
        assert_eq!(legacy.file_name, "rust___you__a_guide__summary.pdf");
        assert_eq!(legacy.media_type, "application/pdf");
        assert_eq!(legacy.body, html.body);
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut sink = DirectorySink::new(tmp.path());
        let artifact = build_artifact("Summary text.", CefrLevel::C2, &PageMeta::default(), &ExportConfig::default());

        let saved = sink.save(&artifact).unwrap();
        assert!(saved.ends_with("page_summary.html"));
        let written = std::fs::read_to_string(tmp.path().join("page_summary.html")).unwrap();
        assert!(written.contains("Summary text."));
    }

    #[test]
    fn test_directory_sink_missing_dir() {
        let mut sink = DirectorySink::new("/nonexistent/graded/downloads");
        let artifact = build_artifact("s", CefrLevel::C2, &PageMeta::default(), &ExportConfig::default());
        assert!(matches!(sink.save(&artifact), Err(GradedError::FileNotFound(_))));
    }
}
