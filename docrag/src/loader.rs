//! Directory document loader.
//!
//! [`DocumentLoader`] walks a directory recursively and dispatches each file
//! by extension to a thin format adapter (PDF, DOCX, PPTX, XLSX, CSV, JSON,
//! HTML, Markdown, plain text). Unsupported extensions are skipped with a
//! warning; a parse failure on one file is recorded and does not affect its
//! siblings. Outcomes are aggregated into a [`LoadReport`].

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::document::{Document, META_FILE_NAME, META_FILE_TYPE, META_SOURCE_FILE};
use crate::error::{RagError, Result};

/// Extension → file-type table. Type names end up in document metadata.
const SUPPORTED_EXTENSIONS: &[(&str, &str)] = &[
    ("pdf", "pdf"),
    ("txt", "text"),
    ("md", "markdown"),
    ("markdown", "markdown"),
    ("csv", "csv"),
    ("json", "json"),
    ("html", "html"),
    ("htm", "html"),
    ("xlsx", "excel"),
    ("xls", "excel"),
    ("docx", "docx"),
    ("pptx", "pptx"),
];

fn file_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.iter().find(|(e, _)| *e == ext).map(|(_, t)| *t)
}

/// The aggregated outcome of loading a directory.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully parsed documents, one per file, in path order.
    pub documents: Vec<Document>,
    /// Files skipped because their extension is unsupported.
    pub skipped: Vec<PathBuf>,
    /// Files that failed to parse, with the failure reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Counts of files in the source directory, by support status and type.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileStatistics {
    pub total_files: usize,
    pub supported_files: usize,
    pub unsupported_files: usize,
    pub files_by_type: HashMap<String, usize>,
}

/// Loads documents from a directory, supporting multiple file formats.
pub struct DocumentLoader {
    directory: PathBuf,
}

impl DocumentLoader {
    /// Create a loader rooted at `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Loader`] if the path does not exist or is not a
    /// directory.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        if !directory.exists() {
            return Err(RagError::Loader(format!(
                "directory does not exist: {}",
                directory.display()
            )));
        }
        if !directory.is_dir() {
            return Err(RagError::Loader(format!(
                "path is not a directory: {}",
                directory.display()
            )));
        }
        Ok(Self { directory })
    }

    /// Load every supported file under the directory.
    ///
    /// An empty directory is not an error: the report simply contains zero
    /// documents.
    pub fn load_all(&self) -> Result<LoadReport> {
        let files = self.walk()?;
        info!(directory = %self.directory.display(), files = files.len(), "loading documents");

        let mut report = LoadReport::default();
        for path in files {
            let Some(file_type) = file_type_for(&path) else {
                warn!(file = %path.display(), "skipping unsupported file");
                report.skipped.push(path);
                continue;
            };

            match extract_text(&path, file_type) {
                Ok(content) => {
                    let metadata = HashMap::from([
                        (META_SOURCE_FILE.to_string(), path.display().to_string()),
                        (
                            META_FILE_NAME.to_string(),
                            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                        ),
                        (META_FILE_TYPE.to_string(), file_type.to_string()),
                    ]);
                    report.documents.push(Document::new(content, metadata));
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "failed to load file");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            loaded = report.documents.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "finished loading documents"
        );
        Ok(report)
    }

    /// Count files under the directory by support status and type.
    pub fn file_statistics(&self) -> Result<FileStatistics> {
        let mut stats = FileStatistics::default();
        for path in self.walk()? {
            stats.total_files += 1;
            match file_type_for(&path) {
                Some(file_type) => {
                    stats.supported_files += 1;
                    *stats.files_by_type.entry(file_type.to_string()).or_insert(0) += 1;
                }
                None => stats.unsupported_files += 1,
            }
        }
        Ok(stats)
    }

    /// The extensions this loader recognizes.
    pub fn supported_extensions() -> Vec<&'static str> {
        SUPPORTED_EXTENSIONS.iter().map(|(ext, _)| *ext).collect()
    }

    /// Collect all files under the directory, sorted for determinism.
    fn walk(&self) -> Result<Vec<PathBuf>> {
        fn visit(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    visit(&path, out)?;
                } else {
                    out.push(path);
                }
            }
            Ok(())
        }

        let mut files = Vec::new();
        visit(&self.directory, &mut files)
            .map_err(|e| RagError::Loader(format!("failed to read directory: {e}")))?;
        files.sort();
        Ok(files)
    }
}

/// Dispatch to the format adapter for `file_type`.
fn extract_text(path: &Path, file_type: &str) -> Result<String> {
    let parse_err = |e: &dyn std::fmt::Display| RagError::Loader(format!("{}: {e}", path.display()));

    match file_type {
        "text" | "markdown" => fs::read_to_string(path).map_err(|e| parse_err(&e)),
        "csv" => parse_csv(path).map_err(|e| parse_err(&e)),
        "json" => parse_json(path).map_err(|e| parse_err(&e)),
        "html" => parse_html(path).map_err(|e| parse_err(&e)),
        "pdf" => parse_pdf(path).map_err(|e| parse_err(&e)),
        "excel" => parse_excel(path).map_err(|e| parse_err(&e)),
        "docx" => parse_ooxml(path, &["word/document.xml"]).map_err(|e| parse_err(&e)),
        "pptx" => parse_pptx(path).map_err(|e| parse_err(&e)),
        other => Err(RagError::Loader(format!("no parser registered for type '{other}'"))),
    }
}

fn parse_csv(path: &Path) -> std::result::Result<String, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut lines = Vec::new();
    let headers = reader.headers()?.clone();
    if !headers.is_empty() {
        lines.push(headers.iter().collect::<Vec<_>>().join(", "));
    }
    for record in reader.records() {
        let record = record?;
        lines.push(record.iter().collect::<Vec<_>>().join(", "));
    }
    Ok(lines.join("\n"))
}

fn parse_json(path: &Path) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

fn parse_html(path: &Path) -> std::result::Result<String, std::io::Error> {
    let raw = fs::read_to_string(path)?;
    let document = scraper::Html::parse_document(&raw);
    let text: Vec<&str> = document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    Ok(text.join("\n"))
}

fn parse_pdf(path: &Path) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let document = lopdf::Document::load(path)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    Ok(document.extract_text(&pages)?)
}

fn parse_excel(path: &Path) -> std::result::Result<String, calamine::Error> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let mut lines = Vec::new();
    for (sheet_name, range) in workbook.worksheets() {
        lines.push(sheet_name);
        for row in range.rows() {
            lines.push(row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>().join(", "));
        }
    }
    Ok(lines.join("\n"))
}

/// Extract text runs from OOXML parts inside a zip container. Paragraph
/// ends (`w:p` / `a:p`) become line breaks.
fn parse_ooxml(
    path: &Path,
    parts: &[&str],
) -> std::result::Result<String, Box<dyn std::error::Error>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut text = String::new();

    for part in parts {
        let mut xml = String::new();
        archive.by_name(part)?.read_to_string(&mut xml)?;

        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event()? {
                Event::Text(t) => text.push_str(&t.unescape()?),
                Event::End(e) if e.name().as_ref() == b"w:p" || e.name().as_ref() == b"a:p" => {
                    text.push('\n')
                }
                Event::Eof => break,
                _ => {}
            }
        }
        text.push('\n');
    }
    Ok(text.trim().to_string())
}

fn parse_pptx(path: &Path) -> std::result::Result<String, Box<dyn std::error::Error>> {
    let file = fs::File::open(path)?;
    let archive = zip::ZipArchive::new(file)?;
    let mut slides: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
        .map(String::from)
        .collect();
    slides.sort();

    let parts: Vec<&str> = slides.iter().map(String::as_str).collect();
    parse_ooxml(path, &parts)
}
