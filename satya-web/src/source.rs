//! Turning what the user handed us (a URL, a file path, or pasted text) into
//! the plain text that gets fact-checked.

use crate::extract::{extract_paragraphs, extract_title};
use satya_common::{Result, SatyaError};
use quick_xml::Reader;
use quick_xml::events::Event;
use satya_http::{HttpClient, RequestOpts};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Desktop browser UA; many news sites refuse obvious bots.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

const SUPPORTED_FILES: &str = ".txt, .md, .html, .pdf, .docx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    File(PathBuf),
    Text(String),
}

impl Source {
    /// `http(s)://` prefixes are URLs, existing paths are files, anything
    /// else is taken as the text itself.
    pub fn classify(input: &str) -> Source {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            if let Ok(url) = Url::parse(trimmed) {
                return Source::Url(url);
            }
        }
        // Pasted articles are never paths; skip the stat for them.
        if !trimmed.is_empty() && !trimmed.contains('\n') && Path::new(trimmed).is_file() {
            return Source::File(PathBuf::from(trimmed));
        }
        Source::Text(input.to_string())
    }
}

/// Resolve `input` to analysable text.
///
/// Fails with [`SatyaError::Source`] when a URL or file cannot be read and
/// with [`SatyaError::Validation`] when nothing usable was extracted.
pub async fn resolve_source(input: &str) -> Result<String> {
    let source = Source::classify(input);
    let text = match &source {
        Source::Url(url) if is_pdf_url(url) => fetch_pdf(url).await?,
        Source::Url(url) => fetch_article(url).await?,
        Source::File(path) => read_file(path).await?,
        Source::Text(text) => text.clone(),
    };

    if text.trim().is_empty() {
        return Err(SatyaError::Validation(match source {
            Source::Url(url) => format!("no article text found at {url}"),
            Source::File(path) => format!("{} contains no text", path.display()),
            Source::Text(_) => "text to analyze is empty".to_string(),
        }));
    }
    Ok(text)
}

fn page_client(url: &Url) -> Result<HttpClient> {
    Ok(HttpClient::with_user_agent(url.as_str(), BROWSER_USER_AGENT)
        .map_err(|e| SatyaError::Source(format!("{url}: {e}")))?
        .with_timeout(FETCH_TIMEOUT))
}

fn is_pdf_url(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}

/// Download `url` and keep its paragraph text.
pub async fn fetch_article(url: &Url) -> Result<String> {
    let html = page_client(url)?
        .get_text(url.as_str(), RequestOpts::absolute())
        .await
        .map_err(|e| SatyaError::Source(format!("failed to fetch {url}: {e}")))?;

    let text = extract_paragraphs(&html);
    tracing::info!(
        target: "web.source",
        %url,
        title = ?extract_title(&html),
        html_len = html.len(),
        text_len = text.len(),
        "source.url.extracted"
    );
    Ok(text)
}

/// Download a PDF document and extract its text layer.
pub async fn fetch_pdf(url: &Url) -> Result<String> {
    let bytes = page_client(url)?
        .get_bytes(url.as_str(), RequestOpts::absolute())
        .await
        .map_err(|e| SatyaError::Source(format!("failed to fetch {url}: {e}")))?;
    let text = pdf_text(bytes.to_vec(), url.to_string()).await?;
    tracing::info!(
        target: "web.source",
        %url,
        pdf_len = bytes.len(),
        text_len = text.len(),
        "source.pdf.extracted"
    );
    Ok(text)
}

async fn read_file(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "md" => read_to_string(path).await,
        "html" | "htm" => Ok(extract_paragraphs(&read_to_string(path).await?)),
        "pdf" => pdf_text(read_bytes(path).await?, path.display().to_string()).await,
        "docx" => {
            let bytes = read_bytes(path).await?;
            let label = path.display().to_string();
            blocking(move || docx_text(bytes, &label)).await
        }
        "" => Err(SatyaError::Source(format!(
            "{} has no file extension; supported: {SUPPORTED_FILES}",
            path.display()
        ))),
        other => Err(SatyaError::Source(format!(
            "unsupported file type '.{other}'; supported: {SUPPORTED_FILES}"
        ))),
    }
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| SatyaError::Source(format!("{}: {e}", path.display())))
}

/// Parsers below are synchronous and CPU bound.
async fn blocking<F>(job: F) -> Result<String>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| SatyaError::Source(format!("document extraction aborted: {e}")))?
}

/// Text layer only; scanned pages come back empty.
async fn pdf_text(bytes: Vec<u8>, label: String) -> Result<String> {
    blocking(move || {
        pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| SatyaError::Source(format!("{label}: unreadable PDF: {e}")))
    })
    .await
}

fn unreadable_docx(label: &str, err: impl std::fmt::Display) -> SatyaError {
    SatyaError::Source(format!("{label}: unreadable DOCX: {err}"))
}

/// Paragraph text of `word/document.xml`, one paragraph per line.
fn docx_text(bytes: Vec<u8>, label: &str) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| unreadable_docx(label, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| unreadable_docx(label, e))?
        .read_to_string(&mut xml)
        .map_err(|e| unreadable_docx(label, e))?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event().map_err(|e| unreadable_docx(label, e))? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => out.push('\t'),
                b"w:br" | b"w:p" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                out.push_str(&t.unescape().map_err(|e| unreadable_docx(label, e))?)
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

async fn read_to_string(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SatyaError::Source(format!("{}: {e}", path.display())))
}
