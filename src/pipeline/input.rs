//! Input resolution: normalise a user-supplied path or URL to a local PDF.
//!
//! pdfium opens files by path, so URLs are downloaded into a `TempDir` that
//! lives as long as the [`ResolvedInput`]. Both paths check the `%PDF` magic
//! bytes up front so a wrong file type is reported as such rather than as a
//! pdfium parse failure.

use crate::error::Pdf2CardsError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The resolved input: a local path, or a downloaded temp file.
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` is held so the file survives until generation is done.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a readable local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2CardsError> {
    if input.trim().is_empty() {
        return Err(Pdf2CardsError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// `Some(magic)` when the leading bytes are present but are not `%PDF`.
fn wrong_magic(head: &[u8]) -> Option<[u8; 4]> {
    if head.len() < 4 || &head[..4] == PDF_MAGIC {
        return None;
    }
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&head[..4]);
    Some(magic)
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pdf2CardsError> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(Pdf2CardsError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2CardsError::PermissionDenied { path });
        }
        Err(_) => return Err(Pdf2CardsError::FileNotFound { path }),
    };

    let mut head = [0u8; 4];
    if file.read_exact(&mut head).is_ok() {
        if let Some(magic) = wrong_magic(&head) {
            return Err(Pdf2CardsError::NotAPdf { path, magic });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pdf2CardsError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| Pdf2CardsError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2CardsError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|e| Pdf2CardsError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(url));

    if let Some(magic) = wrong_magic(&bytes) {
        return Err(Pdf2CardsError::NotAPdf {
            path: file_path,
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Pdf2CardsError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last URL path segment if it looks like a file name, else `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}
