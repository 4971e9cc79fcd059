//! Page text extraction via pdfium.
//!
//! pdfium is a C++ library with thread-local state, so every call runs inside
//! `tokio::task::spawn_blocking`. A page whose text layer cannot be read is
//! returned as `None` instead of failing the document; the chunker turns it
//! into an empty string.

use crate::error::Pdf2CardsError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Text of one selected page.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// 0-indexed page number in the document.
    pub index: usize,
    pub text: Option<String>,
}

impl crate::pipeline::chunk::PageText for ExtractedPage {
    fn extract_text(&self) -> Option<String> {
        self.text.clone()
    }
}

/// Bind pdfium from `PDFIUM_LIB_PATH` (a library file or the directory
/// holding it) or, failing that, from the system library path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2CardsError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(p) if !p.is_empty() => {
            let path = PathBuf::from(&p);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2CardsError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2CardsError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2CardsError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2CardsError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            Pdf2CardsError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Extract the text of the selected pages, in the order given.
pub async fn extract_pages(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<ExtractedPage>, Pdf2CardsError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || extract_pages_blocking(&path, password.as_deref(), &indices))
        .await
        .map_err(|e| Pdf2CardsError::Internal(format!("Extraction task panicked: {}", e)))?
}

fn extract_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<ExtractedPage>, Pdf2CardsError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut results = Vec::with_capacity(page_indices.len());
    for &idx in page_indices {
        if idx >= total_pages {
            warn!("Skipping page {} (out of range, total={})", idx + 1, total_pages);
            continue;
        }

        let text = match pages.get(idx as u16) {
            Ok(page) => match page.text() {
                Ok(t) => Some(t.all()),
                Err(e) => {
                    warn!("Page {}: text extraction failed: {:?}", idx + 1, e);
                    None
                }
            },
            Err(e) => {
                warn!("Page {}: could not load page: {:?}", idx + 1, e);
                None
            }
        };

        debug!(
            "Extracted page {} → {} chars",
            idx + 1,
            text.as_ref().map_or(0, |t| t.len())
        );
        results.push(ExtractedPage { index: idx, text });
    }

    Ok(results)
}

/// Read document metadata without extracting any page text.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2CardsError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2CardsError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2CardsError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
