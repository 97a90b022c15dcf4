use internrank_core::{DocumentExtractor, Error, Result};
use std::path::Path;

/// Best-effort sniff for PDF bytes (magic header).
pub fn bytes_look_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Extract text from a PDF body (in-memory bytes).
///
/// Extraction quality varies by PDF (text layer vs scanned images); a scanned
/// resume can legitimately come back empty.
pub fn pdf_to_text(bytes: &[u8]) -> Result<String> {
    if !bytes_look_like_pdf(bytes) {
        return Err(Error::Extract("not a PDF document (missing %PDF- header)".to_string()));
    }
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::Extract(e.to_string()))
}

/// Resume extractor backed by `pdf-extract` (pure Rust, in-memory).
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[async_trait::async_trait]
impl DocumentExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf_extract"
    }

    async fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let owned = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_to_text(&owned))
            .await
            .map_err(|e| Error::Extract(format!("pdf extraction task failed: {e}")))??;
        if text.chars().all(char::is_whitespace) {
            tracing::warn!("pdf contained no extractable text");
        }
        Ok(text)
    }
}

impl PdfExtractor {
    /// Read and extract a `.pdf` file. Other extensions are rejected up front.
    pub async fn extract_path(&self, path: &Path) -> Result<String> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(Error::NotSupported("only PDF files are supported".to_string()));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::Extract(format!("{}: {e}", path.display())))?;
        self.extract_text(&bytes).await
    }
}
