use bytes::Bytes;
use tracing::debug;

use crate::models::content_type::extension_of;

/// Decides whether a stored input file must go through OCR downstream.
///
/// An explicit form value wins. Otherwise DOCX always needs it, a PDF needs it
/// only when it carries no extractable text layer, and anything else does not.
pub async fn needs_ocr(file_name: &str, bytes: &Bytes, explicit: Option<bool>) -> bool {
    if let Some(flag) = explicit {
        return flag;
    }
    match extension_of(file_name).as_deref() {
        Some("docx") => true,
        Some("pdf") => !pdf_has_text_layer(bytes.clone()).await,
        _ => false,
    }
}

/// Extraction runs on the blocking pool; a parse error or panic means "no text".
async fn pdf_has_text_layer(bytes: Bytes) -> bool {
    let probe = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;
    match probe {
        Ok(Ok(text)) => !text.trim().is_empty(),
        Ok(Err(e)) => {
            debug!("PDF text probe failed: {e}");
            false
        }
        Err(e) => {
            debug!("PDF text probe aborted: {e}");
            false
        }
    }
}
