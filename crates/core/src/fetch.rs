//! Retrieves one hit's content from the document store and decodes it to
//! text according to its classified format.

use crate::error::FetchError;
use crate::format::FileFormat;
use crate::models::{FetchedText, SearchHit};
use crate::traits::DocumentStore;
use lopdf::Document;

/// Fetches and decodes the content behind `hit`. Every failure comes back as
/// a structured `FetchError` carrying the item name; nothing escapes this
/// boundary as a panic or a provider-specific error.
pub async fn fetch_content<S>(
    store: &S,
    bearer: &str,
    hit: &SearchHit,
    format: FileFormat,
) -> Result<FetchedText, FetchError>
where
    S: DocumentStore + ?Sized,
{
    let text = match format {
        FileFormat::Unsupported => return Ok(FetchedText::Unsupported),

        FileFormat::PlainText => store.fetch_text(bearer, &hit.drive_id, &hit.item_id).await,

        FileFormat::DelimitedText => store
            .fetch_bytes(bearer, &hit.drive_id, &hit.item_id, false)
            .await
            .and_then(|bytes| {
                String::from_utf8(bytes).map_err(|error| FetchError::Decode(error.to_string()))
            }),

        FileFormat::ConvertibleDocument => {
            // Sources that already are PDFs are downloaded directly; the
            // rest go through the store's PDF rendition.
            let is_pdf = hit.name.to_ascii_lowercase().ends_with(".pdf");
            store
                .fetch_bytes(bearer, &hit.drive_id, &hit.item_id, !is_pdf)
                .await
                .and_then(|bytes| extract_pdf_text(&bytes))
        }
    };

    text.map(FetchedText::Text)
        .map_err(|error| FetchError::for_item(&hit.name, error))
}

/// Runs binary PDF text extraction over an in-memory payload, joining page
/// texts in page order and skipping blank pages.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, FetchError> {
    let document =
        Document::load_mem(bytes).map_err(|error| FetchError::PdfExtract(error.to_string()))?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| FetchError::PdfExtract(error.to_string()))?;

        if !text.trim().is_empty() {
            pages.push(text);
        }
    }

    Ok(pages.join("\n"))
}
