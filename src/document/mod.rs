// Document module
// Turns the source PDF into a single line of cleaned text for chunking


use anyhow::anyhow;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::{RagError, Result};

/// Extract and clean the text of every page in a PDF
#[inline]
pub fn load_pdf_text(pdf_path: &Path) -> Result<String> {
    info!("Extracting text from PDF: {}", pdf_path.display());

    if !pdf_path.is_file() {
        error!("PDF not found: {}", pdf_path.display());
        return Err(RagError::NotFound(format!(
            "PDF file {}",
            pdf_path.display()
        )));
    }

    let bytes = fs::read(pdf_path)?;

    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
        error!("Failed to read PDF {}: {:?}", pdf_path.display(), e);
        RagError::Other(anyhow!(
            "PDF extraction failed for {}: {:?}",
            pdf_path.display(),
            e
        ))
    })?;

    let raw_text = join_pages(&pages);
    info!(
        "Extracted {} characters from {} pages",
        raw_text.len(),
        pages.len()
    );

    Ok(clean_text(&raw_text))
}

/// Join extracted pages with a line break so words never run across a page boundary
#[inline]
pub fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}

/// Collapse every run of whitespace to a single space and trim the ends
#[inline]
pub fn clean_text(text: &str) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    debug!(
        "Cleaned text from {} to {} characters",
        text.len(),
        cleaned.len()
    );
    cleaned
}
