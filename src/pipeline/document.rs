//! DOCX, plain text and Markdown → PDF.
//!
//! All three build one printable HTML document (content wrapped in a print
//! stylesheet) and hand it to the markup renderer. They differ only in how
//! the content becomes HTML and in the page margin:
//!
//! | Input | → HTML | Stylesheet | Margin |
//! |-------|--------|------------|--------|
//! | DOCX | document converter | [`DOCUMENT_STYLESHEET`] | 10pt |
//! | TXT | escaped `<pre>` | [`TEXT_STYLESHEET`] | 12pt |
//! | MD | Markdown transform | [`TEXT_STYLESHEET`] | 12pt |

use super::Artifact;
use crate::backend::{Backends, MarkdownOptions, Orientation, RenderOptions};
use crate::config::PageSize;
use crate::error::FileError;
use crate::format::replace_ext;
use crate::markup::{text_to_html, wrap_printable, DOCUMENT_STYLESHEET, TEXT_STYLESHEET};
use tracing::debug;

pub const DOCX_MARGIN: f32 = 10.0;
pub const TEXT_MARGIN: f32 = 12.0;
pub const RENDER_SCALE: f32 = 2.0;
pub const RENDER_IMAGE_QUALITY: f32 = 0.98;

/// Portrait render options on `page_size` (`Auto` → A4) with white pages.
pub fn render_options(page_size: PageSize, margin: f32) -> RenderOptions {
    let (page_width, page_height) = page_size.document_dimensions();
    RenderOptions {
        page_width,
        page_height,
        orientation: Orientation::Portrait,
        margin,
        scale: RENDER_SCALE,
        image_quality: RENDER_IMAGE_QUALITY,
        background: [0xff, 0xff, 0xff],
    }
}

pub fn docx_to_pdf(
    backends: &Backends,
    name: &str,
    bytes: &[u8],
    page_size: PageSize,
) -> Result<Artifact, FileError> {
    let body = backends.documents.convert(bytes)?;
    let html = wrap_printable(DOCUMENT_STYLESHEET, &body);
    render(backends, name, &html, render_options(page_size, DOCX_MARGIN))
}

/// Plain text, or Markdown when `markdown` is set.
pub fn text_to_pdf(
    backends: &Backends,
    name: &str,
    bytes: &[u8],
    page_size: PageSize,
    markdown: bool,
) -> Result<Artifact, FileError> {
    let text = decode_text(bytes);
    let body = if markdown {
        backends.markdown.to_html(&text, &MarkdownOptions::default())
    } else {
        text_to_html(&text)
    };
    let html = wrap_printable(TEXT_STYLESHEET, &body);
    render(backends, name, &html, render_options(page_size, TEXT_MARGIN))
}

fn render(
    backends: &Backends,
    name: &str,
    html: &str,
    options: RenderOptions,
) -> Result<Artifact, FileError> {
    debug!(
        "{}: rendering {} bytes of HTML on {}x{} pt, margin {}",
        name,
        html.len(),
        options.page_width,
        options.page_height,
        options.margin
    );
    let pdf = backends.markup_pdf.render(html, &options)?;
    Ok(Artifact {
        file_name: replace_ext(name, ".pdf"),
        bytes: pdf,
    })
}

/// UTF-8 with replacement characters for invalid bytes; a leading BOM is
/// dropped.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
