//! pdfium-backed PDF capabilities: rasterising, authoring image pages, and
//! drawing laid-out markup.
//!
//! ## Binding
//!
//! libpdfium is a runtime dependency that many machines lack. It is bound
//! inside each call rather than at construction, so image → image batches
//! never need it and a missing library surfaces as a per-file failure
//! instead of aborting the batch.
//!
//! pdfium is not re-entrant. Every call holds a process-wide lock for as
//! long as any pdfium object is alive, and no pdfium handle outlives the
//! call, so the backend itself carries no engine state and is `Send + Sync`.
//!
//! Library lookup order: `PDFIUM_LIB_PATH` (directory), the working
//! directory, then the system library path.

use super::layout::{self, FontFace, LaidOutPage};
use super::{MarkupToPdf, PageSink, PagePlan, PdfAuthoring, PdfRasterizer, RenderOptions};
use crate::error::{ConvertError, FileError};
use pdfium_render::prelude::*;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Table and rule stroke colour (`#ddd`).
const RULE_GREY: u8 = 0xdd;

/// Serialises all pdfium work in the process.
static ENGINE: Mutex<()> = Mutex::new(());

/// pdfium-backed [`PdfRasterizer`], [`PdfAuthoring`] and [`MarkupToPdf`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumBackend;

impl PdfiumBackend {
    /// A backend that binds on first use.
    pub fn new() -> Self {
        Self
    }

    /// Check the library binds now, failing fast when it is missing.
    pub fn bind() -> Result<Self, ConvertError> {
        let _engine = ENGINE.lock().unwrap_or_else(|e| e.into_inner());
        bind_library().map_err(ConvertError::PdfiumBindingFailed)?;
        Ok(Self)
    }
}

/// Bind pdfium and run `work` with exclusive access to it.
fn with_pdfium<T>(work: impl FnOnce(&Pdfium) -> Result<T, FileError>) -> Result<T, FileError> {
    let _engine = ENGINE.lock().unwrap_or_else(|e| e.into_inner());
    let pdfium = bind_library()
        .map_err(|e| FileError::render(ConvertError::PdfiumBindingFailed(e)))?;
    work(&pdfium)
}

fn bind_library() -> Result<Pdfium, String> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(dir) if !dir.trim().is_empty() => {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", dir);
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    };

    match bindings {
        Ok(bindings) => {
            debug!("pdfium bound");
            Ok(Pdfium::new(bindings))
        }
        Err(e) => Err(format!("{:?}", e)),
    }
}

fn pdf_err(context: &str) -> impl Fn(PdfiumError) -> FileError + '_ {
    move |e| FileError::render(format!("{context}: {:?}", e))
}

// ── Rasterizing ──────────────────────────────────────────────────────────

impl PdfRasterizer for PdfiumBackend {
    fn rasterize(
        &self,
        bytes: &[u8],
        scale: f32,
        on_page: &mut PageSink<'_>,
    ) -> Result<usize, FileError> {
        with_pdfium(|pdfium| {
            let document = pdfium
                .load_pdf_from_byte_slice(bytes, None)
                .map_err(pdf_err("opening PDF"))?;
            let pages = document.pages();
            let total = pages.len() as usize;
            let config = PdfRenderConfig::new().scale_page_by_factor(scale);

            for (index, page) in pages.iter().enumerate() {
                let image = page
                    .render_with_config(&config)
                    .map_err(|e| {
                        FileError::render(format!("rendering page {}: {:?}", index + 1, e))
                    })?
                    .as_image();
                debug!(
                    "Rendered page {} → {}x{} px",
                    index + 1,
                    image.width(),
                    image.height()
                );
                on_page(index, total, image)?;
            }
            Ok(total)
        })
    }
}

// ── Authoring ────────────────────────────────────────────────────────────

impl PdfAuthoring for PdfiumBackend {
    fn compose(&self, pages: &[PagePlan]) -> Result<Vec<u8>, FileError> {
        with_pdfium(|pdfium| compose_pages(pdfium, pages))
    }
}

fn compose_pages(pdfium: &Pdfium, pages: &[PagePlan]) -> Result<Vec<u8>, FileError> {
    let mut document = pdfium.create_new_pdf().map_err(pdf_err("creating PDF"))?;

    for plan in pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(
                PdfPoints::new(plan.width),
                PdfPoints::new(plan.height),
            ))
            .map_err(pdf_err("adding page"))?;

        for placed in &plan.images {
            let image = image::load_from_memory(&placed.jpeg).map_err(FileError::decode)?;
            // PDF space has its origin at the bottom-left.
            let bottom = plan.height - placed.y - placed.height;
            page.objects_mut()
                .create_image_object(
                    PdfPoints::new(placed.x),
                    PdfPoints::new(bottom),
                    &image,
                    Some(PdfPoints::new(placed.width)),
                    Some(PdfPoints::new(placed.height)),
                )
                .map_err(pdf_err("placing image"))?;
        }
    }

    document.save_to_bytes().map_err(pdf_err("saving PDF"))
}

// ── Markup ───────────────────────────────────────────────────────────────

/// Draws text with the non-embedded standard fonts and vector rules, so
/// `RenderOptions::scale` and `RenderOptions::image_quality` have nothing to
/// apply to and are ignored.
impl MarkupToPdf for PdfiumBackend {
    fn render(&self, markup: &str, options: &RenderOptions) -> Result<Vec<u8>, FileError> {
        let (width, height) = options.page_dimensions();
        let blocks = layout::extract_blocks(markup);
        let laid_out = layout::layout(&blocks, (width, height), options.margin);
        debug!(
            "Markup layout: {} blocks → {} pages at {}x{} pt",
            blocks.len(),
            laid_out.len(),
            width,
            height
        );

        let (pdf, replaced) = with_pdfium(|pdfium| draw_document(pdfium, &laid_out, options))?;
        if replaced > 0 {
            warn!(
                "{} characters have no glyph in the standard fonts and were drawn as '{}'",
                replaced,
                layout::REPLACEMENT_GLYPH
            );
        }
        Ok(pdf)
    }
}

/// PDF bytes plus the number of characters replaced for lack of a glyph.
fn draw_document(
    pdfium: &Pdfium,
    pages: &[LaidOutPage],
    options: &RenderOptions,
) -> Result<(Vec<u8>, usize), FileError> {
    let (width, height) = options.page_dimensions();
    let mut document = pdfium.create_new_pdf().map_err(pdf_err("creating PDF"))?;
    let regular = document.fonts_mut().helvetica();
    let bold = document.fonts_mut().helvetica_bold();
    let mono = document.fonts_mut().courier();

    let mut replaced = 0;
    for page_layout in pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(
                PdfPoints::new(width),
                PdfPoints::new(height),
            ))
            .map_err(pdf_err("adding page"))?;

        replaced += draw_page(&mut page, page_layout, options, height, [regular, bold, mono])?;
    }

    let bytes = document.save_to_bytes().map_err(pdf_err("saving PDF"))?;
    Ok((bytes, replaced))
}

fn draw_page(
    page: &mut PdfPage<'_>,
    content: &LaidOutPage,
    options: &RenderOptions,
    page_height: f32,
    [regular, bold, mono]: [PdfFontToken; 3],
) -> Result<usize, FileError> {
    let objects = page.objects_mut();

    if options.background != [0xff, 0xff, 0xff] {
        let [r, g, b] = options.background;
        let (width, height) = options.page_dimensions();
        objects
            .create_path_object_rect(
                PdfRect::new(
                    PdfPoints::ZERO,
                    PdfPoints::ZERO,
                    PdfPoints::new(height),
                    PdfPoints::new(width),
                ),
                None,
                None,
                Some(PdfColor::new(r, g, b, 255)),
            )
            .map_err(pdf_err("painting background"))?;
    }

    for rule in &content.rules {
        objects
            .create_path_object_line(
                PdfPoints::new(rule.x1),
                PdfPoints::new(page_height - rule.y1),
                PdfPoints::new(rule.x2),
                PdfPoints::new(page_height - rule.y2),
                PdfColor::new(RULE_GREY, RULE_GREY, RULE_GREY, 255),
                PdfPoints::new(0.75),
            )
            .map_err(pdf_err("drawing rule"))?;
    }

    let mut replaced = 0;
    for text in &content.texts {
        let (drawable, missing) = layout::standard_glyphs(&text.text);
        replaced += missing;
        let font = match text.face {
            FontFace::Regular => regular,
            FontFace::Bold => bold,
            FontFace::Mono => mono,
        };
        objects
            .create_text_object(
                PdfPoints::new(text.x),
                PdfPoints::new(page_height - text.baseline),
                drawable.as_ref(),
                font,
                PdfPoints::new(text.size),
            )
            .map_err(pdf_err("drawing text"))?;
    }

    Ok(replaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_can_be_shared_across_blocking_tasks() {
        fn assert_shareable<T: Send + Sync + 'static>() {}
        assert_shareable::<PdfiumBackend>();
    }
}
