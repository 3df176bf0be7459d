//! PDF → ZIP of page images.
//!
//! Every page is rendered at twice its natural size and encoded at a fixed
//! quality of 0.95, independent of the batch's image-quality setting. Entries
//! are named `page-01.png`, `page-02.png`, … with at least two digits so
//! archives of up to 99 pages sort correctly by name.

use super::{Artifact, CancelFlag};
use crate::backend::{Backends, RasterFormat};
use crate::error::FileError;
use crate::format::replace_ext;
use crate::progress::ConversionProgressCallback;
use tracing::{debug, info, warn};

/// Page render scale relative to the page's natural size.
pub const RENDER_SCALE: f32 = 2.0;

/// Encode quality for page images.
pub const PAGE_QUALITY: f32 = 0.95;

/// Entry name for a 1-indexed page.
pub fn page_entry_name(page: usize, extension: &str) -> String {
    format!("page-{page:02}.{extension}")
}

/// Rasterise every page and package the images in one archive.
///
/// `progress` receives `on_page_progress(page, total)` after each page.
/// A raised `cancel` flag stops the work before the next page.
pub fn pdf_to_archive(
    backends: &Backends,
    name: &str,
    bytes: &[u8],
    format: RasterFormat,
    progress: &dyn ConversionProgressCallback,
    cancel: &CancelFlag,
) -> Result<Artifact, FileError> {
    if format == RasterFormat::Webp {
        return Err(FileError::render("page archives hold PNG or JPEG images"));
    }
    let extension = format.extension();

    let mut archive = backends.archive.create();
    let total = backends
        .rasterizer
        .rasterize(bytes, RENDER_SCALE, &mut |index, total, page| {
            if cancel.is_cancelled() {
                return Err(FileError::render(format!(
                    "cancelled before page {}",
                    index + 1
                )));
            }
            if index == 0 {
                info!("{}: rasterising {} pages → {}", name, total, extension);
            }
            let encoded = backends.raster.encode(&page, format, PAGE_QUALITY)?;
            let entry = page_entry_name(index + 1, extension);
            debug!("{}: {} ({} bytes)", name, entry, encoded.len());
            archive.add_entry(&entry, &encoded)?;
            progress.on_page_progress(index + 1, total);
            Ok(())
        })?;

    if total == 0 {
        warn!("{}: PDF has no pages, archive is empty", name);
    }

    Ok(Artifact {
        file_name: replace_ext(name, &format!("-{extension}.zip")),
        bytes: archive.finish()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_are_zero_padded() {
        assert_eq!(page_entry_name(1, "png"), "page-01.png");
        assert_eq!(page_entry_name(12, "jpg"), "page-12.jpg");
        assert_eq!(page_entry_name(100, "png"), "page-100.png");
    }
}
