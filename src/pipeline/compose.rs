//! Image → single-page PDF.
//!
//! ## Why plan pages up front?
//!
//! With [`PageSize::Auto`] the page follows the image's aspect ratio, so its
//! size is only known after decoding. Computing the final geometry first and
//! creating each page at that size avoids resizing a page after the PDF
//! engine has already laid it out.

use super::Artifact;
use crate::backend::{Backends, PagePlan, PlacedImage, RasterFormat};
use crate::config::PageSize;
use crate::error::FileError;
use crate::format::replace_ext;
use tracing::debug;

/// Total horizontal (and vertical) margin around a placed image, in points.
pub const IMAGE_MARGIN: f32 = 40.0;

/// Page `(width, height)` in points for an image of `width` × `height` px.
///
/// `Auto` pages are [`PageSize::AUTO_WIDTH`] wide and as tall as the image's
/// aspect ratio requires, rounded to a whole point.
pub fn page_geometry(width: u32, height: u32, page_size: PageSize) -> (f32, f32) {
    match page_size.dimensions() {
        Some(dims) => dims,
        None => {
            let ratio = width as f32 / height.max(1) as f32;
            let page_height = (PageSize::AUTO_WIDTH / ratio).round().max(1.0);
            (PageSize::AUTO_WIDTH, page_height)
        }
    }
}

/// Scale `width` × `height` to fit inside the page less [`IMAGE_MARGIN`],
/// preserving aspect ratio, and centre it. Returns `(x, y, w, h)` from the
/// page's top-left corner.
pub fn fit_centered(width: u32, height: u32, page: (f32, f32)) -> (f32, f32, f32, f32) {
    let (page_w, page_h) = page;
    let max_w = (page_w - IMAGE_MARGIN).max(1.0);
    let max_h = (page_h - IMAGE_MARGIN).max(1.0);
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);

    let scale = (max_w / w).min(max_h / h);
    let (w, h) = (w * scale, h * scale);
    ((page_w - w) / 2.0, (page_h - h) / 2.0, w, h)
}

/// Embed the image on one page. The image is re-encoded as JPEG whatever
/// its source format.
pub fn image_to_pdf(
    backends: &Backends,
    name: &str,
    bytes: &[u8],
    page_size: PageSize,
    quality: f32,
) -> Result<Artifact, FileError> {
    let image = backends.raster.decode(bytes)?;
    let (img_w, img_h) = (image.width(), image.height());
    let jpeg = backends.raster.encode(&image, RasterFormat::Jpeg, quality)?;

    let page = page_geometry(img_w, img_h, page_size);
    let (x, y, width, height) = fit_centered(img_w, img_h, page);
    debug!(
        "{}: {}x{} px on {:.2}x{:.2} pt page at ({:.1}, {:.1}) size {:.1}x{:.1}",
        name, img_w, img_h, page.0, page.1, x, y, width, height
    );

    let plan = PagePlan {
        width: page.0,
        height: page.1,
        images: vec![PlacedImage {
            x,
            y,
            width,
            height,
            jpeg,
        }],
    };
    let pdf = backends.authoring.compose(&[plan])?;

    Ok(Artifact {
        file_name: replace_ext(name, ".pdf"),
        bytes: pdf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn auto_page_follows_aspect_ratio() {
        assert_eq!(page_geometry(1000, 500, PageSize::Auto), (595.0, 298.0));
        assert_eq!(page_geometry(400, 800, PageSize::Auto), (595.0, 1190.0));
    }

    #[test]
    fn fixed_page_ignores_image() {
        assert_eq!(page_geometry(10, 10, PageSize::A4), (595.28, 841.89));
        assert_eq!(page_geometry(10, 10, PageSize::Letter), (612.0, 792.0));
    }

    #[test]
    fn landscape_image_on_a4_is_width_bound_and_centred() {
        let (x, y, w, h) = fit_centered(2000, 1000, (595.28, 841.89));
        assert!(approx(w, 555.28));
        assert!(approx(h, 277.64));
        assert!(approx(x, 20.0));
        assert!(approx(y, (841.89 - 277.64) / 2.0));
    }

    #[test]
    fn small_images_are_scaled_up() {
        let (_, _, w, h) = fit_centered(10, 20, (595.28, 841.89));
        assert!(approx(h, 801.89));
        assert!(approx(w, 400.945));
    }

    #[test]
    fn auto_page_leaves_equal_margins() {
        let page = page_geometry(1200, 800, PageSize::Auto);
        let (x, y, w, h) = fit_centered(1200, 800, page);
        assert!(approx(x + w / 2.0, page.0 / 2.0));
        assert!(approx(y + h / 2.0, page.1 / 2.0));
    }
}
