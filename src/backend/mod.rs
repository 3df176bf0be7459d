//! External capabilities the dispatcher depends on.
//!
//! The conversion routines never touch a codec, PDF engine or archive
//! format directly. They talk to the traits below, grouped in [`Backends`],
//! so that tests can swap any capability for a fake and so the rendering
//! engine can change without touching routing logic.
//!
//! | Trait | Default implementation |
//! |-------|------------------------|
//! | [`RasterCodec`] | [`raster::ImageCodec`] (`image` crate) |
//! | [`PdfRasterizer`] | [`pdfium::PdfiumBackend`] |
//! | [`PdfAuthoring`] | [`pdfium::PdfiumBackend`] |
//! | [`MarkupToPdf`] | [`pdfium::PdfiumBackend`] over [`layout`] |
//! | [`DocumentToMarkup`] | [`docx::DocxToHtml`] |
//! | [`MarkupTransform`] | [`markdown::MarkdownToHtml`] |
//! | [`ArchiveFactory`] | [`archive::ZipArchiveFactory`] |
//!
//! Every method is synchronous: the dispatcher calls them from
//! `spawn_blocking`, one file at a time. Implementations must not keep engine
//! state alive between calls.

pub mod archive;
pub mod docx;
pub mod layout;
pub mod markdown;
pub mod pdfium;
pub mod raster;

use crate::error::FileError;
use image::DynamicImage;
use std::sync::Arc;

/// Encoded raster formats the codec can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Webp,
}

impl RasterFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Webp => "webp",
        }
    }
}

/// Encoded bytes ⇄ pixel buffer.
pub trait RasterCodec: Send + Sync {
    /// Decode at native resolution. Fails on malformed input.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, FileError>;

    /// Encode at `quality` in `(0, 1]`; lossless formats ignore it.
    fn encode(
        &self,
        image: &DynamicImage,
        format: RasterFormat,
        quality: f32,
    ) -> Result<Vec<u8>, FileError>;

    /// Resample to exactly `width` × `height`, ignoring aspect ratio.
    fn resize_exact(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;
}

/// Receives each rendered page as `(0-indexed page, page count, image)`.
/// Returning an error stops rasterisation.
pub type PageSink<'a> = dyn FnMut(usize, usize, DynamicImage) -> Result<(), FileError> + 'a;

/// PDF bytes → pages of pixels.
pub trait PdfRasterizer: Send + Sync {
    /// Render every page at `scale` × its natural size, in order, handing
    /// each to `on_page`. Returns the page count.
    ///
    /// Fails if `bytes` is not a readable PDF.
    fn rasterize(
        &self,
        bytes: &[u8],
        scale: f32,
        on_page: &mut PageSink<'_>,
    ) -> Result<usize, FileError>;
}

/// An image placed on a page. Coordinates are in points from the page's
/// top-left corner.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Generic (JPEG) encoding of the image, whatever the source format.
    pub jpeg: Vec<u8>,
}

/// One output page with its final geometry.
#[derive(Debug, Clone)]
pub struct PagePlan {
    pub width: f32,
    pub height: f32,
    pub images: Vec<PlacedImage>,
}

/// Page plans → PDF bytes. Each page is created with its final size.
pub trait PdfAuthoring: Send + Sync {
    fn compose(&self, pages: &[PagePlan]) -> Result<Vec<u8>, FileError>;
}

/// Rich document (DOCX) → HTML fragment.
pub trait DocumentToMarkup: Send + Sync {
    /// Fails on corrupt or unsupported document structure.
    fn convert(&self, bytes: &[u8]) -> Result<String, FileError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Options for rendering an HTML document to PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Portrait page width in points.
    pub page_width: f32,
    /// Portrait page height in points.
    pub page_height: f32,
    pub orientation: Orientation,
    /// Margin on every side, in points.
    pub margin: f32,
    /// Rasterisation scale for renderers that paint through a bitmap.
    /// A hint only: the default vector renderer ignores it.
    pub scale: f32,
    /// Sub-image encode quality for renderers that embed bitmaps.
    /// A hint only: the default vector renderer ignores it.
    pub image_quality: f32,
    /// Solid page background (RGB).
    pub background: [u8; 3],
}

impl RenderOptions {
    /// Effective `(width, height)` after orientation.
    pub fn page_dimensions(&self) -> (f32, f32) {
        match self.orientation {
            Orientation::Portrait => (self.page_width, self.page_height),
            Orientation::Landscape => (self.page_height, self.page_width),
        }
    }
}

/// HTML → PDF bytes.
pub trait MarkupToPdf: Send + Sync {
    fn render(&self, markup: &str, options: &RenderOptions) -> Result<Vec<u8>, FileError>;
}

/// Markdown dialect switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub tables: bool,
    pub strikethrough: bool,
    /// Turn bare `http(s)://…` and `www.…` into links.
    pub simplified_autolink: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            simplified_autolink: true,
        }
    }
}

/// Markdown → HTML fragment.
pub trait MarkupTransform: Send + Sync {
    fn to_html(&self, text: &str, options: &MarkdownOptions) -> String;
}

/// A single archive being assembled.
pub trait ArchiveWriter: Send {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), FileError>;
    fn finish(self: Box<Self>) -> Result<Vec<u8>, FileError>;
}

/// Creates a fresh [`ArchiveWriter`] per archive.
pub trait ArchiveFactory: Send + Sync {
    fn create(&self) -> Box<dyn ArchiveWriter>;
}

/// The full set of capabilities used by the dispatcher. Cheap to clone.
#[derive(Clone)]
pub struct Backends {
    pub raster: Arc<dyn RasterCodec>,
    pub rasterizer: Arc<dyn PdfRasterizer>,
    pub authoring: Arc<dyn PdfAuthoring>,
    pub documents: Arc<dyn DocumentToMarkup>,
    pub markup_pdf: Arc<dyn MarkupToPdf>,
    pub markdown: Arc<dyn MarkupTransform>,
    pub archive: Arc<dyn ArchiveFactory>,
}

impl Default for Backends {
    /// `image` + pdfium + zip. Pdfium is bound only when a PDF capability
    /// runs, so image-only batches work without the library installed.
    fn default() -> Self {
        let engine = Arc::new(pdfium::PdfiumBackend::new());
        Self {
            raster: Arc::new(raster::ImageCodec),
            rasterizer: engine.clone(),
            authoring: engine.clone(),
            documents: Arc::new(docx::DocxToHtml),
            markup_pdf: engine,
            markdown: Arc::new(markdown::MarkdownToHtml),
            archive: Arc::new(archive::ZipArchiveFactory),
        }
    }
}

impl Backends {
    /// Route every PDF capability through one pdfium instance.
    pub fn with_pdf_engine(self, engine: Arc<pdfium::PdfiumBackend>) -> Self {
        self.with_rasterizer(engine.clone())
            .with_authoring(engine.clone())
            .with_markup_pdf(engine)
    }

    pub fn with_raster(mut self, raster: Arc<dyn RasterCodec>) -> Self {
        self.raster = raster;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn PdfRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_authoring(mut self, authoring: Arc<dyn PdfAuthoring>) -> Self {
        self.authoring = authoring;
        self
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentToMarkup>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_markup_pdf(mut self, markup_pdf: Arc<dyn MarkupToPdf>) -> Self {
        self.markup_pdf = markup_pdf;
        self
    }

    pub fn with_markdown(mut self, markdown: Arc<dyn MarkupTransform>) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn with_archive(mut self, archive: Arc<dyn ArchiveFactory>) -> Self {
        self.archive = archive;
        self
    }
}
