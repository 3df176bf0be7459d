//! Format classification and the output-format vocabulary.
//!
//! [`classify`] turns a file's name and advisory media type into a closed
//! [`FormatCategory`]. Everything downstream (target resolution, routine
//! selection, list badges) matches on that enum instead of re-running the
//! detection predicates, so the precedence rule lives in exactly one place.
//!
//! ## Precedence
//!
//! A file can satisfy several predicates at once: `report.docx` uploaded with
//! an `image/png` hint, or a `.pdf` mislabelled by the OS. The first match in
//! this order wins:
//!
//! ```text
//! RichDocument > PortableDocument > Markdown > PlainText > Image > Unrecognized
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Semantic category of an input file. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatCategory {
    Image,
    PortableDocument,
    RichDocument,
    PlainText,
    Markdown,
    Unrecognized,
}

impl FormatCategory {
    /// Every category, in classifier precedence order.
    pub const ALL: [FormatCategory; 6] = [
        FormatCategory::RichDocument,
        FormatCategory::PortableDocument,
        FormatCategory::Markdown,
        FormatCategory::PlainText,
        FormatCategory::Image,
        FormatCategory::Unrecognized,
    ];

    /// Short badge shown next to a queued file.
    pub fn tag(self) -> &'static str {
        match self {
            FormatCategory::Image => "IMAGE",
            FormatCategory::PortableDocument => "PDF",
            FormatCategory::RichDocument => "DOCX",
            FormatCategory::PlainText => "TXT",
            FormatCategory::Markdown => "MD",
            FormatCategory::Unrecognized => "FILE",
        }
    }
}

impl fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Classify a file by display name and media-type hint.
///
/// The hint may be empty. Matching is case-insensitive on both inputs.
pub fn classify(name: &str, media_type_hint: &str) -> FormatCategory {
    let name = name.to_lowercase();
    let hint = media_type_hint.to_lowercase();

    if hint.contains(DOCX_MIME) || name.ends_with(".docx") {
        FormatCategory::RichDocument
    } else if hint.contains("application/pdf") || name.ends_with(".pdf") {
        FormatCategory::PortableDocument
    } else if hint.starts_with("text/markdown") || name.ends_with(".md") {
        FormatCategory::Markdown
    } else if hint.starts_with("text/plain") || name.ends_with(".txt") {
        FormatCategory::PlainText
    } else if is_image(&name, &hint) {
        FormatCategory::Image
    } else {
        FormatCategory::Unrecognized
    }
}

/// An `image/*` hint is authoritative; only without one does the name decide.
fn is_image(name: &str, hint: &str) -> bool {
    const RASTER_TOKENS: [&str; 4] = ["png", "jpeg", "jpg", "webp"];
    if hint.starts_with("image/") {
        return RASTER_TOKENS.iter().any(|t| hint.ends_with(t));
    }
    [".png", ".jpg", ".jpeg", ".webp"]
        .iter()
        .any(|ext| name.ends_with(ext))
}

/// A concrete conversion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
    Ico,
    Pdf,
    /// PDF pages rasterised to PNG, packaged in one ZIP.
    ZipOfPng,
    /// PDF pages rasterised to JPEG, packaged in one ZIP.
    ZipOfJpeg,
}

impl OutputFormat {
    /// Stable display order used by target pickers.
    pub const ALL: [OutputFormat; 7] = [
        OutputFormat::Png,
        OutputFormat::Jpeg,
        OutputFormat::Webp,
        OutputFormat::Ico,
        OutputFormat::Pdf,
        OutputFormat::ZipOfPng,
        OutputFormat::ZipOfJpeg,
    ];

    /// Token used on the command line and in file names.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
            OutputFormat::Ico => "ico",
            OutputFormat::Pdf => "pdf",
            OutputFormat::ZipOfPng => "zip-png",
            OutputFormat::ZipOfJpeg => "zip-jpg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::ZipOfPng => f.write_str("ZIP (PNG)"),
            OutputFormat::ZipOfJpeg => f.write_str("ZIP (JPG)"),
            other => f.write_str(&other.as_str().to_uppercase()),
        }
    }
}

/// The user's requested target: a concrete format or `Auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    /// Let the category pick its default output.
    #[default]
    Auto,
    Explicit(OutputFormat),
}

impl TargetFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetFormat::Auto => "auto",
            TargetFormat::Explicit(f) => f.as_str(),
        }
    }
}

impl From<OutputFormat> for TargetFormat {
    fn from(f: OutputFormat) -> Self {
        TargetFormat::Explicit(f)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFormat::Auto => f.write_str("AUTO"),
            TargetFormat::Explicit(o) => o.fmt(f),
        }
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let target = match s.trim().to_lowercase().as_str() {
            "" | "auto" => TargetFormat::Auto,
            "png" => OutputFormat::Png.into(),
            "jpg" | "jpeg" => OutputFormat::Jpeg.into(),
            "webp" => OutputFormat::Webp.into(),
            "ico" => OutputFormat::Ico.into(),
            "pdf" => OutputFormat::Pdf.into(),
            "zip-png" | "zip_png" | "zip" => OutputFormat::ZipOfPng.into(),
            "zip-jpg" | "zip_jpg" | "zip-jpeg" => OutputFormat::ZipOfJpeg.into(),
            other => return Err(format!("unknown target format '{other}'")),
        };
        Ok(target)
    }
}

static TRAILING_EXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[^.]+$").expect("static regex"));

/// Replace the last `.ext` of `file_name` with `new_suffix`.
///
/// A name without an extension gets the suffix appended. The original
/// extension's case is irrelevant: `photo.JPG` → `photo.png`.
pub fn replace_ext(file_name: &str, new_suffix: &str) -> String {
    format!("{}{}", TRAILING_EXT.replace(file_name, ""), new_suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_extension() {
        assert_eq!(classify("a.png", ""), FormatCategory::Image);
        assert_eq!(classify("a.JPEG", ""), FormatCategory::Image);
        assert_eq!(classify("a.webp", ""), FormatCategory::Image);
        assert_eq!(classify("a.pdf", ""), FormatCategory::PortableDocument);
        assert_eq!(classify("a.DOCX", ""), FormatCategory::RichDocument);
        assert_eq!(classify("notes.txt", ""), FormatCategory::PlainText);
        assert_eq!(classify("README.md", ""), FormatCategory::Markdown);
        assert_eq!(classify("archive.tar.gz", ""), FormatCategory::Unrecognized);
        assert_eq!(classify("", ""), FormatCategory::Unrecognized);
    }

    #[test]
    fn classify_by_media_type() {
        assert_eq!(classify("blob", "image/png"), FormatCategory::Image);
        assert_eq!(classify("blob", "IMAGE/JPEG"), FormatCategory::Image);
        assert_eq!(classify("blob", "application/pdf"), FormatCategory::PortableDocument);
        assert_eq!(classify("blob", DOCX_MIME), FormatCategory::RichDocument);
        assert_eq!(classify("blob", "text/plain; charset=utf-8"), FormatCategory::PlainText);
        assert_eq!(classify("blob", "text/markdown"), FormatCategory::Markdown);
    }

    #[test]
    fn docx_beats_image_hint() {
        assert_eq!(classify("report.docx", "image/png"), FormatCategory::RichDocument);
    }

    #[test]
    fn pdf_beats_image_hint() {
        assert_eq!(classify("scan.pdf", "image/jpeg"), FormatCategory::PortableDocument);
    }

    #[test]
    fn markdown_beats_plain_text_hint() {
        assert_eq!(classify("notes.md", "text/plain"), FormatCategory::Markdown);
    }

    #[test]
    fn unsupported_image_hint_overrides_extension() {
        // An explicit image/* hint for an unsupported raster format wins over
        // a matching extension.
        assert_eq!(classify("icon.png", "image/gif"), FormatCategory::Unrecognized);
    }

    #[test]
    fn target_parse() {
        assert_eq!("auto".parse::<TargetFormat>().unwrap(), TargetFormat::Auto);
        assert_eq!(
            "JPEG".parse::<TargetFormat>().unwrap(),
            TargetFormat::Explicit(OutputFormat::Jpeg)
        );
        assert_eq!(
            "zip-jpg".parse::<TargetFormat>().unwrap(),
            TargetFormat::Explicit(OutputFormat::ZipOfJpeg)
        );
        assert!("gif".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn replace_ext_cases() {
        assert_eq!(replace_ext("photo.JPG", ".png"), "photo.png");
        assert_eq!(replace_ext("noext", ".png"), "noext.png");
        assert_eq!(replace_ext("a.b.c", ".pdf"), "a.b.pdf");
        assert_eq!(replace_ext("doc.pdf", "-png.zip"), "doc-png.zip");
    }

    #[test]
    fn display_tokens() {
        assert_eq!(OutputFormat::Jpeg.to_string(), "JPG");
        assert_eq!(TargetFormat::Auto.to_string(), "AUTO");
        assert_eq!(FormatCategory::Image.to_string(), "IMAGE");
    }
}
