//! Target resolution: (category, requested target) → concrete output format.
//!
//! The explicit-target table below is the single authority on which
//! conversions exist. [`available_targets`] is only a picker affordance built
//! from the same table.

use crate::error::FileError;
use crate::format::{FormatCategory, OutputFormat, TargetFormat};
use std::collections::BTreeSet;

/// Resolve the effective output format for a file of `category`.
///
/// # Errors
/// * [`FileError::NoAutoTarget`]: `Auto` requested for an unrecognised file
/// * [`FileError::UnsupportedCombination`]: the pair is not in the table
pub fn resolve(category: FormatCategory, requested: TargetFormat) -> Result<OutputFormat, FileError> {
    match requested {
        TargetFormat::Auto => auto_target(category).ok_or(FileError::NoAutoTarget { category }),
        TargetFormat::Explicit(format) => {
            explicit_target(category, format).ok_or(FileError::UnsupportedCombination {
                category,
                requested,
            })
        }
    }
}

/// Default output for `Auto`, mirroring the classifier's precedence.
fn auto_target(category: FormatCategory) -> Option<OutputFormat> {
    match category {
        FormatCategory::RichDocument => Some(OutputFormat::Pdf),
        FormatCategory::PlainText => Some(OutputFormat::Pdf),
        FormatCategory::Markdown => Some(OutputFormat::Pdf),
        FormatCategory::PortableDocument => Some(OutputFormat::ZipOfPng),
        FormatCategory::Image => Some(OutputFormat::Png),
        FormatCategory::Unrecognized => None,
    }
}

/// Validate an explicit request. PDF inputs accept plain PNG/JPEG and route
/// them to the archive routine.
fn explicit_target(category: FormatCategory, format: OutputFormat) -> Option<OutputFormat> {
    use OutputFormat::*;
    match (category, format) {
        (FormatCategory::Image, Png | Jpeg | Webp | Ico | Pdf) => Some(format),
        (FormatCategory::PortableDocument, ZipOfPng | Png) => Some(ZipOfPng),
        (FormatCategory::PortableDocument, ZipOfJpeg | Jpeg) => Some(ZipOfJpeg),
        (FormatCategory::RichDocument | FormatCategory::PlainText | FormatCategory::Markdown, Pdf) => {
            Some(Pdf)
        }
        _ => None,
    }
}

/// Explicit targets valid for one category, in display order. Aliases are
/// not listed.
pub fn valid_targets(category: FormatCategory) -> Vec<OutputFormat> {
    OutputFormat::ALL
        .into_iter()
        .filter(|&f| explicit_target(category, f) == Some(f))
        .collect()
}

/// Targets offered to the user for a queue holding `categories_present`:
/// `Auto` plus the union of every present category's valid targets.
pub fn available_targets<I>(categories_present: I) -> Vec<TargetFormat>
where
    I: IntoIterator<Item = FormatCategory>,
{
    let explicit: BTreeSet<OutputFormat> = categories_present
        .into_iter()
        .flat_map(valid_targets)
        .collect();

    std::iter::once(TargetFormat::Auto)
        .chain(explicit.into_iter().map(TargetFormat::Explicit))
        .collect()
}
