use image::{imageops, GrayImage, Luma};

use crate::layout::{LabelSpec, LayoutResult, Margins};

use super::ExportError;

/// Pastes every arranged element onto a white canvas the size of the label.
///
/// Element x coordinates are margin-relative, so each paste is shifted right by
/// `margins.x`.
pub fn compose(
    label: &LabelSpec,
    layout: &LayoutResult,
    margins: Margins,
) -> Result<GrayImage, ExportError> {
    let (w, h) = label.pixel_size()?;
    let mut canvas = GrayImage::from_pixel(w, h, Luma([255]));

    for el in layout.elements.values() {
        imageops::overlay(
            &mut canvas,
            &el.element.asset,
            (el.x + margins.x) as i64,
            el.y as i64,
        );
    }
    Ok(canvas)
}
