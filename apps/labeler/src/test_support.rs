//! Shared fixtures for unit tests: a deterministic monospace face and
//! hand-sized rendered elements.

use std::path::PathBuf;
use std::sync::Arc;

use image::{GrayImage, Luma};

use crate::config::Config;
use crate::layout::arrange::ArrangedElement;
use crate::layout::schema::{Alignment, ElementKind, LabelSpec, Position};
use crate::layout::units::Unit;
use crate::render::{
    ElementDetail, ElementRenderers, FontFace, LinearBarcodeEncoder, QrCodeEncoder, RenderedElement,
};

/// Every glyph is 0.6em wide and the line box is exactly one em tall.
pub struct MonoFace;

impl FontFace for MonoFace {
    fn name(&self) -> &str {
        "mono-test"
    }

    fn advance_width(&self, text: &str, size: u32) -> f32 {
        text.chars().count() as f32 * 0.6 * size as f32
    }

    fn rasterize(&self, text: &str, size: u32) -> GrayImage {
        let width = self.advance_width(text, size).ceil() as u32;
        GrayImage::from_fn(width, size, |x, _| {
            // one dark column per glyph cell so the mask is not blank
            let cell = (0.6 * size as f32).max(1.0) as u32;
            if x % cell == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }
}

pub fn renderers() -> ElementRenderers {
    ElementRenderers {
        qr: Arc::new(QrCodeEncoder),
        barcode: Arc::new(LinearBarcodeEncoder::default()),
        text_face: Arc::new(MonoFace),
        title_face: Arc::new(MonoFace),
    }
}

/// A blank rendered element of the given size.
pub fn rendered(position: u32, kind: ElementKind, width: u32, height: u32) -> RenderedElement {
    let detail = match kind {
        ElementKind::Qr => ElementDetail::Qr {
            module_size: 1,
            version: 1,
            ecl: "M".to_string(),
        },
        ElementKind::Barcode => ElementDetail::Barcode {
            symbology: Default::default(),
        },
        ElementKind::Text | ElementKind::Title => ElementDetail::Text {
            font: "mono-test".to_string(),
            font_size: height,
        },
    };
    RenderedElement {
        position: Position(position),
        kind,
        content: format!("{kind}-{position}"),
        asset: GrayImage::from_pixel(width, height, Luma([0])),
        description: None,
        detail,
    }
}

pub fn arranged(position: u32, kind: ElementKind, width: u32, height: u32) -> ArrangedElement {
    ArrangedElement {
        element: rendered(position, kind, width, height),
        x: 0,
        y: 0,
    }
}

/// Stacks elements the way the virtual pass does: first at `top`, then
/// `margin_y` below the previous bottom.
pub fn stack(mut elements: Vec<ArrangedElement>, top: u32, margin_y: u32) -> Vec<ArrangedElement> {
    let mut y = top;
    for el in elements.iter_mut() {
        el.y = y;
        y = el.bottom() + margin_y;
    }
    elements
}

pub fn config() -> Config {
    Config {
        port: 0,
        rust_log: "info".into(),
        font_path: PathBuf::from("unused.ttf"),
        title_font_path: PathBuf::from("unused.ttf"),
        asset_dir: std::env::temp_dir(),
        default_label: LabelSpec {
            width: 3.0,
            height: 4.0,
            resolution: 203.0,
            unit: Unit::Inch,
        },
        default_alignment: Alignment::Left,
        printer_addr: None,
        printer_spool_dir: std::env::temp_dir(),
        printer_dpmm: 8,
    }
}
