//! Element rendering: turns one `(kind, content)` pair into a greyscale raster
//! exactly as wide as the region's interior.
//!
//! Encoding and glyph rasterization sit behind traits; the engine only decides
//! sizes. Swapping a back-end never touches layout code.

pub mod barcode;
pub mod qr;
pub mod text;

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::GrayImage;
use serde::Serialize;

use crate::layout::autosize::{font_size, qr_module_size, qr_symbol_width, FONT_INITIAL_STEP};
use crate::layout::error::LayoutError;
use crate::layout::schema::{ElementKind, Position};

pub use barcode::{LinearBarcodeEncoder, Symbology};
pub use qr::QrCodeEncoder;
pub use text::TrueTypeFace;

// ────────────────────────────────────────────────────────────────────────────
// Back-end traits
// ────────────────────────────────────────────────────────────────────────────

/// Dark/light module grid of an encoded QR symbol.
#[derive(Debug, Clone)]
pub struct QrMatrix {
    /// Modules per side.
    pub modules: u32,
    /// Row-major, `true` = dark.
    pub dark: Vec<bool>,
    pub version: i16,
    pub ecl: String,
}

pub trait QrEncoder: Send + Sync {
    fn encode(&self, content: &str) -> anyhow::Result<QrMatrix>;
}

pub trait BarcodeEncoder: Send + Sync {
    /// Bar/space modules, `1` = bar.
    fn encode(&self, content: &str) -> anyhow::Result<Vec<u8>>;
    fn symbology(&self) -> Symbology;
}

pub trait FontFace: Send + Sync {
    fn name(&self) -> &str;
    /// Horizontal advance of `text` at `size` pixels per em.
    fn advance_width(&self, text: &str, size: u32) -> f32;
    /// Black-on-white mask of `text` at `size`, cropped to the line box.
    fn rasterize(&self, text: &str, size: u32) -> GrayImage;
}

// ────────────────────────────────────────────────────────────────────────────
// Rendered output
// ────────────────────────────────────────────────────────────────────────────

/// What the sizing search settled on, kept for descriptions and command emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementDetail {
    Qr {
        module_size: u32,
        version: i16,
        ecl: String,
    },
    Barcode {
        symbology: Symbology,
    },
    Text {
        font: String,
        font_size: u32,
    },
}

#[derive(Debug, Clone)]
pub struct RenderedElement {
    pub position: Position,
    pub kind: ElementKind,
    pub content: String,
    pub asset: GrayImage,
    pub description: Option<String>,
    pub detail: ElementDetail,
}

impl RenderedElement {
    pub fn size(&self) -> (u32, u32) {
        self.asset.dimensions()
    }
}

/// Nominal pixels per barcode module before scaling to the region.
const BAR_MODULE_PX: u32 = 2;
/// Nominal bar height: 15mm bars on 0.2mm modules.
const BAR_HEIGHT_PX: u32 = 150;
const BAR_MODULE_WIDTH_MM: f32 = 0.2;

// ────────────────────────────────────────────────────────────────────────────
// Renderer set
// ────────────────────────────────────────────────────────────────────────────

/// The back-ends used for one batch. Cheap to clone, shared across rows.
#[derive(Clone)]
pub struct ElementRenderers {
    pub qr: Arc<dyn QrEncoder>,
    pub barcode: Arc<dyn BarcodeEncoder>,
    pub text_face: Arc<dyn FontFace>,
    pub title_face: Arc<dyn FontFace>,
}

impl ElementRenderers {
    /// Renders `content` as `kind`.
    ///
    /// `sizing_width` is the full region width the auto-sizers aim for;
    /// `target_width` is the interior width the final raster is scaled to.
    pub fn render(
        &self,
        position: Position,
        kind: ElementKind,
        content: &str,
        sizing_width: u32,
        target_width: u32,
    ) -> Result<RenderedElement, LayoutError> {
        let fail = |reason: String| LayoutError::Render {
            position,
            kind,
            reason,
        };

        if content.is_empty() {
            return Err(fail("content is empty".to_string()));
        }
        if target_width == 0 {
            return Err(fail("region interior has zero width".to_string()));
        }

        let (asset, detail) = match kind {
            ElementKind::Qr => {
                let matrix = self.qr.encode(content).map_err(|e| fail(e.to_string()))?;
                let module_size = qr_module_size(sizing_width, |s| qr_symbol_width(matrix.modules, s));
                let raw = qr::rasterize(&matrix, module_size, 0);
                let asset = imageops::resize(&raw, target_width, target_width, FilterType::Nearest);
                (
                    asset,
                    ElementDetail::Qr {
                        module_size,
                        version: matrix.version,
                        ecl: matrix.ecl,
                    },
                )
            }
            ElementKind::Barcode => {
                let modules = self.barcode.encode(content).map_err(|e| fail(e.to_string()))?;
                if modules.is_empty() {
                    return Err(fail("barcode encoder produced no modules".to_string()));
                }
                let raw = barcode::rasterize(&modules, BAR_MODULE_PX, BAR_HEIGHT_PX);
                let asset = scale_to_width(&raw, target_width, FilterType::Nearest);
                (
                    asset,
                    ElementDetail::Barcode {
                        symbology: self.barcode.symbology(),
                    },
                )
            }
            ElementKind::Text | ElementKind::Title => {
                let face = if kind == ElementKind::Title {
                    &self.title_face
                } else {
                    &self.text_face
                };
                if face.advance_width(content, FONT_INITIAL_STEP) <= 0.0 {
                    return Err(fail(format!(
                        "text has no advance width in font `{}`",
                        face.name()
                    )));
                }
                let size = font_size(sizing_width, |s| face.advance_width(content, s));
                let raw = face.rasterize(content, size);
                if raw.width() == 0 || raw.height() == 0 {
                    return Err(fail(format!("font `{}` produced an empty mask", face.name())));
                }
                let asset = scale_to_width(&raw, target_width, FilterType::Triangle);
                (
                    asset,
                    ElementDetail::Text {
                        font: face.name().to_string(),
                        font_size: size,
                    },
                )
            }
        };

        Ok(RenderedElement {
            position,
            kind,
            content: content.to_string(),
            description: describe(kind, content, &detail),
            asset,
            detail,
        })
    }
}

/// Resizes to `width`, keeping the aspect ratio (height truncated, at least 1px).
pub(crate) fn scale_to_width(img: &GrayImage, width: u32, filter: FilterType) -> GrayImage {
    let ratio = img.height() as f64 / img.width() as f64;
    let height = ((width as f64 * ratio) as u32).max(1);
    imageops::resize(img, width, height, filter)
}

/// `key: value | key: value` summary for auxiliary display. Titles carry none.
fn describe(kind: ElementKind, content: &str, detail: &ElementDetail) -> Option<String> {
    let fields: Vec<(&str, String)> = match (kind, detail) {
        (ElementKind::Title, _) => return None,
        (_, ElementDetail::Qr { module_size, version, ecl }) => vec![
            ("content", content.to_string()),
            ("module_size", module_size.to_string()),
            ("version", version.to_string()),
            ("ecl", ecl.clone()),
        ],
        (_, ElementDetail::Barcode { symbology }) => vec![
            ("content", content.to_string()),
            ("module_width", format!("{BAR_MODULE_WIDTH_MM}")),
            ("symbology", symbology.to_string()),
        ],
        (_, ElementDetail::Text { font, font_size }) => vec![
            ("content", content.to_string()),
            ("font", font.clone()),
            ("font_size", font_size.to_string()),
        ],
    };

    Some(
        fields
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(" | "),
    )
}
