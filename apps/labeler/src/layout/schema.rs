//! Label schema: which element kind sits at which position, and the label it is printed on.
//!
//! The schema is built once per batch and shared read-only by every row.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::layout::error::LayoutError;
use crate::layout::units::{convert, to_millimeters, Dimension, MmSize, Unit, MM_PER_INCH};

// ────────────────────────────────────────────────────────────────────────────
// Positions and element kinds
// ────────────────────────────────────────────────────────────────────────────

/// Slot index on a label. Ascending order is top-to-bottom within a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(pub u32);

impl Position {
    pub const QR: Position = Position(0);
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of things a position can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ElementKind {
    Qr,
    Barcode,
    Text,
    Title,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Qr => "qr",
            ElementKind::Barcode => "barcode",
            ElementKind::Text => "text",
            ElementKind::Title => "title",
        }
    }

    /// Text and titles are drawn from a font and scale uniformly.
    pub fn is_textual(self) -> bool {
        matches!(self, ElementKind::Text | ElementKind::Title)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qr" => Ok(ElementKind::Qr),
            "bar" | "barcode" => Ok(ElementKind::Barcode),
            "text" => Ok(ElementKind::Text),
            "title" => Ok(ElementKind::Title),
            other => Err(LayoutError::UnknownElementKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for ElementKind {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.as_str().to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Position map
// ────────────────────────────────────────────────────────────────────────────

/// One schema slot as supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSpec {
    pub position: Position,
    pub kind: ElementKind,
    /// Defaults to true for everything except QR codes, which never resize.
    #[serde(default)]
    pub resizable: Option<bool>,
}

/// `Position -> ElementKind`, validated and ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMap {
    slots: BTreeMap<Position, ElementKind>,
    resizable: BTreeMap<Position, bool>,
}

impl PositionMap {
    /// Builds the map, rejecting duplicate positions and enforcing the QR-at-zero convention.
    pub fn new(slots: &[SlotSpec]) -> Result<Self, LayoutError> {
        let mut kinds = BTreeMap::new();
        let mut resizable = BTreeMap::new();

        for slot in slots {
            if kinds.insert(slot.position, slot.kind).is_some() {
                return Err(LayoutError::Schema(format!(
                    "position {} is declared more than once",
                    slot.position
                )));
            }
            let can_resize = match slot.kind {
                ElementKind::Qr => false,
                _ => slot.resizable.unwrap_or(true),
            };
            resizable.insert(slot.position, can_resize);
        }

        match kinds.get(&Position::QR) {
            Some(ElementKind::Qr) => {}
            Some(other) => {
                return Err(LayoutError::Schema(format!(
                    "position 0 is reserved for the QR code, found {other}"
                )))
            }
            None => {
                return Err(LayoutError::Schema(
                    "schema must place a QR code at position 0".to_string(),
                ))
            }
        }

        let qr_count = kinds.values().filter(|k| **k == ElementKind::Qr).count();
        if qr_count != 1 {
            return Err(LayoutError::Schema(format!(
                "exactly one QR code is allowed, found {qr_count}"
            )));
        }

        Ok(Self {
            slots: kinds,
            resizable,
        })
    }

    pub fn kind(&self, position: Position) -> Option<ElementKind> {
        self.slots.get(&position).copied()
    }

    pub fn is_resizable(&self, position: Position) -> bool {
        self.resizable.get(&position).copied().unwrap_or(false)
    }

    pub fn resizable_flags(&self) -> &BTreeMap<Position, bool> {
        &self.resizable
    }

    /// Slots in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, ElementKind)> + '_ {
        self.slots.iter().map(|(p, k)| (*p, *k))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Label spec, margins, alignment
// ────────────────────────────────────────────────────────────────────────────

/// Physical label: size in `unit`, with `resolution` dots per `unit`
/// (dots-per-inch for inches and pixels, dots-per-mm for millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub width: f64,
    pub height: f64,
    pub resolution: f64,
    pub unit: Unit,
}

impl LabelSpec {
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Raster size of the whole label in pixels (truncated), via [`convert`].
    pub fn pixel_size(&self) -> Result<(u32, u32), LayoutError> {
        let size = Dimension::new(self.width, self.height);
        let px = match self.unit {
            Unit::Pixel => size,
            Unit::Inch => convert(size, Unit::Inch, Some(self.resolution), Unit::Pixel)?,
            // millimeter labels declare dots per mm, `convert` takes dots per inch
            Unit::Mm => convert(size, Unit::Mm, Some(self.resolution * MM_PER_INCH), Unit::Pixel)?,
        };
        Ok((px.width as u32, px.height as u32))
    }

    /// The label in device terms: millimeters and dots per millimeter.
    pub fn device(&self) -> Result<MmSize, LayoutError> {
        match self.unit {
            Unit::Inch | Unit::Pixel => to_millimeters(
                Dimension::new(self.width, self.height),
                self.resolution,
                self.unit,
                None,
            ),
            Unit::Mm => {
                let (w, h) = self.pixel_size()?;
                to_millimeters(
                    Dimension::new(self.width, self.height),
                    self.resolution,
                    Unit::Mm,
                    Some((w, h)),
                )
            }
        }
    }
}

/// Pixel gaps: `x` on both sides of every region, `y` above and between elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub x: u32,
    pub y: u32,
}

impl Margins {
    pub fn uniform(m: u32) -> Self {
        Self { x: m, y: m }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(format!("unknown alignment `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(position: u32, kind: ElementKind) -> SlotSpec {
        SlotSpec {
            position: Position(position),
            kind,
            resizable: None,
        }
    }

    // ── ElementKind ─────────────────────────────────────────────────────────

    #[test]
    fn test_element_kind_parses_aliases() {
        assert_eq!("bar".parse::<ElementKind>().unwrap(), ElementKind::Barcode);
        assert_eq!("QR".parse::<ElementKind>().unwrap(), ElementKind::Qr);
        assert!(matches!(
            "sticker".parse::<ElementKind>(),
            Err(LayoutError::UnknownElementKind(_))
        ));
    }

    #[test]
    fn test_element_kind_deserializes_from_string() {
        let slots: Vec<SlotSpec> =
            serde_json::from_str(r#"[{"position":0,"kind":"qr"},{"position":1,"kind":"bar"}]"#)
                .unwrap();
        assert_eq!(slots[1].kind, ElementKind::Barcode);

        let bad = serde_json::from_str::<Vec<SlotSpec>>(r#"[{"position":0,"kind":"logo"}]"#);
        assert!(bad.is_err(), "unknown kinds must be rejected at the boundary");
    }

    // ── PositionMap ─────────────────────────────────────────────────────────

    #[test]
    fn test_position_map_orders_ascending() {
        let map = PositionMap::new(&[
            slot(2, ElementKind::Barcode),
            slot(0, ElementKind::Qr),
            slot(1, ElementKind::Text),
        ])
        .unwrap();
        let order: Vec<u32> = map.iter().map(|(p, _)| p.0).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_position_map_rejects_duplicates() {
        let err = PositionMap::new(&[slot(0, ElementKind::Qr), slot(0, ElementKind::Text)]);
        assert!(matches!(err, Err(LayoutError::Schema(_))));
    }

    #[test]
    fn test_position_map_requires_qr_at_zero() {
        assert!(PositionMap::new(&[slot(0, ElementKind::Text)]).is_err());
        assert!(PositionMap::new(&[slot(1, ElementKind::Text)]).is_err());
        assert!(PositionMap::new(&[slot(0, ElementKind::Qr), slot(3, ElementKind::Qr)]).is_err());
    }

    #[test]
    fn test_qr_is_never_resizable() {
        let map = PositionMap::new(&[
            SlotSpec {
                position: Position(0),
                kind: ElementKind::Qr,
                resizable: Some(true),
            },
            slot(1, ElementKind::Text),
            SlotSpec {
                position: Position(2),
                kind: ElementKind::Barcode,
                resizable: Some(false),
            },
        ])
        .unwrap();
        assert!(!map.is_resizable(Position(0)));
        assert!(map.is_resizable(Position(1)));
        assert!(!map.is_resizable(Position(2)));
    }

    // ── LabelSpec ───────────────────────────────────────────────────────────

    #[test]
    fn test_label_spec_pixel_size_and_orientation() {
        let spec = LabelSpec {
            width: 3.0,
            height: 4.0,
            resolution: 203.0,
            unit: Unit::Inch,
        };
        assert_eq!(spec.pixel_size().unwrap(), (609, 812));
        assert!(!spec.is_landscape());

        let landscape = LabelSpec {
            width: 4.0,
            height: 3.0,
            ..spec
        };
        assert!(landscape.is_landscape());
    }

    #[test]
    fn test_mm_label_pixel_size_uses_dots_per_mm() {
        let spec = LabelSpec {
            width: 76.2,
            height: 101.6,
            resolution: 8.0,
            unit: Unit::Mm,
        };
        assert_eq!(spec.pixel_size().unwrap(), (609, 812));
    }

    #[test]
    fn test_pixel_size_without_resolution_fails() {
        let spec = LabelSpec {
            width: 3.0,
            height: 4.0,
            resolution: 0.0,
            unit: Unit::Inch,
        };
        assert!(matches!(spec.pixel_size(), Err(LayoutError::MissingResolution(_))));
    }

    #[test]
    fn test_label_spec_device_for_mm_labels() {
        let spec = LabelSpec {
            width: 50.0,
            height: 30.0,
            resolution: 8.0,
            unit: Unit::Mm,
        };
        let device = spec.device().unwrap();
        assert_eq!(device.dpmm, 8);
        assert!((device.size.width - 50.0).abs() < 1e-9);
    }
}
