//! Unit model: every physical size is routed through millimeters.
//!
//! Resolution is always "dots per declared unit": dots-per-inch for `Inch` and
//! `Pixel` sizes, dots-per-millimeter for `Millimeter` sizes. Pixel counts are
//! truncated, resolutions are rounded.

use serde::{Deserialize, Serialize};

use crate::layout::error::LayoutError;

pub const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[serde(alias = "inches", alias = "in")]
    Inch,
    #[serde(alias = "pixels", alias = "px")]
    Pixel,
    #[serde(alias = "millimeter", alias = "millimeters")]
    Mm,
}

/// A width/height pair in some unit the caller tracks alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Dimension {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// Canonical device form of a size: millimeters plus dots per millimeter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MmSize {
    pub size: Dimension,
    pub dpmm: u32,
}

/// Normalizes `(size, resolution, unit)` to millimeters.
///
/// For `Unit::Mm` the resolution is already dots-per-mm and the size to convert
/// is the secondary pixel measurement; without it the conversion fails.
pub fn to_millimeters(
    size: Dimension,
    resolution: f64,
    unit: Unit,
    secondary: Option<(u32, u32)>,
) -> Result<MmSize, LayoutError> {
    match unit {
        Unit::Inch => {
            require_resolution(resolution, unit)?;
            Ok(MmSize {
                size: size.scaled(MM_PER_INCH),
                dpmm: (resolution / MM_PER_INCH).round() as u32,
            })
        }
        Unit::Pixel => {
            require_resolution(resolution, unit)?;
            Ok(MmSize {
                size: size.scaled(MM_PER_INCH / resolution),
                dpmm: (resolution / MM_PER_INCH).round() as u32,
            })
        }
        Unit::Mm => {
            let (w, h) = secondary.ok_or(LayoutError::MissingSecondaryMeasurement)?;
            require_resolution(resolution, unit)?;
            Ok(MmSize {
                size: Dimension::new(w as f64 / resolution, h as f64 / resolution),
                dpmm: resolution.round() as u32,
            })
        }
    }
}

/// Converts a dimension between units, always passing through millimeters.
///
/// `resolution` is dots-per-inch and is only consulted when either side is `Pixel`.
pub fn convert(
    dimension: Dimension,
    from: Unit,
    resolution: Option<f64>,
    to: Unit,
) -> Result<Dimension, LayoutError> {
    let mm = match from {
        Unit::Inch => dimension.scaled(MM_PER_INCH),
        Unit::Pixel => {
            let dpi = pixel_resolution(resolution, from)?;
            dimension.scaled(MM_PER_INCH / dpi)
        }
        Unit::Mm => dimension,
    };

    match to {
        Unit::Inch => Ok(mm.scaled(1.0 / MM_PER_INCH)),
        Unit::Pixel => {
            let dpi = pixel_resolution(resolution, to)?;
            let px = mm.scaled(dpi / MM_PER_INCH);
            Ok(Dimension::new(whole_pixels(px.width), whole_pixels(px.height)))
        }
        Unit::Mm => Ok(mm),
    }
}

impl MmSize {
    /// Converts a pixel measurement taken on this device's raster to millimeters.
    pub fn measure(&self, pixels: (u32, u32)) -> Result<Dimension, LayoutError> {
        to_millimeters(self.size, self.dpmm as f64, Unit::Mm, Some(pixels)).map(|mm| mm.size)
    }

    /// Millimeters to whole device dots (truncated).
    pub fn dots(&self, mm: f64) -> u32 {
        (mm * self.dpmm as f64).max(0.0) as u32
    }
}

fn require_resolution(resolution: f64, unit: Unit) -> Result<(), LayoutError> {
    if resolution.is_finite() && resolution > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::MissingResolution(unit))
    }
}

/// Truncates to whole pixels, tolerating float error picked up on the way
/// through millimeters (3in at 203dpi is 608.999… before truncation).
fn whole_pixels(v: f64) -> f64 {
    (v + 1e-6).trunc()
}

fn pixel_resolution(resolution: Option<f64>, unit: Unit) -> Result<f64, LayoutError> {
    let dpi = resolution.ok_or(LayoutError::MissingResolution(unit))?;
    require_resolution(dpi, unit)?;
    Ok(dpi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ── to_millimeters ──────────────────────────────────────────────────────

    #[test]
    fn test_inches_to_mm_rounds_dpmm() {
        let mm = to_millimeters(Dimension::new(3.0, 4.0), 203.0, Unit::Inch, None).unwrap();
        assert!(approx(mm.size.width, 76.2));
        assert!(approx(mm.size.height, 101.6));
        // 203 / 25.4 = 7.99 → rounds, does not truncate
        assert_eq!(mm.dpmm, 8);
    }

    #[test]
    fn test_pixels_to_mm_uses_resolution() {
        let mm = to_millimeters(Dimension::new(609.0, 812.0), 203.0, Unit::Pixel, None).unwrap();
        assert!(approx(mm.size.width, 609.0 * 25.4 / 203.0));
        assert_eq!(mm.dpmm, 8);
    }

    #[test]
    fn test_pixels_without_resolution_fails() {
        let err = to_millimeters(Dimension::new(10.0, 10.0), 0.0, Unit::Pixel, None).unwrap_err();
        assert!(matches!(err, LayoutError::MissingResolution(Unit::Pixel)));
    }

    #[test]
    fn test_mm_without_secondary_measurement_fails() {
        let err = to_millimeters(Dimension::new(76.2, 101.6), 8.0, Unit::Mm, None).unwrap_err();
        assert!(matches!(err, LayoutError::MissingSecondaryMeasurement));
    }

    #[test]
    fn test_mm_back_computes_from_secondary_pixels() {
        let mm = to_millimeters(Dimension::new(76.2, 101.6), 8.0, Unit::Mm, Some((80, 40))).unwrap();
        assert!(approx(mm.size.width, 10.0));
        assert!(approx(mm.size.height, 5.0));
        assert_eq!(mm.dpmm, 8);
    }

    // ── convert ─────────────────────────────────────────────────────────────

    #[test]
    fn test_inch_mm_round_trip() {
        for &(w, h) in &[(3.0, 4.0), (0.5, 12.25), (2.125, 1.0)] {
            let d = Dimension::new(w, h);
            let mm = convert(d, Unit::Inch, None, Unit::Mm).unwrap();
            let back = convert(mm, Unit::Mm, None, Unit::Inch).unwrap();
            assert!(approx(back.width, w) && approx(back.height, h), "{d:?} -> {back:?}");
        }
    }

    #[test]
    fn test_convert_to_pixels_truncates() {
        let px = convert(Dimension::new(3.0, 4.0), Unit::Inch, Some(203.0), Unit::Pixel).unwrap();
        assert_eq!(px, Dimension::new(609.0, 812.0));

        let px = convert(Dimension::new(10.0, 10.0), Unit::Mm, Some(203.0), Unit::Pixel).unwrap();
        // 10mm at 203dpi = 79.92 dots
        assert_eq!(px.width, 79.0);
    }

    #[test]
    fn test_convert_to_pixels_survives_mm_round_trip() {
        for &(inches, dpi, expected) in &[(3.0, 203.0, 609.0), (4.0, 203.0, 812.0), (2.0, 300.0, 600.0)] {
            let px = convert(Dimension::new(inches, inches), Unit::Inch, Some(dpi), Unit::Pixel).unwrap();
            assert_eq!(px.width, expected, "{inches}in at {dpi}dpi");
        }
    }

    #[test]
    fn test_convert_pixels_requires_resolution() {
        let err = convert(Dimension::new(1.0, 1.0), Unit::Inch, None, Unit::Pixel).unwrap_err();
        assert!(matches!(err, LayoutError::MissingResolution(Unit::Pixel)));
    }

    #[test]
    fn test_measure_and_dots() {
        let device = MmSize { size: Dimension::new(76.2, 101.6), dpmm: 8 };
        let mm = device.measure((609, 203)).unwrap();
        assert!(approx(mm.width, 76.125));
        assert_eq!(device.dots(mm.height), 203);
    }
}
