//! Device command emission.
//!
//! Translates an arranged label from canvas pixels into printer terms: origins
//! and sizes in millimeters, barcode heights in dots. QR codes travel as raw
//! graphics (printers cannot reproduce an arbitrary module scale); barcodes and
//! text use the printer's native primitives.

use std::collections::BTreeMap;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::layout::{ArrangedElement, ElementKind, LabelSpec, LayoutResult, Margins, MmSize, RegionId};
use crate::render::{ElementDetail, Symbology};

use super::ExportError;

/// Field block justification for native text.
pub const TEXT_JUSTIFICATION: char = 'J';
/// Built-in printer font used for native text.
pub const TEXT_FONT: char = 'E';

/// How a label is turned into printer markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupMode {
    /// Native barcode and text primitives; QR codes as graphics.
    #[default]
    Native,
    /// The composed raster of the whole label as a single graphic.
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    LabelStart {
        width_mm: f64,
        height_mm: f64,
        dpmm: u32,
    },
    Origin {
        x_mm: f64,
        y_mm: f64,
    },
    Graphic {
        width_mm: f64,
        height_mm: f64,
        image: GrayImage,
    },
    Barcode {
        content: String,
        height_dots: u32,
        symbology: Symbology,
    },
    Text {
        content: String,
        char_width_mm: f64,
        char_height_mm: f64,
        line_width_mm: f64,
        justification: char,
        font: char,
    },
    EndOrigin,
    LabelEnd,
}

/// Emits the command sequence for one label, elements in position order
/// within each region.
///
/// Each region keeps its own vertical cursor: it starts at the first element's
/// y and advances by each element's height plus the vertical margin.
pub fn emit_commands(
    label: &LabelSpec,
    layout: &LayoutResult,
    margins: Margins,
) -> Result<Vec<DeviceCommand>, ExportError> {
    let device = label.device()?;
    let margin_mm = device.measure((margins.x, margins.y))?;

    let mut commands = vec![DeviceCommand::LabelStart {
        width_mm: device.size.width,
        height_mm: device.size.height,
        dpmm: device.dpmm,
    }];

    let mut by_region: BTreeMap<RegionId, Vec<&ArrangedElement>> = BTreeMap::new();
    for (pos, el) in &layout.elements {
        let region = layout.regions.get(pos).copied().unwrap_or(RegionId::Body);
        by_region.entry(region).or_default().push(el);
    }

    for elements in by_region.values() {
        let Some(first) = elements.first() else {
            continue;
        };
        let mut cursor = device.measure((0, first.y))?.height;

        for el in elements {
            let size = device.measure((el.width(), el.height()))?;
            let x_mm = device.measure((el.x + margins.x, 0))?.width;

            commands.push(DeviceCommand::Origin { x_mm, y_mm: cursor });
            commands.push(element_command(el, size.width, size.height, &device));
            commands.push(DeviceCommand::EndOrigin);

            cursor += size.height + margin_mm.height;
        }
    }

    commands.push(DeviceCommand::LabelEnd);
    Ok(commands)
}

/// Emits the whole composed label as one graphic at the label origin.
pub fn emit_image_commands(
    label: &LabelSpec,
    canvas: GrayImage,
) -> Result<Vec<DeviceCommand>, ExportError> {
    let device = label.device()?;
    let size = device.measure(canvas.dimensions())?;

    Ok(vec![
        DeviceCommand::LabelStart {
            width_mm: device.size.width,
            height_mm: device.size.height,
            dpmm: device.dpmm,
        },
        DeviceCommand::Origin { x_mm: 0.0, y_mm: 0.0 },
        DeviceCommand::Graphic {
            width_mm: size.width,
            height_mm: size.height,
            image: canvas,
        },
        DeviceCommand::EndOrigin,
        DeviceCommand::LabelEnd,
    ])
}

fn element_command(el: &ArrangedElement, width_mm: f64, height_mm: f64, device: &MmSize) -> DeviceCommand {
    let element = &el.element;
    match element.kind {
        ElementKind::Qr => DeviceCommand::Graphic {
            width_mm,
            height_mm,
            image: element.asset.clone(),
        },
        ElementKind::Barcode => {
            let symbology = match &element.detail {
                ElementDetail::Barcode { symbology } => *symbology,
                _ => Symbology::default(),
            };
            DeviceCommand::Barcode {
                content: element.content.clone(),
                height_dots: device.dots(height_mm),
                symbology,
            }
        }
        ElementKind::Text | ElementKind::Title => {
            let chars = element.content.chars().count().max(1) as f64;
            DeviceCommand::Text {
                content: element.content.clone(),
                char_width_mm: width_mm / chars,
                char_height_mm: height_mm + 1.0,
                line_width_mm: width_mm,
                justification: TEXT_JUSTIFICATION,
                font: TEXT_FONT,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Position, Unit};
    use crate::test_support::rendered;

    fn label() -> LabelSpec {
        LabelSpec {
            width: 3.0,
            height: 4.0,
            resolution: 203.0,
            unit: Unit::Inch,
        }
    }

    fn layout() -> LayoutResult {
        let mut layout = LayoutResult::default();
        let items = [
            (0, ElementKind::Qr, 589, 589, 10, RegionId::Qr),
            (1, ElementKind::Title, 589, 40, 619, RegionId::Body),
            (2, ElementKind::Text, 400, 48, 669, RegionId::Body),
            (3, ElementKind::Barcode, 589, 80, 727, RegionId::Body),
        ];
        for (pos, kind, w, h, y, region) in items {
            layout.elements.insert(
                Position(pos),
                ArrangedElement {
                    element: rendered(pos, kind, w, h),
                    x: 0,
                    y,
                },
            );
            layout.regions.insert(Position(pos), region);
        }
        layout
    }

    fn origins(commands: &[DeviceCommand]) -> Vec<f64> {
        commands
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::Origin { y_mm, .. } => Some(*y_mm),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sequence_is_bracketed_and_ordered() {
        let cmds = emit_commands(&label(), &layout(), Margins::uniform(10)).unwrap();
        assert!(matches!(cmds.first(), Some(DeviceCommand::LabelStart { dpmm: 8, .. })));
        assert!(matches!(cmds.last(), Some(DeviceCommand::LabelEnd)));
        // LabelStart + 4 × (Origin, element, EndOrigin) + LabelEnd
        assert_eq!(cmds.len(), 14);
        assert!(matches!(cmds[2], DeviceCommand::Graphic { .. }));
        assert!(matches!(cmds[5], DeviceCommand::Text { .. }));
        assert!(matches!(cmds[11], DeviceCommand::Barcode { .. }));
    }

    #[test]
    fn test_cursor_increases_within_region() {
        let cmds = emit_commands(&label(), &layout(), Margins::uniform(10)).unwrap();
        let ys = origins(&cmds);
        // first origin is the QR region; the rest belong to the body
        let body = &ys[1..];
        assert!(body.windows(2).all(|w| w[0] < w[1]), "{body:?}");
        assert!((body[0] - 619.0 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_and_barcode_parameters() {
        let cmds = emit_commands(&label(), &layout(), Margins::uniform(10)).unwrap();
        let text = cmds
            .iter()
            .find_map(|c| match c {
                DeviceCommand::Text {
                    content,
                    char_width_mm,
                    char_height_mm,
                    justification,
                    font,
                    ..
                } if content == "text-2" => Some((*char_width_mm, *char_height_mm, *justification, *font)),
                _ => None,
            })
            .unwrap();
        assert!((text.0 - 50.0 / 6.0).abs() < 1e-9, "400px = 50mm over 6 chars");
        assert!((text.1 - 7.0).abs() < 1e-9, "48px = 6mm, plus one");
        assert_eq!((text.2, text.3), ('J', 'E'));

        let bar_height = cmds
            .iter()
            .find_map(|c| match c {
                DeviceCommand::Barcode { height_dots, .. } => Some(*height_dots),
                _ => None,
            })
            .unwrap();
        assert_eq!(bar_height, 80);
    }

    // ── Landscape ───────────────────────────────────────────────────────────

    #[test]
    fn test_landscape_origins_include_body_offset() {
        let landscape = LabelSpec {
            width: 4.0,
            height: 3.0,
            ..label()
        };
        let mut layout = LayoutResult::default();
        let items = [
            (0, ElementKind::Qr, 589, 589, 0, 10, RegionId::Qr),
            (1, ElementKind::Text, 183, 40, 609, 10, RegionId::Body),
        ];
        for (pos, kind, w, h, x, y, region) in items {
            layout.elements.insert(
                Position(pos),
                ArrangedElement {
                    element: rendered(pos, kind, w, h),
                    x,
                    y,
                },
            );
            layout.regions.insert(Position(pos), region);
        }

        let cmds = emit_commands(&landscape, &layout, Margins::uniform(10)).unwrap();
        let xs: Vec<f64> = cmds
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::Origin { x_mm, .. } => Some(*x_mm),
                _ => None,
            })
            .collect();
        assert!((xs[0] - 10.0 / 8.0).abs() < 1e-9);
        // body x (609) plus the horizontal margin, in mm at 8 dots/mm
        assert!((xs[1] - 619.0 / 8.0).abs() < 1e-9, "{xs:?}");

        let markup = super::super::zpl::serialize(&cmds);
        assert!(markup.contains("^FO10,10^GFA,"), "{markup}");
        assert!(markup.contains("^FO619,10^AEN,"), "{markup}");
    }

    // ── Image mode ──────────────────────────────────────────────────────────

    #[test]
    fn test_image_mode_is_one_graphic_at_origin() {
        let canvas = GrayImage::from_pixel(609, 812, image::Luma([255]));
        let cmds = emit_image_commands(&label(), canvas).unwrap();

        assert_eq!(cmds.len(), 5);
        assert!(matches!(cmds[0], DeviceCommand::LabelStart { dpmm: 8, .. }));
        assert_eq!(cmds[1], DeviceCommand::Origin { x_mm: 0.0, y_mm: 0.0 });
        match &cmds[2] {
            DeviceCommand::Graphic {
                width_mm,
                height_mm,
                image,
            } => {
                assert!((width_mm - 609.0 / 8.0).abs() < 1e-9);
                assert!((height_mm - 812.0 / 8.0).abs() < 1e-9);
                assert_eq!(image.dimensions(), (609, 812));
            }
            other => panic!("expected a graphic, got {other:?}"),
        }
        assert!(matches!(cmds[4], DeviceCommand::LabelEnd));
    }

    #[test]
    fn test_markup_mode_defaults_to_native() {
        assert_eq!(MarkupMode::default(), MarkupMode::Native);
        let mode: MarkupMode = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(mode, MarkupMode::Image);
    }
}
