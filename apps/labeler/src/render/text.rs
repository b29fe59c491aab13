use std::path::Path;

use anyhow::{anyhow, Context};
use image::{GrayImage, Luma};
use rusttype::{point, Font, Scale};

use super::FontFace;

/// A TrueType/OpenType face loaded once and shared by every row.
pub struct TrueTypeFace {
    name: String,
    font: Font<'static>,
}

impl TrueTypeFace {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> anyhow::Result<Self> {
        let name = name.into();
        let font = Font::try_from_vec(bytes).ok_or_else(|| anyhow!("`{name}` is not a usable font"))?;
        Ok(Self { name, font })
    }

    /// Loads a face from disk; the file stem becomes its name.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "font".to_string());
        Self::from_bytes(name, bytes)
    }
}

impl FontFace for TrueTypeFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn advance_width(&self, text: &str, size: u32) -> f32 {
        let scale = Scale::uniform(size as f32);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn rasterize(&self, text: &str, size: u32) -> GrayImage {
        let scale = Scale::uniform(size as f32);
        let v_metrics = self.font.v_metrics(scale);
        let width = self.advance_width(text, size).ceil().max(0.0) as u32;
        let height = (v_metrics.ascent - v_metrics.descent).ceil().max(0.0) as u32;

        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        if width == 0 || height == 0 {
            return img;
        }

        for glyph in self.font.layout(text, scale, point(0.0, v_metrics.ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, v| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    return;
                }
                let ink = (v.clamp(0.0, 1.0) * 255.0) as u8;
                let current = img.get_pixel(px as u32, py as u32).0[0];
                img.put_pixel(px as u32, py as u32, Luma([current.min(255 - ink)]));
            });
        }
        img
    }
}
