use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::ean13::EAN13;
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use super::BarcodeEncoder;

/// Linear symbologies the encoder can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    #[default]
    Code128,
    Code39,
    Ean13,
}

impl Symbology {
    /// Single-letter code used by the device command set (`^B<code>`).
    pub fn command_code(self) -> char {
        match self {
            Symbology::Code128 => 'C',
            Symbology::Code39 => '3',
            Symbology::Ean13 => 'E',
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Symbology::Code128 => "code128",
            Symbology::Code39 => "code39",
            Symbology::Ean13 => "ean13",
        })
    }
}

impl FromStr for Symbology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "code128" | "gs1128" => Ok(Symbology::Code128),
            "code39" => Ok(Symbology::Code39),
            "ean13" => Ok(Symbology::Ean13),
            other => Err(format!("unknown symbology `{other}`")),
        }
    }
}

/// `barcoders`-backed encoder for one symbology.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearBarcodeEncoder {
    pub symbology: Symbology,
}

impl LinearBarcodeEncoder {
    pub fn new(symbology: Symbology) -> Self {
        Self { symbology }
    }
}

impl BarcodeEncoder for LinearBarcodeEncoder {
    fn encode(&self, content: &str) -> anyhow::Result<Vec<u8>> {
        match self.symbology {
            // `Ɓ` selects Code 128 character set B (full printable ASCII)
            Symbology::Code128 => Code128::new(format!("Ɓ{content}"))
                .map(|b| b.encode())
                .map_err(|e| anyhow!("code128 rejected `{content}`: {e:?}")),
            Symbology::Code39 => Code39::new(content.to_ascii_uppercase())
                .map(|b| b.encode())
                .map_err(|e| anyhow!("code39 rejected `{content}`: {e:?}")),
            Symbology::Ean13 => EAN13::new(content)
                .map(|b| b.encode())
                .map_err(|e| anyhow!("ean13 rejected `{content}`: {e:?}")),
        }
    }

    fn symbology(&self) -> Symbology {
        self.symbology
    }
}

/// Draws bar modules `module_px` wide and `height` tall, black on white.
pub fn rasterize(modules: &[u8], module_px: u32, height: u32) -> GrayImage {
    let module_px = module_px.max(1);
    let width = modules.len() as u32 * module_px;
    let mut img = GrayImage::from_pixel(width, height.max(1), Luma([255]));

    for (i, bar) in modules.iter().enumerate() {
        if *bar == 0 {
            continue;
        }
        let x0 = i as u32 * module_px;
        for x in x0..x0 + module_px {
            for y in 0..img.height() {
                img.put_pixel(x, y, Luma([0]));
            }
        }
    }
    img
}
