use anyhow::anyhow;
use image::{GrayImage, Luma};
use qrcode::types::{Color, Version};
use qrcode::QrCode;

use super::{QrEncoder, QrMatrix};

/// `qrcode`-backed encoder. Version and error correction are picked by the crate
/// (smallest version at medium correction).
#[derive(Debug, Default, Clone, Copy)]
pub struct QrCodeEncoder;

impl QrEncoder for QrCodeEncoder {
    fn encode(&self, content: &str) -> anyhow::Result<QrMatrix> {
        let code = QrCode::new(content.as_bytes())
            .map_err(|e| anyhow!("content of {} bytes does not fit a QR symbol: {e}", content.len()))?;

        let version = match code.version() {
            Version::Normal(v) | Version::Micro(v) => v,
        };

        Ok(QrMatrix {
            modules: code.width() as u32,
            dark: code
                .to_colors()
                .into_iter()
                .map(|c| c == Color::Dark)
                .collect(),
            version,
            ecl: format!("{:?}", code.error_correction_level()),
        })
    }
}

/// Draws the module grid at `scale` pixels per module with `border` light modules
/// around it.
pub fn rasterize(matrix: &QrMatrix, scale: u32, border: u32) -> GrayImage {
    let scale = scale.max(1);
    let side = (matrix.modules + 2 * border) * scale;
    let mut img = GrayImage::from_pixel(side, side, Luma([255]));

    for (i, dark) in matrix.dark.iter().enumerate() {
        if !dark {
            continue;
        }
        let mx = i as u32 % matrix.modules + border;
        let my = i as u32 / matrix.modules + border;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(mx * scale + dx, my * scale + dy, Luma([0]));
            }
        }
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_reports_version_and_ecl() {
        let m = QrCodeEncoder.encode("HELLO").unwrap();
        assert_eq!(m.modules, 21);
        assert_eq!(m.dark.len(), 21 * 21);
        assert_eq!(m.version, 1);
        assert_eq!(m.ecl, "M");
    }

    #[test]
    fn test_longer_content_grows_the_symbol() {
        let small = QrCodeEncoder.encode("A").unwrap();
        let large = QrCodeEncoder.encode(&"A".repeat(200)).unwrap();
        assert!(large.modules > small.modules);
        assert!(large.version > small.version);
    }

    #[test]
    fn test_rasterize_scales_and_borders() {
        let m = QrCodeEncoder.encode("HELLO").unwrap();
        let img = rasterize(&m, 3, 1);
        assert_eq!(img.dimensions(), (23 * 3, 23 * 3));
        // Border stays light, top-left finder pattern is dark
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(3, 3).0[0], 0);
    }
}
