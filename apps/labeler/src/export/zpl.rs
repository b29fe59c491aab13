//! ZPL II serialization of a device command sequence.
//!
//! Graphics are embedded with `^GFA` using the ASCII compression scheme:
//! runs of one hex digit are prefixed with a repeat count (`G`..`Y` = 1..19,
//! `g`..`z` = 20..400), `,` fills the rest of a row with white, `!` with
//! black, and `:` repeats the previous row.

use std::fmt::Write as _;

use image::GrayImage;

use super::commands::DeviceCommand;
use crate::render::Symbology;

/// Narrow bar width in dots for native barcodes.
const BARCODE_MODULE_DOTS: u32 = 2;
/// Pixels darker than this become printed dots.
const INK_THRESHOLD: u8 = 128;

/// Renders one label's commands as a ZPL document.
///
/// Millimeters are converted with the dots/mm declared by the leading
/// `LabelStart`; without one, 8 dots/mm (203 dpi) is assumed.
pub fn serialize(commands: &[DeviceCommand]) -> String {
    let mut out = String::new();
    let mut dpmm = 8u32;
    let dots = |mm: f64, dpmm: u32| (mm * dpmm as f64).max(0.0) as u32;

    for cmd in commands {
        match cmd {
            DeviceCommand::LabelStart {
                width_mm,
                height_mm,
                dpmm: d,
            } => {
                dpmm = *d;
                out.push_str("^XA\n");
                let _ = writeln!(out, "^PW{}", dots(*width_mm, dpmm));
                let _ = writeln!(out, "^LL{}", dots(*height_mm, dpmm));
                out.push_str("^JMA\n");
            }
            DeviceCommand::Origin { x_mm, y_mm } => {
                let _ = write!(out, "^FO{},{}", dots(*x_mm, dpmm), dots(*y_mm, dpmm));
            }
            DeviceCommand::Graphic { image, .. } => {
                out.push_str(&graphic_field(image));
            }
            DeviceCommand::Barcode {
                content,
                height_dots,
                symbology,
            } => {
                let _ = write!(out, "^BY{BARCODE_MODULE_DOTS}");
                let _ = match symbology {
                    Symbology::Code128 => write!(out, "^BCN,{height_dots},N,N,N"),
                    Symbology::Code39 => write!(out, "^B3N,N,{height_dots},N,N"),
                    Symbology::Ean13 => write!(out, "^BEN,{height_dots},N,N"),
                };
                let _ = write!(out, "^FD{}", escape_field(content));
            }
            DeviceCommand::Text {
                content,
                char_width_mm,
                char_height_mm,
                line_width_mm,
                justification,
                font,
            } => {
                let _ = write!(
                    out,
                    "^A{font}N,{},{}^FB{},1,0,{justification},0^FD{}",
                    dots(*char_height_mm, dpmm).max(1),
                    dots(*char_width_mm, dpmm).max(1),
                    dots(*line_width_mm, dpmm).max(1),
                    escape_field(content)
                );
            }
            DeviceCommand::EndOrigin => out.push_str("^FS\n"),
            DeviceCommand::LabelEnd => out.push_str("^XZ\n"),
        }
    }
    out
}

/// `^` and `~` would start a new command inside field data.
fn escape_field(content: &str) -> String {
    content.replace(['^', '~'], " ")
}

/// `^GFA` field for a greyscale image, 1 bit per pixel, dark = 1.
pub fn graphic_field(image: &GrayImage) -> String {
    let (bytes_per_row, rows) = pack_rows(image);
    let total = bytes_per_row * rows.len();
    format!(
        "^GFA,{total},{total},{bytes_per_row},{}",
        compress_rows(&rows)
    )
}

/// Packs each row MSB-first into uppercase hex.
fn pack_rows(image: &GrayImage) -> (usize, Vec<String>) {
    let (w, h) = image.dimensions();
    let bytes_per_row = w.div_ceil(8) as usize;

    let rows = (0..h)
        .map(|y| {
            let mut bytes = vec![0u8; bytes_per_row];
            for x in 0..w {
                if image.get_pixel(x, y).0[0] < INK_THRESHOLD {
                    bytes[x as usize / 8] |= 1 << (7 - x % 8);
                }
            }
            bytes.iter().map(|b| format!("{b:02X}")).collect::<String>()
        })
        .collect();
    (bytes_per_row, rows)
}

fn compress_rows(rows: &[String]) -> String {
    let mut out = String::new();
    let mut previous: Option<&String> = None;

    for row in rows {
        if previous == Some(row) {
            out.push(':');
        } else {
            compress_row(row, &mut out);
        }
        previous = Some(row);
    }
    out
}

fn compress_row(row: &str, out: &mut String) {
    let bytes = row.as_bytes();

    // Trailing fill: `,` for zeros, `!` for ones
    let mut body_end = bytes.len();
    let mut fill = None;
    if let Some(&last) = bytes.last() {
        if last == b'0' || last == b'F' {
            let run = bytes.iter().rev().take_while(|b| **b == last).count();
            if run >= 2 || run == bytes.len() {
                body_end = bytes.len() - run;
                fill = Some(if last == b'0' { ',' } else { '!' });
            }
        }
    }

    let mut i = 0;
    while i < body_end {
        let c = bytes[i];
        let run = bytes[i..body_end].iter().take_while(|b| **b == c).count();
        push_run(out, c as char, run);
        i += run;
    }

    if let Some(f) = fill {
        out.push(f);
    }
}

fn push_run(out: &mut String, c: char, mut n: usize) {
    while n > 0 {
        let take = n.min(419);
        if take > 1 {
            let high = take / 20;
            let low = take % 20;
            if high > 0 {
                out.push((b'g' + (high - 1) as u8) as char);
            }
            if low > 0 {
                out.push((b'G' + (low - 1) as u8) as char);
            }
        }
        out.push(c);
        n -= take;
    }
}
