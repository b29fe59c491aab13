//! Auto-sizing. Finds the largest QR module scale / font size that fits a width.
//!
//! Both searches bracket coarsely then refine: grow by a large step while the
//! measurement stays under the target, and on overshoot shrink the step and back
//! off. This is not a binary search; the step schedule decides where the search
//! settles and the result can sit one step past the last in-bounds size.

/// Initial step of the QR module search.
pub const QR_INITIAL_STEP: u32 = 5;
/// Initial step of the font size search.
pub const FONT_INITIAL_STEP: u32 = 50;
/// Quiet-zone modules included when a QR symbol is measured.
pub const QR_MEASURE_BORDER: u32 = 1;

/// Width budget for text: one fifteenth of the region is held back as margin.
pub fn font_target_width(region_width: u32) -> f32 {
    region_width as f32 - region_width as f32 / 15.0
}

/// Pixel width of a QR symbol of `modules` modules at `scale`, with a one-module border.
pub fn qr_symbol_width(modules: u32, scale: u32) -> u32 {
    (modules + 2 * QR_MEASURE_BORDER) * scale
}

/// Module scale for a QR symbol in a region `target_width` pixels wide.
///
/// `measure(scale)` returns the symbol width at that scale. The step drops by one
/// on every overshoot; the scale never goes below 1.
pub fn qr_module_size(target_width: u32, measure: impl Fn(u32) -> u32) -> u32 {
    let mut scale: u32 = 1;
    let mut step = QR_INITIAL_STEP;

    loop {
        if measure(scale) < target_width {
            scale += step;
        } else {
            step -= 1;
            scale = scale.saturating_sub(step).max(1);
        }
        if step <= 1 {
            return scale + 1;
        }
    }
}

/// Point size for a string in a region `region_width` pixels wide.
///
/// `advance(size)` returns the rendered advance width at that size. The step is
/// halved on every overshoot and the size is floored at 1. Growth stops at the
/// region width, so a measurement that never reaches the target still ends the
/// search; callers reject text with no advance before sizing it.
pub fn font_size(region_width: u32, advance: impl Fn(u32) -> f32) -> u32 {
    let breakpoint = font_target_width(region_width);
    let ceiling = region_width.max(1);
    let mut size: u32 = 1;
    let mut step = FONT_INITIAL_STEP;

    loop {
        if size < ceiling && advance(size) < breakpoint {
            size += step;
        } else {
            step /= 2;
            size = size.saturating_sub(step).max(1);
        }
        if step <= 1 {
            return size;
        }
    }
}
