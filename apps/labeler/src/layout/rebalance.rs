//! Overflow rebalancing for one region.
//!
//! Resizable elements are shrunk towards a common "ideal" height: the smallest
//! text line sets the text height, barcodes aim for [`BAR_TO_TEXT_RATIO`] times
//! that. Barcodes lose rows from the bottom (bars stay scannable), text and
//! titles scale uniformly. Nothing ever grows.

use std::collections::BTreeMap;

use image::imageops::{self, FilterType};
use tracing::{debug, warn};

use crate::layout::arrange::ArrangedElement;
use crate::layout::schema::{ElementKind, Position};

/// Target barcode height as a multiple of the text height.
pub const BAR_TO_TEXT_RATIO: f64 = 2.0;

/// Shrinks the resizable elements of a region by `overflow` pixels in total,
/// re-stacks everything from the first changed element down and centers the
/// stack vertically. Elements must be in ascending position order, already
/// placed by the virtual pass.
///
/// Returns the residual overflow (0 when the region now fits).
pub fn rebalance(
    elements: &mut [ArrangedElement],
    resizable: &BTreeMap<Position, bool>,
    overflow: u32,
    region_height: u32,
    margin_y: u32,
) -> u32 {
    let factors = shrink_factors(elements, resizable, overflow);

    let mut first_changed: Option<usize> = None;
    for (idx, factor) in factors {
        if factor >= 1.0 {
            continue;
        }
        shrink(&mut elements[idx], factor);
        first_changed.get_or_insert(idx);
    }

    if let Some(start) = first_changed {
        for i in start.max(1)..elements.len() {
            let prev_bottom = elements[i - 1].bottom();
            elements[i].y = prev_bottom + margin_y;
        }
    }

    let bottom = elements.iter().map(|e| e.bottom()).max().unwrap_or(0);
    if bottom <= region_height {
        let shift = (region_height - bottom) / 2;
        for el in elements.iter_mut() {
            el.y += shift;
        }
        debug!(overflow, shift, "region rebalanced");
        0
    } else {
        let residual = bottom - region_height;
        warn!(overflow, residual, "region still overflows after rebalancing");
        residual
    }
}

/// `(index, factor)` for every resizable barcode/text/title, factor clamped to 1.
fn shrink_factors(
    elements: &[ArrangedElement],
    resizable: &BTreeMap<Position, bool>,
    overflow: u32,
) -> Vec<(usize, f64)> {
    let candidates: Vec<usize> = elements
        .iter()
        .enumerate()
        .filter(|(_, e)| {
            e.element.kind != ElementKind::Qr
                && resizable.get(&e.element.position).copied().unwrap_or(false)
        })
        .map(|(i, _)| i)
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    let heights = |textual: bool| -> Vec<f64> {
        candidates
            .iter()
            .map(|&i| &elements[i])
            .filter(|e| e.element.kind.is_textual() == textual)
            .map(|e| e.height() as f64)
            .collect()
    };
    let text_heights = heights(true);
    let bar_heights = heights(false);

    let fitted = text_heights.iter().sum::<f64>() + bar_heights.iter().sum::<f64>() - overflow as f64;

    let (mut ideal_text, mut ideal_bar) = if text_heights.is_empty() {
        (0.0, smallest(&bar_heights))
    } else {
        let t = smallest(&text_heights);
        (t, t * BAR_TO_TEXT_RATIO)
    };

    let ideal_total = ideal_text * text_heights.len() as f64 + ideal_bar * bar_heights.len() as f64;
    if ideal_total > 0.0 && fitted < ideal_total {
        let x = fitted.max(0.0) / ideal_total;
        ideal_text *= x;
        ideal_bar *= x;
    }

    candidates
        .into_iter()
        .map(|i| {
            let el = &elements[i];
            let ideal = if el.element.kind.is_textual() {
                ideal_text
            } else {
                ideal_bar
            };
            let current = el.height().max(1) as f64;
            (i, (ideal / current).min(1.0))
        })
        .collect()
}

fn smallest(heights: &[f64]) -> f64 {
    heights.iter().copied().fold(f64::INFINITY, f64::min)
}

fn shrink(el: &mut ArrangedElement, factor: f64) {
    let (w, h) = el.element.size();
    let new_h = ((h as f64 * factor) as u32).clamp(1, h.max(1));

    match el.element.kind {
        ElementKind::Barcode => {
            el.element.asset = imageops::crop_imm(&el.element.asset, 0, 0, w, new_h).to_image();
        }
        ElementKind::Text | ElementKind::Title => {
            let new_w = ((w as f64 * factor) as u32).clamp(1, w.max(1));
            el.element.asset = imageops::resize(&el.element.asset, new_w, new_h, FilterType::Triangle);
            el.x += (w - new_w) / 2;
        }
        ElementKind::Qr => {}
    }
}
