//! Arrangement: stack a region's elements top to bottom, rebalance on
//! overflow, align, then move into label coordinates.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::layout::rebalance::rebalance;
use crate::layout::regions::{Region, RegionId};
use crate::layout::schema::{Alignment, ElementKind, Margins, Position};
use crate::render::RenderedElement;

/// A rendered element with its resolved top-left corner.
///
/// Coordinates are region-relative (and margin-relative on x) until
/// [`arrange_region`] applies the region offset.
#[derive(Debug, Clone)]
pub struct ArrangedElement {
    pub element: RenderedElement,
    pub x: u32,
    pub y: u32,
}

impl ArrangedElement {
    pub fn width(&self) -> u32 {
        self.element.asset.width()
    }

    pub fn height(&self) -> u32 {
        self.element.asset.height()
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height()
    }
}

/// Serializable geometry of one arranged element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub position: Position,
    pub kind: ElementKind,
    pub region: RegionId,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything the exporters need for one label.
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub elements: BTreeMap<Position, ArrangedElement>,
    pub regions: BTreeMap<Position, RegionId>,
    pub descriptions: BTreeMap<Position, String>,
    /// Pixels a region still overflows by after rebalancing. Absent means it fits.
    pub overflow: BTreeMap<RegionId, u32>,
}

impl LayoutResult {
    pub fn placements(&self) -> Vec<Placement> {
        self.elements
            .iter()
            .map(|(pos, el)| Placement {
                position: *pos,
                kind: el.element.kind,
                region: self.regions.get(pos).copied().unwrap_or(RegionId::Body),
                x: el.x,
                y: el.y,
                width: el.width(),
                height: el.height(),
                description: self.descriptions.get(pos).cloned(),
            })
            .collect()
    }
}

/// Outcome of arranging one region.
#[derive(Debug)]
pub struct RegionArrangement {
    pub elements: Vec<ArrangedElement>,
    pub residual_overflow: u32,
}

/// Width every element of `region` is rendered at.
pub fn interior_width(region: &Region, margins: Margins) -> u32 {
    region.width.saturating_sub(2 * margins.x)
}

/// Places already-rendered elements (ascending position order) inside `region`.
pub fn arrange_region(
    region: &Region,
    rendered: Vec<RenderedElement>,
    resizable: &BTreeMap<Position, bool>,
    margins: Margins,
    alignment: Alignment,
) -> RegionArrangement {
    let qr_only = rendered.len() == 1 && rendered[0].position == Position::QR;

    // Virtual pass
    let mut cursor = margins.y;
    let mut elements: Vec<ArrangedElement> = rendered
        .into_iter()
        .map(|element| {
            let y = cursor;
            cursor += element.asset.height() + margins.y;
            ArrangedElement { element, x: 0, y }
        })
        .collect();

    let overflow = cursor.saturating_sub(region.height);
    let residual_overflow = if overflow > 0 && !qr_only {
        rebalance(&mut elements, resizable, overflow, region.height, margins.y)
    } else {
        overflow
    };

    let interior = interior_width(region, margins);
    for el in elements.iter_mut() {
        match alignment {
            Alignment::Left => el.x = 0,
            Alignment::Right => el.x = interior.saturating_sub(el.width()),
            Alignment::Center => {}
        }
        el.x += region.x;
        el.y += region.y;
    }

    RegionArrangement {
        elements,
        residual_overflow,
    }
}
