//! Region partitioning: the QR code gets a square on the short side of the label,
//! everything else shares the remainder.
#![allow(dead_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::error::LayoutError;
use crate::layout::schema::{ElementKind, LabelSpec, Position, PositionMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionId {
    Qr,
    Body,
}

/// Axis-aligned rectangle on the label canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Regions plus the position → region assignment, derived together from one schema snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionLayout {
    pub regions: BTreeMap<RegionId, Region>,
    pub assignments: BTreeMap<Position, RegionId>,
}

impl RegionLayout {
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(&id)
    }

    /// Positions grouped by region, each group in ascending position order.
    pub fn clusters(&self) -> BTreeMap<RegionId, Vec<Position>> {
        let mut clusters: BTreeMap<RegionId, Vec<Position>> = BTreeMap::new();
        for (pos, region) in &self.assignments {
            clusters.entry(*region).or_default().push(*pos);
        }
        clusters
    }
}

/// Splits the label into the QR square and the remainder, and assigns every position.
///
/// Fails if a region with assigned elements ends up with zero width or height
/// (a square label leaves no room for anything but the QR code).
pub fn partition(label: &LabelSpec, schema: &PositionMap) -> Result<RegionLayout, LayoutError> {
    let (w, h) = label.pixel_size()?;

    let (qr, body) = if label.is_landscape() {
        (
            Region {
                id: RegionId::Qr,
                x: 0,
                y: 0,
                width: h,
                height: h,
            },
            Region {
                id: RegionId::Body,
                x: h,
                y: 0,
                width: w.saturating_sub(h),
                height: h,
            },
        )
    } else {
        (
            Region {
                id: RegionId::Qr,
                x: 0,
                y: 0,
                width: w,
                height: w,
            },
            Region {
                id: RegionId::Body,
                x: 0,
                y: w,
                width: w,
                height: h.saturating_sub(w),
            },
        )
    };

    let assignments: BTreeMap<Position, RegionId> = schema
        .iter()
        .map(|(pos, kind)| {
            let region = match kind {
                ElementKind::Qr => RegionId::Qr,
                ElementKind::Barcode | ElementKind::Text | ElementKind::Title => RegionId::Body,
            };
            (pos, region)
        })
        .collect();

    for region in [&qr, &body] {
        let used = assignments.values().any(|r| *r == region.id);
        if used && region.area() == 0 {
            return Err(LayoutError::EmptyRegion(region.id));
        }
    }

    Ok(RegionLayout {
        regions: BTreeMap::from([(RegionId::Qr, qr), (RegionId::Body, body)]),
        assignments,
    })
}
