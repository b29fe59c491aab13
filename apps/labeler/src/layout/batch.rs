//! Batch runner.
//!
//! Everything derived from the schema (position map, regions, margins) is
//! computed once in [`BatchContext::new`] and shared read-only by every row.
//! Rows are laid out in parallel on the rayon pool and returned in input order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::layout::arrange::{arrange_region, interior_width, LayoutResult};
use crate::layout::autosize::{qr_module_size, qr_symbol_width};
use crate::layout::content::RowContent;
use crate::layout::error::LayoutError;
use crate::layout::regions::{partition, RegionId, RegionLayout};
use crate::layout::schema::{Alignment, LabelSpec, Margins, Position, PositionMap, SlotSpec};
use crate::render::ElementRenderers;

// ────────────────────────────────────────────────────────────────────────────
// Progress and cancellation
// ────────────────────────────────────────────────────────────────────────────

pub trait ProgressSink: Send + Sync {
    fn report(&self, completed: usize, total: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Progress sink that drops every update.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _completed: usize, _total: usize) {}
}

/// Cooperative cancellation flag, checked before each row starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Batch context
// ────────────────────────────────────────────────────────────────────────────

/// Frozen per-batch inputs.
#[derive(Clone)]
pub struct BatchContext {
    pub label: LabelSpec,
    pub schema: PositionMap,
    pub regions: RegionLayout,
    pub margins: Margins,
    pub alignment: Alignment,
    pub renderers: ElementRenderers,
}

impl BatchContext {
    /// Validates the schema and derives regions.
    ///
    /// When `margins` is `None` they are derived from the QR module size of
    /// `first_row`'s QR content; a batch with no QR content gets zero margins.
    pub fn new(
        label: LabelSpec,
        slots: &[SlotSpec],
        margins: Option<Margins>,
        alignment: Alignment,
        first_row: Option<&RowContent>,
        renderers: ElementRenderers,
    ) -> Result<Self, LayoutError> {
        let schema = PositionMap::new(slots)?;
        let regions = partition(&label, &schema)?;

        let margins = match margins {
            Some(m) => m,
            None => derive_margins(&regions, first_row, &renderers),
        };
        debug!(?margins, ?alignment, positions = schema.len(), "batch context ready");

        Ok(Self {
            label,
            schema,
            regions,
            margins,
            alignment,
            renderers,
        })
    }
}

fn derive_margins(
    regions: &RegionLayout,
    first_row: Option<&RowContent>,
    renderers: &ElementRenderers,
) -> Margins {
    let qr_width = regions.region(RegionId::Qr).map(|r| r.width).unwrap_or(0);
    let module = first_row
        .and_then(|row| row.get(Position::QR))
        .and_then(|content| renderers.qr.encode(content).ok())
        .map(|matrix| qr_module_size(qr_width, |s| qr_symbol_width(matrix.modules, s)))
        .unwrap_or(0);
    Margins::uniform(module)
}

// ────────────────────────────────────────────────────────────────────────────
// Row layout
// ────────────────────────────────────────────────────────────────────────────

/// Lays out one label. Positions without content in `row` are left out.
pub fn layout_row(ctx: &BatchContext, row: &RowContent) -> Result<LayoutResult, LayoutError> {
    let mut result = LayoutResult::default();

    for (region_id, positions) in ctx.regions.clusters() {
        let region = ctx
            .regions
            .region(region_id)
            .ok_or(LayoutError::EmptyRegion(region_id))?;
        let interior = interior_width(region, ctx.margins);

        let mut rendered = Vec::with_capacity(positions.len());
        for pos in positions {
            let Some(content) = row.get(pos) else {
                continue;
            };
            let kind = ctx
                .schema
                .kind(pos)
                .ok_or_else(|| LayoutError::Schema(format!("position {pos} has no element kind")))?;
            rendered.push(
                ctx.renderers
                    .render(pos, kind, content, region.width, interior)?,
            );
        }
        if rendered.is_empty() {
            continue;
        }

        let arranged = arrange_region(
            region,
            rendered,
            ctx.schema.resizable_flags(),
            ctx.margins,
            ctx.alignment,
        );
        if arranged.residual_overflow > 0 {
            result.overflow.insert(region_id, arranged.residual_overflow);
        }
        for el in arranged.elements {
            let pos = el.element.position;
            if let Some(desc) = &el.element.description {
                result.descriptions.insert(pos, desc.clone());
            }
            result.regions.insert(pos, region_id);
            result.elements.insert(pos, el);
        }
    }

    Ok(result)
}

/// Lays out every row. Results are in row order; rows not started before
/// cancellation come back as [`LayoutError::Cancelled`].
pub fn run_batch(
    ctx: &BatchContext,
    rows: &[RowContent],
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> Vec<Result<LayoutResult, LayoutError>> {
    let total = rows.len();
    let completed = AtomicUsize::new(0);

    let results: Vec<_> = rows
        .par_iter()
        .enumerate()
        .map(|(idx, row)| {
            if cancel.is_cancelled() {
                return Err(LayoutError::Cancelled(idx));
            }
            let outcome = layout_row(ctx, row);
            if let Err(e) = &outcome {
                debug!(row = idx, error = %e, "row failed");
            }
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress.report(done, total);
            outcome
        })
        .collect();

    let finished = completed.load(Ordering::SeqCst);
    if finished < total {
        info!(finished, total, "batch cancelled");
    } else {
        debug!(total, "batch complete");
    }
    results
}
