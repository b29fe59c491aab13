//! Label jobs: request validation, batch execution and per-row export.
//!
//! Everything in here is synchronous and CPU-bound. Handlers call it through
//! `tokio::task::spawn_blocking`.

pub mod handlers;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::AppError;
use crate::export::{AssetHandle, ExportError, MarkupMode};
use crate::layout::{
    run_batch, Alignment, BatchContext, CancelToken, LabelSpec, LayoutResult, Margins, Placement,
    Position, Region, RegionId, RowContent, SlotSpec,
};
use crate::render::{ElementRenderers, LinearBarcodeEncoder, Symbology};

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// One batch of labels sharing a schema.
///
/// Rows come either as `rows` (position → content) or as `fields` + `records`
/// (header → positions, and one list of `[header, value]` cells per label).
#[derive(Debug, Clone, Deserialize)]
pub struct LabelJob {
    #[serde(default)]
    pub label: Option<LabelSpec>,
    pub schema: Vec<SlotSpec>,
    #[serde(default)]
    pub rows: Vec<RowContent>,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<Position>>,
    #[serde(default)]
    pub records: Vec<Vec<(String, String)>>,
    #[serde(default)]
    pub margins: Option<Margins>,
    #[serde(default)]
    pub alignment: Option<Alignment>,
    #[serde(default)]
    pub symbology: Option<Symbology>,
    /// Fields rejected upstream; echoed back untouched.
    #[serde(default)]
    pub omitted_fields: Vec<String>,
    #[serde(default)]
    pub markup: MarkupMode,
    /// Copies per row, in row order. Rows past the end print once.
    #[serde(default)]
    pub copies: Vec<u32>,
}

/// A validated job with its frozen batch context.
pub struct PreparedJob {
    pub ctx: BatchContext,
    pub rows: Vec<RowContent>,
    pub omitted_fields: Vec<String>,
    pub markup: MarkupMode,
    pub copies: Vec<u32>,
}

pub fn prepare(
    job: LabelJob,
    config: &Config,
    renderers: &ElementRenderers,
) -> Result<PreparedJob, AppError> {
    if job.schema.is_empty() {
        return Err(AppError::Validation("schema must declare at least one position".into()));
    }
    if !job.rows.is_empty() && !job.records.is_empty() {
        return Err(AppError::Validation(
            "send either `rows` or `fields` + `records`, not both".into(),
        ));
    }

    let label = job.label.unwrap_or(config.default_label);
    if !(label.width > 0.0 && label.height > 0.0) {
        return Err(AppError::Validation("label width and height must be positive".into()));
    }

    let mut renderers = renderers.clone();
    if let Some(symbology) = job.symbology {
        renderers.barcode = Arc::new(LinearBarcodeEncoder::new(symbology));
    }

    // Validates the schema before any record is mapped
    let schema = crate::layout::PositionMap::new(&job.schema)?;

    let rows = if job.records.is_empty() {
        job.rows
    } else {
        job.records
            .iter()
            .map(|record| RowContent::from_fields(&schema, &job.fields, record))
            .collect::<Result<Vec<_>, _>>()?
    };
    if rows.is_empty() {
        return Err(AppError::Validation("job contains no rows".into()));
    }
    if job.copies.len() > rows.len() {
        return Err(AppError::Validation(format!(
            "{} copy counts given for {} rows",
            job.copies.len(),
            rows.len()
        )));
    }
    if let Some(row) = job.copies.iter().position(|&n| n == 0) {
        return Err(AppError::Validation(format!("row {row} asks for zero copies")));
    }

    let ctx = BatchContext::new(
        label,
        &job.schema,
        job.margins,
        job.alignment.unwrap_or(config.default_alignment),
        rows.first(),
        renderers,
    )?;

    Ok(PreparedJob {
        ctx,
        rows,
        omitted_fields: job.omitted_fields,
        markup: job.markup,
        copies: job.copies,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Response
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
pub struct RowReport {
    pub row: usize,
    pub copies: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<Placement>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub overflow: BTreeMap<RegionId, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub label: LabelSpec,
    pub margins: Margins,
    pub alignment: Alignment,
    pub regions: Vec<Region>,
    pub total: usize,
    pub succeeded: usize,
    pub rows: Vec<RowReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub omitted_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printer: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Execution
// ────────────────────────────────────────────────────────────────────────────

/// Lays out every row, then hands each successful layout to `export`.
///
/// A failing row (layout or export) is reported in place; the rest of the
/// batch carries on.
pub fn execute<F>(job: PreparedJob, mut export: F) -> BatchResponse
where
    F: FnMut(&BatchContext, &LayoutResult, &mut RowReport) -> Result<(), ExportError>,
{
    let ctx = &job.ctx;
    let progress = |completed: usize, total: usize| debug!(completed, total, "row laid out");
    let results = run_batch(ctx, &job.rows, &progress, &CancelToken::new());

    let rows: Vec<RowReport> = results
        .into_iter()
        .enumerate()
        .map(|(row, result)| {
            let mut report = RowReport {
                row,
                copies: job.copies.get(row).copied().unwrap_or(1),
                ..Default::default()
            };
            match result {
                Ok(layout) => {
                    report.elements = layout.placements();
                    report.overflow = layout.overflow.clone();
                    if let Err(e) = export(ctx, &layout, &mut report) {
                        report.error = Some(e.to_string());
                    }
                }
                Err(e) => report.error = Some(e.to_string()),
            }
            report
        })
        .collect();

    let succeeded = rows.iter().filter(|r| r.error.is_none()).count();
    info!(total = rows.len(), succeeded, "label batch finished");

    BatchResponse {
        label: ctx.label,
        margins: ctx.margins,
        alignment: ctx.alignment,
        regions: ctx.regions.regions.values().copied().collect(),
        total: rows.len(),
        succeeded,
        rows,
        omitted_fields: job.omitted_fields,
        printer: None,
    }
}
