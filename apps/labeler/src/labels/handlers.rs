use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::printer::check_device;
use crate::export::{compose, emit_commands, emit_image_commands, zpl, ExportError, MarkupMode};
use crate::labels::{execute, prepare, BatchResponse, LabelJob, PreparedJob, RowReport};
use crate::layout::{BatchContext, LayoutResult};
use crate::state::AppState;

async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in label batch: {e}")))
}

fn prepare_job(state: &AppState, job: LabelJob) -> Result<PreparedJob, AppError> {
    prepare(job, &state.config, &state.renderers)
}

/// POST /api/v1/labels/layout
pub async fn handle_layout(
    State(state): State<AppState>,
    Json(job): Json<LabelJob>,
) -> Result<Json<BatchResponse>, AppError> {
    let prepared = prepare_job(&state, job)?;
    let response = blocking(move || execute(prepared, |_, _, _| Ok(()))).await?;
    Ok(Json(response))
}

/// POST /api/v1/labels/render
pub async fn handle_render(
    State(state): State<AppState>,
    Json(job): Json<LabelJob>,
) -> Result<Json<BatchResponse>, AppError> {
    let prepared = prepare_job(&state, job)?;
    let assets = state.assets.clone();

    let response = blocking(move || {
        execute(prepared, |ctx, layout, report| {
            let canvas = compose(&ctx.label, layout, ctx.margins)?;
            report.asset = Some(assets.save_png(&canvas)?);
            Ok(())
        })
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/labels/commands
pub async fn handle_commands(
    State(state): State<AppState>,
    Json(job): Json<LabelJob>,
) -> Result<Json<BatchResponse>, AppError> {
    let prepared = prepare_job(&state, job)?;
    let mode = prepared.markup;
    let response = blocking(move || execute(prepared, markup_exporter(mode))).await?;
    Ok(Json(response))
}

/// POST /api/v1/labels/print
///
/// Same as `/commands`, then every successful row is sent to the configured
/// printer once per copy. Rejected with 412 before any layout work when the
/// job's resolution differs from the printer's.
pub async fn handle_print(
    State(state): State<AppState>,
    Json(job): Json<LabelJob>,
) -> Result<Json<BatchResponse>, AppError> {
    let prepared = prepare_job(&state, job)?;
    let requested = prepared.ctx.label.device()?.dpmm;
    check_device(requested, state.printer.as_ref())?;

    let mode = prepared.markup;
    let mut response = blocking(move || execute(prepared, markup_exporter(mode))).await?;

    let batch_id = Uuid::new_v4();
    let mut sent = 0u32;
    for report in response.rows.iter_mut() {
        let Some(markup) = report.markup.clone() else {
            continue;
        };
        for copy in 1..=report.copies {
            let job_name = format!("{batch_id}-{}-{copy}", report.row);
            if let Err(e) = state.printer.send(&job_name, &markup).await {
                report.error = Some(e.to_string());
                break;
            }
            sent += 1;
        }
    }
    response.succeeded = response.rows.iter().filter(|r| r.error.is_none()).count();
    response.printer = Some(state.printer.target());

    info!(
        %batch_id,
        printed = response.succeeded,
        copies = sent,
        total = response.total,
        "print batch dispatched"
    );
    Ok(Json(response))
}

/// GET /api/v1/assets/:id
pub async fn handle_get_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let png = state.assets.load(id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], Bytes::from(png)))
}

fn markup_exporter(
    mode: MarkupMode,
) -> impl FnMut(&BatchContext, &LayoutResult, &mut RowReport) -> Result<(), ExportError> {
    move |ctx: &BatchContext, layout: &LayoutResult, report: &mut RowReport| {
        let commands = match mode {
            MarkupMode::Native => emit_commands(&ctx.label, layout, ctx.margins)?,
            MarkupMode::Image => {
                emit_image_commands(&ctx.label, compose(&ctx.label, layout, ctx.margins)?)?
            }
        };
        report.markup = Some(zpl::serialize(&commands));
        Ok(())
    }
}
