use thiserror::Error;

use crate::layout::regions::RegionId;
use crate::layout::schema::{ElementKind, Position};
use crate::layout::units::Unit;

/// Errors raised by the layout core.
///
/// Everything except `Render` and `Cancelled` is a configuration error: it is
/// detected before any row is laid out and aborts the whole batch.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("conversion from {0:?} requires a positive device resolution")]
    MissingResolution(Unit),

    #[error("millimeter conversion requires a secondary pixel measurement")]
    MissingSecondaryMeasurement,

    #[error("region {0:?} has zero size but elements are assigned to it")]
    EmptyRegion(RegionId),

    #[error("invalid label schema: {0}")]
    Schema(String),

    #[error("unrecognized element kind `{0}`")]
    UnknownElementKind(String),

    #[error("failed to render {kind} at position {position}: {reason}")]
    Render {
        position: Position,
        kind: ElementKind,
        reason: String,
    },

    #[error("batch cancelled before row {0} started")]
    Cancelled(usize),
}

impl LayoutError {
    /// True for errors that invalidate the whole batch rather than a single row.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, LayoutError::Render { .. } | LayoutError::Cancelled(_))
    }
}
