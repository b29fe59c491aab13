// Label layout engine: units, schema, regions, auto-sizing, arrangement and
// rebalancing, plus the batch runner that drives them per row.
// CPU-bound; callers on the async runtime must go through spawn_blocking.

pub mod arrange;
pub mod autosize;
pub mod batch;
pub mod content;
pub mod error;
pub mod rebalance;
pub mod regions;
pub mod schema;
pub mod units;

pub use arrange::{ArrangedElement, LayoutResult, Placement};
pub use batch::{layout_row, run_batch, BatchContext, CancelToken, NoProgress, ProgressSink};
pub use content::RowContent;
pub use error::LayoutError;
pub use regions::{Region, RegionId, RegionLayout};
pub use schema::{Alignment, ElementKind, LabelSpec, Margins, Position, PositionMap, SlotSpec};
pub use units::{Dimension, MmSize, Unit};
