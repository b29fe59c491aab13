//! Exporters: the same `LayoutResult` rendered two ways.
//!
//! - `raster`: one greyscale canvas per label, persisted through `assets`.
//! - `commands` + `zpl`: device drawing instructions in millimeters/dots,
//!   serialized to printer markup and handed to a `printer` transport. In
//!   image mode the composed raster travels as a single graphic instead.

pub mod assets;
pub mod commands;
pub mod printer;
pub mod raster;
pub mod zpl;

use thiserror::Error;

use crate::layout::LayoutError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("layout error during export: {0}")]
    Layout(#[from] LayoutError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("asset {0} not found")]
    AssetNotFound(uuid::Uuid),

    #[error("job is laid out for {requested} dots/mm but the printer runs at {device} dots/mm")]
    DeviceMismatch { requested: u32, device: u32 },

    #[error("printer transport failed: {0}")]
    Transport(String),
}

pub use assets::{AssetHandle, AssetStore};
pub use commands::{emit_commands, emit_image_commands, DeviceCommand, MarkupMode};
pub use printer::{PrintTransport, SpoolPrinter, TcpPrinter};
pub use raster::compose;
