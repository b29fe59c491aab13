use std::sync::Arc;

use crate::config::Config;
use crate::export::{AssetStore, PrintTransport};
use crate::render::ElementRenderers;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// QR/barcode encoders and font faces, loaded once at startup.
    pub renderers: ElementRenderers,
    pub assets: AssetStore,
    /// Pluggable printer transport. Default: spool directory; raw TCP when PRINTER_ADDR is set.
    pub printer: Arc<dyn PrintTransport>,
}
