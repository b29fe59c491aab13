mod config;
mod errors;
mod export;
mod labels;
mod layout;
mod render;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::export::{AssetStore, PrintTransport, SpoolPrinter, TcpPrinter};
use crate::render::{ElementRenderers, LinearBarcodeEncoder, QrCodeEncoder, TrueTypeFace};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting labeler v{}", env!("CARGO_PKG_VERSION"));

    // Load font faces
    let text_face = Arc::new(TrueTypeFace::load(&config.font_path)?);
    let title_face = if config.title_font_path == config.font_path {
        text_face.clone()
    } else {
        Arc::new(TrueTypeFace::load(&config.title_font_path)?)
    };
    info!(
        "Fonts loaded: text={} title={}",
        config.font_path.display(),
        config.title_font_path.display()
    );

    let renderers = ElementRenderers {
        qr: Arc::new(QrCodeEncoder),
        barcode: Arc::new(LinearBarcodeEncoder::default()),
        text_face,
        title_face,
    };

    // Initialize asset store
    let assets = AssetStore::open(&config.asset_dir)?;
    info!("Asset store at {}", assets.dir().display());

    // Initialize printer transport (raw TCP when PRINTER_ADDR is set, spool directory otherwise)
    let printer: Arc<dyn PrintTransport> = match &config.printer_addr {
        Some(addr) => Arc::new(TcpPrinter {
            addr: addr.clone(),
            dpmm: config.printer_dpmm,
        }),
        None => Arc::new(SpoolPrinter {
            dir: config.printer_spool_dir.clone(),
            dpmm: config.printer_dpmm,
        }),
    };
    info!("Printer transport: {} ({} dots/mm)", printer.target(), printer.dpmm());

    // Build app state
    let state = AppState {
        config: config.clone(),
        renderers,
        assets,
        printer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
