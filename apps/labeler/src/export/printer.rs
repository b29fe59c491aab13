use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::info;

use super::ExportError;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Destination for printer markup. Carried in `AppState` as `Arc<dyn PrintTransport>`.
#[async_trait]
pub trait PrintTransport: Send + Sync {
    /// Human-readable target, for logs and responses.
    fn target(&self) -> String;

    /// Physical resolution of the device in dots per millimeter.
    fn dpmm(&self) -> u32;

    async fn send(&self, job: &str, markup: &str) -> Result<(), ExportError>;
}

/// Rejects a job laid out for a different resolution than the device prints at.
pub fn check_device(requested_dpmm: u32, transport: &dyn PrintTransport) -> Result<(), ExportError> {
    let device = transport.dpmm();
    if requested_dpmm == device {
        Ok(())
    } else {
        Err(ExportError::DeviceMismatch {
            requested: requested_dpmm,
            device,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Raw TCP (port 9100 style)
// ────────────────────────────────────────────────────────────────────────────

pub struct TcpPrinter {
    pub addr: String,
    pub dpmm: u32,
}

#[async_trait]
impl PrintTransport for TcpPrinter {
    fn target(&self) -> String {
        format!("tcp://{}", self.addr)
    }

    fn dpmm(&self) -> u32 {
        self.dpmm
    }

    async fn send(&self, job: &str, markup: &str) -> Result<(), ExportError> {
        let transport = |e: std::io::Error| ExportError::Transport(format!("{}: {e}", self.addr));

        let mut stream = TcpStream::connect(&self.addr).await.map_err(transport)?;
        stream.write_all(markup.as_bytes()).await.map_err(transport)?;
        stream.shutdown().await.map_err(transport)?;

        info!(job, target = %self.target(), bytes = markup.len(), "job sent");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Spool directory
// ────────────────────────────────────────────────────────────────────────────

/// Drops each job as `{job}.zpl` into a directory watched by something else.
pub struct SpoolPrinter {
    pub dir: PathBuf,
    pub dpmm: u32,
}

#[async_trait]
impl PrintTransport for SpoolPrinter {
    fn target(&self) -> String {
        format!("spool://{}", self.dir.display())
    }

    fn dpmm(&self) -> u32 {
        self.dpmm
    }

    async fn send(&self, job: &str, markup: &str) -> Result<(), ExportError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let name: String = job
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = self.dir.join(format!("{name}.zpl"));
        tokio::fs::write(&path, markup).await?;

        info!(job, path = %path.display(), "job spooled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_spool_printer_writes_sanitized_file() {
        let dir = tempfile::tempdir().unwrap();
        let printer = SpoolPrinter {
            dir: dir.path().join("spool"),
            dpmm: 8,
        };
        printer.send("batch 1/row-0", "^XA^XZ").await.unwrap();

        let written = std::fs::read_to_string(dir.path().join("spool/batch_1_row-0.zpl")).unwrap();
        assert_eq!(written, "^XA^XZ");
    }

    #[tokio::test]
    async fn test_tcp_printer_streams_markup() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = String::new();
            socket.read_to_string(&mut buf).await.unwrap();
            buf
        });

        let printer = TcpPrinter { addr, dpmm: 8 };
        printer.send("job", "^XA\n^XZ\n").await.unwrap();
        assert_eq!(server.await.unwrap(), "^XA\n^XZ\n");
    }

    #[tokio::test]
    async fn test_unreachable_printer_is_a_transport_error() {
        // Bind then drop to get a port nothing listens on
        let addr = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().to_string()
        };
        let printer = TcpPrinter { addr, dpmm: 8 };
        let err = printer.send("job", "^XA^XZ").await.unwrap_err();
        assert!(matches!(err, ExportError::Transport(_)));
    }

    #[test]
    fn test_device_mismatch_blocks_print() {
        let printer = SpoolPrinter {
            dir: PathBuf::from("unused"),
            dpmm: 12,
        };
        assert!(check_device(12, &printer).is_ok());
        assert!(matches!(
            check_device(8, &printer),
            Err(ExportError::DeviceMismatch { requested: 8, device: 12 })
        ));
    }
}
