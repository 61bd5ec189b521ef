//! Unix socket transport to Dovecot's stats process.

use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;

use dovestats_core::error::{DoveStatsError, Result};
use dovestats_core::protocol::request_line;

/// Connect to the stats socket at `path`.
pub async fn connect(path: &Path) -> Result<UnixStream> {
    UnixStream::connect(path)
        .await
        .map_err(|e| DoveStatsError::transport(&format!("connect {}", path.display()), e))
}

/// Write the `EXPORT` request line for `scope`.
pub async fn send_request<W: AsyncWrite + Unpin>(w: &mut W, scope: &str) -> Result<()> {
    w.write_all(request_line(scope).as_bytes())
        .await
        .map_err(|e| DoveStatsError::transport("write request", e))?;
    w.flush()
        .await
        .map_err(|e| DoveStatsError::transport("flush request", e))
}
