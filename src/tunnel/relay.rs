// Bidirectional byte relay for one local/remote connection pair

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

/// Copies local→remote and remote→local in two tasks. Whichever direction finishes first
/// (EOF or error) closes the pair, so the other direction never hangs half-open.
/// Returns (bytes local→remote, bytes remote→local).
pub async fn relay_pair<L, R>(local: L, remote: R) -> (u64, u64)
where
    L: AsyncRead + AsyncWrite + Send + 'static,
    R: AsyncRead + AsyncWrite + Send + 'static,
{
    let (local_rd, local_wr) = tokio::io::split(local);
    let (remote_rd, remote_wr) = tokio::io::split(remote);
    let (closed_tx, closed_rx) = watch::channel(false);
    let closed_tx = Arc::new(closed_tx);

    let upstream = tokio::spawn(copy_until_closed(
        local_rd,
        remote_wr,
        closed_tx.clone(),
        closed_rx.clone(),
    ));
    let downstream = tokio::spawn(copy_until_closed(remote_rd, local_wr, closed_tx, closed_rx));

    let (sent, received) = tokio::join!(upstream, downstream);
    (sent.unwrap_or(0), received.unwrap_or(0))
}

async fn copy_until_closed<Rd, Wr>(
    mut from: Rd,
    mut to: Wr,
    closed_tx: Arc<watch::Sender<bool>>,
    mut closed_rx: watch::Receiver<bool>,
) -> u64
where
    Rd: AsyncRead + Unpin,
    Wr: AsyncWrite + Unpin,
{
    let mut copied = 0u64;
    let mut buf = vec![0u8; 8 * 1024];
    loop {
        let n = tokio::select! {
            read = from.read(&mut buf) => match read {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            },
            _ = closed_rx.wait_for(|closed| *closed) => break,
        };
        if to.write_all(&buf[..n]).await.is_err() {
            break;
        }
        copied += n as u64;
    }
    closed_tx.send_replace(true);
    let _ = to.shutdown().await;
    copied
}
