//! Background task that drains the terminal into the output buffer.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::expect::SharedBuffer;

/// Bytes requested per read.
const READ_CHUNK: usize = 4096;

/// Spawn the reader for `source`.
///
/// Every chunk is appended to `buffer` and then announced by bumping the
/// generation in `notify`. At end of stream (or on a read error) the buffer
/// is finished and waiters are woken one last time.
pub(crate) fn spawn_reader<R>(source: R, buffer: SharedBuffer, notify: watch::Sender<u64>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(run(source, buffer, notify))
}

async fn run<R>(mut source: R, buffer: SharedBuffer, notify: watch::Sender<u64>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        match source.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                tracing::trace!(bytes = n, data = ?String::from_utf8_lossy(&chunk[..n]), "read from pty");
                buffer.lock().await.append(&chunk[..n]);
                notify.send_modify(|generation| *generation = generation.wrapping_add(1));
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::warn!(error = %e, "pty read failed, treating as end of stream");
                break;
            }
        }
    }

    buffer.lock().await.finish();
    notify.send_modify(|generation| *generation = generation.wrapping_add(1));
    tracing::debug!("pty reached end of stream");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect::OutputBuffer;
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn drains_source_and_marks_eof() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let buffer = Arc::new(Mutex::new(OutputBuffer::new(true)));
        let (notify, mut seen) = watch::channel(0);

        let task = spawn_reader(rx, Arc::clone(&buffer), notify);

        tx.write_all("caf\u{e9} ".as_bytes()).await.unwrap();
        seen.changed().await.unwrap();
        tx.write_all(b"$ ").await.unwrap();
        drop(tx);
        task.await.unwrap();

        let buffer = buffer.lock().await;
        assert!(buffer.is_eof());
        assert_eq!(buffer.pending(), "caf\u{e9} $ ");
        assert!(*seen.borrow_and_update() >= 2);
    }
}
