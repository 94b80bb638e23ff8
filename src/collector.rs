use crate::CollectorError;
use bytes::{Bytes, BytesMut};
use std::borrow::Cow;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const READ_BUFFER_SIZE: usize = 16 * 1024; // 16 kb

/// Drains one output stream of a process into memory.
///
/// Reading starts as soon as the collector is created, so that a process writing lots of output
/// never blocks on a full pipe while nobody is waiting for it yet.
///
/// For proper cleanup, call
/// - `wait()`, which waits for the stream to reach EOF.
/// - `abort()`, which sends a termination signal and returns everything read so far.
///
/// If dropped without calling either, the task will be aborted (forceful, not waiting for its
/// completion).
#[derive(Debug)]
pub(crate) struct Collector {
    stream_name: &'static str,
    task: Option<JoinHandle<Result<Bytes, CollectorError>>>,
    task_termination_sender: Option<oneshot::Sender<()>>,
}

impl Collector {
    pub(crate) fn spawn<R: AsyncRead + Unpin + Send + 'static>(
        process_name: Cow<'static, str>,
        stream_name: &'static str,
        stream: R,
    ) -> Self {
        let (term_sig_tx, term_sig_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            read_to_end(stream, term_sig_rx)
                .await
                .map_err(|source| CollectorError::ReadFailed {
                    process_name,
                    stream_name,
                    source,
                })
        });
        Self {
            stream_name,
            task: Some(task),
            task_termination_sender: Some(term_sig_tx),
        }
    }

    /// Waits for the stream to be closed by the writing side.
    ///
    /// This function is cancel safe. It may be called again if a previous call was cancelled.
    /// Calling it after it already completed returns an empty buffer.
    pub(crate) async fn wait(&mut self) -> Result<Bytes, CollectorError> {
        let Some(task) = self.task.as_mut() else {
            return Ok(Bytes::new());
        };
        let result = task.await;
        self.task = None;
        let _ = self.task_termination_sender.take();
        result.map_err(|source| CollectorError::TaskJoin {
            stream_name: self.stream_name,
            source,
        })?
    }

    /// Stops reading and returns whatever was collected up to now.
    pub(crate) async fn abort(&mut self) -> Result<Bytes, CollectorError> {
        if let Some(task_termination_sender) = self.task_termination_sender.take() {
            // Sending fails if the task already reached EOF and dropped the receiver.
            let _res = task_termination_sender.send(());
        }
        self.wait().await
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        if let Some(task_termination_sender) = self.task_termination_sender.take() {
            let _res = task_termination_sender.send(());
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn read_to_end<R: AsyncRead + Unpin>(
    mut stream: R,
    mut term_sig_rx: oneshot::Receiver<()>,
) -> io::Result<Bytes> {
    // A BytesMut grows when used in a `read_buf` call.
    let mut buf = BytesMut::with_capacity(READ_BUFFER_SIZE);
    loop {
        buf.reserve(READ_BUFFER_SIZE);
        tokio::select! {
            read = stream.read_buf(&mut buf) => {
                if read? == 0 {
                    break;
                }
            }
            _msg = &mut term_sig_rx => {
                tracing::debug!(
                    collected = buf.len(),
                    "Collector stopped before reaching EOF"
                );
                break;
            }
        }
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tracing_test::traced_test;

    #[tokio::test]
    async fn collects_everything_until_eof() {
        let (read_half, mut write_half) = tokio::io::duplex(4);
        let mut collector = Collector::spawn("test".into(), "stdout", read_half);

        // More data than the duplex buffer holds, forcing multiple reads.
        write_half.write_all(b"hello\nworld\n").await.unwrap();
        drop(write_half);

        let collected = collector.wait().await.unwrap();
        assert_that(&collected[..]).is_equal_to(b"hello\nworld\n".as_slice());
    }

    #[tokio::test]
    async fn collects_nothing_from_empty_stream() {
        let (read_half, write_half) = tokio::io::duplex(64);
        let mut collector = Collector::spawn("test".into(), "stdout", read_half);
        drop(write_half);

        let collected = collector.wait().await.unwrap();
        assert_that(collected.is_empty()).is_true();
    }

    #[tokio::test]
    #[traced_test]
    async fn abort_returns_partial_output_of_open_stream() {
        let (read_half, mut write_half) = tokio::io::duplex(64);
        let mut collector = Collector::spawn("test".into(), "stderr", read_half);

        write_half.write_all(b"partial").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The write half stays open. Waiting would never complete.
        let collected = collector.abort().await.unwrap();
        assert_that(&collected[..]).is_equal_to(b"partial".as_slice());
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .any(|line| line.contains("Collector stopped before reaching EOF"))
            {
                true => Ok(()),
                false => Err("Expected the collector to log its early stop".to_string()),
            }
        });

        drop(write_half);
    }

    #[tokio::test]
    async fn wait_is_resumable_after_cancellation() {
        let (read_half, mut write_half) = tokio::io::duplex(64);
        let mut collector = Collector::spawn("test".into(), "stdout", read_half);

        let first = tokio::time::timeout(Duration::from_millis(20), collector.wait()).await;
        assert_that(first.is_err()).is_true();

        write_half.write_all(b"late").await.unwrap();
        drop(write_half);

        let collected = collector.wait().await.unwrap();
        assert_that(&collected[..]).is_equal_to(b"late".as_slice());
    }
}
