use super::parser::ProgressParser;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

const READ_CHUNK: usize = 8 * 1024;

/// Drains `reader` (typically an analyzer's stderr) into `parser` until EOF or
/// cancellation, then flushes any trailing partial line. Returns the parser so
/// callers can inspect its counters.
pub async fn monitor_progress<R>(
    mut reader: R,
    mut parser: ProgressParser,
    cancel: Option<CancellationToken>,
) -> std::io::Result<ProgressParser>
where
    R: AsyncRead + Unpin,
{
    let cancel = cancel.unwrap_or_default();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let read = tokio::select! {
            res = reader.read(&mut chunk) => res?,
            _ = cancel.cancelled() => {
                log::debug!("progress monitor cancelled");
                break;
            }
        };
        if read == 0 {
            break;
        }
        parser.feed_bytes(&chunk[..read]);
    }

    parser.flush();
    log::debug!(
        "progress monitor finished: {} events, {} lines ignored",
        parser.delivered(),
        parser.dropped()
    );
    Ok(parser)
}
