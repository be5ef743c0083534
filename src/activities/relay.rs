//! # Output relay: child stream lines into the unified log.
//!
//! Each relay owns one output stream of a child process and forwards every complete
//! line to a [`LineSink`], tagged with the stream name.
//!
//! ## Rules
//! - Cancellation is checked **before** each read, never during one.
//! - Only newline-terminated lines are forwarded; a trailing fragment at EOF is dropped.
//! - EOF and read errors end the relay silently.
//! - Lines are decoded lossily and trimmed of surrounding whitespace.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Destination for relayed output lines.
pub trait LineSink: Send + Sync + 'static {
    /// Receives one line (without its terminator) read from stream `pipe`.
    fn line(&self, pipe: &'static str, line: &str);
}

/// Default sink: emits each line as an `info` event with a `pipe` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LineSink for TracingSink {
    fn line(&self, pipe: &'static str, line: &str) {
        info!(pipe, "{line}");
    }
}

/// Copies lines from `reader` into `sink` until EOF, a read error, or `token` is observed
/// cancelled between reads.
pub(crate) async fn relay<R, S>(reader: R, pipe: &'static str, token: CancellationToken, sink: &S)
where
    R: AsyncRead + Unpin,
    S: LineSink + ?Sized,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        if token.is_cancelled() {
            return;
        }

        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(_) if buf.last() != Some(&b'\n') => return,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                sink.line(pipe, line.trim());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::testing::CollectSink;
    use std::io::Cursor;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn forwards_lines_in_order_with_tag() {
        let sink = CollectSink::default();
        let input = Cursor::new(b"first\nsecond\r\n  third  \n".to_vec());

        relay(input, "stdout", CancellationToken::new(), &sink).await;

        assert_eq!(
            sink.lines(),
            vec![
                ("stdout", "first".to_owned()),
                ("stdout", "second".to_owned()),
                ("stdout", "third".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn drops_unterminated_tail() {
        let sink = CollectSink::default();
        let input = Cursor::new(b"complete\npartial".to_vec());

        relay(input, "stderr", CancellationToken::new(), &sink).await;

        assert_eq!(sink.lines(), vec![("stderr", "complete".to_owned())]);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_reading() {
        let sink = CollectSink::default();
        let token = CancellationToken::new();
        token.cancel();

        relay(Cursor::new(b"never\n".to_vec()), "stdout", token, &sink).await;

        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_end_relay() {
        let sink = CollectSink::default();
        let input = Cursor::new(b"bad \xff byte\nnext\n".to_vec());

        relay(input, "stdout", CancellationToken::new(), &sink).await;

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].1.starts_with("bad "));
        assert_eq!(lines[1].1, "next");
    }

    #[tokio::test]
    async fn cancellation_does_not_interrupt_pending_read() {
        let sink = CollectSink::default();
        let token = CancellationToken::new();
        let (mut tx, rx) = tokio::io::duplex(64);

        let relay_token = token.clone();
        let handle = tokio::spawn(async move {
            relay(rx, "stdout", relay_token, &sink).await;
            sink.lines()
        });

        tx.write_all(b"one\n").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        token.cancel();
        tx.write_all(b"two\n").await.unwrap();

        let lines = handle.await.unwrap();
        assert_eq!(
            lines,
            vec![("stdout", "one".to_owned()), ("stdout", "two".to_owned())]
        );
    }
}
