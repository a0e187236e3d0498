//! Forwarding of raw child output to the output hub

use super::hub::OutputHub;
use crate::types::{LaunchId, OutputEvent, OutputStream};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, trace};

const READ_CHUNK: usize = 8192;

/// Turns arbitrary byte chunks into text without splitting UTF-8 sequences.
///
/// An incomplete trailing sequence is held back until the next chunk; invalid
/// bytes are replaced with U+FFFD.
#[derive(Debug, Default)]
pub(crate) struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[bad..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        out
    }

    /// Whatever is still pending at end of stream
    pub(crate) fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

/// Read `reader` to EOF, publishing each chunk as one event
pub(crate) async fn forward_output<R>(
    mut reader: R,
    launch_id: LaunchId,
    stream: OutputStream,
    events: OutputHub,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    let mut chunker = Utf8Chunker::default();

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("Launch {} {:?} closed", launch_id, stream);
                break;
            }
            Ok(n) => {
                let text = chunker.push(&buf[..n]);
                if !text.is_empty() {
                    publish(&events, launch_id, stream, text);
                }
            }
            Err(e) => {
                error!("Error reading launch {} {:?}: {}", launch_id, stream, e);
                break;
            }
        }
    }

    let tail = chunker.finish();
    if !tail.is_empty() {
        publish(&events, launch_id, stream, tail);
    }
}

fn publish(events: &OutputHub, launch_id: LaunchId, stream: OutputStream, text: String) {
    trace!("Launch {} {:?}: {} bytes", launch_id, stream, text.len());
    events.publish(OutputEvent::new(launch_id, stream, text));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunker_holds_split_sequence() {
        let bytes = "héllo".as_bytes();
        let mut chunker = Utf8Chunker::default();

        // 'é' is two bytes starting at index 1
        let first = chunker.push(&bytes[..2]);
        let second = chunker.push(&bytes[2..]);

        assert_eq!(first, "h");
        assert_eq!(second, "éllo");
        assert_eq!(chunker.finish(), "");
    }

    #[test]
    fn test_chunker_replaces_invalid_bytes() {
        let mut chunker = Utf8Chunker::default();
        assert_eq!(chunker.push(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_chunker_flushes_truncated_tail() {
        let mut chunker = Utf8Chunker::default();
        assert_eq!(chunker.push(&[b'x', 0xe2, 0x82]), "x");
        assert_eq!(chunker.finish(), "\u{FFFD}");
    }

    #[tokio::test]
    async fn test_forward_output_publishes_everything() {
        let hub = OutputHub::new();
        let mut rx = hub.subscribe();
        let id = LaunchId::new();
        let input: &[u8] = b"line one\nline two\n";

        forward_output(input, id, OutputStream::Stdout, hub).await;

        let mut collected = String::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.launch_id, id);
            assert_eq!(event.stream, OutputStream::Stdout);
            collected.push_str(&event.data);
        }
        assert_eq!(collected, "line one\nline two\n");
    }
}
