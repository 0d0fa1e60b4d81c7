//! Integration tests for the DuoDB client core.
//!
//! These exercise the expression compiler and the wire codec together, in
//! process: statements and paths parse into ASTs, embed into protocol
//! messages, encode into frames, and decode back. The decoder is also
//! driven with fragmented and corrupted input. No server is required; run
//! with a plain `cargo test -p duodb-integration`.

use std::sync::Once;

use duodb_proto::{Decoder, Encoder, ProtocolConfig, WireMessage};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Create an encoder with the default configuration.
#[must_use]
pub fn encoder() -> Encoder {
    init_tracing();
    Encoder::default()
}

/// Create a decoder with the default configuration.
#[must_use]
pub fn decoder() -> Decoder {
    init_tracing();
    Decoder::default()
}

/// Create a decoder with a specific frame size limit.
#[must_use]
pub fn decoder_with_limit(max_frame_size: u32) -> Decoder {
    init_tracing();
    Decoder::new(
        ProtocolConfig::builder()
            .max_frame_size(max_frame_size)
            .build(),
    )
}

/// Encode a message, feed the frame to a fresh decoder, and return the
/// decoded message. Asserts the frame is consumed exactly.
#[must_use]
pub fn round_trip(message: &WireMessage) -> WireMessage {
    let frame = encoder().encode(message).expect("message should encode");
    let mut decoder = decoder();
    decoder.feed(&frame);
    let decoded = decoder
        .next_message()
        .expect("frame should decode")
        .expect("frame should be complete");
    assert_eq!(decoder.buffered(), 0, "frame should be fully consumed");
    decoded
}

mod test_expression;
mod test_fragmentation;
mod test_path;
mod test_roundtrip;
