//! Error types for the wire codec.

use duodb_expr::error::ArityError;

/// Encoding failed; no frame bytes were produced.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The encoded frame would exceed the configured maximum length.
    #[error("frame of {length} bytes exceeds the configured maximum of {max}")]
    FrameTooLarge {
        /// Declared length the frame would carry (type tag plus payload).
        length: usize,
        /// Configured maximum declared length.
        max: u32,
    },
    /// A field value has no representable wire encoding because it exceeds
    /// its `u32` length field.
    #[error("{context} of {length} bytes does not fit its length field")]
    ValueTooLarge {
        /// The field being written.
        context: &'static str,
        /// The unrepresentable length.
        length: usize,
    },
    /// An expression or capability object nests deeper than the codec's
    /// limit; frames this deep would be refused by the decoder.
    #[error("{context} nested deeper than {limit} levels")]
    NestingTooDeep {
        /// The structure being written.
        context: &'static str,
        /// The depth limit that was exceeded.
        limit: usize,
    },
    /// A document argument could not be serialized.
    #[error("document serialization failed: {0}")]
    Document(#[from] serde_json::Error),
}

/// Decoding failed.
///
/// [`BadLength`](Self::BadLength) and [`FrameTooLarge`](Self::FrameTooLarge)
/// are raised from the frame header alone, before any payload is buffered.
/// [`UnknownMessageType`](Self::UnknownMessageType) is raised after the
/// offending frame has been consumed, so a caller may skip the frame and
/// continue with the next one. Every other error leaves the stream position
/// unspecified; the connection should be torn down.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The declared frame length is below the minimum of one byte (the type
    /// tag alone).
    #[error("declared frame length {declared} is below the minimum of 1")]
    BadLength {
        /// Length the prefix declared.
        declared: u32,
    },
    /// The declared frame length exceeds the configured maximum.
    #[error("declared frame length {declared} exceeds the configured maximum of {max}")]
    FrameTooLarge {
        /// Length the prefix declared.
        declared: u32,
        /// Configured maximum declared length.
        max: u32,
    },
    /// The frame's type tag is not a known message type.
    #[error("unknown message type tag {tag:#04x}")]
    UnknownMessageType {
        /// The unrecognized tag byte.
        tag: u8,
    },
    /// The input or payload ended before a field was complete.
    #[error("truncated input while reading {context}: {needed} more bytes needed")]
    Truncated {
        /// The field being read.
        context: &'static str,
        /// How many further bytes the field needed.
        needed: usize,
    },
    /// A payload byte that selects among alternatives held an unknown value.
    #[error("invalid {context} {tag:#04x}")]
    BadTag {
        /// The field being read.
        context: &'static str,
        /// The unrecognized byte.
        tag: u8,
    },
    /// Bytes remained after the message was fully read.
    #[error("{remaining} unexpected trailing bytes")]
    TrailingBytes {
        /// How many bytes remained.
        remaining: usize,
    },
    /// A string field held invalid UTF-8.
    #[error("invalid UTF-8 in {context}")]
    BadUtf8 {
        /// The field being read.
        context: &'static str,
    },
    /// The payload nests deeper than the codec's limit. Raised before the
    /// recursion happens, so an adversarial frame cannot exhaust the stack.
    #[error("{context} nested deeper than {limit} levels")]
    NestingTooDeep {
        /// The structure being read.
        context: &'static str,
        /// The depth limit that was exceeded.
        limit: usize,
    },
    /// A decoded operator node failed arity validation.
    #[error(transparent)]
    Arity(#[from] ArityError),
    /// A document payload was not valid JSON.
    #[error("document payload is not valid JSON: {0}")]
    Document(#[from] serde_json::Error),
}
