//! Wire protocol codec for the DuoDB client: typed messages, a frame
//! encoder, and an incremental frame decoder.
//!
//! Every message travels in one frame: a 4-byte little-endian length prefix
//! counting the message type tag and the payload, then the tag byte, then
//! the payload. The [`message`] module defines the message schema,
//! [`encode`] turns a [`WireMessage`] into a frame, and [`decode`] feeds on
//! raw transport bytes and yields messages as complete frames arrive,
//! validating declared lengths before buffering any payload. Expression
//! arguments embed the ASTs produced by the `duodb-expr` crate.

pub mod capabilities;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod frame;
pub mod message;

pub use capabilities::{Capabilities, CapabilityValue};
pub use config::ProtocolConfig;
pub use decode::{Decoder, decode_frame};
pub use encode::Encoder;
pub use error::{DecodeError, EncodeError};
pub use frame::{DEFAULT_MAX_FRAME_SIZE, MAX_NESTING_DEPTH};
pub use message::{
    Argument, ColumnMeta, Dialect, FieldType, MessageType, Notice, NoticeScope, Row, ServerError,
    Severity, StmtExecute, WireMessage,
};
