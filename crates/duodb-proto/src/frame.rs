//! Frame layout: length-prefix handling and the tag bytes shared by the
//! encoder and decoder.
//!
//! A frame is a 4-byte little-endian length prefix, one message type tag
//! byte, and the payload. The declared length counts the tag and the payload
//! but never the prefix itself, so the smallest legal value is 1 (a bare tag
//! with an empty payload).

/// Size in bytes of the frame length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size in bytes of the message type tag.
pub const TYPE_TAG_SIZE: usize = 1;

/// Smallest legal declared length: the type tag with an empty payload.
pub const MIN_FRAME_LENGTH: u32 = 1;

/// Default upper bound on a frame's declared length (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Upper bound on the nesting depth of recursive payload structures
/// (expression trees and capability objects), enforced by both codec
/// directions so every encodable message is also decodable.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Reads the declared length from the start of `buf`, if the full prefix is
/// present.
#[must_use]
pub fn peek_length(buf: &[u8]) -> Option<u32> {
    let prefix = buf.get(..LENGTH_PREFIX_SIZE)?;
    let mut bytes = [0u8; LENGTH_PREFIX_SIZE];
    bytes.copy_from_slice(prefix);
    Some(u32::from_le_bytes(bytes))
}

// ---------------------------------------------------------------------------
// Payload tag bytes
// ---------------------------------------------------------------------------

/// Scalar value tags. Unsigned and signed integers carry a width-specific
/// tag; the encoder picks the narrowest lossless width and the decoder widens
/// back to the 64-bit forms.
pub(crate) mod scalar_tag {
    pub const NULL: u8 = 0x00;
    pub const BOOL: u8 = 0x01;
    pub const UINT8: u8 = 0x02;
    pub const UINT16: u8 = 0x03;
    pub const UINT32: u8 = 0x04;
    pub const UINT64: u8 = 0x05;
    pub const SINT8: u8 = 0x06;
    pub const SINT16: u8 = 0x07;
    pub const SINT32: u8 = 0x08;
    pub const SINT64: u8 = 0x09;
    pub const DOUBLE: u8 = 0x0a;
    pub const STRING: u8 = 0x0b;
    pub const BYTES: u8 = 0x0c;
}

/// Expression node tags.
pub(crate) mod expr_tag {
    pub const LITERAL: u8 = 0x01;
    pub const IDENTIFIER: u8 = 0x02;
    pub const OPERATOR: u8 = 0x03;
    pub const FUNCTION_CALL: u8 = 0x04;
    pub const PLACEHOLDER: u8 = 0x05;
}

/// Document path item tags.
pub(crate) mod path_tag {
    pub const MEMBER: u8 = 0x01;
    pub const MEMBER_ASTERISK: u8 = 0x02;
    pub const ARRAY_INDEX: u8 = 0x03;
    pub const ARRAY_INDEX_ASTERISK: u8 = 0x04;
    pub const DOUBLE_ASTERISK: u8 = 0x05;
}

/// Placeholder kind tags.
pub(crate) mod placeholder_tag {
    pub const NAMED: u8 = 0x01;
    pub const POSITION: u8 = 0x02;
}

/// Statement argument kind tags.
pub(crate) mod argument_tag {
    pub const SCALAR: u8 = 0x01;
    pub const EXPR: u8 = 0x02;
    pub const DOCUMENT: u8 = 0x03;
}

/// Capability value kind tags.
pub(crate) mod capability_tag {
    pub const BOOL: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const OBJECT: u8 = 0x03;
}
