//! Protocol decoder: parses length-prefixed frames back into typed messages.
//!
//! [`Decoder`] is incremental because the transport delivers bytes in chunks
//! that need not align with frame boundaries: [`Decoder::feed`] appends raw
//! bytes, [`Decoder::next_message`] yields a message once a full frame is
//! buffered and consumes nothing before that. The declared length is
//! validated as soon as the 4-byte prefix is visible, so an oversized or
//! corrupt length is rejected before any payload is buffered or allocated.
//!
//! Payload parsing runs over a bounds-checked [`Reader`] that can never read
//! past the declared length; payload bytes left unread after a message is
//! complete are an error rather than silently discarded. Recursive payloads
//! (expression trees, capability objects) are bounded at
//! [`MAX_NESTING_DEPTH`] levels, so a frame that nests deeper fails with an
//! error instead of driving unbounded recursion.

use bytes::{Bytes, BytesMut};
use duodb_expr::ast::{Expr, Identifier, Placeholder, Scalar};
use duodb_expr::path::{DocumentPath, PathItem};

use crate::capabilities::{Capabilities, CapabilityValue};
use crate::config::ProtocolConfig;
use crate::error::DecodeError;
use crate::frame::{
    self, LENGTH_PREFIX_SIZE, MAX_NESTING_DEPTH, MIN_FRAME_LENGTH, TYPE_TAG_SIZE, argument_tag,
    capability_tag, expr_tag, path_tag, placeholder_tag, scalar_tag,
};
use crate::message::{
    Argument, ColumnMeta, Dialect, FieldType, MessageType, Notice, NoticeScope, Row, ServerError,
    Severity, StmtExecute, WireMessage,
};

/// Incremental frame decoder for one logical connection.
///
/// A `Decoder` owns a private accumulation buffer and must be driven by the
/// connection's single reader; frames decode strictly in arrival order. A
/// session layer abandons an in-flight decode by dropping the decoder.
#[derive(Debug)]
pub struct Decoder {
    config: ProtocolConfig,
    buffer: BytesMut,
}

impl Decoder {
    /// A decoder using the given configuration.
    #[must_use]
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            buffer: BytesMut::new(),
        }
    }

    /// Append raw bytes from the transport; any chunk size is fine, including
    /// a single byte.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of bytes currently buffered but not yet consumed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Decode the next buffered frame, if one is complete.
    ///
    /// Returns `Ok(None)` while the buffered bytes do not yet hold a full
    /// frame, consuming nothing, so the caller can feed more input and call
    /// again.
    ///
    /// # Errors
    ///
    /// [`DecodeError::BadLength`] and [`DecodeError::FrameTooLarge`] are
    /// raised from the 4-byte prefix alone; the corrupt bytes stay buffered
    /// and the connection should be torn down.
    /// [`DecodeError::UnknownMessageType`] consumes the offending frame, so
    /// the caller may skip it and continue with the next frame. Any other
    /// error means the frame's payload was malformed.
    pub fn next_message(&mut self) -> Result<Option<WireMessage>, DecodeError> {
        let Some(declared) = frame::peek_length(&self.buffer) else {
            return Ok(None);
        };
        check_declared(declared, self.config.max_frame_size)?;

        let total = LENGTH_PREFIX_SIZE + declared as usize;
        if self.buffer.len() < total {
            return Ok(None);
        }

        let full_frame = self.buffer.split_to(total);
        let tag = full_frame[LENGTH_PREFIX_SIZE];
        let Some(message_type) = MessageType::from_tag(tag) else {
            return Err(DecodeError::UnknownMessageType { tag });
        };
        decode_payload(message_type, &full_frame[LENGTH_PREFIX_SIZE + TYPE_TAG_SIZE..]).map(Some)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}

/// Decode exactly one complete frame from `buf`, using the default
/// configuration's frame size limit.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if `buf` holds less than one frame and
/// [`DecodeError::TrailingBytes`] if it holds more; otherwise as
/// [`Decoder::next_message`].
pub fn decode_frame(buf: &[u8]) -> Result<WireMessage, DecodeError> {
    let config = ProtocolConfig::default();
    let Some(declared) = frame::peek_length(buf) else {
        return Err(DecodeError::Truncated {
            context: "frame header",
            needed: LENGTH_PREFIX_SIZE - buf.len(),
        });
    };
    check_declared(declared, config.max_frame_size)?;

    let total = LENGTH_PREFIX_SIZE + declared as usize;
    if buf.len() < total {
        return Err(DecodeError::Truncated {
            context: "frame payload",
            needed: total - buf.len(),
        });
    }
    if buf.len() > total {
        return Err(DecodeError::TrailingBytes {
            remaining: buf.len() - total,
        });
    }

    let tag = buf[LENGTH_PREFIX_SIZE];
    let Some(message_type) = MessageType::from_tag(tag) else {
        return Err(DecodeError::UnknownMessageType { tag });
    };
    decode_payload(message_type, &buf[LENGTH_PREFIX_SIZE + TYPE_TAG_SIZE..])
}

/// Validate a declared frame length against the configured maximum, from the
/// prefix alone.
fn check_declared(declared: u32, max: u32) -> Result<(), DecodeError> {
    if declared < MIN_FRAME_LENGTH {
        return Err(DecodeError::BadLength { declared });
    }
    if declared > max {
        return Err(DecodeError::FrameTooLarge { declared, max });
    }
    Ok(())
}

fn decode_payload(message_type: MessageType, payload: &[u8]) -> Result<WireMessage, DecodeError> {
    let mut reader = Reader::new(payload);
    let message = match message_type {
        MessageType::CapabilitiesGet => WireMessage::CapabilitiesGet,
        MessageType::CapabilitiesSet => {
            WireMessage::CapabilitiesSet(read_capabilities(&mut reader, MAX_NESTING_DEPTH)?)
        }
        MessageType::SessionOpen => WireMessage::SessionOpen,
        MessageType::SessionClose => WireMessage::SessionClose,
        MessageType::ConnectionClose => WireMessage::ConnectionClose,
        MessageType::StmtExecute => WireMessage::StmtExecute(read_stmt_execute(&mut reader)?),
        MessageType::Ok => WireMessage::Ok {
            message: reader.opt_str("ok message")?,
        },
        MessageType::Error => WireMessage::Error(read_error(&mut reader)?),
        MessageType::Capabilities => {
            WireMessage::Capabilities(read_capabilities(&mut reader, MAX_NESTING_DEPTH)?)
        }
        MessageType::Notice => WireMessage::Notice(read_notice(&mut reader)?),
        MessageType::ColumnMeta => WireMessage::ColumnMeta(read_column_meta(&mut reader)?),
        MessageType::Row => WireMessage::Row(read_row(&mut reader)?),
        MessageType::FetchDone => WireMessage::FetchDone,
        MessageType::StmtExecuteOk => WireMessage::StmtExecuteOk,
    };
    reader.finish()?;
    Ok(message)
}

// ---------------------------------------------------------------------------
// Message payloads
// ---------------------------------------------------------------------------

fn read_stmt_execute(reader: &mut Reader<'_>) -> Result<StmtExecute, DecodeError> {
    let namespace = reader.str_field("namespace")?;
    let dialect_tag = reader.u8("dialect tag")?;
    let dialect = Dialect::from_tag(dialect_tag).ok_or(DecodeError::BadTag {
        context: "dialect tag",
        tag: dialect_tag,
    })?;
    let statement = reader.str_field("statement")?;
    let count = reader.len("argument count")?;
    let mut args = Vec::new();
    for _ in 0..count {
        args.push(read_argument(reader)?);
    }
    Ok(StmtExecute {
        namespace,
        dialect,
        statement,
        args,
    })
}

fn read_argument(reader: &mut Reader<'_>) -> Result<Argument, DecodeError> {
    let tag = reader.u8("argument tag")?;
    match tag {
        argument_tag::SCALAR => Ok(Argument::Scalar(read_scalar(reader)?)),
        argument_tag::EXPR => Ok(Argument::Expr(read_expr(reader, MAX_NESTING_DEPTH)?)),
        argument_tag::DOCUMENT => {
            let text = reader.str_field("document")?;
            Ok(Argument::Document(serde_json::from_str(&text)?))
        }
        other => Err(DecodeError::BadTag {
            context: "argument tag",
            tag: other,
        }),
    }
}

fn read_error(reader: &mut Reader<'_>) -> Result<ServerError, DecodeError> {
    let severity_tag = reader.u8("severity tag")?;
    let severity = Severity::from_tag(severity_tag).ok_or(DecodeError::BadTag {
        context: "severity tag",
        tag: severity_tag,
    })?;
    Ok(ServerError {
        severity,
        code: reader.u32("error code")?,
        sql_state: reader.str_field("sql state")?,
        message: reader.str_field("error message")?,
    })
}

fn read_notice(reader: &mut Reader<'_>) -> Result<Notice, DecodeError> {
    let scope_tag = reader.u8("notice scope tag")?;
    let scope = NoticeScope::from_tag(scope_tag).ok_or(DecodeError::BadTag {
        context: "notice scope tag",
        tag: scope_tag,
    })?;
    Ok(Notice {
        scope,
        kind: reader.u32("notice kind")?,
        payload: reader.bytes_field("notice payload")?,
    })
}

fn read_column_meta(reader: &mut Reader<'_>) -> Result<ColumnMeta, DecodeError> {
    let type_tag = reader.u8("field type tag")?;
    let field_type = FieldType::from_tag(type_tag).ok_or(DecodeError::BadTag {
        context: "field type tag",
        tag: type_tag,
    })?;
    Ok(ColumnMeta {
        field_type,
        name: reader.str_field("column name")?,
        table: reader.str_field("table name")?,
        schema: reader.str_field("schema name")?,
        length: reader.u32("column length")?,
        flags: reader.u32("column flags")?,
    })
}

fn read_row(reader: &mut Reader<'_>) -> Result<Row, DecodeError> {
    let count = reader.len("field count")?;
    let mut fields = Vec::new();
    for _ in 0..count {
        fields.push(reader.bytes_field("row field")?);
    }
    Ok(Row { fields })
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

fn read_capabilities(reader: &mut Reader<'_>, depth: usize) -> Result<Capabilities, DecodeError> {
    let count = reader.len("capability count")?;
    let mut capabilities = Capabilities::new();
    for _ in 0..count {
        let name = reader.str_field("capability name")?;
        let value = read_capability_value(reader, depth)?;
        capabilities.set(name, value);
    }
    Ok(capabilities)
}

fn read_capability_value(
    reader: &mut Reader<'_>,
    depth: usize,
) -> Result<CapabilityValue, DecodeError> {
    let tag = reader.u8("capability value tag")?;
    match tag {
        capability_tag::BOOL => Ok(CapabilityValue::Bool(read_bool(reader, "capability flag")?)),
        capability_tag::STRING => Ok(CapabilityValue::String(
            reader.str_field("capability value")?,
        )),
        capability_tag::OBJECT => {
            let Some(depth) = depth.checked_sub(1) else {
                return Err(DecodeError::NestingTooDeep {
                    context: "capability object",
                    limit: MAX_NESTING_DEPTH,
                });
            };
            Ok(CapabilityValue::Object(read_capabilities(reader, depth)?))
        }
        other => Err(DecodeError::BadTag {
            context: "capability value tag",
            tag: other,
        }),
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn read_expr(reader: &mut Reader<'_>, depth: usize) -> Result<Expr, DecodeError> {
    // Each node spends one level of the budget before any recursion, so a
    // frame that nests deeper than the limit fails here rather than on the
    // stack.
    let Some(depth) = depth.checked_sub(1) else {
        return Err(DecodeError::NestingTooDeep {
            context: "expression",
            limit: MAX_NESTING_DEPTH,
        });
    };
    let tag = reader.u8("expression tag")?;
    match tag {
        expr_tag::LITERAL => Ok(Expr::Literal(read_scalar(reader)?)),
        expr_tag::IDENTIFIER => {
            let path = read_path(reader)?;
            let name = reader.opt_str("column name")?;
            let table = reader.opt_str("table name")?;
            Ok(Expr::Identifier(Identifier { path, name, table }))
        }
        expr_tag::OPERATOR => {
            let (name, operands) = read_call(reader, depth)?;
            // Hostile or corrupt input may carry shapes the grammar could
            // never build; re-validate against the arity table.
            Ok(Expr::operator(name, operands)?)
        }
        expr_tag::FUNCTION_CALL => {
            let (name, args) = read_call(reader, depth)?;
            Ok(Expr::FunctionCall { name, args })
        }
        expr_tag::PLACEHOLDER => Ok(Expr::Placeholder(read_placeholder(reader)?)),
        other => Err(DecodeError::BadTag {
            context: "expression tag",
            tag: other,
        }),
    }
}

fn read_call(reader: &mut Reader<'_>, depth: usize) -> Result<(String, Vec<Expr>), DecodeError> {
    let name = reader.str_field("operator name")?;
    let count = reader.len("operand count")?;
    let mut operands = Vec::new();
    for _ in 0..count {
        operands.push(read_expr(reader, depth)?);
    }
    Ok((name, operands))
}

fn read_placeholder(reader: &mut Reader<'_>) -> Result<Placeholder, DecodeError> {
    let tag = reader.u8("placeholder tag")?;
    match tag {
        placeholder_tag::NAMED => Ok(Placeholder::Named(reader.str_field("placeholder name")?)),
        placeholder_tag::POSITION => Ok(Placeholder::Position(reader.u32("placeholder position")?)),
        other => Err(DecodeError::BadTag {
            context: "placeholder tag",
            tag: other,
        }),
    }
}

fn read_path(reader: &mut Reader<'_>) -> Result<DocumentPath, DecodeError> {
    let count = reader.len("path item count")?;
    let mut items = Vec::new();
    for _ in 0..count {
        let tag = reader.u8("path item tag")?;
        let item = match tag {
            path_tag::MEMBER => PathItem::Member(reader.str_field("path member")?),
            path_tag::MEMBER_ASTERISK => PathItem::MemberAsterisk,
            path_tag::ARRAY_INDEX => PathItem::ArrayIndex(reader.u32("array index")?),
            path_tag::ARRAY_INDEX_ASTERISK => PathItem::ArrayIndexAsterisk,
            path_tag::DOUBLE_ASTERISK => PathItem::DoubleAsterisk,
            other => {
                return Err(DecodeError::BadTag {
                    context: "path item tag",
                    tag: other,
                });
            }
        };
        items.push(item);
    }
    Ok(DocumentPath::from(items))
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

fn read_scalar(reader: &mut Reader<'_>) -> Result<Scalar, DecodeError> {
    let tag = reader.u8("scalar tag")?;
    let scalar = match tag {
        scalar_tag::NULL => Scalar::Null,
        scalar_tag::BOOL => Scalar::Bool(read_bool(reader, "bool scalar")?),
        scalar_tag::UINT8 => Scalar::UInt(u64::from(reader.u8("uint8 scalar")?)),
        scalar_tag::UINT16 => Scalar::UInt(u64::from(reader.u16("uint16 scalar")?)),
        scalar_tag::UINT32 => Scalar::UInt(u64::from(reader.u32("uint32 scalar")?)),
        scalar_tag::UINT64 => Scalar::UInt(reader.u64("uint64 scalar")?),
        scalar_tag::SINT8 => Scalar::Int(i64::from(reader.i8("sint8 scalar")?)),
        scalar_tag::SINT16 => Scalar::Int(i64::from(reader.i16("sint16 scalar")?)),
        scalar_tag::SINT32 => Scalar::Int(i64::from(reader.i32("sint32 scalar")?)),
        scalar_tag::SINT64 => Scalar::Int(reader.i64("sint64 scalar")?),
        scalar_tag::DOUBLE => Scalar::Double(reader.f64("double scalar")?),
        scalar_tag::STRING => Scalar::String(reader.str_field("string scalar")?),
        scalar_tag::BYTES => Scalar::Bytes(reader.bytes_field("bytes scalar")?),
        other => {
            return Err(DecodeError::BadTag {
                context: "scalar tag",
                tag: other,
            });
        }
    };
    Ok(scalar)
}

fn read_bool(reader: &mut Reader<'_>, context: &'static str) -> Result<bool, DecodeError> {
    match reader.u8(context)? {
        0 => Ok(false),
        1 => Ok(true),
        tag => Err(DecodeError::BadTag { context, tag }),
    }
}

// ---------------------------------------------------------------------------
// Payload reader
// ---------------------------------------------------------------------------

/// Bounds-checked reader over one frame's payload. Every read names the
/// field it serves, so a truncation error says what was being parsed.
#[derive(Debug)]
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.buf.len() < n {
            return Err(DecodeError::Truncated {
                context,
                needed: n - self.buf.len(),
            });
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N, context)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Ok(array)
    }

    fn u8(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        Ok(self.take(1, context)?[0])
    }

    fn u16(&mut self, context: &'static str) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.array(context)?))
    }

    fn u32(&mut self, context: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.array(context)?))
    }

    fn u64(&mut self, context: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.array(context)?))
    }

    fn i8(&mut self, context: &'static str) -> Result<i8, DecodeError> {
        Ok(i8::from_le_bytes(self.array(context)?))
    }

    fn i16(&mut self, context: &'static str) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.array(context)?))
    }

    fn i32(&mut self, context: &'static str) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.array(context)?))
    }

    fn i64(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.array(context)?))
    }

    fn f64(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.array(context)?))
    }

    fn len(&mut self, context: &'static str) -> Result<usize, DecodeError> {
        Ok(self.u32(context)? as usize)
    }

    fn str_field(&mut self, context: &'static str) -> Result<String, DecodeError> {
        let len = self.len(context)?;
        let bytes = self.take(len, context)?;
        let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::BadUtf8 { context })?;
        Ok(text.to_owned())
    }

    fn bytes_field(&mut self, context: &'static str) -> Result<Bytes, DecodeError> {
        let len = self.len(context)?;
        let bytes = self.take(len, context)?;
        Ok(Bytes::copy_from_slice(bytes))
    }

    /// Presence byte, then the string when present.
    fn opt_str(&mut self, context: &'static str) -> Result<Option<String>, DecodeError> {
        match self.u8(context)? {
            0 => Ok(None),
            1 => self.str_field(context).map(Some),
            tag => Err(DecodeError::BadTag { context, tag }),
        }
    }

    fn finish(self) -> Result<(), DecodeError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TrailingBytes {
                remaining: self.buf.len(),
            })
        }
    }
}
