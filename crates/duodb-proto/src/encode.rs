//! Protocol encoder: serializes messages into length-prefixed frames.
//!
//! The payload is built in full before the prefix is emitted, so the 4-byte
//! little-endian length is always exact. Expression trees arrive already
//! validated ([`Expr::operator`](duodb_expr::ast::Expr::operator) enforces
//! arity at construction), so the encoder checks only wire-level constraints:
//! every length must fit its `u32` field and the whole frame must stay within
//! the configured maximum.

use bytes::{BufMut, Bytes, BytesMut};
use duodb_expr::ast::{Expr, Identifier, Placeholder, Scalar};
use duodb_expr::path::{DocumentPath, PathItem};
use tracing::{debug, trace};

use crate::capabilities::{Capabilities, CapabilityValue};
use crate::config::ProtocolConfig;
use crate::error::EncodeError;
use crate::frame::{
    LENGTH_PREFIX_SIZE, MAX_NESTING_DEPTH, TYPE_TAG_SIZE, argument_tag, capability_tag, expr_tag,
    path_tag, placeholder_tag, scalar_tag,
};
use crate::message::{Argument, StmtExecute, WireMessage};

/// Encodes [`WireMessage`]s into framed byte sequences.
///
/// The encoder is pure: it never touches a transport, and encoding the same
/// message twice produces identical bytes. It is cheap to construct and safe
/// to share across callers with independent messages.
#[derive(Debug, Clone)]
pub struct Encoder {
    config: ProtocolConfig,
}

impl Encoder {
    /// An encoder using the given configuration.
    #[must_use]
    pub fn new(config: ProtocolConfig) -> Self {
        Self { config }
    }

    /// Encode one message into a complete frame.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::FrameTooLarge`] if the frame would exceed the
    /// configured maximum, [`EncodeError::ValueTooLarge`] if a field does not
    /// fit its `u32` length, [`EncodeError::NestingTooDeep`] if an expression
    /// or capability object nests deeper than the decoder accepts, and
    /// [`EncodeError::Document`] if a document argument fails to serialize.
    pub fn encode(&self, message: &WireMessage) -> Result<Bytes, EncodeError> {
        debug!(message = ?message, "encoding message");

        let mut payload = BytesMut::new();
        write_payload(&mut payload, message)?;

        let length = payload.len() + TYPE_TAG_SIZE;
        let max = self.config.max_frame_size;
        let declared = u32::try_from(length)
            .ok()
            .filter(|declared| *declared <= max)
            .ok_or(EncodeError::FrameTooLarge { length, max })?;

        let tag = message.message_type().as_tag();
        let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + length);
        frame.put_u32_le(declared);
        frame.put_u8(tag);
        frame.extend_from_slice(&payload);

        trace!(tag, length = declared, "frame encoded");
        Ok(frame.freeze())
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}

fn write_payload(buf: &mut BytesMut, message: &WireMessage) -> Result<(), EncodeError> {
    match message {
        WireMessage::CapabilitiesGet
        | WireMessage::SessionOpen
        | WireMessage::SessionClose
        | WireMessage::ConnectionClose
        | WireMessage::FetchDone
        | WireMessage::StmtExecuteOk => {}
        WireMessage::CapabilitiesSet(capabilities) | WireMessage::Capabilities(capabilities) => {
            put_capabilities(buf, capabilities, MAX_NESTING_DEPTH)?;
        }
        WireMessage::StmtExecute(stmt) => put_stmt_execute(buf, stmt)?,
        WireMessage::Ok { message } => put_opt_str(buf, "ok message", message.as_deref())?,
        WireMessage::Error(error) => {
            buf.put_u8(error.severity.as_tag());
            buf.put_u32_le(error.code);
            put_str(buf, "sql state", &error.sql_state)?;
            put_str(buf, "error message", &error.message)?;
        }
        WireMessage::Notice(notice) => {
            buf.put_u8(notice.scope.as_tag());
            buf.put_u32_le(notice.kind);
            put_bytes(buf, "notice payload", &notice.payload)?;
        }
        WireMessage::ColumnMeta(meta) => {
            buf.put_u8(meta.field_type.as_tag());
            put_str(buf, "column name", &meta.name)?;
            put_str(buf, "table name", &meta.table)?;
            put_str(buf, "schema name", &meta.schema)?;
            buf.put_u32_le(meta.length);
            buf.put_u32_le(meta.flags);
        }
        WireMessage::Row(row) => {
            put_len(buf, "field count", row.fields.len())?;
            for field in &row.fields {
                put_bytes(buf, "row field", field)?;
            }
        }
    }
    Ok(())
}

fn put_stmt_execute(buf: &mut BytesMut, stmt: &StmtExecute) -> Result<(), EncodeError> {
    put_str(buf, "namespace", &stmt.namespace)?;
    buf.put_u8(stmt.dialect.as_tag());
    put_str(buf, "statement", &stmt.statement)?;
    put_len(buf, "argument count", stmt.args.len())?;
    for arg in &stmt.args {
        put_argument(buf, arg)?;
    }
    Ok(())
}

fn put_argument(buf: &mut BytesMut, arg: &Argument) -> Result<(), EncodeError> {
    match arg {
        Argument::Scalar(scalar) => {
            buf.put_u8(argument_tag::SCALAR);
            put_scalar(buf, scalar)?;
        }
        Argument::Expr(expr) => {
            buf.put_u8(argument_tag::EXPR);
            put_expr(buf, expr, MAX_NESTING_DEPTH)?;
        }
        Argument::Document(document) => {
            buf.put_u8(argument_tag::DOCUMENT);
            let text = serde_json::to_string(document)?;
            put_str(buf, "document", &text)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

fn put_capabilities(
    buf: &mut BytesMut,
    capabilities: &Capabilities,
    depth: usize,
) -> Result<(), EncodeError> {
    put_len(buf, "capability count", capabilities.len())?;
    for (name, value) in capabilities.iter() {
        put_str(buf, "capability name", name)?;
        put_capability_value(buf, value, depth)?;
    }
    Ok(())
}

fn put_capability_value(
    buf: &mut BytesMut,
    value: &CapabilityValue,
    depth: usize,
) -> Result<(), EncodeError> {
    match value {
        CapabilityValue::Bool(flag) => {
            buf.put_u8(capability_tag::BOOL);
            buf.put_u8(u8::from(*flag));
        }
        CapabilityValue::String(text) => {
            buf.put_u8(capability_tag::STRING);
            put_str(buf, "capability value", text)?;
        }
        CapabilityValue::Object(nested) => {
            let Some(depth) = depth.checked_sub(1) else {
                return Err(EncodeError::NestingTooDeep {
                    context: "capability object",
                    limit: MAX_NESTING_DEPTH,
                });
            };
            buf.put_u8(capability_tag::OBJECT);
            put_capabilities(buf, nested, depth)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

fn put_expr(buf: &mut BytesMut, expr: &Expr, depth: usize) -> Result<(), EncodeError> {
    // Same per-node budget as the decoder, so anything encoded is decodable.
    let Some(depth) = depth.checked_sub(1) else {
        return Err(EncodeError::NestingTooDeep {
            context: "expression",
            limit: MAX_NESTING_DEPTH,
        });
    };
    match expr {
        Expr::Literal(scalar) => {
            buf.put_u8(expr_tag::LITERAL);
            put_scalar(buf, scalar)?;
        }
        Expr::Identifier(identifier) => {
            buf.put_u8(expr_tag::IDENTIFIER);
            put_identifier(buf, identifier)?;
        }
        Expr::Operator { name, operands } => {
            buf.put_u8(expr_tag::OPERATOR);
            put_call(buf, name, operands, depth)?;
        }
        Expr::FunctionCall { name, args } => {
            buf.put_u8(expr_tag::FUNCTION_CALL);
            put_call(buf, name, args, depth)?;
        }
        Expr::Placeholder(placeholder) => {
            buf.put_u8(expr_tag::PLACEHOLDER);
            put_placeholder(buf, placeholder)?;
        }
    }
    Ok(())
}

/// Operators and function calls share one payload shape; the node tag is the
/// only distinction.
fn put_call(
    buf: &mut BytesMut,
    name: &str,
    operands: &[Expr],
    depth: usize,
) -> Result<(), EncodeError> {
    put_str(buf, "operator name", name)?;
    put_len(buf, "operand count", operands.len())?;
    for operand in operands {
        put_expr(buf, operand, depth)?;
    }
    Ok(())
}

fn put_identifier(buf: &mut BytesMut, identifier: &Identifier) -> Result<(), EncodeError> {
    put_path(buf, &identifier.path)?;
    put_opt_str(buf, "column name", identifier.name.as_deref())?;
    put_opt_str(buf, "table name", identifier.table.as_deref())?;
    Ok(())
}

fn put_placeholder(buf: &mut BytesMut, placeholder: &Placeholder) -> Result<(), EncodeError> {
    match placeholder {
        Placeholder::Named(name) => {
            buf.put_u8(placeholder_tag::NAMED);
            put_str(buf, "placeholder name", name)?;
        }
        Placeholder::Position(index) => {
            buf.put_u8(placeholder_tag::POSITION);
            buf.put_u32_le(*index);
        }
    }
    Ok(())
}

fn put_path(buf: &mut BytesMut, path: &DocumentPath) -> Result<(), EncodeError> {
    put_len(buf, "path item count", path.items.len())?;
    for item in &path.items {
        match item {
            PathItem::Member(name) => {
                buf.put_u8(path_tag::MEMBER);
                put_str(buf, "path member", name)?;
            }
            PathItem::MemberAsterisk => buf.put_u8(path_tag::MEMBER_ASTERISK),
            PathItem::ArrayIndex(index) => {
                buf.put_u8(path_tag::ARRAY_INDEX);
                buf.put_u32_le(*index);
            }
            PathItem::ArrayIndexAsterisk => buf.put_u8(path_tag::ARRAY_INDEX_ASTERISK),
            PathItem::DoubleAsterisk => buf.put_u8(path_tag::DOUBLE_ASTERISK),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Scalars and primitives
// ---------------------------------------------------------------------------

fn put_scalar(buf: &mut BytesMut, scalar: &Scalar) -> Result<(), EncodeError> {
    match scalar {
        Scalar::Null => buf.put_u8(scalar_tag::NULL),
        Scalar::Bool(flag) => {
            buf.put_u8(scalar_tag::BOOL);
            buf.put_u8(u8::from(*flag));
        }
        Scalar::UInt(value) => put_uint(buf, *value),
        Scalar::Int(value) => put_sint(buf, *value),
        Scalar::Double(value) => {
            buf.put_u8(scalar_tag::DOUBLE);
            buf.put_f64_le(*value);
        }
        Scalar::String(text) => {
            buf.put_u8(scalar_tag::STRING);
            put_str(buf, "string scalar", text)?;
        }
        Scalar::Bytes(data) => {
            buf.put_u8(scalar_tag::BYTES);
            put_bytes(buf, "bytes scalar", data)?;
        }
    }
    Ok(())
}

/// Narrowest unsigned form that losslessly holds `value`.
fn put_uint(buf: &mut BytesMut, value: u64) {
    if let Ok(v) = u8::try_from(value) {
        buf.put_u8(scalar_tag::UINT8);
        buf.put_u8(v);
    } else if let Ok(v) = u16::try_from(value) {
        buf.put_u8(scalar_tag::UINT16);
        buf.put_u16_le(v);
    } else if let Ok(v) = u32::try_from(value) {
        buf.put_u8(scalar_tag::UINT32);
        buf.put_u32_le(v);
    } else {
        buf.put_u8(scalar_tag::UINT64);
        buf.put_u64_le(value);
    }
}

/// Narrowest signed form that losslessly holds `value`.
fn put_sint(buf: &mut BytesMut, value: i64) {
    if let Ok(v) = i8::try_from(value) {
        buf.put_u8(scalar_tag::SINT8);
        buf.put_i8(v);
    } else if let Ok(v) = i16::try_from(value) {
        buf.put_u8(scalar_tag::SINT16);
        buf.put_i16_le(v);
    } else if let Ok(v) = i32::try_from(value) {
        buf.put_u8(scalar_tag::SINT32);
        buf.put_i32_le(v);
    } else {
        buf.put_u8(scalar_tag::SINT64);
        buf.put_i64_le(value);
    }
}

/// Write a `u32` length field, rejecting values that do not fit.
fn put_len(buf: &mut BytesMut, context: &'static str, len: usize) -> Result<(), EncodeError> {
    let len = u32::try_from(len).map_err(|_| EncodeError::ValueTooLarge {
        context,
        length: len,
    })?;
    buf.put_u32_le(len);
    Ok(())
}

fn put_str(buf: &mut BytesMut, context: &'static str, text: &str) -> Result<(), EncodeError> {
    put_len(buf, context, text.len())?;
    buf.put_slice(text.as_bytes());
    Ok(())
}

fn put_bytes(buf: &mut BytesMut, context: &'static str, data: &[u8]) -> Result<(), EncodeError> {
    put_len(buf, context, data.len())?;
    buf.put_slice(data);
    Ok(())
}

/// Presence byte, then the string when present.
fn put_opt_str(
    buf: &mut BytesMut,
    context: &'static str,
    value: Option<&str>,
) -> Result<(), EncodeError> {
    match value {
        Some(text) => {
            buf.put_u8(1);
            put_str(buf, context, text)?;
        }
        None => buf.put_u8(0),
    }
    Ok(())
}
