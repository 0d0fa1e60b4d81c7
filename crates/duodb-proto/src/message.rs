//! Message schema: every client and server message the protocol defines.
//!
//! [`WireMessage`] is the single enum both the encoder and decoder dispatch
//! on, so adding a message kind forces a compile-time-checked update to both
//! sides of the codec.

use std::fmt;

use bytes::Bytes;
use duodb_expr::ast::{Expr, Scalar};

use crate::capabilities::Capabilities;

// ---------------------------------------------------------------------------
// Message type tags
// ---------------------------------------------------------------------------

/// Message type tag carried in every frame, one byte after the length
/// prefix. Client messages use the low tag range, server messages start at
/// 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Client request for the server's capability set.
    CapabilitiesGet,
    /// Client request to change capabilities.
    CapabilitiesSet,
    /// Client request to open a session.
    SessionOpen,
    /// Client request to close the current session.
    SessionClose,
    /// Client notice that the connection is going away.
    ConnectionClose,
    /// Client statement execution request.
    StmtExecute,
    /// Generic server acknowledgement.
    Ok,
    /// Server error report.
    Error,
    /// Server capability listing.
    Capabilities,
    /// Out-of-band server notice.
    Notice,
    /// Result-set column metadata.
    ColumnMeta,
    /// One result-set row.
    Row,
    /// End of a result set.
    FetchDone,
    /// Statement finished successfully.
    StmtExecuteOk,
}

impl MessageType {
    /// The wire tag byte for this message type.
    #[must_use]
    pub fn as_tag(self) -> u8 {
        match self {
            Self::CapabilitiesGet => 1,
            Self::CapabilitiesSet => 2,
            Self::SessionOpen => 3,
            Self::SessionClose => 4,
            Self::ConnectionClose => 5,
            Self::StmtExecute => 6,
            Self::Ok => 16,
            Self::Error => 17,
            Self::Capabilities => 18,
            Self::Notice => 19,
            Self::ColumnMeta => 20,
            Self::Row => 21,
            Self::FetchDone => 22,
            Self::StmtExecuteOk => 23,
        }
    }

    /// The message type for a wire tag byte, or `None` if the tag is not
    /// defined.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::CapabilitiesGet),
            2 => Some(Self::CapabilitiesSet),
            3 => Some(Self::SessionOpen),
            4 => Some(Self::SessionClose),
            5 => Some(Self::ConnectionClose),
            6 => Some(Self::StmtExecute),
            16 => Some(Self::Ok),
            17 => Some(Self::Error),
            18 => Some(Self::Capabilities),
            19 => Some(Self::Notice),
            20 => Some(Self::ColumnMeta),
            21 => Some(Self::Row),
            22 => Some(Self::FetchDone),
            23 => Some(Self::StmtExecuteOk),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A complete protocol message, client or server.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMessage {
    /// Ask the server for its capability set. Empty payload.
    CapabilitiesGet,
    /// Request capability changes before the session opens.
    CapabilitiesSet(Capabilities),
    /// Open a session on the connection. Empty payload.
    SessionOpen,
    /// Close the current session, keeping the connection. Empty payload.
    SessionClose,
    /// Close the connection. Empty payload.
    ConnectionClose,
    /// Execute a statement.
    StmtExecute(StmtExecute),
    /// Generic acknowledgement with an optional human-readable note.
    Ok {
        /// Optional note from the server.
        message: Option<String>,
    },
    /// Error report; `Fatal` severity means the connection is unusable.
    Error(ServerError),
    /// The server's capability listing.
    Capabilities(Capabilities),
    /// Out-of-band notice, global or scoped to the current session.
    Notice(Notice),
    /// Metadata for one result-set column, sent before the rows.
    ColumnMeta(ColumnMeta),
    /// One result-set row.
    Row(Row),
    /// End of the current result set. Empty payload.
    FetchDone,
    /// The statement finished successfully. Empty payload.
    StmtExecuteOk,
}

impl WireMessage {
    /// The message type tag this message encodes with.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::CapabilitiesGet => MessageType::CapabilitiesGet,
            Self::CapabilitiesSet(_) => MessageType::CapabilitiesSet,
            Self::SessionOpen => MessageType::SessionOpen,
            Self::SessionClose => MessageType::SessionClose,
            Self::ConnectionClose => MessageType::ConnectionClose,
            Self::StmtExecute(_) => MessageType::StmtExecute,
            Self::Ok { .. } => MessageType::Ok,
            Self::Error(_) => MessageType::Error,
            Self::Capabilities(_) => MessageType::Capabilities,
            Self::Notice(_) => MessageType::Notice,
            Self::ColumnMeta(_) => MessageType::ColumnMeta,
            Self::Row(_) => MessageType::Row,
            Self::FetchDone => MessageType::FetchDone,
            Self::StmtExecuteOk => MessageType::StmtExecuteOk,
        }
    }
}

/// A statement execution request.
#[derive(Debug, Clone, PartialEq)]
pub struct StmtExecute {
    /// Namespace the statement addresses, e.g. a schema or collection
    /// grouping; empty means the server default.
    pub namespace: String,
    /// Dialect the statement text is written in.
    pub dialect: Dialect,
    /// The statement text.
    pub statement: String,
    /// Ordered statement arguments.
    pub args: Vec<Argument>,
}

impl StmtExecute {
    /// A plain SQL statement with no arguments.
    #[must_use]
    pub fn sql(statement: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            dialect: Dialect::Sql,
            statement: statement.into(),
            args: Vec::new(),
        }
    }

    /// A document-dialect statement against `namespace` with no arguments.
    #[must_use]
    pub fn document(namespace: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            dialect: Dialect::Document,
            statement: statement.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn with_arg(mut self, arg: Argument) -> Self {
        self.args.push(arg);
        self
    }
}

/// One statement argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A plain scalar value.
    Scalar(Scalar),
    /// A compiled expression tree, e.g. a filter bound to a placeholder.
    Expr(Expr),
    /// A JSON document, serialized as text on the wire.
    Document(serde_json::Value),
}

/// A server error report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Whether the connection survives this error.
    pub severity: Severity,
    /// Numeric server error code.
    pub code: u32,
    /// Five-character SQLSTATE classification.
    pub sql_state: String,
    /// Human-readable description.
    pub message: String,
}

/// An out-of-band server notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Whether the notice concerns the connection or the current session.
    pub scope: NoticeScope,
    /// Numeric notice kind, e.g. a warning or a session state change.
    pub kind: u32,
    /// Kind-specific payload, opaque at this layer.
    pub payload: Bytes,
}

/// Metadata for one result-set column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Column value type.
    pub field_type: FieldType,
    /// Column name.
    pub name: String,
    /// Table the column belongs to; empty for computed columns.
    pub table: String,
    /// Schema the table belongs to; empty for computed columns.
    pub schema: String,
    /// Display length hint.
    pub length: u32,
    /// Type-specific flag bits.
    pub flags: u32,
}

/// One result-set row. Per-column payloads are opaque at this layer; typed
/// decoding belongs to the result layer above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Per-column payloads, in column order.
    pub fields: Vec<Bytes>,
}

// ---------------------------------------------------------------------------
// Small payload enums
// ---------------------------------------------------------------------------

/// Dialect a statement is written in, selecting the server execution path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Plain SQL text.
    Sql,
    /// Document CRUD statement.
    Document,
}

impl Dialect {
    /// The wire tag byte.
    #[must_use]
    pub fn as_tag(self) -> u8 {
        match self {
            Self::Sql => 0,
            Self::Document => 1,
        }
    }

    /// The dialect for a wire tag byte.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Sql),
            1 => Some(Self::Document),
            _ => None,
        }
    }

    /// Lowercase name for diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the connection survives a server error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The statement failed; the connection is still usable.
    Error,
    /// The connection is unusable and should be closed.
    Fatal,
}

impl Severity {
    /// The wire tag byte.
    #[must_use]
    pub fn as_tag(self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Fatal => 1,
        }
    }

    /// The severity for a wire tag byte.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Error),
            1 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Lowercase name for diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a notice applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeScope {
    /// The whole connection.
    Global,
    /// The current session only.
    Local,
}

impl NoticeScope {
    /// The wire tag byte.
    #[must_use]
    pub fn as_tag(self) -> u8 {
        match self {
            Self::Global => 1,
            Self::Local => 2,
        }
    }

    /// The scope for a wire tag byte.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Global),
            2 => Some(Self::Local),
            _ => None,
        }
    }
}

/// Result-set column value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Signed integer.
    Sint,
    /// Unsigned integer.
    Uint,
    /// IEEE-754 double.
    Double,
    /// Raw bytes, also used for text columns.
    Bytes,
    /// Time of day.
    Time,
    /// Date and time.
    Datetime,
    /// SET column.
    Set,
    /// ENUM column.
    Enum,
    /// BIT column.
    Bit,
    /// Exact decimal.
    Decimal,
}

impl FieldType {
    /// The wire tag byte.
    #[must_use]
    pub fn as_tag(self) -> u8 {
        match self {
            Self::Sint => 1,
            Self::Uint => 2,
            Self::Double => 3,
            Self::Bytes => 4,
            Self::Time => 5,
            Self::Datetime => 6,
            Self::Set => 7,
            Self::Enum => 8,
            Self::Bit => 9,
            Self::Decimal => 10,
        }
    }

    /// The field type for a wire tag byte.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Sint),
            2 => Some(Self::Uint),
            3 => Some(Self::Double),
            4 => Some(Self::Bytes),
            5 => Some(Self::Time),
            6 => Some(Self::Datetime),
            7 => Some(Self::Set),
            8 => Some(Self::Enum),
            9 => Some(Self::Bit),
            10 => Some(Self::Decimal),
            _ => None,
        }
    }
}
