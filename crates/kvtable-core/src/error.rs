use std::{fmt, panic::Location};
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable classification.
/// Every failure that aborts a table, index, or cursor operation surfaces as
/// one of these; callers are expected to discard the enclosing operation.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a key-origin encoding error.
    pub(crate) fn key_encoding(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Encoding, ErrorOrigin::Key, message)
    }

    /// Construct a key-origin format error (malformed external representation).
    pub(crate) fn key_format(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Format, ErrorOrigin::Key, message)
    }

    /// Construct a serialize-origin corruption error.
    pub(crate) fn serialize_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Serialize, message)
    }

    /// Construct a serialize-origin internal error.
    pub(crate) fn serialize_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Serialize, message)
    }

    /// Construct a host-origin corruption error.
    pub(crate) fn host_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Host, message)
    }

    /// Construct an index-origin misuse error.
    pub(crate) fn index_misuse(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Misuse, ErrorOrigin::Index, message)
    }

    /// Construct a cursor-origin misuse error.
    pub(crate) fn cursor_misuse(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Misuse, ErrorOrigin::Cursor, message)
    }

    /// Construct a table-origin configuration error.
    pub(crate) fn table_config(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Config, ErrorOrigin::Table, message)
    }

    /// Construct a secondary index conflict.
    ///
    /// `insert` distinguishes a fresh record colliding with a live secondary
    /// key from an update that would alias two records under one key.
    pub(crate) fn secondary_conflict(table: &str, index: &str, insert: bool) -> Self {
        let (kind, message) = if insert {
            (
                ConflictKind::DuplicateSecondary,
                format!("attempted to store an existing secondary index: {table}.{index}"),
            )
        } else {
            (
                ConflictKind::SecondaryUpdate,
                format!("attempted to update an existing secondary index: {table}.{index}"),
            )
        };

        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::Table,
            message,
            detail: Some(ErrorDetail::Conflict {
                kind,
                table: table.to_string(),
                index: index.to_string(),
            }),
        }
    }

    /// Construct a not-found error for a direct-access lookup.
    ///
    /// The message names the caller location so aborts point at the
    /// offending access site.
    pub(crate) fn index_not_found(index: &str, key_hex: &str, at: &Location<'_>) -> Self {
        Self {
            class: ErrorClass::NotFound,
            origin: ErrorOrigin::Index,
            message: format!(
                "{}:{} key not found in `{index}`: {key_hex}",
                at.file(),
                at.line()
            ),
            detail: Some(ErrorDetail::NotFound {
                index: index.to_string(),
                key: key_hex.to_string(),
            }),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{kind} on {table}.{index}")]
    Conflict {
        kind: ConflictKind,
        table: String,
        index: String,
    },

    #[error("key not found in {index}: {key}")]
    NotFound { index: String, key: String },
}

///
/// ConflictKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConflictKind {
    /// A new record collides with a live secondary key.
    DuplicateSecondary,

    /// An update would alias two records under one secondary key.
    SecondaryUpdate,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DuplicateSecondary => "duplicate_secondary",
            Self::SecondaryUpdate => "secondary_update",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorClass
/// Error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// A value has no order-preserving key encoding.
    Encoding,
    /// Malformed external representation (hex, names).
    Format,
    /// Secondary index collision or aliasing.
    Conflict,
    /// Direct-access lookup against a missing key.
    NotFound,
    /// Stored bytes do not decode under the expected envelope.
    Corruption,
    /// Cursor or index used outside its contract.
    Misuse,
    /// Table or index configuration rejected at setup.
    Config,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Encoding => "encoding",
            Self::Format => "format",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Corruption => "corruption",
            Self::Misuse => "misuse",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Key,
    Name,
    Serialize,
    Host,
    Index,
    Table,
    Cursor,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Key => "key",
            Self::Name => "name",
            Self::Serialize => "serialize",
            Self::Host => "host",
            Self::Index => "index",
            Self::Table => "table",
            Self::Cursor => "cursor",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
