//! Error handling types.
//!
//! The serde docs suggest a data format should expose one shared error type.
//! So... we do. And also a result type.

use std::{fmt, io};

use serde::{de, ser};

pub type Result<T> = std::result::Result<T, Error>;

/// A location within the deserializer's input.
///
/// Both the line and column are 1-based. Columns count bytes, not characters,
/// since that's also what the length prefixes of the format count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// The position of the very first byte of an input.
    pub const START: Self = Self { line: 1, column: 1 };
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Potential errors to encounter when serializing or deserializing data.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Another reason provided by the object implementation.
    #[error("{0}")]
    Custom(String),
    /// Another reason provided by the object implementation, with the position
    /// of the deserializer at the time.
    #[error("{message} at {position}")]
    Located { message: String, position: Position },
    /// The error originated from the [`io::Write`] or [`io::Read`]
    /// implementation.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The input ended in the middle of a value.
    #[error("unexpected end of input at {position}")]
    Eof { position: Position },
    /// A token did not match what the grammar expects at this point.
    #[error("expected {expected} at {position}, got `{found}`")]
    Parse {
        expected: &'static str,
        found: String,
        position: Position,
    },
    /// A well-formed token violated a content invariant of the format.
    #[error("{kind} at {position}")]
    Format {
        kind: FormatError,
        position: Position,
    },
    /// An array key has a type the target cannot accept.
    ///
    /// Structs only accept string keys.
    #[error("expected {expected} key at {position}, got {found} key")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        position: Position,
    },
    /// The input holds a value of a type this crate does not handle, such as
    /// booleans, null, or objects.
    #[error("unsupported type tag `{tag}` at {position}")]
    UnsupportedTag { tag: char, position: Position },
    /// Tried to deserialize a [`str`] value but it contained invalid UTF-8.
    #[error("invalid utf-8 in data for string at {position}")]
    InvalidUtf8 { position: Position },
    /// Arrays were nested deeper than the deserializer allows.
    #[error("recursion limit exceeded at {position}")]
    RecursionLimitExceeded { position: Position },
    /// Past the expected end of the deserialized value were trailing bytes.
    #[error("trailing bytes past the end of the deserialized value at {position}")]
    TrailingBytes { position: Position },

    /// A value that has no representation in the format was serialized.
    #[error("{0} values cannot be serialized")]
    UnsupportedType(&'static str),
    /// A map key other than an integer or string was serialized.
    #[error("map keys must be integers or strings")]
    KeyMustBeIntOrString,
    /// A sequence or map tried to serialize itself without a length.
    #[error("sequences and maps must specify a length")]
    LengthRequired,
    /// A struct, sequence, or map serialized a different amount of entries
    /// than it specified.
    #[error("length for struct, sequence, or map was incorrect, expected {expected}, got {actual}")]
    LengthIncorrect { expected: usize, actual: usize },
    /// Serialized output was requested as a [`String`], but a serialized
    /// string contained invalid UTF-8.
    ///
    /// Serialize to a [`Vec<u8>`] instead to keep such strings intact.
    #[error("serialized output is not valid utf-8")]
    InvalidUtf8Output,
}

/// Ways the content of a well-formed token can be invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum FormatError {
    /// The string payload wasn't surrounded by quote characters.
    #[error("string payload is not enclosed in quotes")]
    UnquotedString,
    /// The array was closed before all entries its length prefix declares.
    #[error("array declared {declared} entries but closed after {found}")]
    MissingEntries { declared: usize, found: usize },
    /// The array held more entries than its length prefix declares.
    #[error("array declared {declared} entries but holds more")]
    ExtraEntries { declared: usize },
    /// The [`de::Deserialize`] implementation stopped reading before all
    /// entries declared by the length prefix were consumed.
    #[error("{remaining} array entries were left unread")]
    UnreadEntries { remaining: usize },
}

impl Error {
    /// Gets the input position the error occurred at, if it is known.
    ///
    /// This is [`None`] for serialization and I/O errors.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Located { position, .. }
            | Self::Eof { position }
            | Self::Parse { position, .. }
            | Self::Format { position, .. }
            | Self::TypeMismatch { position, .. }
            | Self::UnsupportedTag { position, .. }
            | Self::InvalidUtf8 { position }
            | Self::RecursionLimitExceeded { position }
            | Self::TrailingBytes { position } => Some(*position),
            _ => None,
        }
    }
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::Custom(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::Custom(msg.to_string())
    }
}
