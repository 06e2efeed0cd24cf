//! Error types for encoding, decoding and table validation.

/// A symbol could not be encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The code table has no entry for the symbol at this input position.
    /// Only happens when the table was built from a different input.
    #[error("no code for symbol at position {position}")]
    MissingCode { position: usize },
}

/// A packed bitstream is inconsistent with the code table used to read it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Padding must be in `0..=7` and cannot exceed the stream.
    #[error("invalid padding {padding} for {len} bytes")]
    InvalidPadding { padding: u8, len: usize },

    /// The bits starting at `offset` are not a prefix of any code.
    #[error("no code matches at bit offset {offset}")]
    InvalidCode { offset: usize },

    /// The stream ended in the middle of a code.
    #[error("{bits} unmatched bits at end of stream")]
    TrailingBits { bits: usize },
}

/// A code table or tree that cannot describe a prefix code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorruptTableError {
    #[error("empty code")]
    EmptyCode,

    #[error("code assigned to more than one symbol")]
    DuplicateCode,

    #[error("symbol assigned more than one code")]
    DuplicateSymbol,

    /// A frequency table entry with a count of zero.
    #[error("zero count for symbol")]
    ZeroCount,

    #[error("code {prefix} is a prefix of {code}")]
    NotPrefixFree { prefix: String, code: String },

    /// Tree arena does not describe a single rooted binary tree.
    #[error("malformed tree: {0}")]
    MalformedTree(&'static str),
}

/// Umbrella error for whole-payload operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("corrupt code table: {0}")]
    CorruptTable(#[from] CorruptTableError),

    /// Container bytes could not be parsed.
    #[error("format error: {0}")]
    Format(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
