use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Unknown opcode {opcode} while decoding {kind}")]
    UnknownOpcode { opcode: u16, kind: &'static str },

    #[error("The file is violating the expected format, because: {reason}")]
    FormatError { reason: &'static str },

    /// Represents an empty source, e.g. a record of zero bytes where at least a terminator is expected.
    #[error("Source contains no data")]
    EmptySource,

    /// Represents all other cases of `std::io::Error`, most commonly a truncated record.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

pub mod common;
pub mod definition;
pub mod map;
pub mod xtea;
