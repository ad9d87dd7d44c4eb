use crate::ParserError;

pub mod object;
pub mod overlay;
pub mod varbit;

#[cfg(test)]
mod tests;

/// A config record that can be decoded from the raw bytes of a single archive file.
/// All definition formats are opcode streams terminated by opcode 0.
pub trait Definition: Sized {
    /// Used in error messages only.
    const KIND: &'static str;

    fn decode(id: u32, data: &[u8]) -> Result<Self, ParserError>;
}
