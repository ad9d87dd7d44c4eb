use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use crate::ParserError;

/// Everything in the cache is big endian, so unlike other formats we don't parametrize over the byte order.
pub(crate) trait Parseable<T> {
    fn parse<R: Read>(rdr: &mut R) -> Result<T, ParserError>;
}

impl Parseable<u8> for u8 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u8, ParserError> {
        Ok(rdr.read_u8()?)
    }
}

impl Parseable<i8> for i8 {
    fn parse<R: Read>(rdr: &mut R) -> Result<i8, ParserError> {
        Ok(rdr.read_i8()?)
    }
}

impl Parseable<u16> for u16 {
    fn parse<R: Read>(rdr: &mut R) -> Result<u16, ParserError> {
        Ok(rdr.read_u16::<BigEndian>()?)
    }
}

impl Parseable<i16> for i16 {
    fn parse<R: Read>(rdr: &mut R) -> Result<i16, ParserError> {
        Ok(rdr.read_i16::<BigEndian>()?)
    }
}

impl Parseable<i32> for i32 {
    fn parse<R: Read>(rdr: &mut R) -> Result<i32, ParserError> {
        Ok(rdr.read_i32::<BigEndian>()?)
    }
}

/// u16 where 0xFFFF is the "none" sentinel.
pub(crate) fn read_optional_u16<R: Read>(rdr: &mut R) -> Result<i32, ParserError> {
    let value = rdr.read_u16::<BigEndian>()?;
    Ok(if value == u16::MAX { -1 } else { value as i32 })
}

pub(crate) fn read_u24<R: Read>(rdr: &mut R) -> Result<u32, ParserError> {
    Ok(rdr.read_u24::<BigEndian>()?)
}

/// One byte when the high bit is clear, otherwise two bytes with the high bit stripped.
pub(crate) fn read_unsigned_smart(rdr: &mut Cursor<&[u8]>) -> Result<u16, ParserError> {
    let peek = rdr
        .get_ref()
        .get(rdr.position() as usize)
        .copied()
        .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?;

    if peek < 128 {
        Ok(rdr.read_u8()? as u16)
    } else {
        Ok(rdr.read_u16::<BigEndian>()? - 0x8000)
    }
}

/// A sequence of smarts where every saturated value (32767) carries into the next one.
pub(crate) fn read_extended_smart(rdr: &mut Cursor<&[u8]>) -> Result<u32, ParserError> {
    let mut total = 0u32;
    let mut value = read_unsigned_smart(rdr)?;
    while value == i16::MAX as u16 {
        total += value as u32;
        value = read_unsigned_smart(rdr)?;
    }
    Ok(total + value as u32)
}

// Windows-1252 code points for 0x80..=0x9F, everything else maps 1:1 onto latin-1.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\0', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}', '\u{02C6}', '\u{2030}',
    '\u{0160}', '\u{2039}', '\u{0152}', '\0', '\u{017D}', '\0', '\0', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
    '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\0', '\u{017E}',
    '\u{0178}',
];

pub(crate) fn cp1252_char(byte: u8) -> char {
    if (0x80..0xA0).contains(&byte) {
        match CP1252_HIGH[(byte - 0x80) as usize] {
            '\0' => '?',
            c => c,
        }
    } else {
        byte as char
    }
}

/// NUL-terminated CP1252 string
pub(crate) fn read_string<R: Read>(rdr: &mut R) -> Result<String, ParserError> {
    let mut string = String::new();
    loop {
        let c = rdr.read_u8()?;
        if c == 0 {
            return Ok(string);
        }
        string.push(cp1252_char(c));
    }
}

pub(crate) fn read_array<T: Parseable<T>, R: Read>(rdr: &mut R, count: usize) -> Result<Vec<T>, ParserError> {
    let mut list = Vec::<T>::with_capacity(count);
    for _ in 0..count {
        list.push(T::parse(rdr)?);
    }
    Ok(list)
}
