//! Core images in a simple octal text format.
//!
//! Each line gives a starting address, optionally preceded by a
//! field number, then the words to be loaded there:
//!
//! ```text
//! / Print "A" and halt.
//! 0200: 7200 1207 6046 6041 5203 7402
//! 0.0207: 0301
//! ```
//!
//! Everything after a `/` is a comment, as in PAL assembly listings.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use base::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageErrorKind {
    MissingColon,
    BadAddress(String),
    BadWord(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageError {
    pub line: usize,
    pub kind: ImageErrorKind,
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            ImageErrorKind::MissingColon => f.write_str("expected ':' after the address"),
            ImageErrorKind::BadAddress(s) => write!(f, "'{s}' is not a valid octal address"),
            ImageErrorKind::BadWord(s) => write!(f, "'{s}' is not a valid 12-bit octal word"),
        }
    }
}

impl Error for ImageError {}

/// A run of consecutive words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub start: ExtendedAddress,
    pub words: Vec<Unsigned12Bit>,
}

fn parse_octal_word(s: &str) -> Option<Unsigned12Bit> {
    u16::from_str_radix(s, 8)
        .ok()
        .and_then(|n| Unsigned12Bit::try_from(n).ok())
}

/// Parse an address of the form `aaaa` or `f.aaaa` (octal).
pub fn parse_address(s: &str) -> Option<ExtendedAddress> {
    let (field, address) = match s.split_once('.') {
        Some((f, a)) => (
            u8::from_str_radix(f, 8)
                .ok()
                .and_then(|n| Unsigned3Bit::try_from(n).ok())?,
            a,
        ),
        None => (Unsigned3Bit::ZERO, s),
    };
    Some(ExtendedAddress::new(field, parse_octal_word(address)?))
}

pub fn parse_image(text: &str) -> Result<Vec<Block>, ImageError> {
    let mut blocks = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let fail = |kind| ImageError {
            line: line_number,
            kind,
        };
        let content = match line.split_once('/') {
            Some((before, _comment)) => before,
            None => line,
        }
        .trim();
        if content.is_empty() {
            continue;
        }
        let (address, rest) = content
            .split_once(':')
            .ok_or_else(|| fail(ImageErrorKind::MissingColon))?;
        let address = address.trim();
        let start = parse_address(address)
            .ok_or_else(|| fail(ImageErrorKind::BadAddress(address.to_string())))?;
        let words = rest
            .split_whitespace()
            .map(|w| parse_octal_word(w).ok_or_else(|| fail(ImageErrorKind::BadWord(w.to_string()))))
            .collect::<Result<Vec<_>, _>>()?;
        blocks.push(Block { start, words });
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image() {
        let text = "/ a comment\n\n0200: 7200 1207  / CLA; TAD\n1.0010: 7777\n";
        let blocks = parse_image(text).expect("image should be valid");
        assert_eq!(
            blocks,
            vec![
                Block {
                    start: ExtendedAddress::new(u3!(0), u12!(0o200)),
                    words: vec![u12!(0o7200), u12!(0o1207)],
                },
                Block {
                    start: ExtendedAddress::new(u3!(1), u12!(0o10)),
                    words: vec![u12!(0o7777)],
                },
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_image("0200 7200"),
            Err(ImageError {
                line: 1,
                kind: ImageErrorKind::MissingColon
            })
        );
        assert_eq!(
            parse_image("\n0200: 7200 10000"),
            Err(ImageError {
                line: 2,
                kind: ImageErrorKind::BadWord("10000".to_string())
            })
        );
        assert_eq!(
            parse_image("0208: 0").map_err(|e| e.kind),
            Err(ImageErrorKind::BadAddress("0208".to_string()))
        );
        assert_eq!(
            parse_image("10.0200: 0").map_err(|e| e.kind),
            Err(ImageErrorKind::BadAddress("10.0200".to_string()))
        );
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("7.7777"),
            Some(ExtendedAddress::new(u3!(7), u12!(0o7777)))
        );
        assert_eq!(parse_address("200"), Some(ExtendedAddress::new(u3!(0), u12!(0o200))));
        assert_eq!(parse_address(""), None);
        assert_eq!(parse_address("x"), None);
    }
}
