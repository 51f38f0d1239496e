//! FITS header cards.
//!
//! A header is a sequence of 80-character cards terminated by an `END` card and padded
//! to a 2880-byte block. Value cards have the layout
//!
//! ```text
//! KEYWORD = value                / comment
//! ^0      ^8^10
//! ```
//!
//! Values are parsed with `nom`: quoted strings (a doubled quote `''` is a literal quote,
//! trailing blanks are not significant), logicals `T`/`F`, integers and floats, the
//! latter possibly written with a Fortran `D` exponent.
use std::collections::HashMap;

use ahash::RandomState;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_till1},
    character::complete::{char, space0},
    multi::many0,
    IResult, Parser,
};

use super::FitsError;
use crate::constants::FITS_CARD;

/// Typed value of a header card.
#[derive(Debug, Clone, PartialEq)]
pub enum FitsValue {
    String(String),
    Integer(i64),
    Float(f64),
    Logical(bool),
    /// Keyword present with an empty value field
    Undefined,
}

impl FitsValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FitsValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FitsValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers are promoted; strings are not.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FitsValue::Float(f) => Some(*f),
            FitsValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Text rendering used for text features: strings verbatim, numbers formatted.
    pub fn to_text(&self) -> Option<String> {
        match self {
            FitsValue::String(s) => Some(s.clone()),
            FitsValue::Integer(i) => Some(i.to_string()),
            FitsValue::Float(f) => Some(f.to_string()),
            FitsValue::Logical(b) => Some(if *b { "T" } else { "F" }.to_string()),
            FitsValue::Undefined => None,
        }
    }
}

/// Keyword → value map of one HDU. Keywords are stored upper-case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitsHeader {
    cards: HashMap<String, FitsValue, RandomState>,
}

impl FitsHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keyword: &str, value: FitsValue) {
        self.cards.insert(keyword.to_ascii_uppercase(), value);
    }

    pub fn get(&self, keyword: &str) -> Option<&FitsValue> {
        self.cards.get(&keyword.to_ascii_uppercase())
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(FitsValue::as_str)
    }

    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(FitsValue::as_i64)
    }

    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(FitsValue::as_f64)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Result of parsing one card.
#[derive(Debug, PartialEq)]
pub(crate) enum Card {
    Value(String, FitsValue),
    /// COMMENT, HISTORY, blank keyword or any card without a value indicator
    Commentary,
    End,
}

fn escaped_quote(input: &str) -> IResult<&str, String> {
    let (input, _) = tag("''")(input)?;
    Ok((input, "'".to_string()))
}

fn unquoted_run(input: &str) -> IResult<&str, String> {
    let (input, run) = is_not("'")(input)?;
    Ok((input, run.to_string()))
}

fn quoted_string(input: &str) -> IResult<&str, FitsValue> {
    let (input, _) = char('\'')(input)?;
    let (input, parts) = many0(alt((escaped_quote, unquoted_run))).parse(input)?;
    let (input, _) = char('\'')(input)?;

    Ok((input, FitsValue::String(parts.concat().trim_end().to_string())))
}

fn bare_token(input: &str) -> IResult<&str, FitsValue> {
    let (rest, token) = take_till1(|c: char| c == ' ' || c == '/')(input)?;

    let value = match token {
        "T" => FitsValue::Logical(true),
        "F" => FitsValue::Logical(false),
        _ => {
            if let Ok(i) = token.parse::<i64>() {
                FitsValue::Integer(i)
            } else if let Ok(f) = token.replace(['D', 'd'], "E").parse::<f64>() {
                FitsValue::Float(f)
            } else {
                return Err(nom::Err::Error(nom::error::Error::new(
                    input,
                    nom::error::ErrorKind::Float,
                )));
            }
        }
    };

    Ok((rest, value))
}

/// Parse the value field of a card (columns 11–80), comment included.
pub(crate) fn parse_value(field: &str) -> IResult<&str, FitsValue> {
    let (input, _) = space0(field)?;
    if input.is_empty() || input.starts_with('/') {
        return Ok((input, FitsValue::Undefined));
    }
    alt((quoted_string, bare_token)).parse(input)
}

/// Parse one 80-byte card.
pub(crate) fn parse_card(raw: &[u8]) -> Result<Card, FitsError> {
    if raw.len() != FITS_CARD {
        return Err(FitsError::Truncated);
    }
    if !raw.is_ascii() {
        return Err(FitsError::NonAsciiCard);
    }
    let card = std::str::from_utf8(raw).map_err(|_| FitsError::NonAsciiCard)?;

    let keyword = card[..8].trim_end();
    if keyword == "END" {
        return Ok(Card::End);
    }
    if keyword.is_empty() || &card[8..10] != "= " {
        return Ok(Card::Commentary);
    }

    let (_, value) = parse_value(&card[10..])
        .map_err(|_| FitsError::InvalidCard(card.trim_end().to_string()))?;
    Ok(Card::Value(keyword.to_string(), value))
}
