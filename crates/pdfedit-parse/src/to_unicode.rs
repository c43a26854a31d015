//! ToUnicode CMap parsing.
//!
//! Reads the `bfchar` and `bfrange` sections of a `/ToUnicode` stream into
//! a code-to-text table. Destination strings are UTF-16BE hex; ranges may
//! map to a start code point or to an explicit array of strings.

use std::collections::HashMap;

use crate::error::BackendError;

/// Upper bound on a single `bfrange` span; anything larger is malformed.
const MAX_RANGE: u32 = 0xFFFF;

/// A parsed ToUnicode map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToUnicodeMap {
    mappings: HashMap<u32, String>,
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Hex(&'a str),
    ArrayStart,
    ArrayEnd,
    Word(&'a str),
}

impl ToUnicodeMap {
    pub fn parse(data: &[u8]) -> Result<Self, BackendError> {
        let text = String::from_utf8_lossy(data);
        let tokens = tokenize(&text);
        let mut mappings = HashMap::new();
        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                Token::Word("beginbfchar") => i = parse_bfchar(&tokens, i + 1, &mut mappings)?,
                Token::Word("beginbfrange") => i = parse_bfrange(&tokens, i + 1, &mut mappings)?,
                _ => i += 1,
            }
        }
        Ok(Self { mappings })
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'<' => {
                let start = pos + 1;
                let end = text[start..].find('>').map_or(bytes.len(), |e| start + e);
                tokens.push(Token::Hex(&text[start..end]));
                pos = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                pos += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                pos += 1;
            }
            b'%' => {
                pos = text[pos..].find('\n').map_or(bytes.len(), |e| pos + e + 1);
            }
            b if b.is_ascii_whitespace() => pos += 1,
            _ => {
                let start = pos;
                while pos < bytes.len()
                    && !bytes[pos].is_ascii_whitespace()
                    && !matches!(bytes[pos], b'<' | b'[' | b']' | b'%')
                {
                    pos += 1;
                }
                tokens.push(Token::Word(&text[start..pos]));
            }
        }
    }
    tokens
}

fn parse_bfchar(
    tokens: &[Token<'_>],
    mut i: usize,
    mappings: &mut HashMap<u32, String>,
) -> Result<usize, BackendError> {
    while i + 1 < tokens.len() {
        match (&tokens[i], &tokens[i + 1]) {
            (Token::Hex(src), Token::Hex(dst)) => {
                mappings.insert(parse_code(src)?, decode_utf16be(dst)?);
                i += 2;
            }
            _ => break,
        }
    }
    Ok(skip_to_end(tokens, i, "endbfchar"))
}

fn parse_bfrange(
    tokens: &[Token<'_>],
    mut i: usize,
    mappings: &mut HashMap<u32, String>,
) -> Result<usize, BackendError> {
    while i + 2 < tokens.len() {
        let (Token::Hex(lo), Token::Hex(hi)) = (&tokens[i], &tokens[i + 1]) else {
            break;
        };
        let lo = parse_code(lo)?;
        let hi = parse_code(hi)?;
        if hi < lo || hi - lo > MAX_RANGE {
            return Err(BackendError::Font(format!(
                "invalid bfrange {lo:#x}..{hi:#x}"
            )));
        }
        match &tokens[i + 2] {
            Token::Hex(dst) => {
                let start = decode_utf16be(dst)?;
                let mut units: Vec<char> = start.chars().collect();
                for code in lo..=hi {
                    mappings.insert(code, units.iter().collect());
                    // Ranges increment the last character of the destination.
                    if let Some(last) = units.last_mut() {
                        *last = char::from_u32(*last as u32 + 1).unwrap_or(*last);
                    }
                }
                i += 3;
            }
            Token::ArrayStart => {
                let mut j = i + 3;
                let mut code = lo;
                while let Some(Token::Hex(dst)) = tokens.get(j) {
                    if code <= hi {
                        mappings.insert(code, decode_utf16be(dst)?);
                    }
                    code += 1;
                    j += 1;
                }
                i = if matches!(tokens.get(j), Some(Token::ArrayEnd)) {
                    j + 1
                } else {
                    j
                };
            }
            _ => break,
        }
    }
    Ok(skip_to_end(tokens, i, "endbfrange"))
}

fn skip_to_end(tokens: &[Token<'_>], mut i: usize, keyword: &str) -> usize {
    while i < tokens.len() && tokens[i] != Token::Word(keyword) {
        i += 1;
    }
    i + 1
}

fn parse_code(hex: &str) -> Result<u32, BackendError> {
    u32::from_str_radix(hex.trim(), 16)
        .map_err(|e| BackendError::Font(format!("invalid code <{hex}>: {e}")))
}

fn decode_utf16be(hex: &str) -> Result<String, BackendError> {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    // Some producers write single-byte destinations like <41>.
    let digits = if digits.len() == 2 {
        format!("00{digits}")
    } else {
        digits
    };
    if digits.len() % 4 != 0 {
        return Err(BackendError::Font(format!(
            "UTF-16BE destination <{hex}> has odd length"
        )));
    }
    let units = (0..digits.len())
        .step_by(4)
        .map(|k| u16::from_str_radix(&digits[k..k + 4], 16))
        .collect::<Result<Vec<u16>, _>>()
        .map_err(|e| BackendError::Font(format!("invalid destination <{hex}>: {e}")))?;
    String::from_utf16(&units).map_err(|e| BackendError::Font(format!("invalid UTF-16: {e}")))
}
