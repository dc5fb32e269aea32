use super::literal::{decode_latin1, decode_literal};
use crate::error::DecodeError;
use flate2::read::ZlibDecoder;
use log::debug;
use regex::bytes::Regex;
use std::io::Read;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::LazyLock;

static STREAM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s-u)stream\r?\n(.*?)endstream").expect("valid regex"));

/// How a content stream's bytes were obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEncoding {
    /// The stream was zlib-compressed and inflated cleanly
    Inflated,
    /// The stream was used as-is; the inflate failure is kept for diagnostics
    Raw(DecodeError),
}

/// A content stream decoded to one character per byte.
#[derive(Debug, Clone)]
pub struct ContentStream {
    pub text: String,
    pub encoding: StreamEncoding,
}

/// Locate every `stream ... endstream` region in a PDF and decode it.
///
/// Regions that are not valid deflate data are kept as raw bytes; PDFs
/// freely mix compressed and uncompressed streams.
pub fn content_streams(document: &[u8]) -> Vec<ContentStream> {
    STREAM_PATTERN
        .captures_iter(document)
        .filter_map(|caps| caps.get(1))
        .enumerate()
        .map(|(index, region)| {
            let data = strip_leading_eol(region.as_bytes());
            match inflate(data) {
                Ok(inflated) => ContentStream {
                    text: decode_latin1(&inflated),
                    encoding: StreamEncoding::Inflated,
                },
                Err(err) => {
                    debug!("Stream {} read as raw bytes ({})", index, err);
                    ContentStream {
                        text: decode_latin1(data),
                        encoding: StreamEncoding::Raw(err),
                    }
                }
            }
        })
        .collect()
}

/// Extract every shown text fragment from a PDF, in emission order.
///
/// Never fails: a document with no readable streams yields no fragments.
pub fn extract_fragments(document: &[u8]) -> Vec<String> {
    let streams = content_streams(document);
    let fragments: Vec<String> = streams
        .iter()
        .flat_map(|stream| text_fragments(&stream.text))
        .collect();

    debug!(
        "Extracted {} text fragments from {} streams",
        fragments.len(),
        streams.len()
    );
    fragments
}

/// Extract the text shown by `Tj` and `TJ` operators in one content stream.
pub fn text_fragments(content: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut lexer = Lexer::new(content);
    let mut operand: Option<Operand> = None;

    while let Some(token) = lexer.next() {
        match token {
            Token::Literal(raw) => operand = Some(Operand::Literal(raw)),
            Token::ArrayOpen => operand = Some(Operand::Array(collect_array(&mut lexer))),
            Token::Word(op) => {
                let text = match (op.as_str(), operand.take()) {
                    ("Tj", Some(Operand::Literal(raw))) => decode_literal(&raw),
                    ("TJ", Some(Operand::Array(parts))) => {
                        parts.iter().map(|part| decode_literal(part)).collect()
                    }
                    _ => continue,
                };
                if !text.trim().is_empty() {
                    fragments.push(text);
                }
            }
            Token::ArrayClose | Token::Other => operand = None,
        }
    }

    fragments
}

fn strip_leading_eol(data: &[u8]) -> &[u8] {
    data.strip_prefix(b"\r\n")
        .or_else(|| data.strip_prefix(b"\n"))
        .or_else(|| data.strip_prefix(b"\r"))
        .unwrap_or(data)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::Inflate(e.to_string()))?;
    Ok(out)
}

fn collect_array(lexer: &mut Lexer<'_>) -> Vec<String> {
    let mut parts = Vec::new();
    for token in lexer.by_ref() {
        match token {
            Token::Literal(raw) => parts.push(raw),
            Token::ArrayClose => break,
            // Kerning offsets and anything else inside the array
            _ => {}
        }
    }
    parts
}

enum Operand {
    Literal(String),
    Array(Vec<String>),
}

#[derive(Debug, PartialEq)]
enum Token {
    /// Raw literal body, escapes still encoded
    Literal(String),
    ArrayOpen,
    ArrayClose,
    /// Operators and numbers
    Word(String),
    /// Names, hex strings, dictionaries
    Other,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            chars: content.chars().peekable(),
        }
    }

    fn read_literal(&mut self) -> String {
        let mut raw = String::new();
        let mut depth = 1usize;

        while let Some(ch) = self.chars.next() {
            match ch {
                '\\' => {
                    raw.push(ch);
                    if let Some(escaped) = self.chars.next() {
                        raw.push(escaped);
                    }
                }
                '(' => {
                    depth += 1;
                    raw.push(ch);
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    raw.push(ch);
                }
                _ => raw.push(ch),
            }
        }

        raw
    }

    fn read_regular(&mut self, first: Option<char>) -> String {
        let mut word = first.map(String::from).unwrap_or_default();
        while let Some(&ch) = self.chars.peek() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            word.push(ch);
            self.chars.next();
        }
        word
    }

    fn skip_until(&mut self, end: char) {
        for ch in self.chars.by_ref() {
            if ch == end {
                break;
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let ch = self.chars.next()?;
            if is_whitespace(ch) {
                continue;
            }

            return Some(match ch {
                '(' => Token::Literal(self.read_literal()),
                '[' => Token::ArrayOpen,
                ']' => Token::ArrayClose,
                '%' => {
                    self.skip_until('\n');
                    continue;
                }
                '<' => {
                    if self.chars.next_if_eq(&'<').is_none() {
                        self.skip_until('>');
                    }
                    Token::Other
                }
                '>' => {
                    let _ = self.chars.next_if_eq(&'>');
                    Token::Other
                }
                '/' => {
                    self.read_regular(None);
                    Token::Other
                }
                ')' | '{' | '}' => Token::Other,
                _ => Token::Word(self.read_regular(Some(ch))),
            });
        }
    }
}

fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n' | '\u{c}' | '\0')
}

fn is_delimiter(ch: char) -> bool {
    matches!(ch, '(' | ')' | '<' | '>' | '[' | ']' | '{' | '}' | '/' | '%')
}
