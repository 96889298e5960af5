//! PDF object syntax parser
//!
//! Reads the textual form produced by the serializer (and by other PDF
//! writers) back into objects: direct objects, `N G R` references and
//! `N G obj ... endobj` bodies with optional stream data.

use log::{debug, trace, warn};

use crate::config::ObjectLimits;
use crate::error::{PdfError, PdfResult};
use super::document::DocRef;
use super::name::{KnownName, Name};
use super::object::Obj;

const STREAM_MARKER: &[u8] = b"stream";
const ENDSTREAM_MARKER: &[u8] = b"endstream";

pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

pub(crate) fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

pub(crate) fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Real(f32),
    Name(Vec<u8>),
    String(Vec<u8>, bool),
    ArrayOpen,
    ArrayClose,
    DictOpen,
    DictClose,
    Keyword(Vec<u8>),
    Eof,
}

/// An `N G obj ... endobj` body.
#[derive(Debug)]
pub struct IndirectObject {
    pub num: i32,
    pub gen: i32,
    pub obj: Obj,
    /// Raw bytes between `stream` and `endstream`, if present.
    pub stream: Option<Vec<u8>>,
}

/// Parser over an in-memory buffer.
pub struct Parser<'a> {
    data: &'a [u8],
    pos: usize,
    doc: Option<DocRef>,
    limits: ObjectLimits,
}

impl<'a> Parser<'a> {
    /// Parser over `data`, with no document and default limits.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            doc: None,
            limits: ObjectLimits::default(),
        }
    }

    /// Bind created containers and references to `doc`.
    pub fn with_document(mut self, doc: DocRef) -> Self {
        self.doc = Some(doc);
        self
    }

    /// Override the nesting limits.
    pub fn with_limits(mut self, limits: ObjectLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether only whitespace and comments remain.
    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.data.len()
    }

    /// Parse one direct object or reference.
    pub fn parse_object(&mut self) -> PdfResult<Obj> {
        trace!("Parsing object at offset {}", self.pos);
        let start = self.pos;
        let token = self.next_token()?;
        self.object_from_token(token, start, 0)
    }

    /// Parse an `N G obj ... endobj` body.
    pub fn parse_indirect_object(&mut self) -> PdfResult<IndirectObject> {
        let start = self.pos;
        let num = match self.next_token()? {
            Token::Int(n) => self.object_number(n, start)?,
            _ => return Err(PdfError::syntax(start, "expected object number")),
        };
        let gen = match self.next_token()? {
            Token::Int(g) => i32::try_from(g)
                .map_err(|_| PdfError::syntax(start, "generation out of range"))?,
            _ => return Err(PdfError::syntax(self.pos, "expected generation number")),
        };
        self.expect_keyword(b"obj")?;
        debug!("Parsing object {} {}", num, gen);

        let obj = self.parse_object()?;
        let mut stream = None;

        let mark = self.pos;
        match self.next_token()? {
            Token::Keyword(k) if k == b"endobj" => {}
            Token::Keyword(k) if k == STREAM_MARKER => {
                stream = Some(self.read_stream_data(&obj)?);
                self.expect_keyword(b"endobj")?;
            }
            Token::Eof => {
                warn!("Object {} {} is missing endobj", num, gen);
            }
            _ => return Err(PdfError::syntax(mark, "expected endobj")),
        }

        Ok(IndirectObject {
            num,
            gen,
            obj,
            stream,
        })
    }

    fn object_number(&self, n: i64, at: usize) -> PdfResult<i32> {
        i32::try_from(n)
            .ok()
            .filter(|n| (0..=super::object::MAX_OBJECT_NUMBER).contains(n))
            .ok_or_else(|| {
                if n < 0 {
                    PdfError::syntax(at, "negative object number")
                } else {
                    PdfError::ObjectNumberOutOfRange(n)
                }
            })
    }

    fn expect_keyword(&mut self, word: &[u8]) -> PdfResult<()> {
        let at = self.pos;
        match self.next_token()? {
            Token::Keyword(k) if k == word => Ok(()),
            _ => Err(PdfError::syntax(
                at,
                format!("expected '{}'", String::from_utf8_lossy(word)),
            )),
        }
    }

    fn read_stream_data(&mut self, dict: &Obj) -> PdfResult<Vec<u8>> {
        // The keyword is followed by CRLF or LF.
        if self.data[self.pos..].starts_with(b"\r\n") {
            self.pos += 2;
        } else if self.data.get(self.pos) == Some(&b'\n') {
            self.pos += 1;
        }
        let start = self.pos;

        let declared = dict.dict_get(KnownName::Length).unwrap_or_default();
        if declared.is_int() && !declared.is_indirect() {
            let len = usize::try_from(declared.to_int64()).unwrap_or(usize::MAX);
            if let Some(end) = start.checked_add(len).filter(|&end| end <= self.data.len()) {
                let mut probe = Parser::new(&self.data[end..]);
                if let Ok(Token::Keyword(k)) = probe.next_token() {
                    if k == ENDSTREAM_MARKER {
                        self.pos = end + probe.pos;
                        return Ok(self.data[start..end].to_vec());
                    }
                }
            }
            warn!("Stream /Length {} does not reach endstream, scanning", len);
        }

        let found = self.data[start..]
            .windows(ENDSTREAM_MARKER.len())
            .position(|w| w == ENDSTREAM_MARKER)
            .ok_or_else(|| PdfError::syntax(start, "unterminated stream"))?;
        let mut end = start + found;
        if end > start && self.data[end - 1] == b'\n' {
            end -= 1;
        }
        if end > start && self.data[end - 1] == b'\r' {
            end -= 1;
        }
        self.pos = start + found + ENDSTREAM_MARKER.len();
        Ok(self.data[start..end].to_vec())
    }

    fn object_from_token(&mut self, token: Token, at: usize, depth: usize) -> PdfResult<Obj> {
        if depth > self.limits.max_depth {
            warn!("Parser nesting exceeded {}", self.limits.max_depth);
            return Err(PdfError::RecursionLimit(self.limits.max_depth));
        }
        match token {
            Token::Int(n) => self.int_or_reference(n),
            Token::Real(f) => Ok(Obj::new_real(f)),
            Token::Name(bytes) => Ok(Obj::new_name_bytes(&bytes)),
            Token::String(bytes, true) => Ok(Obj::new_hex_string(&bytes)),
            Token::String(bytes, false) => Ok(Obj::new_string(&bytes)),
            Token::ArrayOpen => self.parse_array(depth),
            Token::DictOpen => self.parse_dict(depth),
            Token::Keyword(k) => match k.as_slice() {
                b"true" => Ok(Obj::bool(true)),
                b"false" => Ok(Obj::bool(false)),
                b"null" => Ok(Obj::null()),
                other => Err(PdfError::syntax(
                    at,
                    format!("unexpected keyword '{}'", String::from_utf8_lossy(other)),
                )),
            },
            Token::ArrayClose | Token::DictClose => {
                Err(PdfError::syntax(at, "unexpected closing delimiter"))
            }
            Token::Eof => Err(PdfError::syntax(at, "unexpected end of input")),
        }
    }

    /// `N` alone is an integer; `N G R` is a reference.
    fn int_or_reference(&mut self, n: i64) -> PdfResult<Obj> {
        let rewind = self.pos;
        if n >= 0 {
            if let Ok(Token::Int(gen)) = self.next_token() {
                let at = self.pos;
                if let Ok(Token::Keyword(k)) = self.next_token() {
                    if k == b"R" {
                        let num = self.object_number(n, at)?;
                        let gen = i32::try_from(gen)
                            .map_err(|_| PdfError::syntax(at, "generation out of range"))?;
                        return Obj::new_indirect(self.doc.as_ref(), num, gen);
                    }
                }
            }
        }
        self.pos = rewind;
        Ok(Obj::new_int(n))
    }

    fn parse_array(&mut self, depth: usize) -> PdfResult<Obj> {
        let arr = Obj::new_array(self.doc.as_ref(), 4);
        loop {
            let at = self.pos;
            match self.next_token()? {
                Token::ArrayClose => break,
                Token::Eof => return Err(PdfError::syntax(at, "unterminated array")),
                token => {
                    let item = self.object_from_token(token, at, depth + 1)?;
                    arr.array_push_drop(item)?;
                }
            }
        }
        arr.clean();
        Ok(arr)
    }

    fn parse_dict(&mut self, depth: usize) -> PdfResult<Obj> {
        let dict = Obj::new_dict(self.doc.as_ref(), 4);
        loop {
            let at = self.pos;
            let key = match self.next_token()? {
                Token::DictClose => break,
                Token::Name(key) => Name::from_bytes(&key),
                Token::Eof => return Err(PdfError::syntax(at, "unterminated dictionary")),
                _ => return Err(PdfError::syntax(at, "dictionary key is not a name")),
            };
            let at = self.pos;
            let value = match self.next_token()? {
                // A key with no value before the end reads as null.
                Token::DictClose => {
                    dict.dict_put_drop(&key, Obj::null())?;
                    break;
                }
                token => self.object_from_token(token, at, depth + 1)?,
            };
            dict.dict_put_drop(&key, value)?;
        }
        dict.clean();
        Ok(dict)
    }

    // ---- lexer -----------------------------------------------------------

    fn skip_whitespace(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while let Some(&c) = self.data.get(self.pos) {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> PdfResult<Token> {
        self.skip_whitespace();
        let Some(&b) = self.data.get(self.pos) else {
            return Ok(Token::Eof);
        };
        match b {
            b'[' => {
                self.pos += 1;
                Ok(Token::ArrayOpen)
            }
            b']' => {
                self.pos += 1;
                Ok(Token::ArrayClose)
            }
            b'<' if self.data.get(self.pos + 1) == Some(&b'<') => {
                self.pos += 2;
                Ok(Token::DictOpen)
            }
            b'>' if self.data.get(self.pos + 1) == Some(&b'>') => {
                self.pos += 2;
                Ok(Token::DictClose)
            }
            b'<' => self.lex_hex_string(),
            b'(' => self.lex_literal_string(),
            b'/' => self.lex_name(),
            b')' | b'>' | b'{' | b'}' => Err(PdfError::syntax(self.pos, "unexpected delimiter")),
            _ => self.lex_regular(),
        }
    }

    fn lex_regular(&mut self) -> PdfResult<Token> {
        let start = self.pos;
        while self.data.get(self.pos).map_or(false, |&b| is_regular(b)) {
            self.pos += 1;
        }
        let word = &self.data[start..self.pos];
        if let Some(number) = parse_number(word) {
            return Ok(number);
        }
        Ok(Token::Keyword(word.to_vec()))
    }

    fn lex_name(&mut self) -> PdfResult<Token> {
        self.pos += 1;
        let mut bytes = Vec::new();
        while let Some(&b) = self.data.get(self.pos) {
            if !is_regular(b) {
                break;
            }
            if b == b'#' {
                let hex = self.data.get(self.pos + 1..self.pos + 3);
                if let Some(decoded) = hex.and_then(|h| hex::decode(h).ok()) {
                    bytes.extend_from_slice(&decoded);
                    self.pos += 3;
                    continue;
                }
            }
            bytes.push(b);
            self.pos += 1;
        }
        Ok(Token::Name(bytes))
    }

    fn lex_hex_string(&mut self) -> PdfResult<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut digits = Vec::new();
        loop {
            match self.data.get(self.pos) {
                None => return Err(PdfError::syntax(start, "unterminated hex string")),
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(&b) if b.is_ascii_hexdigit() => digits.push(b),
                Some(&b) if is_whitespace(b) => {}
                Some(_) => return Err(PdfError::syntax(self.pos, "invalid hex digit")),
            }
            self.pos += 1;
        }
        // An odd final digit is followed by an implied 0.
        if digits.len() % 2 != 0 {
            digits.push(b'0');
        }
        let bytes = hex::decode(&digits).map_err(|e| PdfError::syntax(start, e.to_string()))?;
        Ok(Token::String(bytes, true))
    }

    fn lex_literal_string(&mut self) -> PdfResult<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut bytes = Vec::new();
        let mut nesting = 1usize;
        loop {
            let Some(&b) = self.data.get(self.pos) else {
                return Err(PdfError::syntax(start, "unterminated string"));
            };
            self.pos += 1;
            match b {
                b'(' => {
                    nesting += 1;
                    bytes.push(b);
                }
                b')' => {
                    nesting -= 1;
                    if nesting == 0 {
                        break;
                    }
                    bytes.push(b);
                }
                b'\r' => {
                    if self.data.get(self.pos) == Some(&b'\n') {
                        self.pos += 1;
                    }
                    bytes.push(b'\n');
                }
                b'\\' => self.lex_escape(&mut bytes),
                _ => bytes.push(b),
            }
        }
        Ok(Token::String(bytes, false))
    }

    fn lex_escape(&mut self, out: &mut Vec<u8>) {
        let Some(&b) = self.data.get(self.pos) else {
            return;
        };
        self.pos += 1;
        match b {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(b'\x08'),
            b'f' => out.push(b'\x0C'),
            b'0'..=b'7' => {
                let mut value = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.data.get(self.pos) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xFF) as u8);
            }
            // Line continuation.
            b'\r' => {
                if self.data.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
            }
            b'\n' => {}
            other => out.push(other),
        }
    }
}

fn parse_number(word: &[u8]) -> Option<Token> {
    let text = std::str::from_utf8(word).ok()?;
    let body = text.strip_prefix(|c| c == '+' || c == '-').unwrap_or(text);
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    let dots = body.bytes().filter(|&b| b == b'.').count();
    if dots > 1 || body == "." {
        return None;
    }
    if dots == 0 {
        if let Ok(i) = text.parse::<i64>() {
            return Some(Token::Int(i));
        }
    }
    text.parse::<f32>().ok().map(Token::Real)
}

/// Parse a buffer holding exactly one object.
pub fn parse_object(data: &[u8]) -> PdfResult<Obj> {
    let mut parser = Parser::new(data);
    let obj = parser.parse_object()?;
    if !parser.at_end() {
        return Err(PdfError::syntax(parser.position(), "trailing data after object"));
    }
    Ok(obj)
}
