//! Text strings
//!
//! PDF text strings are either UTF-16 with a byte order mark or single bytes
//! in PDFDocEncoding. A UTF-8 byte order mark is accepted as well, as written
//! by PDF 2.0 producers.

use log::trace;

use super::object::Obj;

const BOM_UTF16BE: [u8; 2] = [0xFE, 0xFF];
const BOM_UTF16LE: [u8; 2] = [0xFF, 0xFE];
const BOM_UTF8: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// PDFDocEncoding bytes 0x18..=0x1F.
const DOC_ACCENTS: [char; 8] = [
    '\u{02D8}', '\u{02C7}', '\u{02C6}', '\u{02D9}', '\u{02DD}', '\u{02DB}', '\u{02DA}', '\u{02DC}',
];

/// PDFDocEncoding bytes 0x80..=0xA0. 0x9F is undefined.
const DOC_HIGH: [char; 33] = [
    '\u{2022}', '\u{2020}', '\u{2021}', '\u{2026}', '\u{2014}', '\u{2013}', '\u{0192}', '\u{2044}',
    '\u{2039}', '\u{203A}', '\u{2212}', '\u{2030}', '\u{201E}', '\u{201C}', '\u{201D}', '\u{2018}',
    '\u{2019}', '\u{201A}', '\u{2122}', '\u{FB01}', '\u{FB02}', '\u{0141}', '\u{0152}', '\u{0160}',
    '\u{0178}', '\u{017D}', '\u{0131}', '\u{0142}', '\u{0153}', '\u{0161}', '\u{017E}', '\u{FFFD}',
    '\u{20AC}',
];

/// Map one PDFDocEncoding byte to a character.
pub fn pdf_doc_decode(byte: u8) -> char {
    match byte {
        0x18..=0x1F => DOC_ACCENTS[usize::from(byte - 0x18)],
        0x7F | 0xAD => char::REPLACEMENT_CHARACTER,
        0x80..=0xA0 => DOC_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

/// Map a character to its PDFDocEncoding byte, if it has one.
pub fn pdf_doc_encode(c: char) -> Option<u8> {
    let code = u32::from(c);
    match code {
        0x00..=0x17 | 0x20..=0x7E | 0xA1..=0xAC | 0xAE..=0xFF => u8::try_from(code).ok(),
        _ => {
            if let Some(idx) = DOC_ACCENTS.iter().position(|&a| a == c) {
                return u8::try_from(0x18 + idx).ok();
            }
            if c == char::REPLACEMENT_CHARACTER {
                return None;
            }
            DOC_HIGH
                .iter()
                .position(|&h| h == c)
                .and_then(|idx| u8::try_from(0x80 + idx).ok())
        }
    }
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let units = bytes.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });
    let mut text: String = char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if bytes.len() % 2 != 0 {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

/// Decode the bytes of a text string. Never fails; malformed input yields
/// replacement characters.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&BOM_UTF16BE) {
        decode_utf16(rest, true)
    } else if let Some(rest) = bytes.strip_prefix(&BOM_UTF16LE) {
        decode_utf16(rest, false)
    } else if let Some(rest) = bytes.strip_prefix(&BOM_UTF8) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| pdf_doc_decode(b)).collect()
    }
}

/// Encode text as PDFDocEncoding when every character has a byte there,
/// as UTF-16BE with a byte order mark otherwise.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    let doc: Option<Vec<u8>> = text.chars().map(pdf_doc_encode).collect();
    match doc {
        // A leading FE FF would read back as UTF-16.
        Some(bytes) if !bytes.starts_with(&BOM_UTF16BE) && !bytes.starts_with(&BOM_UTF16LE) => bytes,
        _ => {
            let mut out = Vec::with_capacity(2 + text.len() * 2);
            out.extend_from_slice(&BOM_UTF16BE);
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_be_bytes());
            }
            out
        }
    }
}

impl Obj {
    /// Text string holding `text`.
    pub fn new_text_string(text: &str) -> Obj {
        Obj::new_string(&encode_text_string(text))
    }

    /// Decode a string object as text. Non-strings give an empty string.
    pub fn to_utf8(&self) -> String {
        self.with_bytes(decode_text_string)
    }

    /// A name as text.
    pub fn to_utf8_name(&self) -> String {
        let name = self.to_name();
        let bytes = name.as_bytes();
        if bytes.starts_with(&BOM_UTF16BE) || bytes.starts_with(&BOM_UTF8) {
            decode_text_string(bytes)
        } else {
            name.as_str().to_string()
        }
    }

    /// Decode the data of the stream this reference points to.
    pub fn load_stream_as_utf8(&self) -> String {
        if !self.is_stream() {
            return String::new();
        }
        let num = self.to_num();
        let data = self
            .get_indirect_document()
            .and_then(|doc| doc.load_stream(num));
        match data {
            Some(bytes) => {
                trace!("Decoding {} bytes of stream {} as text", bytes.len(), num);
                decode_text_string(&bytes)
            }
            None => String::new(),
        }
    }

    /// Text from either a stream or a string.
    pub fn load_stream_or_string_as_utf8(&self) -> String {
        if self.is_stream() {
            self.load_stream_as_utf8()
        } else {
            self.to_utf8()
        }
    }
}
