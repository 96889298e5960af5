//! Object serializer
//!
//! Writes objects in PDF syntax. Pretty output separates every token with a
//! space (`[ 1 2 ]`, `<< /Key 1 >>`); tight output only inserts a space
//! where two regular characters would otherwise run together.

use std::fmt;
use std::io::Write;

use log::{debug, trace, warn};

use crate::config::ObjectLimits;
use crate::crypto::Crypt;
use crate::error::{PdfError, PdfResult};
use super::cookie::Cookie;
use super::object::{Obj, ObjKind, PdfString, Value};
use super::parser::is_regular;

/// Configurable serializer.
#[derive(Clone, Copy, Default)]
pub struct Serializer<'a> {
    tight: bool,
    limits: ObjectLimits,
    crypt: Option<(&'a dyn Crypt, i32, i32)>,
    cookie: Option<&'a Cookie>,
}

impl<'a> Serializer<'a> {
    /// Pretty serializer with default limits and no encryption.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose compact (`true`) or pretty spacing.
    pub fn tight(mut self, tight: bool) -> Self {
        self.tight = tight;
        self
    }

    /// Override the nesting limit.
    pub fn limits(mut self, limits: ObjectLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Encrypt strings as part of object `num gen`.
    pub fn crypt(mut self, crypt: &'a dyn Crypt, num: i32, gen: i32) -> Self {
        self.crypt = Some((crypt, num, gen));
        self
    }

    /// Report progress to, and honor aborts from, `cookie`.
    pub fn cookie(mut self, cookie: &'a Cookie) -> Self {
        self.cookie = Some(cookie);
        self
    }

    /// Serialize into a new buffer.
    pub fn to_bytes(&self, obj: &Obj) -> PdfResult<Vec<u8>> {
        trace!("Serializing {} (tight: {})", obj.type_name(), self.tight);
        let mut printer = Printer {
            ser: self,
            out: Vec::new(),
        };
        printer.object(obj, 0)?;
        Ok(printer.out)
    }

    /// Serialize into `buf`, returning the number of bytes written.
    ///
    /// An empty `buf` is a size query: nothing is written and the required
    /// length is returned.
    pub fn sprint_obj(&self, buf: &mut [u8], obj: &Obj) -> PdfResult<usize> {
        let bytes = self.to_bytes(obj)?;
        if buf.is_empty() {
            return Ok(bytes.len());
        }
        if buf.len() < bytes.len() {
            return Err(PdfError::BufferTooSmall {
                needed: bytes.len(),
                available: buf.len(),
            });
        }
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    /// Write `obj` to `out`.
    pub fn print_obj<W: Write + ?Sized>(&self, out: &mut W, obj: &Obj) -> PdfResult<()> {
        let bytes = self.to_bytes(obj)?;
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Write a complete `num gen obj ... endobj` body. Stream data, when
    /// given, is copied verbatim between the stream markers.
    pub fn print_indirect_object<W: Write + ?Sized>(
        &self,
        out: &mut W,
        num: i32,
        gen: i32,
        obj: &Obj,
        stream: Option<&[u8]>,
    ) -> PdfResult<()> {
        let mut own = *self;
        if let Some((crypt, _, _)) = self.crypt {
            own.crypt = Some((crypt, num, gen));
        }
        let body = own.to_bytes(obj)?;
        writeln!(out, "{} {} obj", num, gen)?;
        out.write_all(&body)?;
        out.write_all(b"\n")?;
        if let Some(data) = stream {
            out.write_all(b"stream\n")?;
            out.write_all(data)?;
            out.write_all(b"\nendstream\n")?;
        }
        out.write_all(b"endobj\n")?;
        Ok(())
    }
}

/// Serialize into `buf`; see [`Serializer::sprint_obj`].
pub fn sprint_obj(buf: &mut [u8], obj: &Obj, tight: bool) -> PdfResult<usize> {
    Serializer::new().tight(tight).sprint_obj(buf, obj)
}

/// Write `obj` to `out` with default limits.
pub fn print_obj<W: Write + ?Sized>(out: &mut W, obj: &Obj, tight: bool) -> PdfResult<()> {
    Serializer::new().tight(tight).print_obj(out, obj)
}

/// Serialize with strings encrypted for object `num gen`.
pub fn print_encrypted_obj<W: Write + ?Sized>(
    out: &mut W,
    obj: &Obj,
    tight: bool,
    crypt: &dyn Crypt,
    num: i32,
    gen: i32,
) -> PdfResult<()> {
    Serializer::new()
        .tight(tight)
        .crypt(crypt, num, gen)
        .print_obj(out, obj)
}

/// Write an `N G obj ... endobj` body, with optional stream data.
pub fn print_indirect_object<W: Write + ?Sized>(
    out: &mut W,
    num: i32,
    gen: i32,
    obj: &Obj,
    stream: Option<&[u8]>,
) -> PdfResult<()> {
    Serializer::new().print_indirect_object(out, num, gen, obj, stream)
}

/// Log the pretty form of `obj` at debug level.
pub fn debug_obj(obj: &Obj) {
    match Serializer::new().to_bytes(obj) {
        Ok(bytes) => debug!("{}", String::from_utf8_lossy(&bytes)),
        Err(err) => debug!("<unprintable {}: {}>", obj.type_name(), err),
    }
}

struct Printer<'s, 'a> {
    ser: &'s Serializer<'a>,
    out: Vec<u8>,
}

impl Printer<'_, '_> {
    /// Separate the next token from the previous one if needed.
    fn sep(&mut self, next: u8) {
        let Some(&last) = self.out.last() else {
            return;
        };
        if self.ser.tight {
            if is_regular(last) && is_regular(next) {
                self.out.push(b' ');
            }
        } else {
            self.out.push(b' ');
        }
    }

    fn token(&mut self, bytes: &[u8]) {
        if let Some(&first) = bytes.first() {
            self.sep(first);
        }
        self.out.extend_from_slice(bytes);
    }

    fn object(&mut self, obj: &Obj, depth: usize) -> PdfResult<()> {
        if let Some(cookie) = self.ser.cookie {
            if cookie.should_abort() {
                debug!("Serialization aborted");
                return Err(PdfError::Aborted);
            }
            cookie.inc_progress();
        }
        if depth > self.ser.limits.max_depth {
            warn!("Serialization exceeded nesting limit of {}", self.ser.limits.max_depth);
            return Err(PdfError::RecursionLimit(self.ser.limits.max_depth));
        }

        let Some(value) = obj.value() else {
            return self.constant(obj);
        };
        match &*value {
            Value::Int(i) => self.token(i.to_string().as_bytes()),
            Value::Real(f) => self.token(format_real(*f).as_bytes()),
            Value::Name(bytes) => self.name(bytes),
            Value::String(s) => self.string(s)?,
            Value::Indirect(r) => {
                self.token(r.num.to_string().as_bytes());
                self.token(r.gen.to_string().as_bytes());
                self.token(b"R");
            }
            Value::Array(a) => {
                let Some(_guard) = obj.mark_guard() else {
                    warn!("Cycle detected while serializing array");
                    return Err(PdfError::CycleDetected);
                };
                self.token(b"[");
                for item in &a.items {
                    self.object(item, depth + 1)?;
                }
                self.token(b"]");
            }
            Value::Dict(d) => {
                let Some(_guard) = obj.mark_guard() else {
                    warn!("Cycle detected while serializing dictionary");
                    return Err(PdfError::CycleDetected);
                };
                self.token(b"<<");
                for (key, item) in &d.entries {
                    self.name(key.as_bytes());
                    self.object(item, depth + 1)?;
                }
                self.token(b">>");
            }
        }
        Ok(())
    }

    fn constant(&mut self, obj: &Obj) -> PdfResult<()> {
        if obj.is_known_name_constant() {
            let name = obj.to_name();
            self.name(name.as_bytes());
        } else if obj.kind() == ObjKind::Bool {
            self.token(if obj.to_bool() { b"true" } else { b"false" });
        } else {
            self.token(b"null");
        }
        Ok(())
    }

    fn name(&mut self, bytes: &[u8]) {
        self.token(&escape_name(bytes));
    }

    fn string(&mut self, s: &PdfString) -> PdfResult<()> {
        let encrypted;
        let bytes = match self.ser.crypt {
            Some((crypt, num, gen)) => {
                encrypted = crypt.encrypt_bytes(&s.bytes, num, gen)?;
                &encrypted[..]
            }
            None => &s.bytes[..],
        };
        if s.hex {
            let mut token = Vec::with_capacity(bytes.len() * 2 + 2);
            token.push(b'<');
            token.extend_from_slice(hex::encode(bytes).as_bytes());
            token.push(b'>');
            self.token(&token);
        } else {
            self.token(&escape_literal(bytes));
        }
        Ok(())
    }
}

/// Shortest decimal form that reads back as the same `f32`.
fn format_real(f: f32) -> String {
    if !f.is_finite() || f == 0.0 {
        return "0".to_string();
    }
    format!("{}", f)
}

/// `/Name` with `#xx` escapes for bytes outside `!`..`~` and for delimiters.
pub(crate) fn escape_name(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 1);
    out.push(b'/');
    for &b in bytes {
        let plain = (b'!'..=b'~').contains(&b)
            && !matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#');
        if plain {
            out.push(b);
        } else {
            out.push(b'#');
            out.extend_from_slice(hex::encode_upper([b]).as_bytes());
        }
    }
    out
}

/// `(string)` with backslash escapes.
pub(crate) fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\x08' => out.extend_from_slice(b"\\b"),
            b'\x0C' => out.extend_from_slice(b"\\f"),
            0..=31 | 127..=255 => {
                out.extend_from_slice(format!("\\{:03o}", b).as_bytes());
            }
            _ => out.push(b),
        }
    }
    out.push(b')');
    out
}

impl Obj {
    fn is_known_name_constant(&self) -> bool {
        self.cell().is_none() && self.kind() == ObjKind::Name
    }

    /// Serialize with default settings.
    pub fn to_pdf_bytes(&self, tight: bool) -> PdfResult<Vec<u8>> {
        Serializer::new().tight(tight).to_bytes(self)
    }
}

impl fmt::Display for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Serializer::new().to_bytes(self) {
            Ok(bytes) => f.write_str(&String::from_utf8_lossy(&bytes)),
            Err(err) => write!(f, "<unprintable {}: {}>", self.type_name(), err),
        }
    }
}
