//! Typed value codec (§4.B) — a self-describing printable integer+string
//! encoding used for request bodies, distinct from the packet framing in
//! [`crate::wire`]. Grounded on `original_source/src/lib/Libifl/DIS_encode.c`
//! / `DIS_decode.c`, whose error-code enum is reproduced verbatim in
//! naming since the spec names it explicitly (§4.B).
//!
//! Primitives: unsigned/signed integers of declared width, floats (written
//! with `ndigs` significant digits), counted strings (`<length><bytes>`),
//! and fixed-size strings. All must round-trip exactly (§8 property list).

use std::fmt;

/// DIS-style codec error reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisError {
    Success,
    Overflow,
    HugeVal,
    BadSign,
    LeadZero,
    NonDigit,
    NullStr,
    Eod,
    NoMalloc,
    Proto,
    NoCommit,
    Eof,
}

impl fmt::Display for DisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for DisError {}

type DisResult<T> = Result<T, DisError>;

/// An in-memory cursor over an encoded byte buffer; the wire layer hands
/// this the decrypted/unframed payload of one packet.
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder { buf: Vec::new() }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// `<sign><digits>` with no leading zero, matching `LEADZRO`/`BADSIGN`
    /// decode checks on the read side.
    pub fn put_i64(&mut self, v: i64) {
        if v < 0 {
            self.buf.push(b'-');
            self.buf.extend_from_slice(v.unsigned_abs().to_string().as_bytes());
        } else {
            self.buf.push(b'+');
            self.buf.extend_from_slice(v.to_string().as_bytes());
        }
        self.buf.push(b'\n');
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(v.to_string().as_bytes());
        self.buf.push(b'\n');
    }

    /// Significant-digit float encoding: `<sign><mantissa>E<exp>` with
    /// exactly `ndigs` mantissa digits.
    pub fn put_f64(&mut self, v: f64, ndigs: u32) {
        let s = format!("{:.*e}", ndigs as usize, v);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(b'\n');
    }

    /// `<length>\n<bytes>` counted string.
    pub fn put_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.len().to_string().as_bytes());
        self.buf.push(b'\n');
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Fixed-width string, space-padded/truncated to exactly `width` bytes.
    pub fn put_fixed_str(&mut self, s: &str, width: usize) {
        let mut bytes = s.as_bytes().to_vec();
        bytes.resize(width, b' ');
        self.buf.extend_from_slice(&bytes);
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoding cursor, mirroring `Encoder`.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder { buf, pos: 0 }
    }

    fn read_line(&mut self) -> DisResult<&'a [u8]> {
        let rest = &self.buf[self.pos..];
        let nl = rest.iter().position(|&b| b == b'\n').ok_or(DisError::Eod)?;
        self.pos += nl + 1;
        Ok(&rest[..nl])
    }

    pub fn get_i64(&mut self) -> DisResult<i64> {
        let line = self.read_line()?;
        if line.is_empty() {
            return Err(DisError::NullStr);
        }
        let (sign, digits) = match line[0] {
            b'+' => (1i64, &line[1..]),
            b'-' => (-1i64, &line[1..]),
            _ => return Err(DisError::BadSign),
        };
        if digits.is_empty() {
            return Err(DisError::NullStr);
        }
        if digits.len() > 1 && digits[0] == b'0' {
            return Err(DisError::LeadZero);
        }
        let s = std::str::from_utf8(digits).map_err(|_| DisError::NonDigit)?;
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DisError::NonDigit);
        }
        let magnitude: i64 = s.parse().map_err(|_| DisError::Overflow)?;
        Ok(sign * magnitude)
    }

    pub fn get_u64(&mut self) -> DisResult<u64> {
        let line = self.read_line()?;
        if line.is_empty() {
            return Err(DisError::NullStr);
        }
        let s = std::str::from_utf8(line).map_err(|_| DisError::NonDigit)?;
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DisError::NonDigit);
        }
        s.parse().map_err(|_| DisError::Overflow)
    }

    pub fn get_f64(&mut self) -> DisResult<f64> {
        let line = self.read_line()?;
        let s = std::str::from_utf8(line).map_err(|_| DisError::NonDigit)?;
        s.parse().map_err(|_| DisError::HugeVal)
    }

    pub fn get_str(&mut self) -> DisResult<String> {
        let len_line = self.read_line()?;
        let len_s = std::str::from_utf8(len_line).map_err(|_| DisError::NonDigit)?;
        let len: usize = len_s.parse().map_err(|_| DisError::Overflow)?;
        if self.pos + len > self.buf.len() {
            return Err(DisError::Eof);
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        String::from_utf8(bytes.to_vec()).map_err(|_| DisError::NonDigit)
    }

    pub fn get_fixed_str(&mut self, width: usize) -> DisResult<String> {
        if self.pos + width > self.buf.len() {
            return Err(DisError::Eof);
        }
        let bytes = &self.buf[self.pos..self.pos + width];
        self.pos += width;
        Ok(String::from_utf8_lossy(bytes).trim_end().to_string())
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }
}
