use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::array::clamp_slice;
use crate::error::ValueError;
use crate::utf8;
use crate::value::{Repr, Value};

/// Shared string payload. The buffer is always well-formed UTF-8: every
/// constructor sanitizes its input, so operations may walk it as `str`.
#[derive(Clone)]
pub(crate) struct JStr {
    hash: Cell<u32>,
    hashed: Cell<bool>,
    pub(crate) data: String,
}

impl JStr {
    fn new(data: String) -> JStr {
        JStr {
            hash: Cell::new(0),
            hashed: Cell::new(false),
            data,
        }
    }
}

const HASH_SEED: u32 = 0x432A9843;

/// MurmurHash3, 32-bit variant.
pub(crate) fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e2d51;
    const C2: u32 = 0x1b873593;

    let mut h1 = seed;
    let mut blocks = data.chunks_exact(4);
    for block in &mut blocks {
        let mut k1 = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        h1 ^= k1;
        h1 = h1.rotate_left(13);
        h1 = h1.wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    let tail = blocks.remainder();
    let mut k1 = 0u32;
    if tail.len() >= 3 {
        k1 ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        k1 ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        k1 ^= tail[0] as u32;
        k1 = k1.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        h1 ^= k1;
    }

    h1 ^= data.len() as u32;
    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(0x85ebca6b);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(0xc2b2ae35);
    h1 ^= h1 >> 16;
    h1
}

/// Byte offset of the `n`-th code point; `Some(len)` when `n` equals the
/// code-point count, `None` when the string is shorter than that.
fn nth_boundary(s: &str, n: usize) -> Option<usize> {
    let mut seen = 0;
    for (i, _) in s.char_indices() {
        if seen == n {
            return Some(i);
        }
        seen += 1;
    }
    (seen >= n).then_some(s.len())
}

impl Value {
    pub fn string(s: &str) -> Value {
        Value::from_string(s.to_owned())
    }

    pub(crate) fn from_string(data: String) -> Value {
        Value(Repr::String(Rc::new(JStr::new(data))))
    }

    /// Build a string from raw bytes, replacing ill-formed UTF-8 with U+FFFD.
    pub fn string_from_bytes(bytes: &[u8]) -> Value {
        Value::from_string(utf8::sanitize(bytes).into_owned())
    }

    /// An empty string with `cap` bytes of reserved buffer space.
    pub fn string_empty(cap: i32) -> Value {
        Value::from_string(String::with_capacity(cap.max(0) as usize))
    }

    pub(crate) fn string_payload(&self) -> &JStr {
        match &self.0 {
            Repr::String(s) => s,
            _ => panic!("value is not a string"),
        }
    }

    pub fn string_value(&self) -> &str {
        &self.string_payload().data
    }

    pub fn string_length_bytes(&self) -> i32 {
        self.string_value().len() as i32
    }

    pub fn string_length_codepoints(&self) -> i32 {
        self.string_value().chars().count() as i32
    }

    /// Hash of the string bytes, computed once and cached in the payload.
    pub fn string_hash(&self) -> u32 {
        let s = self.string_payload();
        if s.hashed.get() {
            return s.hash.get();
        }
        let h = murmur3_32(s.data.as_bytes(), HASH_SEED);
        s.hash.set(h);
        s.hashed.set(true);
        h
    }

    fn string_append_raw(mut self, add: &str) -> Value {
        {
            let Repr::String(rc) = &mut self.0 else {
                panic!("value is not a string");
            };
            if Rc::strong_count(rc) == 1 && rc.data.capacity() - rc.data.len() >= add.len() {
                let s = Rc::make_mut(rc);
                s.data.push_str(add);
                s.hashed.set(false);
            } else {
                let cur = rc.data.len();
                let mut data = String::with_capacity(((cur + add.len()) * 2).max(32));
                data.push_str(&rc.data);
                data.push_str(add);
                *rc = Rc::new(JStr::new(data));
            }
        }
        self
    }

    pub fn string_append_str(self, s: &str) -> Value {
        self.string_append_raw(s)
    }

    pub fn string_append_buf(self, buf: &[u8]) -> Value {
        let checked = utf8::sanitize(buf);
        self.string_append_raw(&checked)
    }

    pub fn string_append_codepoint(self, cp: u32) -> Value {
        let ch = utf8::scalar_or_replacement(cp as i64);
        self.string_append_raw(ch.encode_utf8(&mut [0u8; 4]))
    }

    pub fn string_concat(self, b: Value) -> Value {
        self.string_append_raw(b.string_value())
    }

    pub fn string_fmt(args: fmt::Arguments<'_>) -> Value {
        Value::from_string(fmt::format(args))
    }

    /// Slice by code-point indices, with negative indices counting from the
    /// end. Indices are clamped against the byte length before the walk; a
    /// start past the last code point yields an empty string. The result is
    /// always a fresh string.
    pub fn string_slice(self, start: i32, end: i32) -> Value {
        let s = self.string_value();
        let (start, end) = clamp_slice(s.len() as i32, start, end);
        let Some(bstart) = nth_boundary(s, start as usize) else {
            return Value::string_empty(16);
        };
        let bend = nth_boundary(s, end as usize).unwrap_or(s.len());
        Value::string(&s[bstart..bend])
    }

    /// Split on `sep` byte-wise; an empty separator splits into one string
    /// per code point. A trailing separator contributes an empty element.
    pub fn string_split(self, sep: Value) -> Value {
        let s = self.string_value();
        let sepstr = sep.string_value();
        let mut a = Value::array();
        if sepstr.is_empty() {
            for ch in s.chars() {
                a = a.array_append(Value::string(ch.encode_utf8(&mut [0u8; 4])));
                if !a.is_valid() {
                    break;
                }
            }
        } else if !s.is_empty() {
            for piece in s.split(sepstr) {
                a = a.array_append(Value::string(piece));
                if !a.is_valid() {
                    break;
                }
            }
        }
        a
    }

    pub fn string_repeat(self, n: i32) -> Value {
        if n < 0 {
            return Value::NULL;
        }
        let s = self.string_value();
        let res_len = s.len() as i64 * n as i64;
        if res_len >= i32::MAX as i64 {
            return ValueError::RepeatTooLong.into();
        }
        if res_len == 0 {
            return Value::string("");
        }
        Value::from_string(s.repeat(n as usize))
    }

    /// Array of one number per code point.
    pub fn string_explode(self) -> Value {
        let s = self.string_value();
        let mut a = Value::array_sized(s.len() as i32);
        for ch in s.chars() {
            a = a.array_append(Value::number(ch as u32 as f64));
            if !a.is_valid() {
                break;
            }
        }
        a
    }

    /// Inverse of [`Value::string_explode`]: build a string from an array of
    /// code-point numbers, clamping out-of-range values to U+FFFD.
    pub fn string_implode(self) -> Value {
        let len = self.array_length();
        let mut out = String::with_capacity(len.max(0) as usize);
        for i in 0..len {
            let cp = self.array_get(i).number_value() as i64;
            out.push(utf8::scalar_or_replacement(cp));
        }
        Value::from_string(out)
    }

    /// Code-point indices at which `needle` occurs, stepping one byte past
    /// each match start so overlapping occurrences are reported.
    pub fn string_indexes(self, needle: Value) -> Value {
        let hay = self.string_value().as_bytes();
        let nee = needle.string_value().as_bytes();
        let mut a = Value::array();
        if nee.is_empty() {
            return a;
        }
        let mut n: i32 = 0;
        let mut lp = 0usize;
        let mut p = 0usize;
        while let Some(found) = utf8::find_sub(&hay[p..], nee) {
            let at = p + found;
            while lp < at {
                lp += utf8::leading_len(hay[lp]);
                n += 1;
            }
            a = a.array_append(Value::number(n as f64));
            if !a.is_valid() {
                break;
            }
            p = at + 1;
        }
        a
    }
}
