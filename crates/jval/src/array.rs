use std::rc::Rc;

use crate::error::ValueError;
use crate::value::{Repr, Value};

/// Shared element buffer. A handle views a `(offset, len)` window of it, so
/// slices alias storage instead of copying.
#[derive(Clone)]
pub(crate) struct ArrayBuf {
    pub(crate) elems: Vec<Value>,
}

/// Window offsets beyond this are no longer encodable; slicing past it
/// materializes a fresh array instead.
const OFFSET_LIMIT: i64 = 1 << 16;

fn round_up(n: usize) -> usize {
    n * 3 / 2
}

/// Uniform slice clamp: negative indices count from the end, then both are
/// clamped to `[0, len]` and an inverted range collapses to empty.
pub(crate) fn clamp_slice(len: i32, mut start: i32, mut end: i32) -> (i32, i32) {
    if start < 0 {
        start += len;
    }
    if end < 0 {
        end += len;
    }
    if start < 0 {
        start = 0;
    }
    if start > len {
        start = len;
    }
    if end > len {
        end = len;
    }
    if end < start {
        end = start;
    }
    (start, end)
}

impl Value {
    pub fn array() -> Value {
        Value::array_sized(16)
    }

    pub fn array_sized(n: i32) -> Value {
        Value(Repr::Array {
            buf: Rc::new(ArrayBuf {
                elems: Vec::with_capacity(n.max(0) as usize),
            }),
            offset: 0,
            len: 0,
        })
    }

    pub fn array_length(&self) -> i32 {
        match &self.0 {
            Repr::Array { len, .. } => *len as i32,
            _ => panic!("value is not an array"),
        }
    }

    /// A copy of the element at `idx`, or bare invalid when out of range.
    pub fn array_get(&self, idx: i32) -> Value {
        let Repr::Array { buf, offset, len } = &self.0 else {
            panic!("value is not an array");
        };
        if idx >= 0 && (idx as u32) < *len {
            buf.elems[*offset as usize + idx as usize].clone()
        } else {
            Value::invalid()
        }
    }

    /// Store `val` at `idx`, growing with nulls as needed. Negative indices
    /// count from the end. Writes in place when this handle is the sole owner
    /// and the payload has room; otherwise the window is copied into a fresh
    /// payload at 1.5x the needed capacity.
    pub fn array_set(mut self, idx: i32, val: Value) -> Value {
        let idx = if idx < 0 {
            idx + self.array_length()
        } else {
            idx
        };
        if idx < 0 {
            return ValueError::NegativeIndex.into();
        }
        {
            let Repr::Array { buf, offset, len } = &mut self.0 else {
                panic!("value is not an array");
            };
            if idx > (i32::MAX >> 2) - *offset as i32 {
                return ValueError::IndexTooLarge.into();
            }
            let pos = *offset as usize + idx as usize;
            if Rc::strong_count(buf) == 1 && pos < buf.elems.capacity() {
                let a = Rc::make_mut(buf);
                while a.elems.len() <= pos {
                    a.elems.push(Value::NULL);
                }
                a.elems[pos] = val;
                *len = (*len).max(idx as u32 + 1);
            } else {
                let new_len = (idx as usize + 1).max(*len as usize);
                let window = &buf.elems[*offset as usize..(*offset + *len) as usize];
                let mut elems = Vec::with_capacity(round_up(new_len));
                elems.extend(window.iter().cloned());
                elems.resize(new_len, Value::NULL);
                elems[idx as usize] = val;
                *buf = Rc::new(ArrayBuf { elems });
                *offset = 0;
                *len = new_len as u32;
            }
        }
        self
    }

    pub fn array_append(self, val: Value) -> Value {
        let n = self.array_length();
        self.array_set(n, val)
    }

    pub fn array_concat(mut self, b: Value) -> Value {
        for i in 0..b.array_length() {
            self = self.array_append(b.array_get(i));
            if !self.is_valid() {
                break;
            }
        }
        self
    }

    /// O(1) sub-view over the same payload; clamped per [`clamp_slice`]. An
    /// empty result is a fresh array, and a window past the encodable offset
    /// range is materialized by copying.
    pub fn array_slice(self, start: i32, end: i32) -> Value {
        let length = self.array_length();
        let (start, end) = clamp_slice(length, start, end);
        if start == end {
            return Value::array();
        }
        let cur_offset = match &self.0 {
            Repr::Array { offset, .. } => *offset,
            _ => unreachable!(),
        };
        if cur_offset as i64 + start as i64 >= OFFSET_LIMIT {
            let mut r = Value::array_sized(end - start);
            for i in start..end {
                r = r.array_append(self.array_get(i));
            }
            return r;
        }
        let mut v = self;
        if let Repr::Array { offset, len, .. } = &mut v.0 {
            *offset += start as u32;
            *len = (end - start) as u32;
        }
        v
    }

    /// Copies of the elements in window order.
    pub fn array_iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.array_length()).map(move |i| self.array_get(i))
    }

    pub(crate) fn array_equal(&self, other: &Value) -> bool {
        let (
            Repr::Array {
                buf: a,
                offset: ao,
                len: al,
            },
            Repr::Array {
                buf: b,
                offset: bo,
                len: bl,
            },
        ) = (&self.0, &other.0)
        else {
            unreachable!()
        };
        if al != bl {
            return false;
        }
        if Rc::ptr_eq(a, b) && ao == bo {
            return true;
        }
        (0..*al as i32).all(|i| self.array_get(i) == other.array_get(i))
    }

    pub(crate) fn array_contains(&self, other: &Value) -> bool {
        other
            .array_iter()
            .all(|be| self.array_iter().any(|ae| ae.contains(&be)))
    }

    /// Indices at which `b` occurs in `self` as a contiguous subarray.
    pub fn array_indexes(self, b: Value) -> Value {
        let mut res = Value::array();
        let mut idx = -1;
        let alen = self.array_length();
        for ai in 0..alen {
            for (bi, belem) in b.array_iter().enumerate() {
                if self.array_get(ai + bi as i32) != belem {
                    idx = -1;
                } else if bi == 0 && idx == -1 {
                    idx = ai;
                }
            }
            if idx > -1 {
                res = res.array_append(Value::number(idx as f64));
            }
            idx = -1;
        }
        res
    }
}
