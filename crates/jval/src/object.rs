use std::rc::Rc;

use crate::error::ValueError;
use crate::value::{Kind, Repr, Value};

/// Cursor value returned once object iteration is exhausted.
pub const ITER_FINISHED: i32 = -2;

const DEFAULT_OBJECT_SIZE: usize = 8;

#[derive(Clone)]
struct Slot {
    /// Index of the next slot in the same bucket chain, or -1.
    next: i32,
    hash: u32,
    /// `None` marks a slot that is unused or has been deleted.
    key: Option<Value>,
    value: Value,
}

impl Slot {
    fn vacant() -> Slot {
        Slot {
            next: -1,
            hash: 0,
            key: None,
            value: Value::NULL,
        }
    }
}

/// Shared object payload: a slot arena plus a bucket array twice its size.
/// Slots are handed out linearly; deleted slots are not reused until the
/// table grows and rehashes.
#[derive(Clone)]
pub(crate) struct ObjMap {
    next_free: i32,
    slots: Box<[Slot]>,
    buckets: Box<[i32]>,
}

impl ObjMap {
    fn with_capacity(size: usize) -> ObjMap {
        debug_assert!(size.is_power_of_two());
        ObjMap {
            next_free: 0,
            slots: vec![Slot::vacant(); size].into_boxed_slice(),
            buckets: vec![-1; size * 2].into_boxed_slice(),
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn bucket_of(&self, hash: u32) -> usize {
        (hash & (self.capacity() as u32 * 2 - 1)) as usize
    }

    /// Walk the bucket chain for `hash`, comparing hashes before key bytes.
    fn find_slot(&self, hash: u32, key: &str) -> Option<usize> {
        let mut cur = self.buckets[self.bucket_of(hash)];
        while cur >= 0 {
            let slot = &self.slots[cur as usize];
            if slot.hash == hash && slot.key.as_ref().is_some_and(|k| k.string_value() == key) {
                return Some(cur as usize);
            }
            cur = slot.next;
        }
        None
    }

    /// Claim the next free slot and prepend it to its bucket chain.
    /// Callers ensure a free slot exists.
    fn insert_new(&mut self, hash: u32, key: Value, value: Value) {
        let idx = self.next_free as usize;
        debug_assert!(idx < self.capacity());
        let b = self.bucket_of(hash);
        self.slots[idx] = Slot {
            next: self.buckets[b],
            hash,
            key: Some(key),
            value,
        };
        self.buckets[b] = idx as i32;
        self.next_free += 1;
    }

    /// Double the capacity, moving live slots into freshly computed buckets.
    fn rehash(&mut self) {
        let grown = ObjMap::with_capacity(self.capacity() * 2);
        let old = std::mem::replace(self, grown);
        for slot in old.slots.into_vec() {
            if let Some(key) = slot.key {
                self.insert_new(slot.hash, key, slot.value);
            }
        }
    }
}

impl Value {
    pub fn object() -> Value {
        Value(Repr::Object(Rc::new(ObjMap::with_capacity(
            DEFAULT_OBJECT_SIZE,
        ))))
    }

    pub(crate) fn object_payload(&self) -> &ObjMap {
        match &self.0 {
            Repr::Object(map) => map,
            _ => panic!("value is not an object"),
        }
    }

    /// A copy of the value bound to `key`, or bare invalid when absent.
    pub fn object_get(&self, key: &Value) -> Value {
        let hash = key.string_hash();
        let map = self.object_payload();
        match map.find_slot(hash, key.string_value()) {
            Some(i) => map.slots[i].value.clone(),
            None => Value::invalid(),
        }
    }

    pub fn object_has(&self, key: &Value) -> bool {
        let map = self.object_payload();
        map.find_slot(key.string_hash(), key.string_value()).is_some()
    }

    /// Bind `key` to `value`, unsharing the payload first when it is held by
    /// more than one handle. Growing past the size limit yields an invalid
    /// value.
    pub fn object_set(mut self, key: Value, value: Value) -> Value {
        let hash = key.string_hash();
        {
            let Repr::Object(rc) = &mut self.0 else {
                panic!("value is not an object");
            };
            let map = Rc::make_mut(rc);
            if let Some(i) = map.find_slot(hash, key.string_value()) {
                // existing binding: keep the stored key, replace the value
                map.slots[i].value = value;
            } else {
                if map.next_free as usize == map.capacity() {
                    if map.capacity() > (i32::MAX >> 2) as usize {
                        return ValueError::ObjectTooBig.into();
                    }
                    map.rehash();
                }
                map.insert_new(hash, key, value);
            }
        }
        self
    }

    /// Unlink and drop the binding for `key`, if any. The freed slot stays
    /// out of circulation until the next rehash.
    pub fn object_delete(mut self, key: Value) -> Value {
        let hash = key.string_hash();
        {
            let Repr::Object(rc) = &mut self.0 else {
                panic!("value is not an object");
            };
            let map = Rc::make_mut(rc);
            let b = map.bucket_of(hash);
            let mut prev: i32 = -1;
            let mut cur = map.buckets[b];
            while cur >= 0 {
                let ci = cur as usize;
                let found = map.slots[ci].hash == hash
                    && map.slots[ci]
                        .key
                        .as_ref()
                        .is_some_and(|k| k.string_value() == key.string_value());
                if found {
                    let next = map.slots[ci].next;
                    if prev < 0 {
                        map.buckets[b] = next;
                    } else {
                        map.slots[prev as usize].next = next;
                    }
                    map.slots[ci] = Slot::vacant();
                    break;
                }
                prev = cur;
                cur = map.slots[ci].next;
            }
        }
        self
    }

    pub fn object_length(&self) -> i32 {
        self.object_payload()
            .slots
            .iter()
            .filter(|s| s.key.is_some())
            .count() as i32
    }

    pub fn object_merge(mut self, b: Value) -> Value {
        for (k, v) in b.object_entries() {
            self = self.object_set(k.clone(), v.clone());
            if !self.is_valid() {
                break;
            }
        }
        self
    }

    /// Like [`Value::object_merge`], but when both sides bind an object at
    /// the same key the two are merged recursively instead of overwritten.
    pub fn object_merge_recursive(mut self, b: Value) -> Value {
        for (k, v) in b.object_entries() {
            let elem = self.object_get(k);
            if elem.is_valid() && elem.kind() == Kind::Object && v.kind() == Kind::Object {
                self = self.object_set(k.clone(), elem.object_merge_recursive(v.clone()));
            } else {
                self = self.object_set(k.clone(), v.clone());
            }
            if !self.is_valid() {
                break;
            }
        }
        self
    }

    pub(crate) fn object_entries(&self) -> impl Iterator<Item = (&Value, &Value)> + '_ {
        self.object_payload()
            .slots
            .iter()
            .filter_map(|s| s.key.as_ref().map(|k| (k, &s.value)))
    }

    pub(crate) fn object_equal(&self, other: &Value) -> bool {
        let len2 = other.object_length();
        let bmap = other.object_payload();
        let mut len1 = 0;
        for (k, v) in self.object_entries() {
            match bmap.find_slot(k.string_hash(), k.string_value()) {
                Some(i) => {
                    if *v != bmap.slots[i].value {
                        return false;
                    }
                }
                None => return false,
            }
            len1 += 1;
        }
        len1 == len2
    }

    pub(crate) fn object_contains(&self, other: &Value) -> bool {
        other
            .object_entries()
            .all(|(k, v)| self.object_get(k).contains(v))
    }

    /// Cursor to the first live slot, or [`ITER_FINISHED`].
    pub fn object_iter(&self) -> i32 {
        self.object_iter_next(-1)
    }

    /// Advance a cursor to the next live slot, or [`ITER_FINISHED`].
    pub fn object_iter_next(&self, iter: i32) -> i32 {
        debug_assert!(iter != ITER_FINISHED);
        let map = self.object_payload();
        let mut i = iter + 1;
        while (i as usize) < map.capacity() {
            if map.slots[i as usize].key.is_some() {
                return i;
            }
            i += 1;
        }
        ITER_FINISHED
    }

    pub fn object_iter_valid(&self, iter: i32) -> bool {
        iter != ITER_FINISHED
    }

    pub fn object_iter_key(&self, iter: i32) -> Value {
        match &self.object_payload().slots[iter as usize].key {
            Some(k) => k.clone(),
            None => panic!("object cursor points at a vacant slot"),
        }
    }

    pub fn object_iter_value(&self, iter: i32) -> Value {
        self.object_payload().slots[iter as usize].value.clone()
    }
}
