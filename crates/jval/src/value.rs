use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use crate::array::ArrayBuf;
#[cfg(feature = "decnum")]
use crate::number::LiteralNumber;
use crate::object::ObjMap;
use crate::string::JStr;
use crate::utf8;

/// Top-level type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Invalid,
    Null,
    False,
    True,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Invalid => "<invalid>",
            Kind::Null => "null",
            Kind::False => "boolean",
            Kind::True => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A JSON-compatible value.
///
/// The handle is cheap to clone: payload-free kinds copy by bits, heap kinds
/// bump a reference count. Mutating operations take the handle by value and
/// return the updated value; the payload is written in place only when the
/// handle is its sole owner, otherwise a private copy is made first.
#[derive(Clone)]
pub struct Value(pub(crate) Repr);

#[derive(Clone)]
pub(crate) enum Repr {
    Invalid(Option<Rc<Value>>),
    Null,
    False,
    True,
    Number(f64),
    #[cfg(feature = "decnum")]
    Literal(Rc<LiteralNumber>),
    String(Rc<JStr>),
    Array {
        buf: Rc<ArrayBuf>,
        offset: u32,
        len: u32,
    },
    Object(Rc<ObjMap>),
}

impl Value {
    pub const NULL: Value = Value(Repr::Null);
    pub const TRUE: Value = Value(Repr::True);
    pub const FALSE: Value = Value(Repr::False);

    pub fn null() -> Value {
        Value::NULL
    }

    pub fn bool(x: bool) -> Value {
        if x {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }

    pub fn invalid() -> Value {
        Value(Repr::Invalid(None))
    }

    pub fn invalid_with_msg(msg: Value) -> Value {
        Value(Repr::Invalid(Some(Rc::new(msg))))
    }

    pub fn kind(&self) -> Kind {
        match &self.0 {
            Repr::Invalid(_) => Kind::Invalid,
            Repr::Null => Kind::Null,
            Repr::False => Kind::False,
            Repr::True => Kind::True,
            Repr::Number(_) => Kind::Number,
            #[cfg(feature = "decnum")]
            Repr::Literal(_) => Kind::Number,
            Repr::String(_) => Kind::String,
            Repr::Array { .. } => Kind::Array,
            Repr::Object(_) => Kind::Object,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.0, Repr::Invalid(_))
    }

    pub fn invalid_has_msg(&self) -> bool {
        match &self.0 {
            Repr::Invalid(msg) => msg.is_some(),
            _ => panic!("value is not invalid"),
        }
    }

    /// Consume an invalid value and return its message, or null if it has none.
    pub fn invalid_get_msg(self) -> Value {
        match self.0 {
            Repr::Invalid(Some(msg)) => (*msg).clone(),
            Repr::Invalid(None) => Value::NULL,
            _ => panic!("value is not invalid"),
        }
    }

    /// Number of handles sharing this value's payload; 1 for payload-free kinds.
    pub fn refcount(&self) -> usize {
        match &self.0 {
            Repr::Invalid(Some(msg)) => Rc::strong_count(msg),
            Repr::String(s) => Rc::strong_count(s),
            Repr::Array { buf, .. } => Rc::strong_count(buf),
            Repr::Object(map) => Rc::strong_count(map),
            #[cfg(feature = "decnum")]
            Repr::Literal(n) => Rc::strong_count(n),
            _ => 1,
        }
    }

    /// Strict descriptor identity: same kind, same payload pointer, and for
    /// arrays the same slice window. Native numbers compare by bit pattern,
    /// so identical NaNs are identical values.
    pub fn identical(&self, other: &Value) -> bool {
        match (&self.0, &other.0) {
            (Repr::Invalid(None), Repr::Invalid(None)) => true,
            (Repr::Invalid(Some(a)), Repr::Invalid(Some(b))) => Rc::ptr_eq(a, b),
            (Repr::Null, Repr::Null) => true,
            (Repr::False, Repr::False) => true,
            (Repr::True, Repr::True) => true,
            (Repr::Number(a), Repr::Number(b)) => a.to_bits() == b.to_bits(),
            #[cfg(feature = "decnum")]
            (Repr::Literal(a), Repr::Literal(b)) => Rc::ptr_eq(a, b),
            (Repr::String(a), Repr::String(b)) => Rc::ptr_eq(a, b),
            (
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
            ) => Rc::ptr_eq(a, b) && ao == bo && al == bl,
            (Repr::Object(a), Repr::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Structural containment: objects contain objects key-by-key, arrays
    /// contain arrays element-by-element, a string contains its substrings,
    /// and everything else contains only its equals.
    pub fn contains(&self, other: &Value) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match self.kind() {
            Kind::Object => self.object_contains(other),
            Kind::Array => self.array_contains(other),
            Kind::String => {
                let needle = other.string_value();
                needle.is_empty()
                    || utf8::find_sub(self.string_value().as_bytes(), needle.as_bytes()).is_some()
            }
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match self.kind() {
            Kind::Number => self.number_cmp(other) == Ordering::Equal,
            Kind::String => match (&self.0, &other.0) {
                (Repr::String(a), Repr::String(b)) => Rc::ptr_eq(a, b) || a.data == b.data,
                _ => unreachable!(),
            },
            Kind::Array => self.array_equal(other),
            Kind::Object => match (&self.0, &other.0) {
                (Repr::Object(a), Repr::Object(b)) => Rc::ptr_eq(a, b) || self.object_equal(other),
                _ => unreachable!(),
            },
            // null, booleans and invalid values of the same kind are equal
            _ => true,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Invalid(None) => f.write_str("<invalid>"),
            Repr::Invalid(Some(msg)) => write!(f, "<invalid: {:?}>", **msg),
            Repr::Null => f.write_str("null"),
            Repr::False => f.write_str("false"),
            Repr::True => f.write_str("true"),
            Repr::Number(x) => write!(f, "{x}"),
            #[cfg(feature = "decnum")]
            Repr::Literal(_) => match self.number_get_literal() {
                Some(text) => f.write_str(&text),
                None => write!(f, "{}", self.number_value()),
            },
            Repr::String(s) => write!(f, "{:?}", s.data),
            Repr::Array { .. } => f.debug_list().entries(self.array_iter()).finish(),
            Repr::Object(_) => f
                .debug_map()
                .entries(self.object_entries().map(|(k, v)| (k.string_value(), v)))
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Kind::Invalid.name(), "<invalid>");
        assert_eq!(Kind::Null.name(), "null");
        assert_eq!(Kind::False.name(), "boolean");
        assert_eq!(Kind::True.name(), "boolean");
        assert_eq!(Kind::Number.name(), "number");
        assert_eq!(Kind::String.name(), "string");
        assert_eq!(Kind::Array.name(), "array");
        assert_eq!(Kind::Object.name(), "object");
    }

    #[test]
    fn test_payload_free_constructors() {
        assert_eq!(Value::null().kind(), Kind::Null);
        assert_eq!(Value::bool(true).kind(), Kind::True);
        assert_eq!(Value::bool(false).kind(), Kind::False);
        assert_eq!(Value::invalid().kind(), Kind::Invalid);
        assert_eq!(Value::null().refcount(), 1);
    }

    #[test]
    fn test_invalid_message() {
        let bare = Value::invalid();
        assert!(!bare.is_valid());
        assert!(!bare.invalid_has_msg());
        assert_eq!(bare.invalid_get_msg(), Value::null());

        let v = Value::invalid_with_msg(Value::string("boom"));
        assert!(v.invalid_has_msg());
        assert_eq!(v.invalid_get_msg().string_value(), "boom");
    }

    #[test]
    fn test_refcount_tracks_clones() {
        let a = Value::string("shared");
        assert_eq!(a.refcount(), 1);
        let b = a.clone();
        assert_eq!(a.refcount(), 2);
        assert_eq!(b.refcount(), 2);
        drop(b);
        assert_eq!(a.refcount(), 1);
    }

    #[test]
    fn test_equal_across_kinds_is_false() {
        assert_ne!(Value::null(), Value::bool(false));
        assert_ne!(Value::number(0.0), Value::string("0"));
        assert_ne!(Value::bool(true), Value::bool(false));
    }

    #[test]
    fn test_invalids_compare_equal() {
        assert_eq!(Value::invalid(), Value::invalid());
        assert_eq!(
            Value::invalid_with_msg(Value::string("a")),
            Value::invalid_with_msg(Value::string("b"))
        );
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        let nan = Value::number(f64::NAN);
        assert_ne!(nan, nan.clone());
        // but it is identical to itself, bit for bit
        assert!(nan.identical(&nan.clone()));
    }

    #[test]
    fn test_identical_requires_pointer_identity() {
        let a = Value::string("x");
        assert!(a.identical(&a.clone()));
        assert!(!a.identical(&Value::string("x")));

        let arr = Value::array().array_append(Value::number(1.0));
        assert!(arr.identical(&arr.clone()));

        assert!(Value::null().identical(&Value::null()));
        assert!(Value::number(1.0).identical(&Value::number(1.0)));
        assert!(!Value::number(1.0).identical(&Value::number(2.0)));
    }

    #[test]
    fn test_contains_scalars_and_strings() {
        assert!(Value::string("hello").contains(&Value::string("ell")));
        assert!(Value::string("hello").contains(&Value::string("")));
        assert!(!Value::string("hello").contains(&Value::string("xyz")));
        assert!(Value::number(3.0).contains(&Value::number(3.0)));
        assert!(!Value::number(3.0).contains(&Value::string("3")));
        assert!(Value::null().contains(&Value::null()));
    }

    #[test]
    fn test_debug_output() {
        let v = Value::array()
            .array_append(Value::number(1.0))
            .array_append(Value::string("x"));
        assert_eq!(format!("{v:?}"), "[1, \"x\"]");
        assert_eq!(format!("{:?}", Value::null()), "null");
    }
}
