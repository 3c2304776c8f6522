use crate::Value;

/// Failures surfaced in-band as invalid values carrying a message string.
///
/// The `Display` text of each variant is the exact message observable through
/// [`Value::invalid_get_msg`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("Out of bounds negative array index")]
    NegativeIndex,

    #[error("Array index too large")]
    IndexTooLarge,

    #[error("Repeat string result too long")]
    RepeatTooLong,

    #[error("Object too big")]
    ObjectTooBig,

    #[error("cannot encode {0} as JSON")]
    JsonEncode(&'static str),
}

impl From<ValueError> for Value {
    fn from(err: ValueError) -> Value {
        Value::invalid_with_msg(Value::string(&err.to_string()))
    }
}
