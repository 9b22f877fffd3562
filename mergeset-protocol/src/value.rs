use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A leaf value carried by a `set` op or accumulated by `inc` ops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarValue {
    Str(SmolStr),
    Int(i64),
    Uint(u64),
    F64(f64),
    Counter(i64),
    Timestamp(i64),
    Boolean(bool),
    Bytes(Vec<u8>),
    Null,
}

impl ScalarValue {
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int(n) | ScalarValue::Counter(n) | ScalarValue::Timestamp(n) => Some(*n),
            ScalarValue::Uint(n) => i64::try_from(*n).ok(),
            ScalarValue::F64(n) => Some(*n as i64),
            _ => None,
        }
    }

    pub fn is_counter(&self) -> bool {
        matches!(self, ScalarValue::Counter(_))
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarValue::Str(a), ScalarValue::Str(b)) => a == b,
            (ScalarValue::Int(a), ScalarValue::Int(b)) => a == b,
            (ScalarValue::Uint(a), ScalarValue::Uint(b)) => a == b,
            (ScalarValue::F64(a), ScalarValue::F64(b)) => a.to_bits() == b.to_bits(),
            (ScalarValue::Counter(a), ScalarValue::Counter(b)) => a == b,
            (ScalarValue::Timestamp(a), ScalarValue::Timestamp(b)) => a == b,
            (ScalarValue::Boolean(a), ScalarValue::Boolean(b)) => a == b,
            (ScalarValue::Bytes(a), ScalarValue::Bytes(b)) => a == b,
            (ScalarValue::Null, ScalarValue::Null) => true,
            _ => false,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::Str(s.into())
    }
}

impl From<i64> for ScalarValue {
    fn from(n: i64) -> Self {
        ScalarValue::Int(n)
    }
}

impl From<bool> for ScalarValue {
    fn from(b: bool) -> Self {
        ScalarValue::Boolean(b)
    }
}
