use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::error::SpiBridgeError;
use crate::types::RowValues;

/// Conversion from a decoded column value into a caller-requested type.
///
/// Implementations that cannot represent null must reject `RowValues::Null` with a cast error;
/// `Option<T>` and `RowValues` accept it.
pub trait FromSqlValue: Sized {
    /// # Errors
    /// Returns `SpiBridgeError::Cast` when the value does not fit `Self`.
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError>;
}

fn mismatch<T>(value: &RowValues, target: &str) -> Result<T, SpiBridgeError> {
    if value.is_null() {
        return Err(SpiBridgeError::Cast(format!(
            "Column is null and cannot be read as {target}"
        )));
    }
    Err(SpiBridgeError::Cast(format!(
        "Can't read a {} value as {target}",
        value.kind()
    )))
}

impl FromSqlValue for RowValues {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        Ok(value)
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_sql_value(value).map(Some)
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            RowValues::Int(v) => Ok(v),
            other => mismatch(&other, "i64"),
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromSqlValue for $ty {
                fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
                    match value {
                        RowValues::Int(v) => <$ty>::try_from(v).map_err(|_| {
                            SpiBridgeError::Cast(format!(
                                "{v} is out of range for {}",
                                stringify!($ty)
                            ))
                        }),
                        other => mismatch(&other, stringify!($ty)),
                    }
                }
            }
        )*
    };
}

narrow_int!(i16, i32, u32);

// Integers up to this magnitude are exact in an f64.
const F64_EXACT_INT: u64 = 1 << 53;

impl FromSqlValue for f64 {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            RowValues::Float(v) => Ok(v),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(v) if v.unsigned_abs() <= F64_EXACT_INT => Ok(v as f64),
            RowValues::Int(v) => Err(SpiBridgeError::Cast(format!(
                "{v} cannot be represented exactly as f64"
            ))),
            other => mismatch(&other, "f64"),
        }
    }
}

impl FromSqlValue for f32 {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            #[allow(clippy::cast_possible_truncation)]
            RowValues::Float(v) if v.is_nan() || v.is_infinite() || v.abs() <= f64::from(f32::MAX) => {
                Ok(v as f32)
            }
            RowValues::Float(v) => Err(SpiBridgeError::Cast(format!("{v} is out of range for f32"))),
            other => mismatch(&other, "f32"),
        }
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            RowValues::Bool(v) => Ok(v),
            other => mismatch(&other, "bool"),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            RowValues::Text(v) => Ok(v),
            RowValues::JSON(v) => Ok(v.to_string()),
            other => mismatch(&other, "String"),
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            RowValues::Timestamp(v) => Ok(v),
            RowValues::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
            other => mismatch(&other, "NaiveDateTime"),
        }
    }
}

impl FromSqlValue for NaiveDate {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            RowValues::Date(v) => Ok(v),
            RowValues::Timestamp(ts) => Ok(ts.date()),
            other => mismatch(&other, "NaiveDate"),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            RowValues::Blob(v) => Ok(v),
            other => mismatch(&other, "Vec<u8>"),
        }
    }
}

impl FromSqlValue for JsonValue {
    fn from_sql_value(value: RowValues) -> Result<Self, SpiBridgeError> {
        match value {
            RowValues::JSON(v) => Ok(v),
            RowValues::Text(text) => serde_json::from_str(&text)
                .map_err(|e| SpiBridgeError::Cast(format!("text is not valid JSON: {e}"))),
            other => mismatch(&other, "serde_json::Value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_only_fits_nullable_targets() {
        assert!(matches!(
            i32::from_sql_value(RowValues::Null),
            Err(SpiBridgeError::Cast(_))
        ));
        assert_eq!(Option::<i32>::from_sql_value(RowValues::Null).unwrap(), None);
        assert_eq!(RowValues::from_sql_value(RowValues::Null).unwrap(), RowValues::Null);
    }

    #[test]
    fn narrowing_is_checked() {
        assert_eq!(i16::from_sql_value(RowValues::Int(7)).unwrap(), 7);
        assert!(matches!(
            i16::from_sql_value(RowValues::Int(70_000)),
            Err(SpiBridgeError::Cast(_))
        ));
        assert_eq!(
            Option::<i32>::from_sql_value(RowValues::Int(5)).unwrap(),
            Some(5)
        );
    }

    #[test]
    fn integers_widen_to_f64_only_when_exact() {
        assert_eq!(f64::from_sql_value(RowValues::Int(1 << 53)).unwrap(), 9_007_199_254_740_992.0);
        assert_eq!(f64::from_sql_value(RowValues::Int(-42)).unwrap(), -42.0);
        assert!(matches!(
            f64::from_sql_value(RowValues::Int((1 << 53) + 1)),
            Err(SpiBridgeError::Cast(_))
        ));
        assert!(matches!(
            f64::from_sql_value(RowValues::Int(i64::MIN)),
            Err(SpiBridgeError::Cast(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_a_cast_error() {
        assert!(matches!(
            bool::from_sql_value(RowValues::Text("t".into())),
            Err(SpiBridgeError::Cast(_))
        ));
        let json = JsonValue::from_sql_value(RowValues::Text("{\"a\":1}".into())).unwrap();
        assert_eq!(json["a"], 1);
    }
}
