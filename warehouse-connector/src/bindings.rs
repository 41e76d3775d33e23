use serde::Serialize;

/// A single value bound to a `?` placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum BindingValue {
    Null,
    Bool(bool),

    SmallInt(i16),
    Int(i32),
    BigInt(i64),

    UByte(u8),
    SmallUInt(u16),
    UInt(u32),
    BigUInt(u64),

    Double(f64),

    String(String),
}

/// Snowflake binding type names
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BindingKind {
    Fixed,
    Real,
    Boolean,
    Text,
}

impl BindingValue {
    pub const fn kind(&self) -> BindingKind {
        match self {
            BindingValue::Bool(_) => BindingKind::Boolean,
            BindingValue::SmallInt(_)
            | BindingValue::Int(_)
            | BindingValue::BigInt(_)
            | BindingValue::UByte(_)
            | BindingValue::SmallUInt(_)
            | BindingValue::UInt(_)
            | BindingValue::BigUInt(_) => BindingKind::Fixed,
            BindingValue::Double(_) => BindingKind::Real,
            BindingValue::Null | BindingValue::String(_) => BindingKind::Text,
        }
    }

    /// The wire form, `None` for SQL NULL.
    pub fn to_wire(&self) -> Option<String> {
        match self {
            BindingValue::Null => None,
            BindingValue::Bool(value) => Some(value.to_string()),
            BindingValue::SmallInt(value) => Some(value.to_string()),
            BindingValue::Int(value) => Some(value.to_string()),
            BindingValue::BigInt(value) => Some(value.to_string()),
            BindingValue::UByte(value) => Some(value.to_string()),
            BindingValue::SmallUInt(value) => Some(value.to_string()),
            BindingValue::UInt(value) => Some(value.to_string()),
            BindingValue::BigUInt(value) => Some(value.to_string()),
            BindingValue::Double(value) => Some(value.to_string()),
            BindingValue::String(value) => Some(value.clone()),
        }
    }
}

impl From<&str> for BindingValue {
    fn from(value: &str) -> Self {
        BindingValue::String(value.to_owned())
    }
}

impl<T: Into<BindingValue>> From<Option<T>> for BindingValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BindingValue::Null, Into::into)
    }
}

macro_rules! impl_from_binding_value {
    ($ty: ty, $ex: expr) => {
        impl From<$ty> for BindingValue {
            fn from(value: $ty) -> Self {
                $ex(value)
            }
        }
    };
}
impl_from_binding_value!(bool, BindingValue::Bool);
impl_from_binding_value!(i16, BindingValue::SmallInt);
impl_from_binding_value!(i32, BindingValue::Int);
impl_from_binding_value!(i64, BindingValue::BigInt);
impl_from_binding_value!(u8, BindingValue::UByte);
impl_from_binding_value!(u16, BindingValue::SmallUInt);
impl_from_binding_value!(u32, BindingValue::UInt);
impl_from_binding_value!(u64, BindingValue::BigUInt);
impl_from_binding_value!(f64, BindingValue::Double);
impl_from_binding_value!(String, BindingValue::String);

/// What goes over the wire for one placeholder: a scalar, or one value per row
/// when a statement is executed against an array of rows.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BindingPayload {
    Single(Option<String>),
    Array(Vec<Option<String>>),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Binding {
    #[serde(rename = "type")]
    pub kind: BindingKind,
    pub value: BindingPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(BindingValue::from(69).kind(), BindingKind::Fixed);
        assert_eq!(BindingValue::from(1.5).kind(), BindingKind::Real);
        assert_eq!(BindingValue::from(true).kind(), BindingKind::Boolean);
        assert_eq!(BindingValue::from("JoMama").kind(), BindingKind::Text);
        assert_eq!(BindingValue::from(None::<i32>), BindingValue::Null);
    }

    #[test]
    fn serializes_like_the_sql_api_expects() -> Result<(), anyhow::Error> {
        let single = Binding {
            kind: BindingKind::Fixed,
            value: BindingPayload::Single(BindingValue::from(42u32).to_wire()),
        };
        assert_eq!(
            serde_json::to_value(&single)?,
            serde_json::json!({ "type": "FIXED", "value": "42" })
        );

        let array = Binding {
            kind: BindingKind::Text,
            value: BindingPayload::Array(vec![Some("a".into()), None]),
        };
        assert_eq!(
            serde_json::to_value(&array)?,
            serde_json::json!({ "type": "TEXT", "value": ["a", null] })
        );
        Ok(())
    }
}
