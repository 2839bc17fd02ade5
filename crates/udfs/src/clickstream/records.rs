//! Record shapes carried inside clickstream payloads.
//!
//! Producers are loosely typed: numbers arrive as strings and strings as
//! numbers. Scalars are coerced to the modeled type; anything that cannot be
//! coerced (e.g. `"tall"` for a screen size, or an object for a string) is
//! rejected.

use indexmap::IndexMap;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

/// Common event fields.
///
/// Unknown input fields are ignored. Every modeled field is always written:
/// absent strings as `null`, absent numbers as `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    #[serde(deserialize_with = "text")]
    pub event_id: Option<String>,
    #[serde(deserialize_with = "integer")]
    pub timestamp: i64,
    #[serde(deserialize_with = "text")]
    pub event_type: Option<String>,
    #[serde(deserialize_with = "text")]
    pub unique_id: Option<String>,
    #[serde(deserialize_with = "text")]
    pub device_id: Option<String>,
    #[serde(deserialize_with = "text")]
    pub platform: Option<String>,
    #[serde(deserialize_with = "text")]
    pub os_version: Option<String>,
    #[serde(deserialize_with = "text")]
    pub network_type: Option<String>,
    #[serde(deserialize_with = "integer")]
    pub screen_height: i32,
    #[serde(deserialize_with = "integer")]
    pub screen_width: i32,
    #[serde(deserialize_with = "integer")]
    pub zone_offset: i32,
    #[serde(deserialize_with = "text")]
    pub system_language: Option<String>,
    #[serde(deserialize_with = "text")]
    pub country_code: Option<String>,
    #[serde(deserialize_with = "text")]
    pub sdk_version: Option<String>,
    #[serde(deserialize_with = "text")]
    pub app_version: Option<String>,
    #[serde(deserialize_with = "text")]
    pub app_id: Option<String>,
}

/// Free-form event attributes, key order preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeRecord(pub serde_json::Map<String, serde_json::Value>);

/// User attributes keyed by attribute name, key order preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(pub IndexMap<String, UserAttribute>);

/// A single user attribute and the time it was set (epoch millis).
///
/// An object carrying neither `value` nor `set_timestamp` is rejected, so a
/// map of unrelated objects does not decode as empty attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawUserAttribute")]
pub struct UserAttribute {
    pub value: Option<String>,
    pub set_timestamp: i64,
}

/// Wire form of [`UserAttribute`]; the outer `Option` records presence.
#[derive(Deserialize)]
struct RawUserAttribute {
    #[serde(default, deserialize_with = "present")]
    value: Option<Option<Scalar>>,
    #[serde(default, deserialize_with = "present")]
    set_timestamp: Option<Option<Scalar>>,
}

impl TryFrom<RawUserAttribute> for UserAttribute {
    type Error = String;

    fn try_from(raw: RawUserAttribute) -> Result<Self, Self::Error> {
        if raw.value.is_none() && raw.set_timestamp.is_none() {
            return Err("user attribute has neither `value` nor `set_timestamp`".into());
        }
        let set_timestamp = match raw.set_timestamp.flatten() {
            Some(scalar) => scalar.into_integer::<i64>()?,
            None => 0,
        };
        Ok(Self {
            value: raw.value.flatten().map(Scalar::into_text),
            set_timestamp,
        })
    }
}

/// Any JSON scalar.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Text(s) => s,
        }
    }

    /// Fractions truncate; a blank string reads as `0`.
    fn into_integer<T>(self) -> Result<T, String>
    where
        T: Default + TryFrom<i64>,
    {
        let n = match self {
            Scalar::Int(n) => n,
            Scalar::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => f.trunc() as i64,
            Scalar::Text(s) if s.trim().is_empty() => return Ok(T::default()),
            Scalar::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid integer {s:?}"))?,
            Scalar::Float(f) => return Err(format!("number {f} is not a valid integer")),
            Scalar::Bool(b) => return Err(format!("invalid integer {b}")),
        };
        T::try_from(n).map_err(|_| format!("integer {n} out of range"))
    }
}

/// String field: `null` stays `None`, other scalars are rendered as text.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

/// Integer field: `null` reads as `0`, numeric strings are parsed.
fn integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + TryFrom<i64>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        Some(scalar) => scalar.into_integer().map_err(D::Error::custom),
        None => Ok(T::default()),
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<Scalar>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Scalar>::deserialize(deserializer).map(Some)
}
