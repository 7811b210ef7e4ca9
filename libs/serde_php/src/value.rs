//! An untyped representation of any value the format can hold.
//!
//! Useful when the shape of the data isn't known ahead of time, or to
//! convert it to and from other serde formats.

use std::fmt;

use serde::de::{self, Unexpected};
use serde::ser;

/// Any value of the format.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `i:<n>;`
    Int(i64),
    /// `d:<f>;`
    Float(f64),
    /// `s:<len>:"<bytes>";`
    ///
    /// The payload is kept as raw bytes since it doesn't have to be UTF-8.
    Str(Vec<u8>),
    /// `a:<n>:{...}`
    ///
    /// Entries keep the order they were read in.
    Array(Vec<(Key, Value)>),
}

/// An array key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Int(i64),
    Str(Vec<u8>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Gets the string payload, if this is a string and valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| str::from_utf8(b).ok())
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[(Key, Self)]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up the value of an array entry by its key.
    ///
    /// Returns [`None`] if this isn't an array or there is no such entry.
    /// Keys are compared as-is, so `"5"` does not find the entry `5`.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Self> {
        let key = key.into();
        self.as_array()?
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

impl Key {
    /// Creates a key from text the way PHP stores array keys, turning
    /// canonical decimal integers into integer keys.
    ///
    /// So `"12"` becomes `12` while `"012"` stays a string. Keys read from
    /// serialized data are never normalized, since the wire already tells
    /// them apart. This is meant for keys from formats that only have string
    /// keys, such as JSON objects.
    pub fn normalized(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        match canonical_int(&bytes) {
            Some(v) => Self::Int(v),
            None => Self::Str(bytes),
        }
    }
}

fn canonical_int(bytes: &[u8]) -> Option<i64> {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    let canonical = match digits {
        [b'0'] => digits.len() == bytes.len(),
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    };

    if !canonical {
        return None;
    }

    str::from_utf8(bytes).ok()?.parse().ok()
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value.into_bytes())
    }
}

impl From<&[u8]> for Key {
    fn from(value: &[u8]) -> Self {
        Self::Str(value.to_vec())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value.into_bytes())
    }
}

impl From<Vec<(Key, Self)>> for Value {
    fn from(value: Vec<(Key, Self)>) -> Self {
        Self::Array(value)
    }
}

fn serialize_bytes<S: ser::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    match str::from_utf8(bytes) {
        Ok(s) => serializer.serialize_str(s),
        Err(_) => serializer.serialize_bytes(bytes),
    }
}

impl ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match self {
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Str(v) => serialize_bytes(v, serializer),
            Self::Array(entries) => {
                let is_list = entries
                    .iter()
                    .enumerate()
                    .all(|(i, (k, _))| i64::try_from(i).is_ok_and(|i| *k == Key::Int(i)));

                if is_list {
                    serializer.collect_seq(entries.iter().map(|(_, v)| v))
                } else {
                    serializer.collect_map(entries.iter().map(|(k, v)| (k, v)))
                }
            },
        }
    }
}

impl ser::Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match self {
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Str(v) => serialize_bytes(v, serializer),
        }
    }
}

fn int_from_u64<E: de::Error>(v: u64, exp: &dyn de::Expected) -> Result<i64, E> {
    i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), exp))
}

struct ValueVisitor;

impl<'de> de::Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an integer, float, string, or array")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        int_from_u64(v, &self).map(Value::Int)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Str(v.into()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Str(v.into_bytes()))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Str(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: de::SeqAccess<'de>,
    {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(0x400));
        let mut index = 0i64;
        while let Some(value) = seq.next_element()? {
            entries.push((Key::Int(index), value));
            index += 1;
        }

        Ok(Value::Array(entries))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0).min(0x400));
        while let Some(entry) = map.next_entry()? {
            entries.push(entry);
        }

        Ok(Value::Array(entries))
    }
}

impl<'de> de::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct KeyVisitor;

impl de::Visitor<'_> for KeyVisitor {
    type Value = Key;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an integer or string key")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
        Ok(Key::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
        int_from_u64(v, &self).map(Key::Int)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
        Ok(Key::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Key, E> {
        Ok(Key::from(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Key, E> {
        Ok(Key::from(v))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Key, E> {
        Ok(Key::Str(v))
    }
}

impl<'de> de::Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(KeyVisitor)
    }
}
