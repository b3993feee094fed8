//! Dynamically typed body values.

use std::{collections::BTreeMap, fmt};

use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::{SerializeMap as _, SerializeSeq as _},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// Placeholder a response body is decoded into when the expected type is unknown.
///
/// Matchers that cannot tell which type they compare against (e.g. [`ignore`] or [`not_empty`])
/// operate on `Dynamic`. Every codec can decode into it; its zero value is [`Dynamic::Null`].
///
/// [`ignore`]: crate::matcher::ignore
/// [`not_empty`]: crate::matcher::not_empty
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Dynamic {
    /// Absent value, e.g. JSON `null`.
    #[default]
    Null,

    /// Boolean.
    Bool(bool),

    /// Signed integer. Unsigned values that fit are stored here too.
    Int(i64),

    /// Unsigned integer too large for [`Dynamic::Int`].
    UInt(u64),

    /// Floating point number.
    Float(f64),

    /// UTF-8 text.
    String(String),

    /// Raw bytes.
    Bytes(Vec<u8>),

    /// Ordered sequence.
    Seq(Vec<Dynamic>),

    /// String keyed map.
    Map(BTreeMap<String, Dynamic>),
}

impl Dynamic {
    /// Returns true for `Null` and for empty strings, byte buffers, sequences and maps.
    pub fn is_empty(&self) -> bool {
        match self {
            Dynamic::Null => true,
            Dynamic::String(s) => s.is_empty(),
            Dynamic::Bytes(b) => b.is_empty(),
            Dynamic::Seq(seq) => seq.is_empty(),
            Dynamic::Map(map) => map.is_empty(),
            Dynamic::Bool(_) | Dynamic::Int(_) | Dynamic::UInt(_) | Dynamic::Float(_) => false,
        }
    }

    /// Returns text content, also accepting UTF-8 byte buffers.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            Dynamic::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Looks up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        match self {
            Dynamic::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) | Dynamic::UInt(_) => "integer",
            Dynamic::Float(_) => "float",
            Dynamic::String(_) => "string",
            Dynamic::Bytes(_) => "bytes",
            Dynamic::Seq(_) => "sequence",
            Dynamic::Map(_) => "map",
        }
    }
}

impl From<bool> for Dynamic {
    fn from(val: bool) -> Self {
        Dynamic::Bool(val)
    }
}

impl From<i64> for Dynamic {
    fn from(val: i64) -> Self {
        Dynamic::Int(val)
    }
}

impl From<u64> for Dynamic {
    fn from(val: u64) -> Self {
        match i64::try_from(val) {
            Ok(val) => Dynamic::Int(val),
            Err(_) => Dynamic::UInt(val),
        }
    }
}

impl From<f64> for Dynamic {
    fn from(val: f64) -> Self {
        Dynamic::Float(val)
    }
}

impl From<&str> for Dynamic {
    fn from(val: &str) -> Self {
        Dynamic::String(val.to_owned())
    }
}

impl From<String> for Dynamic {
    fn from(val: String) -> Self {
        Dynamic::String(val)
    }
}

impl From<Vec<u8>> for Dynamic {
    fn from(val: Vec<u8>) -> Self {
        Dynamic::Bytes(val)
    }
}

impl<K: Into<String>, V: Into<Dynamic>> FromIterator<(K, V)> for Dynamic {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Dynamic::Map(
            iter.into_iter()
                .map(|(key, val)| (key.into(), val.into()))
                .collect(),
        )
    }
}

impl Serialize for Dynamic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(val) => serializer.serialize_bool(*val),
            Dynamic::Int(val) => serializer.serialize_i64(*val),
            Dynamic::UInt(val) => serializer.serialize_u64(*val),
            Dynamic::Float(val) => serializer.serialize_f64(*val),
            Dynamic::String(val) => serializer.serialize_str(val),
            Dynamic::Bytes(val) => serializer.serialize_bytes(val),
            Dynamic::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Dynamic::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, val) in entries {
                    map.serialize_entry(key, val)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DynamicVisitor)
    }
}

struct DynamicVisitor;

impl<'de> Visitor<'de> for DynamicVisitor {
    type Value = Dynamic;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_bool<E: de::Error>(self, val: bool) -> Result<Dynamic, E> {
        Ok(Dynamic::Bool(val))
    }

    fn visit_i64<E: de::Error>(self, val: i64) -> Result<Dynamic, E> {
        Ok(Dynamic::Int(val))
    }

    fn visit_u64<E: de::Error>(self, val: u64) -> Result<Dynamic, E> {
        Ok(Dynamic::from(val))
    }

    fn visit_f64<E: de::Error>(self, val: f64) -> Result<Dynamic, E> {
        Ok(Dynamic::Float(val))
    }

    fn visit_str<E: de::Error>(self, val: &str) -> Result<Dynamic, E> {
        Ok(Dynamic::String(val.to_owned()))
    }

    fn visit_string<E: de::Error>(self, val: String) -> Result<Dynamic, E> {
        Ok(Dynamic::String(val))
    }

    fn visit_bytes<E: de::Error>(self, val: &[u8]) -> Result<Dynamic, E> {
        Ok(Dynamic::Bytes(val.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, val: Vec<u8>) -> Result<Dynamic, E> {
        Ok(Dynamic::Bytes(val))
    }

    fn visit_none<E: de::Error>(self) -> Result<Dynamic, E> {
        Ok(Dynamic::Null)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Dynamic, E> {
        Ok(Dynamic::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Dynamic, D::Error> {
        Dynamic::deserialize(deserializer)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Dynamic, D::Error> {
        Dynamic::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Dynamic, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Dynamic::Seq(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Dynamic, A::Error> {
        let mut entries = BTreeMap::new();
        while let Some((key, val)) = map.next_entry::<String, Dynamic>()? {
            entries.insert(key, val);
        }
        Ok(Dynamic::Map(entries))
    }
}
