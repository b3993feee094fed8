//! Pluggable response body decoders.

use std::{any, str};

use derive_more::{Display, Error};
use serde::{
    de::{self, value::SeqDeserializer, DeserializeOwned, Visitor},
    forward_to_deserialize_any,
};

use crate::{CodecError, Dynamic};

/// Decodes raw response bodies into typed values.
///
/// A codec writes through a target that was allocated with its type's zero value. Implement this
/// trait to use a body format not provided here with
/// [`cmp_marshaled_body`](crate::TestApi::cmp_marshaled_body).
///
/// # Examples
/// ```
/// use actix_test_api::{Codec, CodecError};
/// use serde::de::DeserializeOwned;
///
/// /// Decodes `application/x-www-form-urlencoded` bodies.
/// struct FormCodec;
///
/// impl Codec for FormCodec {
///     fn name(&self) -> &'static str {
///         "form"
///     }
///
///     fn decode<T: DeserializeOwned>(&self, body: &[u8], target: &mut T) -> Result<(), CodecError> {
///         let text = std::str::from_utf8(body).map_err(|err| CodecError::custom(err.to_string()))?;
///         *target = serde_json::from_value(serde_json::Value::Object(
///             text.split('&')
///                 .filter_map(|pair| pair.split_once('='))
///                 .map(|(k, v)| (k.to_owned(), v.into()))
///                 .collect(),
///         ))
///         .map_err(CodecError::Json)?;
///         Ok(())
///     }
/// }
/// ```
pub trait Codec {
    /// Format name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Decodes `body` into `target`.
    fn decode<T: DeserializeOwned>(&self, body: &[u8], target: &mut T) -> Result<(), CodecError>;

    /// Decodes `body` into the dynamic placeholder.
    ///
    /// Defaults to [`decode`](Self::decode) through `Dynamic`'s `Deserialize` implementation.
    fn decode_dynamic(&self, body: &[u8], target: &mut Dynamic) -> Result<(), CodecError> {
        self.decode(body, target)
    }
}

/// Passes the body through untouched.
///
/// Decodes into `String` (body must be valid UTF-8), `Vec<u8>`, [`Bytes`](bytes::Bytes) and
/// [`Dynamic::Bytes`]. Any other target is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl Codec for RawCodec {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8], target: &mut T) -> Result<(), CodecError> {
        *target = T::deserialize(RawBodyDeserializer(body)).map_err(|err| match err {
            RawError::Utf8(err) => CodecError::Utf8(err),
            RawError::Other(err) => CodecError::Raw(de::Error::custom(format_args!(
                "raw body can only be compared as a string, bytes or a matcher over them, not {}: {err}",
                any::type_name::<T>(),
            ))),
        })?;
        Ok(())
    }

    fn decode_dynamic(&self, body: &[u8], target: &mut Dynamic) -> Result<(), CodecError> {
        *target = Dynamic::Bytes(body.to_vec());
        Ok(())
    }
}

/// Failure of [`RawBodyDeserializer`].
#[derive(Debug, Display, Error)]
enum RawError {
    /// Text target over a body that is not UTF-8.
    #[display("{_0}")]
    Utf8(#[error(source)] str::Utf8Error),

    /// Target the raw body cannot represent.
    #[display("{_0}")]
    Other(#[error(source)] de::value::Error),
}

impl de::Error for RawError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::Other(<de::value::Error as de::Error>::custom(msg))
    }
}

/// Feeds a raw body to `Deserialize` implementations of strings and byte buffers.
struct RawBodyDeserializer<'a>(&'a [u8]);

impl<'de, 'a> de::Deserializer<'de> for RawBodyDeserializer<'a> {
    type Error = RawError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bytes(self.0)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match str::from_utf8(self.0) {
            Ok(text) => visitor.visit_str(text),
            Err(err) => Err(RawError::Utf8(err)),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_bytes(self.0)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_byte_buf(self.0.to_vec())
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let mut seq = SeqDeserializer::<_, Self::Error>::new(self.0.iter().copied());
        let val = visitor.visit_seq(&mut seq)?;
        seq.end()?;
        Ok(val)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char
        unit unit_struct tuple tuple_struct map struct enum identifier ignored_any
    }
}

/// Decodes JSON bodies with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8], target: &mut T) -> Result<(), CodecError> {
        *target = serde_json::from_slice(body).map_err(CodecError::Json)?;
        Ok(())
    }
}

/// Decodes XML bodies with `quick-xml`.
#[cfg(feature = "xml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

#[cfg(feature = "xml")]
impl Codec for XmlCodec {
    fn name(&self) -> &'static str {
        "XML"
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8], target: &mut T) -> Result<(), CodecError> {
        *target = quick_xml::de::from_reader(body).map_err(CodecError::Xml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Person {
        id: u64,
        name: String,
    }

    #[test]
    fn raw_into_text_and_bytes() {
        let mut text = String::new();
        RawCodec.decode(b"OK!", &mut text).unwrap();
        assert_eq!(text, "OK!");

        let mut buf = Vec::<u8>::new();
        RawCodec.decode(b"OK!", &mut buf).unwrap();
        assert_eq!(buf, b"OK!");

        let mut bytes = Bytes::new();
        RawCodec.decode(b"OK!", &mut bytes).unwrap();
        assert_eq!(bytes, "OK!");
    }

    #[test]
    fn raw_rejects_invalid_utf8_text() {
        let mut text = String::new();
        let err = RawCodec.decode(&[0xff, 0xfe], &mut text).unwrap_err();

        assert!(matches!(err, CodecError::Utf8(_)));
        let msg = err.to_string();
        assert!(msg.contains("not valid UTF-8"), "{msg}");
        assert!(!msg.contains("can only be compared"), "{msg}");
        assert!(text.is_empty());
    }

    #[test]
    fn raw_rejects_structured_target() {
        let mut person = Person::default();
        let err = RawCodec.decode(b"{}", &mut person).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("not actix_test_api::codec::tests::Person"), "{msg}");
        assert_eq!(person, Person::default());
    }

    #[test]
    fn raw_dynamic_is_bytes() {
        let mut dynamic = Dynamic::default();
        RawCodec.decode_dynamic(b"null", &mut dynamic).unwrap();
        assert_eq!(dynamic, Dynamic::Bytes(b"null".to_vec()));

        let mut generic = Dynamic::default();
        RawCodec.decode(b"null", &mut generic).unwrap();
        assert_eq!(generic, dynamic);
    }

    #[test]
    fn json_decodes_structs() {
        let mut person = Person::default();
        JsonCodec
            .decode(br#"{"id":1,"name":"Bob"}"#, &mut person)
            .unwrap();
        assert_eq!(
            person,
            Person {
                id: 1,
                name: "Bob".to_owned()
            }
        );

        assert!(JsonCodec.decode(b"{", &mut person).is_err());
    }

    #[test]
    fn json_dynamic() {
        let mut dynamic = Dynamic::default();
        JsonCodec.decode_dynamic(b"[1, \"a\"]", &mut dynamic).unwrap();
        assert_eq!(
            dynamic,
            Dynamic::Seq(vec![Dynamic::Int(1), Dynamic::from("a")]),
        );
    }

    #[cfg(feature = "xml")]
    #[test]
    fn xml_decodes_structs() {
        let mut person = Person::default();
        XmlCodec
            .decode(b"<Person><id>42</id><name>Bob</name></Person>", &mut person)
            .unwrap();
        assert_eq!(person.id, 42);
        assert_eq!(person.name, "Bob");
    }
}
