//! Assertion and decoding errors.

use derive_more::{Display, Error};

use crate::matcher::Mismatch;

/// Reason an assertion did not pass.
///
/// Assertion errors are never returned to the caller of an assertion method; they are handed to
/// the active [`Reporter`](crate::Reporter) wrapped in a [`Failure`](crate::Failure).
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum AssertionError {
    /// A status, header or body assertion ran before any request was sent.
    #[display("request not sent! A request must be sent before testing status, header or body")]
    DispatchMissing,

    /// A body assertion that needs content found an empty response body.
    #[display("response body is empty! Body cannot be empty when using {entry_point}")]
    EmptyBodyRejected {
        /// Public assertion method that rejected the empty body.
        #[error(not(source))]
        entry_point: &'static str,
    },

    /// The codec could not decode the response body into the resolved target type.
    #[display("cannot decode response body into {target}: {source}")]
    Decode {
        /// Name of the type the body was decoded into.
        #[error(not(source))]
        target: &'static str,

        /// Underlying codec error.
        source: CodecError,
    },

    /// The decoded value did not satisfy the expectation.
    #[display("{_0}")]
    Mismatch(#[error(source)] Mismatch),
}

/// Error produced by a [`Codec`](crate::Codec) while decoding a response body.
#[derive(Debug, Display, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Raw body could not be turned into the target.
    #[display("{_0}")]
    Raw(#[error(source)] serde::de::value::Error),

    /// Raw body is not valid UTF-8 but was compared as text.
    #[display("body is not valid UTF-8: {_0}")]
    Utf8(#[error(source)] std::str::Utf8Error),

    /// JSON deserialization failed.
    #[display("{_0}")]
    Json(#[error(source)] serde_json::Error),

    /// XML deserialization failed.
    #[cfg(feature = "xml")]
    #[display("{_0}")]
    Xml(#[error(source)] quick_xml::DeError),

    /// Error reported by a caller-supplied codec.
    #[display("{_0}")]
    Custom(#[error(not(source))] String),
}

impl CodecError {
    /// Creates an error for a caller-supplied codec.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}
