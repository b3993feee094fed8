//! Fluent request/response assertions for testing Actix Web services.
//!
//! # What Is This Crate?
//! [`TestApi`] wraps a service built with [`actix_web::test::init_service`], sends it requests and
//! lets you chain assertions over the status code, headers and body of each response. Body
//! assertions decode the body into the type of the expected value (or the type a matcher declares)
//! before comparing, and explain themselves when decoding goes wrong.
//!
//! ```
//! use actix_test_api::{matcher, TestApi};
//! use actix_web::{test, web, App, HttpResponse};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, PartialEq, Deserialize)]
//! struct Person {
//!     id: u64,
//!     name: String,
//! }
//!
//! # actix_web::rt::System::new().block_on(async {
//! let app = test::init_service(App::new().route(
//!     "/person",
//!     web::post().to(|| async { HttpResponse::Created().json(serde_json::json!({ "id": 1, "name": "Bob" })) }),
//! ))
//! .await;
//!
//! let mut api = TestApi::new(app);
//!
//! api.post_json("/person", serde_json::json!({ "name": "Bob" }))
//!     .await
//!     .cmp_status(201)
//!     .cmp_header(matcher::header_is("content-type", "application/json"))
//!     .cmp_json_body(Person { id: 1, name: "Bob".to_owned() });
//!
//! assert!(!api.failed());
//! # });
//! ```
//!
//! # Reporting
//! Failures are sent to a [`Reporter`]. The default one, [`Collector`], records them and panics
//! when dropped if any were left unread, failing the test only once all chained assertions ran.
//!
//! # Crate Features
//! - `xml`: XML request builders, [`XmlCodec`] and [`TestApi::cmp_xml_body`].

#![deny(rust_2018_idioms, nonstandard_style)]
#![warn(future_incompatible, missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod body;
mod codec;
mod diagnostic;
mod dynamic;
mod error;
mod expectation;
mod headers;
mod report;
mod test_api;
mod test_request_macros;

// public API
pub mod matcher;
pub mod request;

#[cfg(feature = "xml")]
pub use self::codec::XmlCodec;
pub use self::{
    codec::{Codec, JsonCodec, RawCodec},
    diagnostic::format_raw_body,
    dynamic::Dynamic,
    error::{AssertionError, CodecError},
    expectation::{
        Confidence, Decodable, Expect, Expectation, RawBody, RawExpect, Resolution, TypeHint,
    },
    headers::ResponseHeaders,
    matcher::{Matcher, Mismatch},
    report::{Collector, Failure, Note, Report, Reporter},
    test_api::{Dispatch, TestApi},
};

// private re-exports for macros
#[doc(hidden)]
pub mod __reexports {
    pub use ::serde_json;
}

pub(crate) type BoxError = Box<dyn std::error::Error>;
