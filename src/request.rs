//! Request builders.
//!
//! Each function returns an [`actix_web::test::TestRequest`] that can be further customized (extra
//! headers, cookies, peer address, ...) before being sent with
//! [`TestApi::request`](crate::TestApi::request).
//!
//! ```
//! use actix_test_api::request;
//! use actix_web::http::header;
//!
//! let _req = request::get("/person/42").insert_header((header::ACCEPT, "application/json"));
//! ```

use actix_web::{http::Method, test::TestRequest, web::Bytes};
use serde::Serialize;

/// Creates a request with `method` to `target`, without a body.
pub fn new_request(method: Method, target: &str) -> TestRequest {
    TestRequest::default().method(method).uri(target)
}

/// Creates a `GET` request.
pub fn get(target: &str) -> TestRequest {
    new_request(Method::GET, target)
}

/// Creates a `HEAD` request.
pub fn head(target: &str) -> TestRequest {
    new_request(Method::HEAD, target)
}

/// Creates a `POST` request with a raw body.
pub fn post(target: &str, body: impl Into<Bytes>) -> TestRequest {
    new_request(Method::POST, target).set_payload(body)
}

/// Creates a `POST` request with a URL encoded form body.
pub fn post_form(target: &str, form: impl Serialize) -> TestRequest {
    new_request(Method::POST, target).set_form(form)
}

/// Creates a `PUT` request with a raw body.
pub fn put(target: &str, body: impl Into<Bytes>) -> TestRequest {
    new_request(Method::PUT, target).set_payload(body)
}

/// Creates a `PATCH` request with a raw body.
pub fn patch(target: &str, body: impl Into<Bytes>) -> TestRequest {
    new_request(Method::PATCH, target).set_payload(body)
}

/// Creates a `DELETE` request with a raw body, which is usually empty.
pub fn delete(target: &str, body: impl Into<Bytes>) -> TestRequest {
    new_request(Method::DELETE, target).set_payload(body)
}

/// Creates a request with a JSON body and the matching `Content-Type` header.
///
/// # Panics
/// Panics if `body` cannot be serialized to JSON.
pub fn new_json_request(method: Method, target: &str, body: impl Serialize) -> TestRequest {
    new_request(method, target).set_json(body)
}

/// Creates a `POST` request with a JSON body.
pub fn post_json(target: &str, body: impl Serialize) -> TestRequest {
    new_json_request(Method::POST, target, body)
}

/// Creates a `PUT` request with a JSON body.
pub fn put_json(target: &str, body: impl Serialize) -> TestRequest {
    new_json_request(Method::PUT, target, body)
}

/// Creates a `PATCH` request with a JSON body.
pub fn patch_json(target: &str, body: impl Serialize) -> TestRequest {
    new_json_request(Method::PATCH, target, body)
}

/// Creates a `DELETE` request with a JSON body.
pub fn delete_json(target: &str, body: impl Serialize) -> TestRequest {
    new_json_request(Method::DELETE, target, body)
}

/// Creates a request with an XML body and the matching `Content-Type` header.
///
/// # Panics
/// Panics if `body` cannot be serialized to XML, e.g. when it is not a struct or a map.
#[cfg(feature = "xml")]
pub fn new_xml_request(method: Method, target: &str, body: impl Serialize) -> TestRequest {
    use actix_web::http::header;

    let xml = quick_xml::se::to_string(&body)
        .unwrap_or_else(|err| panic!("Failed to serialize test data to XML: {err}"));

    new_request(method, target)
        .insert_header((header::CONTENT_TYPE, "application/xml"))
        .set_payload(xml)
}

/// Creates a `POST` request with an XML body.
#[cfg(feature = "xml")]
pub fn post_xml(target: &str, body: impl Serialize) -> TestRequest {
    new_xml_request(Method::POST, target, body)
}

/// Creates a `PUT` request with an XML body.
#[cfg(feature = "xml")]
pub fn put_xml(target: &str, body: impl Serialize) -> TestRequest {
    new_xml_request(Method::PUT, target, body)
}

/// Creates a `PATCH` request with an XML body.
#[cfg(feature = "xml")]
pub fn patch_xml(target: &str, body: impl Serialize) -> TestRequest {
    new_xml_request(Method::PATCH, target, body)
}

/// Creates a `DELETE` request with an XML body.
#[cfg(feature = "xml")]
pub fn delete_xml(target: &str, body: impl Serialize) -> TestRequest {
    new_xml_request(Method::DELETE, target, body)
}
