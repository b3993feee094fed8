/// Create a `TestRequest` using a DSL that looks kinda like on-the-wire HTTP/1.x requests.
///
/// Headers go after the first `;`, the body after the second one. The body is one of:
/// - `@json` followed by a [`serde_json::json!`] payload;
/// - `@form` followed by any `Serialize` expression, sent URL encoded;
/// - `@raw` followed by any expression convertible into `Bytes`.
///
/// # Examples
/// ```
/// use actix_test_api::test_request;
/// use actix_web::test::TestRequest;
///
/// let _req: TestRequest = test_request! {
///     POST "/person";
///     "Accept" => "application/json"
///     "X-Request-Id" => "42";
///     @json { "name": "Bob" }
/// };
///
/// let _req: TestRequest = test_request! {
///     POST "/login";
///     @form [("user", "bob")]
/// };
///
/// let _req: TestRequest = test_request! {
///     PUT "/person/42/avatar";
///     "Content-Type" => "image/png";
///     @raw vec![0x89, b'P', b'N', b'G']
/// };
/// ```
#[macro_export]
macro_rules! test_request {
    ($method:ident $uri:expr) => {{
        ::actix_web::test::TestRequest::default()
            .method(::actix_web::http::Method::$method)
            .uri($uri)
    }};

    ($method:ident $uri:expr; $($hdr_name:expr => $hdr_val:expr)+) => {{
        $crate::test_request!($method $uri)
            $(
                .insert_header(($hdr_name, $hdr_val))
            )+
    }};

    ($method:ident $uri:expr; @json $payload:tt) => {{
        $crate::test_request!($method $uri)
            .set_json($crate::__reexports::serde_json::json!($payload))
    }};

    ($method:ident $uri:expr; @form $payload:expr) => {{
        $crate::test_request!($method $uri).set_form($payload)
    }};

    ($method:ident $uri:expr; @raw $payload:expr) => {{
        $crate::test_request!($method $uri).set_payload($payload)
    }};

    ($method:ident $uri:expr; $($hdr_name:expr => $hdr_val:expr)+; @json $payload:tt) => {{
        $crate::test_request!($method $uri; $($hdr_name => $hdr_val)+)
            .set_json($crate::__reexports::serde_json::json!($payload))
    }};

    ($method:ident $uri:expr; $($hdr_name:expr => $hdr_val:expr)+; @form $payload:expr) => {{
        $crate::test_request!($method $uri; $($hdr_name => $hdr_val)+)
            .set_form($payload)
    }};

    ($method:ident $uri:expr; $($hdr_name:expr => $hdr_val:expr)+; @raw $payload:expr) => {{
        $crate::test_request!($method $uri; $($hdr_name => $hdr_val)+)
            .set_payload($payload)
    }};
}
