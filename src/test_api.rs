use std::{fmt, time::SystemTime};

use actix_http::Request;
use actix_service::Service;
use actix_web::{
    body::{self, MessageBody},
    dev::ServiceResponse,
    http::{Method, StatusCode},
    test::TestRequest,
    web::Bytes,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    body::{BodyCheck, BODY_ROOT, EMPTY_ROOT},
    diagnostic::format_raw_body,
    expectation::Decodable,
    matcher::Mismatch,
    report::{Failure, Note},
    request, AssertionError, BoxError, Codec, Collector, Expect, Expectation, JsonCodec, RawCodec,
    RawExpect, Report, Reporter, ResponseHeaders,
};

const REQUEST_ROOT: &str = "Request";
const STATUS_ROOT: &str = "Response.Status";
const HEADER_ROOT: &str = "Response.Header";

/// A captured response of the service under test.
#[derive(Debug, Clone)]
pub struct Dispatch {
    status: StatusCode,
    headers: ResponseHeaders,
    body: Bytes,
}

impl Dispatch {
    /// Response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    /// Fully buffered response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Fluent assertions over the responses of an Actix Web service.
///
/// Each request replaces the previous response and resets the failure state. Assertion methods
/// report through the context's [`Reporter`] and always return the context so further assertions
/// still run after a failure.
///
/// # Examples
/// ```
/// use actix_test_api::TestApi;
/// use actix_web::{test, web, App, HttpResponse};
///
/// # actix_web::rt::System::new().block_on(async {
/// let app = test::init_service(
///     App::new().route("/test", web::get().to(|| async { HttpResponse::Ok().body("OK!") })),
/// )
/// .await;
///
/// let mut api = TestApi::new(app);
///
/// api.get("/test").await.cmp_status(200).cmp_body("OK!");
/// assert!(!api.failed());
/// # });
/// ```
pub struct TestApi<S, R = Collector> {
    app: S,
    reporter: R,
    name: String,
    dispatch: Option<Dispatch>,
    sent_at: Option<SystemTime>,
    status_failed: bool,
    header_failed: bool,
    body_failed: bool,
}

impl<S> TestApi<S> {
    /// Constructs new test context around `app`, reporting to a [`Collector`].
    pub fn new(app: S) -> Self {
        Self::with_reporter(app, Collector::new())
    }

    /// Removes and returns every failure and note recorded so far.
    ///
    /// Once taken, recorded failures no longer make the collector panic on drop.
    pub fn take_report(&mut self) -> Report {
        self.reporter.take()
    }
}

impl<S, R> TestApi<S, R> {
    /// Constructs new test context around `app`, reporting to `reporter`.
    pub fn with_reporter(app: S, reporter: R) -> Self {
        Self {
            app,
            reporter,
            name: String::new(),
            dispatch: None,
            sent_at: None,
            status_failed: false,
            header_failed: false,
            body_failed: false,
        }
    }

    /// Sets the prefix of the names of the following assertions. An empty prefix removes it.
    pub fn name(&mut self, prefix: impl fmt::Display) -> &mut Self {
        self.name = prefix.to_string();

        if !self.name.is_empty() {
            self.name.push_str(": ");
        }

        self
    }

    /// Returns true if any assertion failed since the last request.
    pub fn failed(&self) -> bool {
        self.status_failed || self.header_failed || self.body_failed
    }

    /// Time the last request was sent, if any.
    ///
    /// Useful to bound time based expectations, e.g. a creation date being between this time and
    /// now.
    pub fn sent_at(&self) -> Option<SystemTime> {
        self.sent_at
    }

    /// Response to the last request, if any.
    pub fn response(&self) -> Option<&Dispatch> {
        self.dispatch.as_ref()
    }

    /// Returns reference to the reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Returns mutable reference to the reporter.
    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }
}

/// Captured response of the current assertion, with the means to report about it.
struct Sent<'a, R> {
    dispatch: &'a Dispatch,
    reporter: &'a mut R,
    prefix: &'a str,
}

impl<R: Reporter> Sent<'_, R> {
    fn fail(&mut self, root: &'static str, name: &str, error: AssertionError) {
        report_failure(self.reporter, self.prefix, root, name, error);
    }
}

fn report_failure<R: Reporter>(
    reporter: &mut R,
    prefix: &str,
    root: &'static str,
    name: &str,
    error: AssertionError,
) {
    reporter.fail(Failure::new(root, format!("{prefix}{name}"), error));
}

impl<S, R: Reporter> TestApi<S, R> {
    /// Borrows the current dispatch, failing the calling assertion if there is none.
    fn check_request_sent(&mut self) -> Option<Sent<'_, R>> {
        match &self.dispatch {
            Some(dispatch) => Some(Sent {
                dispatch,
                reporter: &mut self.reporter,
                prefix: &self.name,
            }),

            None => {
                report_failure(
                    &mut self.reporter,
                    &self.name,
                    REQUEST_ROOT,
                    "request is sent",
                    AssertionError::DispatchMissing,
                );
                None
            }
        }
    }

    /// Checks the response status code.
    ///
    /// Accepts a `u16`, a [`StatusCode`] or an `Expectation<u16>` such as
    /// [`matcher::between`](crate::matcher::between).
    pub fn cmp_status(&mut self, expected: impl Into<Expectation<u16>>) -> &mut Self {
        let expected = expected.into();

        self.status_failed = match self.check_request_sent() {
            None => true,
            Some(mut sent) => match expected.compare(&sent.dispatch.status.as_u16()) {
                Ok(()) => false,
                Err(mismatch) => {
                    sent.fail(
                        STATUS_ROOT,
                        "status code should match",
                        AssertionError::Mismatch(mismatch),
                    );
                    true
                }
            },
        };

        self
    }

    /// Checks the response headers.
    ///
    /// A [`ResponseHeaders`] value must match all headers exactly; use
    /// [`matcher::header_is`](crate::matcher::header_is) or
    /// [`matcher::has_header`](crate::matcher::has_header) to check only some of them.
    pub fn cmp_header(&mut self, expected: impl Into<Expectation<ResponseHeaders>>) -> &mut Self {
        let expected = expected.into();

        self.header_failed = match self.check_request_sent() {
            None => true,
            Some(mut sent) => match expected.compare(&sent.dispatch.headers) {
                Ok(()) => false,
                Err(mismatch) => {
                    sent.fail(
                        HEADER_ROOT,
                        "header should match",
                        AssertionError::Mismatch(mismatch),
                    );
                    true
                }
            },
        };

        self
    }

    /// Shared body assertion. Returns true on failure.
    fn cmp_decoded_body<T: Decodable, C: Codec>(
        &mut self,
        entry_point: &'static str,
        accept_empty: bool,
        codec: &C,
        expected: &Expectation<T>,
    ) -> bool {
        let check = BodyCheck {
            entry_point,
            accept_empty,
            codec,
            status_failed: self.status_failed,
        };

        let Some(mut sent) = self.check_request_sent() else {
            return true;
        };

        let verdict = crate::body::verify(&check, &sent.dispatch.body, expected);
        let failed = !verdict.passed();

        if let Some(res) = &verdict.resolution {
            debug!(
                entry_point,
                target = %res.target,
                confidence = ?res.confidence,
                failed,
                "body compared",
            );
        }

        if let Some((root, name, error)) = verdict.failure {
            sent.fail(root, name, error);
        }

        verdict
            .diagnostics
            .emit(sent.reporter, BODY_ROOT, &sent.dispatch.body);

        failed
    }

    /// Checks the raw response body.
    ///
    /// Accepts text, bytes, or an expectation over `String`, `Vec<u8>`, [`Bytes`] or
    /// [`Dynamic`](crate::Dynamic). An empty body is a valid one here; `None::<&str>` expects no
    /// body at all, like [`no_body`](Self::no_body).
    pub fn cmp_body(&mut self, expected: impl RawExpect) -> &mut Self {
        match expected.into_raw_expectation() {
            None => self.no_body(),
            Some(expected) => {
                self.body_failed = self.cmp_decoded_body("cmp_body", true, &RawCodec, &expected);
                self
            }
        }
    }

    /// Checks the response body once decoded as JSON.
    ///
    /// The body is decoded into the type of `expected`, or into the type declared by its matcher.
    /// The body must not be empty.
    pub fn cmp_json_body(&mut self, expected: impl Expect) -> &mut Self {
        let expected = expected.into_expectation();
        self.body_failed = self.cmp_decoded_body("cmp_json_body", false, &JsonCodec, &expected);
        self
    }

    /// Checks the response body once decoded as XML. The body must not be empty.
    #[cfg(feature = "xml")]
    pub fn cmp_xml_body(&mut self, expected: impl Expect) -> &mut Self {
        let expected = expected.into_expectation();
        self.body_failed =
            self.cmp_decoded_body("cmp_xml_body", false, &crate::XmlCodec, &expected);
        self
    }

    /// Checks the response body once decoded with `codec`. The body must not be empty.
    pub fn cmp_marshaled_body<C: Codec>(&mut self, codec: C, expected: impl Expect) -> &mut Self {
        let expected = expected.into_expectation();
        self.body_failed = self.cmp_decoded_body("cmp_marshaled_body", false, &codec, &expected);
        self
    }

    /// Checks that the response has no body.
    pub fn no_body(&mut self) -> &mut Self {
        self.body_failed = match self.check_request_sent() {
            None => true,
            Some(sent) if sent.dispatch.body.is_empty() => false,
            Some(mut sent) => {
                let got = format_raw_body(&sent.dispatch.body);
                sent.fail(
                    BODY_ROOT,
                    "body should be empty",
                    AssertionError::Mismatch(Mismatch::new("not empty", got, "empty")),
                );
                true
            }
        };

        self
    }
}

impl<S, B, R> TestApi<S, R>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
    R: Reporter,
{
    /// Sends `req` to the service and captures the whole response.
    ///
    /// Failure state is reset and the previous response is discarded. Service errors are turned
    /// into responses the same way the Actix Web server does.
    ///
    /// This is the way to send request headers: the verb helpers only take a target and a body.
    ///
    /// # Examples
    /// ```
    /// use actix_test_api::{request, TestApi};
    /// use actix_web::{test, web, App, HttpRequest, HttpResponse};
    ///
    /// async fn whoami(req: HttpRequest) -> HttpResponse {
    ///     let user = req.headers().get("x-user").cloned();
    ///     HttpResponse::Ok().body(user.map(|val| val.as_bytes().to_vec()).unwrap_or_default())
    /// }
    ///
    /// # actix_web::rt::System::new().block_on(async {
    /// let app = test::init_service(App::new().route("/whoami", web::get().to(whoami))).await;
    /// let mut api = TestApi::new(app);
    ///
    /// api.request(request::get("/whoami").insert_header(("x-user", "bob")))
    ///     .await
    ///     .cmp_body("bob");
    /// assert!(!api.failed());
    /// # });
    /// ```
    pub async fn request(&mut self, req: TestRequest) -> &mut Self {
        self.status_failed = false;
        self.header_failed = false;
        self.body_failed = false;
        self.dispatch = None;

        let req = req.to_request();
        debug!(method = %req.method(), uri = %req.uri(), "sending request");

        self.sent_at = Some(SystemTime::now());

        let (status, headers, body) = match self.app.call(req).await {
            Ok(res) => {
                let headers = ResponseHeaders::from_header_map(res.headers());
                (res.status(), headers, buffer(res.into_body()).await)
            }

            Err(err) => {
                debug!(%err, "service returned error; rendering it as a response");

                let res = err.error_response();
                let headers = ResponseHeaders::from_header_map(res.headers());
                (res.status(), headers, buffer(res.into_body()).await)
            }
        };

        let body = body.unwrap_or_else(|err| {
            warn!(%err, "failed to buffer response body");
            self.reporter.note(Note::new(
                EMPTY_ROOT,
                format!("cannot read body, considered empty: {err}"),
            ));
            Bytes::new()
        });

        debug!(%status, body_len = body.len(), "captured response");

        self.dispatch = Some(Dispatch {
            status,
            headers,
            body,
        });

        self
    }

    /// Sends a `GET` request.
    ///
    /// To add request headers, build the request with [`request::get`](crate::request::get)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn get(&mut self, target: &str) -> &mut Self {
        self.request(request::get(target)).await
    }

    /// Sends a `HEAD` request.
    ///
    /// To add request headers, build the request with [`request::head`](crate::request::head)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn head(&mut self, target: &str) -> &mut Self {
        self.request(request::head(target)).await
    }

    /// Sends a `POST` request with a raw body.
    ///
    /// To add request headers, build the request with [`request::post`](crate::request::post)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn post(&mut self, target: &str, body: impl Into<Bytes>) -> &mut Self {
        self.request(request::post(target, body)).await
    }

    /// Sends a `POST` request with a URL encoded form body.
    ///
    /// To add request headers, build the request with [`request::post_form`](crate::request::post_form)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn post_form(&mut self, target: &str, form: impl Serialize) -> &mut Self {
        self.request(request::post_form(target, form)).await
    }

    /// Sends a `PUT` request with a raw body.
    ///
    /// To add request headers, build the request with [`request::put`](crate::request::put)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn put(&mut self, target: &str, body: impl Into<Bytes>) -> &mut Self {
        self.request(request::put(target, body)).await
    }

    /// Sends a `PATCH` request with a raw body.
    ///
    /// To add request headers, build the request with [`request::patch`](crate::request::patch)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn patch(&mut self, target: &str, body: impl Into<Bytes>) -> &mut Self {
        self.request(request::patch(target, body)).await
    }

    /// Sends a `DELETE` request with a raw body.
    ///
    /// To add request headers, build the request with [`request::delete`](crate::request::delete)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn delete(&mut self, target: &str, body: impl Into<Bytes>) -> &mut Self {
        self.request(request::delete(target, body)).await
    }

    /// Sends a request with a JSON body.
    ///
    /// To add request headers, build the request with [`request::new_json_request`](crate::request::new_json_request)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn new_json_request(
        &mut self,
        method: Method,
        target: &str,
        body: impl Serialize,
    ) -> &mut Self {
        self.request(request::new_json_request(method, target, body))
            .await
    }

    /// Sends a `POST` request with a JSON body.
    ///
    /// To add request headers, build the request with [`request::post_json`](crate::request::post_json)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn post_json(&mut self, target: &str, body: impl Serialize) -> &mut Self {
        self.request(request::post_json(target, body)).await
    }

    /// Sends a `PUT` request with a JSON body.
    ///
    /// To add request headers, build the request with [`request::put_json`](crate::request::put_json)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn put_json(&mut self, target: &str, body: impl Serialize) -> &mut Self {
        self.request(request::put_json(target, body)).await
    }

    /// Sends a `PATCH` request with a JSON body.
    ///
    /// To add request headers, build the request with [`request::patch_json`](crate::request::patch_json)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn patch_json(&mut self, target: &str, body: impl Serialize) -> &mut Self {
        self.request(request::patch_json(target, body)).await
    }

    /// Sends a `DELETE` request with a JSON body.
    ///
    /// To add request headers, build the request with [`request::delete_json`](crate::request::delete_json)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    pub async fn delete_json(&mut self, target: &str, body: impl Serialize) -> &mut Self {
        self.request(request::delete_json(target, body)).await
    }

    /// Sends a request with an XML body.
    ///
    /// To add request headers, build the request with [`request::new_xml_request`](crate::request::new_xml_request)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    #[cfg(feature = "xml")]
    pub async fn new_xml_request(
        &mut self,
        method: Method,
        target: &str,
        body: impl Serialize,
    ) -> &mut Self {
        self.request(request::new_xml_request(method, target, body))
            .await
    }

    /// Sends a `POST` request with an XML body.
    ///
    /// To add request headers, build the request with [`request::post_xml`](crate::request::post_xml)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    #[cfg(feature = "xml")]
    pub async fn post_xml(&mut self, target: &str, body: impl Serialize) -> &mut Self {
        self.request(request::post_xml(target, body)).await
    }

    /// Sends a `PUT` request with an XML body.
    ///
    /// To add request headers, build the request with [`request::put_xml`](crate::request::put_xml)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    #[cfg(feature = "xml")]
    pub async fn put_xml(&mut self, target: &str, body: impl Serialize) -> &mut Self {
        self.request(request::put_xml(target, body)).await
    }

    /// Sends a `PATCH` request with an XML body.
    ///
    /// To add request headers, build the request with [`request::patch_xml`](crate::request::patch_xml)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    #[cfg(feature = "xml")]
    pub async fn patch_xml(&mut self, target: &str, body: impl Serialize) -> &mut Self {
        self.request(request::patch_xml(target, body)).await
    }

    /// Sends a `DELETE` request with an XML body.
    ///
    /// To add request headers, build the request with [`request::delete_xml`](crate::request::delete_xml)
    /// and send it with [`request`](Self::request) after calling `insert_header` on it.
    #[cfg(feature = "xml")]
    pub async fn delete_xml(&mut self, target: &str, body: impl Serialize) -> &mut Self {
        self.request(request::delete_xml(target, body)).await
    }
}

impl<S, R: fmt::Debug> fmt::Debug for TestApi<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestApi")
            .field("reporter", &self.reporter)
            .field("name", &self.name)
            .field("dispatch", &self.dispatch)
            .field("sent_at", &self.sent_at)
            .field("status_failed", &self.status_failed)
            .field("header_failed", &self.header_failed)
            .field("body_failed", &self.body_failed)
            .finish_non_exhaustive()
    }
}

async fn buffer<B: MessageBody>(body: B) -> Result<Bytes, BoxError> {
    body::to_bytes(body).await.map_err(Into::into)
}
