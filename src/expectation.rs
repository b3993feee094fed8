//! Expected values, matchers and decode target resolution.

use std::{
    any::{self, TypeId},
    fmt,
    panic::Location,
};

use actix_web::http::StatusCode;
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{
    matcher::{compare_values, Matcher, Mismatch},
    Dynamic,
};

/// Matchers that tell the least about a body on their own.
const TRIVIAL_MATCHERS: &[&str] = &["Ignore", "NotEmpty"];

/// Types a response body can be decoded into.
///
/// `Default` provides the zero value a codec decodes into and `PartialEq` is used both for value
/// comparison and to detect that decoding left the target untouched.
pub trait Decodable: DeserializeOwned + Default + PartialEq + fmt::Debug + 'static {}

impl<T> Decodable for T where T: DeserializeOwned + Default + PartialEq + fmt::Debug + 'static {}

/// Runtime descriptor of a type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHint {
    id: TypeId,
    name: &'static str,
}

impl TypeHint {
    /// Describes `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// Describes `T` unless it is the [`Dynamic`] placeholder.
    pub fn declared<T: ?Sized + 'static>() -> Option<Self> {
        let hint = Self::of::<T>();
        (!hint.is_dynamic()).then_some(hint)
    }

    /// Returns true if this describes [`Dynamic`].
    pub fn is_dynamic(&self) -> bool {
        self.id == TypeId::of::<Dynamic>()
    }

    /// Type ID.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Type name, as given by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHint").field(&self.name).finish()
    }
}

impl fmt::Display for TypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// How the decode target type was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Type of a concrete expected value.
    Concrete,

    /// Type declared by a matcher.
    Declared,

    /// Matcher could not tell; the [`Dynamic`] placeholder is tried.
    Unknown,
}

/// Outcome of decode target resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Type the body is decoded into.
    pub target: TypeHint,

    /// How `target` was obtained.
    pub confidence: Confidence,

    /// Raw body should be displayed whatever the comparison outcome.
    pub show_raw_body: bool,
}

/// Expected value of an assertion: a concrete value or a matcher.
///
/// Concrete values are compared using `PartialEq`. Matchers are built with the functions in
/// [`matcher`](crate::matcher) or by wrapping any [`Matcher`] implementation with
/// [`Expectation::matcher`].
pub struct Expectation<T: 'static> {
    inner: Inner<T>,
}

enum Inner<T: 'static> {
    Value(T),
    Matcher {
        matcher: Box<dyn Matcher<T>>,
        location: &'static Location<'static>,
    },
}

impl<T: 'static> Expectation<T> {
    /// Expects exactly `val`.
    pub fn value(val: T) -> Self {
        Self {
            inner: Inner::Value(val),
        }
    }

    /// Expects a value accepted by `matcher`.
    #[track_caller]
    pub fn matcher(matcher: impl Matcher<T> + 'static) -> Self {
        Self {
            inner: Inner::Matcher {
                matcher: Box::new(matcher),
                location: Location::caller(),
            },
        }
    }

    /// Returns true if this wraps a matcher.
    pub fn is_matcher(&self) -> bool {
        matches!(self.inner, Inner::Matcher { .. })
    }

    /// Matcher name and the place it was built, e.g. `NotEmpty at tests/api.rs:12:9`.
    pub fn identity(&self) -> Option<String> {
        match &self.inner {
            Inner::Value(_) => None,
            Inner::Matcher { matcher, location } => {
                Some(format!("{} at {location}", matcher.name()))
            }
        }
    }

    /// Type declared by the matcher, if this wraps one and it is not over [`Dynamic`].
    pub fn type_behind(&self) -> Option<TypeHint> {
        match self.inner {
            Inner::Value(_) => None,
            Inner::Matcher { .. } => TypeHint::declared::<T>(),
        }
    }

    /// Decides which type a response body is decoded into before being compared to this
    /// expectation.
    ///
    /// The target is always `T`; only the way it was obtained differs. `status_failed` tells
    /// whether the status assertion of the same response already failed; trivial matchers then ask
    /// for the raw body to be shown.
    pub fn resolve(&self, status_failed: bool) -> Resolution {
        let target = TypeHint::of::<T>();

        match &self.inner {
            Inner::Value(_) => Resolution {
                target,
                confidence: Confidence::Concrete,
                show_raw_body: false,
            },

            Inner::Matcher { matcher, .. } => match self.type_behind() {
                Some(_) => Resolution {
                    target,
                    confidence: Confidence::Declared,
                    show_raw_body: false,
                },

                None => Resolution {
                    target,
                    confidence: Confidence::Unknown,
                    show_raw_body: status_failed && TRIVIAL_MATCHERS.contains(&matcher.name()),
                },
            },
        }
    }

    /// Short name of the matcher, if any.
    pub(crate) fn matcher_name(&self) -> Option<&'static str> {
        match &self.inner {
            Inner::Value(_) => None,
            Inner::Matcher { matcher, .. } => Some(matcher.name()),
        }
    }
}

impl<T: PartialEq + fmt::Debug + 'static> Expectation<T> {
    /// Compares `got` to this expectation.
    pub fn compare(&self, got: &T) -> Result<(), Mismatch> {
        match &self.inner {
            Inner::Value(expected) => compare_values(got, expected),
            Inner::Matcher { matcher, location } => matcher.check(got).map_err(|mismatch| {
                Mismatch::new(
                    mismatch.summary(),
                    mismatch.got(),
                    format!("{} [{} at {location}]", mismatch.expected(), matcher.name()),
                )
            }),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for Expectation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Value(val) => f.debug_tuple("Value").field(val).finish(),
            Inner::Matcher { matcher, location } => f
                .debug_struct("Matcher")
                .field("matcher", matcher)
                .field("location", location)
                .finish(),
        }
    }
}

impl<T: 'static> From<T> for Expectation<T> {
    fn from(val: T) -> Self {
        Expectation::value(val)
    }
}

impl From<StatusCode> for Expectation<u16> {
    fn from(status: StatusCode) -> Self {
        Expectation::value(status.as_u16())
    }
}

/// Things accepted as the expected body of structured (JSON, XML, ...) body assertions.
///
/// Implemented for every [`Decodable`] value and for [`Expectation`]s.
pub trait Expect {
    /// Type the body is decoded into.
    type Target: Decodable;

    /// Converts into an expectation.
    fn into_expectation(self) -> Expectation<Self::Target>;
}

impl<T: Decodable> Expect for T {
    type Target = T;

    fn into_expectation(self) -> Expectation<T> {
        Expectation::value(self)
    }
}

impl<T: Decodable> Expect for Expectation<T> {
    type Target = T;

    fn into_expectation(self) -> Expectation<T> {
        self
    }
}

/// Types a raw, undecoded body can be compared as.
pub trait RawBody: Decodable + sealed::Sealed {}

impl RawBody for String {}
impl RawBody for Vec<u8> {}
impl RawBody for Bytes {}
impl RawBody for Dynamic {}

mod sealed {
    pub trait Sealed {}

    impl Sealed for String {}
    impl Sealed for Vec<u8> {}
    impl Sealed for bytes::Bytes {}
    impl Sealed for crate::Dynamic {}
}

/// Things accepted as the expected body of [`cmp_body`](crate::TestApi::cmp_body).
///
/// Text, bytes and raw body expectations compare the body as-is. `None::<&str>` expects no body at
/// all, like [`no_body`](crate::TestApi::no_body).
pub trait RawExpect {
    /// Type the raw body is read as.
    type Target: RawBody;

    /// Converts into an expectation; `None` means the body must be empty.
    fn into_raw_expectation(self) -> Option<Expectation<Self::Target>>;
}

impl RawExpect for &str {
    type Target = String;

    fn into_raw_expectation(self) -> Option<Expectation<String>> {
        Some(Expectation::value(self.to_owned()))
    }
}

impl RawExpect for String {
    type Target = String;

    fn into_raw_expectation(self) -> Option<Expectation<String>> {
        Some(Expectation::value(self))
    }
}

impl RawExpect for &[u8] {
    type Target = Vec<u8>;

    fn into_raw_expectation(self) -> Option<Expectation<Vec<u8>>> {
        Some(Expectation::value(self.to_vec()))
    }
}

impl<const N: usize> RawExpect for &[u8; N] {
    type Target = Vec<u8>;

    fn into_raw_expectation(self) -> Option<Expectation<Vec<u8>>> {
        Some(Expectation::value(self.to_vec()))
    }
}

impl RawExpect for Vec<u8> {
    type Target = Vec<u8>;

    fn into_raw_expectation(self) -> Option<Expectation<Vec<u8>>> {
        Some(Expectation::value(self))
    }
}

impl RawExpect for Bytes {
    type Target = Bytes;

    fn into_raw_expectation(self) -> Option<Expectation<Bytes>> {
        Some(Expectation::value(self))
    }
}

impl<T: RawBody> RawExpect for Expectation<T> {
    type Target = T;

    fn into_raw_expectation(self) -> Option<Expectation<T>> {
        Some(self)
    }
}

impl RawExpect for Option<&str> {
    type Target = String;

    fn into_raw_expectation(self) -> Option<Expectation<String>> {
        self.and_then(RawExpect::into_raw_expectation)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::matcher;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Person {
        id: u64,
        name: String,
    }

    static_assertions::assert_impl_all!(Person: Expect, Decodable);
    static_assertions::assert_impl_all!(Expectation<Person>: Expect);
    static_assertions::assert_impl_all!(&'static str: RawExpect);
    static_assertions::assert_not_impl_any!(Expectation<Person>: Decodable);

    #[test]
    fn concrete_value_resolves_to_own_type() {
        let res = Person::default().into_expectation().resolve(false);

        assert_eq!(res.target, TypeHint::of::<Person>());
        assert_eq!(res.confidence, Confidence::Concrete);
        assert!(!res.show_raw_body);
    }

    #[test]
    fn declared_matcher_type_is_used() {
        let res = matcher::satisfies("named", |p: &Person| !p.name.is_empty()).resolve(true);

        assert_eq!(res.target, TypeHint::of::<Person>());
        assert_eq!(res.confidence, Confidence::Declared);
        assert!(!res.show_raw_body);
    }

    #[test]
    fn undeclared_matcher_falls_back_to_dynamic() {
        let res = matcher::not_empty().resolve(false);

        assert!(res.target.is_dynamic());
        assert_eq!(res.confidence, Confidence::Unknown);
        assert!(!res.show_raw_body);
    }

    #[test]
    fn trivial_matchers_show_raw_body_when_status_failed() {
        assert!(matcher::ignore().resolve(true).show_raw_body);
        assert!(matcher::not_empty().resolve(true).show_raw_body);
    }

    #[test]
    fn identity_includes_location() {
        let exp = matcher::ignore();
        let identity = exp.identity().unwrap();

        assert!(identity.starts_with("Ignore at "), "{identity}");
        assert!(identity.contains("expectation.rs"), "{identity}");
        assert_eq!(Expectation::value(1).identity(), None);
    }

    #[test]
    fn matcher_mismatch_names_the_matcher() {
        let err = matcher::contains("OK").compare(&"ko".to_owned()).unwrap_err();
        assert!(err.expected().contains("[Contains at "), "{err}");
    }

    #[test]
    fn raw_expectations() {
        assert!(None::<&str>.into_raw_expectation().is_none());
        assert!(Some("x").into_raw_expectation().is_some());

        let exp = b"OK!".into_raw_expectation().unwrap();
        assert!(exp.compare(&b"OK!".to_vec()).is_ok());
    }

    #[test]
    fn status_code_converts() {
        let exp = Expectation::<u16>::from(StatusCode::CREATED);
        assert!(exp.compare(&201).is_ok());
    }
}
