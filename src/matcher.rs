//! Matchers: comparison objects usable in place of a concrete expected value.
//!
//! Any [`Matcher`] can be wrapped with [`Expectation::matcher`]. The constructors in this module do
//! that already and record where they were called from, so diagnostics can point at the test line.
//!
//! ```
//! use actix_test_api::matcher;
//!
//! let _status = matcher::between(200_u16, 202);
//! let _body = matcher::contains("OK");
//! let _anything = matcher::not_empty();
//! ```

use std::fmt;

use derive_more::{Display, Error};

use crate::{Dynamic, Expectation, ResponseHeaders};

/// A comparison object that checks values of type `T`.
///
/// `T` is the type the matcher declares: the response body is decoded into it. A matcher with no
/// idea what the value looks like implements `Matcher<Dynamic>`.
pub trait Matcher<T: 'static>: fmt::Debug {
    /// Short identifying name, e.g. `NotEmpty`.
    fn name(&self) -> &'static str;

    /// Checks `got`.
    fn check(&self, got: &T) -> Result<(), Mismatch>;
}

/// Description of a failed comparison.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("{summary}\n\t     got: {got}\n\texpected: {expected}")]
pub struct Mismatch {
    summary: String,
    got: String,
    expected: String,
}

impl Mismatch {
    /// Constructs new mismatch from already rendered values.
    pub fn new(
        summary: impl Into<String>,
        got: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            got: got.into(),
            expected: expected.into(),
        }
    }

    /// Returns the one line summary.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the rendered actual value.
    pub fn got(&self) -> &str {
        &self.got
    }

    /// Returns the rendered expectation.
    pub fn expected(&self) -> &str {
        &self.expected
    }
}

/// Compares two values with `PartialEq`.
pub fn compare_values<T: PartialEq + fmt::Debug>(got: &T, expected: &T) -> Result<(), Mismatch> {
    if got == expected {
        Ok(())
    } else {
        Err(Mismatch::new(
            "values differ",
            format!("{got:?}"),
            format!("{expected:?}"),
        ))
    }
}

/// Returns true if `val` equals the zero value of its type.
pub fn is_zero<T: Default + PartialEq>(val: &T) -> bool {
    *val == T::default()
}

/// Matcher that accepts anything. See [`ignore`].
#[derive(Debug, Clone, Copy)]
pub struct Ignore;

impl Matcher<Dynamic> for Ignore {
    fn name(&self) -> &'static str {
        "Ignore"
    }

    fn check(&self, _got: &Dynamic) -> Result<(), Mismatch> {
        Ok(())
    }
}

/// Matches any value.
#[track_caller]
pub fn ignore() -> Expectation<Dynamic> {
    Expectation::matcher(Ignore)
}

/// Matcher that rejects null and empty values. See [`not_empty`].
#[derive(Debug, Clone, Copy)]
pub struct NotEmpty;

impl Matcher<Dynamic> for NotEmpty {
    fn name(&self) -> &'static str {
        "NotEmpty"
    }

    fn check(&self, got: &Dynamic) -> Result<(), Mismatch> {
        if got.is_empty() {
            Err(Mismatch::new(
                format!("empty {}", got.kind()),
                format!("{got:?}"),
                "not empty",
            ))
        } else {
            Ok(())
        }
    }
}

/// Matches any value that is not null or empty.
#[track_caller]
pub fn not_empty() -> Expectation<Dynamic> {
    Expectation::matcher(NotEmpty)
}

/// Matcher that looks for a substring. See [`contains`].
#[derive(Debug, Clone)]
pub struct Contains(String);

impl Matcher<String> for Contains {
    fn name(&self) -> &'static str {
        "Contains"
    }

    fn check(&self, got: &String) -> Result<(), Mismatch> {
        if got.contains(&self.0) {
            Ok(())
        } else {
            Err(Mismatch::new(
                "does not contain",
                format!("{got:?}"),
                format!("Contains({:?})", self.0),
            ))
        }
    }
}

/// Matches text containing `needle`.
#[track_caller]
pub fn contains(needle: impl Into<String>) -> Expectation<String> {
    Expectation::matcher(Contains(needle.into()))
}

/// Matcher for an inclusive range. See [`between`].
#[derive(Debug, Clone)]
pub struct Between<T> {
    lo: T,
    hi: T,
}

impl<T: PartialOrd + fmt::Debug + 'static> Matcher<T> for Between<T> {
    fn name(&self) -> &'static str {
        "Between"
    }

    fn check(&self, got: &T) -> Result<(), Mismatch> {
        if &self.lo <= got && got <= &self.hi {
            Ok(())
        } else {
            Err(Mismatch::new(
                "out of range",
                format!("{got:?}"),
                format!("{:?} ≤ got ≤ {:?}", self.lo, self.hi),
            ))
        }
    }
}

/// Matches values in the inclusive range `lo..=hi`.
///
/// ```
/// # use actix_test_api::matcher;
/// let _created_or_accepted = matcher::between(201_u16, 202);
/// ```
#[track_caller]
pub fn between<T: PartialOrd + fmt::Debug + 'static>(lo: T, hi: T) -> Expectation<T> {
    Expectation::matcher(Between { lo, hi })
}

/// Matcher backed by a predicate. See [`satisfies`].
pub struct Satisfies<T> {
    desc: String,
    pred: Box<dyn Fn(&T) -> bool>,
}

impl<T> fmt::Debug for Satisfies<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Satisfies")
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

impl<T: fmt::Debug + 'static> Matcher<T> for Satisfies<T> {
    fn name(&self) -> &'static str {
        "Satisfies"
    }

    fn check(&self, got: &T) -> Result<(), Mismatch> {
        if (self.pred)(got) {
            Ok(())
        } else {
            Err(Mismatch::new(
                "predicate not satisfied",
                format!("{got:?}"),
                self.desc.clone(),
            ))
        }
    }
}

/// Matches values for which `pred` returns true. `desc` is shown when it does not.
///
/// This is also the way to give an otherwise untyped check a declared type:
///
/// ```
/// # use actix_test_api::matcher;
/// #[derive(Debug, Default, PartialEq, serde::Deserialize)]
/// struct Person {
///     id: u64,
/// }
///
/// let _has_id = matcher::satisfies("has an id", |p: &Person| p.id != 0);
/// ```
#[track_caller]
pub fn satisfies<T: fmt::Debug + 'static>(
    desc: impl Into<String>,
    pred: impl Fn(&T) -> bool + 'static,
) -> Expectation<T> {
    Expectation::matcher(Satisfies {
        desc: desc.into(),
        pred: Box::new(pred),
    })
}

/// Matcher for the presence of a header. See [`has_header`].
#[derive(Debug, Clone)]
pub struct HasHeader(String);

impl Matcher<ResponseHeaders> for HasHeader {
    fn name(&self) -> &'static str {
        "HasHeader"
    }

    fn check(&self, got: &ResponseHeaders) -> Result<(), Mismatch> {
        if got.contains_key(&self.0) {
            Ok(())
        } else {
            Err(Mismatch::new(
                "missing header",
                format!("{:?}", got.iter().map(|(name, _)| name).collect::<Vec<_>>()),
                format!("HasHeader({:?})", self.0),
            ))
        }
    }
}

/// Matches headers containing `name`, whatever its value.
#[track_caller]
pub fn has_header(name: impl Into<String>) -> Expectation<ResponseHeaders> {
    Expectation::matcher(HasHeader(name.into()))
}

/// Matcher for one header value. See [`header_is`].
#[derive(Debug, Clone)]
pub struct HeaderIs {
    name: String,
    val: String,
}

impl Matcher<ResponseHeaders> for HeaderIs {
    fn name(&self) -> &'static str {
        "HeaderIs"
    }

    fn check(&self, got: &ResponseHeaders) -> Result<(), Mismatch> {
        let vals = got.get_all(&self.name);

        if vals.iter().any(|val| *val == self.val) {
            Ok(())
        } else {
            Err(Mismatch::new(
                format!("unexpected {} header", self.name),
                format!("{vals:?}"),
                format!("{:?}", self.val),
            ))
        }
    }
}

/// Matches headers where `name` has `val` among its values; other headers are not checked.
#[track_caller]
pub fn header_is(name: impl Into<String>, val: impl Into<String>) -> Expectation<ResponseHeaders> {
    Expectation::matcher(HeaderIs {
        name: name.into(),
        val: val.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeHint;

    #[test]
    fn untyped_matchers_declare_nothing() {
        assert_eq!(ignore().type_behind(), None);
        assert_eq!(not_empty().type_behind(), None);
    }

    #[test]
    fn typed_matchers_declare_their_target() {
        assert_eq!(
            contains("x").type_behind(),
            Some(TypeHint::of::<String>()),
        );
        assert_eq!(
            between(1_u16, 2).type_behind(),
            Some(TypeHint::of::<u16>()),
        );
        assert_eq!(
            has_header("x-token").type_behind(),
            Some(TypeHint::of::<ResponseHeaders>()),
        );
    }

    #[test]
    fn not_empty_checks() {
        assert!(NotEmpty.check(&Dynamic::from("a")).is_ok());

        let err = NotEmpty.check(&Dynamic::Null).unwrap_err();
        assert_eq!(err.summary(), "empty null");
        assert_eq!(err.expected(), "not empty");
    }

    #[test]
    fn between_is_inclusive() {
        let m = Between { lo: 200_u16, hi: 202 };
        assert!(m.check(&200).is_ok());
        assert!(m.check(&202).is_ok());
        assert!(m.check(&203).is_err());
    }

    #[test]
    fn header_matchers() {
        let headers = ResponseHeaders::from_iter([("X-Token", "abc"), ("X-Token", "def")]);

        assert!(HasHeader("x-token".to_owned()).check(&headers).is_ok());
        assert!(HasHeader("x-account".to_owned()).check(&headers).is_err());

        let is = |val: &str| HeaderIs {
            name: "X-Token".to_owned(),
            val: val.to_owned(),
        };
        assert!(is("def").check(&headers).is_ok());
        assert!(is("xyz").check(&headers).is_err());
    }

    #[test]
    fn value_comparison() {
        assert!(compare_values(&1, &1).is_ok());

        let err = compare_values(&"ko", &"OK!").unwrap_err();
        assert_eq!(err.got(), r#""ko""#);
        assert_eq!(err.expected(), r#""OK!""#);
        assert!(err.to_string().starts_with("values differ\n"));
    }

    #[test]
    fn zero_values() {
        assert!(is_zero(&0_u32));
        assert!(is_zero(&String::new()));
        assert!(is_zero(&Dynamic::Null));
        assert!(!is_zero(&Dynamic::Bool(false)));
    }
}
