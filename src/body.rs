//! Shared body verification: target resolution, decoding, comparison and diagnostics.

use std::any::Any;

use tracing::debug;

use crate::{
    diagnostic::{unknown_type_hint, Diagnostics, NOTHING_SET_HINT},
    expectation::{Confidence, Decodable, Resolution},
    matcher::is_zero,
    AssertionError, Codec, CodecError, Dynamic, Expectation,
};

pub(crate) const EMPTY_ROOT: &str = "Response body";
pub(crate) const DECODE_ROOT: &str = "decode(Response.Body)";
pub(crate) const BODY_ROOT: &str = "Response.Body";

/// Parameters of one body assertion.
#[derive(Debug)]
pub(crate) struct BodyCheck<'a, C> {
    /// Public method the assertion was made through.
    pub(crate) entry_point: &'static str,
    pub(crate) accept_empty: bool,
    pub(crate) codec: &'a C,
    pub(crate) status_failed: bool,
}

/// Outcome of a body assertion.
#[derive(Debug)]
pub(crate) struct Verdict {
    /// Root label, test name and error of the failed stage, if any.
    pub(crate) failure: Option<(&'static str, &'static str, AssertionError)>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) resolution: Option<Resolution>,
}

impl Verdict {
    pub(crate) fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Allocates the zero value of `T` and lets `codec` fill it from `body`.
///
/// The [`Dynamic`] placeholder is always filled through [`Codec::decode_dynamic`].
pub(crate) fn decode<T: Decodable, C: Codec>(codec: &C, body: &[u8]) -> Result<T, CodecError> {
    let mut target = T::default();

    match (&mut target as &mut dyn Any).downcast_mut::<Dynamic>() {
        Some(dynamic) => codec.decode_dynamic(body, dynamic)?,
        None => codec.decode(body, &mut target)?,
    }

    Ok(target)
}

/// Decoding succeeded on a non-empty body but left the target at its zero value.
pub(crate) fn nothing_populated<T: Decodable>(body: &[u8], got: &T) -> bool {
    !body.is_empty() && is_zero(got)
}

/// Runs the empty body check, then decodes and compares.
///
/// Each stage short-circuits the following ones when it fails.
pub(crate) fn verify<T: Decodable, C: Codec>(
    check: &BodyCheck<'_, C>,
    body: &[u8],
    expected: &Expectation<T>,
) -> Verdict {
    if !check.accept_empty && body.is_empty() {
        return Verdict {
            failure: Some((
                EMPTY_ROOT,
                "body should not be empty",
                AssertionError::EmptyBodyRejected {
                    entry_point: check.entry_point,
                },
            )),
            diagnostics: Diagnostics::default(),
            resolution: None,
        };
    }

    let resolution = expected.resolve(check.status_failed);
    debug!(
        codec = check.codec.name(),
        target = %resolution.target,
        body_len = body.len(),
        "decoding response body",
    );

    let mut diagnostics = Diagnostics::new(resolution.show_raw_body);

    let failure = match decode::<T, C>(check.codec, body) {
        Err(err) => {
            if resolution.confidence == Confidence::Unknown {
                if let Some(name) = expected.matcher_name() {
                    diagnostics.hint(unknown_type_hint(name));
                }
            }

            diagnostics.show_raw_body();

            Some((
                DECODE_ROOT,
                "body decoding",
                AssertionError::Decode {
                    target: resolution.target.name(),
                    source: err,
                },
            ))
        }

        Ok(got) => match expected.compare(&got) {
            Ok(()) => None,

            Err(mismatch) => {
                if nothing_populated(body, &got) {
                    diagnostics.show_raw_body();
                    diagnostics.hint(NOTHING_SET_HINT);
                }

                Some((
                    BODY_ROOT,
                    "body contents is OK",
                    AssertionError::Mismatch(mismatch),
                ))
            }
        },
    };

    Verdict {
        failure,
        diagnostics,
        resolution: Some(resolution),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        any::{self, TypeId},
        cell::Cell,
        fmt,
        marker::PhantomData,
        rc::Rc,
    };

    use serde::Deserialize;

    use super::*;
    use crate::{matcher, Expect as _, JsonCodec, Matcher, Mismatch, RawCodec, TypeHint};

    #[derive(Debug, Default, PartialEq, Deserialize)]
    struct Person {
        #[serde(default)]
        id: u64,
        #[serde(default)]
        name: String,
    }

    fn json(entry_point: &'static str) -> BodyCheck<'static, JsonCodec> {
        BodyCheck {
            entry_point,
            accept_empty: false,
            codec: &JsonCodec,
            status_failed: false,
        }
    }

    /// Records the type of the value it is given.
    #[derive(Debug)]
    struct TypeRecorder<T> {
        seen: Rc<Cell<Option<TypeId>>>,
        _target: PhantomData<fn(&T)>,
    }

    impl<T> TypeRecorder<T> {
        fn new() -> (Self, Rc<Cell<Option<TypeId>>>) {
            let seen = Rc::new(Cell::new(None));

            let recorder = Self {
                seen: Rc::clone(&seen),
                _target: PhantomData,
            };

            (recorder, seen)
        }
    }

    impl<T: fmt::Debug + 'static> Matcher<T> for TypeRecorder<T> {
        fn name(&self) -> &'static str {
            "TypeRecorder"
        }

        fn check(&self, got: &T) -> Result<(), Mismatch> {
            self.seen.set(Some(<T as Any>::type_id(got)));
            Ok(())
        }
    }

    #[test]
    fn decoder_allocates_resolved_type() {
        let body = br#"{"id":1,"name":"Bob"}"#;

        let (declared, seen) = TypeRecorder::<Person>::new();
        let verdict = verify(&json("cmp_json_body"), body, &Expectation::matcher(declared));
        let resolution = verdict.resolution.unwrap();
        assert_eq!(resolution.confidence, Confidence::Declared);
        assert_eq!(seen.get(), Some(resolution.target.id()));
        assert_eq!(seen.get(), Some(TypeId::of::<Person>()));

        let (undeclared, seen) = TypeRecorder::<Dynamic>::new();
        let verdict = verify(&json("cmp_json_body"), body, &Expectation::matcher(undeclared));
        let resolution = verdict.resolution.unwrap();
        assert_eq!(resolution.confidence, Confidence::Unknown);
        assert_eq!(seen.get(), Some(resolution.target.id()));
        assert_eq!(seen.get(), Some(TypeId::of::<Dynamic>()));

        let dynamic: Dynamic = decode(&RawCodec, b"raw").unwrap();
        assert_eq!(dynamic, Dynamic::Bytes(b"raw".to_vec()));
    }

    #[test]
    fn custom_matcher_decode_failure_names_its_type() {
        let (custom, _) = TypeRecorder::<Person>::new();
        let verdict = verify(
            &json("cmp_json_body"),
            br#"{"id":"x"}"#,
            &Expectation::matcher(custom),
        );

        let (_, _, err) = verdict.failure.as_ref().unwrap();
        assert!(matches!(
            err,
            AssertionError::Decode { target, .. } if *target == any::type_name::<Person>()
        ));
        assert!(verdict.diagnostics.hints().is_empty());
        assert_eq!(
            verdict.resolution.unwrap().target,
            TypeHint::of::<Person>()
        );
    }

    #[test]
    fn concrete_value_passes() {
        let expected = Person {
            id: 1,
            name: "Bob".to_owned(),
        }
        .into_expectation();

        let verdict = verify(&json("cmp_json_body"), br#"{"id":1,"name":"Bob"}"#, &expected);

        assert!(verdict.passed());
        assert_eq!(
            verdict.resolution.unwrap().target,
            TypeHint::of::<Person>()
        );
        assert!(!verdict.diagnostics.shows_raw_body());
    }

    #[test]
    fn empty_body_rejected_before_decoding() {
        let expected = Person::default().into_expectation();
        let verdict = verify(&json("cmp_json_body"), b"", &expected);

        let (root, _, err) = verdict.failure.unwrap();
        assert_eq!(root, EMPTY_ROOT);
        assert!(matches!(
            err,
            AssertionError::EmptyBodyRejected {
                entry_point: "cmp_json_body"
            }
        ));
        assert!(verdict.resolution.is_none());
    }

    #[test]
    fn empty_body_accepted_when_allowed() {
        let check = BodyCheck {
            entry_point: "cmp_body",
            accept_empty: true,
            codec: &RawCodec,
            status_failed: false,
        };
        let verdict = verify(&check, b"", &String::new().into_expectation());
        assert!(verdict.passed());
    }

    #[test]
    fn decode_failure_with_unknown_type_hints() {
        let verdict = verify(&json("cmp_json_body"), b"not json", &matcher::not_empty());

        let (root, name, err) = verdict.failure.as_ref().unwrap();
        assert_eq!(*root, DECODE_ROOT);
        assert_eq!(*name, "body decoding");
        assert!(matches!(err, AssertionError::Decode { .. }));

        assert!(verdict.diagnostics.shows_raw_body());
        assert_eq!(verdict.diagnostics.hints().len(), 1);
        assert!(verdict.diagnostics.hints()[0].contains("NotEmpty matcher"));
    }

    #[test]
    fn decode_failure_with_concrete_type_has_no_hint() {
        let verdict = verify(
            &json("cmp_json_body"),
            br#""text""#,
            &Person::default().into_expectation(),
        );

        assert!(!verdict.passed());
        assert!(verdict.diagnostics.shows_raw_body());
        assert!(verdict.diagnostics.hints().is_empty());
    }

    #[test]
    fn zero_value_after_decoding_shows_raw_body() {
        // object without known fields decodes to the zero value
        let expected = Person {
            id: 2,
            name: "Alice".to_owned(),
        }
        .into_expectation();
        let verdict = verify(&json("cmp_json_body"), br#"{"other":true}"#, &expected);

        assert!(!verdict.passed());
        assert!(verdict.diagnostics.shows_raw_body());
        assert_eq!(verdict.diagnostics.hints(), [NOTHING_SET_HINT]);
    }

    #[test]
    fn genuine_mismatch_has_no_hint() {
        let expected = Person {
            id: 2,
            name: "Alice".to_owned(),
        }
        .into_expectation();
        let verdict = verify(&json("cmp_json_body"), br#"{"id":1,"name":"Bob"}"#, &expected);

        let (root, name, err) = verdict.failure.as_ref().unwrap();
        assert_eq!(*root, BODY_ROOT);
        assert_eq!(*name, "body contents is OK");
        assert!(matches!(err, AssertionError::Mismatch(_)));
        assert!(!verdict.diagnostics.shows_raw_body());
    }

    #[test]
    fn null_body_with_untyped_matcher() {
        let verdict = verify(&json("cmp_json_body"), b"null", &matcher::not_empty());

        assert!(!verdict.passed());
        let resolution = verdict.resolution.unwrap();
        assert!(resolution.target.is_dynamic());
        assert_eq!(resolution.confidence, Confidence::Unknown);
        assert!(verdict.diagnostics.shows_raw_body());
    }

    #[test]
    fn trivial_matcher_after_status_failure_shows_body_even_when_passing() {
        let check = BodyCheck {
            status_failed: true,
            ..json("cmp_json_body")
        };
        let verdict = verify(&check, br#"{"error":"boom"}"#, &matcher::ignore());

        assert!(verdict.passed());
        assert!(verdict.diagnostics.shows_raw_body());
    }
}
