use crate::{report::Note, Reporter};

/// Shown when decoding wrote nothing into the target.
pub(crate) const NOTHING_SET_HINT: &str = "Hmm… It seems nothing has been set during decoding…";

/// Formats a response body for display: quoted text, or lossy text when not UTF-8.
pub fn format_raw_body(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) => format!("{text:?}"),
        Err(_) => format!(
            "{:?} ({} bytes, not valid UTF-8)",
            String::from_utf8_lossy(body),
            body.len(),
        ),
    }
}

/// Hint given when a matcher with no declared type made decoding fail.
pub(crate) fn unknown_type_hint(matcher: &str) -> String {
    format!(
        "Cannot guess the body expected type as {matcher} matcher does not know the type behind \
        it.\nYou can try a matcher declared over EXPECTED_TYPE, like \
        `satisfies::<EXPECTED_TYPE>(…)`, in place of {matcher}(…) to disambiguate…"
    )
}

/// Diagnostic text gathered while checking a body.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    hints: Vec<String>,
    show_raw_body: bool,
}

impl Diagnostics {
    pub(crate) fn new(show_raw_body: bool) -> Self {
        Self {
            hints: Vec::new(),
            show_raw_body,
        }
    }

    pub(crate) fn hint(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    pub(crate) fn show_raw_body(&mut self) {
        self.show_raw_body = true;
    }

    #[cfg(test)]
    pub(crate) fn shows_raw_body(&self) -> bool {
        self.show_raw_body
    }

    #[cfg(test)]
    pub(crate) fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Sends hints, then the raw body if requested, to `reporter`.
    pub(crate) fn emit(self, reporter: &mut impl Reporter, root: &'static str, body: &[u8]) {
        for hint in self.hints {
            reporter.note(Note::new(root, hint));
        }

        if self.show_raw_body {
            reporter.note(Note::new(
                root,
                format!("Raw received body: {}", format_raw_body(body)),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Collector;

    #[test]
    fn raw_body_formatting() {
        assert_eq!(format_raw_body(b"null"), r#""null""#);
        assert_eq!(format_raw_body(b"a\nb"), r#""a\nb""#);
        assert_eq!(
            format_raw_body(&[b'a', 0xff]),
            "\"a\u{FFFD}\" (2 bytes, not valid UTF-8)",
        );
    }

    #[test]
    fn emit_orders_hints_before_body() {
        let mut diag = Diagnostics::new(false);
        diag.hint(NOTHING_SET_HINT);
        diag.show_raw_body();

        let mut collector = Collector::new();
        diag.emit(&mut collector, "Response.Body", b"{}");

        let notes = collector.notes();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].message(), NOTHING_SET_HINT);
        assert_eq!(notes[1].message(), r#"Raw received body: "{}""#);
    }

    #[test]
    fn nothing_emitted_by_default() {
        let mut collector = Collector::new();
        Diagnostics::default().emit(&mut collector, "Response.Body", b"{}");
        assert!(collector.notes().is_empty());
    }

    #[test]
    fn unknown_type_hint_names_matcher() {
        let hint = unknown_type_hint("NotEmpty");
        assert!(hint.starts_with("Cannot guess the body expected type as NotEmpty matcher"));
        assert!(hint.contains("in place of NotEmpty(…)"));
    }
}
