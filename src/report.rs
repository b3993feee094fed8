//! Reporting of assertion failures and diagnostic notes.

use std::{fmt, mem, thread};

use tracing::{error, info};

use crate::AssertionError;

/// A failed assertion.
#[derive(Debug)]
pub struct Failure {
    root: &'static str,
    name: String,
    error: AssertionError,
}

impl Failure {
    pub(crate) fn new(root: &'static str, name: String, error: AssertionError) -> Self {
        Self { root, name, error }
    }

    /// What was inspected, e.g. `Response.Status`.
    pub fn root(&self) -> &'static str {
        self.root
    }

    /// Test name, including any prefix set with [`TestApi::name`](crate::TestApi::name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Why the assertion failed.
    pub fn error(&self) -> &AssertionError {
        &self.error
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed test '{}'\n{}: {}", self.name, self.root, self.error)
    }
}

/// Diagnostic text attached to an assertion. Never affects its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    root: &'static str,
    message: String,
}

impl Note {
    pub(crate) fn new(root: &'static str, message: String) -> Self {
        Self { root, message }
    }

    /// What the note is about, e.g. `Response.Body`.
    pub fn root(&self) -> &'static str {
        self.root
    }

    /// Note text.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.root, self.message)
    }
}

/// Receives assertion outcomes.
pub trait Reporter {
    /// Records a failed assertion.
    fn fail(&mut self, failure: Failure);

    /// Records diagnostic text.
    fn note(&mut self, note: Note);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn fail(&mut self, failure: Failure) {
        (**self).fail(failure);
    }

    fn note(&mut self, note: Note) {
        (**self).note(note);
    }
}

/// Default reporter.
///
/// Collects failures and notes, mirroring each one to `tracing`. When dropped while still holding
/// failures it panics with all of them, so a test fails once it is over but every chained
/// assertion still gets to run. Use [`take`](Self::take) to inspect failures instead.
#[derive(Debug, Default)]
pub struct Collector {
    report: Report,
}

impl Collector {
    /// Constructs new, empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> &[Failure] {
        &self.report.failures
    }

    /// Notes recorded so far.
    pub fn notes(&self) -> &[Note] {
        &self.report.notes
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&mut self) -> Report {
        mem::take(&mut self.report)
    }
}

impl Reporter for Collector {
    fn fail(&mut self, failure: Failure) {
        error!(root = failure.root, "{failure}");
        self.report.failures.push(failure);
    }

    fn note(&mut self, note: Note) {
        info!(root = note.root, "{}", note.message);
        self.report.notes.push(note);
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        if !self.report.is_ok() && !thread::panicking() {
            panic!("{}", self.report);
        }
    }
}

/// Failures and notes taken from a [`Collector`].
#[derive(Debug, Default)]
pub struct Report {
    /// Failed assertions, in order.
    pub failures: Vec<Failure>,

    /// Diagnostic notes, in order.
    pub notes: Vec<Note>,
}

impl Report {
    /// Returns true if no assertion failed.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns true if any failure or note contains `text`.
    pub fn mentions(&self, text: &str) -> bool {
        self.failures
            .iter()
            .map(ToString::to_string)
            .chain(self.notes.iter().map(ToString::to_string))
            .any(|line| line.contains(text))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} assertion(s) failed", self.failures.len())?;

        for failure in &self.failures {
            writeln!(f, "{failure}")?;
        }

        for note in &self.notes {
            writeln!(f, "{note}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_disarms_drop_panic() {
        let mut collector = Collector::new();
        collector.fail(Failure::new(
            "Request",
            "request is sent".to_owned(),
            AssertionError::DispatchMissing,
        ));
        collector.note(Note::new("Response.Body", "some hint".to_owned()));

        assert_eq!(collector.failures().len(), 1);
        assert_eq!(collector.notes().len(), 1);

        let report = collector.take();
        assert!(!report.is_ok());
        assert!(report.mentions("Failed test 'request is sent'"));
        assert!(report.mentions("Response.Body: some hint"));

        assert!(collector.failures().is_empty());
    }

    #[test]
    #[should_panic(expected = "1 assertion(s) failed")]
    fn drop_panics_on_unread_failures() {
        let mut collector = Collector::new();
        collector.fail(Failure::new(
            "Request",
            "request is sent".to_owned(),
            AssertionError::DispatchMissing,
        ));
    }

    #[test]
    fn notes_alone_do_not_panic() {
        let mut collector = Collector::new();
        collector.note(Note::new("Response.Body", "Raw received body: \"\"".to_owned()));
    }

    #[test]
    fn borrowed_reporter() {
        fn greet(mut reporter: impl Reporter) {
            reporter.note(Note::new("Request", "hi".to_owned()));
        }

        let mut collector = Collector::new();
        greet(&mut collector);

        assert_eq!(collector.notes()[0].message(), "hi");
    }
}
