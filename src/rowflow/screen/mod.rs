//! Row screening: accept, reject, or abort.
//!
//! Screens are per-row validators evaluated in order after all processors
//! have run. Each screen yields one of three outcomes:
//!
//! - **accept**: continue to the next screen, or to the batch if last
//! - **reject**: drop this row, log the event, continue with the next row
//! - **fatal**: abort the entire run; no further rows are processed
//!
//! Rejection is the only recoverable outcome in the pipeline. A fatal
//! outcome originates from domain-level validation but terminates the run
//! exactly like an infrastructure error.

use crate::rowflow::row::Row;

/// Verdict of a single screen for a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenOutcome {
    /// Row passes this screen
    Accept,
    /// Row is dropped; the run continues
    Reject(String),
    /// The run aborts at this row
    Fatal(String),
}

/// Severity applied by configurable screens when their check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A failed check drops the row
    Reject,
    /// A failed check aborts the run
    Fatal,
}

impl Severity {
    fn outcome(self, message: String) -> ScreenOutcome {
        match self {
            Severity::Reject => ScreenOutcome::Reject(message),
            Severity::Fatal => ScreenOutcome::Fatal(message),
        }
    }
}

/// Per-row validator.
pub trait Screen: Send + Sync {
    /// Name used in logs and fatal error reports.
    fn name(&self) -> &str;

    /// Evaluate one row.
    fn screen(&self, row: &Row) -> ScreenOutcome;
}

/// State of a row as it moves through the screen chain.
///
/// Every row starts `Pending`. `Accepted`, `Rejected` and `FatalAborted`
/// are terminal: an accepted row proceeds to the batch, a rejected row is
/// released, and a fatal abort terminates the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    /// Not yet fully screened
    Pending,
    /// Passed every screen; proceeds to the batch
    Accepted,
    /// Dropped by a screen; the run continues
    Rejected {
        /// Screen that rejected the row
        screen: String,
        /// The screen's diagnostic message
        message: String,
    },
    /// A screen aborted the run at this row
    FatalAborted {
        /// Screen that aborted the run
        screen: String,
        /// The screen's diagnostic message
        message: String,
    },
}

/// Ordered chain of screens implementing the admission state machine.
#[derive(Default)]
pub struct ScreenChain {
    screens: Vec<Box<dyn Screen>>,
}

impl ScreenChain {
    /// Create an empty chain; with no screens every row is accepted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a screen to the chain.
    pub fn add(&mut self, screen: Box<dyn Screen>) -> &mut Self {
        self.screens.push(screen);
        self
    }

    /// Number of screens in the chain.
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    /// Whether the chain has no screens.
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// Run the row through every screen in order.
    ///
    /// Evaluation stops at the first non-accept outcome: a rejecting or
    /// aborting screen prevents later screens from running at all.
    pub fn evaluate(&self, row: &Row) -> RowState {
        // The row stays Pending between screens; the first non-accept
        // outcome is terminal.
        for screen in &self.screens {
            match screen.screen(row) {
                ScreenOutcome::Accept => {}
                ScreenOutcome::Reject(message) => {
                    return RowState::Rejected {
                        screen: screen.name().to_string(),
                        message,
                    };
                }
                ScreenOutcome::Fatal(message) => {
                    return RowState::FatalAborted {
                        screen: screen.name().to_string(),
                        message,
                    };
                }
            }
        }
        RowState::Accepted
    }
}

/// Screen that requires declared fields to be present and non-blank.
pub struct RequiredFieldsScreen {
    fields: Vec<String>,
    severity: Severity,
}

impl RequiredFieldsScreen {
    /// Create a screen over the given field names with the given severity.
    pub fn new<I, S>(fields: I, severity: Severity) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            severity,
        }
    }
}

impl Screen for RequiredFieldsScreen {
    fn name(&self) -> &str {
        "required_fields"
    }

    fn screen(&self, row: &Row) -> ScreenOutcome {
        for field in &self.fields {
            let blank = match row.get(field) {
                Some(value) => value.is_blank(),
                None => true,
            };
            if blank {
                return self
                    .severity
                    .outcome(format!("required field '{}' is missing or blank", field));
            }
        }
        ScreenOutcome::Accept
    }
}

/// Screen wrapping an arbitrary predicate with a configured severity.
///
/// The predicate returns `true` to accept the row. On `false` the screen
/// applies its severity with a message naming the screen.
pub struct CallbackScreen {
    name: String,
    severity: Severity,
    predicate: Box<dyn Fn(&Row) -> bool + Send + Sync>,
}

impl CallbackScreen {
    /// Create a named predicate screen.
    pub fn new<F>(name: impl Into<String>, severity: Severity, predicate: F) -> Self
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            severity,
            predicate: Box::new(predicate),
        }
    }
}

impl Screen for CallbackScreen {
    fn name(&self) -> &str {
        &self.name
    }

    fn screen(&self, row: &Row) -> ScreenOutcome {
        if (self.predicate)(row) {
            ScreenOutcome::Accept
        } else {
            self.severity
                .outcome(format!("screen '{}' check failed", self.name))
        }
    }
}
