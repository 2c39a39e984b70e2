//! The expect protocol: poll a ledger until a substring shows up or time runs out.

use crate::ledger::OutputLedger;
use std::fmt;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Timeout applied when a request does not name one.
pub const DEFAULT_EXPECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// How a timed-out expectation affects the running scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Report the failure and keep going.
    Soft,
    /// Report the failure and terminate the scenario.
    Critical,
}

impl Severity {
    /// Zero points is soft, anything else is critical.
    pub fn from_points(points: i64) -> Self {
        if points == 0 {
            Severity::Soft
        } else {
            Severity::Critical
        }
    }
}

/// One `expect` call: what to look for, how bad a miss is, and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectRequest {
    pub expected: String,
    pub points: i64,
    pub timeout: Duration,
}

impl ExpectRequest {
    /// A soft expectation with the default timeout.
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            points: 0,
            timeout: DEFAULT_EXPECT_TIMEOUT,
        }
    }

    pub fn with_points(mut self, points: i64) -> Self {
        self.points = points;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn severity(&self) -> Severity {
        Severity::from_points(self.points)
    }
}

/// What came of an `expect` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectOutcome {
    /// Found; the ledger cursor now sits right after the match.
    Matched,
    /// Timed out, scenario left running and cursor untouched.
    SoftTimeout,
    /// Timed out, scenario terminated.
    CriticalTimeout,
    /// No scenario was running, nothing was checked.
    Inactive,
}

impl fmt::Display for ExpectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ExpectOutcome::Matched => "matched",
            ExpectOutcome::SoftTimeout => "soft timeout",
            ExpectOutcome::CriticalTimeout => "critical timeout",
            ExpectOutcome::Inactive => "no active scenario",
        };
        f.write_str(text)
    }
}

/// Offset of the first occurrence of `needle` in `haystack`. An empty needle
/// matches at the start.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Scan the unconsumed part of `ledger` for the request's text every `tick`
/// until it shows up or the timeout elapses.
///
/// On a match everything up to and including the match is consumed, so text
/// before it is skipped for good and the same occurrence is never matched
/// twice. On a timeout the cursor is left where it was and the outcome
/// reflects the request's severity; acting on a critical timeout is up to the
/// caller.
pub async fn await_match(
    ledger: &OutputLedger,
    request: &ExpectRequest,
    tick: Duration,
) -> ExpectOutcome {
    let needle = request.expected.as_bytes();
    let deadline = Instant::now() + request.timeout;
    loop {
        if let Some(index) = find(&ledger.peek(), needle) {
            // Only this task moves the cursor and the buffer never shrinks,
            // so the peeked range is still unconsumed.
            if let Err(err) = ledger.seek(index + needle.len()) {
                unreachable!("matched range vanished from the ledger: {err}");
            }
            return ExpectOutcome::Matched;
        }
        if Instant::now() >= deadline {
            return match request.severity() {
                Severity::Soft => ExpectOutcome::SoftTimeout,
                Severity::Critical => ExpectOutcome::CriticalTimeout,
            };
        }
        sleep(tick).await;
    }
}
