//! pathval-fixture is the data model and serialization for certificate path
//! validation test fixtures.
//!
//! A fixture captures exactly one verification scenario, self-contained in
//! one text file: a certificate chain (target first), the trust anchors to
//! validate against, the time to validate at, the expected boolean outcome,
//! and optionally the literal diagnostic text the verifier under test is
//! expected to produce.
//!
//! The file layout is a free-text description, a short human-readable
//! summary, and then PEM-style blocks: one `CERTIFICATE` block per chain
//! certificate, a `TRUST_ANCHOR_UNCONSTRAINED` (or `..._CONSTRAINED`)
//! block per anchor, a `TIME` block holding an ASN.1 UTCTime string, a
//! `VERIFY_RESULT` block holding `SUCCESS` or `FAIL`, and an optional
//! `ERRORS` block. Consumers read the blocks with any PEM tokenizer and
//! ignore the prose.

mod template;

use std::error::Error;
use std::fmt;

use askama::Template;
use time::format_description::FormatItem;
use time::macros::{datetime, format_description};
use time::OffsetDateTime;

use crate::template::FixtureTemplate;

/// Convenience type for functions that return a `T` on success or a [`FixtureError`] otherwise.
pub type Result<T> = core::result::Result<T, FixtureError>;

/// The verification time fixtures use unless a scenario says otherwise.
/// Sits inside the default certificate validity window.
pub const DEFAULT_TIME: VerifyTime = VerifyTime(datetime!(2015-03-01 12:00 UTC));

/// Block tags and payload constants of the fixture layout, plus the one
/// encoding path every block goes through.
pub mod blocks {
    pub const CERTIFICATE: &str = "CERTIFICATE";
    pub const TRUST_ANCHOR_UNCONSTRAINED: &str = "TRUST_ANCHOR_UNCONSTRAINED";
    pub const TRUST_ANCHOR_CONSTRAINED: &str = "TRUST_ANCHOR_CONSTRAINED";
    pub const TIME: &str = "TIME";
    pub const VERIFY_RESULT: &str = "VERIFY_RESULT";
    pub const ERRORS: &str = "ERRORS";

    /// `VERIFY_RESULT` payload for an expected-success scenario.
    pub const SUCCESS: &str = "SUCCESS";
    /// `VERIFY_RESULT` payload for an expected-failure scenario.
    pub const FAIL: &str = "FAIL";

    /// Encode one block. All fixture blocks use LF line endings and a
    /// 64-column wrap so regenerated files stay byte-identical.
    #[must_use]
    pub fn encode(tag: &str, contents: &[u8]) -> String {
        pem::encode_config(
            &pem::Pem::new(tag, contents),
            pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
        )
    }
}

/// One certificate in the chain, with a human-readable label for the
/// summary section.
#[derive(Debug, Clone)]
pub struct ChainCert {
    pub label: String,
    pub der: Vec<u8>,
}

/// A certificate designated as a priori trusted, with an optional
/// constraint flag.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    pub label: String,
    pub der: Vec<u8>,
    pub constrained: bool,
}

/// The time a fixture's chain should be verified at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyTime(OffsetDateTime);

const UTC_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year repr:last_two][month][day][hour][minute][second]Z");

impl VerifyTime {
    #[must_use]
    pub fn new(at: OffsetDateTime) -> Self {
        VerifyTime(at)
    }

    /// The time as an ASN.1 UTCTime string, e.g. `150301120000Z`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timestamp can not be formatted.
    pub fn utc_time(&self) -> Result<String> {
        Ok(self.0.format(UTC_TIME_FORMAT)?)
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl Default for VerifyTime {
    fn default() -> Self {
        DEFAULT_TIME
    }
}

/// One complete test scenario: chain, anchors, time, and expectation.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Free-text description of what the scenario exercises.
    pub description: String,
    /// The chain under test, target certificate at index 0. The root is
    /// excluded unless a scenario deliberately includes it.
    pub chain: Vec<ChainCert>,
    /// The trust anchors to validate against.
    pub trust_anchors: Vec<TrustAnchor>,
    /// The time to validate at.
    pub time: VerifyTime,
    /// Whether verification is expected to succeed.
    pub verify_result: bool,
    /// Literal diagnostic text the verifier is expected to emit. Only
    /// allowed for expected failures.
    pub errors: Option<String>,
}

impl Fixture {
    /// Render the fixture in the fixed text layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the chain is empty, if there are no trust
    /// anchors, if error text is attached to an expected success, or if
    /// rendering itself fails.
    pub fn render(&self) -> Result<String> {
        let rendered = FixtureTemplate::try_from(self)?.render()?;
        // Normalize the tail: exactly one trailing newline.
        Ok(format!("{}\n", rendered.trim_end()))
    }
}

/// Replace everything after a rendered fixture's `VERIFY_RESULT` block with
/// a fresh `ERRORS` block holding `errors`.
///
/// This is how expected error text gets rebased onto existing fixture files
/// after the verifier's diagnostic format changes: the fixture is otherwise
/// left byte-for-byte intact.
///
/// # Errors
///
/// Returns an error if `contents` has no `VERIFY_RESULT` block.
pub fn splice_errors(contents: &str, errors: &str) -> Result<String> {
    let end_marker = format!("-----END {}-----", blocks::VERIFY_RESULT);
    let idx = contents
        .find(&end_marker)
        .ok_or(FixtureError::MissingResultBlock)?;

    let mut spliced = contents[..idx + end_marker.len()].to_owned();
    spliced.push_str("\n\n");
    spliced.push_str(blocks::encode(blocks::ERRORS, errors.as_bytes()).trim_end());
    spliced.push('\n');
    Ok(spliced)
}

#[derive(Debug)]
#[non_exhaustive]
/// An error that can occur while rendering or rewriting a fixture.
pub enum FixtureError {
    #[non_exhaustive]
    /// The fixture has no chain certificates.
    EmptyChain,
    #[non_exhaustive]
    /// The fixture has no trust anchors.
    NoTrustAnchors,
    #[non_exhaustive]
    /// Expected error text was attached to an expected-success fixture.
    ErrorsOnSuccess,
    #[non_exhaustive]
    /// A fixture being rewritten has no `VERIFY_RESULT` block.
    MissingResultBlock,
    #[non_exhaustive]
    /// Rendering the fixture template failed.
    Template { source: askama::Error },
    #[non_exhaustive]
    /// The verification time could not be formatted.
    TimeFormat { source: time::error::Format },
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::EmptyChain => {
                write!(f, "fixture chain has no certificates")
            }
            FixtureError::NoTrustAnchors => {
                write!(f, "fixture has no trust anchors")
            }
            FixtureError::ErrorsOnSuccess => {
                write!(f, "expected errors attached to an expected-success fixture")
            }
            FixtureError::MissingResultBlock => {
                write!(f, "fixture has no {} block", blocks::VERIFY_RESULT)
            }
            FixtureError::Template { source } => {
                write!(f, "rendering fixture template: {source}")
            }
            FixtureError::TimeFormat { source } => {
                write!(f, "formatting verification time: {source}")
            }
        }
    }
}

impl Error for FixtureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FixtureError::Template { source } => Some(source),
            FixtureError::TimeFormat { source } => Some(source),
            _ => None,
        }
    }
}

impl From<askama::Error> for FixtureError {
    fn from(source: askama::Error) -> Self {
        FixtureError::Template { source }
    }
}

impl From<time::error::Format> for FixtureError {
    fn from(source: time::error::Format) -> Self {
        FixtureError::TimeFormat { source }
    }
}
