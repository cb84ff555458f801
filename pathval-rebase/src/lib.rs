//! pathval-rebase updates the expected-error text stored in path validation
//! fixture files.
//!
//! When the verifier under test changes its diagnostic format, every
//! fixture that pins error output goes stale at once. Rather than editing
//! the `ERRORS` blocks by hand, the test suite's actual output is collected
//! into a JSON report — an array of `{ "fixture": ..., "errors": ... }`
//! entries — and this crate splices each entry's error text back into the
//! named fixture file, leaving everything before the `VERIFY_RESULT` block
//! byte-for-byte intact.

use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fmt, fs, io};

use serde::Deserialize;

/// Convenience type for functions that return a `T` on success or a [`RebaseError`] otherwise.
pub type Result<T> = core::result::Result<T, RebaseError>;

/// One entry of the actual-output report: the error text the verifier
/// really produced for one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActualResult {
    /// Fixture file name, e.g. `unknown-root.pem`. A bare file name, not a
    /// path.
    pub fixture: String,
    /// The diagnostic text the verifier emitted.
    pub errors: String,
}

/// Read a JSON report of actual verifier output.
///
/// # Errors
///
/// Returns an error if the report is not a JSON array of result entries.
pub fn read_report(data: impl Read) -> Result<Vec<ActualResult>> {
    Ok(serde_json::from_reader(data)?)
}

/// Splice one result's error text into its fixture file under
/// `fixture_dir`, returning the path rewritten.
///
/// # Errors
///
/// Returns an error if the fixture name is not a bare file name, if the
/// fixture file can't be read or written, or if the fixture has no
/// `VERIFY_RESULT` block to splice after.
pub fn rebase_fixture(fixture_dir: impl AsRef<Path>, result: &ActualResult) -> Result<PathBuf> {
    if result.fixture.contains(&['/', '\\'][..]) {
        return Err(RebaseError::BadFixtureName {
            name: result.fixture.clone(),
        });
    }

    let path = fixture_dir.as_ref().join(&result.fixture);
    let contents = fs::read_to_string(&path)?;
    let spliced = pathval_fixture::splice_errors(&contents, &result.errors)?;
    fs::write(&path, spliced)?;
    Ok(path)
}

#[derive(Debug)]
#[non_exhaustive]
/// An error that can occur while rebasing fixture error expectations.
pub enum RebaseError {
    #[non_exhaustive]
    /// The JSON report could not be parsed.
    Report { source: serde_json::Error },
    #[non_exhaustive]
    /// A report entry named something other than a bare fixture file name.
    BadFixtureName { name: String },
    #[non_exhaustive]
    /// A fixture file could not be read or written.
    Io { source: io::Error },
    #[non_exhaustive]
    /// A fixture file could not be rewritten.
    Fixture {
        source: pathval_fixture::FixtureError,
    },
}

impl fmt::Display for RebaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebaseError::Report { source } => {
                write!(f, "parsing actual-output report: {source}")
            }
            RebaseError::BadFixtureName { name } => {
                write!(f, "fixture name is not a bare file name: {name:?}")
            }
            RebaseError::Io { source } => {
                write!(f, "reading or writing fixture: {source}")
            }
            RebaseError::Fixture { source } => {
                write!(f, "rewriting fixture: {source}")
            }
        }
    }
}

impl Error for RebaseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RebaseError::Report { source } => Some(source),
            RebaseError::BadFixtureName { .. } => None,
            RebaseError::Io { source } => Some(source),
            RebaseError::Fixture { source } => Some(source),
        }
    }
}

impl From<serde_json::Error> for RebaseError {
    fn from(source: serde_json::Error) -> Self {
        RebaseError::Report { source }
    }
}

impl From<io::Error> for RebaseError {
    fn from(source: io::Error) -> Self {
        RebaseError::Io { source }
    }
}

impl From<pathval_fixture::FixtureError> for RebaseError {
    fn from(source: pathval_fixture::FixtureError) -> Self {
        RebaseError::Fixture { source }
    }
}
