//! pathval-gen turns a catalog of certificate chain scenarios into fixture
//! files for an external path validation test suite.
//!
//! Each [`scenarios::Scenario`] builds a small chain (root, one or two
//! intermediates, target), perturbs at most one field to provoke a specific
//! verifier behavior, and pairs the chain with the trust anchors, the
//! verification time, and the expected outcome. The companion binary writes
//! every scenario to `<output-dir>/<name>.pem`, drawing key material from a
//! persistent key directory so that re-runs reproduce the same files.
#![warn(clippy::pedantic)]

pub mod scenarios;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::{fmt, fs, io};

use pathval_certs::{Issuance, KeyStore};

use crate::scenarios::Scenario;

/// Convenience type for functions that return a `T` on success or a [`GenError`] otherwise.
pub type Result<T> = core::result::Result<T, GenError>;

/// Build one scenario against `keys` and write the rendered fixture under
/// `output_dir`, returning the path written.
///
/// Every scenario gets a fresh issuing context, so serial numbers restart
/// at 1 per fixture and regenerating a single fixture doesn't depend on
/// which others ran before it.
///
/// # Errors
///
/// Returns an error if certificate construction, fixture rendering, or the
/// file write fails.
pub fn write_fixture(
    output_dir: impl AsRef<Path>,
    scenario: &Scenario,
    keys: &mut KeyStore,
) -> Result<PathBuf> {
    let mut ctx = Issuance::new(keys);
    let fixture = (scenario.build)(&mut ctx)?;
    let path = output_dir.as_ref().join(format!("{}.pem", scenario.name));
    fs::write(&path, fixture.render()?)?;
    Ok(path)
}

#[derive(Debug)]
#[non_exhaustive]
/// An error that can occur while generating fixtures.
pub enum GenError {
    #[non_exhaustive]
    /// Building a scenario's certificates failed.
    Build {
        source: pathval_certs::BuildError,
    },
    #[non_exhaustive]
    /// Rendering a scenario's fixture failed.
    Fixture {
        source: pathval_fixture::FixtureError,
    },
    #[non_exhaustive]
    /// Writing a fixture file failed.
    Io { source: io::Error },
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::Build { source } => {
                write!(f, "building scenario certificates: {source}")
            }
            GenError::Fixture { source } => {
                write!(f, "rendering fixture: {source}")
            }
            GenError::Io { source } => {
                write!(f, "writing fixture: {source}")
            }
        }
    }
}

impl Error for GenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GenError::Build { source } => Some(source),
            GenError::Fixture { source } => Some(source),
            GenError::Io { source } => Some(source),
        }
    }
}

impl From<pathval_certs::BuildError> for GenError {
    fn from(source: pathval_certs::BuildError) -> Self {
        GenError::Build { source }
    }
}

impl From<pathval_fixture::FixtureError> for GenError {
    fn from(source: pathval_fixture::FixtureError) -> Self {
        GenError::Fixture { source }
    }
}

impl From<io::Error> for GenError {
    fn from(source: io::Error) -> Self {
        GenError::Io { source }
    }
}
