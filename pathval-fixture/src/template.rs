use askama::Template;

use crate::{blocks, Fixture, FixtureError};

#[derive(Template)]
#[template(path = "fixture.txt")]
/// A template for rendering one test fixture as a self-contained text file.
pub(crate) struct FixtureTemplate {
    /// Free-text description of the scenario.
    pub(crate) description: String,
    /// The chain certificates, target first.
    pub(crate) chain: Vec<CertEntry>,
    /// The trust anchors.
    pub(crate) anchors: Vec<AnchorEntry>,
    /// The verification time, as an ASN.1 UTCTime string.
    pub(crate) time: String,
    /// `SUCCESS` or `FAIL`.
    pub(crate) expected: &'static str,
    /// The encoded `TIME` block.
    pub(crate) time_block: String,
    /// The encoded `VERIFY_RESULT` block.
    pub(crate) result_block: String,
    /// The encoded `ERRORS` block, for failures that pin diagnostic text.
    pub(crate) errors_block: Option<String>,
}

/// One chain certificate ready to template.
pub(crate) struct CertEntry {
    pub(crate) label: String,
    pub(crate) block: String,
}

/// One trust anchor ready to template.
pub(crate) struct AnchorEntry {
    pub(crate) label: String,
    pub(crate) constrained: bool,
    pub(crate) block: String,
}

impl TryFrom<&Fixture> for FixtureTemplate {
    type Error = FixtureError;

    /// Validate a fixture's invariants and prepare its encoded blocks.
    fn try_from(fixture: &Fixture) -> Result<Self, Self::Error> {
        if fixture.chain.is_empty() {
            return Err(FixtureError::EmptyChain);
        }
        if fixture.trust_anchors.is_empty() {
            return Err(FixtureError::NoTrustAnchors);
        }
        if fixture.verify_result && fixture.errors.is_some() {
            return Err(FixtureError::ErrorsOnSuccess);
        }

        let chain = fixture
            .chain
            .iter()
            .map(|cert| CertEntry {
                label: cert.label.clone(),
                block: blocks::encode(blocks::CERTIFICATE, &cert.der)
                    .trim_end()
                    .to_owned(),
            })
            .collect();

        let anchors = fixture
            .trust_anchors
            .iter()
            .map(|anchor| {
                let tag = if anchor.constrained {
                    blocks::TRUST_ANCHOR_CONSTRAINED
                } else {
                    blocks::TRUST_ANCHOR_UNCONSTRAINED
                };
                AnchorEntry {
                    label: anchor.label.clone(),
                    constrained: anchor.constrained,
                    block: blocks::encode(tag, &anchor.der).trim_end().to_owned(),
                }
            })
            .collect();

        let time = fixture.time.utc_time()?;
        let expected = if fixture.verify_result {
            blocks::SUCCESS
        } else {
            blocks::FAIL
        };

        Ok(FixtureTemplate {
            description: fixture.description.trim_end().to_owned(),
            chain,
            anchors,
            time: time.clone(),
            expected,
            time_block: blocks::encode(blocks::TIME, time.as_bytes())
                .trim_end()
                .to_owned(),
            result_block: blocks::encode(blocks::VERIFY_RESULT, expected.as_bytes())
                .trim_end()
                .to_owned(),
            errors_block: fixture.errors.as_ref().map(|errors| {
                blocks::encode(blocks::ERRORS, errors.as_bytes())
                    .trim_end()
                    .to_owned()
            }),
        })
    }
}
