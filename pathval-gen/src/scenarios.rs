//! The scenario catalog.
//!
//! Each scenario builds its chain bottom-up (root, intermediate(s),
//! target), perturbs at most one field, and states the expected
//! verification outcome. Chains list the target certificate first and
//! exclude the root; the root (or a deliberately unrelated root) appears as
//! the trust anchor.

use pathval_certs::{
    BasicConstraintsSpec, CertBuilder, Issuance, IssuedCert, KeySpec, KeyUsagePurpose,
    Result, UNKNOWN_EXTENSION_OID, UNKNOWN_EXTENSION_VALUE,
};
use pathval_fixture::{ChainCert, Fixture, TrustAnchor, VerifyTime};
use time::macros::datetime;

/// One entry in the catalog: the fixture file stem and the function that
/// builds the fixture from scratch.
pub struct Scenario {
    pub name: &'static str,
    pub build: fn(&mut Issuance<'_>) -> Result<Fixture>,
}

/// The full catalog, in the order fixtures are generated.
#[must_use]
pub fn all() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "target-and-intermediate",
            build: target_and_intermediate,
        },
        Scenario {
            name: "intermediate-basic-constraints-ca-false",
            build: intermediate_basic_constraints_ca_false,
        },
        Scenario {
            name: "intermediate-lacks-basic-constraints",
            build: intermediate_lacks_basic_constraints,
        },
        Scenario {
            name: "intermediate-basic-constraints-not-critical",
            build: intermediate_basic_constraints_not_critical,
        },
        Scenario {
            name: "intermediate-lacks-signing-key-usage",
            build: intermediate_lacks_signing_key_usage,
        },
        Scenario {
            name: "intermediate-unknown-critical-extension",
            build: intermediate_unknown_critical_extension,
        },
        Scenario {
            name: "intermediate-unknown-non-critical-extension",
            build: intermediate_unknown_non_critical_extension,
        },
        Scenario {
            name: "target-has-keycertsign-but-not-ca",
            build: target_has_keycertsign_but_not_ca,
        },
        Scenario {
            name: "target-not-end-entity",
            build: target_not_end_entity,
        },
        Scenario {
            name: "target-signed-by-512bit-rsa",
            build: target_signed_by_512bit_rsa,
        },
        Scenario {
            name: "target-signed-using-ecdsa",
            build: target_signed_using_ecdsa,
        },
        Scenario {
            name: "target-wrong-signature",
            build: target_wrong_signature,
        },
        Scenario {
            name: "expired-intermediate",
            build: expired_intermediate,
        },
        Scenario {
            name: "expired-target",
            build: expired_target,
        },
        Scenario {
            name: "target-not-yet-valid",
            build: target_not_yet_valid,
        },
        Scenario {
            name: "unknown-root",
            build: unknown_root,
        },
        Scenario {
            name: "violates-basic-constraints-pathlen-0",
            build: violates_basic_constraints_pathlen_0,
        },
        Scenario {
            name: "violates-pathlen-1-root",
            build: violates_pathlen_1_root,
        },
    ]
}

fn chain(certs: &[&IssuedCert]) -> Vec<ChainCert> {
    certs
        .iter()
        .map(|cert| ChainCert {
            label: cert.name().to_owned(),
            der: cert.der().to_vec(),
        })
        .collect()
}

fn anchor(cert: &IssuedCert) -> Vec<TrustAnchor> {
    vec![TrustAnchor {
        label: cert.name().to_owned(),
        der: cert.der().to_vec(),
        constrained: false,
    }]
}

fn expect_success(description: &str, chain: Vec<ChainCert>, anchors: Vec<TrustAnchor>) -> Fixture {
    Fixture {
        description: description.to_owned(),
        chain,
        trust_anchors: anchors,
        time: VerifyTime::default(),
        verify_result: true,
        errors: None,
    }
}

fn expect_failure(description: &str, chain: Vec<ChainCert>, anchors: Vec<TrustAnchor>) -> Fixture {
    Fixture {
        description: description.to_owned(),
        chain,
        trust_anchors: anchors,
        time: VerifyTime::default(),
        verify_result: false,
        errors: None,
    }
}

/// Certificate chain with one intermediate and a trusted root. The chain is
/// well formed, so verification is expected to succeed.
fn target_and_intermediate(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate").issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_success(
        "Certificate chain with one intermediate and a trusted root. The chain \
         is well formed and verification is expected to succeed.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The intermediate's basic constraints say it is NOT a CA, so the chain
/// must be rejected. This scenario also pins the verifier's diagnostic
/// output.
fn intermediate_basic_constraints_ca_false(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .basic_constraints(BasicConstraintsSpec::NotCa)
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    let mut fixture = expect_failure(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate has a basic constraints extension that indicates it is \
         NOT a CA. Verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    );
    fixture.errors = Some(
        "[Context] Processing Certificate\n  \
         index: 0\n      \
         [Error] Basic Constraints indicates not a CA\n"
            .to_owned(),
    );
    Ok(fixture)
}

/// The intermediate has no basic constraints extension at all. RFC 5280
/// requires v3 signing certificates to carry one, so verification is
/// expected to fail.
fn intermediate_lacks_basic_constraints(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .basic_constraints(BasicConstraintsSpec::Omitted)
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate lacks the basic constraints extension required of v3 \
         signing certificates, so verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The intermediate's basic constraints assert CA=true but the extension is
/// not marked critical. Path validation reads the value either way, so
/// verification is expected to succeed.
fn intermediate_basic_constraints_not_critical(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .basic_constraints(BasicConstraintsSpec::CaNotCritical)
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_success(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate's basic constraints extension asserts CA=true but is \
         not marked critical. Verification is expected to succeed.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The intermediate has a key usage extension without keyCertSign, so it
/// may not sign certificates and verification is expected to fail.
fn intermediate_lacks_signing_key_usage(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .key_usages(vec![KeyUsagePurpose::DigitalSignature])
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate has a key usage extension that lacks keyCertSign, so \
         verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The intermediate carries an unknown extension (OID 1.2.3.4) marked
/// critical, so verification is expected to fail.
fn intermediate_unknown_critical_extension(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .add_extension(UNKNOWN_EXTENSION_OID, true, UNKNOWN_EXTENSION_VALUE.to_vec())
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate has an unknown X.509v3 extension (OID 1.2.3.4) that is \
         marked as critical, so verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The same unknown extension, but not critical: verifiers must ignore it,
/// so verification is expected to succeed.
fn intermediate_unknown_non_critical_extension(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .add_extension(
            UNKNOWN_EXTENSION_OID,
            false,
            UNKNOWN_EXTENSION_VALUE.to_vec(),
        )
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_success(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate has an unknown X.509v3 extension (OID 1.2.3.4) that is \
         not marked critical, so verification is expected to succeed.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The target is not a CA and yet asserts the keyCertSign key usage.
/// keyCertSign is only meaningful alongside CA=true, so verification is
/// expected to fail.
fn target_has_keycertsign_but_not_ca(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate").issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target")
        .key_usages(vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
            KeyUsagePurpose::KeyCertSign,
        ])
        .issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate, a trusted root, and a \
         target certificate that is not a CA yet has the keyCertSign key \
         usage bit set. keyCertSign should only be asserted when CA is true, \
         so verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The target is a CA certificate rather than an end entity, so
/// verification is expected to fail.
fn target_not_end_entity(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate").issue(&root, ctx)?;
    let target = CertBuilder::intermediate("Target").issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root, where \
         the target certificate is a CA rather than an end entity. \
         Verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The intermediate is keyed with 512-bit RSA, so the target is signed by a
/// weak key and verification is expected to fail.
fn target_signed_by_512bit_rsa(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .key_spec(KeySpec::Rsa { bits: 512 })
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate uses a very weak key (512-bit RSA), so the target's \
         signature is made by a weak key and verification is expected to \
         fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The intermediate is keyed with ECDSA P-256, so the target is signed
/// using ECDSA. Verification is expected to succeed.
fn target_signed_using_ecdsa(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .key_spec(KeySpec::EcdsaP256)
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_success(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate uses an ECDSA P-256 key, so the target is signed using \
         ECDSA. Verification is expected to succeed.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The target was signed by a certificate with the intermediate's name but
/// different key material, so the presented intermediate can't verify the
/// target's signature and verification is expected to fail.
fn target_wrong_signature(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate").issue(&root, ctx)?;
    let phony = CertBuilder::intermediate("Intermediate")
        .key_name("Intermediate-phony")
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&phony, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root, where \
         the target was signed by a same-named certificate with different \
         key material. The presented intermediate can not verify the \
         target's signature, so verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The intermediate's validity window ends before the verification time,
/// so verification is expected to fail.
fn expired_intermediate(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate")
        .validity(
            datetime!(2015-01-01 12:00 UTC),
            datetime!(2015-02-01 12:00 UTC),
        )
        .issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root. The \
         intermediate's validity window ends before the verification time, \
         so verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The target's validity window ends before the verification time, so
/// verification is expected to fail.
fn expired_target(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate").issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target")
        .validity(
            datetime!(2015-01-01 12:00 UTC),
            datetime!(2015-02-01 12:00 UTC),
        )
        .issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root. The \
         target's validity window ends before the verification time, so \
         verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The target's validity window starts after the verification time, so
/// verification is expected to fail.
fn target_not_yet_valid(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate").issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target")
        .validity(
            datetime!(2015-06-01 12:00 UTC),
            datetime!(2016-01-01 12:00 UTC),
        )
        .issue(&intermediate, ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate and a trusted root. The \
         target's validity window starts after the verification time, so \
         verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&root),
    ))
}

/// The chain's root is not in the trust store; an unrelated root is trusted
/// instead. The final intermediate doesn't chain to a known root, so
/// verification is expected to fail.
fn unknown_root(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate = CertBuilder::intermediate("Intermediate").issue(&root, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate, ctx)?;

    // Unrelated self-signed root, not part of the chain, which is what gets
    // saved as the trust anchor.
    let bogus_root = CertBuilder::root("BogusRoot").issue_self_signed(ctx)?;

    Ok(expect_failure(
        "Certificate chain with one intermediate, where the chain's root is \
         not in the trust store and an unrelated root is trusted instead. \
         The final intermediate does not chain to a known root, so \
         verification is expected to fail.",
        chain(&[&target, &intermediate]),
        anchor(&bogus_root),
    ))
}

/// The first intermediate carries pathlen:0, so no further CA may follow
/// it; a second intermediate does, and verification is expected to fail.
fn violates_basic_constraints_pathlen_0(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root").issue_self_signed(ctx)?;
    let intermediate1 = CertBuilder::intermediate("Intermediate1")
        .basic_constraints(BasicConstraintsSpec::Ca { path_len: Some(0) })
        .issue(&root, ctx)?;
    let intermediate2 = CertBuilder::intermediate("Intermediate2").issue(&intermediate1, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate2, ctx)?;

    Ok(expect_failure(
        "Certificate chain with two intermediates and a trusted root. The \
         first intermediate has a basic constraints path length of 0, so no \
         CA may follow it in the path; the second intermediate violates that \
         restriction and verification is expected to fail.",
        chain(&[&target, &intermediate2, &intermediate1]),
        anchor(&root),
    ))
}

/// The root carries pathlen:1 and the chain has two intermediates.
/// Constraints on trust anchors are not validated, so verification is
/// expected to succeed.
fn violates_pathlen_1_root(ctx: &mut Issuance<'_>) -> Result<Fixture> {
    let root = CertBuilder::root("Root")
        .basic_constraints(BasicConstraintsSpec::Ca { path_len: Some(1) })
        .issue_self_signed(ctx)?;
    let intermediate1 = CertBuilder::intermediate("Intermediate1").issue(&root, ctx)?;
    let intermediate2 = CertBuilder::intermediate("Intermediate2").issue(&intermediate1, ctx)?;
    let target = CertBuilder::end_entity("Target").issue(&intermediate2, ctx)?;

    Ok(expect_success(
        "Certificate chain with two intermediates and a trusted root whose \
         basic constraints carry a path length of 1. Ordinarily that would \
         invalidate the chain, but constraints on trust anchors are not \
         validated, so verification is expected to succeed.",
        chain(&[&target, &intermediate2, &intermediate1]),
        anchor(&root),
    ))
}
