//! End-to-end checks over the generated fixtures: every scenario renders a
//! self-contained fixture, every expected-failure chain demonstrably lacks
//! the property its perturbation removes, and expected outcomes agree with
//! an independent verifier (rustls-webpki) for every perturbation that
//! verifier enforces.

use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use pathval_certs::{Issuance, KeyStore};
use pathval_fixture::{blocks, Fixture};
use rustls_pki_types::{CertificateDer, SignatureVerificationAlgorithm, UnixTime};
use x509_parser::prelude::{FromDer, X509Certificate};

/// The core perturbation scenarios the external test suite depends on;
/// catalog revisions must keep every one of these.
const REQUIRED_SCENARIOS: &[&str] = &[
    "intermediate-basic-constraints-ca-false",
    "intermediate-lacks-basic-constraints",
    "intermediate-unknown-critical-extension",
    "target-has-keycertsign-but-not-ca",
    "target-signed-by-512bit-rsa",
    "unknown-root",
    "violates-pathlen-1-root",
];

const SUCCESS_SCENARIOS: &[&str] = &[
    "target-and-intermediate",
    "intermediate-basic-constraints-not-critical",
    "intermediate-unknown-non-critical-extension",
    "target-signed-using-ecdsa",
    "violates-pathlen-1-root",
];

// Expected failures whose perturbation webpki enforces. The two key usage
// scenarios are excluded: key usage enforcement is verifier-specific, and
// their perturbation is asserted structurally instead.
const WEBPKI_REJECTED_SCENARIOS: &[&str] = &[
    "intermediate-basic-constraints-ca-false",
    "intermediate-lacks-basic-constraints",
    "intermediate-unknown-critical-extension",
    "target-not-end-entity",
    "target-signed-by-512bit-rsa",
    "target-wrong-signature",
    "expired-intermediate",
    "expired-target",
    "target-not-yet-valid",
    "unknown-root",
    "violates-basic-constraints-pathlen-0",
];

// One key store for the whole test binary: scenarios share subject names,
// so sharing the store keeps key generation down to a handful of keys.
fn keys() -> MutexGuard<'static, KeyStore> {
    static KEYS: OnceLock<Mutex<KeyStore>> = OnceLock::new();
    KEYS.get_or_init(|| Mutex::new(KeyStore::ephemeral()))
        .lock()
        .unwrap()
}

fn build(name: &str) -> Fixture {
    let scenarios = pathval_gen::scenarios::all();
    let scenario = scenarios
        .iter()
        .find(|scenario| scenario.name == name)
        .expect("scenario not in catalog");
    let mut keys = keys();
    let mut ctx = Issuance::new(&mut keys);
    (scenario.build)(&mut ctx).expect("building scenario failed")
}

fn parse(der: &[u8]) -> X509Certificate<'_> {
    X509Certificate::from_der(der).expect("generated cert did not parse").1
}

static ALGS: &[&dyn SignatureVerificationAlgorithm] = &[
    webpki::ring::RSA_PKCS1_2048_8192_SHA256,
    webpki::ring::ECDSA_P256_SHA256,
];

// Verify the fixture's chain against its own anchors at its own time,
// independently of the generator's expectations.
fn verify(fixture: &Fixture) -> Result<(), webpki::Error> {
    let anchor_der = CertificateDer::from(fixture.trust_anchors[0].der.clone());
    let anchor = webpki::anchor_from_trusted_cert(&anchor_der)?;
    let target_der = CertificateDer::from(fixture.chain[0].der.clone());
    let intermediates = fixture.chain[1..]
        .iter()
        .map(|cert| CertificateDer::from(cert.der.clone()))
        .collect::<Vec<_>>();
    let target = webpki::EndEntityCert::try_from(&target_der)?;
    let time = UnixTime::since_unix_epoch(Duration::from_secs(
        u64::try_from(fixture.time.unix_timestamp()).expect("pre-epoch verification time"),
    ));
    target
        .verify_for_usage(
            ALGS,
            &[anchor],
            &intermediates,
            time,
            webpki::KeyUsage::server_auth(),
            None,
            None,
        )
        .map(|_| ())
}

// Pull one block back out of rendered fixture text.
fn block(contents: &str, tag: &str) -> Vec<u8> {
    let begin = format!("-----BEGIN {tag}-----");
    let end = format!("-----END {tag}-----");
    let start = contents.find(&begin).expect("block start missing");
    let stop = contents.find(&end).expect("block end missing") + end.len();
    pem::parse(&contents[start..stop])
        .expect("block did not parse")
        .contents()
        .to_vec()
}

#[test]
fn catalog_names_are_unique_and_cover_the_required_set() {
    let scenarios = pathval_gen::scenarios::all();
    assert_eq!(scenarios.len(), 18);

    let mut names = scenarios
        .iter()
        .map(|scenario| scenario.name)
        .collect::<Vec<_>>();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), scenarios.len(), "duplicate scenario names");

    for required in REQUIRED_SCENARIOS {
        assert!(
            names.contains(required),
            "required scenario {required} missing from catalog"
        );
    }
}

#[test]
fn every_scenario_renders_a_self_contained_fixture() {
    for scenario in pathval_gen::scenarios::all() {
        let mut keys = keys();
        let mut ctx = Issuance::new(&mut keys);
        let fixture = (scenario.build)(&mut ctx).expect("building scenario failed");
        drop(keys);

        // The target certificate sits at index 0 of every chain.
        assert_eq!(fixture.chain[0].label, "Target", "{}", scenario.name);

        let rendered = fixture.render().expect("rendering failed");
        assert!(
            rendered.starts_with("Certificate chain"),
            "{}: description missing",
            scenario.name
        );

        // The whole chain round-trips through a standard PEM reader, in
        // order, and the trust anchors stay out of the CERTIFICATE blocks.
        let mut reader = rendered.as_bytes();
        let chain_ders = rustls_pemfile::certs(&mut reader)
            .collect::<Result<Vec<_>, _>>()
            .expect("re-reading chain failed");
        assert_eq!(chain_ders.len(), fixture.chain.len(), "{}", scenario.name);
        for (read, written) in chain_ders.iter().zip(&fixture.chain) {
            assert_eq!(read.as_ref(), written.der.as_slice(), "{}", scenario.name);
        }

        assert_eq!(block(&rendered, blocks::TIME), b"150301120000Z");
        let expected = if fixture.verify_result {
            b"SUCCESS".as_slice()
        } else {
            b"FAIL".as_slice()
        };
        assert_eq!(block(&rendered, blocks::VERIFY_RESULT), expected);
    }
}

#[test]
fn expected_success_chains_verify_independently() {
    for name in SUCCESS_SCENARIOS {
        let fixture = build(name);
        assert!(fixture.verify_result, "{name} should expect success");
        if let Err(err) = verify(&fixture) {
            panic!("{name}: expected chain to verify, got {err:?}");
        }
    }
}

#[test]
fn expected_failure_chains_are_rejected_independently() {
    for name in WEBPKI_REJECTED_SCENARIOS {
        let fixture = build(name);
        assert!(!fixture.verify_result, "{name} should expect failure");
        assert!(
            verify(&fixture).is_err(),
            "{name}: expected chain to be rejected"
        );
    }
}

#[test]
fn ca_false_fixture_pins_the_verifier_diagnostic() {
    let fixture = build("intermediate-basic-constraints-ca-false");
    let rendered = fixture.render().unwrap();
    assert_eq!(
        block(&rendered, blocks::ERRORS),
        b"[Context] Processing Certificate\n  index: 0\n      [Error] Basic Constraints indicates not a CA\n"
    );

    let intermediate = &fixture.chain[1].der;
    let cert = parse(intermediate);
    let bc = cert.tbs_certificate.basic_constraints().unwrap().unwrap();
    assert!(bc.critical);
    assert!(!bc.value.ca);
}

#[test]
fn lacks_basic_constraints_fixture_omits_the_extension() {
    let fixture = build("intermediate-lacks-basic-constraints");
    let cert = parse(&fixture.chain[1].der);
    assert!(cert.tbs_certificate.basic_constraints().unwrap().is_none());
}

#[test]
fn unknown_critical_extension_fixture_carries_the_extension() {
    let fixture = build("intermediate-unknown-critical-extension");
    let cert = parse(&fixture.chain[1].der);
    let ext = cert
        .tbs_certificate
        .extensions()
        .iter()
        .find(|ext| ext.oid.to_id_string() == "1.2.3.4")
        .expect("unknown extension missing");
    assert!(ext.critical);
    assert_eq!(ext.value, &[0x01, 0x02, 0x03, 0x04][..]);
}

#[test]
fn keycertsign_fixture_asserts_the_bit_without_ca() {
    let fixture = build("target-has-keycertsign-but-not-ca");
    let cert = parse(&fixture.chain[0].der);
    let bc = cert.tbs_certificate.basic_constraints().unwrap().unwrap();
    assert!(!bc.value.ca);
    let ku = cert.tbs_certificate.key_usage().unwrap().unwrap();
    assert!(ku.value.key_cert_sign());
}

#[test]
fn lacks_signing_key_usage_fixture_clears_keycertsign() {
    let fixture = build("intermediate-lacks-signing-key-usage");
    assert!(!fixture.verify_result);
    let cert = parse(&fixture.chain[1].der);
    let ku = cert.tbs_certificate.key_usage().unwrap().unwrap();
    assert!(!ku.value.key_cert_sign());
    assert!(ku.value.digital_signature());
}

#[test]
fn weak_rsa_fixture_uses_a_sub_1024_bit_signer() {
    let fixture = build("target-signed-by-512bit-rsa");
    let cert = parse(&fixture.chain[1].der);
    match cert.tbs_certificate.subject_pki.parsed().unwrap() {
        x509_parser::public_key::PublicKey::RSA(key) => {
            assert!(key.key_size() < 1024);
        }
        other => panic!("expected an RSA key, got {other:?}"),
    }
}

#[test]
fn unknown_root_fixture_trusts_an_unrelated_anchor() {
    let fixture = build("unknown-root");
    assert_eq!(fixture.trust_anchors[0].label, "BogusRoot");

    let anchor = parse(&fixture.trust_anchors[0].der);
    let intermediate = parse(&fixture.chain[1].der);
    assert_ne!(
        anchor.tbs_certificate.subject.to_string(),
        intermediate.tbs_certificate.issuer.to_string()
    );
}

#[test]
fn expiry_fixtures_miss_the_verification_time() {
    let fixture = build("expired-target");
    let not_after = parse(&fixture.chain[0].der)
        .tbs_certificate
        .validity
        .not_after
        .timestamp();
    assert!(not_after < fixture.time.unix_timestamp());

    let fixture = build("target-not-yet-valid");
    let not_before = parse(&fixture.chain[0].der)
        .tbs_certificate
        .validity
        .not_before
        .timestamp();
    assert!(not_before > fixture.time.unix_timestamp());
}

#[test]
fn pathlen_fixtures_encode_their_constraints() {
    let fixture = build("violates-pathlen-1-root");
    assert_eq!(fixture.chain.len(), 3);
    let root = parse(&fixture.trust_anchors[0].der);
    let bc = root.tbs_certificate.basic_constraints().unwrap().unwrap();
    assert_eq!(bc.value.path_len_constraint, Some(1));

    let fixture = build("violates-basic-constraints-pathlen-0");
    let first_intermediate = parse(&fixture.chain[2].der);
    let bc = first_intermediate
        .tbs_certificate
        .basic_constraints()
        .unwrap()
        .unwrap();
    assert_eq!(bc.value.path_len_constraint, Some(0));
}

#[test]
fn wrong_signature_fixture_presents_a_different_signer_key() {
    let fixture = build("target-wrong-signature");
    let target = parse(&fixture.chain[0].der);
    let intermediate = parse(&fixture.chain[1].der);
    // Same issuer name as far as the chain claims...
    assert_eq!(
        target.tbs_certificate.issuer.to_string(),
        intermediate.tbs_certificate.subject.to_string()
    );
    // ...but the presented intermediate can't verify the signature.
    assert!(verify(&fixture).is_err());
}

#[test]
fn rsa_scenarios_regenerate_byte_identical() {
    let first = build("target-and-intermediate").render().unwrap();
    let second = build("target-and-intermediate").render().unwrap();
    assert_eq!(first, second);
}
