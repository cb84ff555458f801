use time::macros::datetime;
use time::OffsetDateTime;

use crate::keys::{KeySpec, KeyStore};
use crate::Result;

/// Start of the validity window certificates get by default.
pub const DEFAULT_NOT_BEFORE: OffsetDateTime = datetime!(2015-01-01 12:00 UTC);

/// End of the validity window certificates get by default.
pub const DEFAULT_NOT_AFTER: OffsetDateTime = datetime!(2016-01-01 12:00 UTC);

/// OID for an extension no verifier recognizes, used by the
/// unknown-extension scenarios.
pub const UNKNOWN_EXTENSION_OID: &[u64] = &[1, 2, 3, 4];

/// DER value carried by the unknown extension.
pub const UNKNOWN_EXTENSION_VALUE: &[u8] = &[0x01, 0x02, 0x03, 0x04];

// id-ce-basicConstraints, and the DER encoding of BasicConstraints with cA
// asserted and no path length. Only used when a scenario needs the
// extension rendered with non-default criticality.
const BASIC_CONSTRAINTS_OID: &[u64] = &[2, 5, 29, 19];
const BASIC_CONSTRAINTS_CA_TRUE: &[u8] = &[0x30, 0x03, 0x01, 0x01, 0xFF];

/// How a certificate's basic constraints extension should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicConstraintsSpec {
    /// No basic constraints extension at all.
    Omitted,
    /// Critical, CA=false.
    NotCa,
    /// Critical, CA=true, with an optional path length constraint.
    Ca { path_len: Option<u8> },
    /// CA=true, rendered as a non-critical extension.
    CaNotCritical,
}

#[derive(Debug, Clone)]
struct ExtensionSpec {
    oid: Vec<u64>,
    critical: bool,
    value: Vec<u8>,
}

/// Per-scenario issuing context: the key store to draw key material from,
/// and a serial number counter that starts at 1 and increments with every
/// certificate issued.
pub struct Issuance<'k> {
    keys: &'k mut KeyStore,
    next_serial: u64,
}

impl<'k> Issuance<'k> {
    pub fn new(keys: &'k mut KeyStore) -> Self {
        Issuance {
            keys,
            next_serial: 1,
        }
    }

    fn serial(&mut self) -> rcgen::SerialNumber {
        let serial = self.next_serial;
        self.next_serial += 1;
        let bytes = serial.to_be_bytes();
        let start = bytes
            .iter()
            .position(|b| *b != 0)
            .unwrap_or(bytes.len() - 1);
        rcgen::SerialNumber::from_slice(&bytes[start..])
    }

    fn key_pair(&mut self, owner: &str, spec: KeySpec) -> Result<rcgen::KeyPair> {
        self.keys.key_pair(owner, spec)
    }
}

/// The specification of one certificate prior to issuance.
///
/// The constructors set up the standard profiles for roots, intermediates,
/// and end-entity certificates; a scenario then perturbs at most a field or
/// two through the setters before issuing.
pub struct CertBuilder {
    name: String,
    key_name: Option<String>,
    key_spec: KeySpec,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
    basic_constraints: BasicConstraintsSpec,
    key_usages: Vec<rcgen::KeyUsagePurpose>,
    extended_key_usages: Vec<rcgen::ExtendedKeyUsagePurpose>,
    extra_extensions: Vec<ExtensionSpec>,
}

impl CertBuilder {
    /// A self-signable CA profile: critical CA=true basic constraints,
    /// keyCertSign and cRLSign key usages.
    #[must_use]
    pub fn root(name: &str) -> Self {
        Self::authority(name)
    }

    /// An intermediate CA profile. Identical to [`CertBuilder::root`]; the
    /// difference is only in who signs the result.
    #[must_use]
    pub fn intermediate(name: &str) -> Self {
        Self::authority(name)
    }

    /// An end-entity profile: critical CA=false basic constraints,
    /// digitalSignature and keyEncipherment key usages, serverAuth and
    /// clientAuth extended key usages.
    #[must_use]
    pub fn end_entity(name: &str) -> Self {
        CertBuilder {
            basic_constraints: BasicConstraintsSpec::NotCa,
            key_usages: vec![
                rcgen::KeyUsagePurpose::DigitalSignature,
                rcgen::KeyUsagePurpose::KeyEncipherment,
            ],
            extended_key_usages: vec![
                rcgen::ExtendedKeyUsagePurpose::ServerAuth,
                rcgen::ExtendedKeyUsagePurpose::ClientAuth,
            ],
            ..Self::bare(name)
        }
    }

    fn authority(name: &str) -> Self {
        CertBuilder {
            basic_constraints: BasicConstraintsSpec::Ca { path_len: None },
            key_usages: vec![
                rcgen::KeyUsagePurpose::KeyCertSign,
                rcgen::KeyUsagePurpose::CrlSign,
            ],
            ..Self::bare(name)
        }
    }

    fn bare(name: &str) -> Self {
        CertBuilder {
            name: name.to_owned(),
            key_name: None,
            key_spec: KeySpec::DEFAULT,
            not_before: DEFAULT_NOT_BEFORE,
            not_after: DEFAULT_NOT_AFTER,
            basic_constraints: BasicConstraintsSpec::Omitted,
            key_usages: Vec::new(),
            extended_key_usages: Vec::new(),
            extra_extensions: Vec::new(),
        }
    }

    /// Replace the default 2048-bit RSA key.
    #[must_use]
    pub fn key_spec(mut self, spec: KeySpec) -> Self {
        self.key_spec = spec;
        self
    }

    /// Draw key material under a different owner name than the subject.
    /// Lets a scenario mint two same-named certificates with different
    /// keys.
    #[must_use]
    pub fn key_name(mut self, name: &str) -> Self {
        self.key_name = Some(name.to_owned());
        self
    }

    /// Replace the default validity window.
    #[must_use]
    pub fn validity(mut self, not_before: OffsetDateTime, not_after: OffsetDateTime) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    /// Replace the profile's basic constraints.
    #[must_use]
    pub fn basic_constraints(mut self, spec: BasicConstraintsSpec) -> Self {
        self.basic_constraints = spec;
        self
    }

    /// Replace the profile's key usages. An empty list omits the extension.
    #[must_use]
    pub fn key_usages(mut self, usages: Vec<rcgen::KeyUsagePurpose>) -> Self {
        self.key_usages = usages;
        self
    }

    /// Replace the profile's extended key usages.
    #[must_use]
    pub fn extended_key_usages(mut self, usages: Vec<rcgen::ExtendedKeyUsagePurpose>) -> Self {
        self.extended_key_usages = usages;
        self
    }

    /// Add an extension by OID, with an explicit criticality flag and raw
    /// DER value.
    #[must_use]
    pub fn add_extension(mut self, oid: &[u64], critical: bool, value: Vec<u8>) -> Self {
        self.extra_extensions.push(ExtensionSpec {
            oid: oid.to_owned(),
            critical,
            value,
        });
        self
    }

    /// Issue this certificate signed by its own key.
    ///
    /// # Errors
    ///
    /// Returns an error if key material can't be obtained or if signing
    /// fails.
    pub fn issue_self_signed(self, ctx: &mut Issuance<'_>) -> Result<IssuedCert> {
        let key = ctx.key_pair(self.key_owner(), self.key_spec)?;
        let name = self.name.clone();
        let cert = self.params(ctx).self_signed(&key)?;
        Ok(IssuedCert { name, cert, key })
    }

    /// Issue this certificate signed by `issuer`.
    ///
    /// # Errors
    ///
    /// Returns an error if key material can't be obtained or if signing
    /// fails.
    pub fn issue(self, issuer: &IssuedCert, ctx: &mut Issuance<'_>) -> Result<IssuedCert> {
        let key = ctx.key_pair(self.key_owner(), self.key_spec)?;
        let name = self.name.clone();
        let cert = self.params(ctx).signed_by(&key, &issuer.cert, &issuer.key)?;
        Ok(IssuedCert { name, cert, key })
    }

    fn key_owner(&self) -> &str {
        self.key_name.as_deref().unwrap_or(&self.name)
    }

    fn params(self, ctx: &mut Issuance<'_>) -> rcgen::CertificateParams {
        let mut params = rcgen::CertificateParams::default();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, self.name.as_str());
        params.not_before = self.not_before;
        params.not_after = self.not_after;
        params.serial_number = Some(ctx.serial());
        params.key_identifier_method = rcgen::KeyIdMethod::Sha256;
        params.use_authority_key_identifier_extension = true;

        params.is_ca = match self.basic_constraints {
            BasicConstraintsSpec::Omitted | BasicConstraintsSpec::CaNotCritical => {
                rcgen::IsCa::NoCa
            }
            BasicConstraintsSpec::NotCa => rcgen::IsCa::ExplicitNoCa,
            BasicConstraintsSpec::Ca { path_len: None } => {
                rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained)
            }
            BasicConstraintsSpec::Ca {
                path_len: Some(len),
            } => rcgen::IsCa::Ca(rcgen::BasicConstraints::Constrained(len)),
        };
        if self.basic_constraints == BasicConstraintsSpec::CaNotCritical {
            // rcgen only writes basic constraints critical, so the
            // non-critical rendering goes in as a raw extension.
            params.custom_extensions.push(
                rcgen::CustomExtension::from_oid_content(
                    BASIC_CONSTRAINTS_OID,
                    BASIC_CONSTRAINTS_CA_TRUE.to_vec(),
                ),
            );
        }

        params.key_usages = self.key_usages;
        params.extended_key_usages = self.extended_key_usages;

        for ext in self.extra_extensions {
            let mut custom = rcgen::CustomExtension::from_oid_content(&ext.oid, ext.value);
            custom.set_criticality(ext.critical);
            params.custom_extensions.push(custom);
        }
        params
    }
}

/// An issued certificate, retaining its key pair so it can sign children.
pub struct IssuedCert {
    name: String,
    cert: rcgen::Certificate,
    key: rcgen::KeyPair,
}

impl IssuedCert {
    /// The subject common name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The certificate's DER encoding.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        self.cert.der().as_ref()
    }
}
