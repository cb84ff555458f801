use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;

use crate::Result;

/// The kind and strength of key material backing a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec {
    /// An RSA key with the given modulus size in bits.
    Rsa { bits: usize },
    /// An ECDSA key on the P-256 curve.
    EcdsaP256,
}

impl KeySpec {
    /// The key used when a scenario doesn't say otherwise.
    pub const DEFAULT: KeySpec = KeySpec::Rsa { bits: 2048 };

    /// A short identifier used to key the [`KeyStore`] cache and name key
    /// files on disk.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            KeySpec::Rsa { bits } => format!("rsa-{bits}"),
            KeySpec::EcdsaP256 => "ecdsa-p256".to_owned(),
        }
    }
}

/// A named cache of private keys.
///
/// Keys are cached by owner name and [`KeySpec`], so two certificates for
/// the same subject and spec share key material within a store, while a
/// scenario that needs a same-named certificate with *different* keys can
/// ask under a different owner name.
///
/// A [`KeyStore::persistent`] store additionally writes each generated key
/// to `<dir>/<owner>.<spec>.key` as PKCS#8 PEM and reloads it on later
/// runs. Reusing a key directory is what makes regenerated fixtures
/// byte-identical across generator runs.
pub struct KeyStore {
    dir: Option<PathBuf>,
    cache: HashMap<String, String>,
}

impl KeyStore {
    /// A store that keeps generated keys in memory only.
    #[must_use]
    pub fn ephemeral() -> Self {
        KeyStore {
            dir: None,
            cache: HashMap::new(),
        }
    }

    /// A store backed by a directory of PKCS#8 PEM key files, created if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory can not be created.
    pub fn persistent(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(KeyStore {
            dir: Some(dir),
            cache: HashMap::new(),
        })
    }

    /// Return a signing key pair for `owner`, generating (and caching) one
    /// if the store doesn't have it yet.
    ///
    /// # Errors
    ///
    /// Returns an error if key generation fails, if a cached key file can't
    /// be read or parsed, or if a freshly generated key can't be written to
    /// a persistent store.
    pub fn key_pair(&mut self, owner: &str, spec: KeySpec) -> Result<rcgen::KeyPair> {
        let pem = self.key_pem(owner, spec)?;
        match spec {
            KeySpec::Rsa { .. } => rsa_key_pair(&RsaPrivateKey::from_pkcs8_pem(&pem)?),
            KeySpec::EcdsaP256 => Ok(rcgen::KeyPair::from_pem(&pem)?),
        }
    }

    fn key_pem(&mut self, owner: &str, spec: KeySpec) -> Result<String> {
        let id = format!("{owner}.{}", spec.label());
        if let Some(pem) = self.cache.get(&id) {
            return Ok(pem.clone());
        }

        if let Some(path) = self.key_path(&id) {
            if path.exists() {
                let pem = fs::read_to_string(&path)?;
                self.cache.insert(id, pem.clone());
                return Ok(pem);
            }
        }

        let pem = generate_key_pem(spec)?;
        if let Some(path) = self.key_path(&id) {
            fs::write(&path, &pem)?;
        }
        self.cache.insert(id, pem.clone());
        Ok(pem)
    }

    fn key_path(&self, id: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{id}.key")))
    }
}

fn generate_key_pem(spec: KeySpec) -> Result<String> {
    match spec {
        KeySpec::Rsa { bits } => {
            let key = RsaPrivateKey::new(&mut OsRng, bits)?;
            Ok(key.to_pkcs8_pem(LineEnding::LF)?.to_string())
        }
        KeySpec::EcdsaP256 => {
            Ok(rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)?.serialize_pem())
        }
    }
}

// rcgen's default signing backend refuses RSA keys under 1024 bits, and the
// weak-key scenarios need 512. All RSA signing therefore goes through
// rcgen's remote key seam, with the rsa crate doing PKCS#1 v1.5 over
// SHA-256 itself.
struct RsaSigner {
    signing_key: SigningKey<Sha256>,
    public_key_der: Vec<u8>,
}

impl rcgen::RemoteKeyPair for RsaSigner {
    fn public_key(&self) -> &[u8] {
        &self.public_key_der
    }

    fn sign(&self, msg: &[u8]) -> core::result::Result<Vec<u8>, rcgen::Error> {
        self.signing_key
            .try_sign(msg)
            .map(|sig| sig.to_vec())
            .map_err(|_| rcgen::Error::RemoteKeyError)
    }

    fn algorithm(&self) -> &'static rcgen::SignatureAlgorithm {
        &rcgen::PKCS_RSA_SHA256
    }
}

fn rsa_key_pair(key: &RsaPrivateKey) -> Result<rcgen::KeyPair> {
    let public_key_der = key.to_public_key().to_pkcs1_der()?.into_vec();
    let signer = RsaSigner {
        signing_key: SigningKey::new(key.clone()),
        public_key_der,
    };
    Ok(rcgen::KeyPair::from_remote(Box::new(signer))?)
}

#[cfg(test)]
mod tests {
    use super::{KeySpec, KeyStore};

    #[test]
    fn key_spec_labels() {
        assert_eq!(KeySpec::Rsa { bits: 512 }.label(), "rsa-512");
        assert_eq!(KeySpec::DEFAULT.label(), "rsa-2048");
        assert_eq!(KeySpec::EcdsaP256.label(), "ecdsa-p256");
    }

    #[test]
    fn ephemeral_store_reuses_keys_per_owner() {
        let mut store = KeyStore::ephemeral();
        let spec = KeySpec::Rsa { bits: 1024 };

        let first = store.key_pair("Root", spec).unwrap();
        let again = store.key_pair("Root", spec).unwrap();
        assert_eq!(first.public_key_raw(), again.public_key_raw());

        let other_owner = store.key_pair("Root-alt", spec).unwrap();
        assert_ne!(first.public_key_raw(), other_owner.public_key_raw());
    }

    #[test]
    fn distinct_specs_get_distinct_keys() {
        let mut store = KeyStore::ephemeral();
        let small = store.key_pair("Root", KeySpec::Rsa { bits: 512 }).unwrap();
        let large = store.key_pair("Root", KeySpec::Rsa { bits: 1024 }).unwrap();
        assert_ne!(small.public_key_raw(), large.public_key_raw());
    }

    #[test]
    fn ecdsa_keys_round_trip_through_the_cache() {
        let mut store = KeyStore::ephemeral();
        let first = store.key_pair("Target", KeySpec::EcdsaP256).unwrap();
        let again = store.key_pair("Target", KeySpec::EcdsaP256).unwrap();
        assert_eq!(first.public_key_raw(), again.public_key_raw());
    }
}
