use std::error::Error;
use std::{fmt, io};

#[derive(Debug)]
#[non_exhaustive]
/// An error that can occur while generating key material or issuing a test
/// certificate.
pub enum BuildError {
    #[non_exhaustive]
    /// RSA key generation failed.
    KeyGen { source: rsa::Error },
    #[non_exhaustive]
    /// A private key could not be encoded to, or decoded from, PKCS#8 PEM.
    KeyPem { source: rsa::pkcs8::Error },
    #[non_exhaustive]
    /// An RSA public key could not be encoded as PKCS#1 DER.
    PublicKeyDer { source: rsa::pkcs1::Error },
    #[non_exhaustive]
    /// Certificate parameters could not be assembled or signed.
    Certificate { source: rcgen::Error },
    #[non_exhaustive]
    /// A key store directory or key file could not be read or written.
    KeyIo { source: io::Error },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::KeyGen { source } => {
                write!(f, "generating RSA key: {source}")
            }
            BuildError::KeyPem { source } => {
                write!(f, "encoding or decoding key PEM: {source}")
            }
            BuildError::PublicKeyDer { source } => {
                write!(f, "encoding RSA public key: {source}")
            }
            BuildError::Certificate { source } => {
                write!(f, "issuing certificate: {source}")
            }
            BuildError::KeyIo { source } => {
                write!(f, "reading or writing key store: {source}")
            }
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BuildError::KeyGen { source } => Some(source),
            BuildError::KeyPem { source } => Some(source),
            BuildError::PublicKeyDer { source } => Some(source),
            BuildError::Certificate { source } => Some(source),
            BuildError::KeyIo { source } => Some(source),
        }
    }
}

impl From<rsa::Error> for BuildError {
    fn from(source: rsa::Error) -> Self {
        BuildError::KeyGen { source }
    }
}

impl From<rsa::pkcs8::Error> for BuildError {
    fn from(source: rsa::pkcs8::Error) -> Self {
        BuildError::KeyPem { source }
    }
}

impl From<rsa::pkcs1::Error> for BuildError {
    fn from(source: rsa::pkcs1::Error) -> Self {
        BuildError::PublicKeyDer { source }
    }
}

impl From<rcgen::Error> for BuildError {
    fn from(source: rcgen::Error) -> Self {
        BuildError::Certificate { source }
    }
}

impl From<io::Error> for BuildError {
    fn from(source: io::Error) -> Self {
        BuildError::KeyIo { source }
    }
}
