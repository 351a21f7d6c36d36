//! The pki_environment_traits module features trait definitions and type definitions that are used
//! by [`PkiEnvironment`] to provide cryptographic and storage functionality that supports trust
//! policy verification.

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::name::Name;

use crate::util::error::*;
use crate::PkiEnvironment;

/// `CalculateHash` provides a function signature for implementations that perform hashing
pub type CalculateHash = fn(
    &PkiEnvironment,
    &AlgorithmIdentifierOwned, // hash alg
    &[u8],                     // buffer to hash
) -> Result<Vec<u8>>;

/// `VerifySignatureMessage` provides a function signature for implementations that perform signature
/// verification over a message.
///
/// Implementations return `Error::Unrecognized` when the algorithm is not supported (so another
/// callback can be tried), `Error::Trust(TrustStatus::PublicKeyIncomplete)` when the public key lacks
/// parameters that must be inherited from an issuer and `Error::Trust(TrustStatus::SignatureVerificationFailure)`
/// when the signature does not verify.
pub type VerifySignatureMessage = fn(
    &PkiEnvironment,
    &[u8],                      // message to hash and verify
    &[u8],                      // signature
    &AlgorithmIdentifierOwned,  // signature algorithm
    &SubjectPublicKeyInfoOwned, // public key
) -> Result<()>;

/// The [`CertificateSource`] trait enables trait objects to provide access to certificates backed via
/// some means, i.e., in-memory, file-based, keychain accessed via FFI, etc.
///
/// Implementations that serialize access internally are expected to report a timeout or other
/// failure to answer as `Error::StoreUnavailable`, never as an empty result.
pub trait CertificateSource {
    /// get_encoded_certificates_for_name returns the encoded certificates whose subject matches the
    /// presented name.
    fn get_encoded_certificates_for_name(&self, name: &Name) -> Result<Vec<Vec<u8>>>;
}

/// The [`CrlSource`] trait enables trait objects to provide access to CRLs backed via some means.
pub trait CrlSource {
    /// get_encoded_crls_for_issuer returns the encoded CRLs whose issuer matches the presented name
    /// and whose thisUpdate/nextUpdate window covers the presented time of interest.
    fn get_encoded_crls_for_issuer(&self, issuer: &Name, time_of_interest: u64)
        -> Result<Vec<Vec<u8>>>;
}
