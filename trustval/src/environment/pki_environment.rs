//! PkiEnvironment aggregates a set of function pointers and trait objects that supply the
//! cryptographic and storage functionality used when verifying certificate chains and CRLs.
//!
//! The sample below illustrates preparation of a PkiEnvironment object.
//! ```
//! use trustval::*;
//!
//! let mut pe = PkiEnvironment::default();
//!
//! // add hashing and signature verification capabilities
//! populate_default_pki_environment(&mut pe);
//!
//! // add certificate and CRL stores consulted when searching for issuers and CRLs
//! pe.add_certificate_source(Box::new(CertSource::default()));
//! pe.add_crl_source(Box::new(CrlSourceMemory::default()));
//! ```
//!
//! The aggregation of function pointers and trait objects allows for implementations of features to
//! vary. For example, one app may desire access to certificates via a system keychain (via an FFI
//! implementation) and another may use a folder of DER files.

use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::name::Name;

use crate::{environment::pki_environment_traits::*, util::crypto::*, util::error::*};

/// [`PkiEnvironment`] provides a switchboard of callback functions that allow support to vary on
/// different platforms or to allow support to be tailored for specific use cases.
#[derive(Default)]
pub struct PkiEnvironment {
    //--------------------------------------------------------------------------
    //Crypto interfaces
    //--------------------------------------------------------------------------
    /// List of functions that provide a message digest functionality
    calculate_hash_callbacks: Vec<CalculateHash>,

    /// List of functions that provide a signature verification functionality given a message
    verify_signature_message_callbacks: Vec<VerifySignatureMessage>,

    //--------------------------------------------------------------------------
    //Storage and retrieval interfaces
    //--------------------------------------------------------------------------
    /// List of trait objects that provide access to certificates
    certificate_sources: Vec<Box<(dyn CertificateSource + Send + Sync)>>,

    /// List of trait objects that provide access to CRLs
    crl_sources: Vec<Box<(dyn CrlSource + Send + Sync)>>,
}

impl PkiEnvironment {
    /// PkiEnvironment::new returns a new [`PkiEnvironment`] with empty callback vectors for each type of callback
    pub fn new() -> PkiEnvironment {
        PkiEnvironment::default()
    }

    /// clear_all_callbacks clears the contents of all function pointer and trait object vectors
    /// associated with an instance of [`PkiEnvironment`].
    pub fn clear_all_callbacks(&mut self) {
        self.clear_crl_sources();
        self.clear_certificate_sources();
        self.clear_calculate_hash_callbacks();
        self.clear_verify_signature_message_callbacks();
    }

    /// add_calculate_hash_callback adds a [`CalculateHash`] callback to the list used by calculate_hash.
    pub fn add_calculate_hash_callback(&mut self, c: CalculateHash) {
        self.calculate_hash_callbacks.push(c);
    }

    /// clear_calculate_hash_callbacks clears the list of [`CalculateHash`] callbacks used by calculate_hash.
    pub fn clear_calculate_hash_callbacks(&mut self) {
        self.calculate_hash_callbacks.clear();
    }

    /// calculate_hash iterates over calculate_hash_callbacks until an authoritative answer is found
    /// or all options have been exhausted
    pub fn calculate_hash(
        &self,
        hash_alg: &AlgorithmIdentifierOwned,
        buffer_to_hash: &[u8],
    ) -> Result<Vec<u8>> {
        for f in &self.calculate_hash_callbacks {
            if let Ok(r) = f(self, hash_alg, buffer_to_hash) {
                return Ok(r);
            }
        }
        Err(Error::Unrecognized)
    }

    /// add_verify_signature_message_callback adds a [`VerifySignatureMessage`] callback to the list used by verify_signature_message.
    pub fn add_verify_signature_message_callback(&mut self, c: VerifySignatureMessage) {
        self.verify_signature_message_callbacks.push(c);
    }

    /// clear_verify_signature_message_callbacks clears the list of [`VerifySignatureMessage`] callbacks used by verify_signature_message.
    pub fn clear_verify_signature_message_callbacks(&mut self) {
        self.verify_signature_message_callbacks.clear();
    }

    /// verify_signature_message iterates over verify_signature_message_callbacks until an authoritative
    /// answer is found or all options have been exhausted.
    ///
    /// A callback that returns `Error::Unrecognized` does not support the algorithm and the next is
    /// tried. Any other error is remembered and returned if no callback succeeds.
    pub fn verify_signature_message(
        &self,
        message_to_verify: &[u8],                 // buffer to verify
        signature: &[u8],                         // signature
        signature_alg: &AlgorithmIdentifierOwned, // signature algorithm
        spki: &SubjectPublicKeyInfoOwned,         // public key
    ) -> Result<()> {
        let mut err = None;
        for f in &self.verify_signature_message_callbacks {
            match f(self, message_to_verify, signature, signature_alg, spki) {
                Ok(r) => return Ok(r),
                Err(Error::Unrecognized) => {}
                Err(e) => err = Some(e),
            }
        }
        Err(err.unwrap_or(Error::Unrecognized))
    }

    /// add_certificate_source adds a [`CertificateSource`] object to the list searched during issuer discovery.
    pub fn add_certificate_source(&mut self, c: Box<(dyn CertificateSource + Send + Sync)>) {
        self.certificate_sources.push(c);
    }

    /// clear_certificate_sources clears the list of [`CertificateSource`] objects.
    pub fn clear_certificate_sources(&mut self) {
        self.certificate_sources.clear();
    }

    /// certificate_sources returns the [`CertificateSource`] objects in the order they were added.
    pub fn certificate_sources(&self) -> impl Iterator<Item = &(dyn CertificateSource + Send + Sync)> {
        self.certificate_sources.iter().map(|s| s.as_ref())
    }

    /// get_encoded_certificates_for_name aggregates results from all certificate sources. Any source
    /// failure is propagated.
    pub fn get_encoded_certificates_for_name(&self, name: &Name) -> Result<Vec<Vec<u8>>> {
        let mut retval = vec![];
        for s in &self.certificate_sources {
            retval.append(&mut s.get_encoded_certificates_for_name(name)?);
        }
        Ok(retval)
    }

    /// add_crl_source adds a [`CrlSource`] object to the list searched during CRL discovery.
    pub fn add_crl_source(&mut self, c: Box<(dyn CrlSource + Send + Sync)>) {
        self.crl_sources.push(c);
    }

    /// clear_crl_sources clears the list of [`CrlSource`] objects.
    pub fn clear_crl_sources(&mut self) {
        self.crl_sources.clear();
    }

    /// crl_sources returns the [`CrlSource`] objects in the order they were added.
    pub fn crl_sources(&self) -> impl Iterator<Item = &(dyn CrlSource + Send + Sync)> {
        self.crl_sources.iter().map(|s| s.as_ref())
    }
}

/// `populate_default_pki_environment` populates a [`PkiEnvironment`] object with the hashing and
/// signature verification implementations from the [Rust Crypto](https://github.com/RustCrypto) project.
pub fn populate_default_pki_environment(pe: &mut PkiEnvironment) {
    pe.add_calculate_hash_callback(calculate_hash_rust_crypto);
    pe.add_verify_signature_message_callback(verify_signature_message_rust_crypto);
}
