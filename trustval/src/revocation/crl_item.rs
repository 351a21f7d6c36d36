//! Wrapper around a parsed CRL along with its memoized verification state

use std::cell::RefCell;
use std::collections::BTreeMap;

use const_oid::db::rfc5912::{ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_ISSUING_DISTRIBUTION_POINT};
use der::asn1::ObjectIdentifier;
use der::Decode;
use log::error;
use sha2::{Digest, Sha256};
use spki::SubjectPublicKeyInfoOwned;
use x509_cert::crl::{CertificateList, RevokedCert};
use x509_cert::ext::pkix::IssuingDistributionPoint;
use x509_cert::name::Name;

use crate::util::error::*;
use crate::validator::cert_item::DeferDecodeSigned;
use crate::validator::policy_settings::TrustStatuses;
use crate::validator::tp_extension::*;
use crate::PkiEnvironment;

/// `CrlState` is the verification state of a [`CrlItem`] under one verification context.
///
/// Items start out `Unknown`, move to `InProgress` while the signer chain is being verified and end
/// in either `Good` or `Bad`. The terminal states are memoized.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrlState {
    /// Verification has not been attempted
    Unknown,
    /// Verification is underway
    InProgress,
    /// The CRL verified
    Good,
    /// The CRL failed verification for the given reason
    Bad(TrustStatus),
}

/// `CrlContextKey` identifies the inputs that influence the outcome of CRL verification. A result
/// memoized under one key is never consulted under another.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
pub struct CrlContextKey {
    /// Time of interest as seconds since the Unix epoch
    pub time_of_interest: u64,
    /// Fingerprint of the set of trust anchors
    pub anchors: Vec<u8>,
    /// Status values the caller declared tolerable
    pub tolerated: TrustStatuses,
    /// Whether revocation status of CRL signers is checked for direct CRLs
    pub check_signer_revocation: bool,
}

/// [`CrlItem`] aggregates a binary, DER-encoded CRL, the parsed CRL, the thisUpdate and nextUpdate
/// times and the parsed CRL extensions of interest.
#[derive(Clone)]
#[readonly::make]
pub struct CrlItem {
    /// Binary, encoded CertificateList object
    #[readonly]
    pub encoded_crl: Vec<u8>,
    /// Decoded CertificateList object
    #[readonly]
    pub decoded_crl: CertificateList,
    /// thisUpdate as seconds since the Unix epoch
    #[readonly]
    pub this_update: u64,
    /// nextUpdate as seconds since the Unix epoch, if present
    #[readonly]
    pub next_update: Option<u64>,
    /// Optional locator, i.e., a file name, for troubleshooting purposes
    #[readonly]
    pub locator: Option<String>,
    /// Extensions from [`CRL_EXTS_OF_INTEREST`] that were present in the CRL
    #[readonly]
    pub parsed_extensions: ParsedExtensions,
    states: RefCell<BTreeMap<CrlContextKey, CrlState>>,
    tolerated: RefCell<BTreeMap<CrlContextKey, TrustStatuses>>,
}

impl core::fmt::Debug for CrlItem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CrlItem({})", self.decoded_crl.tbs_cert_list.issuer)
    }
}

impl PartialEq for CrlItem {
    fn eq(&self, other: &Self) -> bool {
        self.encoded_crl == other.encoded_crl
    }
}

impl TryFrom<&[u8]> for CrlItem {
    type Error = Error;

    fn try_from(enc_crl: &[u8]) -> Result<Self> {
        CrlItem::from_der(enc_crl)
    }
}

impl CrlItem {
    /// `from_der` parses the given buffer, returning `TrustStatus::MalformedCrl` if the buffer does
    /// not contain a CRL.
    pub fn from_der(enc_crl: &[u8]) -> Result<Self> {
        let crl = match CertificateList::from_der(enc_crl) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to parse CRL: {}", e);
                return Err(Error::Trust(TrustStatus::MalformedCrl));
            }
        };
        let this_update = crl.tbs_cert_list.this_update.to_unix_duration().as_secs();
        let next_update = crl
            .tbs_cert_list
            .next_update
            .map(|nu| nu.to_unix_duration().as_secs());
        let parsed_extensions = parse_extensions(
            crl.tbs_cert_list.crl_extensions.as_ref(),
            CRL_EXTS_OF_INTEREST,
        );
        Ok(CrlItem {
            encoded_crl: enc_crl.to_vec(),
            decoded_crl: crl,
            this_update,
            next_update,
            locator: None,
            parsed_extensions,
            states: RefCell::new(BTreeMap::new()),
            tolerated: RefCell::new(BTreeMap::new()),
        })
    }

    /// `from_der_with_locator` parses the given buffer and records where it came from.
    pub fn from_der_with_locator(enc_crl: &[u8], locator: &str) -> Result<Self> {
        let mut crl = CrlItem::from_der(enc_crl).map_err(|e| {
            error!("Failed to parse CRL from {}", locator);
            e
        })?;
        crl.locator = Some(locator.to_string());
        Ok(crl)
    }

    /// Returns the issuer name
    pub fn issuer(&self) -> &Name {
        &self.decoded_crl.tbs_cert_list.issuer
    }

    /// Returns the entries of the CRL
    pub fn revoked_certificates(&self) -> &[RevokedCert] {
        match &self.decoded_crl.tbs_cert_list.revoked_certificates {
            Some(rc) => rc.as_slice(),
            None => &[],
        }
    }

    /// Returns true if thisUpdate follows the time of interest.
    pub fn is_not_valid_yet(&self, time_of_interest: u64) -> bool {
        self.this_update > time_of_interest
    }

    /// Returns true if nextUpdate is present and does not follow the time of interest.
    pub fn is_expired(&self, time_of_interest: u64) -> bool {
        matches!(self.next_update, Some(nu) if nu <= time_of_interest)
    }

    /// Returns the keyIdentifier field of the authorityKeyIdentifier extension, if present
    pub fn authority_key_identifier(&self) -> Option<&[u8]> {
        if let Some(TPExtension::AuthorityKeyIdentifier(akid)) =
            self.get_extension(&ID_CE_AUTHORITY_KEY_IDENTIFIER)
        {
            return akid.key_identifier.as_ref().map(|kid| kid.as_bytes());
        }
        None
    }

    /// Returns the issuingDistributionPoint extension, if present
    pub fn issuing_distribution_point(&self) -> Option<&IssuingDistributionPoint> {
        match self.get_extension(&ID_CE_ISSUING_DISTRIBUTION_POINT) {
            Some(TPExtension::IssuingDistributionPoint(idp)) => Some(idp),
            _ => None,
        }
    }

    /// Returns true if the issuingDistributionPoint extension asserts indirectCRL
    pub fn is_indirect(&self) -> bool {
        matches!(self.issuing_distribution_point(), Some(idp) if idp.indirect_crl)
    }

    /// `verify_signed_by` verifies the CRL's signature using the given public key.
    pub fn verify_signed_by(
        &self,
        pe: &PkiEnvironment,
        signer_spki: &SubjectPublicKeyInfoOwned,
    ) -> Result<()> {
        let defer = DeferDecodeSigned::from_der(&self.encoded_crl)?;
        pe.verify_signature_message(
            &defer.tbs_field,
            defer.signature.raw_bytes(),
            &defer.signature_algorithm,
            signer_spki,
        )
    }

    /// Returns the SHA-256 digest of the encoded CRL
    pub fn sha256_digest(&self) -> Vec<u8> {
        Sha256::digest(&self.encoded_crl).to_vec()
    }

    /// Returns the verification state recorded for the given context
    pub fn state(&self, key: &CrlContextKey) -> CrlState {
        match self.states.borrow().get(key) {
            Some(s) => *s,
            None => CrlState::Unknown,
        }
    }

    /// Records the verification state for the given context
    pub fn set_state(&self, key: &CrlContextKey, state: CrlState) {
        self.states.borrow_mut().insert(key.clone(), state);
    }

    /// Returns the tolerated statuses observed while the CRL was verified under the given context
    pub fn tolerated_statuses(&self, key: &CrlContextKey) -> TrustStatuses {
        self.tolerated
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Records the tolerated statuses observed while the CRL was verified under the given context
    pub fn set_tolerated_statuses(&self, key: &CrlContextKey, statuses: TrustStatuses) {
        self.tolerated.borrow_mut().insert(key.clone(), statuses);
    }
}

impl ExtensionProcessing for CrlItem {
    fn get_extension(&self, oid: &ObjectIdentifier) -> Option<&'_ TPExtension> {
        self.parsed_extensions.get(oid).map(|e| &e.value)
    }
}

#[test]
fn malformed_crl() {
    assert_eq!(
        Some(Error::Trust(TrustStatus::MalformedCrl)),
        CrlItem::from_der(&[0x30, 0x00]).err()
    );
}
