//! Wrapper around a parsed certificate that caches the extensions of interest

use der::asn1::{BitString, ObjectIdentifier};
use der::{Decode, Encode};
use flagset::FlagSet;
use log::error;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{BasicConstraints, KeyUsages};
use x509_cert::name::Name;
use x509_cert::Certificate;

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_EXT_KEY_USAGE, ID_CE_KEY_USAGE,
    ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
};

use crate::validator::tp_extension::*;
use crate::util::error::*;
use crate::{compare_names, PkiEnvironment};

/// [`CertificateItem`] aggregates a binary, DER-encoded Certificate, the parsed Certificate, the
/// validity window expressed as seconds since the Unix epoch and the parsed extensions of interest.
///
/// Items are immutable once constructed and may be shared between chains.
#[derive(Clone)]
#[readonly::make]
pub struct CertificateItem {
    /// Binary, encoded Certificate object
    #[readonly]
    pub encoded_cert: Vec<u8>,
    /// Decoded Certificate object
    #[readonly]
    pub decoded_cert: Certificate,
    /// notBefore as seconds since the Unix epoch
    #[readonly]
    pub not_before: u64,
    /// notAfter as seconds since the Unix epoch
    #[readonly]
    pub not_after: u64,
    /// Optional locator, i.e., a file name, for troubleshooting purposes
    #[readonly]
    pub locator: Option<String>,
    /// Extensions from [`EXTS_OF_INTEREST`] that were present in the certificate
    #[readonly]
    pub parsed_extensions: ParsedExtensions,
}

impl PartialEq for CertificateItem {
    fn eq(&self, other: &Self) -> bool {
        self.encoded_cert == other.encoded_cert
    }
}

impl Eq for CertificateItem {}

impl core::fmt::Debug for CertificateItem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CertificateItem({})", self.decoded_cert.tbs_certificate.subject)
    }
}

impl TryFrom<&[u8]> for CertificateItem {
    type Error = Error;

    fn try_from(enc_cert: &[u8]) -> Result<Self> {
        CertificateItem::from_der(enc_cert)
    }
}

impl CertificateItem {
    /// `from_der` parses the given buffer, returning `TrustStatus::MalformedCertificate` if the buffer
    /// does not contain a certificate.
    pub fn from_der(enc_cert: &[u8]) -> Result<Self> {
        let cert = match Certificate::from_der(enc_cert) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to parse certificate: {}", e);
                return Err(Error::Trust(TrustStatus::MalformedCertificate));
            }
        };
        let validity = &cert.tbs_certificate.validity;
        let not_before = validity.not_before.to_unix_duration().as_secs();
        let not_after = validity.not_after.to_unix_duration().as_secs();
        let parsed_extensions =
            parse_extensions(cert.tbs_certificate.extensions.as_ref(), EXTS_OF_INTEREST);
        Ok(CertificateItem {
            encoded_cert: enc_cert.to_vec(),
            decoded_cert: cert,
            not_before,
            not_after,
            locator: None,
            parsed_extensions,
        })
    }

    /// `from_der_with_locator` parses the given buffer and records where it came from.
    pub fn from_der_with_locator(enc_cert: &[u8], locator: &str) -> Result<Self> {
        match CertificateItem::from_der(enc_cert) {
            Ok(mut c) => {
                c.locator = Some(locator.to_string());
                Ok(c)
            }
            Err(e) => {
                error!("Failed to parse certificate from {}", locator);
                Err(e)
            }
        }
    }

    /// `from_certificate` encodes the given certificate and wraps it.
    pub fn from_certificate(cert: &Certificate) -> Result<Self> {
        let enc = cert
            .to_der()
            .map_err(|_e| Error::Trust(TrustStatus::MalformedCertificate))?;
        CertificateItem::from_der(&enc)
    }

    /// Returns the subject name
    pub fn subject(&self) -> &Name {
        &self.decoded_cert.tbs_certificate.subject
    }

    /// Returns the issuer name
    pub fn issuer(&self) -> &Name {
        &self.decoded_cert.tbs_certificate.issuer
    }

    /// Returns the subject public key
    pub fn spki(&self) -> &SubjectPublicKeyInfoOwned {
        &self.decoded_cert.tbs_certificate.subject_public_key_info
    }

    /// Returns the algorithm used to sign the certificate
    pub fn signature_algorithm(&self) -> &ObjectIdentifier {
        &self.decoded_cert.signature_algorithm.oid
    }

    /// Returns the serial number bytes
    pub fn serial_number(&self) -> &[u8] {
        self.decoded_cert.tbs_certificate.serial_number.as_bytes()
    }

    /// `is_self_issued` returns true if the subject and issuer names match.
    pub fn is_self_issued(&self) -> bool {
        compare_names(self.subject(), self.issuer())
    }

    /// `is_self_signed` returns true if the certificate is self-issued and its own public key
    /// verifies its signature.
    pub fn is_self_signed(&self, pe: &PkiEnvironment) -> bool {
        self.is_self_issued() && self.verify_signed_by(pe, self.spki()).is_ok()
    }

    /// Returns true if notAfter precedes the time of interest.
    pub fn is_expired(&self, time_of_interest: u64) -> bool {
        self.not_after < time_of_interest
    }

    /// Returns true if notBefore follows the time of interest.
    pub fn is_not_valid_yet(&self, time_of_interest: u64) -> bool {
        self.not_before > time_of_interest
    }

    /// Returns true if the certificate is valid at the time of interest.
    pub fn is_valid_at(&self, time_of_interest: u64) -> bool {
        !self.is_expired(time_of_interest) && !self.is_not_valid_yet(time_of_interest)
    }

    /// `valid_at_time` checks the validity window relative to the time of interest.
    pub fn valid_at_time(&self, time_of_interest: u64) -> Result<()> {
        if self.is_not_valid_yet(time_of_interest) {
            Err(Error::Trust(TrustStatus::CertificateNotValidYet))
        } else if self.is_expired(time_of_interest) {
            Err(Error::Trust(TrustStatus::CertificateExpired))
        } else {
            Ok(())
        }
    }

    /// Returns true if the subject is an empty sequence of RDNs.
    pub fn has_empty_subject_name(&self) -> bool {
        self.subject().0.is_empty()
    }

    /// `verify_signed_by` verifies the certificate's signature using the given public key. The
    /// TBSCertificate is verified as encoded.
    pub fn verify_signed_by(
        &self,
        pe: &PkiEnvironment,
        issuer_spki: &SubjectPublicKeyInfoOwned,
    ) -> Result<()> {
        let defer = DeferDecodeSigned::from_der(&self.encoded_cert)?;
        pe.verify_signature_message(
            &defer.tbs_field,
            defer.signature.raw_bytes(),
            &defer.signature_algorithm,
            issuer_spki,
        )
    }

    /// Returns the SHA-1 digest of the encoded certificate
    pub fn sha1_digest(&self) -> Vec<u8> {
        Sha1::digest(&self.encoded_cert).to_vec()
    }

    /// Returns the SHA-256 digest of the encoded certificate
    pub fn sha256_digest(&self) -> Vec<u8> {
        Sha256::digest(&self.encoded_cert).to_vec()
    }

    /// Returns the keyIdentifier field of the authorityKeyIdentifier extension, if present
    pub fn authority_key_identifier(&self) -> Option<&[u8]> {
        if let Some(TPExtension::AuthorityKeyIdentifier(akid)) =
            self.get_extension(&ID_CE_AUTHORITY_KEY_IDENTIFIER)
        {
            if let Some(kid) = &akid.key_identifier {
                return Some(kid.as_bytes());
            }
        }
        None
    }

    /// Returns the value of the subjectKeyIdentifier extension, if present
    pub fn subject_key_identifier(&self) -> Option<&[u8]> {
        if let Some(TPExtension::SubjectKeyIdentifier(skid)) =
            self.get_extension(&ID_CE_SUBJECT_KEY_IDENTIFIER)
        {
            return Some(skid.0.as_bytes());
        }
        None
    }

    /// Returns the basicConstraints extension, if present
    pub fn basic_constraints(&self) -> Option<&BasicConstraints> {
        match self.get_extension(&ID_CE_BASIC_CONSTRAINTS) {
            Some(TPExtension::BasicConstraints(bc)) => Some(bc),
            _ => None,
        }
    }

    /// Returns the keyUsage extension, if present
    pub fn key_usage(&self) -> Option<FlagSet<KeyUsages>> {
        match self.get_extension(&ID_CE_KEY_USAGE) {
            Some(TPExtension::KeyUsage(ku)) => Some(ku.0),
            _ => None,
        }
    }

    /// Returns the extendedKeyUsage extension, if present
    pub fn extended_key_usage(&self) -> Option<&[ObjectIdentifier]> {
        match self.get_extension(&ID_CE_EXT_KEY_USAGE) {
            Some(TPExtension::ExtendedKeyUsage(eku)) => Some(eku.0.as_slice()),
            _ => None,
        }
    }

    /// Returns the subjectAltName extension, if present
    pub fn subject_alt_names(&self) -> Option<&[GeneralName]> {
        match self.get_extension(&ID_CE_SUBJECT_ALT_NAME) {
            Some(TPExtension::SubjectAltName(san)) => Some(san.0.as_slice()),
            _ => None,
        }
    }

    /// Returns the criticality of the indicated extension, or None if absent
    pub fn is_extension_critical(&self, oid: &ObjectIdentifier) -> Option<bool> {
        if let Some(pe) = self.parsed_extensions.get(oid) {
            return Some(pe.critical);
        }
        self.decoded_cert
            .tbs_certificate
            .extensions
            .as_ref()
            .and_then(|exts| exts.iter().find(|e| e.extn_id == *oid))
            .map(|e| e.critical)
    }
}

impl ExtensionProcessing for CertificateItem {
    fn get_extension(&self, oid: &ObjectIdentifier) -> Option<&'_ TPExtension> {
        self.parsed_extensions.get(oid).map(|e| &e.value)
    }
}

/// [`DeferDecodeSigned`] used to parse only the top-level structure of a signed object, i.e., a
/// Certificate or CertificateList, without parsing the details of the to-be-signed field.
///
/// Deferred decoding is used when verifying signatures to avoid re-encoding the to-be-signed field
/// (and potentially encountering problems with structures that were not DER-encoded prior to signing).
pub struct DeferDecodeSigned {
    /// tbsCertificate or tbsCertList
    pub tbs_field: Vec<u8>,
    /// signatureAlgorithm   AlgorithmIdentifier,
    pub signature_algorithm: AlgorithmIdentifierOwned,
    /// signature            BIT STRING
    pub signature: BitString,
}

impl ::der::FixedTag for DeferDecodeSigned {
    const TAG: ::der::Tag = ::der::Tag::Sequence;
}

impl<'a> ::der::DecodeValue<'a> for DeferDecodeSigned {
    fn decode_value<R: ::der::Reader<'a>>(
        reader: &mut R,
        header: ::der::Header,
    ) -> ::der::Result<Self> {
        use ::der::Reader as _;
        reader.read_nested(header.length, |reader| {
            let tbs_field = reader.tlv_bytes()?;
            let signature_algorithm = reader.decode()?;
            let signature = reader.decode()?;
            Ok(Self {
                tbs_field: tbs_field.to_vec(),
                signature_algorithm,
                signature,
            })
        })
    }
}

#[test]
fn malformed_certificate() {
    assert_eq!(
        Err(Error::Trust(TrustStatus::MalformedCertificate)),
        CertificateItem::from_der(&[0x30, 0x03, 0x02, 0x01, 0x01])
    );
    assert_eq!(
        Err(Error::Trust(TrustStatus::MalformedCertificate)),
        CertificateItem::from_der(&[])
    );
}
