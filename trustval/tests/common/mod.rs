//! Programmatic construction of certificates and CRLs for integration tests.
//!
//! Objects are "signed" by a test scheme registered on the PkiEnvironment: the signature is the
//! SHA-256 digest of the to-be-signed bytes followed by the issuer's public key bits. Keys are the
//! SHA-256 digest of the subject name, so a given name always has the same key unless a test
//! supplies a different one.

#![allow(dead_code)]

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_ISSUER,
    ID_CE_CERTIFICATE_POLICIES, ID_CE_EXT_KEY_USAGE, ID_CE_ISSUING_DISTRIBUTION_POINT,
    ID_CE_KEY_USAGE, ID_CE_NAME_CONSTRAINTS, ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
};
use der::asn1::{Any, BitString, GeneralizedTime, Ia5String, ObjectIdentifier, OctetString};
use der::Encode;
use flagset::FlagSet;
use sha2::{Digest, Sha256};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::certificate::{Certificate, TbsCertificate, Version};
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::certpolicy::PolicyInformation;
use x509_cert::ext::pkix::constraints::name::GeneralSubtree;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, BasicConstraints, CertificatePolicies, ExtendedKeyUsage,
    IssuingDistributionPoint, KeyUsage, KeyUsages, NameConstraints, SubjectAltName,
    SubjectKeyIdentifier,
};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};

use trustval::*;

/// Time of interest used throughout the tests (2023-11-14T22:13:20Z)
pub const NOW: u64 = 1_700_000_000;
pub const DAY: u64 = 86_400;

/// Key algorithm used for test keys
pub const TEST_KEY_ALG: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
/// Signature algorithm recorded in test objects
pub const TEST_SIG_ALG: ObjectIdentifier = PKIXALG_SHA256_WITH_RSA_ENCRYPTION;
/// OID of an extension nothing understands
pub const UNKNOWN_EXT: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.3.4.5.6.7");

fn test_signature(tbs: &[u8], key: &[u8]) -> Vec<u8> {
    let mut h = Sha256::new();
    h.update(tbs);
    h.update(key);
    h.finalize().to_vec()
}

/// VerifySignatureMessage implementation for the test signature scheme
pub fn verify_test_signature(
    _pe: &PkiEnvironment,
    message: &[u8],
    signature: &[u8],
    _alg: &AlgorithmIdentifierOwned,
    spki: &SubjectPublicKeyInfoOwned,
) -> trustval::Result<()> {
    if spki.algorithm.oid == PKIXALG_EC_PUBLIC_KEY && spki.algorithm.parameters.is_none() {
        return Err(Error::Trust(TrustStatus::PublicKeyIncomplete));
    }
    if test_signature(message, spki.subject_public_key.raw_bytes()) == signature {
        Ok(())
    } else {
        Err(Error::Trust(TrustStatus::SignatureVerificationFailure))
    }
}

/// Returns an environment that verifies test signatures and has no stores
pub fn test_environment() -> PkiEnvironment {
    let mut pe = PkiEnvironment::new();
    pe.add_calculate_hash_callback(calculate_hash_rust_crypto);
    pe.add_verify_signature_message_callback(verify_test_signature);
    pe
}

/// Returns settings with the time of interest fixed at [`NOW`]
pub fn test_settings() -> PolicySettings {
    let mut ps = PolicySettings::new();
    ps.set_time_of_interest(NOW);
    ps
}

pub fn key_for(name: &str) -> Vec<u8> {
    Sha256::digest(name.as_bytes()).to_vec()
}

pub fn key_id(key: &[u8]) -> Vec<u8> {
    Sha256::digest(key)[..20].to_vec()
}

pub fn name(s: &str) -> Name {
    if s.is_empty() {
        Name::default()
    } else {
        Name::from_str(s).unwrap()
    }
}

pub fn time(t: u64) -> Time {
    Time::GeneralTime(GeneralizedTime::from_unix_duration(Duration::from_secs(t)).unwrap())
}

pub fn ext<T: Encode>(oid: ObjectIdentifier, critical: bool, value: &T) -> Extension {
    Extension {
        extn_id: oid,
        critical,
        extn_value: OctetString::new(value.to_der().unwrap()).unwrap(),
    }
}

/// Extension whose value is an encoded NULL, as used by the private marker extensions
pub fn marker(oid: ObjectIdentifier) -> Extension {
    Extension {
        extn_id: oid,
        critical: false,
        extn_value: OctetString::new(vec![0x05, 0x00]).unwrap(),
    }
}

pub fn dns(s: &str) -> GeneralName {
    GeneralName::DnsName(Ia5String::new(s).unwrap())
}

pub fn email(s: &str) -> GeneralName {
    GeneralName::Rfc822Name(Ia5String::new(s).unwrap())
}

pub fn ip(octets: &[u8]) -> GeneralName {
    GeneralName::IpAddress(OctetString::new(octets.to_vec()).unwrap())
}

/// A 512-bit RSA public key (modulus of 64 0xC3 octets, exponent 65537)
pub fn weak_rsa_spki() -> SubjectPublicKeyInfoOwned {
    let mut rsa_key = vec![0x30, 0x48, 0x02, 0x41, 0x00];
    rsa_key.extend_from_slice(&[0xC3; 64]);
    rsa_key.extend_from_slice(&[0x02, 0x03, 0x01, 0x00, 0x01]);
    SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: PKIXALG_RSA_ENCRYPTION,
            parameters: None,
        },
        subject_public_key: BitString::from_bytes(&rsa_key).unwrap(),
    }
}

/// Description of a certificate to be built
#[derive(Clone)]
pub struct CertSpec {
    pub subject: String,
    pub issuer: String,
    pub spki: SubjectPublicKeyInfoOwned,
    pub issuer_key: Vec<u8>,
    pub serial: u8,
    pub not_before: u64,
    pub not_after: u64,
    pub sig_alg: ObjectIdentifier,
    pub extensions: Vec<Extension>,
}

fn spki_for(key: &[u8]) -> SubjectPublicKeyInfoOwned {
    SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: TEST_KEY_ALG,
            parameters: None,
        },
        subject_public_key: BitString::from_bytes(key).unwrap(),
    }
}

impl CertSpec {
    fn new(subject: &str, issuer: &str, issuer_key: Vec<u8>) -> Self {
        let key = key_for(subject);
        let mut spec = CertSpec {
            subject: subject.to_string(),
            issuer: issuer.to_string(),
            spki: spki_for(&key),
            issuer_key: issuer_key.clone(),
            serial: 1,
            not_before: NOW - 365 * DAY,
            not_after: NOW + 365 * DAY,
            sig_alg: TEST_SIG_ALG,
            extensions: vec![],
        };
        spec.set_ext(ext(
            ID_CE_SUBJECT_KEY_IDENTIFIER,
            false,
            &SubjectKeyIdentifier(OctetString::new(key_id(&key)).unwrap()),
        ));
        if issuer_key != key {
            spec.set_ext(ext(
                ID_CE_AUTHORITY_KEY_IDENTIFIER,
                false,
                &AuthorityKeyIdentifier {
                    key_identifier: Some(OctetString::new(key_id(&issuer_key)).unwrap()),
                    authority_cert_issuer: None,
                    authority_cert_serial_number: None,
                },
            ));
        }
        spec
    }

    /// Self-signed CA certificate
    pub fn root(subject: &str) -> Self {
        CertSpec::new(subject, subject, key_for(subject))
            .with_bc(true, None)
            .with_ku(KeyUsages::KeyCertSign | KeyUsages::CRLSign)
    }

    /// CA certificate issued by `issuer`
    pub fn ca(subject: &str, issuer: &CertSpec) -> Self {
        CertSpec::new(subject, &issuer.subject, issuer.key())
            .with_bc(true, None)
            .with_ku(KeyUsages::KeyCertSign | KeyUsages::CRLSign)
    }

    /// End entity certificate issued by `issuer`
    pub fn leaf(subject: &str, issuer: &CertSpec) -> Self {
        CertSpec::new(subject, &issuer.subject, issuer.key())
            .with_ku(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment)
    }

    /// Returns the subject public key bits
    pub fn key(&self) -> Vec<u8> {
        self.spki.subject_public_key.raw_bytes().to_vec()
    }

    pub fn ski(&self) -> Vec<u8> {
        key_id(&self.key())
    }

    fn set_ext(&mut self, e: Extension) {
        self.extensions.retain(|x| x.extn_id != e.extn_id);
        self.extensions.push(e);
    }

    pub fn with_ext(mut self, e: Extension) -> Self {
        self.set_ext(e);
        self
    }

    pub fn without_ext(mut self, oid: ObjectIdentifier) -> Self {
        self.extensions.retain(|x| x.extn_id != oid);
        self
    }

    pub fn with_bc(self, ca: bool, path_len: Option<u8>) -> Self {
        self.with_ext(ext(
            ID_CE_BASIC_CONSTRAINTS,
            true,
            &BasicConstraints {
                ca,
                path_len_constraint: path_len,
            },
        ))
    }

    pub fn with_ku(self, ku: impl Into<FlagSet<KeyUsages>>) -> Self {
        self.with_ext(ext(ID_CE_KEY_USAGE, true, &KeyUsage(ku.into())))
    }

    pub fn with_eku(self, ekus: &[ObjectIdentifier]) -> Self {
        self.with_eku_criticality(ekus, false)
    }

    pub fn with_eku_criticality(self, ekus: &[ObjectIdentifier], critical: bool) -> Self {
        self.with_ext(ext(
            ID_CE_EXT_KEY_USAGE,
            critical,
            &ExtendedKeyUsage(ekus.to_vec()),
        ))
    }

    pub fn with_san(self, names: Vec<GeneralName>, critical: bool) -> Self {
        self.with_ext(ext(ID_CE_SUBJECT_ALT_NAME, critical, &SubjectAltName(names)))
    }

    pub fn with_policies(self, policies: &[ObjectIdentifier]) -> Self {
        let pi = policies
            .iter()
            .map(|p| PolicyInformation {
                policy_identifier: *p,
                policy_qualifiers: None,
            })
            .collect();
        self.with_ext(ext(
            ID_CE_CERTIFICATE_POLICIES,
            false,
            &CertificatePolicies(pi),
        ))
    }

    pub fn with_permitted_dns(self, base: &str) -> Self {
        let nc = NameConstraints {
            permitted_subtrees: Some(vec![GeneralSubtree {
                base: dns(base),
                minimum: 0,
                maximum: None,
            }]),
            excluded_subtrees: None,
        };
        self.with_ext(ext(ID_CE_NAME_CONSTRAINTS, true, &nc))
    }

    pub fn with_marker(self, oid: ObjectIdentifier) -> Self {
        self.with_ext(marker(oid))
    }

    pub fn with_validity(mut self, not_before: u64, not_after: u64) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn with_serial(mut self, serial: u8) -> Self {
        self.serial = serial;
        self
    }

    pub fn with_sig_alg(mut self, alg: ObjectIdentifier) -> Self {
        self.sig_alg = alg;
        self
    }

    /// Replaces the subject key. The subject key identifier follows the new key.
    pub fn with_key(mut self, key: &[u8]) -> Self {
        self.spki = spki_for(key);
        let ski = key_id(key);
        self.with_ext(ext(
            ID_CE_SUBJECT_KEY_IDENTIFIER,
            false,
            &SubjectKeyIdentifier(OctetString::new(ski).unwrap()),
        ))
    }

    /// Labels the subject key as an EC key, with or without the named curve parameter. The key bits
    /// are unchanged, so the key still verifies test signatures once its parameters are known.
    pub fn with_ec_key(mut self, with_curve: bool) -> Self {
        self.spki.algorithm = AlgorithmIdentifierOwned {
            oid: PKIXALG_EC_PUBLIC_KEY,
            parameters: if with_curve {
                Some(Any::encode_from(&PKIXALG_SECP256R1).unwrap())
            } else {
                None
            },
        };
        self
    }

    pub fn with_spki(mut self, spki: SubjectPublicKeyInfoOwned) -> Self {
        self.spki = spki;
        self.without_ext(ID_CE_SUBJECT_KEY_IDENTIFIER)
    }

    /// Signs with the given key instead of the issuer's
    pub fn signed_with(mut self, key: &[u8]) -> Self {
        self.issuer_key = key.to_vec();
        self
    }

    pub fn certificate(&self) -> Certificate {
        let alg = AlgorithmIdentifierOwned {
            oid: self.sig_alg,
            parameters: None,
        };
        let extensions = if self.extensions.is_empty() {
            None
        } else {
            Some(self.extensions.clone())
        };
        let tbs = TbsCertificate {
            version: Version::V3,
            serial_number: SerialNumber::new(&[self.serial]).unwrap(),
            signature: alg.clone(),
            issuer: name(&self.issuer),
            validity: Validity {
                not_before: time(self.not_before),
                not_after: time(self.not_after),
            },
            subject: name(&self.subject),
            subject_public_key_info: self.spki.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions,
        };
        let sig = test_signature(&tbs.to_der().unwrap(), &self.issuer_key);
        Certificate {
            tbs_certificate: tbs,
            signature_algorithm: alg,
            signature: BitString::from_bytes(&sig).unwrap(),
        }
    }

    pub fn build(&self) -> CertificateItem {
        CertificateItem::from_certificate(&self.certificate()).unwrap()
    }
}

/// Description of a CRL to be built
#[derive(Clone)]
pub struct CrlSpec {
    pub issuer: String,
    pub issuer_key: Vec<u8>,
    pub this_update: u64,
    pub next_update: Option<u64>,
    pub entries: Vec<RevokedCert>,
    pub extensions: Vec<Extension>,
}

impl CrlSpec {
    /// Empty CRL issued by the given certificate, current at [`NOW`]
    pub fn new(issuer: &CertSpec) -> Self {
        CrlSpec {
            issuer: issuer.subject.clone(),
            issuer_key: issuer.key(),
            this_update: NOW - DAY,
            next_update: Some(NOW + 7 * DAY),
            entries: vec![],
            extensions: vec![ext(
                ID_CE_AUTHORITY_KEY_IDENTIFIER,
                false,
                &AuthorityKeyIdentifier {
                    key_identifier: Some(OctetString::new(issuer.ski()).unwrap()),
                    authority_cert_issuer: None,
                    authority_cert_serial_number: None,
                },
            )],
        }
    }

    pub fn revoke(self, serial: u8, when: u64) -> Self {
        self.revoke_with_issuer(serial, when, None)
    }

    /// Adds an entry. When `cert_issuer` is given, a certificateIssuer entry extension is included.
    pub fn revoke_with_issuer(mut self, serial: u8, when: u64, cert_issuer: Option<&str>) -> Self {
        let crl_entry_extensions = cert_issuer.map(|ci| {
            vec![ext(
                ID_CE_CERTIFICATE_ISSUER,
                true,
                &vec![GeneralName::DirectoryName(name(ci))],
            )]
        });
        self.entries.push(RevokedCert {
            serial_number: SerialNumber::new(&[serial]).unwrap(),
            revocation_date: time(when),
            crl_entry_extensions,
        });
        self
    }

    pub fn with_idp(mut self, user_only: bool, ca_only: bool, indirect: bool) -> Self {
        let idp = IssuingDistributionPoint {
            distribution_point: None,
            only_contains_user_certs: user_only,
            only_contains_ca_certs: ca_only,
            only_some_reasons: None,
            indirect_crl: indirect,
            only_contains_attribute_certs: false,
        };
        self.extensions
            .push(ext(ID_CE_ISSUING_DISTRIBUTION_POINT, true, &idp));
        self
    }

    pub fn with_ext(mut self, e: Extension) -> Self {
        self.extensions.push(e);
        self
    }

    pub fn with_dates(mut self, this_update: u64, next_update: Option<u64>) -> Self {
        self.this_update = this_update;
        self.next_update = next_update;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let alg = AlgorithmIdentifierOwned {
            oid: TEST_SIG_ALG,
            parameters: None,
        };
        let tbs = TbsCertList {
            version: Version::V2,
            signature: alg.clone(),
            issuer: name(&self.issuer),
            this_update: time(self.this_update),
            next_update: self.next_update.map(time),
            revoked_certificates: if self.entries.is_empty() {
                None
            } else {
                Some(self.entries.clone())
            },
            crl_extensions: Some(self.extensions.clone()),
        };
        let sig = test_signature(&tbs.to_der().unwrap(), &self.issuer_key);
        CertificateList {
            tbs_cert_list: tbs,
            signature_algorithm: alg,
            signature: BitString::from_bytes(&sig).unwrap(),
        }
        .to_der()
        .unwrap()
    }

    pub fn build(&self) -> CrlItem {
        CrlItem::from_der(&self.encode()).unwrap()
    }
}

/// Builds a root, intermediate and leaf. The root is returned first.
pub fn three_tier() -> (CertSpec, CertSpec, CertSpec) {
    let root = CertSpec::root("CN=Test Root,O=Test");
    let ca = CertSpec::ca("CN=Test CA,O=Test", &root).with_serial(2);
    let leaf = CertSpec::leaf("CN=Test Leaf,O=Test", &ca).with_serial(3);
    (root, ca, leaf)
}

/// Trust anchor store holding the given certificates
pub fn anchors(certs: &[&CertSpec]) -> TaSource {
    let mut tas = TaSource::new();
    for c in certs {
        tas.add(c.build(), false);
    }
    tas
}

/// Owned chain built from the given specs, leaf first
pub fn chain(certs: &[&CertSpec]) -> CertificateChain<'static> {
    CertificateChain::Owned(certs.iter().map(|c| c.build()).collect())
}

/// Certificate store that counts the queries it answers
pub struct CountingCertSource {
    inner: CertSource,
    queries: Arc<AtomicUsize>,
}

impl CountingCertSource {
    pub fn new(certs: &[&CertSpec]) -> (Self, Arc<AtomicUsize>) {
        let mut inner = CertSource::new();
        for c in certs {
            inner.add(&c.build());
        }
        let queries = Arc::new(AtomicUsize::new(0));
        (
            CountingCertSource {
                inner,
                queries: queries.clone(),
            },
            queries,
        )
    }
}

impl CertificateSource for CountingCertSource {
    fn get_encoded_certificates_for_name(&self, name: &Name) -> trustval::Result<Vec<Vec<u8>>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.get_encoded_certificates_for_name(name)
    }
}

/// Certificate and CRL store that never answers
pub struct UnavailableSource;

impl CertificateSource for UnavailableSource {
    fn get_encoded_certificates_for_name(&self, _name: &Name) -> trustval::Result<Vec<Vec<u8>>> {
        Err(Error::StoreUnavailable)
    }
}

impl CrlSource for UnavailableSource {
    fn get_encoded_crls_for_issuer(
        &self,
        _issuer: &Name,
        _time_of_interest: u64,
    ) -> trustval::Result<Vec<Vec<u8>>> {
        Err(Error::StoreUnavailable)
    }
}
