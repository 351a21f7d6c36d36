//! Wrappers around parsed extension structures used during trust policy verification

use std::collections::BTreeMap;

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES,
    ID_CE_CRL_NUMBER, ID_CE_DELTA_CRL_INDICATOR, ID_CE_EXT_KEY_USAGE, ID_CE_FRESHEST_CRL,
    ID_CE_INHIBIT_ANY_POLICY, ID_CE_ISSUER_ALT_NAME, ID_CE_ISSUING_DISTRIBUTION_POINT, ID_CE_KEY_USAGE,
    ID_CE_NAME_CONSTRAINTS, ID_CE_POLICY_CONSTRAINTS, ID_CE_POLICY_MAPPINGS,
    ID_CE_SUBJECT_ALT_NAME, ID_CE_SUBJECT_KEY_IDENTIFIER,
};
use der::asn1::ObjectIdentifier;
use der::Decode;
use x509_cert::ext::pkix::crl::{CrlNumber, FreshestCrl};
use x509_cert::ext::pkix::*;
use x509_cert::ext::Extension;

use crate::util::error::*;
use crate::util::tp_oids::ID_PE_QC_STATEMENTS;

/// `EXTS_OF_INTEREST` provides a list of certificate extensions that are parsed when preparing a
/// [`CertificateItem`](crate::CertificateItem) instance. These are subsequently available via
/// get_extension without re-parsing.
pub const EXTS_OF_INTEREST: &[ObjectIdentifier] = &[
    ID_CE_SUBJECT_KEY_IDENTIFIER,
    ID_CE_AUTHORITY_KEY_IDENTIFIER,
    ID_CE_BASIC_CONSTRAINTS,
    ID_CE_NAME_CONSTRAINTS,
    ID_CE_SUBJECT_ALT_NAME,
    ID_CE_EXT_KEY_USAGE,
    ID_CE_KEY_USAGE,
    ID_CE_POLICY_CONSTRAINTS,
    ID_CE_CERTIFICATE_POLICIES,
    ID_CE_POLICY_MAPPINGS,
    ID_CE_INHIBIT_ANY_POLICY,
    ID_PE_QC_STATEMENTS,
];

/// `CRL_EXTS_OF_INTEREST` lists the CRL extensions that are parsed when preparing a
/// [`CrlItem`](crate::CrlItem). Each is understood when marked critical.
pub const CRL_EXTS_OF_INTEREST: &[ObjectIdentifier] = &[
    ID_CE_AUTHORITY_KEY_IDENTIFIER,
    ID_CE_CRL_NUMBER,
    ID_CE_ISSUING_DISTRIBUTION_POINT,
    ID_CE_DELTA_CRL_INDICATOR,
    ID_CE_FRESHEST_CRL,
    ID_CE_ISSUER_ALT_NAME,
];

/// The `ExtensionProcessing` trait provides a common means of retrieving previously parsed
/// extensions from certificates and CRLs.
pub trait ExtensionProcessing {
    /// `get_extension` takes an ObjectIdentifier that identifies an extension type and returns a
    /// previously parsed [`TPExtension`] instance if the extension was present.
    fn get_extension(&self, oid: &ObjectIdentifier) -> Option<&'_ TPExtension>;
}

/// `ParsedExtensions` maps extension OIDs to decoded extension values.
pub type ParsedExtensions = BTreeMap<ObjectIdentifier, ParsedExtension>;

/// A decoded extension along with the criticality asserted for it.
#[derive(PartialEq, Clone, Eq, Debug)]
pub struct ParsedExtension {
    /// Value of the critical field
    pub critical: bool,
    /// Decoded value
    pub value: TPExtension,
}

/// `TPExtension` provides a wrapper for the extension types that are decoded during trust policy
/// verification.
#[allow(missing_docs)]
#[derive(PartialEq, Clone, Eq, Debug)]
pub enum TPExtension {
    BasicConstraints(BasicConstraints),
    SubjectKeyIdentifier(SubjectKeyIdentifier),
    ExtendedKeyUsage(ExtendedKeyUsage),
    KeyUsage(KeyUsage),
    SubjectAltName(SubjectAltName),
    IssuerAltName(IssuerAltName),
    NameConstraints(NameConstraints),
    CertificatePolicies(CertificatePolicies),
    PolicyMappings(PolicyMappings),
    AuthorityKeyIdentifier(AuthorityKeyIdentifier),
    PolicyConstraints(PolicyConstraints),
    InhibitAnyPolicy(InhibitAnyPolicy),
    IssuingDistributionPoint(IssuingDistributionPoint),
    CrlNumber(CrlNumber),
    FreshestCrl(FreshestCrl),
    /// Extensions whose presence and criticality are recorded without decoding the value
    Opaque,
    /// An extension of interest that could not be decoded
    Malformed,
}

/// `parse_extensions` decodes the extensions named in `oids` that appear in `exts`. Extensions that
/// fail to decode are recorded as [`TPExtension::Malformed`].
pub(crate) fn parse_extensions(
    exts: Option<&Vec<Extension>>,
    oids: &[ObjectIdentifier],
) -> ParsedExtensions {
    let mut pe = ParsedExtensions::new();
    if let Some(exts) = exts {
        for ext in exts {
            if !oids.contains(&ext.extn_id) || pe.contains_key(&ext.extn_id) {
                continue;
            }
            let value = match decode_extension(&ext.extn_id, ext.extn_value.as_bytes()) {
                Ok(v) => v,
                Err(_e) => TPExtension::Malformed,
            };
            pe.insert(
                ext.extn_id,
                ParsedExtension {
                    critical: ext.critical,
                    value,
                },
            );
        }
    }
    pe
}

fn decode_extension(oid: &ObjectIdentifier, v: &[u8]) -> Result<TPExtension> {
    macro_rules! decode_as {
        ($t:ident) => {
            Ok(TPExtension::$t($t::from_der(v)?))
        };
    }

    match *oid {
        ID_CE_BASIC_CONSTRAINTS => decode_as!(BasicConstraints),
        ID_CE_SUBJECT_KEY_IDENTIFIER => decode_as!(SubjectKeyIdentifier),
        ID_CE_EXT_KEY_USAGE => decode_as!(ExtendedKeyUsage),
        ID_CE_KEY_USAGE => decode_as!(KeyUsage),
        ID_CE_SUBJECT_ALT_NAME => decode_as!(SubjectAltName),
        ID_CE_ISSUER_ALT_NAME => decode_as!(IssuerAltName),
        ID_CE_NAME_CONSTRAINTS => decode_as!(NameConstraints),
        ID_CE_CERTIFICATE_POLICIES => decode_as!(CertificatePolicies),
        ID_CE_POLICY_MAPPINGS => decode_as!(PolicyMappings),
        ID_CE_AUTHORITY_KEY_IDENTIFIER => decode_as!(AuthorityKeyIdentifier),
        ID_CE_POLICY_CONSTRAINTS => decode_as!(PolicyConstraints),
        ID_CE_INHIBIT_ANY_POLICY => decode_as!(InhibitAnyPolicy),
        ID_CE_ISSUING_DISTRIBUTION_POINT => decode_as!(IssuingDistributionPoint),
        ID_CE_CRL_NUMBER => decode_as!(CrlNumber),
        ID_CE_FRESHEST_CRL => decode_as!(FreshestCrl),
        _ => Ok(TPExtension::Opaque),
    }
}

#[test]
fn malformed_extension_is_recorded() {
    use der::asn1::OctetString;
    let exts = vec![
        Extension {
            extn_id: ID_CE_BASIC_CONSTRAINTS,
            critical: true,
            extn_value: OctetString::new(vec![0x04, 0x00]).unwrap(),
        },
        Extension {
            extn_id: ID_PE_QC_STATEMENTS,
            critical: false,
            extn_value: OctetString::new(vec![0x30, 0x00]).unwrap(),
        },
    ];
    let pe = parse_extensions(Some(&exts), EXTS_OF_INTEREST);
    assert_eq!(2, pe.len());
    assert_eq!(TPExtension::Malformed, pe[&ID_CE_BASIC_CONSTRAINTS].value);
    assert!(pe[&ID_CE_BASIC_CONSTRAINTS].critical);
    assert_eq!(TPExtension::Opaque, pe[&ID_PE_QC_STATEMENTS].value);
}
