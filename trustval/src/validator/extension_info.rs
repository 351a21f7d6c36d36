//! Per-evaluation summary of the extensions present in a certificate

use const_oid::db::rfc5912::{
    ID_CE_AUTHORITY_KEY_IDENTIFIER, ID_CE_BASIC_CONSTRAINTS, ID_CE_CERTIFICATE_POLICIES,
    ID_CE_EXT_KEY_USAGE, ID_CE_INHIBIT_ANY_POLICY, ID_CE_KEY_USAGE, ID_CE_NAME_CONSTRAINTS,
    ID_CE_POLICY_CONSTRAINTS, ID_CE_POLICY_MAPPINGS, ID_CE_SUBJECT_ALT_NAME,
    ID_CE_SUBJECT_KEY_IDENTIFIER,
};
use der::asn1::ObjectIdentifier;
use flagset::FlagSet;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    BasicConstraints, KeyUsages, NameConstraints, PolicyConstraints, PolicyMappings,
};

use crate::util::tp_oids::*;
use crate::validator::cert_item::CertificateItem;
use crate::validator::tp_extension::*;

/// An extension that was present, with its criticality and value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtEntry<T> {
    /// Value of the critical field
    pub critical: bool,
    /// Parsed value
    pub value: T,
}

impl<T> ExtEntry<T> {
    fn new(critical: bool, value: T) -> Self {
        ExtEntry { critical, value }
    }
}

/// `ExtensionInfo` records, for one certificate, the extensions the policy engine consults along
/// with the private marker extensions and two summary flags.
#[derive(Clone, Debug, Default)]
pub struct ExtensionInfo {
    /// keyIdentifier from authorityKeyIdentifier (None when the extension omits it)
    pub authority_key_id: Option<ExtEntry<Option<Vec<u8>>>>,
    /// subjectKeyIdentifier
    pub subject_key_id: Option<ExtEntry<Vec<u8>>>,
    /// keyUsage
    pub key_usage: Option<ExtEntry<FlagSet<KeyUsages>>>,
    /// extendedKeyUsage
    pub extended_key_usage: Option<ExtEntry<Vec<ObjectIdentifier>>>,
    /// basicConstraints
    pub basic_constraints: Option<ExtEntry<BasicConstraints>>,
    /// subjectAltName
    pub subject_alt_name: Option<ExtEntry<Vec<GeneralName>>>,
    /// policy identifiers from certificatePolicies
    pub certificate_policies: Option<ExtEntry<Vec<ObjectIdentifier>>>,
    /// qcStatements (presence and criticality only)
    pub qualified_cert_statements: Option<ExtEntry<()>>,
    /// nameConstraints
    pub name_constraints: Option<ExtEntry<NameConstraints>>,
    /// policyMappings
    pub policy_mappings: Option<ExtEntry<PolicyMappings>>,
    /// policyConstraints
    pub policy_constraints: Option<ExtEntry<PolicyConstraints>>,
    /// inhibitAnyPolicy skip certs value
    pub inhibit_any_policy: Option<ExtEntry<u32>>,

    /// code signing leaf marker
    pub code_signing: bool,
    /// App Store receipt signing leaf marker
    pub app_store_receipt: bool,
    /// Mobile Store signing leaf marker
    pub mobile_store: bool,
    /// Mobile Store signing (test) leaf marker
    pub test_mobile_store: bool,
    /// Passbook signing leaf marker
    pub passbook_signing: bool,
    /// Provisioning profile signing leaf marker
    pub provisioning_profile_signing: bool,
    /// Escrow service leaf marker
    pub escrow_service: bool,
    /// Server authentication leaf marker
    pub server_authentication: bool,
    /// Developer ID leaf marker
    pub developer_id_leaf: bool,
    /// WWDR intermediate marker
    pub wwdr_intermediate: bool,
    /// ITMS intermediate marker
    pub itms_intermediate: bool,
    /// Developer ID intermediate marker
    pub developer_id_intermediate: bool,

    /// Certificate was signed with a denylisted algorithm
    pub weak_alg: bool,
    /// An extension was marked critical that is not understood, or that could not be decoded
    pub unknown_critical: bool,
}

impl ExtensionInfo {
    /// Builds the extension summary for the given certificate.
    pub fn new(cert: &CertificateItem) -> Self {
        let mut info = ExtensionInfo {
            weak_alg: DENYLISTED_SIGNATURE_ALGS.contains(cert.signature_algorithm()),
            ..Default::default()
        };

        let exts = match &cert.decoded_cert.tbs_certificate.extensions {
            Some(exts) => exts,
            None => return info,
        };

        for ext in exts {
            let oid = ext.extn_id;
            let critical = ext.critical;

            if let Some(parsed) = cert.parsed_extensions.get(&oid) {
                info.record_parsed(&oid, critical, &parsed.value);
                continue;
            }

            match oid {
                APPLE_EXT_CODE_SIGNING => info.code_signing = true,
                APPLE_EXT_APP_STORE_RECEIPT => info.app_store_receipt = true,
                APPLE_EXT_MOBILE_STORE => info.mobile_store = true,
                APPLE_EXT_TEST_MOBILE_STORE => info.test_mobile_store = true,
                APPLE_EXT_PASSBOOK_SIGNING => info.passbook_signing = true,
                APPLE_EXT_PROVISIONING_PROFILE_SIGNING => info.provisioning_profile_signing = true,
                APPLE_EXT_ESCROW_SERVICE => info.escrow_service = true,
                APPLE_EXT_SERVER_AUTHENTICATION => info.server_authentication = true,
                APPLE_EXT_DEVELOPER_ID_LEAF => info.developer_id_leaf = true,
                APPLE_EXT_WWDR_INTERMEDIATE => info.wwdr_intermediate = true,
                APPLE_EXT_ITMS_INTERMEDIATE => info.itms_intermediate = true,
                APPLE_EXT_DEVELOPER_ID_INTERMEDIATE => info.developer_id_intermediate = true,
                _ => {
                    if critical {
                        info.unknown_critical = true;
                    }
                }
            }
        }
        info
    }

    fn record_parsed(&mut self, oid: &ObjectIdentifier, critical: bool, value: &TPExtension) {
        match value {
            TPExtension::Malformed => {
                if critical {
                    self.unknown_critical = true;
                }
            }
            TPExtension::AuthorityKeyIdentifier(akid) => {
                let kid = akid.key_identifier.as_ref().map(|k| k.as_bytes().to_vec());
                self.authority_key_id = Some(ExtEntry::new(critical, kid));
            }
            TPExtension::SubjectKeyIdentifier(skid) => {
                self.subject_key_id = Some(ExtEntry::new(critical, skid.0.as_bytes().to_vec()));
            }
            TPExtension::KeyUsage(ku) => {
                self.key_usage = Some(ExtEntry::new(critical, ku.0));
            }
            TPExtension::ExtendedKeyUsage(eku) => {
                self.extended_key_usage = Some(ExtEntry::new(critical, eku.0.clone()));
            }
            TPExtension::BasicConstraints(bc) => {
                self.basic_constraints = Some(ExtEntry::new(critical, bc.clone()));
            }
            TPExtension::SubjectAltName(san) => {
                self.subject_alt_name = Some(ExtEntry::new(critical, san.0.clone()));
            }
            TPExtension::CertificatePolicies(cp) => {
                let oids = cp.0.iter().map(|p| p.policy_identifier).collect();
                self.certificate_policies = Some(ExtEntry::new(critical, oids));
            }
            TPExtension::NameConstraints(nc) => {
                self.name_constraints = Some(ExtEntry::new(critical, nc.clone()));
            }
            TPExtension::PolicyMappings(pm) => {
                self.policy_mappings = Some(ExtEntry::new(critical, pm.clone()));
            }
            TPExtension::PolicyConstraints(pc) => {
                self.policy_constraints = Some(ExtEntry::new(critical, pc.clone()));
            }
            TPExtension::InhibitAnyPolicy(iap) => {
                self.inhibit_any_policy = Some(ExtEntry::new(critical, iap.0));
            }
            TPExtension::Opaque if *oid == ID_PE_QC_STATEMENTS => {
                self.qualified_cert_statements = Some(ExtEntry::new(critical, ()));
            }
            _ => {
                if critical && !is_understood_certificate_extension(oid) {
                    self.unknown_critical = true;
                }
            }
        }
    }

    /// Returns true if the extendedKeyUsage extension is present and contains any of the given purposes.
    pub fn eku_contains_any(&self, purposes: &[ObjectIdentifier]) -> bool {
        match &self.extended_key_usage {
            Some(eku) => eku.value.iter().any(|p| purposes.contains(p)),
            None => false,
        }
    }

    /// Returns true if keyUsage is present and asserts the given bit.
    pub fn key_usage_contains(&self, ku: KeyUsages) -> bool {
        match &self.key_usage {
            Some(k) => k.value.contains(ku),
            None => false,
        }
    }

    /// Returns the cA field of basicConstraints, if the extension is present.
    pub fn is_ca(&self) -> Option<bool> {
        self.basic_constraints.as_ref().map(|bc| bc.value.ca)
    }

    /// Returns true if the subjectAltName extension is present and marked critical.
    pub fn has_critical_san(&self) -> bool {
        matches!(&self.subject_alt_name, Some(san) if san.critical)
    }

    /// Returns true if the given certificate policy OID is asserted.
    pub fn has_policy(&self, policy: &ObjectIdentifier) -> bool {
        match &self.certificate_policies {
            Some(cp) => cp.value.contains(policy),
            None => false,
        }
    }
}

fn is_understood_certificate_extension(oid: &ObjectIdentifier) -> bool {
    [
        ID_CE_AUTHORITY_KEY_IDENTIFIER,
        ID_CE_SUBJECT_KEY_IDENTIFIER,
        ID_CE_KEY_USAGE,
        ID_CE_EXT_KEY_USAGE,
        ID_CE_BASIC_CONSTRAINTS,
        ID_CE_SUBJECT_ALT_NAME,
        ID_CE_CERTIFICATE_POLICIES,
        ID_CE_NAME_CONSTRAINTS,
        ID_CE_POLICY_MAPPINGS,
        ID_CE_POLICY_CONSTRAINTS,
        ID_CE_INHIBIT_ANY_POLICY,
        ID_PE_QC_STATEMENTS,
    ]
    .contains(oid)
}
