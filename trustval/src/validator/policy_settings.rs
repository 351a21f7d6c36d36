//! Structures and functions related to configuring trust policy verification operations

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use flagset::FlagSet;
use serde::{Deserialize, Serialize};
use serde_json::Result as SerdeResult;
use x509_cert::ext::pkix::KeyUsages;

use pkiprocmacros::*;

use crate::util::error::*;

//-----------------------------------------------------------------------------------------------
// Type definitions used in the definition of policy settings
//-----------------------------------------------------------------------------------------------
/// `Strings` is a typedef for a vector of String values.
pub type Strings = Vec<String>;

/// KeyUsageSettings provides a flagset that can be used to serialize key usage settings
pub type KeyUsageSettings = FlagSet<KeyUsages>;

/// `TrustStatuses` is a set of [`TrustStatus`] values, i.e., those a caller is prepared to tolerate.
pub type TrustStatuses = BTreeSet<TrustStatus>;

/// `PolicySettings` is a typedef for a `BTreeMap` that maps arbitrary string values to a variant map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySettings(pub BTreeMap<String, PolicyProcessingTypes>);

impl PolicySettings {
    /// Creates a new empty [`PolicySettings`]
    pub fn new() -> Self {
        Self::default()
    }
}

/// `PolicyProcessingTypes` is used to define a variant map with types associated with trust policy
/// verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyProcessingTypes {
    /// Represents bool values
    Bool(bool),
    /// Represents u64 values
    U64(u64),
    /// Represents String values
    String(String),
    /// Represents vectors of Strings
    Strings(Strings),
    /// Represents key usage values
    KeyUsageSettings(KeyUsageSettings),
    /// Represents sets of status values
    TrustStatuses(TrustStatuses),
}

//-----------------------------------------------------------------------------------------------
// Trust policies
//-----------------------------------------------------------------------------------------------
/// `TrustPolicy` names the rule set applied after the universal checks.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrustPolicy {
    /// Universal checks only
    X509Basic,
    /// TLS server or client authentication
    Ssl,
    /// EAP server or client authentication
    Eap,
    /// IPsec end system authentication
    IpSec,
    /// Secure email
    SMime,
    /// iChat signing and encryption
    IChat,
    /// Code signing
    CodeSigning,
    /// Installer package signing
    PackageSigning,
    /// Resource signing
    ResourceSigning,
    /// Software update signing
    SwUpdateSigning,
    /// App Store receipt signing
    AppStoreReceipt,
    /// Mobile Store signing
    MobileStore,
    /// Mobile Store signing using test certificates
    TestMobileStore,
    /// Provisioning profile signing
    ProvisioningProfileSigning,
    /// Passbook signing
    PassbookSigning,
    /// Escrow service key encryption
    EscrowService,
    /// PCS escrow service key encryption
    PcsEscrowService,
    /// RFC 3161 time stamping
    TimeStamping,
    /// OCSP response signing
    OcspSigning,
    /// PKINIT client authentication
    PkinitClient,
    /// PKINIT KDC authentication
    PkinitServer,
    /// CRL signing, used when verifying the signer of a CRL
    CrlSigner,
}

/// All trust policies, in declaration order
pub const TRUST_POLICIES: &[TrustPolicy] = &[
    TrustPolicy::X509Basic,
    TrustPolicy::Ssl,
    TrustPolicy::Eap,
    TrustPolicy::IpSec,
    TrustPolicy::SMime,
    TrustPolicy::IChat,
    TrustPolicy::CodeSigning,
    TrustPolicy::PackageSigning,
    TrustPolicy::ResourceSigning,
    TrustPolicy::SwUpdateSigning,
    TrustPolicy::AppStoreReceipt,
    TrustPolicy::MobileStore,
    TrustPolicy::TestMobileStore,
    TrustPolicy::ProvisioningProfileSigning,
    TrustPolicy::PassbookSigning,
    TrustPolicy::EscrowService,
    TrustPolicy::PcsEscrowService,
    TrustPolicy::TimeStamping,
    TrustPolicy::OcspSigning,
    TrustPolicy::PkinitClient,
    TrustPolicy::PkinitServer,
    TrustPolicy::CrlSigner,
];

impl fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrustPolicy::X509Basic => "x509-basic",
            TrustPolicy::Ssl => "ssl",
            TrustPolicy::Eap => "eap",
            TrustPolicy::IpSec => "ipsec",
            TrustPolicy::SMime => "smime",
            TrustPolicy::IChat => "ichat",
            TrustPolicy::CodeSigning => "code-signing",
            TrustPolicy::PackageSigning => "package-signing",
            TrustPolicy::ResourceSigning => "resource-signing",
            TrustPolicy::SwUpdateSigning => "sw-update-signing",
            TrustPolicy::AppStoreReceipt => "app-store-receipt",
            TrustPolicy::MobileStore => "mobile-store",
            TrustPolicy::TestMobileStore => "test-mobile-store",
            TrustPolicy::ProvisioningProfileSigning => "provisioning-profile-signing",
            TrustPolicy::PassbookSigning => "passbook-signing",
            TrustPolicy::EscrowService => "escrow-service",
            TrustPolicy::PcsEscrowService => "pcs-escrow-service",
            TrustPolicy::TimeStamping => "time-stamping",
            TrustPolicy::OcspSigning => "ocsp-signing",
            TrustPolicy::PkinitClient => "pkinit-client",
            TrustPolicy::PkinitServer => "pkinit-server",
            TrustPolicy::CrlSigner => "crl-signer",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TrustPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.to_lowercase().replace('_', "-");
        for p in TRUST_POLICIES {
            if p.to_string() == wanted {
                return Ok(*p);
            }
        }
        Err(Error::Unrecognized)
    }
}

//-----------------------------------------------------------------------------------------------
// Types of policy settings
//-----------------------------------------------------------------------------------------------
/// `PS_TIME_OF_INTEREST` is used to retrieve the time at which certificates and CRLs are evaluated.
/// The value is expressed as a u64 containing seconds since Unix epoch (i.e., 1970-01-01T00:00:00Z).
/// By default, the value is set to current time.
pub static PS_TIME_OF_INTEREST: &str = "psTimeOfInterest";

/// `PS_HOSTNAME` is used to retrieve the host name matched against the leaf certificate by the SSL,
/// EAP and IPsec policies. No host name matching is performed when absent.
pub static PS_HOSTNAME: &str = "psHostname";

/// `PS_SSL_CLIENT` indicates the SSL and EAP policies evaluate a client certificate, i.e., clientAuth
/// rather than serverAuth is required. By default, this value is false.
pub static PS_SSL_CLIENT: &str = "psSslClient";

/// `PS_EMAIL_ADDRESS` is used to retrieve the address matched by the S/MIME policy or the handle
/// matched by the iChat policy.
pub static PS_EMAIL_ADDRESS: &str = "psEmailAddress";

/// `PS_SMIME_KEY_USAGE` is used to retrieve the key usage bits the S/MIME policy requires of the leaf.
pub static PS_SMIME_KEY_USAGE: &str = "psSmimeKeyUsage";

/// `PS_TOLERATED_STATUSES` is used to retrieve the set of [`TrustStatus`] values that are recorded
/// rather than causing verification to fail. By default, the set is empty.
pub static PS_TOLERATED_STATUSES: &str = "psToleratedStatuses";

/// `PS_LEAF_IS_CA` indicates the leaf certificate is evaluated as a CA when basicConstraints is absent.
pub static PS_LEAF_IS_CA: &str = "psLeafIsCa";

/// `PS_CHECK_REVOCATION` enables CRL-based revocation checking. By default, this value is false.
pub static PS_CHECK_REVOCATION: &str = "psCheckRevocation";

/// `PS_REQUIRE_CRL_PER_CERT` causes revocation checking to fail when no CRL is available for a
/// certificate. By default, this value is false.
pub static PS_REQUIRE_CRL_PER_CERT: &str = "psRequireCrlPerCert";

/// `PS_CHECK_CRL_SIGNER_REVOCATION` causes the chain of each CRL signer to be revocation checked
/// even when the CRL is not indirect. By default, this value is false.
pub static PS_CHECK_CRL_SIGNER_REVOCATION: &str = "psCheckCrlSignerRevocation";

/// `PS_ALLOW_EXPIRED_ROOT` permits an expired trust anchor. By default, this value is false.
pub static PS_ALLOW_EXPIRED_ROOT: &str = "psAllowExpiredRoot";

/// `PS_ALLOW_MISSING_BASIC_CONSTRAINTS` permits intermediate CA certificates that lack a
/// basicConstraints extension. By default, this value is false.
pub static PS_ALLOW_MISSING_BASIC_CONSTRAINTS: &str = "psAllowMissingBasicConstraints";

/// `PS_USE_ALLOWLIST` enables the allow-list override for chains that do not reach a trusted anchor.
/// By default, this value is true.
pub static PS_USE_ALLOWLIST: &str = "psUseAllowlist";

/// `PS_PINNED_ANCHORS` is used to retrieve a list of hex-encoded SHA-1 digests of acceptable trust
/// anchors for policies that pin their anchor and for pinned domains.
pub static PS_PINNED_ANCHORS: &str = "psPinnedAnchors";

/// `PS_PINNED_DOMAINS` is used to retrieve a list of domain names. Host names that fall under one of
/// these must chain to one of the [`PS_PINNED_ANCHORS`].
pub static PS_PINNED_DOMAINS: &str = "psPinnedDomains";

ps_gets_and_sets_with_default!(PS_TIME_OF_INTEREST, u64, {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(n) => n.as_secs(),
        Err(_) => 0,
    }
});
ps_gets_and_sets!(PS_HOSTNAME, String);
ps_gets_and_sets_with_default!(PS_SSL_CLIENT, bool, false);
ps_gets_and_sets!(PS_EMAIL_ADDRESS, String);
ps_gets_and_sets!(PS_SMIME_KEY_USAGE, KeyUsageSettings);
ps_gets_and_sets_with_default!(PS_TOLERATED_STATUSES, TrustStatuses, TrustStatuses::new());
ps_gets_and_sets_with_default!(PS_LEAF_IS_CA, bool, false);
ps_gets_and_sets_with_default!(PS_CHECK_REVOCATION, bool, false);
ps_gets_and_sets_with_default!(PS_REQUIRE_CRL_PER_CERT, bool, false);
ps_gets_and_sets_with_default!(PS_CHECK_CRL_SIGNER_REVOCATION, bool, false);
ps_gets_and_sets_with_default!(PS_ALLOW_EXPIRED_ROOT, bool, false);
ps_gets_and_sets_with_default!(PS_ALLOW_MISSING_BASIC_CONSTRAINTS, bool, false);
ps_gets_and_sets_with_default!(PS_USE_ALLOWLIST, bool, true);
ps_gets_and_sets!(PS_PINNED_ANCHORS, Strings);
ps_gets_and_sets!(PS_PINNED_DOMAINS, Strings);

/// `read_settings` accepts a string containing the name of a file that notionally contains JSON data that
/// represents PolicySettings. An empty settings object is returned when no file name is given.
pub fn read_settings(fname: &Option<String>) -> Result<PolicySettings> {
    if let Some(fname) = fname {
        let p = Path::new(fname.as_str());
        let json = std::fs::read(p)?;
        let r: SerdeResult<PolicySettings> = serde_json::from_slice(&json);
        return match r {
            Ok(ps) => Ok(ps),
            Err(_e) => Err(Error::ParseError),
        };
    }
    Ok(PolicySettings::new())
}

#[test]
fn test_default_gets() {
    let ps = PolicySettings::default();
    let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    assert!(ps.get_time_of_interest() >= before.as_secs());
    assert_eq!(None, ps.get_hostname());
    assert!(!ps.get_ssl_client());
    assert_eq!(None, ps.get_email_address());
    assert_eq!(None, ps.get_smime_key_usage());
    assert!(ps.get_tolerated_statuses().is_empty());
    assert!(!ps.get_leaf_is_ca());
    assert!(!ps.get_check_revocation());
    assert!(!ps.get_require_crl_per_cert());
    assert!(!ps.get_check_crl_signer_revocation());
    assert!(!ps.get_allow_expired_root());
    assert!(!ps.get_allow_missing_basic_constraints());
    assert!(ps.get_use_allowlist());
    assert_eq!(None, ps.get_pinned_anchors());
    assert_eq!(None, ps.get_pinned_domains());
}

#[test]
fn test_trust_policy_names() {
    for p in TRUST_POLICIES {
        assert_eq!(*p, TrustPolicy::from_str(&p.to_string()).unwrap());
    }
    assert_eq!(
        TrustPolicy::SwUpdateSigning,
        TrustPolicy::from_str("SW_UPDATE_SIGNING").unwrap()
    );
    assert_eq!(Err(Error::Unrecognized), TrustPolicy::from_str("bogus"));
}
