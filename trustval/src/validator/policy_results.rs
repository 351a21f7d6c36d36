//! Structures and functions related to results from trust policy verification operations

use std::collections::BTreeMap;

use pkiprocmacros::*;

use crate::validator::policy_settings::TrustStatuses;
use crate::TrustStatus;

/// `ListOfTrustStatuses` holds one set of observed status values per chain position, leaf first.
pub type ListOfTrustStatuses = Vec<TrustStatuses>;

/// `Buffers` is a typedef for a vector of `Vec<u8>` values.
pub type Buffers = Vec<Vec<u8>>;

/// `PolicyResultsTypes` is used to define a variant map with types associated with the results of
/// trust policy verification.
#[derive(Clone, Debug)]
pub enum PolicyResultsTypes {
    /// Represents bool values
    Bool(bool),
    /// Represents u32 values
    U32(u32),
    /// Represents a single status value
    TrustStatus(TrustStatus),
    /// Represents a set of status values
    TrustStatuses(TrustStatuses),
    /// Represents per-certificate sets of status values
    ListOfTrustStatuses(ListOfTrustStatuses),
    /// Represents vectors of buffers
    Buffers(Buffers),
}

/// `PolicyResults` is a typedef for a `BTreeMap` that maps static string values to a variant map.
#[derive(Clone, Debug, Default)]
pub struct PolicyResults(pub BTreeMap<&'static str, PolicyResultsTypes>);

impl PolicyResults {
    /// Creates a new [`PolicyResults`]
    pub fn new() -> Self {
        Self(Default::default())
    }
}

/// `PR_VALIDATION_STATUS` is used to retrieve a status code indicating the verification result.
pub static PR_VALIDATION_STATUS: &str = "prValidationStatus";

/// `PR_TOLERATED_STATUSES` is used to retrieve the status values that were observed but tolerated.
pub static PR_TOLERATED_STATUSES: &str = "prToleratedStatuses";

/// `PR_CERTIFICATE_STATUSES` is used to retrieve the status values observed for each certificate,
/// indexed by chain position.
pub static PR_CERTIFICATE_STATUSES: &str = "prCertificateStatuses";

/// `PR_VERIFIED_TO_ROOT` indicates the chain terminated in a trust anchor.
pub static PR_VERIFIED_TO_ROOT: &str = "prVerifiedToRoot";

/// `PR_VERIFIED_VIA_USER_TRUST` indicates the anchor was one added as user trust.
pub static PR_VERIFIED_VIA_USER_TRUST: &str = "prVerifiedViaUserTrust";

/// `PR_ALLOWLISTED` indicates the chain was admitted by the allow-list.
pub static PR_ALLOWLISTED: &str = "prAllowlisted";

/// `PR_CHAIN_LENGTH` is used to retrieve the length of the chain after anchor resolution.
pub static PR_CHAIN_LENGTH: &str = "prChainLength";

/// `PR_CRLS_USED` is used to retrieve the encoded CRLs consulted during revocation checking.
pub static PR_CRLS_USED: &str = "prCrlsUsed";

pr_gets_and_sets!(PR_VALIDATION_STATUS, TrustStatus);
pr_gets_and_sets_with_default!(PR_TOLERATED_STATUSES, TrustStatuses, TrustStatuses::new());
pr_gets_and_sets_with_default!(PR_CERTIFICATE_STATUSES, ListOfTrustStatuses, vec![]);
pr_gets_and_sets_with_default!(PR_VERIFIED_TO_ROOT, bool, false);
pr_gets_and_sets_with_default!(PR_VERIFIED_VIA_USER_TRUST, bool, false);
pr_gets_and_sets_with_default!(PR_ALLOWLISTED, bool, false);
pr_gets_and_sets_with_default!(PR_CHAIN_LENGTH, u32, 0);
pr_gets_and_sets_with_default!(PR_CRLS_USED, Buffers, vec![]);

impl PolicyResults {
    /// `add_certificate_status` records a status observed for the certificate at the given position.
    pub fn add_certificate_status(&mut self, index: usize, status: TrustStatus) {
        let mut statuses = self.get_certificate_statuses();
        if statuses.len() <= index {
            statuses.resize(index + 1, TrustStatuses::new());
        }
        statuses[index].insert(status);
        self.set_certificate_statuses(statuses);
    }

    /// `add_tolerated_status` records a status that was observed but tolerated.
    pub fn add_tolerated_status(&mut self, status: TrustStatus) {
        let mut statuses = self.get_tolerated_statuses();
        statuses.insert(status);
        self.set_tolerated_statuses(statuses);
    }

    /// `add_crl_used` records an encoded CRL consulted during revocation checking.
    pub fn add_crl_used(&mut self, crl: &[u8]) {
        let mut crls = self.get_crls_used();
        if !crls.iter().any(|c| c.as_slice() == crl) {
            crls.push(crl.to_vec());
        }
        self.set_crls_used(crls);
    }
}

#[test]
fn test_results() {
    let mut pr = PolicyResults::new();
    assert_eq!(None, pr.get_validation_status());
    assert!(!pr.get_verified_to_root());
    assert_eq!(0, pr.get_chain_length());

    pr.add_certificate_status(2, TrustStatus::CertificateExpired);
    pr.add_certificate_status(2, TrustStatus::CertificateExpired);
    pr.add_certificate_status(0, TrustStatus::HostnameMismatch);
    let statuses = pr.get_certificate_statuses();
    assert_eq!(3, statuses.len());
    assert!(statuses[1].is_empty());
    assert!(statuses[2].contains(&TrustStatus::CertificateExpired));
    assert!(statuses[0].contains(&TrustStatus::HostnameMismatch));

    pr.add_crl_used(&[1, 2, 3]);
    pr.add_crl_used(&[1, 2, 3]);
    assert_eq!(1, pr.get_crls_used().len());

    pr.set_validation_status(TrustStatus::Valid);
    assert_eq!(Some(TrustStatus::Valid), pr.get_validation_status());
}
