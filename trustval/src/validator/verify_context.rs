//! Inputs shared by every check performed during one verification call

use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::allowlist::{bundled_allowlist, Allowlist};
use crate::environment::pki_environment::PkiEnvironment;
use crate::revocation::crl_item::CrlContextKey;
use crate::revocation::revocation_cache::RevocationCache;
use crate::source::ta_source::TaSource;
use crate::validator::cert_item::CertificateItem;
use crate::validator::policy_settings::{PolicySettings, TrustPolicy, TrustStatuses};

/// `VerifyContext` aggregates the environment, anchors, policy and settings used by one call to
/// [`verify_chain`](crate::verify_chain) or [`verify_crl`](crate::verify_crl).
///
/// The time of interest, tolerated statuses and anchor fingerprint are read once when the context
/// is created. A context is not shared between threads.
pub struct VerifyContext<'a> {
    pe: &'a PkiEnvironment,
    anchors: &'a TaSource,
    policy: TrustPolicy,
    settings: PolicySettings,
    signer_pool: &'a [CertificateItem],
    revocation_cache: Option<&'a RevocationCache>,
    allowlist: &'a Allowlist,
    time_of_interest: u64,
    tolerated: TrustStatuses,
    crl_key: CrlContextKey,
    crls_in_progress: RefCell<BTreeSet<Vec<u8>>>,
}

impl<'a> VerifyContext<'a> {
    /// Creates a context that evaluates chains against the given anchors under the given policy
    pub fn new(
        pe: &'a PkiEnvironment,
        anchors: &'a TaSource,
        policy: TrustPolicy,
        settings: &PolicySettings,
    ) -> VerifyContext<'a> {
        let time_of_interest = settings.get_time_of_interest();
        let tolerated = settings.get_tolerated_statuses();
        let crl_key = CrlContextKey {
            time_of_interest,
            anchors: anchors.fingerprint(),
            tolerated: tolerated.clone(),
            check_signer_revocation: settings.get_check_crl_signer_revocation(),
        };
        VerifyContext {
            pe,
            anchors,
            policy,
            settings: settings.clone(),
            signer_pool: &[],
            revocation_cache: None,
            allowlist: bundled_allowlist(),
            time_of_interest,
            tolerated,
            crl_key,
            crls_in_progress: RefCell::new(BTreeSet::new()),
        }
    }

    /// Supplies additional certificates that may be used to extend chains and to find CRL signers
    pub fn with_signer_pool(mut self, pool: &'a [CertificateItem]) -> Self {
        self.signer_pool = pool;
        self
    }

    /// Supplies a cache of verified CRLs shared with other calls
    pub fn with_revocation_cache(mut self, cache: &'a RevocationCache) -> Self {
        self.revocation_cache = Some(cache);
        self
    }

    /// Replaces the bundled allow-list
    pub fn with_allowlist(mut self, allowlist: &'a Allowlist) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Returns the environment
    pub fn pe(&self) -> &'a PkiEnvironment {
        self.pe
    }

    /// Returns the trust anchors
    pub fn anchors(&self) -> &'a TaSource {
        self.anchors
    }

    /// Returns the requested policy
    pub fn policy(&self) -> TrustPolicy {
        self.policy
    }

    /// Returns the settings
    pub fn settings(&self) -> &PolicySettings {
        &self.settings
    }

    /// Returns the signer pool
    pub fn signer_pool(&self) -> &'a [CertificateItem] {
        self.signer_pool
    }

    /// Returns the shared revocation cache, if any
    pub fn revocation_cache(&self) -> Option<&'a RevocationCache> {
        self.revocation_cache
    }

    /// Returns the allow-list
    pub fn allowlist(&self) -> &'a Allowlist {
        self.allowlist
    }

    /// Returns the time of interest as seconds since the Unix epoch
    pub fn time_of_interest(&self) -> u64 {
        self.time_of_interest
    }

    /// Returns the statuses the caller declared tolerable
    pub fn tolerated(&self) -> &TrustStatuses {
        &self.tolerated
    }

    /// Returns the key under which CRL verification results are memoized
    pub fn crl_key(&self) -> &CrlContextKey {
        &self.crl_key
    }

    /// Returns true if the leaf is evaluated as a CA certificate
    pub fn leaf_is_ca(&self) -> bool {
        self.settings.get_leaf_is_ca()
    }

    /// Returns true if revocation status is checked
    pub fn check_revocation(&self) -> bool {
        self.settings.get_check_revocation()
    }

    /// Returns true if a CRL is required for every certificate
    pub fn require_crl_per_cert(&self) -> bool {
        self.settings.get_require_crl_per_cert()
    }

    /// Returns true if revocation status of CRL signers is checked for direct CRLs
    pub fn check_crl_signer_revocation(&self) -> bool {
        self.crl_key.check_signer_revocation
    }

    /// Returns true if an expired anchor is tolerated
    pub fn allow_expired_root(&self) -> bool {
        self.settings.get_allow_expired_root()
    }

    /// Returns true if intermediate CA certificates may omit basicConstraints
    pub fn allow_missing_basic_constraints(&self) -> bool {
        self.settings.get_allow_missing_basic_constraints()
    }

    /// Returns true if the allow-list is consulted
    pub fn use_allowlist(&self) -> bool {
        self.settings.get_use_allowlist()
    }

    /// Marks the CRL with the given digest as being verified. Returns false if it already was.
    pub(crate) fn begin_crl(&self, digest: &[u8]) -> bool {
        self.crls_in_progress.borrow_mut().insert(digest.to_vec())
    }

    /// Clears the in progress mark for the CRL with the given digest.
    pub(crate) fn end_crl(&self, digest: &[u8]) {
        self.crls_in_progress.borrow_mut().remove(digest);
    }
}
