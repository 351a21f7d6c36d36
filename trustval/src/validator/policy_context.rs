//! Accumulation of the status values reported while evaluating one chain under one policy

use crate::util::error::*;
use crate::util::tp_utilities::log_error_for_cert;
use crate::validator::cert_item::CertificateItem;
use crate::validator::policy_results::{ListOfTrustStatuses, PolicyResults};
use crate::validator::policy_settings::{TrustPolicy, TrustStatuses};

/// `Disposition` tells a check site whether evaluation continues after a status was reported.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Disposition {
    /// The status was tolerated
    Continue,
    /// The status was not tolerated and evaluation stops
    Abort,
}

/// `PolicyContext` carries the policy being evaluated along with the statuses observed so far.
#[derive(Clone, Debug)]
pub struct PolicyContext {
    /// Policy whose rules are applied
    pub policy: TrustPolicy,
    /// Whether the leaf is evaluated as a CA certificate
    pub leaf_is_ca: bool,
    tolerated: TrustStatuses,
    observed: TrustStatuses,
    cert_statuses: ListOfTrustStatuses,
    crls_used: Vec<Vec<u8>>,
}

impl PolicyContext {
    /// Creates a context for the given policy with the given set of tolerable statuses
    pub fn new(policy: TrustPolicy, leaf_is_ca: bool, tolerated: &TrustStatuses) -> Self {
        PolicyContext {
            policy,
            leaf_is_ca,
            tolerated: tolerated.clone(),
            observed: TrustStatuses::new(),
            cert_statuses: vec![],
            crls_used: vec![],
        }
    }

    /// `report` records a status, against the certificate at `index` if given, and returns
    /// `Disposition::Continue` if the status is tolerable.
    pub fn report(&mut self, index: Option<usize>, status: TrustStatus) -> Disposition {
        if let Some(i) = index {
            if self.cert_statuses.len() <= i {
                self.cert_statuses.resize(i + 1, TrustStatuses::new());
            }
            self.cert_statuses[i].insert(status);
        }
        if self.tolerated.contains(&status) {
            self.observed.insert(status);
            Disposition::Continue
        } else {
            Disposition::Abort
        }
    }

    /// `check` is [`report`](PolicyContext::report) with `Disposition::Abort` converted to an error.
    pub fn check(&mut self, index: Option<usize>, status: TrustStatus) -> Result<()> {
        match self.report(index, status) {
            Disposition::Continue => Ok(()),
            Disposition::Abort => Err(Error::Trust(status)),
        }
    }

    /// `check_cert` logs the status along with the subject of the certificate at `index` then
    /// performs [`check`](PolicyContext::check).
    pub fn check_cert(
        &mut self,
        index: usize,
        cert: &CertificateItem,
        status: TrustStatus,
    ) -> Result<()> {
        log_error_for_cert(cert, &format!("{} ({} policy)", status, self.policy));
        self.check(Some(index), status)
    }

    /// Returns true if the status is tolerable
    pub fn is_tolerated(&self, status: TrustStatus) -> bool {
        self.tolerated.contains(&status)
    }

    /// Returns the statuses that were reported and tolerated
    pub fn observed(&self) -> &TrustStatuses {
        &self.observed
    }

    /// `add_observed` merges statuses tolerated during a nested evaluation, such as verification of
    /// a CRL, into this context. Statuses this context does not tolerate are ignored.
    pub fn add_observed(&mut self, statuses: &TrustStatuses) {
        for status in statuses {
            if self.tolerated.contains(status) {
                self.observed.insert(*status);
            }
        }
    }

    /// Returns the statuses reported for each certificate, leaf first
    pub fn certificate_statuses(&self) -> &ListOfTrustStatuses {
        &self.cert_statuses
    }

    /// Records an encoded CRL that was used to determine revocation status
    pub fn add_crl_used(&mut self, crl: &[u8]) {
        if !self.crls_used.iter().any(|c| c.as_slice() == crl) {
            self.crls_used.push(crl.to_vec());
        }
    }

    /// Copies the accumulated statuses and CRLs into the given results
    pub fn save_to(&self, results: &mut PolicyResults) {
        for status in &self.observed {
            results.add_tolerated_status(*status);
        }
        for (i, statuses) in self.cert_statuses.iter().enumerate() {
            for status in statuses {
                results.add_certificate_status(i, *status);
            }
        }
        for crl in &self.crls_used {
            results.add_crl_used(crl);
        }
    }
}

#[test]
fn test_report() {
    let mut tolerated = TrustStatuses::new();
    tolerated.insert(TrustStatus::CodeSignDevelopment);
    let mut pctx = PolicyContext::new(TrustPolicy::SwUpdateSigning, false, &tolerated);

    assert_eq!(
        Disposition::Continue,
        pctx.report(Some(0), TrustStatus::CodeSignDevelopment)
    );
    assert_eq!(
        Err(Error::Trust(TrustStatus::InvalidKeyUsage)),
        pctx.check(Some(2), TrustStatus::InvalidKeyUsage)
    );
    assert!(pctx.observed().contains(&TrustStatus::CodeSignDevelopment));
    assert!(!pctx.observed().contains(&TrustStatus::InvalidKeyUsage));
    assert_eq!(3, pctx.certificate_statuses().len());
    assert!(pctx.certificate_statuses()[1].is_empty());

    let mut pr = PolicyResults::new();
    pctx.save_to(&mut pr);
    assert_eq!(1, pr.get_tolerated_statuses().len());
    assert!(pr.get_certificate_statuses()[2].contains(&TrustStatus::InvalidKeyUsage));
}
