//! Store-backed discovery of issuer certificates and CRLs
//!
//! Issuer discovery considers every candidate whose subject matches the issuer name of the target
//! and whose public key verifies the target's signature. Among those, a temporally valid root is
//! preferred, then a root that is not temporally valid, then a temporally valid intermediate and
//! finally whatever temporally invalid candidate was seen first. The preference is expressed by
//! [`IssuerSearch`], whose [`advance`](IssuerSearch::advance) function is applied to each candidate
//! in turn.

use log::{debug, info};
use x509_cert::name::Name;

use crate::revocation::crl::verify_crl_using;
use crate::revocation::crl_item::CrlItem;
use crate::util::error::*;
use crate::util::tp_utilities::{compare_names, name_to_string};
use crate::validator::cert_item::CertificateItem;
use crate::validator::chain::CrlSet;
use crate::validator::verify_context::VerifyContext;

/// `Candidate` is a prospective issuer whose signature over the target has been verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Prospective issuer
    pub cert: CertificateItem,
    /// True if the candidate is self-signed
    pub is_root: bool,
    /// True if the candidate is valid at the time of interest
    pub temporally_valid: bool,
    /// True if the candidate's public key lacks parameters that must be inherited from its issuer
    pub partial_key: bool,
}

/// `IssuerSearch` is the state of an issuer search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IssuerSearch {
    /// No acceptable candidate has been seen
    #[default]
    Searching,
    /// The first temporally invalid candidate, held as a last resort
    HoldingExpired(Candidate),
    /// The first temporally valid non-root along with the last resort, if any
    HoldingNonRoot {
        /// Temporally valid non-root
        non_root: Candidate,
        /// First temporally invalid candidate
        expired: Option<Candidate>,
    },
    /// The first root that is not temporally valid. Outranks any non-root.
    HoldingExpiredRoot(Candidate),
    /// A temporally valid root. Terminal.
    Found(Candidate),
}

impl IssuerSearch {
    /// `advance` returns the state that results from considering the given candidate.
    pub fn advance(self, candidate: Candidate) -> IssuerSearch {
        use IssuerSearch::*;
        match (self, candidate.is_root, candidate.temporally_valid) {
            (Found(f), _, _) => Found(f),
            (_, true, true) => Found(candidate),
            (HoldingExpiredRoot(r), _, _) => HoldingExpiredRoot(r),
            (_, true, false) => HoldingExpiredRoot(candidate),
            (Searching, false, true) => HoldingNonRoot {
                non_root: candidate,
                expired: None,
            },
            (HoldingExpired(e), false, true) => HoldingNonRoot {
                non_root: candidate,
                expired: Some(e),
            },
            (Searching, false, false) => HoldingExpired(candidate),
            (state, false, _) => state,
        }
    }

    /// Returns true if no further candidate can change the outcome
    pub fn is_done(&self) -> bool {
        matches!(self, IssuerSearch::Found(_))
    }

    /// `finish` returns the preferred candidate, if any.
    pub fn finish(self) -> Option<Candidate> {
        match self {
            IssuerSearch::Searching => None,
            IssuerSearch::HoldingExpired(e) => Some(e),
            IssuerSearch::HoldingNonRoot { non_root, .. } => Some(non_root),
            IssuerSearch::HoldingExpiredRoot(r) => Some(r),
            IssuerSearch::Found(f) => Some(f),
        }
    }
}

/// `FoundIssuer` is the result of a successful issuer search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundIssuer {
    /// Issuer certificate
    pub cert: CertificateItem,
    /// True if the issuer's public key lacks parameters that must be inherited from its issuer
    pub partial_key: bool,
}

fn consider(
    ctx: &VerifyContext<'_>,
    subject: &CertificateItem,
    old_root: Option<&CertificateItem>,
    cert: CertificateItem,
    state: IssuerSearch,
) -> IssuerSearch {
    if !compare_names(cert.subject(), subject.issuer()) {
        return state;
    }
    if old_root == Some(&cert) {
        debug!(
            "Skipping previously rejected root {}",
            name_to_string(cert.subject())
        );
        return state;
    }
    let partial_key = match subject.verify_signed_by(ctx.pe(), cert.spki()) {
        Ok(()) => false,
        Err(Error::Trust(TrustStatus::PublicKeyIncomplete)) => true,
        Err(_e) => {
            debug!(
                "Discarding candidate issuer {} whose key does not verify {}",
                name_to_string(cert.subject()),
                name_to_string(subject.subject())
            );
            return state;
        }
    };
    let candidate = Candidate {
        is_root: cert.is_self_signed(ctx.pe()),
        temporally_valid: cert.is_valid_at(ctx.time_of_interest()),
        partial_key,
        cert,
    };
    debug!(
        "Candidate issuer {} (root: {}, valid: {})",
        name_to_string(candidate.cert.subject()),
        candidate.is_root,
        candidate.temporally_valid
    );
    state.advance(candidate)
}

/// `find_issuer` searches the signer pool and then each certificate store for the issuer of
/// `subject`. A candidate identical to `old_root` is skipped. Store failures are returned as errors.
pub fn find_issuer(
    subject: &CertificateItem,
    ctx: &VerifyContext<'_>,
    old_root: Option<&CertificateItem>,
) -> Result<Option<FoundIssuer>> {
    let mut state = IssuerSearch::Searching;

    for cert in ctx.signer_pool() {
        state = consider(ctx, subject, old_root, cert.clone(), state);
        if state.is_done() {
            break;
        }
    }

    if !state.is_done() {
        'stores: for source in ctx.pe().certificate_sources() {
            for enc in source.get_encoded_certificates_for_name(subject.issuer())? {
                let cert = match CertificateItem::from_der(&enc) {
                    Ok(c) => c,
                    Err(_e) => continue,
                };
                state = consider(ctx, subject, old_root, cert, state);
                if state.is_done() {
                    break 'stores;
                }
            }
        }
    }

    Ok(state.finish().map(|c| {
        debug!(
            "Selected issuer {} for {}",
            name_to_string(c.cert.subject()),
            name_to_string(subject.subject())
        );
        FoundIssuer {
            cert: c.cert,
            partial_key: c.partial_key,
        }
    }))
}

/// `find_crl` queries each CRL store for CRLs from `issuer` that cover the time of interest and
/// returns the first one that verifies. A CRL that verifies is added to the shared revocation cache,
/// if one is in use.
///
/// When `for_cert` is given, the certificate and whether it is evaluated as a CA are used to check
/// the scope of each candidate's issuingDistributionPoint extension.
pub fn find_crl(
    issuer: &Name,
    for_cert: Option<(&CertificateItem, bool)>,
    ctx: &VerifyContext<'_>,
) -> Result<Option<CrlItem>> {
    find_crl_using(issuer, for_cert, ctx, &CrlSet::default())
}

/// `find_crl_using` is [`find_crl`] with caller-supplied CRLs made available to the revocation
/// check of each candidate's signer chain.
pub fn find_crl_using(
    issuer: &Name,
    for_cert: Option<(&CertificateItem, bool)>,
    ctx: &VerifyContext<'_>,
    crls: &CrlSet<'_>,
) -> Result<Option<CrlItem>> {
    let mut cycle = false;
    for source in ctx.pe().crl_sources() {
        for enc in source.get_encoded_crls_for_issuer(issuer, ctx.time_of_interest())? {
            let crl = match CrlItem::from_der(&enc) {
                Ok(c) => c,
                Err(_e) => continue,
            };
            let force = ctx.check_crl_signer_revocation();
            match verify_crl_using(&crl, ctx, for_cert, force, crls) {
                Ok(()) => {
                    if let Some(cache) = ctx.revocation_cache() {
                        cache.add(ctx.crl_key(), &crl)?;
                    }
                    return Ok(Some(crl));
                }
                Err(Error::Trust(TrustStatus::CrlVerificationCycle)) => cycle = true,
                Err(e) => {
                    info!(
                        "Discarding CRL from {}: {}",
                        name_to_string(crl.issuer()),
                        e
                    );
                }
            }
        }
    }
    if cycle {
        return Err(Error::Trust(TrustStatus::CrlVerificationCycle));
    }
    Ok(None)
}
