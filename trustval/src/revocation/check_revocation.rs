//! Revocation status determination for each certificate in a chain
//!
//! For each certificate other than a trust anchor, CRLs are sought in this order:
//! - CRLs supplied by the caller
//! - CRLs previously verified under the same context and retained in the shared revocation cache
//! - CRLs returned by the CRL stores
//!
//! The first CRL that verifies determines the status of the certificate. Statuses tolerated while
//! verifying that CRL, e.g., `CrlExpired`, are carried into the results for the chain.

use log::info;

use crate::revocation::crl::{is_certificate_revoked, verify_crl_using};
use crate::revocation::crl_item::CrlItem;
use crate::source::discovery::find_crl_using;
use crate::util::error::*;
use crate::util::tp_utilities::name_to_string;
use crate::validator::cert_item::CertificateItem;
use crate::validator::chain::{CertificateChain, CrlSet};
use crate::validator::policy_context::PolicyContext;
use crate::validator::verify_context::VerifyContext;

fn crl_for_certificate(
    ctx: &VerifyContext<'_>,
    cert: &CertificateItem,
    is_ca: bool,
    crls: &CrlSet<'_>,
) -> Result<Option<CrlItem>> {
    let force = ctx.check_crl_signer_revocation();
    let mut cycle = false;

    for crl in crls.for_issuer(cert.issuer()) {
        match verify_crl_using(crl, ctx, Some((cert, is_ca)), force, crls) {
            Ok(()) => return Ok(Some(crl.clone())),
            Err(Error::Trust(TrustStatus::CrlVerificationCycle)) => cycle = true,
            Err(_e) => {}
        }
    }

    if let Some(cache) = ctx.revocation_cache() {
        for crl in cache.get_for_issuer(cert.issuer(), ctx.crl_key())? {
            if verify_crl_using(&crl, ctx, Some((cert, is_ca)), force, crls).is_ok() {
                return Ok(Some(crl));
            }
        }
    }

    match find_crl_using(cert.issuer(), Some((cert, is_ca)), ctx, crls) {
        Ok(Some(crl)) => return Ok(Some(crl)),
        Ok(None) => {}
        Err(Error::Trust(TrustStatus::CrlVerificationCycle)) => cycle = true,
        Err(e) => return Err(e),
    }

    if cycle {
        Err(Error::Trust(TrustStatus::CrlVerificationCycle))
    } else {
        Ok(None)
    }
}

/// `check_chain_revocation` determines the revocation status of each certificate in the chain that
/// is not a trust anchor. Statuses are reported to the policy context, which decides whether
/// evaluation continues. `CrlNotFound` is reported only when a CRL is required for every
/// certificate.
pub fn check_chain_revocation(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    chain: &CertificateChain<'_>,
    crls: &CrlSet<'_>,
) -> Result<()> {
    for (i, cert) in chain.iter().enumerate() {
        if ctx.anchors().find(cert).is_some() {
            continue;
        }
        let is_ca = i > 0 || pctx.leaf_is_ca;

        let crl = match crl_for_certificate(ctx, cert, is_ca, crls) {
            Ok(crl) => crl,
            Err(Error::Trust(status)) => {
                pctx.check_cert(i, cert, status)?;
                continue;
            }
            Err(e) => return Err(e),
        };

        match crl {
            Some(crl) => {
                pctx.add_crl_used(&crl.encoded_crl);
                pctx.add_observed(&crl.tolerated_statuses(ctx.crl_key()));
                match is_certificate_revoked(&crl, cert, ctx) {
                    Ok(()) => {}
                    Err(Error::Trust(status)) => pctx.check_cert(i, cert, status)?,
                    Err(e) => return Err(e),
                }
            }
            None => {
                info!(
                    "No CRL found for certificate issued to {}",
                    name_to_string(cert.subject())
                );
                if ctx.require_crl_per_cert() {
                    pctx.check_cert(i, cert, TrustStatus::CrlNotFound)?;
                }
            }
        }
    }
    Ok(())
}
