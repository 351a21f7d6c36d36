//! Rules for policies defined solely by key purpose: time stamping, OCSP signing, PKINIT and CRL
//! signing

use const_oid::db::rfc5280::{ID_KP_OCSP_SIGNING, ID_KP_TIME_STAMPING};
use x509_cert::ext::pkix::KeyUsages;

use crate::util::error::*;
use crate::util::tp_oids::{ID_PKINIT_KP_CLIENT_AUTH, ID_PKINIT_KP_KDC};
use crate::validator::policy_context::PolicyContext;
use crate::validator::policy_rules::RuleChain;
use crate::validator::policy_settings::TrustPolicy;

/// RFC 3161 requires a critical extendedKeyUsage carrying only id-kp-timeStamping.
pub(crate) fn check_time_stamping(
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    match &rc.leaf_info().extended_key_usage {
        None => rc.fail(pctx, 0, TrustStatus::MissingRequiredExtension)?,
        Some(eku) => {
            if !eku.critical || eku.value.as_slice() != [ID_KP_TIME_STAMPING] {
                rc.fail(pctx, 0, TrustStatus::InvalidExtendedKeyUsage)?;
            }
        }
    }
    rc.require_leaf_key_usage(
        pctx,
        &[KeyUsages::DigitalSignature, KeyUsages::NonRepudiation],
        false,
    )
}

pub(crate) fn check_ocsp_signing(pctx: &mut PolicyContext, rc: &RuleChain<'_, '_>) -> Result<()> {
    rc.require_eku(pctx, 0, &[ID_KP_OCSP_SIGNING], true)
}

pub(crate) fn check_pkinit(pctx: &mut PolicyContext, rc: &RuleChain<'_, '_>) -> Result<()> {
    let purpose = if pctx.policy == TrustPolicy::PkinitServer {
        ID_PKINIT_KP_KDC
    } else {
        ID_PKINIT_KP_CLIENT_AUTH
    };
    rc.require_eku(pctx, 0, &[purpose], true)
}

pub(crate) fn check_crl_signer(pctx: &mut PolicyContext, rc: &RuleChain<'_, '_>) -> Result<()> {
    rc.require_leaf_key_usage(pctx, &[KeyUsages::CRLSign], true)
}
