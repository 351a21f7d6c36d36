//! Code, package, resource and software update signing rules

use const_oid::db::rfc5280::{ANY_EXTENDED_KEY_USAGE, ID_KP_CODE_SIGNING};
use log::info;
use x509_cert::ext::pkix::KeyUsages;

use crate::util::error::*;
use crate::util::tp_oids::{APPLE_EKU_CODE_SIGNING_DEV, APPLE_EKU_RESOURCE_SIGNING};
use crate::validator::policy_context::PolicyContext;
use crate::validator::policy_rules::RuleChain;

pub(crate) fn check_code_signing(pctx: &mut PolicyContext, rc: &RuleChain<'_, '_>) -> Result<()> {
    rc.require_eku(pctx, 0, &[ID_KP_CODE_SIGNING, ANY_EXTENDED_KEY_USAGE], false)?;
    rc.require_leaf_key_usage(pctx, &[KeyUsages::DigitalSignature], false)
}

pub(crate) fn check_package_signing(
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    check_code_signing(pctx, rc)?;
    rc.require_min_length(pctx, 3)?;
    if rc.leaf_info().developer_id_leaf {
        rc.require_marker(pctx, 1, |i| i.developer_id_intermediate)?;
    }
    Ok(())
}

pub(crate) fn check_resource_signing(
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    rc.require_eku(pctx, 0, &[APPLE_EKU_RESOURCE_SIGNING], true)
}

/// Software update signing requires leaf, intermediate and root. A leaf bearing the development
/// purpose instead of codeSigning reports `CodeSignDevelopment`.
pub(crate) fn check_sw_update_signing(
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    rc.require_length(pctx, 3)?;
    rc.require_eku(pctx, 1, &[ID_KP_CODE_SIGNING], true)?;

    let leaf = rc.leaf_info();
    if leaf.eku_contains_any(&[ID_KP_CODE_SIGNING]) {
        return Ok(());
    }
    if leaf.eku_contains_any(&[APPLE_EKU_CODE_SIGNING_DEV]) {
        info!("Software update leaf bears the development code signing purpose");
        return rc.fail(pctx, 0, TrustStatus::CodeSignDevelopment);
    }
    rc.require_eku(pctx, 0, &[ID_KP_CODE_SIGNING], true)
}
