//! Rules for policies whose anchor is pinned by SHA-1 digest

use log::{debug, error};

use crate::util::error::*;
use crate::util::tp_oids::{APPLE_MOBILE_STORE_POLICY, APPLE_TEST_MOBILE_STORE_POLICY};
use crate::util::tp_utilities::hex_to_buffer;
use crate::validator::policy_context::PolicyContext;
use crate::validator::policy_rules::RuleChain;
use crate::validator::verify_context::VerifyContext;

/// Returns true if the SHA-1 digest of the last certificate in the chain is among the configured
/// pinned anchors. No configured pins means no anchor matches.
fn anchor_is_pinned(ctx: &VerifyContext<'_>, rc: &RuleChain<'_, '_>) -> Result<bool> {
    let pins = match ctx.settings().get_pinned_anchors() {
        Some(pins) if !pins.is_empty() => pins,
        _ => {
            error!("No pinned anchors are configured for {} policy", ctx.policy());
            return Ok(false);
        }
    };
    let anchor = rc.cert(rc.len() - 1)?;
    let digest = anchor.sha1_digest();
    for pin in &pins {
        match hex_to_buffer(pin) {
            Ok(p) if p == digest => return Ok(true),
            Ok(_) => {}
            Err(_) => debug!("Ignoring malformed pinned anchor value: {}", pin),
        }
    }
    Ok(false)
}

fn require_pinned_anchor(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    if !anchor_is_pinned(ctx, rc)? {
        rc.fail(pctx, rc.len() - 1, TrustStatus::InvalidAnchor)?;
    }
    Ok(())
}

/// When `host` falls at or beneath a configured pinned domain, requires the anchor to be pinned.
pub(crate) fn check_pinned_domains(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
    host: &str,
    verified_to_root: bool,
) -> Result<()> {
    let domains = match ctx.settings().get_pinned_domains() {
        Some(d) => d,
        None => return Ok(()),
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let pinned = domains.iter().any(|d| {
        let d = d.trim_end_matches('.').to_ascii_lowercase();
        !d.is_empty() && (host == d || host.ends_with(&format!(".{}", d)))
    });
    if !pinned {
        return Ok(());
    }
    debug!("{} falls under a pinned domain", host);
    if !verified_to_root || !anchor_is_pinned(ctx, rc)? {
        rc.fail(pctx, rc.len() - 1, TrustStatus::InvalidAnchor)?;
    }
    Ok(())
}

pub(crate) fn check_app_store_receipt(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    require_pinned_anchor(ctx, pctx, rc)?;
    rc.require_length(pctx, 3)?;
    rc.require_marker(pctx, 0, |i| i.app_store_receipt)?;
    rc.require_marker(pctx, 1, |i| i.wwdr_intermediate)
}

pub(crate) fn check_mobile_store(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
    test: bool,
) -> Result<()> {
    require_pinned_anchor(ctx, pctx, rc)?;
    rc.require_length(pctx, 3)?;
    let policy = if test {
        rc.require_marker(pctx, 0, |i| i.test_mobile_store)?;
        APPLE_TEST_MOBILE_STORE_POLICY
    } else {
        rc.require_marker(pctx, 0, |i| i.mobile_store)?;
        APPLE_MOBILE_STORE_POLICY
    };
    if !rc.leaf_info().has_policy(&policy) {
        rc.fail(pctx, 0, TrustStatus::InvalidPolicyIdentifiers)?;
    }
    Ok(())
}

pub(crate) fn check_provisioning_profile(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    require_pinned_anchor(ctx, pctx, rc)?;
    rc.require_length(pctx, 3)?;
    rc.require_marker(pctx, 0, |i| i.provisioning_profile_signing)?;
    rc.require_marker(pctx, 1, |i| i.wwdr_intermediate)
}

pub(crate) fn check_passbook(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    use crate::util::tp_oids::APPLE_EKU_PASSBOOK_SIGNING;

    require_pinned_anchor(ctx, pctx, rc)?;
    rc.require_length(pctx, 3)?;
    rc.require_marker(pctx, 0, |i| i.passbook_signing)?;
    rc.require_marker(pctx, 1, |i| i.wwdr_intermediate)?;
    rc.require_eku(pctx, 0, &[APPLE_EKU_PASSBOOK_SIGNING], true)
}

pub(crate) fn check_escrow(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    use x509_cert::ext::pkix::KeyUsages;

    require_pinned_anchor(ctx, pctx, rc)?;
    rc.require_length(pctx, 2)?;
    rc.require_marker(pctx, 0, |i| i.escrow_service)?;
    rc.require_leaf_key_usage(pctx, &[KeyUsages::KeyEncipherment], true)
}
