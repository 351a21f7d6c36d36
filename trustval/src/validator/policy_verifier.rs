//! Universal chain checks, dispatch to the named policy rules and the top level verify_chain entry
//! point

use log::{debug, info};
use x509_cert::ext::pkix::KeyUsages;

use crate::revocation::check_revocation::check_chain_revocation;
use crate::util::crypto::rsa_modulus_bits;
use crate::util::error::*;
use crate::util::tp_oids::{PIV_AUTHENTICATION_POLICY, PIV_CARD_AUTH_POLICY};
use crate::validator::chain::{CertificateChain, CrlSet};
use crate::validator::chain_builder::{complete_partial_keys, link_chain, resolve_anchor};
use crate::validator::extension_info::ExtensionInfo;
use crate::validator::name_constraints::satisfies_name_constraints;
use crate::validator::policy_context::PolicyContext;
use crate::validator::policy_results::PolicyResults;
use crate::validator::policy_rules::check_policy;
use crate::validator::verify_context::VerifyContext;

/// Smallest acceptable RSA modulus, in bits
pub const MIN_RSA_MODULUS_BITS: usize = 1024;

/// `verify_policy` applies the universal checks to each certificate in the chain then applies the
/// rules of the policy named by `pctx`.
///
/// The universal checks stop at the first status that is not tolerated. The policy rules run
/// regardless and a policy failure takes precedence over a universal failure.
pub fn verify_policy(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    chain: &CertificateChain<'_>,
    infos: &[ExtensionInfo],
    verified_to_root: bool,
    via_user_trust: bool,
) -> Result<()> {
    if chain.is_empty() || chain.len() != infos.len() {
        return Err(Error::Trust(TrustStatus::BadChainLength));
    }
    let universal = check_universal(ctx, pctx, chain, infos, verified_to_root);
    check_policy(ctx, pctx, chain, infos, verified_to_root, via_user_trust)?;
    universal
}

fn check_universal(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    chain: &CertificateChain<'_>,
    infos: &[ExtensionInfo],
    verified_to_root: bool,
) -> Result<()> {
    let last = chain.len() - 1;
    let toi = ctx.time_of_interest();

    for (i, cert) in chain.iter().enumerate() {
        let info = &infos[i];
        let is_anchor = i == last && verified_to_root;

        if info.unknown_critical {
            pctx.check_cert(i, cert, TrustStatus::UnknownCriticalExtension)?;
        }

        match rsa_modulus_bits(cert.spki()) {
            Ok(Some(bits)) if bits < MIN_RSA_MODULUS_BITS => {
                pctx.check_cert(i, cert, TrustStatus::WeakKeySize)?
            }
            Ok(_) => {}
            Err(e) => pctx.check_cert(i, cert, e.status())?,
        }

        if let Err(e) = cert.valid_at_time(toi) {
            let tolerated_root = is_anchor
                && ctx.allow_expired_root()
                && e == Error::Trust(TrustStatus::CertificateExpired);
            if tolerated_root {
                debug!("Tolerating expired anchor");
            } else {
                pctx.check_cert(i, cert, e.status())?;
            }
        }

        if i > 0 {
            match info.is_ca() {
                Some(false) => pctx.check_cert(i, cert, TrustStatus::InvalidBasicConstraints)?,
                None if i < last && !ctx.allow_missing_basic_constraints() => {
                    pctx.check_cert(i, cert, TrustStatus::MissingBasicConstraints)?
                }
                _ => {}
            }

            if let Some(Some(path_len)) = info
                .basic_constraints
                .as_ref()
                .map(|bc| bc.value.path_len_constraint)
            {
                let intermediates = (1..i)
                    .filter_map(|j| chain.get(j))
                    .filter(|c| !c.is_self_issued())
                    .count();
                if intermediates > path_len as usize {
                    pctx.check_cert(i, cert, TrustStatus::PathLengthExceeded)?;
                }
            }

            if let Some(ku) = &info.key_usage {
                if !ku.value.contains(KeyUsages::KeyCertSign) {
                    pctx.check_cert(i, cert, TrustStatus::InvalidKeyUsage)?;
                }
            }

            if let Some(nc) = &info.name_constraints {
                for j in 0..i {
                    let sub = match chain.get(j) {
                        Some(s) => s,
                        None => continue,
                    };
                    if j > 0 && sub.is_self_issued() {
                        continue;
                    }
                    if !satisfies_name_constraints(&nc.value, sub) {
                        pctx.check_cert(j, sub, TrustStatus::NameConstraintsViolation)?;
                    }
                }
            }
        }

        if i < last {
            let aki = info.authority_key_id.as_ref().and_then(|a| a.value.as_ref());
            let ski = infos[i + 1].subject_key_id.as_ref().map(|s| &s.value);
            if let (Some(aki), Some(ski)) = (aki, ski) {
                if aki != ski {
                    pctx.check_cert(i, cert, TrustStatus::IdentifierLinkageMismatch)?;
                }
            }
        }

        if info.weak_alg && !is_anchor {
            pctx.check_cert(i, cert, TrustStatus::UntrustedSignatureAlgorithm)?;
        }

        if cert.has_empty_subject_name() && (i != 0 || !info.has_critical_san()) {
            pctx.check_cert(i, cert, TrustStatus::InvalidSubjectName)?;
        }

        if i == 0
            && (info.has_policy(&PIV_AUTHENTICATION_POLICY) || info.has_policy(&PIV_CARD_AUTH_POLICY))
            && !info.key_usage_contains(KeyUsages::DigitalSignature)
        {
            pctx.check_cert(i, cert, TrustStatus::InvalidKeyUsage)?;
        }
    }
    Ok(())
}

/// `verify_chain` links the chain, resolves it to a trust anchor, consults the allow-list if no
/// anchor was reached, applies [`verify_policy`] and, if enabled, checks revocation status. The
/// outcome, along with the statuses observed along the way, is recorded in `results`.
///
/// CRLs in `crls` are consulted before any store.
pub fn verify_chain(
    ctx: &VerifyContext<'_>,
    chain: &CertificateChain<'_>,
    crls: &CrlSet<'_>,
    results: &mut PolicyResults,
) -> Result<()> {
    let mut pctx = PolicyContext::new(ctx.policy(), ctx.leaf_is_ca(), ctx.tolerated());
    let r = verify_chain_internal(ctx, &mut pctx, chain, crls, results);
    pctx.save_to(results);
    match &r {
        Ok(()) => {
            info!("Chain verified under {} policy", ctx.policy());
            results.set_validation_status(TrustStatus::Valid);
        }
        Err(e) => {
            info!("Chain failed verification under {} policy: {}", ctx.policy(), e);
            results.set_validation_status(e.status());
        }
    }
    r
}

fn verify_chain_internal(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    chain: &CertificateChain<'_>,
    crls: &CrlSet<'_>,
    results: &mut PolicyResults,
) -> Result<()> {
    if chain.is_empty() {
        return Err(Error::Trust(TrustStatus::BadChainLength));
    }
    results.set_chain_length(chain.len() as u32);

    link_chain(ctx, pctx, chain)?;
    let resolved = resolve_anchor(ctx, chain)?;
    results.set_chain_length(resolved.chain.len() as u32);
    results.set_verified_to_root(resolved.verified_to_root);
    results.set_verified_via_user_trust(resolved.via_user_trust);
    complete_partial_keys(ctx, pctx, &resolved.chain)?;

    if let Some(status) = resolved.anchor_status {
        if ctx.use_allowlist() && ctx.allowlist().is_allowed(&resolved.chain) {
            info!("Chain admitted by allow-list");
            results.set_allowlisted(true);
        } else {
            let i = resolved.chain.len() - 1;
            if let Some(cert) = resolved.chain.get(i) {
                pctx.check_cert(i, cert, status)?;
            }
        }
    }

    let infos: Vec<ExtensionInfo> = resolved.chain.iter().map(ExtensionInfo::new).collect();
    verify_policy(
        ctx,
        pctx,
        &resolved.chain,
        &infos,
        resolved.verified_to_root,
        resolved.via_user_trust,
    )?;

    if ctx.check_revocation() {
        check_chain_revocation(ctx, pctx, &resolved.chain, crls)?;
    }
    Ok(())
}
