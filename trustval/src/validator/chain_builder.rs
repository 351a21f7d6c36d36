//! Linking a supplied chain and resolving it to a trust anchor

use log::{debug, info};
use spki::SubjectPublicKeyInfoOwned;

use crate::source::discovery::find_issuer;
use crate::util::crypto::{complete_key, is_partial_key};
use crate::util::error::*;
use crate::util::tp_utilities::{compare_names, name_to_string};
use crate::validator::cert_item::CertificateItem;
use crate::validator::chain::CertificateChain;
use crate::validator::policy_context::PolicyContext;
use crate::validator::verify_context::VerifyContext;

/// Upper bound on the length of a chain assembled during anchor resolution
pub const MAX_CHAIN_LENGTH: usize = 16;

/// `ResolvedChain` is a chain that has been extended, as far as possible, to a trust anchor.
#[derive(Clone, Debug)]
pub struct ResolvedChain {
    /// Chain, leaf first. When `verified_to_root` is true, the last certificate is a trust anchor.
    pub chain: CertificateChain<'static>,
    /// True if the chain terminates in a trust anchor
    pub verified_to_root: bool,
    /// True if the anchor was added as user trust
    pub via_user_trust: bool,
    /// `InvalidAnchor` or `NotTrusted` when the chain does not terminate in a trust anchor
    pub anchor_status: Option<TrustStatus>,
}

impl ResolvedChain {
    fn new(chain: CertificateChain<'static>, anchor: Option<bool>) -> Self {
        ResolvedChain {
            chain,
            verified_to_root: anchor.is_some(),
            via_user_trust: anchor.unwrap_or(false),
            anchor_status: None,
        }
    }

    fn failed(chain: CertificateChain<'static>, status: TrustStatus) -> Self {
        ResolvedChain {
            chain,
            verified_to_root: false,
            via_user_trust: false,
            anchor_status: Some(status),
        }
    }
}

// a key that lacks parameters is accepted here and settled by complete_partial_keys
fn is_signed_by(ctx: &VerifyContext<'_>, cert: &CertificateItem, issuer: &CertificateItem) -> bool {
    match cert.verify_signed_by(ctx.pe(), issuer.spki()) {
        Ok(()) => true,
        Err(Error::Trust(TrustStatus::PublicKeyIncomplete)) => true,
        Err(_e) => false,
    }
}

/// `link_chain` checks that each certificate's issuer name matches the subject name of the next
/// certificate and that the next certificate's key verifies its signature.
///
/// A signature that cannot be checked because the issuer's key lacks parameters is left to
/// [`complete_partial_keys`], which must be applied to the chain once it has been resolved.
pub fn link_chain(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    chain: &CertificateChain<'_>,
) -> Result<()> {
    for i in 0..chain.len().saturating_sub(1) {
        let (cert, issuer) = match (chain.get(i), chain.get(i + 1)) {
            (Some(c), Some(n)) => (c, n),
            _ => break,
        };
        if !compare_names(cert.issuer(), issuer.subject()) {
            pctx.check_cert(i, cert, TrustStatus::NameChainingFailure)?;
            continue;
        }
        match cert.verify_signed_by(ctx.pe(), issuer.spki()) {
            Ok(()) => {}
            Err(Error::Trust(TrustStatus::PublicKeyIncomplete)) => debug!(
                "Deferring signature check of {} until key parameters are inherited",
                name_to_string(cert.subject())
            ),
            Err(_e) => pctx.check_cert(i, cert, TrustStatus::SignatureVerificationFailure)?,
        }
    }
    Ok(())
}

/// `complete_partial_keys` walks the chain from the last certificate toward the leaf, filling in
/// omitted key parameters from the key above, and verifies each signature whose issuer key lacked
/// parameters using the completed key. A signature whose issuer key cannot be completed yields
/// `SignatureVerificationFailure`.
///
/// The completed key of the first certificate in the chain is returned.
pub fn complete_partial_keys(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    chain: &CertificateChain<'_>,
) -> Result<Option<SubjectPublicKeyInfoOwned>> {
    let mut working: Option<SubjectPublicKeyInfoOwned> = None;
    for i in (0..chain.len()).rev() {
        let cert = match chain.get(i) {
            Some(c) => c,
            None => break,
        };
        if let (Some(issuer_key), Some(issuer)) = (&working, chain.get(i + 1)) {
            if is_partial_key(issuer.spki()) {
                if let Err(e) = cert.verify_signed_by(ctx.pe(), issuer_key) {
                    debug!(
                        "Signature of {} did not verify with inherited key parameters: {}",
                        name_to_string(cert.subject()),
                        e
                    );
                    pctx.check_cert(i, cert, TrustStatus::SignatureVerificationFailure)?;
                }
            }
        }
        working = Some(
            match working
                .as_ref()
                .and_then(|issuer_key| complete_key(cert.spki(), issuer_key))
            {
                Some(completed) => completed,
                None => cert.spki().clone(),
            },
        );
    }
    Ok(working)
}

/// `resolve_anchor` extends the chain until it terminates in a trust anchor. The routes are tried
/// in order:
/// - the last certificate is a trust anchor
/// - a trust anchor issued the last certificate, in which case the anchor is appended
/// - an issuer is found in the signer pool or the certificate stores and appended
///
/// A chain that ends in a self-signed certificate that is not an anchor yields `InvalidAnchor`.
/// Before concluding that, an alternative issuer is sought for the certificate below it. A chain
/// that cannot be extended yields `NotTrusted`. Store failures are returned as errors.
pub fn resolve_anchor(
    ctx: &VerifyContext<'_>,
    chain: &CertificateChain<'_>,
) -> Result<ResolvedChain> {
    let mut working = chain.to_owned_chain();
    let mut old_root: Option<CertificateItem> = None;

    loop {
        let last = match working.last() {
            Some(l) => l.clone(),
            None => return Err(Error::Trust(TrustStatus::BadChainLength)),
        };

        if let Some(ta) = ctx.anchors().find(&last) {
            debug!("Chain terminates in anchor {}", name_to_string(last.subject()));
            let user_trust = ta.user_trust;
            return Ok(ResolvedChain::new(working, Some(user_trust)));
        }

        if let Some(ta) = ctx
            .anchors()
            .anchors_for_name(last.issuer())
            .into_iter()
            .find(|ta| is_signed_by(ctx, &last, &ta.cert))
        {
            debug!("Appending anchor {}", name_to_string(ta.cert.subject()));
            let user_trust = ta.user_trust;
            working.push_owned(ta.cert.clone());
            return Ok(ResolvedChain::new(working, Some(user_trust)));
        }

        if last.is_self_signed(ctx.pe()) {
            info!(
                "Chain terminates in {}, which is not a trust anchor",
                name_to_string(last.subject())
            );
            return Ok(ResolvedChain::failed(working, TrustStatus::InvalidAnchor));
        }

        if working.len() >= MAX_CHAIN_LENGTH {
            info!("Chain exceeds {} certificates", MAX_CHAIN_LENGTH);
            return Ok(ResolvedChain::failed(working, TrustStatus::NotTrusted));
        }

        match find_issuer(&last, ctx, old_root.as_ref())? {
            Some(found) => {
                if found.partial_key {
                    debug!(
                        "Key of {} lacks parameters, which must be inherited from its issuer",
                        name_to_string(found.cert.subject())
                    );
                }
                if working.iter().any(|c| *c == found.cert) {
                    info!(
                        "Issuer {} already appears in the chain",
                        name_to_string(found.cert.subject())
                    );
                    return Ok(ResolvedChain::failed(working, TrustStatus::NotTrusted));
                }
                let untrusted_root = found.cert.is_self_signed(ctx.pe())
                    && ctx.anchors().find(&found.cert).is_none();
                if untrusted_root && old_root.is_none() {
                    // look once for an alternative to a root that is not an anchor
                    old_root = Some(found.cert);
                    continue;
                }
                old_root = None;
                working.push_owned(found.cert);
            }
            None => match old_root.take() {
                Some(root) => working.push_owned(root),
                None => {
                    info!(
                        "Failed to find issuer of {}",
                        name_to_string(last.subject())
                    );
                    return Ok(ResolvedChain::failed(working, TrustStatus::NotTrusted));
                }
            },
        }
    }
}
