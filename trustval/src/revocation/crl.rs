//! CRL verification and revocation status determination
//!
//! A CRL is usable only after its own signer has been verified. Verification proceeds as follows:
//! - the thisUpdate/nextUpdate window must cover the time of interest
//! - every critical CRL extension and CRL entry extension must be understood
//! - a certificate whose subject matches the CRL issuer and whose key verifies the CRL signature
//!   must be found in the signer pool, the trust anchors or the certificate stores, and linked to a
//!   trust anchor. A signer key that lacks parameters inherits them from the key above it before
//!   the CRL signature is checked
//! - the resulting chain must satisfy the CRL signer policy, i.e., the signer asserts cRLSign
//! - for indirect CRLs, or when requested, the signer chain must itself not be revoked
//!
//! The outcome is memoized in the [`CrlItem`] under the key returned by
//! [`VerifyContext::crl_key`].
//!
//! The scope of the CRL as expressed in the issuingDistributionPoint extension is evaluated
//! separately for each certificate the CRL is used for:
//!
//! ```text
//! IssuingDistributionPoint ::= SEQUENCE {
//!     distributionPoint          [0] DistributionPointName OPTIONAL,
//!     onlyContainsUserCerts      [1] BOOLEAN DEFAULT FALSE,
//!     onlyContainsCACerts        [2] BOOLEAN DEFAULT FALSE,
//!     onlySomeReasons            [3] ReasonFlags OPTIONAL,
//!     indirectCRL                [4] BOOLEAN DEFAULT FALSE,
//!     onlyContainsAttributeCerts [5] BOOLEAN DEFAULT FALSE }
//! ```

use const_oid::db::rfc5912::{
    ID_CE_CERTIFICATE_ISSUER, ID_CE_CRL_REASONS, ID_CE_HOLD_INSTRUCTION_CODE,
    ID_CE_INVALIDITY_DATE,
};
use der::asn1::ObjectIdentifier;
use der::Decode;
use log::{debug, info};
use x509_cert::crl::RevokedCert;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::name::Name;

use crate::revocation::check_revocation::check_chain_revocation;
use crate::revocation::crl_item::{CrlItem, CrlState};
use crate::util::crypto::is_partial_key;
use crate::util::error::*;
use crate::util::tp_utilities::{compare_names, log_error_for_cert, name_to_string};
use crate::validator::cert_item::CertificateItem;
use crate::validator::chain::{CertificateChain, CrlSet};
use crate::validator::chain_builder::{complete_partial_keys, resolve_anchor, ResolvedChain};
use crate::validator::extension_info::ExtensionInfo;
use crate::validator::policy_context::PolicyContext;
use crate::validator::policy_settings::{TrustPolicy, TrustStatuses};
use crate::validator::policy_verifier::verify_policy;
use crate::validator::tp_extension::*;
use crate::validator::verify_context::VerifyContext;

/// CRL entry extensions that are understood when marked critical
const CRL_ENTRY_EXTS_OF_INTEREST: &[ObjectIdentifier] = &[
    ID_CE_CRL_REASONS,
    ID_CE_INVALIDITY_DATE,
    ID_CE_HOLD_INSTRUCTION_CODE,
    ID_CE_CERTIFICATE_ISSUER,
];

/// `verify_crl` verifies the given CRL under the given context.
///
/// When `for_cert` is given, the certificate and whether it is evaluated as a CA are used to check
/// the scope of the CRL's issuingDistributionPoint extension. When `force_recursive_check` is true
/// the revocation status of the CRL signer chain is checked even for a direct CRL.
///
/// A CRL that is already being verified by the current call yields `CrlVerificationCycle`.
pub fn verify_crl(
    crl: &CrlItem,
    ctx: &VerifyContext<'_>,
    for_cert: Option<(&CertificateItem, bool)>,
    force_recursive_check: bool,
) -> Result<()> {
    verify_crl_using(crl, ctx, for_cert, force_recursive_check, &CrlSet::default())
}

/// `verify_crl_using` is [`verify_crl`] with a set of caller-supplied CRLs that are consulted,
/// ahead of the cache and the CRL stores, when the revocation status of the signer chain is checked.
///
/// Statuses tolerated along the way are recorded in the item and are available via
/// [`CrlItem::tolerated_statuses`].
pub fn verify_crl_using(
    crl: &CrlItem,
    ctx: &VerifyContext<'_>,
    for_cert: Option<(&CertificateItem, bool)>,
    force_recursive_check: bool,
    crls: &CrlSet<'_>,
) -> Result<()> {
    let key = ctx.crl_key();
    match crl.state(key) {
        CrlState::Good => return check_idp_scope(crl, for_cert),
        CrlState::Bad(status) => return Err(Error::Trust(status)),
        CrlState::InProgress => return Err(Error::Trust(TrustStatus::CrlVerificationCycle)),
        CrlState::Unknown => {}
    }

    let digest = crl.sha256_digest();
    if !ctx.begin_crl(&digest) {
        info!(
            "Verification of CRL from {} requires verification of the same CRL",
            name_to_string(crl.issuer())
        );
        return Err(Error::Trust(TrustStatus::CrlVerificationCycle));
    }
    crl.set_state(key, CrlState::InProgress);
    let r = verify_crl_intrinsic(crl, ctx, force_recursive_check, crls);
    ctx.end_crl(&digest);

    match r {
        Ok(tolerated) => {
            info!("Verified CRL from {}", name_to_string(crl.issuer()));
            crl.set_tolerated_statuses(key, tolerated);
            crl.set_state(key, CrlState::Good);
        }
        Err(e) => {
            info!(
                "Failed to verify CRL from {}: {}",
                name_to_string(crl.issuer()),
                e
            );
            crl.set_state(key, CrlState::Bad(e.status()));
            return Err(e);
        }
    }
    check_idp_scope(crl, for_cert)
}

fn verify_crl_intrinsic(
    crl: &CrlItem,
    ctx: &VerifyContext<'_>,
    force_recursive_check: bool,
    crls: &CrlSet<'_>,
) -> Result<TrustStatuses> {
    let mut pctx = PolicyContext::new(TrustPolicy::CrlSigner, true, ctx.tolerated());

    let toi = ctx.time_of_interest();
    if crl.is_not_valid_yet(toi) {
        pctx.check(None, TrustStatus::CrlNotValidYet)?;
    }
    if crl.is_expired(toi) {
        pctx.check(None, TrustStatus::CrlExpired)?;
    }

    check_crl_extensions(crl, &mut pctx)?;

    let resolved = find_crl_signer(crl, ctx)?;
    let signer_index = resolved.chain.len() - 1;
    match resolved.anchor_status {
        Some(TrustStatus::InvalidAnchor) => {
            pctx.check(Some(signer_index), TrustStatus::CrlInvalidAnchor)?
        }
        Some(_) => pctx.check(Some(signer_index), TrustStatus::CrlNotTrusted)?,
        None => {}
    }

    let signer_key = complete_partial_keys(ctx, &mut pctx, &resolved.chain)?;
    if let Some(signer) = resolved.chain.leaf() {
        if is_partial_key(signer.spki()) {
            let verified = match &signer_key {
                Some(k) => crl.verify_signed_by(ctx.pe(), k).is_ok(),
                None => false,
            };
            if !verified {
                info!(
                    "CRL from {} did not verify with inherited key parameters",
                    name_to_string(crl.issuer())
                );
                pctx.check(Some(0), TrustStatus::CrlNotTrusted)?;
            }
        }
    }

    let infos: Vec<ExtensionInfo> = resolved.chain.iter().map(ExtensionInfo::new).collect();
    verify_policy(
        ctx,
        &mut pctx,
        &resolved.chain,
        &infos,
        resolved.verified_to_root,
        resolved.via_user_trust,
    )?;

    if crl.is_indirect() || force_recursive_check {
        debug!(
            "Checking revocation status of signer of CRL from {}",
            name_to_string(crl.issuer())
        );
        check_chain_revocation(ctx, &mut pctx, &resolved.chain, crls)?;
    }
    Ok(pctx.observed().clone())
}

fn check_crl_extensions(crl: &CrlItem, pctx: &mut PolicyContext) -> Result<()> {
    if let Some(exts) = &crl.decoded_crl.tbs_cert_list.crl_extensions {
        for e in exts {
            let understood = CRL_EXTS_OF_INTEREST.contains(&e.extn_id)
                && !matches!(
                    crl.parsed_extensions.get(&e.extn_id),
                    Some(ParsedExtension {
                        value: TPExtension::Malformed,
                        ..
                    })
                );
            if e.critical && !understood {
                info!(
                    "CRL from {} features unsupported critical extension {}",
                    name_to_string(crl.issuer()),
                    e.extn_id
                );
                pctx.check(None, TrustStatus::UnknownCrlExtension)?;
            }
        }
    }
    for rc in crl.revoked_certificates() {
        if let Some(exts) = &rc.crl_entry_extensions {
            for e in exts {
                if e.critical && !CRL_ENTRY_EXTS_OF_INTEREST.contains(&e.extn_id) {
                    info!(
                        "CRL from {} features entry with unsupported critical extension {}",
                        name_to_string(crl.issuer()),
                        e.extn_id
                    );
                    pctx.check(None, TrustStatus::UnknownCrlExtension)?;
                }
            }
        }
    }
    Ok(())
}

fn check_idp_scope(crl: &CrlItem, for_cert: Option<(&CertificateItem, bool)>) -> Result<()> {
    let (cert, is_ca) = match for_cert {
        Some(fc) => fc,
        None => return Ok(()),
    };
    if let Some(idp) = crl.issuing_distribution_point() {
        let restricted = idp.only_contains_attribute_certs
            || (idp.only_contains_user_certs && is_ca)
            || (idp.only_contains_ca_certs && !is_ca);
        if restricted {
            log_error_for_cert(
                cert,
                &format!(
                    "CRL from {} does not cover this class of certificate",
                    name_to_string(crl.issuer())
                ),
            );
            return Err(Error::Trust(TrustStatus::CrlIdpRestriction));
        }
    }
    Ok(())
}

/// `find_crl_signer` locates a certificate whose key verifies the CRL and resolves it to an anchor.
fn find_crl_signer(crl: &CrlItem, ctx: &VerifyContext<'_>) -> Result<ResolvedChain> {
    let mut candidates: Vec<CertificateItem> = ctx
        .signer_pool()
        .iter()
        .filter(|c| compare_names(c.subject(), crl.issuer()))
        .cloned()
        .collect();
    candidates.extend(
        ctx.anchors()
            .anchors_for_name(crl.issuer())
            .into_iter()
            .map(|ta| ta.cert.clone()),
    );
    for enc in ctx.pe().get_encoded_certificates_for_name(crl.issuer())? {
        if let Ok(cert) = CertificateItem::from_der(&enc) {
            if compare_names(cert.subject(), crl.issuer()) {
                candidates.push(cert);
            }
        }
    }

    let toi = ctx.time_of_interest();
    let mut fallback = None;
    for cert in candidates {
        match crl.verify_signed_by(ctx.pe(), cert.spki()) {
            Ok(()) | Err(Error::Trust(TrustStatus::PublicKeyIncomplete)) => {}
            Err(_e) => continue,
        }
        if cert.is_valid_at(toi) {
            return resolve_anchor(ctx, &CertificateChain::Owned(vec![cert]));
        }
        if fallback.is_none() {
            fallback = Some(cert);
        }
    }
    match fallback {
        Some(cert) => resolve_anchor(ctx, &CertificateChain::Owned(vec![cert])),
        None => {
            info!(
                "Failed to find a certificate that verifies CRL from {}",
                name_to_string(crl.issuer())
            );
            Err(Error::Trust(TrustStatus::CrlNotTrusted))
        }
    }
}

fn certificate_issuer(rc: &RevokedCert) -> Result<Option<Name>> {
    if let Some(exts) = &rc.crl_entry_extensions {
        for e in exts {
            if e.extn_id != ID_CE_CERTIFICATE_ISSUER {
                continue;
            }
            let gns = match Vec::<GeneralName>::from_der(e.extn_value.as_bytes()) {
                Ok(gns) => gns,
                Err(_e) => return Err(Error::Trust(TrustStatus::MalformedCrl)),
            };
            for gn in gns {
                if let GeneralName::DirectoryName(name) = gn {
                    return Ok(Some(name));
                }
            }
        }
    }
    Ok(None)
}

/// `is_certificate_revoked` consults a CRL that verified under the given context and returns
/// `CertificateRevoked` if the certificate is listed with a revocation date at or before the time
/// of interest.
///
/// For an indirect CRL, the certificateIssuer entry extension determines the issuer of the entry and
/// of the entries that follow it.
pub fn is_certificate_revoked(
    crl: &CrlItem,
    cert: &CertificateItem,
    ctx: &VerifyContext<'_>,
) -> Result<()> {
    if crl.state(ctx.crl_key()) != CrlState::Good {
        return Err(Error::Trust(TrustStatus::CrlNotVerified));
    }

    let indirect = crl.is_indirect();
    let mut entry_issuer = crl.issuer().clone();
    for rc in crl.revoked_certificates() {
        if indirect {
            if let Some(name) = certificate_issuer(rc)? {
                entry_issuer = name;
            }
        }
        if rc.serial_number.as_bytes() != cert.serial_number()
            || !compare_names(&entry_issuer, cert.issuer())
        {
            continue;
        }

        let revoked_at = rc.revocation_date.to_unix_duration().as_secs();
        if ctx.time_of_interest() < revoked_at {
            info!(
                "Certificate issued to {} is revoked as of {}, after the time of interest",
                name_to_string(cert.subject()),
                revoked_at
            );
            return Ok(());
        }
        info!(
            "Certificate issued to {} was revoked per CRL from {}",
            name_to_string(cert.subject()),
            name_to_string(crl.issuer())
        );
        return Err(Error::Trust(TrustStatus::CertificateRevoked));
    }
    debug!(
        "Certificate issued to {} is not listed on CRL from {}",
        name_to_string(cert.subject()),
        name_to_string(crl.issuer())
    );
    Ok(())
}
