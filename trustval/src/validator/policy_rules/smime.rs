//! Email address matching and the S/MIME and iChat rules

use const_oid::db::rfc5280::{ANY_EXTENDED_KEY_USAGE, ID_KP_EMAIL_PROTECTION};
use flagset::FlagSet;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::KeyUsages;

use crate::util::error::*;
use crate::util::tp_oids::{APPLE_EKU_ICHAT_ENCRYPTION, APPLE_EKU_ICHAT_SIGNING};
use crate::util::tp_utilities::get_email_addresses;
use crate::validator::cert_item::CertificateItem;
use crate::validator::policy_context::PolicyContext;
use crate::validator::policy_rules::RuleChain;
use crate::validator::verify_context::VerifyContext;

/// Domains whose addresses may serve as iChat handles
const ICHAT_DOMAINS: &[&str] = &["mac.com", "me.com", "icloud.com"];

pub(crate) fn check_smime(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    let leaf = rc.leaf()?;
    if let Some(addr) = ctx.settings().get_email_address() {
        if !match_email_address(leaf, &addr) {
            rc.fail(pctx, 0, TrustStatus::EmailAddressMismatch)?;
        }
    }

    rc.require_eku(pctx, 0, &[ID_KP_EMAIL_PROTECTION, ANY_EXTENDED_KEY_USAGE], false)?;

    if let Some(wanted) = ctx.settings().get_smime_key_usage() {
        if let Some(ku) = &rc.leaf_info().key_usage {
            if !key_usage_satisfies(ku.value, wanted) {
                rc.fail(pctx, 0, TrustStatus::InvalidKeyUsage)?;
            }
        }
    }
    Ok(())
}

/// Each requested bit must be asserted, except that keyAgreement stands in for either
/// encipherment bit.
fn key_usage_satisfies(asserted: FlagSet<KeyUsages>, wanted: FlagSet<KeyUsages>) -> bool {
    wanted.into_iter().all(|bit| {
        asserted.contains(bit)
            || (matches!(bit, KeyUsages::KeyEncipherment | KeyUsages::DataEncipherment)
                && asserted.contains(KeyUsages::KeyAgreement))
    })
}

pub(crate) fn check_ichat(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    let leaf = rc.leaf()?;
    if let Some(handle) = ctx.settings().get_email_address() {
        let handle = handle.split('@').next().unwrap_or_default();
        let found = certificate_email_addresses(leaf).iter().any(|addr| {
            match addr.rsplit_once('@') {
                Some((local, domain)) => {
                    local == handle
                        && ICHAT_DOMAINS.iter().any(|d| domain.eq_ignore_ascii_case(d))
                }
                None => false,
            }
        });
        if !found {
            rc.fail(pctx, 0, TrustStatus::EmailAddressMismatch)?;
        }
    }

    rc.require_eku(
        pctx,
        0,
        &[
            APPLE_EKU_ICHAT_SIGNING,
            APPLE_EKU_ICHAT_ENCRYPTION,
            ID_KP_EMAIL_PROTECTION,
        ],
        true,
    )
}

/// Returns the rfc822Name values from subjectAltName followed by the emailAddress values from the
/// subject. The subject is not consulted when it is empty.
fn certificate_email_addresses(cert: &CertificateItem) -> Vec<String> {
    let mut retval: Vec<String> = cert
        .subject_alt_names()
        .unwrap_or(&[])
        .iter()
        .filter_map(|gn| match gn {
            GeneralName::Rfc822Name(addr) => Some(addr.to_string()),
            _ => None,
        })
        .collect();
    if !cert.has_empty_subject_name() {
        retval.extend(get_email_addresses(cert.subject()));
    }
    retval
}

/// Returns true if the certificate carries the given email address.
///
/// The local part is compared exactly and the domain without regard to case. A certificate value
/// that has no local part matches any address in its domain.
pub fn match_email_address(cert: &CertificateItem, address: &str) -> bool {
    let (want_local, want_domain) = match address.rsplit_once('@') {
        Some(parts) => parts,
        None => return false,
    };
    certificate_email_addresses(cert)
        .iter()
        .any(|candidate| match candidate.rsplit_once('@') {
            Some((local, domain)) => {
                local == want_local && domain.eq_ignore_ascii_case(want_domain)
            }
            None => candidate.eq_ignore_ascii_case(want_domain),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_agreement_stands_in_for_encipherment() {
        let asserted = KeyUsages::KeyAgreement | KeyUsages::DigitalSignature;
        assert!(key_usage_satisfies(asserted, KeyUsages::KeyEncipherment.into()));
        assert!(key_usage_satisfies(
            asserted,
            KeyUsages::DigitalSignature | KeyUsages::DataEncipherment
        ));
        assert!(!key_usage_satisfies(asserted, KeyUsages::NonRepudiation.into()));
        assert!(key_usage_satisfies(asserted, FlagSet::default()));
    }
}
