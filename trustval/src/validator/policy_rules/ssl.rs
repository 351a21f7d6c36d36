//! Host name matching and the SSL, EAP and IPsec rules

use std::net::IpAddr;

use const_oid::db::rfc5280::{ANY_EXTENDED_KEY_USAGE, ID_KP_CLIENT_AUTH, ID_KP_SERVER_AUTH};
use log::debug;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::KeyUsages;

use crate::util::error::*;
use crate::util::tp_oids::{ID_KP_IPSEC_END_SYSTEM, ID_KP_IPSEC_IKE, MICROSOFT_SGC, NETSCAPE_SGC};
use crate::util::tp_utilities::get_common_names;
use crate::validator::cert_item::CertificateItem;
use crate::validator::policy_context::PolicyContext;
use crate::validator::policy_rules::pinned::check_pinned_domains;
use crate::validator::policy_rules::RuleChain;
use crate::validator::verify_context::VerifyContext;

pub(crate) fn check_ssl(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
    verified_to_root: bool,
) -> Result<()> {
    let host = configured_host(ctx);
    if let Some(host) = &host {
        if !match_hostname(rc.leaf()?, host) {
            rc.fail(pctx, 0, TrustStatus::HostnameMismatch)?;
        }
    }

    if ctx.settings().get_ssl_client() {
        rc.require_eku(pctx, 0, &[ID_KP_CLIENT_AUTH, ANY_EXTENDED_KEY_USAGE], false)?;
    } else {
        rc.require_eku(
            pctx,
            0,
            &[
                ID_KP_SERVER_AUTH,
                ANY_EXTENDED_KEY_USAGE,
                NETSCAPE_SGC,
                MICROSOFT_SGC,
            ],
            false,
        )?;
    }

    rc.require_leaf_key_usage(
        pctx,
        &[
            KeyUsages::DigitalSignature,
            KeyUsages::KeyEncipherment,
            KeyUsages::KeyAgreement,
        ],
        false,
    )?;

    if let Some(host) = &host {
        check_pinned_domains(ctx, pctx, rc, host, verified_to_root)?;
    }
    Ok(())
}

pub(crate) fn check_ipsec(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    rc: &RuleChain<'_, '_>,
) -> Result<()> {
    rc.require_eku(
        pctx,
        0,
        &[
            ID_KP_IPSEC_IKE,
            ID_KP_IPSEC_END_SYSTEM,
            ID_KP_SERVER_AUTH,
            ANY_EXTENDED_KEY_USAGE,
        ],
        false,
    )?;
    if let Some(host) = configured_host(ctx) {
        if !match_hostname(rc.leaf()?, &host) {
            rc.fail(pctx, 0, TrustStatus::HostnameMismatch)?;
        }
    }
    Ok(())
}

fn configured_host(ctx: &VerifyContext<'_>) -> Option<String> {
    match ctx.settings().get_hostname() {
        Some(h) if !h.is_empty() => Some(h),
        _ => None,
    }
}

/// Returns true if the certificate identifies the given host.
///
/// A numeric host is compared against iPAddress entries in subjectAltName. Other hosts are compared
/// against dNSName entries, falling back to the common name when the certificate has no dNSName.
pub fn match_hostname(cert: &CertificateItem, host: &str) -> bool {
    let trimmed = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = trimmed.parse::<IpAddr>() {
        let wanted = match ip {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        return cert.subject_alt_names().unwrap_or(&[]).iter().any(|gn| {
            matches!(gn, GeneralName::IpAddress(ip) if ip.as_bytes() == wanted.as_slice())
        });
    }

    let host = normalize_dns_name(host);
    let dns_names: Vec<&str> = cert
        .subject_alt_names()
        .unwrap_or(&[])
        .iter()
        .filter_map(|gn| match gn {
            GeneralName::DnsName(dns) => Some(dns.as_str()),
            _ => None,
        })
        .collect();

    if !dns_names.is_empty() {
        return dns_names.iter().any(|pattern| dns_name_matches(pattern, &host));
    }

    debug!("No dNSName present, comparing {} against common name", host);
    get_common_names(cert.subject())
        .iter()
        .any(|cn| dns_name_matches(cn, &host))
}

fn normalize_dns_name(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Compares a presented name, which may begin with a `*` label, against a normalized host name.
/// The wildcard covers exactly one label and is not honored directly beneath a top-level domain.
fn dns_name_matches(pattern: &str, host: &str) -> bool {
    let pattern = normalize_dns_name(pattern);
    if pattern.is_empty() || host.is_empty() {
        return false;
    }
    match pattern.strip_prefix("*.") {
        Some(base) => {
            if !base.contains('.') {
                return false;
            }
            match host.split_once('.') {
                Some((label, rest)) => !label.is_empty() && rest == base,
                None => false,
            }
        }
        None => pattern == host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matching() {
        assert!(dns_name_matches("*.example.com", "www.example.com"));
        assert!(dns_name_matches("*.EXAMPLE.com", "www.example.com"));
        assert!(!dns_name_matches("*.example.com", "example.com"));
        assert!(!dns_name_matches("*.example.com", "a.b.example.com"));
        assert!(!dns_name_matches("*.com", "example.com"));
        assert!(dns_name_matches("example.com.", "example.com"));
        assert!(!dns_name_matches("", "example.com"));
        assert!(!dns_name_matches("www.*.com", "www.example.com"));
    }
}
