//! Enforcement of nameConstraints for directoryName, dNSName and rfc822Name forms

use x509_cert::ext::pkix::constraints::name::GeneralSubtrees;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::NameConstraints;
use x509_cert::name::{Name, RdnSequence};

use crate::util::tp_utilities::{compare_names, get_email_addresses};
use crate::validator::cert_item::CertificateItem;

/// `descended_from_dn` returns true if the RDNs of `subtree` are a prefix of the RDNs of `name`.
pub(crate) fn descended_from_dn(subtree: &Name, name: &Name) -> bool {
    if subtree.0.len() > name.0.len() {
        return false;
    }
    let prefix = RdnSequence(name.0[..subtree.0.len()].to_vec());
    compare_names(subtree, &prefix)
}

/// `descended_from_host` returns true if `cand` equals `base` or is a subdomain of it. A base that
/// begins with a period matches subdomains only.
pub(crate) fn descended_from_host(base: &str, cand: &str) -> bool {
    let base = base.to_lowercase();
    let cand = cand.to_lowercase();
    if let Some(stripped) = base.strip_prefix('.') {
        return cand.ends_with(&format!(".{}", stripped));
    }
    cand == base || cand.ends_with(&format!(".{}", base))
}

/// `descended_from_rfc822` returns true if the address `cand` is within the rfc822Name constraint
/// `base`, which may be a mailbox, a host or a domain beginning with a period.
pub(crate) fn descended_from_rfc822(base: &str, cand: &str) -> bool {
    if base.contains('@') {
        return match (base.rsplit_once('@'), cand.rsplit_once('@')) {
            (Some((bl, bd)), Some((cl, cd))) => bl == cl && bd.eq_ignore_ascii_case(cd),
            _ => false,
        };
    }
    let domain = match cand.rsplit_once('@') {
        Some((_, d)) => d,
        None => cand,
    };
    if base.starts_with('.') {
        domain.to_lowercase().ends_with(&base.to_lowercase())
    } else {
        domain.eq_ignore_ascii_case(base)
    }
}

enum Constrained<'a> {
    Dn(&'a Name),
    Dns(&'a str),
    Rfc822(String),
}

fn within(subtree: &GeneralName, name: &Constrained<'_>) -> Option<bool> {
    match (subtree, name) {
        (GeneralName::DirectoryName(base), Constrained::Dn(n)) => Some(descended_from_dn(base, n)),
        (GeneralName::DnsName(base), Constrained::Dns(n)) => {
            Some(descended_from_host(base.as_str(), n))
        }
        (GeneralName::Rfc822Name(base), Constrained::Rfc822(n)) => {
            Some(descended_from_rfc822(base.as_str(), n))
        }
        _ => None,
    }
}

fn permitted(subtrees: &Option<GeneralSubtrees>, name: &Constrained<'_>) -> bool {
    let subtrees = match subtrees {
        Some(s) => s,
        None => return true,
    };
    let mut same_form = false;
    for st in subtrees {
        match within(&st.base, name) {
            Some(true) => return true,
            Some(false) => same_form = true,
            None => {}
        }
    }
    // no subtree of this form means the form is unconstrained
    !same_form
}

fn excluded(subtrees: &Option<GeneralSubtrees>, name: &Constrained<'_>) -> bool {
    match subtrees {
        Some(s) => s.iter().any(|st| within(&st.base, name) == Some(true)),
        None => false,
    }
}

/// `satisfies_name_constraints` returns true if the subject name, subject email addresses and
/// subjectAltName entries of `cert` are within the permitted subtrees and outside the excluded
/// subtrees of `nc`. Name forms other than directoryName, dNSName and rfc822Name are not evaluated.
pub fn satisfies_name_constraints(nc: &NameConstraints, cert: &CertificateItem) -> bool {
    let mut names = vec![];
    if !cert.has_empty_subject_name() {
        names.push(Constrained::Dn(cert.subject()));
    }
    for email in get_email_addresses(cert.subject()) {
        names.push(Constrained::Rfc822(email));
    }
    if let Some(san) = cert.subject_alt_names() {
        for gn in san {
            match gn {
                GeneralName::DirectoryName(dn) => names.push(Constrained::Dn(dn)),
                GeneralName::DnsName(dns) => names.push(Constrained::Dns(dns.as_str())),
                GeneralName::Rfc822Name(rfc822) => {
                    names.push(Constrained::Rfc822(rfc822.to_string()))
                }
                _ => {}
            }
        }
    }

    names.iter().all(|name| {
        permitted(&nc.permitted_subtrees, name) && !excluded(&nc.excluded_subtrees, name)
    })
}

#[test]
fn host_and_rfc822_descent() {
    assert!(descended_from_host("example.com", "example.com"));
    assert!(descended_from_host("example.com", "www.EXAMPLE.com"));
    assert!(!descended_from_host("example.com", "badexample.com"));
    assert!(!descended_from_host(".example.com", "example.com"));
    assert!(descended_from_host(".example.com", "a.b.example.com"));

    assert!(descended_from_rfc822("example.com", "user@EXAMPLE.com"));
    assert!(!descended_from_rfc822("example.com", "user@mail.example.com"));
    assert!(descended_from_rfc822(".example.com", "user@mail.example.com"));
    assert!(descended_from_rfc822("user@example.com", "user@example.com"));
    assert!(!descended_from_rfc822("user@example.com", "User@example.com"));
}

#[test]
fn dn_descent() {
    use std::str::FromStr;
    let base = Name::from_str("O=Example,C=US").unwrap();
    let sub = Name::from_str("CN=Leaf,O=Example,C=US").unwrap();
    let other = Name::from_str("CN=Leaf,O=Other,C=US").unwrap();
    assert!(descended_from_dn(&base, &sub));
    assert!(!descended_from_dn(&base, &other));
    assert!(!descended_from_dn(&sub, &base));
}
