mod common;

use common::*;
use const_oid::db::rfc5280::{
    ID_KP_CLIENT_AUTH, ID_KP_CODE_SIGNING, ID_KP_EMAIL_PROTECTION, ID_KP_SERVER_AUTH,
    ID_KP_TIME_STAMPING,
};
use der::asn1::OctetString;
use x509_cert::ext::pkix::KeyUsages;
use x509_cert::ext::Extension;

use trustval::*;

fn verify_with(
    pe: &PkiEnvironment,
    policy: TrustPolicy,
    settings: &PolicySettings,
    tas: &TaSource,
    chain: &CertificateChain<'_>,
) -> (Result<()>, PolicyResults) {
    let ctx = VerifyContext::new(pe, tas, policy, settings);
    let mut results = PolicyResults::new();
    let r = verify_chain(&ctx, chain, &CrlSet::default(), &mut results);
    (r, results)
}

fn verify(
    policy: TrustPolicy,
    settings: &PolicySettings,
    tas: &TaSource,
    chain: &CertificateChain<'_>,
) -> (Result<()>, PolicyResults) {
    verify_with(&test_environment(), policy, settings, tas, chain)
}

fn trust(status: TrustStatus) -> Result<()> {
    Err(Error::Trust(status))
}

#[test]
fn well_formed_chain_passes_basic_policy() {
    let (root, ca, leaf) = three_tier();
    let (r, results) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(Ok(()), r);
    assert_eq!(Some(TrustStatus::Valid), results.get_validation_status());
    assert!(results.get_verified_to_root());
    assert!(!results.get_verified_via_user_trust());
    assert!(!results.get_allowlisted());
    assert_eq!(3, results.get_chain_length());
    assert!(results.get_tolerated_statuses().is_empty());
}

#[test]
fn anchor_is_appended() {
    let (root, ca, leaf) = three_tier();
    let mut tas = TaSource::new();
    tas.add(root.build(), true);
    let (r, results) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca]),
    );
    assert_eq!(Ok(()), r);
    assert_eq!(3, results.get_chain_length());
    assert!(results.get_verified_via_user_trust());
}

#[test]
fn chain_is_extended_from_store() {
    let (root, ca, leaf) = three_tier();
    let mut pe = test_environment();
    let mut store = CertSource::new();
    store.add(&ca.build());
    pe.add_certificate_source(Box::new(store));

    let (r, results) = verify_with(
        &pe,
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf]),
    );
    assert_eq!(Ok(()), r);
    assert_eq!(3, results.get_chain_length());
}

#[test]
fn chain_is_extended_from_signer_pool() {
    let (root, ca, leaf) = three_tier();
    let pe = test_environment();
    let tas = anchors(&[&root]);
    let pool = vec![ca.build()];
    let ctx =
        VerifyContext::new(&pe, &tas, TrustPolicy::X509Basic, &test_settings()).with_signer_pool(&pool);
    let mut results = PolicyResults::new();
    assert_eq!(
        Ok(()),
        verify_chain(&ctx, &chain(&[&leaf]), &CrlSet::default(), &mut results)
    );
    assert_eq!(3, results.get_chain_length());
}

#[test]
fn unavailable_store_is_an_error() {
    let (root, _ca, leaf) = three_tier();
    let mut pe = test_environment();
    pe.add_certificate_source(Box::new(UnavailableSource));
    let (r, results) = verify_with(
        &pe,
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf]),
    );
    assert_eq!(Err(Error::StoreUnavailable), r);
    assert_eq!(
        Some(TrustStatus::InternalError),
        results.get_validation_status()
    );
}

#[test]
fn empty_chain() {
    let (root, _, _) = three_tier();
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &CertificateChain::default(),
    );
    assert_eq!(trust(TrustStatus::BadChainLength), r);
}

#[test]
fn unknown_critical_extension() {
    let (root, ca, leaf) = three_tier();
    let leaf = leaf.with_ext(Extension {
        extn_id: UNKNOWN_EXT,
        critical: true,
        extn_value: OctetString::new(vec![0x05, 0x00]).unwrap(),
    });
    let tas = anchors(&[&root]);
    let c = chain(&[&leaf, &ca, &root]);

    let (r, results) = verify(TrustPolicy::X509Basic, &test_settings(), &tas, &c);
    assert_eq!(trust(TrustStatus::UnknownCriticalExtension), r);
    assert!(results.get_certificate_statuses()[0].contains(&TrustStatus::UnknownCriticalExtension));

    let mut settings = test_settings();
    let mut tolerated = TrustStatuses::new();
    tolerated.insert(TrustStatus::UnknownCriticalExtension);
    settings.set_tolerated_statuses(tolerated);
    let (r, results) = verify(TrustPolicy::X509Basic, &settings, &tas, &c);
    assert_eq!(Ok(()), r);
    assert!(results
        .get_tolerated_statuses()
        .contains(&TrustStatus::UnknownCriticalExtension));
}

#[test]
fn weak_rsa_key_fails_under_every_policy() {
    let (root, ca, leaf) = three_tier();
    let leaf = leaf.with_spki(weak_rsa_spki());
    let tas = anchors(&[&root]);
    let c = chain(&[&leaf, &ca, &root]);

    for policy in TRUST_POLICIES {
        let (r, results) = verify(*policy, &test_settings(), &tas, &c);
        assert!(r.is_err(), "{} accepted a 512-bit key", policy);
        assert!(
            results.get_certificate_statuses()[0].contains(&TrustStatus::WeakKeySize),
            "{} did not report the weak key",
            policy
        );
    }

    let (r, _) = verify(TrustPolicy::X509Basic, &test_settings(), &tas, &c);
    assert_eq!(trust(TrustStatus::WeakKeySize), r);
    let (r, _) = verify(TrustPolicy::Ssl, &test_settings(), &tas, &c);
    assert_eq!(trust(TrustStatus::WeakKeySize), r);
}

#[test]
fn path_length_exceeded() {
    let root = CertSpec::root("CN=Root").with_bc(true, Some(0));
    let ca1 = CertSpec::ca("CN=CA 1", &root);
    let ca2 = CertSpec::ca("CN=CA 2", &ca1);
    let leaf = CertSpec::leaf("CN=Leaf", &ca2);
    let (r, results) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf, &ca2, &ca1, &root]),
    );
    assert_eq!(trust(TrustStatus::PathLengthExceeded), r);
    assert!(results.get_certificate_statuses()[3].contains(&TrustStatus::PathLengthExceeded));

    let root = CertSpec::root("CN=Root").with_bc(true, Some(1));
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf, &ca2, &ca1, &root]),
    );
    assert_eq!(trust(TrustStatus::PathLengthExceeded), r);

    let root = CertSpec::root("CN=Root").with_bc(true, Some(2));
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf, &ca2, &ca1, &root]),
    );
    assert_eq!(Ok(()), r);
}

#[test]
fn basic_constraints() {
    let (root, ca, leaf) = three_tier();
    let tas = anchors(&[&root]);

    let missing = ca.clone().without_ext(const_oid::db::rfc5912::ID_CE_BASIC_CONSTRAINTS);
    let c = chain(&[&leaf, &missing, &root]);
    let (r, _) = verify(TrustPolicy::X509Basic, &test_settings(), &tas, &c);
    assert_eq!(trust(TrustStatus::MissingBasicConstraints), r);

    let mut settings = test_settings();
    settings.set_allow_missing_basic_constraints(true);
    let (r, _) = verify(TrustPolicy::X509Basic, &settings, &tas, &c);
    assert_eq!(Ok(()), r);

    let not_ca = ca.with_bc(false, None);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &not_ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidBasicConstraints), r);
}

#[test]
fn key_identifier_mismatch() {
    let (root, ca, leaf) = three_tier();
    let leaf = leaf.with_ext(ext(
        const_oid::db::rfc5912::ID_CE_AUTHORITY_KEY_IDENTIFIER,
        false,
        &x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(vec![1, 2, 3, 4]).unwrap()),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        },
    ));
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::IdentifierLinkageMismatch), r);
}

#[test]
fn intermediate_without_key_cert_sign() {
    let (root, ca, leaf) = three_tier();
    let ca = ca.with_ku(KeyUsages::DigitalSignature);
    let (r, results) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidKeyUsage), r);
    assert!(results.get_certificate_statuses()[1].contains(&TrustStatus::InvalidKeyUsage));
}

#[test]
fn denylisted_signature_algorithm() {
    let (root, ca, leaf) = three_tier();
    let md5_leaf = leaf.clone().with_sig_alg(PKIXALG_MD5_WITH_RSA_ENCRYPTION);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&md5_leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::UntrustedSignatureAlgorithm), r);

    // self-signature of an anchor is not evaluated
    let md5_root = root.with_sig_alg(PKIXALG_MD5_WITH_RSA_ENCRYPTION);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&md5_root]),
        &chain(&[&leaf, &ca, &md5_root]),
    );
    assert_eq!(Ok(()), r);
}

#[test]
fn empty_subject_requires_critical_san() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);

    let leaf = CertSpec::leaf("", &ca).with_san(vec![dns("www.example.com")], true);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    let leaf = CertSpec::leaf("", &ca).with_san(vec![dns("www.example.com")], false);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidSubjectName), r);
}

#[test]
fn piv_policy_requires_digital_signature() {
    let (root, ca, leaf) = three_tier();
    let leaf = leaf
        .with_policies(&[PIV_AUTHENTICATION_POLICY])
        .with_ku(KeyUsages::KeyEncipherment);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidKeyUsage), r);
}

#[test]
fn name_constraints_enforced() {
    let (root, ca, _) = three_tier();
    let ca = ca.with_permitted_dns("example.com");
    let tas = anchors(&[&root]);

    let inside = CertSpec::leaf("CN=Leaf", &ca).with_san(vec![dns("www.example.com")], false);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&inside, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    let outside = CertSpec::leaf("CN=Leaf", &ca).with_san(vec![dns("www.example.org")], false);
    let (r, results) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&outside, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::NameConstraintsViolation), r);
    assert!(results.get_certificate_statuses()[0].contains(&TrustStatus::NameConstraintsViolation));
}

#[test]
fn validity() {
    let (root, ca, leaf) = three_tier();
    let tas = anchors(&[&root]);

    let expired = leaf.clone().with_validity(NOW - 10 * DAY, NOW - DAY);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&expired, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::CertificateExpired), r);

    let future = leaf.clone().with_validity(NOW + DAY, NOW + 10 * DAY);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&future, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::CertificateNotValidYet), r);

    let old_root = root.with_validity(NOW - 10 * DAY, NOW - DAY);
    let tas = anchors(&[&old_root]);
    let c = chain(&[&leaf, &ca, &old_root]);
    let (r, _) = verify(TrustPolicy::X509Basic, &test_settings(), &tas, &c);
    assert_eq!(trust(TrustStatus::CertificateExpired), r);

    let mut settings = test_settings();
    settings.set_allow_expired_root(true);
    let (r, _) = verify(TrustPolicy::X509Basic, &settings, &tas, &c);
    assert_eq!(Ok(()), r);
}

#[test]
fn linkage_failures() {
    let (root, ca, leaf) = three_tier();
    let tas = anchors(&[&root]);

    let (r, results) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &root]),
    );
    assert_eq!(trust(TrustStatus::NameChainingFailure), r);
    assert!(results.get_certificate_statuses()[0].contains(&TrustStatus::NameChainingFailure));

    let forged = leaf.signed_with(&key_for("CN=Someone Else"));
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &tas,
        &chain(&[&forged, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::SignatureVerificationFailure), r);
}

#[test]
fn anchor_failures() {
    let (root, ca, leaf) = three_tier();

    let (r, results) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &TaSource::new(),
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidAnchor), r);
    assert!(!results.get_verified_to_root());

    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &TaSource::new(),
        &chain(&[&leaf, &ca]),
    );
    assert_eq!(trust(TrustStatus::NotTrusted), r);
}

#[test]
fn key_parameters_inherited_from_issuer() {
    let root = CertSpec::root("CN=EC Root,O=Test").with_ec_key(true);
    let ca = CertSpec::ca("CN=EC CA,O=Test", &root)
        .with_serial(2)
        .with_ec_key(false);
    let leaf = CertSpec::leaf("CN=EC Leaf,O=Test", &ca).with_serial(3);
    let tas = anchors(&[&root]);

    for c in [chain(&[&leaf, &ca, &root]), chain(&[&leaf, &ca])] {
        let (r, results) = verify(TrustPolicy::X509Basic, &test_settings(), &tas, &c);
        assert_eq!(Ok(()), r);
        assert_eq!(3, results.get_chain_length());
    }

    // the CA's key cannot be used to check the leaf until the curve is inherited from the root
    let forged = leaf.signed_with(b"attacker key");
    for c in [chain(&[&forged, &ca, &root]), chain(&[&forged, &ca])] {
        let (r, results) = verify(TrustPolicy::X509Basic, &test_settings(), &tas, &c);
        assert_eq!(trust(TrustStatus::SignatureVerificationFailure), r);
        assert!(results.get_certificate_statuses()[0]
            .contains(&TrustStatus::SignatureVerificationFailure));
    }
}

#[test]
fn key_parameters_unavailable() {
    // the anchor's key lacks parameters and there is nothing above it to inherit from
    let root = CertSpec::root("CN=EC Root,O=Test").with_ec_key(false);
    let leaf = CertSpec::leaf("CN=EC Leaf,O=Test", &root).with_serial(3);
    let (r, _) = verify(
        TrustPolicy::X509Basic,
        &test_settings(),
        &anchors(&[&root]),
        &chain(&[&leaf, &root]),
    );
    assert_eq!(trust(TrustStatus::SignatureVerificationFailure), r);
}

#[test]
fn allowlist_admits_listed_leaf() {
    let (root, ca, leaf) = three_tier();
    let json = format!(
        r#"{{"version": 7, "entries": {{"{}": ["{}"]}}}}"#,
        buffer_to_hex(&root.ski()),
        buffer_to_hex(&leaf.build().sha256_digest())
    );
    let al = Allowlist::from_json(json.as_bytes()).unwrap();
    let pe = test_environment();
    let tas = TaSource::new();
    let c = chain(&[&leaf, &ca]);

    let settings = test_settings();
    let ctx = VerifyContext::new(&pe, &tas, TrustPolicy::X509Basic, &settings).with_allowlist(&al);
    let mut results = PolicyResults::new();
    assert_eq!(Ok(()), verify_chain(&ctx, &c, &CrlSet::default(), &mut results));
    assert!(results.get_allowlisted());
    assert!(!results.get_verified_to_root());

    let mut settings = test_settings();
    settings.set_use_allowlist(false);
    let ctx = VerifyContext::new(&pe, &tas, TrustPolicy::X509Basic, &settings).with_allowlist(&al);
    let mut results = PolicyResults::new();
    assert_eq!(
        trust(TrustStatus::NotTrusted),
        verify_chain(&ctx, &c, &CrlSet::default(), &mut results)
    );
    assert!(!results.get_allowlisted());
}

#[test]
fn allowlist_never_admits_absent_bucket() {
    let (root, ca, leaf) = three_tier();
    let json = format!(
        r#"{{"version": 1, "entries": {{"{}": ["{}"]}}}}"#,
        "0102030405",
        buffer_to_hex(&leaf.build().sha256_digest())
    );
    let al = Allowlist::from_json(json.as_bytes()).unwrap();
    assert!(!al.is_allowed(&chain(&[&leaf, &ca])));
    assert!(!al.is_allowed(&chain(&[&leaf, &ca, &root])));
    assert!(!bundled_allowlist().is_allowed(&chain(&[&leaf, &ca])));
}

#[test]
fn ssl_hostname() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);

    let leaf = CertSpec::leaf("CN=Test Leaf", &ca)
        .with_san(vec![dns("example.com"), ip(&[10, 0, 0, 1])], false)
        .with_eku(&[ID_KP_SERVER_AUTH]);
    let c = chain(&[&leaf, &ca, &root]);

    for (host, expected) in [
        ("EXAMPLE.com", Ok(())),
        ("example.com.", Ok(())),
        ("10.0.0.1", Ok(())),
        ("www.example.com", trust(TrustStatus::HostnameMismatch)),
        ("10.0.0.2", trust(TrustStatus::HostnameMismatch)),
    ] {
        let mut settings = test_settings();
        settings.set_hostname(host.to_string());
        let (r, _) = verify(TrustPolicy::Ssl, &settings, &tas, &c);
        assert_eq!(expected, r, "host {}", host);
    }

    let no_san = CertSpec::leaf("CN=www.example.com", &ca);
    let mut settings = test_settings();
    settings.set_hostname("1.2.3.4".to_string());
    let (r, _) = verify(
        TrustPolicy::Ssl,
        &settings,
        &tas,
        &chain(&[&no_san, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::HostnameMismatch), r);

    settings.set_hostname("WWW.example.com".to_string());
    let (r, _) = verify(
        TrustPolicy::Ssl,
        &settings,
        &tas,
        &chain(&[&no_san, &ca, &root]),
    );
    assert_eq!(Ok(()), r);
}

#[test]
fn ssl_wildcard() {
    let (_, ca, _) = three_tier();
    let leaf = CertSpec::leaf("CN=Test Leaf", &ca).with_san(vec![dns("*.example.com")], false);
    assert!(match_hostname(&leaf.build(), "www.Example.com"));
    assert!(!match_hostname(&leaf.build(), "a.b.example.com"));
    assert!(!match_hostname(&leaf.build(), "example.com"));

    // common name is not consulted when a dNSName is present
    let leaf = CertSpec::leaf("CN=www.example.org", &ca).with_san(vec![dns("example.com")], false);
    assert!(!match_hostname(&leaf.build(), "www.example.org"));
}

#[test]
fn ssl_extended_key_usage() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);
    let client = CertSpec::leaf("CN=Client", &ca).with_eku(&[ID_KP_CLIENT_AUTH]);
    let c = chain(&[&client, &ca, &root]);

    let (r, _) = verify(TrustPolicy::Ssl, &test_settings(), &tas, &c);
    assert_eq!(trust(TrustStatus::InvalidExtendedKeyUsage), r);

    let mut settings = test_settings();
    settings.set_ssl_client(true);
    let (r, _) = verify(TrustPolicy::Ssl, &settings, &tas, &c);
    assert_eq!(Ok(()), r);

    let sgc = CertSpec::leaf("CN=Server", &ca).with_eku(&[NETSCAPE_SGC]);
    let (r, _) = verify(
        TrustPolicy::Eap,
        &test_settings(),
        &tas,
        &chain(&[&sgc, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    let signing_only = CertSpec::leaf("CN=Server", &ca).with_ku(KeyUsages::NonRepudiation);
    let (r, _) = verify(
        TrustPolicy::Ssl,
        &test_settings(),
        &tas,
        &chain(&[&signing_only, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidKeyUsage), r);
}

#[test]
fn ssl_pinned_domain() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);
    let leaf = CertSpec::leaf("CN=Leaf", &ca).with_san(vec![dns("mail.example.com")], false);
    let c = chain(&[&leaf, &ca, &root]);

    let mut settings = test_settings();
    settings.set_hostname("mail.example.com".to_string());
    settings.set_pinned_domains(vec!["example.com".to_string()]);
    let (r, _) = verify(TrustPolicy::Ssl, &settings, &tas, &c);
    assert_eq!(trust(TrustStatus::InvalidAnchor), r);

    settings.set_pinned_anchors(vec![buffer_to_hex(&root.build().sha1_digest())]);
    let (r, _) = verify(TrustPolicy::Ssl, &settings, &tas, &c);
    assert_eq!(Ok(()), r);

    let mut settings = test_settings();
    settings.set_hostname("mail.example.com".to_string());
    settings.set_pinned_domains(vec!["example.org".to_string()]);
    let (r, _) = verify(TrustPolicy::Ssl, &settings, &tas, &c);
    assert_eq!(Ok(()), r);
}

#[test]
fn ipsec() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);
    let leaf = CertSpec::leaf("CN=Gateway", &ca).with_eku(&[ID_KP_IPSEC_IKE]);
    let (r, _) = verify(
        TrustPolicy::IpSec,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    let leaf = CertSpec::leaf("CN=Gateway", &ca).with_eku(&[ID_KP_CODE_SIGNING]);
    let (r, _) = verify(
        TrustPolicy::IpSec,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidExtendedKeyUsage), r);
}

#[test]
fn smime() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);
    let leaf = CertSpec::leaf("CN=Alice", &ca)
        .with_san(vec![email("alice@Example.com")], false)
        .with_eku(&[ID_KP_EMAIL_PROTECTION])
        .with_ku(KeyUsages::DigitalSignature | KeyUsages::KeyAgreement);
    let c = chain(&[&leaf, &ca, &root]);

    let mut settings = test_settings();
    settings.set_email_address("alice@example.com".to_string());
    settings.set_smime_key_usage(KeyUsages::KeyEncipherment.into());
    let (r, _) = verify(TrustPolicy::SMime, &settings, &tas, &c);
    assert_eq!(Ok(()), r);

    settings.set_smime_key_usage(KeyUsages::NonRepudiation.into());
    let (r, _) = verify(TrustPolicy::SMime, &settings, &tas, &c);
    assert_eq!(trust(TrustStatus::InvalidKeyUsage), r);

    let mut settings = test_settings();
    settings.set_email_address("Alice@example.com".to_string());
    let (r, _) = verify(TrustPolicy::SMime, &settings, &tas, &c);
    assert_eq!(trust(TrustStatus::EmailAddressMismatch), r);

    let domain_only = CertSpec::leaf("CN=Example", &ca).with_san(vec![email("example.com")], false);
    assert!(match_email_address(&domain_only.build(), "bob@EXAMPLE.com"));
    assert!(!match_email_address(&domain_only.build(), "bob@example.org"));
}

#[test]
fn ichat() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);
    let leaf = CertSpec::leaf("CN=Handle", &ca)
        .with_san(vec![email("jappleseed@mac.com")], false)
        .with_eku(&[APPLE_EKU_ICHAT_SIGNING]);
    let c = chain(&[&leaf, &ca, &root]);

    let mut settings = test_settings();
    settings.set_email_address("jappleseed".to_string());
    let (r, _) = verify(TrustPolicy::IChat, &settings, &tas, &c);
    assert_eq!(Ok(()), r);

    settings.set_email_address("someone".to_string());
    let (r, _) = verify(TrustPolicy::IChat, &settings, &tas, &c);
    assert_eq!(trust(TrustStatus::EmailAddressMismatch), r);

    let no_eku = CertSpec::leaf("CN=Handle", &ca).with_san(vec![email("jappleseed@me.com")], false);
    settings.set_email_address("jappleseed".to_string());
    let (r, _) = verify(
        TrustPolicy::IChat,
        &settings,
        &tas,
        &chain(&[&no_eku, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::MissingRequiredExtension), r);
}

#[test]
fn code_and_package_signing() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);
    let leaf = CertSpec::leaf("CN=Developer", &ca).with_eku(&[ID_KP_CODE_SIGNING]);

    let (r, _) = verify(
        TrustPolicy::CodeSigning,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    // root appended from the anchors satisfies the length requirement
    let (r, _) = verify(
        TrustPolicy::PackageSigning,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca]),
    );
    assert_eq!(Ok(()), r);

    let direct = CertSpec::leaf("CN=Developer", &root).with_eku(&[ID_KP_CODE_SIGNING]);
    let (r, _) = verify(
        TrustPolicy::PackageSigning,
        &test_settings(),
        &tas,
        &chain(&[&direct, &root]),
    );
    assert_eq!(trust(TrustStatus::BadChainLength), r);

    let dev_id = leaf.clone().with_marker(APPLE_EXT_DEVELOPER_ID_LEAF);
    let (r, _) = verify(
        TrustPolicy::PackageSigning,
        &test_settings(),
        &tas,
        &chain(&[&dev_id, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::MissingRequiredExtension), r);

    let dev_ca = ca.clone().with_marker(APPLE_EXT_DEVELOPER_ID_INTERMEDIATE);
    let (r, _) = verify(
        TrustPolicy::PackageSigning,
        &test_settings(),
        &tas,
        &chain(&[&dev_id, &dev_ca, &root]),
    );
    assert_eq!(Ok(()), r);
}

#[test]
fn sw_update_signing() {
    let root = CertSpec::root("CN=Update Root");
    let ca = CertSpec::ca("CN=Update CA", &root)
        .with_bc(true, Some(0))
        .with_eku(&[ID_KP_CODE_SIGNING]);
    let leaf = CertSpec::leaf("CN=Update Signer", &ca).with_eku(&[ID_KP_CODE_SIGNING]);
    let tas = anchors(&[&root]);

    let (r, _) = verify(
        TrustPolicy::SwUpdateSigning,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    let dev = CertSpec::leaf("CN=Update Signer", &ca).with_eku(&[APPLE_EKU_CODE_SIGNING_DEV]);
    let c = chain(&[&dev, &ca, &root]);
    let (r, results) = verify(TrustPolicy::SwUpdateSigning, &test_settings(), &tas, &c);
    assert_eq!(trust(TrustStatus::CodeSignDevelopment), r);
    assert!(results.get_certificate_statuses()[0].contains(&TrustStatus::CodeSignDevelopment));

    let mut settings = test_settings();
    let mut tolerated = TrustStatuses::new();
    tolerated.insert(TrustStatus::CodeSignDevelopment);
    settings.set_tolerated_statuses(tolerated);
    let (r, results) = verify(TrustPolicy::SwUpdateSigning, &settings, &tas, &c);
    assert_eq!(Ok(()), r);
    assert!(results
        .get_tolerated_statuses()
        .contains(&TrustStatus::CodeSignDevelopment));

    let plain_ca = CertSpec::ca("CN=Update CA", &root).with_bc(true, Some(0));
    let (r, _) = verify(
        TrustPolicy::SwUpdateSigning,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &plain_ca, &root]),
    );
    assert_eq!(trust(TrustStatus::MissingRequiredExtension), r);
}

#[test]
fn resource_signing() {
    let (root, ca, _) = three_tier();
    let tas = anchors(&[&root]);
    let leaf = CertSpec::leaf("CN=Resources", &ca).with_eku(&[APPLE_EKU_RESOURCE_SIGNING]);
    let (r, _) = verify(
        TrustPolicy::ResourceSigning,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    let leaf = CertSpec::leaf("CN=Resources", &ca);
    let (r, _) = verify(
        TrustPolicy::ResourceSigning,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::MissingRequiredExtension), r);
}

fn pinned_settings(root: &CertSpec) -> PolicySettings {
    let mut settings = test_settings();
    settings.set_pinned_anchors(vec![buffer_to_hex(&root.build().sha1_digest())]);
    settings
}

#[test]
fn app_store_receipt() {
    let (root, ca, leaf) = three_tier();
    let tas = anchors(&[&root]);
    let ca = ca.with_marker(APPLE_EXT_WWDR_INTERMEDIATE);
    let leaf = leaf.with_marker(APPLE_EXT_APP_STORE_RECEIPT);
    let c = chain(&[&leaf, &ca, &root]);

    let (r, _) = verify(TrustPolicy::AppStoreReceipt, &pinned_settings(&root), &tas, &c);
    assert_eq!(Ok(()), r);

    let (r, _) = verify(TrustPolicy::AppStoreReceipt, &test_settings(), &tas, &c);
    assert_eq!(trust(TrustStatus::InvalidAnchor), r);

    let other = CertSpec::root("CN=Other Root");
    let (r, _) = verify(TrustPolicy::AppStoreReceipt, &pinned_settings(&other), &tas, &c);
    assert_eq!(trust(TrustStatus::InvalidAnchor), r);
}

#[test]
fn mobile_store() {
    let (root, ca, leaf) = three_tier();
    let tas = anchors(&[&root]);
    let store_leaf = leaf
        .clone()
        .with_marker(APPLE_EXT_MOBILE_STORE)
        .with_policies(&[APPLE_MOBILE_STORE_POLICY]);
    let c = chain(&[&store_leaf, &ca, &root]);

    let (r, _) = verify(TrustPolicy::MobileStore, &pinned_settings(&root), &tas, &c);
    assert_eq!(Ok(()), r);

    let (r, _) = verify(TrustPolicy::TestMobileStore, &pinned_settings(&root), &tas, &c);
    assert_eq!(trust(TrustStatus::MissingRequiredExtension), r);

    let no_policy = leaf.with_marker(APPLE_EXT_MOBILE_STORE);
    let (r, _) = verify(
        TrustPolicy::MobileStore,
        &pinned_settings(&root),
        &tas,
        &chain(&[&no_policy, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidPolicyIdentifiers), r);
}

#[test]
fn provisioning_profile_and_passbook() {
    let (root, ca, leaf) = three_tier();
    let tas = anchors(&[&root]);
    let ca = ca.with_marker(APPLE_EXT_WWDR_INTERMEDIATE);

    let profile = leaf.clone().with_marker(APPLE_EXT_PROVISIONING_PROFILE_SIGNING);
    let (r, _) = verify(
        TrustPolicy::ProvisioningProfileSigning,
        &pinned_settings(&root),
        &tas,
        &chain(&[&profile, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    let pass = leaf.clone().with_marker(APPLE_EXT_PASSBOOK_SIGNING);
    let (r, _) = verify(
        TrustPolicy::PassbookSigning,
        &pinned_settings(&root),
        &tas,
        &chain(&[&pass, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::MissingRequiredExtension), r);

    let pass = pass.with_eku(&[APPLE_EKU_PASSBOOK_SIGNING]);
    let (r, _) = verify(
        TrustPolicy::PassbookSigning,
        &pinned_settings(&root),
        &tas,
        &chain(&[&pass, &ca, &root]),
    );
    assert_eq!(Ok(()), r);
}

#[test]
fn escrow_service() {
    let root = CertSpec::root("CN=Escrow Root");
    let leaf = CertSpec::leaf("CN=Escrow", &root)
        .with_marker(APPLE_EXT_ESCROW_SERVICE)
        .with_ku(KeyUsages::KeyEncipherment);
    let tas = anchors(&[&root]);

    for policy in [TrustPolicy::EscrowService, TrustPolicy::PcsEscrowService] {
        let (r, _) = verify(policy, &pinned_settings(&root), &tas, &chain(&[&leaf, &root]));
        assert_eq!(Ok(()), r);
    }

    let signing = leaf.with_ku(KeyUsages::DigitalSignature);
    let (r, _) = verify(
        TrustPolicy::EscrowService,
        &pinned_settings(&root),
        &tas,
        &chain(&[&signing, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidKeyUsage), r);
}

#[test]
fn time_stamping() {
    let (root, ca, leaf) = three_tier();
    let tas = anchors(&[&root]);

    let tsa = leaf
        .clone()
        .with_eku_criticality(&[ID_KP_TIME_STAMPING], true)
        .with_ku(KeyUsages::DigitalSignature);
    let (r, _) = verify(
        TrustPolicy::TimeStamping,
        &test_settings(),
        &tas,
        &chain(&[&tsa, &ca, &root]),
    );
    assert_eq!(Ok(()), r);

    let non_critical = leaf
        .clone()
        .with_eku(&[ID_KP_TIME_STAMPING])
        .with_ku(KeyUsages::DigitalSignature);
    let (r, _) = verify(
        TrustPolicy::TimeStamping,
        &test_settings(),
        &tas,
        &chain(&[&non_critical, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidExtendedKeyUsage), r);

    let extra = leaf
        .with_eku_criticality(&[ID_KP_TIME_STAMPING, ID_KP_SERVER_AUTH], true)
        .with_ku(KeyUsages::DigitalSignature);
    let (r, _) = verify(
        TrustPolicy::TimeStamping,
        &test_settings(),
        &tas,
        &chain(&[&extra, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidExtendedKeyUsage), r);
}

#[test]
fn purpose_policies() {
    use const_oid::db::rfc5280::ID_KP_OCSP_SIGNING;

    let (root, ca, leaf) = three_tier();
    let tas = anchors(&[&root]);

    for (policy, purpose) in [
        (TrustPolicy::OcspSigning, ID_KP_OCSP_SIGNING),
        (TrustPolicy::PkinitClient, ID_PKINIT_KP_CLIENT_AUTH),
        (TrustPolicy::PkinitServer, ID_PKINIT_KP_KDC),
    ] {
        let with = leaf.clone().with_eku(&[purpose]);
        let (r, _) = verify(policy, &test_settings(), &tas, &chain(&[&with, &ca, &root]));
        assert_eq!(Ok(()), r, "{}", policy);

        let (r, _) = verify(policy, &test_settings(), &tas, &chain(&[&leaf, &ca, &root]));
        assert_eq!(trust(TrustStatus::MissingRequiredExtension), r, "{}", policy);
    }

    let (r, _) = verify(
        TrustPolicy::CrlSigner,
        &test_settings(),
        &tas,
        &chain(&[&ca, &root]),
    );
    assert_eq!(Ok(()), r);
    let (r, _) = verify(
        TrustPolicy::CrlSigner,
        &test_settings(),
        &tas,
        &chain(&[&leaf, &ca, &root]),
    );
    assert_eq!(trust(TrustStatus::InvalidKeyUsage), r);
}

#[test]
fn settings_serialize_deserialize() {
    let mut settings = test_settings();
    settings.set_hostname("www.example.com".to_string());
    settings.set_check_revocation(true);
    let mut tolerated = TrustStatuses::new();
    tolerated.insert(TrustStatus::CrlNotFound);
    settings.set_tolerated_statuses(tolerated);
    settings.set_smime_key_usage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
    settings.set_pinned_domains(vec!["example.com".to_string()]);

    let json = serde_json::to_string(&settings).unwrap();
    let de: PolicySettings = serde_json::from_slice(json.as_bytes()).unwrap();
    assert_eq!(settings, de);
    assert_eq!(NOW, de.get_time_of_interest());
}
