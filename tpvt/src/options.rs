//! Processing of TPVT options: preparation of the environment, anchors and settings followed by
//! verification of the chain and display of results.

use std::path::Path;
use std::str::FromStr;

use log::{debug, error, info};

use trustval::*;

use crate::args::TpvtArgs;

/// Outcome of running TPVT, mapped to the process exit code
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Settings were generated or the chain satisfied the policy
    Success,
    /// The chain did not satisfy the policy
    Rejected,
    /// The inputs could not be processed
    Failed,
}

impl Outcome {
    /// Returns the process exit code for the outcome
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::Rejected => 1,
            Outcome::Failed => 2,
        }
    }
}

/// `prepare_settings` reads the settings file, if any, and applies the options given on the
/// command line on top of it.
fn prepare_settings(args: &TpvtArgs) -> Result<PolicySettings> {
    let mut settings = read_settings(&args.settings)?;
    if let Some(toi) = args.time_of_interest {
        settings.set_time_of_interest(toi);
    }
    if let Some(hostname) = &args.hostname {
        settings.set_hostname(hostname.clone());
    }
    if let Some(email) = &args.email {
        settings.set_email_address(email.clone());
    }
    if args.check_revocation {
        settings.set_check_revocation(true);
    }
    Ok(settings)
}

fn generate_settings(settings: &PolicySettings, path: &str) -> Result<()> {
    let json = match serde_json::to_string_pretty(settings) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize settings: {}", e);
            return Err(Error::ParseError);
        }
    };
    std::fs::write(path, json)?;
    Ok(())
}

fn load_chain(files: &[String]) -> Result<CertificateChain<'static>> {
    let mut chain = CertificateChain::default();
    for f in files {
        let buf = get_file_as_byte_vec_pem(Path::new(f))?;
        match CertificateItem::from_der_with_locator(&buf, f) {
            Ok(cert) => chain.push_owned(cert),
            Err(e) => {
                error!("Failed to parse certificate from {}: {}", f, e);
                return Err(e);
            }
        }
    }
    Ok(chain)
}

fn load_crls(files: &[String]) -> Result<CrlSet<'static>> {
    let mut crls = CrlSet::default();
    for f in files {
        let buf = get_file_as_byte_vec_pem(Path::new(f))?;
        match CrlItem::from_der_with_locator(&buf, f) {
            Ok(crl) => crls.push_owned(crl),
            Err(e) => {
                error!("Failed to parse CRL from {}: {}", f, e);
                return Err(e);
            }
        }
    }
    Ok(crls)
}

fn prepare_anchors(args: &TpvtArgs) -> Result<TaSource> {
    let mut anchors = TaSource::new();
    if let Some(folder) = &args.ta_folder {
        anchors.load_folder(folder, false)?;
    }
    if let Some(folder) = &args.user_ta_folder {
        anchors.load_folder(folder, true)?;
    }
    anchors.log_tas();
    Ok(anchors)
}

fn prepare_environment(args: &TpvtArgs) -> Result<PkiEnvironment> {
    let mut pe = PkiEnvironment::new();
    populate_default_pki_environment(&mut pe);
    if let Some(folder) = &args.cert_folder {
        let mut certs = CertSource::new();
        certs.load_folder(folder)?;
        pe.add_certificate_source(Box::new(certs));
    }
    if let Some(folder) = &args.crl_folder {
        let mut crls = CrlSourceMemory::new();
        crls.load_folder(folder)?;
        pe.add_crl_source(Box::new(crls));
    }
    Ok(pe)
}

fn display_results(policy: TrustPolicy, results: &PolicyResults) {
    println!("Policy: {}", policy);
    match results.get_validation_status() {
        Some(status) => println!("Status: {}", status),
        None => println!("Status: unknown"),
    }
    println!("Verified to root: {}", results.get_verified_to_root());
    if results.get_verified_via_user_trust() {
        println!("Verified via user trust: true");
    }
    println!("Allowlisted: {}", results.get_allowlisted());
    println!("Chain length: {}", results.get_chain_length());
    for (i, statuses) in results.get_certificate_statuses().iter().enumerate() {
        if !statuses.is_empty() {
            let s: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
            println!("Certificate {}: {}", i, s.join(", "));
        }
    }
    let tolerated = results.get_tolerated_statuses();
    if !tolerated.is_empty() {
        let s: Vec<String> = tolerated.iter().map(|s| s.to_string()).collect();
        println!("Tolerated: {}", s.join(", "));
    }
    let crls = results.get_crls_used();
    if !crls.is_empty() {
        println!("CRLs used: {}", crls.len());
    }
}

fn verify(args: &TpvtArgs, settings: &PolicySettings) -> Result<Outcome> {
    let policy = match TrustPolicy::from_str(&args.policy) {
        Ok(p) => p,
        Err(e) => {
            let names: Vec<String> = TRUST_POLICIES.iter().map(|p| p.to_string()).collect();
            println!(
                "ERROR: unrecognized policy {}. Expected one of: {}",
                args.policy,
                names.join(", ")
            );
            return Err(e);
        }
    };

    if args.chain.is_empty() {
        println!("ERROR: no chain was provided. Use --chain to name certificate files, leaf first.");
        return Ok(Outcome::Failed);
    }

    let pe = prepare_environment(args)?;
    let anchors = prepare_anchors(args)?;
    let chain = load_chain(&args.chain)?;
    let crls = load_crls(&args.crls)?;
    let allowlist = match &args.allowlist {
        Some(f) => Allowlist::from_file(f)?,
        None => bundled_allowlist().clone(),
    };
    debug!("Allow-list version {} with {} entries", allowlist.version(), allowlist.len());

    // certificates from the chain may sign CRLs
    let pool: Vec<CertificateItem> = chain.iter().cloned().collect();
    let cache = RevocationCache::new();
    let ctx = VerifyContext::new(&pe, &anchors, policy, settings)
        .with_signer_pool(&pool)
        .with_revocation_cache(&cache)
        .with_allowlist(&allowlist);

    let mut results = PolicyResults::new();
    let r = verify_chain(&ctx, &chain, &crls, &mut results);
    display_results(policy, &results);
    match r {
        Ok(()) => Ok(Outcome::Success),
        Err(Error::Trust(status)) => {
            info!("Chain does not satisfy {} policy: {}", policy, status);
            Ok(Outcome::Rejected)
        }
        Err(e) => Err(e),
    }
}

/// `options` carries out the action indicated by the command line arguments.
pub fn options(args: &TpvtArgs) -> Outcome {
    let settings = match prepare_settings(args) {
        Ok(s) => s,
        Err(e) => {
            println!("ERROR: failed to prepare settings: {}", e);
            return Outcome::Failed;
        }
    };

    if let Some(path) = &args.generate_settings {
        return match generate_settings(&settings, path) {
            Ok(()) => {
                println!("Wrote settings to {}", path);
                Outcome::Success
            }
            Err(e) => {
                println!("ERROR: failed to write settings to {}: {}", path, e);
                Outcome::Failed
            }
        };
    }

    match verify(args, &settings) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!("ERROR: {}", e);
            Outcome::Failed
        }
    }
}

#[test]
fn outcome_exit_codes() {
    assert_eq!(0, Outcome::Success.exit_code());
    assert_eq!(1, Outcome::Rejected.exit_code());
    assert_eq!(2, Outcome::Failed.exit_code());
}

#[test]
fn command_line_overrides_settings() {
    let args = TpvtArgs {
        hostname: Some("www.example.com".to_string()),
        time_of_interest: Some(1_800_000_000),
        check_revocation: true,
        ..Default::default()
    };
    let settings = prepare_settings(&args).unwrap();
    assert_eq!(Some("www.example.com".to_string()), settings.get_hostname());
    assert_eq!(1_800_000_000, settings.get_time_of_interest());
    assert!(settings.get_check_revocation());
    assert_eq!(None, settings.get_email_address());
}
