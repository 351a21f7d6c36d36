//! Tests that drive the tpvt binary against the certificates and CRLs in tests/data. The objects
//! there were issued on 2026-10-17, so every test fixes the time of interest shortly after.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

const TIME_OF_INTEREST: &str = "1800000000";

fn tpvt() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpvt")?;
    cmd.arg("-i").arg(TIME_OF_INTEREST);
    Ok(cmd)
}

#[test]
fn no_arguments_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("tpvt")?;
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn ssl_chain_extended_from_cert_folder() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--ta-folder").arg("tests/data/ta");
    cmd.arg("--cert-folder").arg("tests/data/certs");
    cmd.arg("--chain").arg("tests/data/ee/leaf.der");
    cmd.arg("--policy").arg("ssl");
    cmd.arg("--hostname").arg("WWW.example.com");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Status: Valid"))
        .stdout(predicate::str::contains("Verified to root: true"))
        .stdout(predicate::str::contains("Chain length: 3"));
    Ok(())
}

#[test]
fn complete_chain_and_user_trust() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--user-ta-folder").arg("tests/data/ta");
    cmd.arg("--chain")
        .arg("tests/data/ee/leaf.der")
        .arg("tests/data/certs/ca.der");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Policy: x509-basic"))
        .stdout(predicate::str::contains("Verified via user trust: true"));
    Ok(())
}

#[test]
fn hostname_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--ta-folder").arg("tests/data/ta");
    cmd.arg("--cert-folder").arg("tests/data/certs");
    cmd.arg("--chain").arg("tests/data/ee/leaf.der");
    cmd.arg("--policy").arg("ssl");
    cmd.arg("--hostname").arg("mail.example.com");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Status: HostnameMismatch"))
        .stdout(predicate::str::contains("Certificate 0: HostnameMismatch"));
    Ok(())
}

#[test]
fn email_mismatch() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--ta-folder").arg("tests/data/ta");
    cmd.arg("--cert-folder").arg("tests/data/certs");
    cmd.arg("--chain").arg("tests/data/ee/leaf.der");
    cmd.arg("--policy").arg("smime");
    cmd.arg("--email").arg("someone@example.com");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Status: EmailAddressMismatch"));
    Ok(())
}

#[test]
fn untrusted_chain() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--cert-folder").arg("tests/data/certs");
    cmd.arg("--chain").arg("tests/data/ee/leaf.der");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Status: NotTrusted"))
        .stdout(predicate::str::contains("Verified to root: false"));
    Ok(())
}

#[test]
fn allowlisted_chain() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--allowlist").arg("tests/data/allowlist.json");
    cmd.arg("--chain")
        .arg("tests/data/ee/leaf.der")
        .arg("tests/data/certs/ca.der");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Allowlisted: true"))
        .stdout(predicate::str::contains("Verified to root: false"));

    // a revoked leaf is not in the table
    let mut cmd = tpvt()?;
    cmd.arg("--allowlist").arg("tests/data/allowlist.json");
    cmd.arg("--chain")
        .arg("tests/data/ee/revoked.der")
        .arg("tests/data/certs/ca.der");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Allowlisted: false"));
    Ok(())
}

#[test]
fn revocation_from_crl_folder() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--ta-folder").arg("tests/data/ta");
    cmd.arg("--cert-folder").arg("tests/data/certs");
    cmd.arg("--crl-folder").arg("tests/data/crls");
    cmd.arg("--check-revocation");
    cmd.arg("--chain").arg("tests/data/ee/revoked.der");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Status: CertificateRevoked"));

    let mut cmd = tpvt()?;
    cmd.arg("--ta-folder").arg("tests/data/ta");
    cmd.arg("--cert-folder").arg("tests/data/certs");
    cmd.arg("--crl-folder").arg("tests/data/crls");
    cmd.arg("--check-revocation");
    cmd.arg("--chain").arg("tests/data/ee/leaf.der");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Status: Valid"))
        .stdout(predicate::str::contains("CRLs used: 1"));
    Ok(())
}

#[test]
fn revocation_from_supplied_crl() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--ta-folder").arg("tests/data/ta");
    cmd.arg("--check-revocation");
    cmd.arg("--chain")
        .arg("tests/data/ee/revoked.der")
        .arg("tests/data/certs/ca.der");
    cmd.arg("--crls").arg("tests/data/crls/ca.crl");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Certificate 0: CertificateRevoked"));
    Ok(())
}

#[test]
fn unrecognized_policy() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--chain").arg("tests/data/ee/leaf.der");
    cmd.arg("--policy").arg("carrier-pigeon");
    cmd.assert()
        .code(2)
        .stdout(predicate::str::contains("unrecognized policy carrier-pigeon"));
    Ok(())
}

#[test]
fn missing_chain_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--chain").arg("tests/data/ee/absent.der");
    cmd.assert().code(2);
    Ok(())
}

#[test]
fn generate_and_use_settings() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let settings = dir.path().join("settings.json");
    let settings = settings.to_str().unwrap_or_default().to_string();

    let mut cmd = tpvt()?;
    cmd.arg("--generate-settings").arg(&settings);
    cmd.arg("--hostname").arg("www.example.com");
    cmd.arg("--check-revocation");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Wrote settings"));

    let json = fs::read_to_string(&settings)?;
    assert!(json.contains("psHostname"));
    assert!(json.contains("www.example.com"));
    assert!(json.contains("psCheckRevocation"));
    assert!(json.contains(TIME_OF_INTEREST));

    // the time of interest comes from the settings file
    let mut cmd = Command::cargo_bin("tpvt")?;
    cmd.arg("--settings").arg(&settings);
    cmd.arg("--ta-folder").arg("tests/data/ta");
    cmd.arg("--cert-folder").arg("tests/data/certs");
    cmd.arg("--crl-folder").arg("tests/data/crls");
    cmd.arg("--chain").arg("tests/data/ee/leaf.der");
    cmd.arg("--policy").arg("ssl");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Status: Valid"));
    Ok(())
}

#[test]
fn bad_logging_config_falls_back_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = tpvt()?;
    cmd.arg("--logging-config").arg("tests/data/absent.yaml");
    cmd.arg("--ta-folder").arg("tests/data/ta");
    cmd.arg("--cert-folder").arg("tests/data/certs");
    cmd.arg("--chain").arg("tests/data/ee/leaf.der");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("failed to configure logging"))
        .stdout(predicate::str::contains("Status: Valid"));
    Ok(())
}
