//! Arguments for the TPVT utility

use clap::Parser;

/// Trust Policy Verification Tool (TPVT)
#[derive(Parser, Debug, Default)]
#[command(arg_required_else_help(true))]
#[clap(author, version, about, long_about = None)]
pub struct TpvtArgs {
    /// Full path of folder containing binary DER-encoded or PEM-encoded trust anchors. These are
    /// treated as system trust.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub ta_folder: Option<String>,

    /// Full path of folder containing trust anchors that are treated as user trust.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub user_ta_folder: Option<String>,

    /// Full path of folder containing intermediate CA certificates used to extend chains and to
    /// find CRL signers.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub cert_folder: Option<String>,

    /// Full path of folder containing CRLs (files with .crl extension) consulted when revocation
    /// checking is enabled.
    #[clap(long, help_heading = "COMMON OPTIONS")]
    pub crl_folder: Option<String>,

    /// Full path and filename of YAML-formatted configuration file for log4rs logging mechanism.
    /// See <https://docs.rs/log4rs/latest/log4rs/> for details.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub logging_config: Option<String>,

    /// Full path and filename of JSON-formatted trust policy settings.
    #[clap(short, long, help_heading = "COMMON OPTIONS")]
    pub settings: Option<String>,

    /// Certificate files that make up the chain to verify, leaf first. The chain may be partial.
    #[clap(long, num_args = 1.., help_heading = "VERIFICATION")]
    pub chain: Vec<String>,

    /// CRL files supplied alongside the chain.
    #[clap(long, num_args = 1.., help_heading = "VERIFICATION")]
    pub crls: Vec<String>,

    /// Name of the trust policy to apply, e.g., x509-basic, ssl, smime or code-signing.
    #[clap(short, long, default_value = "x509-basic", help_heading = "VERIFICATION")]
    pub policy: String,

    /// Host name the leaf certificate must match (ssl, eap and ipsec policies).
    #[clap(long, help_heading = "VERIFICATION")]
    pub hostname: Option<String>,

    /// Email address the leaf certificate must match (smime policy), or the iChat handle.
    #[clap(short, long, help_heading = "VERIFICATION")]
    pub email: Option<String>,

    /// Time to use for verification expressed as the number of seconds since Unix epoch (defaults
    /// to the value from the settings file or the current system time).
    #[clap(short = 'i', long, help_heading = "VERIFICATION")]
    pub time_of_interest: Option<u64>,

    /// Flag that indicates CRL-based revocation checking should be performed.
    #[clap(short = 'r', long, help_heading = "VERIFICATION")]
    pub check_revocation: bool,

    /// Full path and filename of a JSON-formatted allow-list to use instead of the bundled table.
    #[clap(short, long, help_heading = "VERIFICATION")]
    pub allowlist: Option<String>,

    /// Full path and filename to receive JSON-formatted settings reflecting the settings file (if
    /// any) and the options given on the command line. No verification is performed.
    #[clap(short, long, help_heading = "SETTINGS")]
    pub generate_settings: Option<String>,
}
