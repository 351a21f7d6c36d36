//! Rules applied on top of the universal checks for each [`TrustPolicy`]

mod pinned;
mod purpose;
mod signing;
mod smime;
mod ssl;

pub use smime::match_email_address;
pub use ssl::match_hostname;

use der::asn1::ObjectIdentifier;
use log::debug;
use x509_cert::ext::pkix::KeyUsages;

use crate::util::error::*;
use crate::validator::cert_item::CertificateItem;
use crate::validator::chain::CertificateChain;
use crate::validator::extension_info::ExtensionInfo;
use crate::validator::policy_context::PolicyContext;
use crate::validator::policy_settings::TrustPolicy;
use crate::validator::verify_context::VerifyContext;

/// `check_policy` applies the rules of the policy named by `pctx` to a chain that has already been
/// subjected to the universal checks.
pub fn check_policy(
    ctx: &VerifyContext<'_>,
    pctx: &mut PolicyContext,
    chain: &CertificateChain<'_>,
    infos: &[ExtensionInfo],
    verified_to_root: bool,
    via_user_trust: bool,
) -> Result<()> {
    if via_user_trust {
        debug!("Applying {} policy to chain anchored by user trust", pctx.policy);
    }
    let rc = RuleChain::new(chain, infos)?;
    match pctx.policy {
        TrustPolicy::X509Basic => Ok(()),
        TrustPolicy::Ssl | TrustPolicy::Eap => ssl::check_ssl(ctx, pctx, &rc, verified_to_root),
        TrustPolicy::IpSec => ssl::check_ipsec(ctx, pctx, &rc),
        TrustPolicy::SMime => smime::check_smime(ctx, pctx, &rc),
        TrustPolicy::IChat => smime::check_ichat(ctx, pctx, &rc),
        TrustPolicy::CodeSigning => signing::check_code_signing(pctx, &rc),
        TrustPolicy::PackageSigning => signing::check_package_signing(pctx, &rc),
        TrustPolicy::ResourceSigning => signing::check_resource_signing(pctx, &rc),
        TrustPolicy::SwUpdateSigning => signing::check_sw_update_signing(pctx, &rc),
        TrustPolicy::AppStoreReceipt => pinned::check_app_store_receipt(ctx, pctx, &rc),
        TrustPolicy::MobileStore => pinned::check_mobile_store(ctx, pctx, &rc, false),
        TrustPolicy::TestMobileStore => pinned::check_mobile_store(ctx, pctx, &rc, true),
        TrustPolicy::ProvisioningProfileSigning => {
            pinned::check_provisioning_profile(ctx, pctx, &rc)
        }
        TrustPolicy::PassbookSigning => pinned::check_passbook(ctx, pctx, &rc),
        TrustPolicy::EscrowService | TrustPolicy::PcsEscrowService => {
            pinned::check_escrow(ctx, pctx, &rc)
        }
        TrustPolicy::TimeStamping => purpose::check_time_stamping(pctx, &rc),
        TrustPolicy::OcspSigning => purpose::check_ocsp_signing(pctx, &rc),
        TrustPolicy::PkinitClient | TrustPolicy::PkinitServer => purpose::check_pkinit(pctx, &rc),
        TrustPolicy::CrlSigner => purpose::check_crl_signer(pctx, &rc),
    }
}

/// A chain paired with its extension summaries, as seen by the policy rules
pub(crate) struct RuleChain<'c, 'a> {
    pub(crate) chain: &'c CertificateChain<'a>,
    pub(crate) infos: &'c [ExtensionInfo],
}

impl<'c, 'a> RuleChain<'c, 'a> {
    fn new(chain: &'c CertificateChain<'a>, infos: &'c [ExtensionInfo]) -> Result<Self> {
        if chain.is_empty() || chain.len() != infos.len() {
            return Err(Error::Trust(TrustStatus::BadChainLength));
        }
        Ok(RuleChain { chain, infos })
    }

    pub(crate) fn len(&self) -> usize {
        self.chain.len()
    }

    pub(crate) fn leaf(&self) -> Result<&'c CertificateItem> {
        self.cert(0)
    }

    pub(crate) fn leaf_info(&self) -> &'c ExtensionInfo {
        &self.infos[0]
    }

    pub(crate) fn cert(&self, index: usize) -> Result<&'c CertificateItem> {
        self.chain
            .get(index)
            .ok_or(Error::Trust(TrustStatus::BadChainLength))
    }

    pub(crate) fn info(&self, index: usize) -> Option<&'c ExtensionInfo> {
        self.infos.get(index)
    }

    /// Reports a status against the certificate at `index`
    pub(crate) fn fail(
        &self,
        pctx: &mut PolicyContext,
        index: usize,
        status: TrustStatus,
    ) -> Result<()> {
        let cert = self.cert(index)?;
        pctx.check_cert(index, cert, status)
    }

    /// Requires the chain to contain exactly `n` certificates
    pub(crate) fn require_length(&self, pctx: &mut PolicyContext, n: usize) -> Result<()> {
        if self.len() != n {
            debug!("Chain length {} does not equal {}", self.len(), n);
            pctx.check(None, TrustStatus::BadChainLength)?;
        }
        Ok(())
    }

    /// Requires the chain to contain at least `n` certificates
    pub(crate) fn require_min_length(&self, pctx: &mut PolicyContext, n: usize) -> Result<()> {
        if self.len() < n {
            debug!("Chain length {} is less than {}", self.len(), n);
            pctx.check(None, TrustStatus::BadChainLength)?;
        }
        Ok(())
    }

    /// When the certificate at `index` carries extendedKeyUsage, requires one of `purposes`.
    /// When `required` is set, an absent extension fails with `MissingRequiredExtension`.
    pub(crate) fn require_eku(
        &self,
        pctx: &mut PolicyContext,
        index: usize,
        purposes: &[ObjectIdentifier],
        required: bool,
    ) -> Result<()> {
        let info = match self.info(index) {
            Some(info) => info,
            None => return self.fail(pctx, index, TrustStatus::BadChainLength),
        };
        match &info.extended_key_usage {
            Some(_) if info.eku_contains_any(purposes) => Ok(()),
            Some(_) => self.fail(pctx, index, TrustStatus::InvalidExtendedKeyUsage),
            None if required => self.fail(pctx, index, TrustStatus::MissingRequiredExtension),
            None => Ok(()),
        }
    }

    /// When the leaf carries keyUsage, requires at least one of `usages`. When `required` is set,
    /// an absent extension fails with `MissingRequiredExtension`.
    pub(crate) fn require_leaf_key_usage(
        &self,
        pctx: &mut PolicyContext,
        usages: &[KeyUsages],
        required: bool,
    ) -> Result<()> {
        let info = self.leaf_info();
        match &info.key_usage {
            Some(ku) if usages.iter().any(|u| ku.value.contains(*u)) => Ok(()),
            Some(_) => self.fail(pctx, 0, TrustStatus::InvalidKeyUsage),
            None if required => self.fail(pctx, 0, TrustStatus::MissingRequiredExtension),
            None => Ok(()),
        }
    }

    /// Requires a private marker extension on the certificate at `index`
    pub(crate) fn require_marker(
        &self,
        pctx: &mut PolicyContext,
        index: usize,
        present: fn(&ExtensionInfo) -> bool,
    ) -> Result<()> {
        match self.info(index) {
            Some(info) if present(info) => Ok(()),
            Some(_) => self.fail(pctx, index, TrustStatus::MissingRequiredExtension),
            None => pctx.check(None, TrustStatus::BadChainLength),
        }
    }
}
