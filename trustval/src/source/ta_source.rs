//! Trust anchor store

use log::{debug, info};
use sha2::{Digest, Sha256};
use x509_cert::name::Name;

use crate::source::file_utils::*;
use crate::util::error::*;
use crate::util::tp_utilities::{buffer_to_hex, compare_names, name_to_string};
use crate::validator::cert_item::CertificateItem;

/// `TrustAnchor` pairs an anchor certificate with a flag indicating whether it was added as user
/// trust, i.e., by the user rather than as part of the system anchor set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustAnchor {
    /// Anchor certificate
    pub cert: CertificateItem,
    /// True if the anchor was added as user trust
    pub user_trust: bool,
}

/// `TaSource` holds the set of trust anchors consulted when resolving a chain. Anchors are
/// identified by their full encoding.
#[derive(Clone, Debug, Default)]
pub struct TaSource {
    anchors: Vec<TrustAnchor>,
}

impl TaSource {
    /// instantiates a new, empty TaSource
    pub fn new() -> TaSource {
        TaSource::default()
    }

    /// `add` adds the given certificate as an anchor. A certificate that is already present is not
    /// added again, though the user trust flag is set if either instance asserts it.
    pub fn add(&mut self, cert: CertificateItem, user_trust: bool) {
        if let Some(existing) = self.anchors.iter_mut().find(|ta| ta.cert == cert) {
            existing.user_trust |= user_trust;
            return;
        }
        self.anchors.push(TrustAnchor { cert, user_trust });
    }

    /// `add_encoded` parses the given buffer and adds it as an anchor.
    pub fn add_encoded(&mut self, enc_cert: &[u8], user_trust: bool) -> Result<()> {
        let cert = CertificateItem::from_der(enc_cert)?;
        self.add(cert, user_trust);
        Ok(())
    }

    /// `load_folder` adds each certificate found in the indicated folder (with a .der, .crt, .cer
    /// or .pem extension) and returns the number of anchors added. Files that cannot be parsed are
    /// skipped.
    pub fn load_folder(&mut self, folder: &str, user_trust: bool) -> Result<usize> {
        let initial = self.anchors.len();
        for path in files_with_extensions(folder, &["der", "crt", "cer", "pem"])? {
            let locator = path.display().to_string();
            let buf = match get_file_as_byte_vec_pem(&path) {
                Ok(b) => b,
                Err(_e) => continue,
            };
            if let Ok(cert) = CertificateItem::from_der_with_locator(&buf, &locator) {
                self.add(cert, user_trust);
            }
        }
        Ok(self.anchors.len() - initial)
    }

    /// Returns the number of anchors
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Returns true if there are no anchors
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Iterates over the anchors
    pub fn iter(&self) -> std::slice::Iter<'_, TrustAnchor> {
        self.anchors.iter()
    }

    /// `find` returns the anchor whose encoding is identical to the given certificate.
    pub fn find(&self, cert: &CertificateItem) -> Option<&TrustAnchor> {
        self.anchors.iter().find(|ta| ta.cert == *cert)
    }

    /// `anchors_for_name` returns the anchors whose subject matches the given name.
    pub fn anchors_for_name(&self, name: &Name) -> Vec<&TrustAnchor> {
        self.anchors
            .iter()
            .filter(|ta| compare_names(ta.cert.subject(), name))
            .collect()
    }

    /// `fingerprint` returns a digest that identifies the anchor set, independent of the order in
    /// which anchors were added.
    pub fn fingerprint(&self) -> Vec<u8> {
        let mut entries: Vec<Vec<u8>> = self
            .anchors
            .iter()
            .map(|ta| {
                let mut e = ta.cert.sha256_digest();
                e.push(ta.user_trust as u8);
                e
            })
            .collect();
        entries.sort();

        let mut hasher = Sha256::new();
        for e in entries {
            hasher.update(&e);
        }
        hasher.finalize().to_vec()
    }

    /// `log_tas` logs the subject name and SHA-1 digest of each anchor.
    pub fn log_tas(&self) {
        info!("Trust anchors: {}", self.anchors.len());
        for (i, ta) in self.anchors.iter().enumerate() {
            debug!(
                "[{}] {} - {}{}",
                i,
                name_to_string(ta.cert.subject()),
                buffer_to_hex(&ta.cert.sha1_digest()),
                if ta.user_trust { " (user trust)" } else { "" }
            );
        }
    }
}
