//! In-memory certificate store that can be populated from a folder of certificate files

use log::info;
use x509_cert::name::Name;

use crate::environment::pki_environment_traits::CertificateSource;
use crate::source::file_utils::*;
use crate::util::error::*;
use crate::util::tp_utilities::compare_names;
use crate::validator::cert_item::CertificateItem;

#[derive(Clone, Debug)]
struct CertRecord {
    subject: Name,
    encoded: Vec<u8>,
}

/// `CertSource` is a [`CertificateSource`] implementation that holds encoded certificates in memory.
/// It answers queries by subject name.
#[derive(Clone, Debug, Default)]
pub struct CertSource {
    certs: Vec<CertRecord>,
}

impl CertSource {
    /// instantiates a new, empty CertSource
    pub fn new() -> CertSource {
        CertSource::default()
    }

    /// `add` adds the given certificate unless an identical encoding is already present.
    pub fn add(&mut self, cert: &CertificateItem) {
        if self.certs.iter().any(|c| c.encoded == cert.encoded_cert) {
            return;
        }
        self.certs.push(CertRecord {
            subject: cert.subject().clone(),
            encoded: cert.encoded_cert.clone(),
        });
    }

    /// `add_encoded` parses the given buffer and adds it to the store.
    pub fn add_encoded(&mut self, enc_cert: &[u8]) -> Result<()> {
        let cert = CertificateItem::from_der(enc_cert)?;
        self.add(&cert);
        Ok(())
    }

    /// `load_folder` adds each certificate found in the indicated folder and returns the number of
    /// certificates added. Files that cannot be parsed are skipped.
    pub fn load_folder(&mut self, folder: &str) -> Result<usize> {
        let initial = self.certs.len();
        for path in files_with_extensions(folder, &["der", "crt", "cer", "pem"])? {
            let locator = path.display().to_string();
            if let Ok(buf) = get_file_as_byte_vec_pem(&path) {
                if let Ok(cert) = CertificateItem::from_der_with_locator(&buf, &locator) {
                    self.add(&cert);
                }
            }
        }
        let added = self.certs.len() - initial;
        info!("Loaded {} certificates from {}", added, folder);
        Ok(added)
    }

    /// Returns the number of certificates
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Returns true if the store is empty
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

impl CertificateSource for CertSource {
    fn get_encoded_certificates_for_name(&self, name: &Name) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .certs
            .iter()
            .filter(|c| compare_names(&c.subject, name))
            .map(|c| c.encoded.clone())
            .collect())
    }
}
