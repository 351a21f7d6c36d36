//! In-memory CRL store that can be populated from a folder of CRL files

use log::info;
use x509_cert::name::Name;

use crate::environment::pki_environment_traits::CrlSource;
use crate::revocation::crl_item::CrlItem;
use crate::source::file_utils::*;
use crate::util::error::*;
use crate::util::tp_utilities::compare_names;

#[derive(Clone, Debug)]
struct CrlRecord {
    issuer: Name,
    this_update: u64,
    next_update: Option<u64>,
    encoded: Vec<u8>,
}

/// `CrlSourceMemory` is a [`CrlSource`] implementation that holds encoded CRLs in memory. It
/// answers queries by issuer name and time of interest.
#[derive(Clone, Debug, Default)]
pub struct CrlSourceMemory {
    crls: Vec<CrlRecord>,
}

impl CrlSourceMemory {
    /// instantiates a new, empty CrlSourceMemory
    pub fn new() -> CrlSourceMemory {
        CrlSourceMemory::default()
    }

    /// `add` adds the given CRL unless an identical encoding is already present.
    pub fn add(&mut self, crl: &CrlItem) {
        if self.crls.iter().any(|c| c.encoded == crl.encoded_crl) {
            return;
        }
        self.crls.push(CrlRecord {
            issuer: crl.issuer().clone(),
            this_update: crl.this_update,
            next_update: crl.next_update,
            encoded: crl.encoded_crl.clone(),
        });
    }

    /// `add_encoded` parses the given buffer and adds it to the store.
    pub fn add_encoded(&mut self, enc_crl: &[u8]) -> Result<()> {
        let crl = CrlItem::from_der(enc_crl)?;
        self.add(&crl);
        Ok(())
    }

    /// `load_folder` adds each CRL found in the indicated folder (with a .crl extension) and returns
    /// the number of CRLs added. Files that cannot be parsed are skipped.
    pub fn load_folder(&mut self, folder: &str) -> Result<usize> {
        let initial = self.crls.len();
        for path in files_with_extensions(folder, &["crl"])? {
            let locator = path.display().to_string();
            if let Ok(buf) = get_file_as_byte_vec_pem(&path) {
                if let Ok(crl) = CrlItem::from_der_with_locator(&buf, &locator) {
                    self.add(&crl);
                }
            }
        }
        let added = self.crls.len() - initial;
        info!("Loaded {} CRLs from {}", added, folder);
        Ok(added)
    }

    /// Returns the number of CRLs
    pub fn len(&self) -> usize {
        self.crls.len()
    }

    /// Returns true if the store is empty
    pub fn is_empty(&self) -> bool {
        self.crls.is_empty()
    }
}

impl CrlSource for CrlSourceMemory {
    fn get_encoded_crls_for_issuer(
        &self,
        issuer: &Name,
        time_of_interest: u64,
    ) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .crls
            .iter()
            .filter(|c| compare_names(&c.issuer, issuer))
            .filter(|c| c.this_update <= time_of_interest)
            .filter(|c| match c.next_update {
                Some(nu) => time_of_interest < nu,
                None => true,
            })
            .map(|c| c.encoded.clone())
            .collect())
    }
}
