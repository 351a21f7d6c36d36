//! Allow-list of leaf certificates admitted even though their chain does not reach a trust anchor
//!
//! The table is a JSON document that maps the lower case hex authority key identifier of the last
//! certificate in a chain to a sorted list of hex SHA-256 certificate digests:
//!
//! ```text
//! {"version": 1, "entries": {"<aki hex>": ["<sha256 hex>", ...]}}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::source::file_utils::get_file_as_byte_vec;
use crate::util::error::*;
use crate::util::tp_utilities::{buffer_to_hex, hex_to_buffer};
use crate::validator::chain::CertificateChain;

#[derive(Serialize, Deserialize)]
struct AllowlistDocument {
    version: u32,
    entries: BTreeMap<String, Vec<String>>,
}

/// `Allowlist` holds, per authority key identifier, a sorted list of SHA-256 certificate digests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Allowlist {
    version: u32,
    entries: BTreeMap<String, Vec<Vec<u8>>>,
}

lazy_static! {
    static ref BUNDLED_ALLOWLIST: Allowlist =
        match Allowlist::from_json(include_bytes!("../data/allowlist.json")) {
            Ok(al) => al,
            Err(e) => {
                error!("Failed to parse bundled allow-list: {}", e);
                Allowlist::default()
            }
        };
}

/// Returns the allow-list compiled into the library
pub fn bundled_allowlist() -> &'static Allowlist {
    &BUNDLED_ALLOWLIST
}

impl Allowlist {
    /// Parses an allow-list from JSON. Keys are normalized to lower case. Each bucket must be
    /// strictly ascending with every value a 32 byte hex string.
    pub fn from_json(json: &[u8]) -> Result<Self> {
        let doc: AllowlistDocument = serde_json::from_slice(json).map_err(|e| {
            error!("Failed to parse allow-list: {}", e);
            Error::ParseError
        })?;

        let mut entries = BTreeMap::new();
        for (aki, digests) in doc.entries {
            if hex_to_buffer(&aki).is_err() {
                error!("Allow-list key is not hex: {}", aki);
                return Err(Error::ParseError);
            }
            let mut bucket: Vec<Vec<u8>> = Vec::with_capacity(digests.len());
            for d in &digests {
                let digest = hex_to_buffer(d)?;
                if digest.len() != 32 {
                    error!("Allow-list digest has wrong length: {}", d);
                    return Err(Error::ParseError);
                }
                if let Some(prev) = bucket.last() {
                    if *prev >= digest {
                        error!("Allow-list bucket for {} is not sorted", aki);
                        return Err(Error::ParseError);
                    }
                }
                bucket.push(digest);
            }
            entries.insert(aki.to_lowercase(), bucket);
        }
        Ok(Allowlist {
            version: doc.version,
            entries,
        })
    }

    /// Reads an allow-list from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = get_file_as_byte_vec(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Returns the version of the table
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the number of authority key identifiers in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `is_allowed` returns true if any certificate in the chain appears in the bucket selected by
    /// the authority key identifier of the last certificate. A chain whose last certificate has no
    /// key identifier, or whose bucket is absent, is not allowed.
    pub fn is_allowed(&self, chain: &CertificateChain<'_>) -> bool {
        let last = match chain.last() {
            Some(c) => c,
            None => return false,
        };
        let aki = match last.authority_key_identifier() {
            Some(aki) => buffer_to_hex(aki),
            None => {
                debug!("Last certificate has no authority key identifier");
                return false;
            }
        };
        let bucket = match self.entries.get(&aki) {
            Some(b) => b,
            None => {
                debug!("No allow-list bucket for {}", aki);
                return false;
            }
        };
        chain
            .iter()
            .any(|cert| bucket.binary_search(&cert.sha256_digest()).is_ok())
    }
}
