//! Utility functions for reading DER or PEM encoded artifacts from the file system

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::{debug, error};
use walkdir::WalkDir;

use crate::util::error::*;

/// `get_file_as_byte_vec` reads the contents of the indicated file.
pub fn get_file_as_byte_vec(filename: &Path) -> Result<Vec<u8>> {
    Ok(std::fs::read(filename)?)
}

/// `get_file_as_byte_vec_pem` reads the contents of the indicated file, decoding it first if it
/// is PEM encoded.
pub fn get_file_as_byte_vec_pem(filename: &Path) -> Result<Vec<u8>> {
    let b = get_file_as_byte_vec(filename)?;
    if b.first() == Some(&0x2D) {
        return match der::pem::decode_vec(b.as_slice()) {
            Ok(d) => Ok(d.1),
            Err(e) => {
                error!("Failed to decode PEM from {:?}: {:?}", filename, e);
                Err(Error::ParseError)
            }
        };
    }
    Ok(b)
}

/// `files_with_extensions` walks the indicated folder and returns the paths of files whose
/// extension is one of `exts`. Returns `Error::NotFound` if the folder does not exist.
pub fn files_with_extensions(folder: &str, exts: &[&str]) -> Result<Vec<PathBuf>> {
    if !Path::new(folder).is_dir() {
        error!("{} does not exist or is not a directory", folder);
        return Err(Error::NotFound);
    }

    let mut retval = vec![];
    for entry in WalkDir::new(folder) {
        let e = match entry {
            Ok(e) => e,
            Err(err) => {
                error!("Failed to read entry in {}: {}", folder, err);
                continue;
            }
        };
        if e.file_type().is_dir() {
            continue;
        }
        match e.path().extension().and_then(OsStr::to_str) {
            Some(ext) if exts.contains(&ext.to_lowercase().as_str()) => {
                debug!("Found {}", e.path().display());
                retval.push(e.path().to_path_buf());
            }
            _ => {}
        }
    }
    Ok(retval)
}

#[test]
fn non_existent_dir() {
    assert_eq!(
        Some(Error::NotFound),
        files_with_extensions("tests/examples/nonexistent", &["der"]).err()
    );
}
