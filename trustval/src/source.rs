//! Trust anchor, certificate and CRL stores along with issuer and CRL discovery

pub mod cert_source;
pub mod crl_source;
pub mod discovery;
pub mod file_utils;
pub mod ta_source;

pub use crate::{
    source::cert_source::*, source::crl_source::*, source::discovery::*, source::file_utils::*,
    source::ta_source::*,
};
