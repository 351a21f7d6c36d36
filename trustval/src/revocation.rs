//! Certificate revocation lists and revocation status determination

pub mod check_revocation;
pub mod crl;
pub mod crl_item;
pub mod revocation_cache;

pub use crate::{
    revocation::check_revocation::*, revocation::crl::*, revocation::crl_item::*,
    revocation::revocation_cache::*,
};
