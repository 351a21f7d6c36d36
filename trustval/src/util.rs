//! Basic utility functionality supporting trust policy verification

pub mod crypto;
pub mod error;
pub mod logging;
pub mod tp_oids;
pub mod tp_utilities;

pub use crate::{
    util::crypto::*, util::error::*, util::logging::*, util::tp_oids::*, util::tp_utilities::*,
};
