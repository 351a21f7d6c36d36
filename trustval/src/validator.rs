//! Chain linking, anchor resolution and trust policy verification

pub mod cert_item;
pub mod chain;
pub mod chain_builder;
pub mod extension_info;
pub mod name_constraints;
pub mod policy_context;
pub mod policy_results;
pub mod policy_rules;
pub mod policy_settings;
pub mod policy_verifier;
pub mod tp_extension;
pub mod verify_context;

pub use crate::{
    validator::cert_item::*, validator::chain::*, validator::chain_builder::*,
    validator::extension_info::*, validator::name_constraints::*, validator::policy_context::*,
    validator::policy_results::*, validator::policy_rules::*, validator::policy_settings::*,
    validator::policy_verifier::*, validator::tp_extension::*, validator::verify_context::*,
};
