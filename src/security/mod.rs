//! Security module
//!
//! Provider credential storage in the OS keyring.

pub mod keyring;

pub use keyring::{delete_api_key, get_api_key, has_api_key, set_api_key};
