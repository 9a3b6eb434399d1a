//! Configuration and policy
//!
//! Limit definitions, config file loading and startup validation.

pub mod loader;
pub mod types;
pub mod validator;
