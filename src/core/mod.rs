//! Core library components.
//!
//! This module contains the reusable logic: sealed-box cryptography, the
//! payload codec, the PAT guard, and the GitHub secrets relay.

pub mod cipher;
pub mod codec;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod github;
pub mod guard;
pub mod relay;
pub mod types;
pub mod validation;
