//! Codrelay Core - Shared domain types.
//!
//! This crate provides the common types used by the Codrelay server:
//! shop domains, phone numbers, and email addresses with the COD
//! placeholder convention.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for shop domains, phones, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
