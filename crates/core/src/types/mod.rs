//! Core types for Codrelay.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod phone;
pub mod shop_domain;

pub use email::{Email, EmailError};
pub use phone::{Phone, PhoneError};
pub use shop_domain::{ShopDomain, ShopDomainError};
