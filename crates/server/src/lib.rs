//! Codrelay server library.
//!
//! This crate provides the COD order gateway as a library, allowing it to
//! be exercised from integration tests as well as the binary.
//!
//! # Architecture
//!
//! - Axum web framework, JSON API only
//! - Shopify Admin API (REST draft-order flow, GraphQL alternative)
//! - `PostgreSQL` (or in-memory) store for per-shop access tokens
//! - LocationIQ passthrough for address autocomplete

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cod;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
