//! Referral landing - referral attribution and redirect resolution
//!
//! Turns an inbound referral landing URL into exactly one action
//! (redirect into account creation, redirect to the canonical cabinet
//! route, or render in place), records campaign attribution per visitor,
//! and serves the referrer's cabinet analytics fetched from the backend.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **clipboard**: system clipboard backend for the cabinet presenter
//!
//! # Architecture
//! - `referral`: token resolution, redirect policy, link normalization
//! - `attribution`: per-visitor campaign attribution store and backends
//! - `profile`: backend profile source and stale-safe fetcher
//! - `cabinet`: cabinet view and copy/share/QR presenter
//! - `services`: the landing flow tying the above together
//! - `api`: HTTP routes and middleware
//! - `config`, `errors`, `system`: ambient infrastructure

pub mod attribution;
pub mod cabinet;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod profile;
pub mod referral;
pub mod services;
pub mod system;

#[cfg(feature = "server")]
pub mod api;
pub mod runtime;
