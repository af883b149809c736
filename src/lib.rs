//! Same-category seat pairing with a versioned, restorable history.
//!
//! [`pairing::PairingEngine`] turns a roster into two-seat tables,
//! [`layout::plan`] places the tables on a four-column grid and
//! [`store::SnapshotStore`] keeps the current arrangement plus an archive
//! of every arrangement it replaced. [`service::Service`] ties them
//! together behind the five commands the binary exposes.

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod pairing;
pub mod report;
pub mod roster;
pub mod service;
pub mod store;
pub mod timestamp;
