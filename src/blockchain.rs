// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// chain management (`chain`) and chain validation (`validation`).

pub mod core;
pub use core::*;
