//! Purpose: Library crate behind the `hostlink` CLI, the C ABI, and embedding hosts.
//! Exports: `api` (public surface), plus the modules it is assembled from.
//! Role: Version negotiation and versioned host tables for loadable extension modules.
//! Invariants: Extensions reach the host only through a negotiated `HostLink`.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
#![allow(clippy::result_large_err)]

#[allow(non_camel_case_types)]
pub mod abi;
pub mod api;
pub mod config;
pub mod core;
pub mod host;
pub mod module;
pub mod negotiate;
pub mod stubs;
