//! Purpose: Define the stable public Rust API boundary for hostlink.
//! Exports: Negotiation, registry, host, and module types needed by embedders and the CLI.
//! Role: Public, additive-only surface; internal layout helpers stay in their modules.
//! Invariants: Anything re-exported here follows the stub table's append-only rule.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::config::{DEFAULT_HOST_VERSION, HostConfig, SEARCH_PATH_ENV};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::registry::{PackageRecord, Provided, VersionRegistry};
pub use crate::core::version::{Requirement, Version, VersionSpec, vcompare, vsatisfies};
pub use crate::host::{HOST_PACKAGE, HOST_STUBS, Interp, Value};
pub use crate::module::{
    EntryPoint, LoadedModule, STATIC_MODULES, StaticModule, Trust, entry_symbol, load,
};
pub use crate::negotiate::{HostLink, init_stubs};
pub use crate::stubs::{
    ClientData, CommandProc, DeleteProc, HOST_STUBS_LAYOUT, HOST_STUBS_MAGIC, HOST_STUBS_REVISION,
    HostStubs, OpaqueHandle, SlotSpec,
};
