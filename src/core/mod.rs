// Core modules: version grammar, package registry, and error modeling.
pub mod error;
pub mod registry;
pub mod version;
