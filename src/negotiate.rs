//! Purpose: Extension-side stub negotiation against a host package.
//! Exports: `init_stubs`, `HostLink`.
//! Role: The only way module code reaches host entry points.
//! Invariants: A `HostLink` exists only after the version check passed and the handle
//! downcast to a `HostStubs` with the expected magic.
//! Invariants: A link is immutable; it never outlives the `'static` tables it points at.
//! Notes: Slots and hook tables a host's revision lacks surface as `StubsUnsupported`.
use std::fmt;

use crate::core::error::{Error, ErrorKind};
use crate::core::registry::Provided;
use crate::host::{Interp, Value};
use crate::stubs::{
    ClientData, CommandProc, DeleteProc, HOST_STUBS_MAGIC, HostStubs, InternalPlatformStubs,
    InternalStubs, OpaqueHandle, PlatformStubs, SubsystemStubs,
};

/// Capability returned by a successful negotiation.
#[derive(Clone)]
pub struct HostLink {
    package: String,
    version: String,
    stubs: &'static HostStubs,
}

impl fmt::Debug for HostLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostLink")
            .field("package", &self.package)
            .field("version", &self.version)
            .field("revision", &self.stubs.revision)
            .finish()
    }
}

/// Requires `package` at `spec` and binds its stub table.
pub fn init_stubs(
    interp: &mut Interp,
    package: &str,
    spec: &str,
    exact: bool,
) -> Result<HostLink, Error> {
    let provided = interp.pkg_require(package, spec, exact)?;
    let Some(handle) = provided.handle else {
        return Err(Error::new(ErrorKind::StubsUnsupported)
            .with_message(format!(
                "this implementation of {package} does not support stubs"
            ))
            .with_package(package));
    };
    let stubs = handle
        .downcast_ref::<HostStubs>()
        .filter(|stubs| stubs.magic == HOST_STUBS_MAGIC)
        .ok_or_else(|| {
            Error::new(ErrorKind::StubsUnsupported)
                .with_message(format!("{package} uses an incompatible stubs mechanism"))
                .with_package(package)
        })?;
    tracing::debug!(
        package,
        version = provided.version.as_str(),
        revision = stubs.revision,
        "stubs initialized"
    );
    Ok(HostLink {
        package: package.to_string(),
        version: provided.version,
        stubs,
    })
}

impl HostLink {
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Version the host actually provided.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn revision(&self) -> u32 {
        self.stubs.revision
    }

    pub fn stubs(&self) -> &'static HostStubs {
        self.stubs
    }

    pub fn provide(&self, interp: &mut Interp, name: &str, version: &str) -> Result<(), Error> {
        (self.stubs.pkg_provide)(interp, name, version, None)
    }

    pub fn provide_with_handle(
        &self,
        interp: &mut Interp,
        name: &str,
        version: &str,
        handle: OpaqueHandle,
    ) -> Result<(), Error> {
        (self.stubs.pkg_provide)(interp, name, version, Some(handle))
    }

    pub fn require(
        &self,
        interp: &mut Interp,
        name: &str,
        spec: &str,
        exact: bool,
    ) -> Result<Provided<OpaqueHandle>, Error> {
        (self.stubs.pkg_require)(interp, name, spec, exact)
    }

    pub fn create_command(
        &self,
        interp: &mut Interp,
        name: &str,
        proc_: CommandProc,
        client_data: ClientData,
        delete: Option<DeleteProc>,
    ) {
        (self.stubs.create_command)(interp, name, proc_, client_data, delete)
    }

    pub fn delete_command(&self, interp: &mut Interp, name: &str) -> bool {
        (self.stubs.delete_command)(interp, name)
    }

    pub fn wrong_num_args(&self, interp: &Interp, count: usize, args: &[Value], usage: &str) -> Error {
        (self.stubs.wrong_num_args)(interp, count, args, usage)
    }

    pub fn get_int(&self, interp: &Interp, value: &Value) -> Result<i64, Error> {
        (self.stubs.get_int)(interp, value)
    }

    pub fn set_result(&self, interp: &mut Interp, value: Value) {
        (self.stubs.set_result)(interp, value)
    }

    pub fn eval_global(&self, interp: &mut Interp, script: &str) -> Result<Value, Error> {
        (self.stubs.eval_global)(interp, script)
    }

    /// Revision 2 slot.
    pub fn encoding_search_path(&self, interp: &Interp) -> Result<Vec<String>, Error> {
        let slot = self
            .stubs
            .encoding_search_path
            .ok_or_else(|| self.missing("encoding_search_path"))?;
        Ok(slot(interp))
    }

    pub fn platform(&self) -> Result<&'static PlatformStubs, Error> {
        self.stubs
            .hooks
            .and_then(|hooks| hooks.platform)
            .ok_or_else(|| self.missing("platform"))
    }

    pub fn internal(&self) -> Result<&'static InternalStubs, Error> {
        self.stubs
            .hooks
            .and_then(|hooks| hooks.internal)
            .ok_or_else(|| self.missing("internal"))
    }

    pub fn internal_platform(&self) -> Result<&'static InternalPlatformStubs, Error> {
        self.stubs
            .hooks
            .and_then(|hooks| hooks.internal_platform)
            .ok_or_else(|| self.missing("internal_platform"))
    }

    pub fn subsystem(&self) -> Result<&'static SubsystemStubs, Error> {
        self.stubs
            .hooks
            .and_then(|hooks| hooks.internal_subsystem)
            .ok_or_else(|| self.missing("internal_subsystem"))
    }

    fn missing(&self, entry: &str) -> Error {
        Error::new(ErrorKind::StubsUnsupported)
            .with_message(format!(
                "{} stubs revision {} does not provide {entry}",
                self.package, self.stubs.revision
            ))
            .with_package(self.package.as_str())
    }
}
