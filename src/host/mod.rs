//! Purpose: Minimal reference host that consumes the negotiation core.
//! Exports: `Interp`, `Value`, `HOST_STUBS`, `HOST_PACKAGE`, list/script helpers.
//! Role: Command table, result slot, package registry, and module bookkeeping for one host.
//! Invariants: A command's delete callback runs exactly once (replace, delete, or drop).
//! Invariants: Every failed invocation leaves the error text in the interpreter result.
//! Notes: Scripts are split into words only; there is no substitution or procedure scope.
use std::collections::BTreeMap;

use crate::config::HostConfig;
use crate::core::error::{Error, ErrorKind};
use crate::core::registry::{Provided, VersionRegistry};
use crate::module::{LoadedModule, STATIC_MODULES, StaticModule};
use crate::stubs::{ClientData, CommandProc, DeleteProc, OpaqueHandle};

mod builtins;
mod table;
mod value;
mod words;

pub use table::HOST_STUBS;
pub use value::{Value, format_list};
pub use words::split_script;

/// Package name under which the host registers itself and its stub table.
pub const HOST_PACKAGE: &str = "Host";

struct CommandRecord {
    proc_: CommandProc,
    client_data: ClientData,
    delete: Option<DeleteProc>,
}

pub struct Interp {
    commands: BTreeMap<String, CommandRecord>,
    packages: VersionRegistry<OpaqueHandle>,
    result: Value,
    safe: bool,
    search_path: Vec<String>,
    loaded: Vec<LoadedModule>,
    static_modules: Vec<StaticModule>,
}

impl Interp {
    /// Full-trust interpreter with builtins and the static module table, but no packages.
    pub fn new() -> Self {
        Self::with_trust(false)
    }

    /// Restricted interpreter; modules load through their safe entry point.
    pub fn new_safe() -> Self {
        Self::with_trust(true)
    }

    pub fn from_config(config: &HostConfig) -> Result<Self, Error> {
        let mut interp = Self::with_trust(config.safe);
        interp.set_encoding_search_path(config.search_path.clone());
        interp.provide_host(&config.version, config.stubs)?;
        Ok(interp)
    }

    fn with_trust(safe: bool) -> Self {
        let mut interp = Self {
            commands: BTreeMap::new(),
            packages: VersionRegistry::new(),
            result: Value::empty(),
            safe,
            search_path: Vec::new(),
            loaded: Vec::new(),
            static_modules: Vec::new(),
        };
        builtins::register(&mut interp);
        for module in STATIC_MODULES {
            interp.register_static_module(*module);
        }
        interp
    }

    /// Registers the host package, with the stub table as its handle when `stubs` is set.
    pub fn provide_host(&mut self, version: &str, stubs: bool) -> Result<(), Error> {
        let handle: Option<OpaqueHandle> = if stubs { Some(&HOST_STUBS) } else { None };
        self.pkg_provide(HOST_PACKAGE, version, handle)
    }

    pub fn is_safe(&self) -> bool {
        self.safe
    }

    pub fn create_command(
        &mut self,
        name: &str,
        proc_: CommandProc,
        client_data: ClientData,
        delete: Option<DeleteProc>,
    ) {
        let record = CommandRecord {
            proc_,
            client_data,
            delete,
        };
        if let Some(previous) = self.commands.insert(name.to_string(), record) {
            tracing::debug!(command = name, "command replaced");
            run_delete(previous);
        }
    }

    pub fn delete_command(&mut self, name: &str) -> bool {
        match self.commands.remove(name) {
            Some(record) => {
                run_delete(record);
                true
            }
            None => false,
        }
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    /// Invokes the command named by `args[0]`.
    pub fn invoke(&mut self, args: &[Value]) -> Result<(), Error> {
        let Some(name) = args.first() else {
            return self.fail(Error::new(ErrorKind::Usage).with_message("empty command"));
        };
        let (proc_, client_data) = match self.commands.get(name.as_str()) {
            Some(record) => (record.proc_, record.client_data.clone()),
            None => {
                return self.fail(
                    Error::new(ErrorKind::UnknownCommand)
                        .with_message(format!("invalid command name \"{name}\"")),
                );
            }
        };
        self.result = Value::empty();
        match proc_(&client_data, self, args) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    /// Evaluates `script` at the only scope this host has; returns the last command's result.
    pub fn eval_global(&mut self, script: &str) -> Result<Value, Error> {
        let commands = match split_script(script) {
            Ok(commands) => commands,
            Err(err) => return self.fail(err),
        };
        self.result = Value::empty();
        for words in commands {
            let args: Vec<Value> = words.into_iter().map(Value::from).collect();
            self.invoke(&args)?;
        }
        Ok(self.result.clone())
    }

    fn fail<T>(&mut self, err: Error) -> Result<T, Error> {
        self.result = Value::from(err.result_text());
        Err(err)
    }

    /// Arity error naming the first `count` words followed by `usage`.
    pub fn wrong_num_args(&self, count: usize, args: &[Value], usage: &str) -> Error {
        let mut expected: Vec<&str> = args.iter().take(count).map(Value::as_str).collect();
        if !usage.is_empty() {
            expected.push(usage);
        }
        Error::new(ErrorKind::Usage).with_message(format!(
            "wrong # args: should be \"{}\"",
            expected.join(" ")
        ))
    }

    pub fn get_int(&self, value: &Value) -> Result<i64, Error> {
        value.to_int()
    }

    pub fn set_result(&mut self, value: Value) {
        self.result = value;
    }

    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn encoding_search_path(&self) -> &[String] {
        &self.search_path
    }

    pub fn set_encoding_search_path(&mut self, path: Vec<String>) {
        self.search_path = path;
    }

    pub fn pkg_provide(
        &mut self,
        name: &str,
        version: &str,
        handle: Option<OpaqueHandle>,
    ) -> Result<(), Error> {
        self.packages.provide(name, version, handle)
    }

    pub fn pkg_require(
        &mut self,
        name: &str,
        spec: &str,
        exact: bool,
    ) -> Result<Provided<OpaqueHandle>, Error> {
        self.packages.require(name, spec, exact)
    }

    pub fn packages(&self) -> &VersionRegistry<OpaqueHandle> {
        &self.packages
    }

    pub fn packages_mut(&mut self) -> &mut VersionRegistry<OpaqueHandle> {
        &mut self.packages
    }

    pub fn register_static_module(&mut self, module: StaticModule) {
        self.static_modules
            .retain(|existing| !existing.prefix.eq_ignore_ascii_case(module.prefix));
        self.static_modules.push(module);
    }

    pub fn static_module(&self, prefix: &str) -> Option<StaticModule> {
        self.static_modules
            .iter()
            .find(|module| module.prefix.eq_ignore_ascii_case(prefix))
            .copied()
    }

    pub fn loaded_modules(&self) -> &[LoadedModule] {
        &self.loaded
    }

    pub fn loaded_module(&self, prefix: &str) -> Option<&LoadedModule> {
        self.loaded
            .iter()
            .find(|module| module.prefix.eq_ignore_ascii_case(prefix))
    }

    pub fn record_loaded(&mut self, module: LoadedModule) {
        self.loaded.push(module);
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interp {
    fn drop(&mut self) {
        for (_, record) in std::mem::take(&mut self.commands) {
            run_delete(record);
        }
    }
}

fn run_delete(record: CommandRecord) {
    if let Some(delete) = record.delete {
        delete(&record.client_data);
    }
}
