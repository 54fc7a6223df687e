//! Purpose: Loadable extension modules and the loader that runs their entry points.
//! Exports: `StaticModule`, `EntryPoint`, `Trust`, `LoadedModule`, `load`, `entry_symbol`.
//! Role: Chooses the full-trust or restricted entry point and records what was loaded.
//! Invariants: A prefix is loaded at most once per interpreter.
//! Invariants: Entry-point failures surface as `ModuleLoad` with the original error as source.
pub mod sample;

use serde::Serialize;

use crate::core::error::{Error, ErrorKind};
use crate::host::Interp;

pub type EntryPoint = fn(&mut Interp) -> Result<(), Error>;

/// A module linked into the host binary, looked up by prefix.
#[derive(Clone, Copy)]
pub struct StaticModule {
    pub prefix: &'static str,
    pub init: EntryPoint,
    pub safe_init: Option<EntryPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trust {
    Full,
    Safe,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoadedModule {
    pub prefix: String,
    pub trust: Trust,
    /// Version the module provided under its own prefix, if any.
    pub version: Option<String>,
}

pub const STATIC_MODULES: &[StaticModule] = &[sample::MODULE];

/// `sample`, `SAMPLE` and `Sample` all name the same module.
pub fn normalize_prefix(prefix: &str) -> String {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Conventional entry symbol: `Prefix_Init` or `Prefix_SafeInit`.
pub fn entry_symbol(prefix: &str, trust: Trust) -> String {
    let suffix = match trust {
        Trust::Full => "Init",
        Trust::Safe => "SafeInit",
    };
    format!("{}_{suffix}", normalize_prefix(prefix))
}

/// Prefix implied by a library file name: `/usr/lib/libsample2.so` gives `Sample`.
pub fn prefix_from_file_name(file_name: &str) -> Option<String> {
    let tail = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let tail = tail.strip_prefix("lib").unwrap_or(tail);
    let prefix: String = tail.chars().take_while(char::is_ascii_alphabetic).collect();
    if prefix.is_empty() {
        None
    } else {
        Some(normalize_prefix(&prefix))
    }
}

/// Runs the entry point of the static module named `prefix` matching the interpreter's trust.
pub fn load(interp: &mut Interp, prefix: &str) -> Result<(), Error> {
    let prefix = normalize_prefix(prefix);
    if prefix.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("module prefix is empty"));
    }
    if interp.loaded_module(&prefix).is_some() {
        tracing::debug!(prefix = prefix.as_str(), "module already loaded");
        return Ok(());
    }
    let module = interp.static_module(&prefix).ok_or_else(|| {
        Error::new(ErrorKind::ModuleLoad)
            .with_message(format!("couldn't find module with prefix \"{prefix}\""))
            .with_hint(format!(
                "Available modules: {}.",
                STATIC_MODULES
                    .iter()
                    .map(|module| module.prefix)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
    })?;

    let trust = if interp.is_safe() {
        Trust::Safe
    } else {
        Trust::Full
    };
    let symbol = entry_symbol(&prefix, trust);
    let entry = match trust {
        Trust::Full => module.init,
        Trust::Safe => module.safe_init.ok_or_else(|| {
            Error::new(ErrorKind::ModuleLoad)
                .with_message(format!(
                    "can't use module in a safe interpreter: no {symbol} procedure"
                ))
                .with_package(prefix.as_str())
        })?,
    };

    entry(interp).map_err(|err| {
        Error::new(ErrorKind::ModuleLoad)
            .with_message(format!("{symbol} failed: {}", err.result_text()))
            .with_package(prefix.as_str())
            .with_source(err)
    })?;

    let version = interp.packages().present(&prefix).map(str::to_string);
    tracing::debug!(
        prefix = prefix.as_str(),
        symbol = symbol.as_str(),
        version = version.as_deref().unwrap_or(""),
        "module loaded"
    );
    interp.record_loaded(LoadedModule {
        prefix,
        trust,
        version,
    });
    Ok(())
}
