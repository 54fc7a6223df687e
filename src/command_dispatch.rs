//! Purpose: Hold top-level CLI command dispatch for `hostlink`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command emits exactly one JSON document on success.
//! Invariants: Library errors pass through unchanged so exit codes follow their kind.

use std::cmp::Ordering;

use hostlink::api::{
    HOST_PACKAGE, HOST_STUBS_LAYOUT, HOST_STUBS_MAGIC, HOST_STUBS_REVISION, SlotSpec, VersionSpec,
    init_stubs, load, vcompare, vsatisfies,
};
use hostlink::stubs::{
    INTERNAL_PLATFORM_STUBS_LAYOUT, INTERNAL_STUBS_LAYOUT, PLATFORM_STUBS_LAYOUT,
    STUB_HOOKS_LAYOUT, SUBSYSTEM_STUBS_LAYOUT, host_slot_offset,
};

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    config: Option<PathBuf>,
) -> Result<RunOutcome, Error> {
    let config = config.as_deref();
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "hostlink", &mut io::stdout());
        }
        Command::Version => emit_version_output(),
        Command::Vcompare { left, right } => {
            let cmp = match vcompare(&left, &right)? {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            };
            emit_json(json!({ "left": left, "right": right, "cmp": cmp }));
        }
        Command::Satisfies {
            version,
            spec,
            exact,
        } => {
            let rule = if VersionSpec::parse(&spec)?.is_bare_pair() {
                "prefix"
            } else {
                "numeric"
            };
            let satisfied = vsatisfies(&version, &spec, exact)?;
            emit_json(json!({
                "version": version,
                "spec": spec,
                "exact": exact,
                "rule": rule,
                "satisfied": satisfied,
            }));
        }
        Command::Require {
            package,
            spec,
            exact,
            host,
        } => {
            let mut interp = build_interp(config, host)?;
            let provided = interp.pkg_require(&package, &spec, exact)?;
            emit_json(json!({
                "package": package,
                "version": provided.version,
                "stubs": provided.handle.is_some(),
            }));
        }
        Command::Negotiate { spec, exact, host } => {
            let mut interp = build_interp(config, host)?;
            let link = init_stubs(&mut interp, HOST_PACKAGE, &spec, exact)?;
            let slots = HOST_STUBS_LAYOUT
                .iter()
                .filter(|slot| slot.revision <= link.revision())
                .map(|slot| slot.name)
                .collect::<Vec<_>>();
            let platform = link.platform().ok().map(|platform| {
                json!({
                    "os_family": (platform.os_family)(),
                    "path_separator": (platform.path_separator)().to_string(),
                })
            });
            emit_json(json!({
                "package": link.package(),
                "version": link.version(),
                "revision": link.revision(),
                "slots": slots,
                "hooks": {
                    "platform": platform,
                    "internal": link.internal().is_ok(),
                    "internal_platform": link.internal_platform().is_ok(),
                    "internal_subsystem": link.subsystem().is_ok(),
                },
            }));
        }
        Command::Load { prefix, host } => {
            let mut interp = build_interp(config, host)?;
            load(&mut interp, &prefix)?;
            let modules = serde_json::to_value(interp.loaded_modules()).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode loaded modules")
                    .with_source(err)
            })?;
            emit_json(json!({
                "loaded": modules,
                "commands": interp.command_names(),
                "packages": packages_json(&interp),
            }));
        }
        Command::Eval { script, load: prefixes, host } => {
            let mut interp = build_interp(config, host)?;
            for prefix in &prefixes {
                load(&mut interp, prefix)?;
            }
            let result = interp.eval_global(&script)?;
            emit_json(json!({ "result": result.as_str() }));
        }
        Command::Layout => emit_json(layout_json()),
    }
    Ok(RunOutcome::ok())
}

fn packages_json(interp: &Interp) -> Value {
    let packages = interp.packages();
    let mut map = Map::new();
    for name in packages.names() {
        if let Some(version) = packages.present(name) {
            map.insert(name.to_string(), json!(version));
        }
    }
    Value::Object(map)
}

fn ledger_json(ledger: &[SlotSpec]) -> Value {
    json!(
        ledger
            .iter()
            .map(|slot| json!({ "name": slot.name, "revision": slot.revision }))
            .collect::<Vec<_>>()
    )
}

fn layout_json() -> Value {
    let slots = HOST_STUBS_LAYOUT
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            json!({
                "name": slot.name,
                "revision": slot.revision,
                "offset": host_slot_offset(index),
            })
        })
        .collect::<Vec<_>>();
    json!({
        "magic": format!("{HOST_STUBS_MAGIC:#010x}"),
        "revision": HOST_STUBS_REVISION,
        "slots": slots,
        "hooks": ledger_json(STUB_HOOKS_LAYOUT),
        "tables": {
            "platform": ledger_json(PLATFORM_STUBS_LAYOUT),
            "internal": ledger_json(INTERNAL_STUBS_LAYOUT),
            "internal_platform": ledger_json(INTERNAL_PLATFORM_STUBS_LAYOUT),
            "internal_subsystem": ledger_json(SUBSYSTEM_STUBS_LAYOUT),
        },
    })
}
