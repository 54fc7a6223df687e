// The stub table this host publishes under its package handle.
use crate::stubs::{
    HOST_STUBS_MAGIC, HOST_STUBS_REVISION, HostStubs, InternalPlatformStubs, InternalStubs,
    PlatformStubs, StubHooks, SubsystemStubs,
};

use super::Interp;

pub static HOST_STUBS: HostStubs = HostStubs {
    magic: HOST_STUBS_MAGIC,
    revision: HOST_STUBS_REVISION,
    hooks: Some(&HOOKS),
    pkg_provide: Interp::pkg_provide,
    pkg_require: Interp::pkg_require,
    create_command: Interp::create_command,
    delete_command: Interp::delete_command,
    wrong_num_args: Interp::wrong_num_args,
    get_int: Interp::get_int,
    set_result: Interp::set_result,
    eval_global: Interp::eval_global,
    encoding_search_path: Some(search_path),
};

static HOOKS: StubHooks = StubHooks {
    platform: Some(&PLATFORM),
    internal: Some(&INTERNAL),
    internal_platform: Some(&INTERNAL_PLATFORM),
    internal_subsystem: Some(&SUBSYSTEM),
};

static PLATFORM: PlatformStubs = PlatformStubs {
    revision: 1,
    os_family,
    path_separator,
};

static INTERNAL: InternalStubs = InternalStubs {
    revision: 1,
    command_names: Interp::command_names,
    is_safe: Interp::is_safe,
};

static INTERNAL_PLATFORM: InternalPlatformStubs = InternalPlatformStubs {
    revision: 1,
    shared_library_suffix,
};

static SUBSYSTEM: SubsystemStubs = SubsystemStubs {
    revision: 1,
    loaded_modules,
};

fn search_path(interp: &Interp) -> Vec<String> {
    interp.encoding_search_path().to_vec()
}

fn os_family() -> &'static str {
    std::env::consts::FAMILY
}

fn path_separator() -> char {
    std::path::MAIN_SEPARATOR
}

fn shared_library_suffix() -> &'static str {
    std::env::consts::DLL_SUFFIX
}

fn loaded_modules(interp: &Interp) -> Vec<String> {
    interp
        .loaded_modules()
        .iter()
        .map(|module| module.prefix.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::HOST_STUBS;
    use crate::host::Interp;
    use crate::stubs::{HOST_STUBS_MAGIC, HOST_STUBS_REVISION};

    #[test]
    fn published_table_is_current_and_complete() {
        assert_eq!(HOST_STUBS.magic, HOST_STUBS_MAGIC);
        assert_eq!(HOST_STUBS.revision, HOST_STUBS_REVISION);
        assert!(HOST_STUBS.encoding_search_path.is_some());
        let hooks = HOST_STUBS.hooks.expect("hooks");
        assert!(hooks.platform.is_some());
        assert!(hooks.internal.is_some());
        assert!(hooks.internal_platform.is_some());
        assert!(hooks.internal_subsystem.is_some());
    }

    #[test]
    fn slots_reach_the_interpreter() {
        let mut interp = Interp::new_safe();
        interp.set_encoding_search_path(vec!["/usr/share/enc".to_string()]);
        (HOST_STUBS.set_result)(&mut interp, "done".into());
        assert_eq!(interp.result().as_str(), "done");
        let search = HOST_STUBS.encoding_search_path.expect("revision 2 slot");
        assert_eq!(search(&interp), vec!["/usr/share/enc".to_string()]);
        let internal = HOST_STUBS.hooks.and_then(|h| h.internal).expect("internal");
        assert!((internal.is_safe)(&interp));
        assert!((internal.command_names)(&interp).contains(&"package".to_string()));
    }
}
