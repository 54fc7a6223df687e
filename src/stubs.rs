//! Purpose: Define the versioned host entry-point table handed to extension modules.
//! Exports: `HostStubs`, the four hook sub-tables, their layout ledgers, slot signatures.
//! Role: ABI contract between a host and modules built against any earlier revision.
//! Invariants: Slots and hooks are append-only; nothing is removed or reordered.
//! Invariants: Slots introduced after revision 1 are `Option` and may be `None` on older hosts.
//! Invariants: Every table field is pointer-sized after the header, so a slot's offset is
//! fixed by its ledger position.
use std::any::Any;
use std::sync::Arc;

use crate::core::error::Error;
use crate::core::registry::Provided;
use crate::host::{Interp, Value};

/// "HLNK"
pub const HOST_STUBS_MAGIC: u32 = 0x484C_4E4B;
pub const HOST_STUBS_REVISION: u32 = 2;

/// Opaque capability handle stored in the package registry.
pub type OpaqueHandle = &'static (dyn Any + Send + Sync);

/// Per-command context passed back to the handler on every call.
pub type ClientData = Option<Arc<dyn Any + Send + Sync>>;

/// `args[0]` is the command name itself.
pub type CommandProc = fn(&ClientData, &mut Interp, &[Value]) -> Result<(), Error>;
pub type DeleteProc = fn(&ClientData);

pub type PkgProvideSlot = fn(&mut Interp, &str, &str, Option<OpaqueHandle>) -> Result<(), Error>;
pub type PkgRequireSlot =
    fn(&mut Interp, &str, &str, bool) -> Result<Provided<OpaqueHandle>, Error>;
pub type CreateCommandSlot = fn(&mut Interp, &str, CommandProc, ClientData, Option<DeleteProc>);
pub type DeleteCommandSlot = fn(&mut Interp, &str) -> bool;
pub type WrongNumArgsSlot = fn(&Interp, usize, &[Value], &str) -> Error;
pub type GetIntSlot = fn(&Interp, &Value) -> Result<i64, Error>;
pub type SetResultSlot = fn(&mut Interp, Value);
pub type EvalGlobalSlot = fn(&mut Interp, &str) -> Result<Value, Error>;
pub type SearchPathSlot = fn(&Interp) -> Vec<String>;

#[repr(C)]
pub struct HostStubs {
    pub magic: u32,
    pub revision: u32,
    pub hooks: Option<&'static StubHooks>,
    // revision 1
    pub pkg_provide: PkgProvideSlot,
    pub pkg_require: PkgRequireSlot,
    pub create_command: CreateCommandSlot,
    pub delete_command: DeleteCommandSlot,
    pub wrong_num_args: WrongNumArgsSlot,
    pub get_int: GetIntSlot,
    pub set_result: SetResultSlot,
    pub eval_global: EvalGlobalSlot,
    // revision 2
    pub encoding_search_path: Option<SearchPathSlot>,
}

#[repr(C)]
pub struct StubHooks {
    pub platform: Option<&'static PlatformStubs>,
    pub internal: Option<&'static InternalStubs>,
    pub internal_platform: Option<&'static InternalPlatformStubs>,
    pub internal_subsystem: Option<&'static SubsystemStubs>,
}

/// Public, platform-specific entry points.
#[repr(C)]
pub struct PlatformStubs {
    pub revision: u32,
    pub os_family: fn() -> &'static str,
    pub path_separator: fn() -> char,
}

/// Host internals that trusted modules may inspect.
#[repr(C)]
pub struct InternalStubs {
    pub revision: u32,
    pub command_names: fn(&Interp) -> Vec<String>,
    pub is_safe: fn(&Interp) -> bool,
}

#[repr(C)]
pub struct InternalPlatformStubs {
    pub revision: u32,
    pub shared_library_suffix: fn() -> &'static str,
}

/// Module-loader subsystem internals.
#[repr(C)]
pub struct SubsystemStubs {
    pub revision: u32,
    pub loaded_modules: fn(&Interp) -> Vec<String>,
}

/// One entry of a frozen table layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotSpec {
    pub name: &'static str,
    pub revision: u32,
}

const fn slot(name: &'static str, revision: u32) -> SlotSpec {
    SlotSpec { name, revision }
}

/// Slot order of `HostStubs` after its header. Append only.
pub const HOST_STUBS_LAYOUT: &[SlotSpec] = &[
    slot("pkg_provide", 1),
    slot("pkg_require", 1),
    slot("create_command", 1),
    slot("delete_command", 1),
    slot("wrong_num_args", 1),
    slot("get_int", 1),
    slot("set_result", 1),
    slot("eval_global", 1),
    slot("encoding_search_path", 2),
];

pub const STUB_HOOKS_LAYOUT: &[SlotSpec] = &[
    slot("platform", 1),
    slot("internal", 1),
    slot("internal_platform", 1),
    slot("internal_subsystem", 1),
];

pub const PLATFORM_STUBS_LAYOUT: &[SlotSpec] = &[slot("os_family", 1), slot("path_separator", 1)];

pub const INTERNAL_STUBS_LAYOUT: &[SlotSpec] = &[slot("command_names", 1), slot("is_safe", 1)];

pub const INTERNAL_PLATFORM_STUBS_LAYOUT: &[SlotSpec] = &[slot("shared_library_suffix", 1)];

pub const SUBSYSTEM_STUBS_LAYOUT: &[SlotSpec] = &[slot("loaded_modules", 1)];

/// Byte offset of the slot at `index` in `HostStubs`.
pub const fn host_slot_offset(index: usize) -> usize {
    std::mem::offset_of!(HostStubs, hooks) + (index + 1) * std::mem::size_of::<usize>()
}

/// Slots whose revision is above `revision` are absent on such a host.
pub fn slots_added_after(revision: u32) -> impl Iterator<Item = &'static SlotSpec> {
    HOST_STUBS_LAYOUT
        .iter()
        .filter(move |spec| spec.revision > revision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    macro_rules! field_offsets {
        ($ty:ty { $($field:ident),* $(,)? }) => {
            [$((stringify!($field), offset_of!($ty, $field))),*]
        };
    }

    const PTR: usize = size_of::<usize>();

    // Published revisions. A new revision may only extend the previous list.
    const REVISION_1: &[&str] = &[
        "pkg_provide",
        "pkg_require",
        "create_command",
        "delete_command",
        "wrong_num_args",
        "get_int",
        "set_result",
        "eval_global",
    ];
    const REVISION_2: &[&str] = &[
        "pkg_provide",
        "pkg_require",
        "create_command",
        "delete_command",
        "wrong_num_args",
        "get_int",
        "set_result",
        "eval_global",
        "encoding_search_path",
    ];

    fn assert_layout(ledger: &[SlotSpec], fields: &[(&str, usize)], first: usize, size: usize) {
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let expected: Vec<&str> = ledger.iter().map(|spec| spec.name).collect();
        assert_eq!(names, expected, "struct field order must match the ledger");
        for (index, (name, offset)) in fields.iter().enumerate() {
            assert_eq!(*offset, first + index * PTR, "slot {name} moved");
        }
        assert_eq!(size, first + ledger.len() * PTR, "struct has slots missing from the ledger");
    }

    #[test]
    fn host_stubs_header_is_fixed() {
        assert_eq!(offset_of!(HostStubs, magic), 0);
        assert_eq!(offset_of!(HostStubs, revision), 4);
        assert_eq!(offset_of!(HostStubs, hooks), 8);
        assert_eq!(size_of::<Option<&'static StubHooks>>(), PTR);
        assert_eq!(size_of::<Option<SearchPathSlot>>(), PTR);
    }

    #[test]
    fn host_stubs_fields_match_ledger() {
        let fields = field_offsets!(HostStubs {
            pkg_provide,
            pkg_require,
            create_command,
            delete_command,
            wrong_num_args,
            get_int,
            set_result,
            eval_global,
            encoding_search_path,
        });
        assert_layout(
            HOST_STUBS_LAYOUT,
            &fields,
            host_slot_offset(0),
            size_of::<HostStubs>(),
        );
    }

    #[test]
    fn hook_tables_match_ledgers() {
        let hooks = field_offsets!(StubHooks {
            platform,
            internal,
            internal_platform,
            internal_subsystem,
        });
        assert_layout(STUB_HOOKS_LAYOUT, &hooks, 0, size_of::<StubHooks>());

        let platform = field_offsets!(PlatformStubs { os_family, path_separator });
        assert_layout(PLATFORM_STUBS_LAYOUT, &platform, PTR, size_of::<PlatformStubs>());

        let internal = field_offsets!(InternalStubs { command_names, is_safe });
        assert_layout(INTERNAL_STUBS_LAYOUT, &internal, PTR, size_of::<InternalStubs>());

        let internal_platform = field_offsets!(InternalPlatformStubs { shared_library_suffix });
        assert_layout(
            INTERNAL_PLATFORM_STUBS_LAYOUT,
            &internal_platform,
            PTR,
            size_of::<InternalPlatformStubs>(),
        );

        let subsystem = field_offsets!(SubsystemStubs { loaded_modules });
        assert_layout(SUBSYSTEM_STUBS_LAYOUT, &subsystem, PTR, size_of::<SubsystemStubs>());
    }

    #[test]
    fn published_revisions_are_prefixes_of_the_ledger() {
        let ledger: Vec<&str> = HOST_STUBS_LAYOUT.iter().map(|spec| spec.name).collect();
        for (revision, published) in [(1u32, REVISION_1), (2, REVISION_2)] {
            assert!(ledger.starts_with(published), "revision {revision} was rewritten");
            let upto: Vec<&str> = HOST_STUBS_LAYOUT
                .iter()
                .filter(|spec| spec.revision <= revision)
                .map(|spec| spec.name)
                .collect();
            assert_eq!(upto, published, "revision {revision} slot set changed");
        }
    }

    #[test]
    fn ledger_revisions_never_decrease() {
        for ledger in [
            HOST_STUBS_LAYOUT,
            STUB_HOOKS_LAYOUT,
            PLATFORM_STUBS_LAYOUT,
            INTERNAL_STUBS_LAYOUT,
            INTERNAL_PLATFORM_STUBS_LAYOUT,
            SUBSYSTEM_STUBS_LAYOUT,
        ] {
            assert!(ledger.windows(2).all(|pair| pair[0].revision <= pair[1].revision));
            assert!(ledger.iter().all(|spec| spec.revision >= 1));
        }
        let newest = HOST_STUBS_LAYOUT.iter().map(|spec| spec.revision).max();
        assert_eq!(newest, Some(HOST_STUBS_REVISION));
    }

    #[test]
    fn slots_added_after_lists_optional_slots() {
        let names: Vec<&str> = slots_added_after(1).map(|spec| spec.name).collect();
        assert_eq!(names, vec!["encoding_search_path"]);
        assert_eq!(slots_added_after(HOST_STUBS_REVISION).count(), 0);
    }
}
