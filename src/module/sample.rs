// Reference extension module: integer subtraction, a trusted-only eval, and a revision 2 probe.
use std::sync::Arc;

use crate::core::error::{Error, ErrorKind};
use crate::host::{HOST_PACKAGE, Interp, Value};
use crate::negotiate::{HostLink, init_stubs};
use crate::stubs::ClientData;

use super::StaticModule;

pub const NAME: &str = "Sample";
pub const VERSION: &str = "2.3";
/// Host versions this module was built against.
pub const HOST_SPEC: &str = "8.5-9.1";

pub const MODULE: StaticModule = StaticModule {
    prefix: NAME,
    init,
    safe_init: Some(safe_init),
};

pub fn init(interp: &mut Interp) -> Result<(), Error> {
    let link = negotiate(interp)?;
    let data: ClientData = Some(Arc::new(link.clone()));
    link.create_command(interp, "sample_sub", sub_cmd, data.clone(), None);
    link.create_command(interp, "sample_unsafe", unsafe_cmd, data.clone(), None);
    link.create_command(interp, "sample_probe", probe_cmd, data, None);
    Ok(())
}

pub fn safe_init(interp: &mut Interp) -> Result<(), Error> {
    let link = negotiate(interp)?;
    let data: ClientData = Some(Arc::new(link.clone()));
    link.create_command(interp, "sample_sub", sub_cmd, data, None);
    Ok(())
}

fn negotiate(interp: &mut Interp) -> Result<HostLink, Error> {
    let link = init_stubs(interp, HOST_PACKAGE, HOST_SPEC, false)?;
    link.provide(interp, NAME, VERSION)?;
    Ok(link)
}

fn host_link(data: &ClientData) -> Result<&HostLink, Error> {
    data.as_deref()
        .and_then(|data| data.downcast_ref::<HostLink>())
        .ok_or_else(|| {
            Error::new(ErrorKind::Internal).with_message("command registered without a host link")
        })
}

/// `sample_sub num num`
pub fn sub_cmd(data: &ClientData, interp: &mut Interp, args: &[Value]) -> Result<(), Error> {
    let link = host_link(data)?;
    if args.len() != 3 {
        return Err(link.wrong_num_args(interp, 1, args, "num num"));
    }
    let first = link.get_int(interp, &args[1])?;
    let second = link.get_int(interp, &args[2])?;
    let difference = first
        .checked_sub(second)
        .ok_or_else(|| Error::new(ErrorKind::Conversion).with_message("integer overflow"))?;
    link.set_result(interp, Value::from(difference));
    Ok(())
}

/// `sample_unsafe`; extra words are ignored.
pub fn unsafe_cmd(data: &ClientData, interp: &mut Interp, _args: &[Value]) -> Result<(), Error> {
    let link = host_link(data)?;
    let value = link.eval_global(interp, "list unsafe command invoked")?;
    link.set_result(interp, value);
    Ok(())
}

/// `sample_probe`: first encoding directory, or empty. Arguments are ignored.
pub fn probe_cmd(data: &ClientData, interp: &mut Interp, _args: &[Value]) -> Result<(), Error> {
    let link = host_link(data)?;
    let first = link
        .encoding_search_path(interp)?
        .into_iter()
        .next()
        .unwrap_or_default();
    link.set_result(interp, Value::from(first));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::core::error::ErrorKind;
    use crate::host::Interp;
    use crate::module::{Trust, load};

    fn host(safe: bool) -> Interp {
        let mut interp = if safe { Interp::new_safe() } else { Interp::new() };
        interp.provide_host("8.6.0", true).expect("provide host");
        interp
    }

    #[test]
    fn full_init_registers_all_commands() {
        let mut interp = host(false);
        load(&mut interp, "sample").expect("load");
        assert_eq!(interp.eval_global("sample_sub 7 3").expect("sub").as_str(), "4");
        assert_eq!(
            interp.eval_global("sample_unsafe").expect("unsafe").as_str(),
            "unsafe command invoked"
        );
        assert_eq!(interp.eval_global("sample_probe").expect("probe").as_str(), "");
        assert_eq!(interp.packages().present("Sample"), Some("2.3"));
        let loaded = interp.loaded_module("Sample").expect("recorded");
        assert_eq!(loaded.trust, Trust::Full);
        assert_eq!(loaded.version.as_deref(), Some("2.3"));
    }

    #[test]
    fn unsafe_and_probe_ignore_extra_words() {
        let mut interp = host(false);
        interp.set_encoding_search_path(vec!["/enc".to_string(), "/more".to_string()]);
        load(&mut interp, "sample").expect("load");
        assert_eq!(
            interp
                .eval_global("sample_unsafe extra args")
                .expect("unsafe")
                .as_str(),
            "unsafe command invoked"
        );
        assert_eq!(
            interp.eval_global("sample_probe x").expect("probe").as_str(),
            "/enc"
        );
    }

    #[test]
    fn safe_init_registers_only_sub() {
        let mut interp = host(true);
        load(&mut interp, "Sample").expect("load");
        assert!(interp.has_command("sample_sub"));
        assert!(!interp.has_command("sample_unsafe"));
        assert!(!interp.has_command("sample_probe"));
        let err = interp.eval_global("sample_unsafe").expect_err("hidden");
        assert_eq!(err.kind(), ErrorKind::UnknownCommand);
        assert_eq!(
            interp.loaded_module("Sample").map(|m| m.trust),
            Some(Trust::Safe)
        );
    }

    #[test]
    fn sub_reports_arity_conversion_and_overflow() {
        let mut interp = host(false);
        load(&mut interp, "sample").expect("load");

        let err = interp.eval_global("sample_sub 7").expect_err("arity");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(
            interp.result().as_str(),
            "wrong # args: should be \"sample_sub num num\""
        );

        let err = interp.eval_global("sample_sub 7 x").expect_err("conversion");
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert_eq!(interp.result().as_str(), "expected integer but got \"x\"");

        let err = interp
            .eval_global("sample_sub -9223372036854775808 1")
            .expect_err("overflow");
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert_eq!(interp.result().as_str(), "integer overflow");

        assert_eq!(interp.eval_global("sample_sub -2 5").expect("sub").as_str(), "-7");
    }

    #[test]
    fn probe_reports_first_search_entry() {
        let mut interp = host(false);
        interp.set_encoding_search_path(vec!["/a/enc".to_string(), "/b/enc".to_string()]);
        load(&mut interp, "sample").expect("load");
        assert_eq!(interp.eval_global("sample_probe").expect("probe").as_str(), "/a/enc");
    }

    #[test]
    fn incompatible_host_aborts_load() {
        let mut interp = Interp::new();
        interp.provide_host("9.2", true).expect("provide host");
        let err = load(&mut interp, "sample").expect_err("host too new");
        assert_eq!(err.kind(), ErrorKind::ModuleLoad);
        assert!(!interp.has_command("sample_sub"));
        assert_eq!(interp.packages().present("Sample"), None);
    }

    #[test]
    fn loading_twice_is_a_no_op() {
        let mut interp = host(false);
        load(&mut interp, "sample").expect("first");
        load(&mut interp, "SAMPLE").expect("second");
        assert_eq!(interp.loaded_modules().len(), 1);
    }
}
