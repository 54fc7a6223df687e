// Builtin commands: list, package, load.
use std::cmp::Ordering;

use crate::core::error::{Error, ErrorKind};
use crate::core::version::{vcompare, vsatisfies};
use crate::module;
use crate::stubs::ClientData;

use super::{Interp, Value, format_list};

const PACKAGE_OPTIONS: &str = "forget, names, present, provide, require, vcompare, or vsatisfies";

pub(super) fn register(interp: &mut Interp) {
    interp.create_command("list", list_cmd, None, None);
    interp.create_command("package", package_cmd, None, None);
    interp.create_command("load", load_cmd, None, None);
}

fn list_cmd(_data: &ClientData, interp: &mut Interp, args: &[Value]) -> Result<(), Error> {
    let list = format_list(args[1..].iter().map(Value::as_str));
    interp.set_result(Value::from(list));
    Ok(())
}

/// `load fileName ?prefix?`; only statically linked modules are available, so an
/// empty file name with an explicit prefix is the usual form.
fn load_cmd(_data: &ClientData, interp: &mut Interp, args: &[Value]) -> Result<(), Error> {
    let prefix = match args {
        [_, file] => module::prefix_from_file_name(file.as_str()).ok_or_else(|| {
            Error::new(ErrorKind::ModuleLoad).with_message(format!(
                "couldn't figure out module prefix for {file}"
            ))
        })?,
        [_, _, prefix] => prefix.as_str().to_string(),
        _ => return Err(interp.wrong_num_args(1, args, "fileName ?prefix?")),
    };
    module::load(interp, &prefix)
}

fn package_cmd(_data: &ClientData, interp: &mut Interp, args: &[Value]) -> Result<(), Error> {
    let Some(option) = args.get(1) else {
        return Err(interp.wrong_num_args(1, args, "option ?arg ...?"));
    };
    match option.as_str() {
        "provide" => match args.len() {
            3 => {
                let present = Value::from(interp.packages().present(args[2].as_str()).unwrap_or(""));
                interp.set_result(present);
                Ok(())
            }
            4 => interp.pkg_provide(args[2].as_str(), args[3].as_str(), None),
            _ => Err(interp.wrong_num_args(2, args, "package ?version?")),
        },
        "require" => {
            let (exact, name, spec) = requirement_args(interp, args)?;
            let provided = interp.pkg_require(name, spec, exact)?;
            interp.set_result(Value::from(provided.version));
            Ok(())
        }
        "present" => {
            let (exact, name, spec) = requirement_args(interp, args)?;
            if interp.packages().present(name).is_none() {
                return Err(Error::new(ErrorKind::PackageNotFound)
                    .with_message(format!("package {name} is not present"))
                    .with_package(name));
            }
            let provided = interp.pkg_require(name, spec, exact)?;
            interp.set_result(Value::from(provided.version));
            Ok(())
        }
        "names" => {
            if args.len() != 2 {
                return Err(interp.wrong_num_args(2, args, ""));
            }
            let names = format_list(interp.packages().names());
            interp.set_result(Value::from(names));
            Ok(())
        }
        "forget" => {
            for name in &args[2..] {
                interp.packages_mut().forget(name.as_str());
            }
            Ok(())
        }
        "vcompare" => {
            if args.len() != 4 {
                return Err(interp.wrong_num_args(2, args, "version1 version2"));
            }
            let order = match vcompare(args[2].as_str(), args[3].as_str())? {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            };
            interp.set_result(Value::from(order));
            Ok(())
        }
        "vsatisfies" => {
            if args.len() != 4 {
                return Err(interp.wrong_num_args(2, args, "version requirement"));
            }
            let ok = vsatisfies(args[2].as_str(), args[3].as_str(), false)?;
            interp.set_result(Value::from(i64::from(ok)));
            Ok(())
        }
        other => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("bad option \"{other}\": must be {PACKAGE_OPTIONS}"))),
    }
}

/// Parses `?-exact? package ?spec?` starting at `args[2]`.
fn requirement_args<'a>(
    interp: &Interp,
    args: &'a [Value],
) -> Result<(bool, &'a str, &'a str), Error> {
    let exact = args.get(2).is_some_and(|arg| arg.as_str() == "-exact");
    let rest = if exact { &args[3..] } else { &args[2..] };
    match rest {
        [name] => Ok((exact, name.as_str(), "")),
        [name, spec] => Ok((exact, name.as_str(), spec.as_str())),
        _ => Err(interp.wrong_num_args(2, args, "?-exact? package ?version?")),
    }
}
