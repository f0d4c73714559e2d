//! Compiler driver command lines.

use std::ffi::OsString;
use std::path::Path;

use crate::context::BuildContext;
use crate::probe::ProbeDefinition;

/// Arguments for compiling (and optionally linking) one translation unit.
///
/// Paths are relative to the scratch directory the driver runs in:
/// `[-c] -o <out> -I<dir>... <flags>... <source>`.
pub fn driver_args(def: &ProbeDefinition, ctx: &BuildContext, source_file: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    if !def.link_required() {
        args.push("-c".into());
    }
    args.push("-o".into());
    args.push(output_name(def).into());

    for dir in ctx.include_dirs() {
        args.push(include_arg(dir));
    }
    for flag in ctx.flags() {
        args.push(flag.into());
    }

    args.push(source_file.into());
    args
}

/// Name of the artifact the driver writes.
pub fn output_name(def: &ProbeDefinition) -> String {
    if def.link_required() {
        def.name().to_string()
    } else {
        format!("{}.o", def.name())
    }
}

/// The driver runs inside the scratch directory, so relative include
/// directories are anchored to the caller's working directory first.
fn include_arg(dir: &Path) -> OsString {
    let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    let mut arg = OsString::from("-I");
    arg.push(dir.as_os_str());
    arg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(link: bool) -> ProbeDefinition {
        ProbeDefinition::builder("probe", "int x;")
            .link_required(link)
            .build()
            .unwrap()
    }

    #[test]
    fn compile_only_uses_dash_c() {
        let ctx = BuildContext::new("cc")
            .with_include_dir("/kernel/include")
            .with_include_dir("/kernel/arch/x86/include")
            .with_flags(["-D__KERNEL__", "-Wall"]);

        let args = driver_args(&def(false), &ctx, "probe.c");
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "-c",
                "-o",
                "probe.o",
                "-I/kernel/include",
                "-I/kernel/arch/x86/include",
                "-D__KERNEL__",
                "-Wall",
                "probe.c"
            ]
        );
    }

    #[test]
    fn link_required_produces_executable() {
        let ctx = BuildContext::new("cc");
        let args = driver_args(&def(true), &ctx, "probe.c");
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["-o", "probe", "probe.c"]);
        assert_eq!(output_name(&def(true)), "probe");
    }
}
