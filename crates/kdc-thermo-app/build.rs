//! Copies `memory.x` next to the build output so the linker finds it from
//! inside the workspace, and stamps version strings into the binary.

use std::{env, fs, path::PathBuf, process::Command};

/// Board revision reported in the boot banner.
const HW_VERSION: &str = "r1";

fn linker_data() -> &'static [u8] {
    include_bytes!("memory.x")
}

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_owned())
}

fn main() {
    let out = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out.join("memory.x"), linker_data()).expect("write memory.x");
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    if env::var("CARGO_FEATURE_DEFMT").is_ok() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    let pkg_version = env!("CARGO_PKG_VERSION");
    let fw_version = match git_short_hash() {
        Some(hash) => format!("{pkg_version}-{hash}"),
        None => pkg_version.to_owned(),
    };
    println!("cargo:rustc-env=FW_VERSION={fw_version}");
    println!("cargo:rustc-env=HW_VERSION={HW_VERSION}");
}
