pub const TARGET: &str = "thumbv7em-none-eabihf";
pub const CHIP: &str = "nRF52840_xxAA";

pub const APP_MANIFEST: &str = "crates/kdc-thermo-app/Cargo.toml";
pub const APP_BIN: &str = "kdc-thermo-app";

/// Path of the firmware ELF for the given profile.
pub fn app_elf(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{TARGET}/{profile}/{APP_BIN}")
}
