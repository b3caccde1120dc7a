mod build;
mod cli;
mod constants;
mod flash;
mod rtt;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Build { features, release } => {
            println!("Building firmware...");
            build::build_firmware(features.as_deref(), *release)?;
            println!("Build complete!");
        }
        Commands::Flash { features, release, force } => {
            flash::flash_firmware(features.as_deref(), *release, *force)?;
        }
        Commands::Run { features, release } => {
            let features = with_defmt(features.as_deref());
            flash::flash_firmware(Some(&features), *release, false)?;

            println!("Attaching RTT...");
            rtt::run(&constants::app_elf(*release))?;
        }
        Commands::Attach { release } => {
            rtt::run(&constants::app_elf(*release))?;
        }
    }

    Ok(())
}

/// RTT logs only exist with the `defmt` feature, so `run` always adds it.
fn with_defmt(features: Option<&str>) -> String {
    match features {
        Some(f) if f.split(',').any(|f| f.trim() == "defmt") => f.to_owned(),
        Some(f) if !f.trim().is_empty() => format!("{f},defmt"),
        _ => "defmt".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defmt_is_added_once() {
        assert_eq!(with_defmt(None), "defmt");
        assert_eq!(with_defmt(Some("")), "defmt");
        assert_eq!(with_defmt(Some("defmt")), "defmt");
        assert_eq!(with_defmt(Some("foo")), "foo,defmt");
        assert_eq!(with_defmt(Some("foo, defmt")), "foo, defmt");
    }

    #[test]
    fn elf_path_follows_profile() {
        assert_eq!(
            constants::app_elf(true),
            "target/thumbv7em-none-eabihf/release/kdc-thermo-app"
        );
        assert_eq!(
            constants::app_elf(false),
            "target/thumbv7em-none-eabihf/debug/kdc-thermo-app"
        );
    }
}
