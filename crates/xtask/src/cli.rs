use clap::{Parser, Subcommand};

/// Build, flash and monitor the kdc-thermo beacon (nRF52840).
///
/// The firmware has no bootloader: `flash` writes the application image
/// straight to the chip with probe-rs.
#[derive(Parser)]
#[command(name = "xtask", version, about, long_about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cross-compile kdc-thermo-app for thumbv7em-none-eabihf
    Build {
        /// Comma-separated app features; `defmt` turns on RTT logging
        #[arg(long, value_name = "LIST")]
        features: Option<String>,

        /// Use the release profile
        #[arg(long)]
        release: bool,
    },
    /// Build, then write the app to the nRF52840 with probe-rs
    Flash {
        /// Comma-separated app features
        #[arg(long, value_name = "LIST")]
        features: Option<String>,

        /// Use the release profile
        #[arg(long)]
        release: bool,

        /// Erase the whole chip before writing, e.g. after another image
        #[arg(long)]
        force: bool,
    },
    /// Flash with `defmt` always enabled, then stream the sensor and
    /// advertising logs over RTT
    Run {
        /// Extra app features; `defmt` is added when missing
        #[arg(long, value_name = "LIST")]
        features: Option<String>,

        /// Use the release profile
        #[arg(long)]
        release: bool,
    },
    /// Stream RTT logs from a running beacon without reflashing
    Attach {
        /// Read defmt symbols from the release ELF
        #[arg(long)]
        release: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_takes_features_and_profile() {
        let cli =
            Cli::try_parse_from(["xtask", "run", "--features", "foo", "--release"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run { features: Some(ref f), release: true } if f == "foo"
        ));
    }

    #[test]
    fn attach_rejects_features() {
        assert!(Cli::try_parse_from(["xtask", "attach", "--features", "defmt"]).is_err());
    }
}
