use std::path::Path;

use clap::Subcommand;
use peakhour_core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Dot-separated key (e.g. source.table)
        key: String,
    },
    /// Set a config value
    Set {
        /// Dot-separated key
        key: String,
        /// New value
        value: String,
    },
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(
    action: ConfigAction,
    config: Config,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(val) => println!("{val}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            let mut config = config;
            config.set(&key, &value)?;
            config.save_to(path)?;
            println!("{key} = {value}");
        }
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )
                .into());
            }
            Config::default().save_to(path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
