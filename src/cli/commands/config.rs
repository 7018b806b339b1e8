use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration
    Show,

    /// Write a default config file
    Init,

    /// Print the config file path
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Show => {
            let mut config = Config::load()?;
            // Secrets stay out of display output
            config.embedding.api_key = config.embedding.api_key.map(|k| mask_key(&k));
            config.vector_store.api_key = config.vector_store.api_key.map(|k| mask_key(&k));
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                OutputFormat::Text => print!("{}", toml::to_string_pretty(&config)?),
            }
        }
        ConfigCommand::Init => {
            let path = Config::config_path()
                .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
            if path.exists() {
                println!(
                    "{}",
                    formatter.format_message(&format!(
                        "Config already exists at {}",
                        path.display()
                    ))
                );
                return Ok(());
            }
            Config::default().save()?;
            println!(
                "{}",
                formatter.format_message(&format!("Config written to {}", path.display()))
            );
        }
        ConfigCommand::Path => match Config::config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", formatter.format_error("no config directory available")),
        },
    }

    Ok(())
}

fn mask_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}****")
}
