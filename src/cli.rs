//! This module contains the command-line interface [`Cli`] parser for the attendance server.

use clap::{Parser, Subcommand};
use ::config::ConfigError;

use crate::config::Settings;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(name = "class-attendance", about = "Student attendance backend")]
pub struct Cli {
    /// Path of the config file, without its extension.
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Address to listen on, overriding the config file.
    #[arg(long)]
    pub listen: Option<String>,

    /// SQLite database to use, overriding the config file.
    #[arg(long)]
    pub database_url: Option<String>,

    /// What to do. Defaults to serving the HTTP API.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API.
    Serve,

    /// Print the attendance report for a month (the current month if none is given).
    Report {
        #[arg(requires = "month")]
        year: Option<i32>,
        month: Option<u32>,
    },
}

impl Cli {
    /// Loads the settings from the config file and environment, then applies the flags on top.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let mut settings = Settings::load(&self.config)?;

        if let Some(listen) = &self.listen {
            settings.listen = listen.clone();
        }
        if let Some(database_url) = &self.database_url {
            settings.database_url = database_url.clone();
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_no_subcommand() {
        let cli = Cli::parse_from(["class-attendance"]);
        assert_eq!(cli.config, "config");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::parse_from([
            "class-attendance",
            "--config",
            "does-not-exist/config",
            "--listen",
            "127.0.0.1:8080",
            "--database-url",
            "test.db",
        ]);

        let settings = cli.settings().unwrap();
        assert_eq!(settings.listen, "127.0.0.1:8080");
        assert_eq!(settings.database_url, "test.db");
    }

    #[test]
    fn report_takes_year_and_month() {
        let cli = Cli::parse_from(["class-attendance", "report", "2025", "9"]);
        assert_eq!(
            cli.command,
            Some(Command::Report {
                year: Some(2025),
                month: Some(9),
            })
        );

        assert!(Cli::try_parse_from(["class-attendance", "report", "2025"]).is_err());
    }
}
