use std::fs::read_to_string;

use clap::Parser;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tx_runner::{RunnerConfiguration, TransactionRunner};

mod operations;

/// The database section of the configuration file
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseConfig {
    /// The filename of the sqlite database
    pub filename: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigFile {
    pub database: DatabaseConfig,
    #[serde(default = "RunnerConfiguration::new")]
    pub runner: RunnerConfiguration,
}

#[derive(Parser)]
struct Cli {
    /// Specify the configuration file
    config_file: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Enable the environment logger
    env_logger::init();

    // Get the config file from the CLI arguments
    let path = Cli::parse().config_file;

    // Read the config from a TOML file
    let conf_file: ConfigFile = toml::from_str(&read_to_string(&path)?)?;

    // A single connection is enough to run one transaction after another
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            SqliteConnectOptions::new()
                .create_if_missing(true)
                .filename(&conf_file.database.filename),
        )
        .await?;

    let runner = TransactionRunner::with_configuration(&pool, conf_file.runner);

    operations::operate(&pool, &runner).await
}
