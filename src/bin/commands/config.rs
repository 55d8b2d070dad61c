use anyhow::Result;
use clap::Args;
use school_reviews::{format_size, get_database_info, DatabaseInfo, OutputFormat, ReviewsConfig};
use serde::Serialize;

use super::print_json;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Show the full configuration, not just the database
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    config_file: String,
    data_dir: String,
    busy_timeout_secs: u64,
    share_read_lock: bool,
    seed_sample_data: bool,
    address: String,
    port: u16,
    database: DatabaseInfo,
}

pub fn run(config: &ReviewsConfig, args: ConfigArgs, output_format: OutputFormat) -> Result<()> {
    let ConfigArgs { verbose } = args;
    let database = get_database_info(config);

    if output_format.is_json() {
        let info = ConfigInfo {
            config_file: ReviewsConfig::config_file_path(),
            data_dir: config.data_dir.clone(),
            busy_timeout_secs: config.busy_timeout_secs,
            share_read_lock: config.share_read_lock,
            seed_sample_data: config.seed_sample_data,
            address: config.address.clone(),
            port: config.port,
            database,
        };
        return print_json(&info, output_format);
    }

    if verbose {
        println!("Config File:        {}", ReviewsConfig::config_file_path());
        println!("{}", config.summary());
    } else {
        println!("Database Path:      {}", database.path);
    }
    println!(
        "Database File:      {}",
        match database.size_bytes {
            Some(size) => format!("exists ({})", format_size(size)),
            None if database.exists => "exists".to_string(),
            None => "not created yet".to_string(),
        }
    );
    println!("Schema:             {}", database.schema_status);
    if let Some(count) = database.review_count {
        println!("Reviews:            {}", count);
    }
    Ok(())
}
