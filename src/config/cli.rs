use crate::config::{AppConfig, LogFormat, StoreBackend};
use crate::domain::model::{PoolId, ProductId, RequestId};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Parser)]
#[command(name = "group-pool")]
#[command(about = "Group-buy pools: products, time-boxed pools and buyer commitments")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// JSON data file; overrides the configured store with a file-backed one
    #[arg(long, global = true, env = "GROUP_POOL_DATA")]
    pub data_file: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage catalog products
    #[command(subcommand)]
    Product(ProductCommand),
    /// Manage group-buy pools
    #[command(subcommand)]
    Pool(PoolCommand),
    /// Submit and inspect buyer requests
    #[command(subcommand)]
    Request(RequestCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProductCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        unit_price: Decimal,
    },
    Update {
        id: ProductId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        unit_price: Option<Decimal>,
    },
    List,
    Show { id: ProductId },
    Delete { id: ProductId },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PoolCommand {
    Create(PoolCreateArgs),
    Update {
        id: PoolId,
        #[arg(long)]
        start_at: Option<DateTime<Utc>>,
        #[arg(long)]
        end_at: Option<DateTime<Utc>>,
        #[arg(long, allow_negative_numbers = true)]
        min_quantity: Option<i64>,
    },
    List {
        #[arg(long)]
        product: Option<ProductId>,
    },
    Show { id: PoolId },
    Delete { id: PoolId },
}

#[derive(Debug, Clone, Args)]
pub struct PoolCreateArgs {
    #[arg(long)]
    pub product: ProductId,
    /// RFC 3339 timestamp, e.g. 2025-06-01T09:00:00Z
    #[arg(long)]
    pub start_at: DateTime<Utc>,
    #[arg(long)]
    pub end_at: DateTime<Utc>,
    #[arg(long, allow_negative_numbers = true)]
    pub min_quantity: i64,
}

#[derive(Debug, Clone, Subcommand)]
pub enum RequestCommand {
    Submit {
        #[arg(long)]
        pool: PoolId,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        quantity: i64,
    },
    List {
        #[arg(long)]
        pool: PoolId,
    },
    Show {
        #[arg(long)]
        pool: PoolId,
        id: RequestId,
    },
}

impl CliConfig {
    /// 載入 TOML (若有) 並套用命令列覆蓋
    pub fn resolve_app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(data_file) = &self.data_file {
            config.store.backend = StoreBackend::File;
            config.store.path = Some(data_file.clone());
        }
        if self.verbose {
            config.logging.verbose = true;
        }
        if self.json_logs {
            config.logging.format = LogFormat::Json;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_submit_with_default_quantity() {
        let cli = CliConfig::parse_from([
            "group-pool",
            "request",
            "submit",
            "--pool",
            "3",
            "--email",
            "a@x.com",
        ]);

        match cli.command {
            Command::Request(RequestCommand::Submit { pool, email, quantity }) => {
                assert_eq!(pool, 3);
                assert_eq!(email, "a@x.com");
                assert_eq!(quantity, 1);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_data_file_overrides_store() {
        let cli = CliConfig::parse_from([
            "group-pool",
            "--data-file",
            "/tmp/pools.json",
            "--json-logs",
            "pool",
            "list",
        ]);

        let config = cli.resolve_app_config().unwrap();
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.path.as_deref(), Some("/tmp/pools.json"));
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_parse_pool_create_timestamps() {
        let cli = CliConfig::parse_from([
            "group-pool",
            "pool",
            "create",
            "--product",
            "1",
            "--start-at",
            "2025-06-01T09:00:00Z",
            "--end-at",
            "2025-06-08T09:00:00Z",
            "--min-quantity",
            "10",
        ]);

        match cli.command {
            Command::Pool(PoolCommand::Create(args)) => {
                assert_eq!(args.product, 1);
                assert!(args.end_at > args.start_at);
                assert_eq!(args.min_quantity, 10);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
