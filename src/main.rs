use anyhow::Context;
use clap::Parser;
use group_pool::config::cli::{Command, PoolCommand, ProductCommand, RequestCommand};
use group_pool::config::{LogFormat, StoreBackend};
use group_pool::utils::{logger, validation::Validate};
use group_pool::{
    CliConfig, ErrorKind, NewPool, NewProduct, NewRequest, PoolPatch, PoolService, ProductPatch,
};
use serde_json::{json, Value};

fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Validation | ErrorKind::Config => 1,
        ErrorKind::NotFound => 2,
        ErrorKind::PoolClosed => 3,
        ErrorKind::DuplicateCommitment => 4,
        ErrorKind::Storage => 5,
    }
}

fn fail(err: group_pool::PoolError) -> ! {
    tracing::error!("❌ {} (kind: {:?})", err, err.kind());
    eprintln!("❌ {}", err.user_friendly_message());
    std::process::exit(exit_code(err.kind()));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve_app_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(exit_code(e.kind()));
        }
    };

    // 初始化日誌
    match config.logging.format {
        LogFormat::Compact => logger::init_cli_logger(config.logging.verbose),
        LogFormat::Json => logger::init_json_logger(config.logging.verbose),
    }

    tracing::debug!("Resolved config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(e);
    }

    if config.store.backend == StoreBackend::Memory {
        tracing::warn!("💡 Using the in-memory store; nothing is kept after this command");
    }

    let service = match PoolService::from_config(&config).await {
        Ok(service) => service,
        Err(e) => fail(e),
    };

    let output = match run(&service, cli.command).await {
        Ok(output) => output,
        Err(e) => fail(e),
    };

    let rendered = serde_json::to_string_pretty(&output).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

async fn run(service: &PoolService, command: Command) -> group_pool::Result<Value> {
    let output = match command {
        Command::Product(command) => run_product(service, command).await?,
        Command::Pool(command) => run_pool(service, command).await?,
        Command::Request(command) => run_request(service, command).await?,
    };
    Ok(output)
}

async fn run_product(service: &PoolService, command: ProductCommand) -> group_pool::Result<Value> {
    let catalog = service.catalog();
    let output = match command {
        ProductCommand::Create {
            name,
            description,
            unit_price,
        } => serde_json::to_value(
            catalog
                .create_product(NewProduct {
                    name,
                    description,
                    unit_price,
                })
                .await?,
        )?,
        ProductCommand::Update {
            id,
            name,
            description,
            unit_price,
        } => serde_json::to_value(
            catalog
                .update_product(
                    id,
                    ProductPatch {
                        name,
                        description,
                        unit_price,
                    },
                )
                .await?,
        )?,
        ProductCommand::List => serde_json::to_value(catalog.list_products().await?)?,
        ProductCommand::Show { id } => serde_json::to_value(catalog.get_product(id).await?)?,
        ProductCommand::Delete { id } => {
            catalog.delete_product(id).await?;
            json!({ "deleted": id })
        }
    };
    Ok(output)
}

async fn run_pool(service: &PoolService, command: PoolCommand) -> group_pool::Result<Value> {
    let output = match command {
        PoolCommand::Create(args) => serde_json::to_value(
            service
                .create_pool(NewPool {
                    product_id: args.product,
                    start_at: args.start_at,
                    end_at: args.end_at,
                    min_quantity: args.min_quantity,
                })
                .await?,
        )?,
        PoolCommand::Update {
            id,
            start_at,
            end_at,
            min_quantity,
        } => {
            service
                .ledger()
                .update_pool(
                    id,
                    PoolPatch {
                        start_at,
                        end_at,
                        min_quantity,
                    },
                )
                .await?;
            serde_json::to_value(service.get_pool(id).await?)?
        }
        PoolCommand::List { product } => serde_json::to_value(service.list_pools(product).await?)?,
        PoolCommand::Show { id } => serde_json::to_value(service.get_pool(id).await?)?,
        PoolCommand::Delete { id } => {
            service.ledger().delete_pool(id).await?;
            json!({ "deleted": id })
        }
    };
    Ok(output)
}

async fn run_request(service: &PoolService, command: RequestCommand) -> group_pool::Result<Value> {
    let output = match command {
        RequestCommand::Submit {
            pool,
            email,
            quantity,
        } => serde_json::to_value(
            service
                .submit_request(NewRequest::new(pool, email).with_quantity(quantity))
                .await?,
        )?,
        RequestCommand::List { pool } => {
            let mut listing = service.list_requests(pool).await?;
            serde_json::to_value(listing.collect_all().await?)?
        }
        RequestCommand::Show { pool, id } => {
            serde_json::to_value(service.registry().get_request(pool, id).await?)?
        }
    };
    Ok(output)
}
