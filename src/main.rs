use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use shopwatch::alerts::{FeedFilter, NotificationService, NotificationStore};
use shopwatch::alerts::store::{DEFAULT_CAPACITY, DEFAULT_DUPLICATE_WINDOW};
use shopwatch::cli::{self, Args};
use shopwatch::config::ConfigManager;
use shopwatch::email::LogMailer;
use shopwatch::logging::{self, LogConfig, LogDestination, LogFormat};
use shopwatch::scanner::{ConditionMonitor, InventorySource, MemoryInventory, ScanConfig};

fn main() {
    if let Err(e) = run() {
        error!("Application error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();
    cli::validate_args(&args)?;

    let config_manager = ConfigManager::load(args.config_file.as_deref())?;

    let log_config = configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    runtime.block_on(run_daemon(args, config_manager))
}

/// Merge logging settings: CLI flags win over the `[logging]` section.
fn configure_logging(args: &Args, config: &ConfigManager) -> Result<LogConfig> {
    let console_level = if args.debug {
        log::LevelFilter::Trace
    } else if args.verbose {
        log::LevelFilter::Debug
    } else if args.quiet {
        log::LevelFilter::Error
    } else {
        config
            .get_log_level("logging", "level")?
            .unwrap_or(log::LevelFilter::Info)
    };

    let format = args
        .log_format
        .parse::<LogFormat>()
        .map_err(|e| anyhow::anyhow!(e))?;

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.get_path("logging", "file"));
    let file_level = match &args.log_file_level {
        Some(level) => Some(logging::parse_log_level(level)?),
        None => config.get_log_level("logging", "file-level")?,
    };

    let destination = match log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Console,
    };

    Ok(LogConfig {
        console_level,
        file_level,
        format,
        destination,
    })
}

fn build_scan_config(args: &Args, config: &ConfigManager) -> Result<ScanConfig> {
    let mut scan_config = config.scan_config()?;
    if let Some(secs) = args.scan_interval {
        scan_config.interval = std::time::Duration::from_secs(secs);
    }
    if let Some(threshold) = args.low_stock_threshold {
        scan_config.low_stock_threshold = threshold;
    }
    if let Some(days) = args.expiry_warning_days {
        scan_config.expiry_warning_days = days;
    }
    scan_config.validate()?;
    Ok(scan_config)
}

fn load_inventory(args: &Args, config: &ConfigManager) -> Result<Arc<dyn InventorySource>> {
    let path = args
        .inventory
        .clone()
        .or_else(|| config.get_path("scanner", "inventory"));
    match path {
        Some(path) => {
            let inventory = MemoryInventory::load(&path)?;
            info!(
                "watching {} products from {}",
                inventory.product_count(),
                path.display()
            );
            Ok(Arc::new(inventory))
        }
        None => {
            warn!("no inventory file given, starting with an empty inventory");
            Ok(Arc::new(MemoryInventory::new(Vec::new())))
        }
    }
}

async fn run_daemon(args: Args, config_manager: ConfigManager) -> Result<()> {
    let scan_config = build_scan_config(&args, &config_manager)?;
    let inventory = load_inventory(&args, &config_manager)?;

    let capacity = args
        .capacity
        .map(Ok)
        .or_else(|| config_manager.alert_capacity().transpose())
        .transpose()?
        .unwrap_or(DEFAULT_CAPACITY);
    let duplicate_window = config_manager
        .duplicate_window()?
        .unwrap_or(DEFAULT_DUPLICATE_WINDOW);

    let store = NotificationStore::with_capacity(capacity, duplicate_window);
    let service = Arc::new(NotificationService::with_store(
        store,
        Arc::new(LogMailer),
    ));
    let monitor = ConditionMonitor::new(Arc::clone(&service), inventory, scan_config);

    if args.once {
        monitor.scan_once().await?;
        for record in service.list(FeedFilter::All).await {
            let line = serde_json::to_string(&record)?;
            println!("{}", line);
        }
        service.shutdown().await;
        return Ok(());
    }

    // Live feed to stdout, one JSON event per line
    let (subscriber_id, mut feed) = service.subscribe().await;
    let printer = tokio::spawn(async move {
        while let Some(event) = feed.next().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(error) => warn!("failed to serialize feed event: {}", error),
            }
        }
    });

    let cancel = CancellationToken::new();
    let scanner_handle = monitor.spawn(cancel.clone());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");

    cancel.cancel();
    scanner_handle.await.ok();

    service.unsubscribe(subscriber_id).await.ok();
    service.shutdown().await;
    printer.await.ok();

    let stats = service.delivery_stats().await;
    info!(
        "feed delivery: {} published, {} delivered, {} dropped",
        stats.events_published, stats.events_delivered, stats.events_dropped
    );
    Ok(())
}
