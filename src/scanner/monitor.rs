//! Condition Monitor
//!
//! The recurring job that turns inventory snapshots into notification
//! conditions: low stock, replenishment, approaching expiry and expiry
//! itself. One scan runs at startup, then one per interval. Ticks execute
//! inline in the loop, so two scans can never overlap; a missed tick is
//! skipped rather than queued. A failed inventory read logs a warning and
//! skips the tick without stopping the scheduler.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::alerts::{EmitRequest, NotificationData, NotificationKind, NotificationService, SubjectKey};
use crate::scanner::config::ScanConfig;
use crate::scanner::error::ScanResult;
use crate::scanner::inventory::{InventorySource, Product};

/// Periodic inventory condition scanner
pub struct ConditionMonitor {
    service: Arc<NotificationService>,
    inventory: Arc<dyn InventorySource>,
    config: ScanConfig,
}

impl ConditionMonitor {
    pub fn new(
        service: Arc<NotificationService>,
        inventory: Arc<dyn InventorySource>,
        config: ScanConfig,
    ) -> Self {
        Self {
            service,
            inventory,
            config,
        }
    }

    /// Run until cancelled. The first tick fires immediately.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "condition scanner started (interval {:?}, low-stock threshold {}, expiry window {} days)",
            self.config.interval, self.config.low_stock_threshold, self.config.expiry_warning_days
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("condition scanner stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(error) = self.scan_once().await {
                        warn!("inventory scan failed, skipping tick: {}", error);
                    }
                }
            }
        }
    }

    /// Spawn the scan loop as a background task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Run a single scan over the current inventory snapshot
    pub async fn scan_once(&self) -> ScanResult<()> {
        let products = self.inventory.list_active_products().await?;
        let today = Utc::now().date_naive();
        debug!("scanning {} active products", products.len());

        for product in &products {
            self.check_stock(product).await;
            self.check_expiry(product, today).await;
        }
        Ok(())
    }

    async fn check_stock(&self, product: &Product) {
        if product.stock <= self.config.low_stock_threshold {
            self.service
                .emit(
                    EmitRequest::new(
                        "Low Stock Alert",
                        format!(
                            "{} is running low: {} left in stock",
                            product.name, product.stock
                        ),
                        NotificationData::LowStock {
                            product_id: product.id.clone(),
                            product_name: product.name.clone(),
                            current_stock: product.stock,
                        },
                    ),
                    None,
                )
                .await;
        } else {
            // No-op unless a low-stock record is currently active
            self.service
                .clear(
                    NotificationKind::LowStock,
                    &SubjectKey::Product(product.id.clone()),
                    "Stock Replenished",
                    format!(
                        "{} is back above the low-stock threshold: {} in stock",
                        product.name, product.stock
                    ),
                    Some(NotificationData::LowStock {
                        product_id: product.id.clone(),
                        product_name: product.name.clone(),
                        current_stock: product.stock,
                    }),
                )
                .await;
        }
    }

    async fn check_expiry(&self, product: &Product, today: NaiveDate) {
        let Some(expiry_date) = product.expiry_date else {
            return;
        };

        if expiry_date < today {
            // Past expiry: an open warning becomes an "expired" terminal
            // record; nothing to do if no warning was active
            self.service
                .clear(
                    NotificationKind::ExpiryWarning,
                    &SubjectKey::Product(product.id.clone()),
                    "Product Expired",
                    format!("{} expired on {}", product.name, expiry_date),
                    Some(NotificationData::ExpiryWarning {
                        product_id: product.id.clone(),
                        product_name: product.name.clone(),
                        expiry_date,
                    }),
                )
                .await;
            return;
        }

        let days_left = (expiry_date - today).num_days();
        if days_left <= self.config.expiry_warning_days {
            self.service
                .emit(
                    EmitRequest::new(
                        "Expiry Warning",
                        format!(
                            "{} expires on {} ({} days left)",
                            product.name, expiry_date, days_left
                        ),
                        NotificationData::ExpiryWarning {
                            product_id: product.id.clone(),
                            product_name: product.name.clone(),
                            expiry_date,
                        },
                    ),
                    None,
                )
                .await;
        }
    }
}
