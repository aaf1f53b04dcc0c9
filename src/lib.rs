//! shopwatch - Retail Operations Alerting
//!
//! An in-memory alerting engine for a retail and store-credit back office.
//! Business events (purchases, credit changes) and scanner-detected
//! conditions (low stock, approaching expiry) become notification records
//! in a bounded store; repeat conditions coalesce into their active record
//! instead of piling up, and every change is fanned out live to feed
//! subscribers. An optional email side-channel notifies members without
//! ever blocking or failing the engine.

pub mod alerts;
pub mod cli;
pub mod config;
pub mod email;
pub mod logging;
pub mod scanner;
