//! # Tablero client
//!
//! HTTP access to the Tablero backend with permission-aware catalog loading.
//!
//! ```rust,no_run
//! use tb_client::AccessClient;
//! use tb_common::{ModuleName, PermissionAction};
//! use tb_access::CapabilityCheck;
//!
//! # async fn run() -> Result<(), tb_client::Error> {
//! let config = tb_config::AppConfig::default();
//! let access = AccessClient::from_config(&config)?;
//!
//! access.login("ana@example.com", "secret").await?;
//! access.load_catalog().await;
//!
//! if access.resolver().can(ModuleName::Inventory, PermissionAction::Write) {
//!     // show the "new item" action
//! }
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod modules;

pub use access::AccessClient;
pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use modules::ModulesApi;
