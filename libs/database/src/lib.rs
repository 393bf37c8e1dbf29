//! Database connectors for the workspace.
//!
//! Only MongoDB is wired up; the connector fails fast instead of retrying so a
//! service with an unreachable store exits at startup.
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB support
//! - `config` (default) - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config};
//! use core_config::FromEnv;
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_from_config(&config).await?;
//! let products = client.database(&config.database).collection::<Document>("products");
//! ```

#[cfg(feature = "mongodb")]
pub mod mongodb;
