//! cnd-sync library
//!
//! This crate provides the core functionality for the `cnd-sync` binary, which
//! downloads tax-clearance certificates (CNDs) for a roster of CNPJs from an
//! accounting platform API and files them into a folder tree.
//!
//! ## Overview
//!
//! - [`sanitizer`] - Turns arbitrary labels into filesystem-safe path segments
//! - [`store`] - CNPJ list and download ledger persistence
//! - [`client`] - HTTP calls to the platform (contacts, certificate listing, file download)
//! - [`sync`] - Reconciles the CNPJ list with the platform's contact roster
//! - [`scan`] - Walks CNPJ × year × month and downloads certificates not yet in the ledger
//! - [`pacing`] - Fixed delays between remote calls
//! - [`cli`] - Command-line entry points
//! - [`config`], [`models`], [`errors`] - Configuration, data types and error types
//!
//! ## Example Usage
//!
//! ```no_run
//! use cnd_sync::{client::ApiClient, config::ResolvedConfig, scan::Scanner, sync};
//!
//! # async fn example() -> cnd_sync::errors::AppResult<()> {
//! let config = ResolvedConfig::default().with_env_overrides();
//! config.validate()?;
//!
//! let client = ApiClient::new(&config)?;
//! sync::sync_cnpj_list(&client, &config.cnpj_list_path).await;
//! let summary = Scanner::new(&client, &config).run().await;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod pacing;
pub mod sanitizer;
pub mod scan;
pub mod store;
pub mod sync;
pub mod utils;
