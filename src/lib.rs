//! # Enom Client Library
//!
//! An async client for the Enom reseller API.
//!
//! ## Features
//!
//! - Look up, check, register, renew and transfer domains
//! - Manage registrar lock, auto-renew, EPP codes and nameservers
//! - Registrable-domain splitting via the public suffix list
//! - Lazily fetched attributes, one round trip per operation
//! - Credentials from `~/.enomconfig`, `ENOM_*` variables or code
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use enom::{Client, Config, Domain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(&Config::load()?)?;
//!
//!     if Domain::available(&client, "example.com", None).await? {
//!         println!("example.com is available");
//!     }
//!
//!     let mut domain = Domain::find(&client, "mydomain.com", None).await?;
//!     println!("Expires: {}", domain.expiration_date());
//!     println!("Nameservers: {:?}", domain.nameservers().await?);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod domain;
pub mod errors;
pub mod parser;
pub mod response;
pub mod suffix;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export main types for easy access
pub use client::{Client, HttpTransport, Params, Transport};
pub use config::{Config, ConfigOverrides, ProxyConfig};
pub use domain::{
    Cached, Domain, RegisterOptions, RenewOptions, SuggestOptions, SyncAuthInfoOptions, TldList,
    TransferOptions,
};
pub use errors::EnomError;
pub use suffix::parse_sld_and_tld;
