//! # twitch-kraken - minimal client for the Twitch Kraken REST API
//!
//! Builds a single GET request from a resource path and a set of options,
//! and hands back the status code and body.
//!
//! ## Features
//!
//! - `:token` substitution in resource paths (`/streams/:channel`)
//! - Query parameter serialization
//! - Versioned `Accept`, `Client-ID` and `Authorization: OAuth` headers
//! - JSON or raw response bodies
//! - Blocking calls, callback-style background calls, and an async client
//!   behind the `async` feature
//!
//! ## Basic Usage
//!
//! ```no_run
//! use twitch_kraken::{Options, TwitchApi};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = TwitchApi::new()?.with_client_id("my-client-id");
//!
//!     let response = api.request(
//!         "/streams/:channel",
//!         &Options::new().replace("channel", "test_user").param("limit", 5),
//!     )?;
//!
//!     println!("Status: {}", response.status);
//!     println!("Game: {:?}", response.get_string("stream/game"));
//!     Ok(())
//! }
//! ```
//!
//! ## Callback Usage
//!
//! ```no_run
//! use twitch_kraken::{Options, TwitchApi};
//!
//! let api = TwitchApi::new()?;
//! api.api(
//!     "/streams/featured",
//!     Options::new().param("limit", 5),
//!     |result| match result {
//!         Ok(response) => println!("{}: {:?}", response.status, response.body),
//!         Err(error) => eprintln!("{}", error),
//!     },
//! );
//! # Ok::<(), twitch_kraken::ApiError>(())
//! ```

pub mod client;
pub mod error;
#[cfg(feature = "async")]
pub mod nonblocking;
pub mod response;
pub mod rest;

// Re-export main types for convenience
pub use client::{Config, Options, Params, Replacements};
pub use error::{ApiError, Result};
#[cfg(feature = "async")]
pub use nonblocking::AsyncTwitchApi;
pub use response::{ApiResponse, Body};
pub use rest::{request, TwitchApi};

// Re-export serde_json for convenience
pub use serde_json::json;
