#![forbid(unsafe_code)]

//! Download subsets of satellite ocean products from ERDDAP `griddap` servers.
//!
//! A product code (`sst`, `chl1d`, `dhw`, `par8d`, `ssc1m`, ...) is looked up
//! in a [`Catalog`] to find its dataset and variables. The request bounds are
//! rendered as ERDDAP bracket selectors, percent-encoded once and appended to
//! every variable, and the resulting URL is fetched with a single blocking GET.
//!
//! **Single product**
//! ```no_run
//! use erddap_harvest::{Client, ClientOptions, Output, Request};
//!
//! let client = Client::new(ClientOptions::default())?;
//! let req = Request::point("mursst", "10.5", "-64.2", "2020-01-01", Some("2020-01-31".into()))
//!     .target("SSToutput.csv");
//! let outcome = client.retrieve(&req, Output::Download)?;
//! if outcome.is_success() {
//!     println!("Results written to SSToutput.csv");
//! }
//! # Ok::<(), erddap_harvest::Error>(())
//! ```
//!
//! **Batch**
//! ```no_run
//! use std::path::Path;
//! use erddap_harvest::{Client, Range, Request};
//!
//! let client = Client::default_client()?;
//! let req = Request::batch(
//!     vec!["sst".into(), "chl8d".into()],
//!     Range::new("10", "12"),
//!     Range::new("-65", "-63"),
//!     Range::new("2020-01-01", "2020-01-31"),
//! );
//! for outcome in client.batch(&req, "satprod", Path::new(".")) {
//!     match outcome.result {
//!         Ok(_) => println!("{}", outcome.product),
//!         Err(e) => println!("FAILED {}: {e}", outcome.product),
//!     }
//! }
//! # Ok::<(), erddap_harvest::Error>(())
//! ```
//!
//! Tests and tools that must not touch the network can build a client with
//! [`Client::with_transport`] and their own [`Transport`].

mod client;
mod error;
mod fetch;
mod query;
mod request;
mod transport;

pub mod catalog;
pub mod range;
pub mod resolver;

pub use crate::catalog::{Catalog, CatalogVersion, Format, Product};
pub use crate::client::{Client, ClientOptions};
pub use crate::error::{Error, Result};
pub use crate::fetch::{Outcome, Output, Payload, Saved, Table};
pub use crate::query::{assemble, build_url, constraint, encode};
pub use crate::range::Range;
pub use crate::request::{Request, Selection};
pub use crate::transport::{HttpTransport, Transport};
