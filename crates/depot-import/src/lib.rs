//! Depot Import Library
//!
//! Replays the version history of an object held by a legacy repository:
//! each remote version is fetched with basic-auth credentials and written to
//! the content store with its original timestamp and label.

pub mod credentials;
pub mod fetch;
pub mod importer;

pub use credentials::resolve_credentials;
pub use fetch::{FetchError, HttpFetcher, RemoteFetcher};
pub use importer::{ImportReport, VersionImporter};
