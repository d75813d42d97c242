// File: donutwatch-core/src/lib.rs

pub mod error;
pub mod config;
pub mod catalog;
pub mod models;
pub mod http;
pub mod client;
pub mod normalize;
pub mod auth;
pub mod eventbus;
pub mod coordinator;
pub mod registry;
pub mod sensors;
pub mod test_utils;

pub use client::{DonutClient, EndpointKind};
pub use config::{AuthScheme, Config};
pub use coordinator::PollCoordinator;
pub use error::{Error, FailureKind, FailureRecord, FetchError, ValidationError};
pub use eventbus::{EventBus, PollEvent};
pub use http::{DefaultHttpClient, HttpClient};
pub use models::{Credentials, MetricValue, Snapshot};
pub use registry::{PlayerSession, SessionRegistry};
