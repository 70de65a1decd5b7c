//! Domain core of the gigboard marketplace: models, validation, the store
//! abstraction with its PostgreSQL and in-memory backends, and the services
//! that drive the proposal to contract lifecycle.

pub mod api;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod service;
pub mod store;

pub use error::MarketError;
pub use service::Services;
