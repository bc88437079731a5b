//! MCP server exposing QWeather forecasts, city search, weather warnings and
//! life indices as tools. Every upstream request carries a freshly minted
//! EdDSA JWT.

pub mod auth;
pub mod config;
pub mod constants;
pub mod formatters;
pub mod models;
pub mod service;
pub mod tools;
pub mod validation;

pub use auth::{Credentials, SigningError};
pub use config::{Cli, Config};
pub use service::{QWeather, UpstreamError};
pub use tools::{ToolCall, ToolCatalog, ToolError};
pub use validation::{ArgumentSchema, SchemaError, ValidationError, Violation};
