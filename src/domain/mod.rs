//! Domain logic for OpenCRAVAT variant annotation
//!
//! Query construction, store document projections and the tool/resource
//! integrations exposed over MCP.

pub mod annotators;
pub mod hgvs;
pub mod metadata;
pub mod query;
pub mod resources;
pub mod tools;
