//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Protocol-level validation, negotiation, formatting and routing, plus the
//! stdio transport.

pub mod rpc;
pub mod server;
pub mod stdio;
