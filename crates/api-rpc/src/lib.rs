//! JSON-RPC API Layer
//!
//! Exposes every QueueRegistry operation as a versioned JSON-RPC 2.0 method.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
