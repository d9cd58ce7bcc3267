//! JSON-RPC Server
//!
//! Serves JSON-RPC 2.0 over HTTP on a TCP listener.

use crate::handler::RpcHandler;
use crate::types::{
    CreateRequest, EnqueueRequest, FlushRequest, ListRequest, QueueRef, SearchRequest,
    ShowRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use queuekeeper_core::application::QueueRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

// Localhost only by default (no external access)
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9640;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: RpcHandler,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, registry: Arc<QueueRegistry>) -> Self {
        Self {
            config,
            handler: RpcHandler::new(registry),
        }
    }

    /// Start the JSON-RPC server, returning the handle and the bound address
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = Self::build_module(self.handler)?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((handle, local_addr))
    }

    /// Register every method; the handler is the module context
    fn build_module(
        handler: RpcHandler,
    ) -> Result<RpcModule<RpcHandler>, String> {
        let mut module = RpcModule::new(handler);

        module.register_async_method("queue.create.v1", |params, handler, _| async move {
            let req: CreateRequest = params.parse()?;
            handler.create(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.delete.v1", |params, handler, _| async move {
            let req: QueueRef = params.parse()?;
            handler.delete(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.enqueue.v1", |params, handler, _| async move {
            let req: EnqueueRequest = params.parse()?;
            handler.enqueue(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.dequeue.v1", |params, handler, _| async move {
            let req: QueueRef = params.parse()?;
            handler.dequeue(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.front.v1", |params, handler, _| async move {
            let req: QueueRef = params.parse()?;
            handler.front(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.rear.v1", |params, handler, _| async move {
            let req: QueueRef = params.parse()?;
            handler.rear(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.search.v1", |params, handler, _| async move {
            let req: SearchRequest = params.parse()?;
            handler.search(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.clear.v1", |params, handler, _| async move {
            let req: QueueRef = params.parse()?;
            handler.clear(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.show.v1", |params, handler, _| async move {
            let req: ShowRequest = params.parse()?;
            handler.show(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.list.v1", |params, handler, _| async move {
            // Parameterless calls may omit params entirely
            let req = params.parse::<Option<ListRequest>>()?.unwrap_or_default();
            handler.list(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("queue.save.v1", |params, handler, _| async move {
            let req: QueueRef = params.parse()?;
            handler.save(req).await
        })
        .map_err(|e| e.to_string())?;

        module.register_async_method("admin.flush.v1", |params, handler, _| async move {
            let req = params.parse::<Option<FlushRequest>>()?.unwrap_or_default();
            handler.flush(req).await
        })
        .map_err(|e| e.to_string())?;

        Ok(module)
    }
}
