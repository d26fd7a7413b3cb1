//! Request router. Dispatches JSON-RPC requests to services by namespace.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sbx_core::WorkspaceConfig;
use sbx_protocol::{HandlerResult, RpcError};
use sbx_services::Service;
use serde_json::Value;
use tracing::{debug, info};

use crate::stdio::RequestHandler;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Owns the services and routes requests to them.
pub struct SandboxServer {
    config: Arc<WorkspaceConfig>,
    /// Registered services (boxed for object safety)
    services: Vec<Box<dyn ServiceDyn>>,
    state: ServerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Uninitialized,
    Running,
    Shutdown,
}

/// Object-safe wrapper for the Service trait.
trait ServiceDyn: Send + Sync {
    fn namespace_dyn(&self) -> &str;
    fn handle_dyn<'a>(&'a self, method: &'a str, params: Option<Value>) -> BoxFuture<'a, HandlerResult>;
    fn init_dyn(&self) -> BoxFuture<'_, InitResult>;
    fn shutdown_dyn(&self) -> BoxFuture<'_, ()>;
}

impl<T: Service> ServiceDyn for T {
    fn namespace_dyn(&self) -> &str {
        self.namespace()
    }

    fn handle_dyn<'a>(&'a self, method: &'a str, params: Option<Value>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(self.handle(method, params))
    }

    fn init_dyn(&self) -> BoxFuture<'_, InitResult> {
        Box::pin(self.init())
    }

    fn shutdown_dyn(&self) -> BoxFuture<'_, ()> {
        Box::pin(self.shutdown())
    }
}

impl SandboxServer {
    pub fn new(config: Arc<WorkspaceConfig>) -> Self {
        Self {
            config,
            services: Vec::new(),
            state: ServerState::Uninitialized,
        }
    }

    /// Register a service with the server.
    pub fn register_service<S: Service + 'static>(&mut self, service: S) {
        info!("Registering service: {}", service.namespace());
        self.services.push(Box::new(service));
    }

    /// Initialize all services.
    pub async fn initialize(&mut self) -> InitResult {
        info!(
            "Initializing sandbox server: root={}, provider={}",
            self.config.base_root(),
            self.config.mode()
        );

        for service in &self.services {
            service.init_dyn().await?;
        }

        self.state = ServerState::Running;
        info!("Sandbox server initialized ({} services)", self.services.len());
        Ok(())
    }

    /// Shutdown all services. Calling it twice is a no-op.
    pub async fn shutdown(&mut self) {
        if self.state == ServerState::Shutdown {
            return;
        }

        info!("Shutting down sandbox server...");
        self.state = ServerState::Shutdown;

        for service in &self.services {
            service.shutdown_dyn().await;
        }

        info!("Sandbox server shutdown complete");
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.state == ServerState::Running
    }

    async fn route_request(&self, method: &str, params: Option<Value>) -> HandlerResult {
        let Some((namespace, _)) = method.split_once('/') else {
            return Err(RpcError::method_not_found(method));
        };

        match self.services.iter().find(|s| s.namespace_dyn() == namespace) {
            Some(service) => service.handle_dyn(method, params).await,
            None => Err(RpcError::method_not_found(method)),
        }
    }
}

impl RequestHandler for SandboxServer {
    async fn handle_request(&self, method: &str, params: Option<Value>) -> HandlerResult {
        match self.state {
            ServerState::Shutdown => return Err(RpcError::shutting_down()),
            ServerState::Uninitialized => return Err(RpcError::not_initialized()),
            ServerState::Running => {}
        }

        let result = self.route_request(method, params).await;
        if let Err(e) = &result {
            debug!("{method} failed: {e}");
        }
        result
    }
}
