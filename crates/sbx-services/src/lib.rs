//! Sandbox services
//!
//! The filesystem collaborator interface sandbox providers implement, a
//! local implementation of it, and the JSON-RPC services that expose the
//! path layer. Each service handles one namespace of methods and is
//! registered with the router, which dispatches by method prefix.

pub mod file;
pub mod fs;
pub mod params;
pub mod workspace;

use sbx_protocol::HandlerResult;

/// Trait implemented by all services.
///
/// Each service handles a namespace of methods (e.g., "workspace/*", "file/*").
pub trait Service: Send + Sync {
    /// The namespace prefix this service handles (e.g., "workspace").
    fn namespace(&self) -> &str;

    /// Handle a JSON-RPC request within this service's namespace.
    ///
    /// `method` is the full method string (e.g., "file/read").
    /// `params` is the optional JSON parameters.
    fn handle(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> impl std::future::Future<Output = HandlerResult> + Send;

    /// Initialize the service (called once at startup).
    fn init(&self) -> impl std::future::Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>> + Send {
        async { Ok(()) }
    }

    /// Shutdown the service (called once at server shutdown).
    fn shutdown(&self) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
}
