//! Sandbox workspace protocol types
//!
//! JSON-RPC 2.0 wire types shared by the services, the router and the
//! transport, plus the error codes and method names of the workspace and
//! file namespaces.

pub mod error;
pub mod jsonrpc;
pub mod methods;

pub use error::{RpcError, RpcErrorCode};
pub use jsonrpc::{HandlerResult, Outcome, RequestId, RpcRequest, RpcResponse};
pub use methods::Methods;
