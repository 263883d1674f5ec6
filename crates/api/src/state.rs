use std::sync::Arc;

use batchtone_engine::Engine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the engine and config are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub config: Arc<ServerConfig>,
    /// Present only when running on PostgreSQL; used by the health check.
    pub pool: Option<batchtone_db::DbPool>,
}
