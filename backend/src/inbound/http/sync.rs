//! Catalogue synchronisation HTTP handlers.
//!
//! ```text
//! POST /api/v1/sync
//! GET  /api/v1/sync
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::domain::Error;
use crate::domain::catalogue_sync::SyncOptions;
use crate::domain::ports::{SyncStatus, SyncTicket};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::WriteAccess;
use crate::inbound::http::state::HttpState;

/// Optional bounds for a triggered run.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SyncParams {
    /// Stop reading each collection after this many records.
    #[param(minimum = 1)]
    pub limit: Option<usize>,
}

/// Start a synchronisation run in the background.
#[utoipa::path(
    post,
    path = "/api/v1/sync",
    params(SyncParams),
    responses(
        (status = 202, description = "Run accepted", body = SyncTicket),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Writes disabled", body = Error),
        (status = 409, description = "A run is already active", body = Error)
    ),
    tags = ["sync"],
    operation_id = "triggerSync",
    security(("BearerToken" = []))
)]
#[post("/sync")]
pub async fn trigger_sync(
    state: web::Data<HttpState>,
    _access: WriteAccess,
    params: web::Query<SyncParams>,
) -> ApiResult<HttpResponse> {
    let options = SyncOptions {
        limit: params.limit,
    };
    let ticket = state.sync.trigger(options)?;
    info!(run_id = %ticket.run_id, limit = ?options.limit, "catalogue sync accepted");
    Ok(HttpResponse::Accepted().json(ticket))
}

/// Report whether a run is active and how the last one ended.
#[utoipa::path(
    get,
    path = "/api/v1/sync",
    responses((status = 200, description = "Sync status", body = SyncStatus)),
    tags = ["sync"],
    operation_id = "syncStatus",
    security([])
)]
#[get("/sync")]
pub async fn sync_status(state: web::Data<HttpState>) -> web::Json<SyncStatus> {
    web::Json(state.sync.status())
}
