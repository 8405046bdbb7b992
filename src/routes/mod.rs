pub mod campaigns;
pub mod kpis;
pub mod lead_sources;
pub mod leads;

use crate::AppState;
use crate::db::store::PgStore;
use crate::error::{AppError, AppResult};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lead-sources", get(lead_sources::list_lead_sources))
        .route("/campaigns", get(campaigns::list_campaigns))
        .route("/campaigns/:campaign_id", get(campaigns::get_campaign))
        .route(
            "/campaigns/:campaign_id/status",
            put(campaigns::change_campaign_status),
        )
        .route(
            "/campaigns/:campaign_id/assignments",
            get(campaigns::list_assignments).post(campaigns::assign_user),
        )
        .route(
            "/campaigns/:campaign_id/assignments/:user_id",
            delete(campaigns::deactivate_assignment),
        )
        .route(
            "/campaigns/:campaign_id/allocation",
            get(campaigns::allocation_preview),
        )
        .route(
            "/campaigns/:campaign_id/generate-leads",
            post(leads::generate_daily_leads),
        )
        .route(
            "/campaigns/:campaign_id/leads/export",
            get(leads::export_leads),
        )
        .route("/leads/pending-approval", get(leads::pending_approval))
        .route("/leads/bulk-approve", post(leads::bulk_approve_leads))
        .route("/leads/:lead_id", get(leads::get_lead).put(leads::update_lead))
        .route("/leads/:lead_id/approve", post(leads::admin_approve_lead))
        .route(
            "/leads/:lead_id/revoke-approval",
            post(leads::revoke_approval),
        )
        .route("/leads/:lead_id/reassign", post(leads::reassign_lead))
        .route("/kpis", get(kpis::get_kpis))
        .route("/kpis/team-performance", get(kpis::team_performance))
        .route("/kpis/campaigns", get(kpis::campaign_cards))
        .with_state(state)
}

/// Runs blocking store work on the blocking pool with a pooled Postgres connection.
pub(crate) async fn with_store<T, F>(state: &AppState, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut PgStore<'_>) -> AppResult<T> + Send + 'static,
{
    let pool = state.db.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let mut store = PgStore::new(&mut conn);
        f(&mut store)
    })
    .await
    .map_err(|e| AppError::internal(format!("Blocking task failed: {}", e)))?
}
