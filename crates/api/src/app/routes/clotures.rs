use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use taxibe_auth::Permission;
use taxibe_caisse::{Periode, close_month, ensure_reopenable};

use crate::app::dto::{self, ApiPath, JsonBody};
use crate::app::errors::{self, ApiResult};
use crate::app::routes::common::require;
use crate::app::services::AppServices;
use crate::context::{CooperativeContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_clotures).post(close))
        .route("/:year/:month", get(get_cloture).delete(reopen))
}

/// Closures in chronological order.
pub async fn list_clotures(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLOTURES_READ)?;

    let closures = services
        .closures(cooperative.cooperative_id())
        .await
        .map_err(errors::store_error_to_response)?;
    let items = closures.iter().map(dto::cloture_to_json).collect::<Vec<_>>();
    Ok(Json(serde_json::json!({ "items": items })).into_response())
}

pub async fn close(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::CloseMonthRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLOTURES_WRITE)?;
    dto::validate(&body)?;
    let cooperative_id = cooperative.cooperative_id();
    let periode = Periode::new(body.year, body.month).map_err(errors::domain_error_to_response)?;

    let tarif = services
        .tarif(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;
    let closures = services
        .closures(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;
    let depenses = services
        .depenses
        .list(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;

    let now = Utc::now();
    let cloture = close_month(
        cooperative_id,
        periode,
        now.date_naive(),
        &tarif,
        &closures,
        &depenses,
        now,
    )
    .map_err(errors::domain_error_to_response)?;

    // A concurrent close of the same month loses on the insert's id check.
    services
        .clotures
        .insert(cloture.clone())
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(
        cooperative_id = %cooperative_id,
        periode = %periode,
        solde_final = cloture.solde_final().amount(),
        "month closed"
    );
    Ok((StatusCode::CREATED, Json(dto::cloture_to_json(&cloture))).into_response())
}

pub async fn get_cloture(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath((year, month)): ApiPath<(i32, u32)>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLOTURES_READ)?;
    let periode = Periode::new(year, month).map_err(errors::domain_error_to_response)?;

    let cloture = services
        .clotures
        .get(cooperative.cooperative_id(), &periode)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("cloture"))?;

    Ok(Json(dto::cloture_to_json(&cloture)).into_response())
}

/// Reopen the latest closed month so its expenses can be edited again.
pub async fn reopen(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath((year, month)): ApiPath<(i32, u32)>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLOTURES_WRITE)?;
    let periode = Periode::new(year, month).map_err(errors::domain_error_to_response)?;
    let cooperative_id = cooperative.cooperative_id();

    let closures = services
        .closures(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;
    ensure_reopenable(&closures, periode).map_err(errors::domain_error_to_response)?;

    services
        .clotures
        .remove(cooperative_id, &periode)
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(cooperative_id = %cooperative_id, periode = %periode, "month reopened");
    Ok(StatusCode::NO_CONTENT.into_response())
}
