use std::sync::Arc;

use axum::{
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use taxibe_auth::Permission;
use taxibe_caisse::{SimulationInput, input_for_voiture, simulate};
use taxibe_core::Ariary;

use crate::app::dto::{self, ApiPath, ApiQuery, JsonBody};
use crate::app::errors::{self, ApiResult};
use crate::app::routes::common::{parse_id, require};
use crate::app::services::AppServices;
use crate::context::{CooperativeContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(simulate_caisse))
        .route("/voitures/:id", get(simulate_voiture))
}

/// Reconcile counted cash against hand-entered passenger counts.
pub async fn simulate_caisse(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::SimulationRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CAISSE_SIMULATE)?;
    dto::validate(&body)?;

    let tarif = services
        .tarif(cooperative.cooperative_id())
        .await
        .map_err(errors::store_error_to_response)?;
    let simulation = simulate(
        &tarif,
        SimulationInput {
            nb_places: body.nb_places,
            nb_vip: body.nb_vip,
            nb_reduits: body.nb_reduits,
            depenses: Ariary(body.depenses),
            montant_compte: body.montant_compte.map(Ariary),
        },
    )
    .map_err(errors::domain_error_to_response)?;

    Ok(Json(dto::simulation_to_json(&simulation)).into_response())
}

/// Reconcile a departure: passenger counts come from its seat map and the
/// expenses from those linked to it.
pub async fn simulate_voiture(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(query): ApiQuery<dto::VoitureSimulationQuery>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CAISSE_SIMULATE)?;
    dto::validate(&query)?;
    let id = parse_id(&id)?;
    let cooperative_id = cooperative.cooperative_id();

    let voiture = services
        .voiture(cooperative_id, id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("voiture"))?;
    let depenses = services
        .depenses
        .list(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;
    let tarif = services
        .tarif(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;

    let input = input_for_voiture(&voiture, &depenses, query.montant_compte.map(Ariary))
        .map_err(errors::domain_error_to_response)?;
    let simulation = simulate(&tarif, input).map_err(errors::domain_error_to_response)?;

    let mut body = dto::simulation_to_json(&simulation);
    body["voiture_id"] = serde_json::json!(id.to_string());
    Ok(Json(body).into_response())
}
