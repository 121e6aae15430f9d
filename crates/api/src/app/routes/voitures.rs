use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use taxibe_auth::Permission;
use taxibe_booking::{ScheduleVoiture, Voiture, VoitureClass, VoitureDetailsUpdate, VoitureStatus};
use taxibe_core::{DomainError, DomainResult, Entity};

use crate::app::dto::{self, ApiPath, ApiQuery, JsonBody};
use crate::app::errors::{self, ApiResult};
use crate::app::routes::common::{parse_id, require};
use crate::app::services::AppServices;
use crate::context::{CooperativeContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_voitures).post(schedule_voiture))
        .route("/:id", get(get_voiture).patch(update_voiture).delete(delete_voiture))
        .route("/:id/depart", post(depart_voiture))
        .route("/:id/cancel", post(cancel_voiture))
}

fn parse_status(raw: &str) -> DomainResult<VoitureStatus> {
    match raw.to_lowercase().as_str() {
        "scheduled" => Ok(VoitureStatus::Scheduled),
        "departed" => Ok(VoitureStatus::Departed),
        "cancelled" => Ok(VoitureStatus::Cancelled),
        _ => Err(DomainError::field("status", "must be one of: scheduled, departed, cancelled")),
    }
}

/// Departures ordered by departure time, optionally filtered by day, class
/// and status.
pub async fn list_voitures(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiQuery(query): ApiQuery<dto::VoitureQuery>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::VOITURES_READ)?;

    let classe = query
        .classe
        .as_deref()
        .map(str::parse::<VoitureClass>)
        .transpose()
        .map_err(errors::domain_error_to_response)?;
    let status = query
        .status
        .as_deref()
        .map(parse_status)
        .transpose()
        .map_err(errors::domain_error_to_response)?;

    let mut voitures = services
        .voitures
        .list(cooperative.cooperative_id())
        .await
        .map_err(errors::store_error_to_response)?;

    voitures.retain(|v| {
        query.date.is_none_or(|d| v.depart_at().date_naive() == d)
            && classe.is_none_or(|c| v.classe() == c)
            && status.is_none_or(|s| v.status() == s)
    });
    voitures.sort_by_key(|v| v.depart_at());

    let items = voitures.iter().map(dto::voiture_to_json).collect::<Vec<_>>();
    Ok(Json(serde_json::json!({ "items": items })).into_response())
}

pub async fn schedule_voiture(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::CreateVoitureRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::VOITURES_WRITE)?;
    dto::validate(&body)?;

    let classe = body
        .classe
        .parse::<VoitureClass>()
        .map_err(errors::domain_error_to_response)?;
    let voiture = Voiture::schedule(ScheduleVoiture {
        cooperative_id: cooperative.cooperative_id(),
        classe,
        immatriculation: body.immatriculation,
        chauffeur: body.chauffeur,
        destination: body.destination,
        depart_at: body.depart_at,
        now: Utc::now(),
    })
    .map_err(errors::domain_error_to_response)?;

    services
        .voitures
        .insert(voiture.clone())
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(
        cooperative_id = %cooperative.cooperative_id(),
        voiture_id = %voiture.id(),
        classe = classe.as_str(),
        "voiture scheduled"
    );
    Ok((StatusCode::CREATED, Json(dto::voiture_to_json(&voiture))).into_response())
}

/// One departure with its full seat map.
pub async fn get_voiture(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::VOITURES_READ)?;
    let id = parse_id(&id)?;

    let voiture = services
        .voiture(cooperative.cooperative_id(), id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("voiture"))?;

    let recette = voiture.revenue().map_err(errors::domain_error_to_response)?;
    let mut body = dto::voiture_to_json(&voiture);
    body["places"] = voiture.seat_map().iter().map(dto::seat_to_json).collect();
    body["recette"] = serde_json::json!(recette);
    Ok(Json(body).into_response())
}

pub async fn update_voiture(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
    JsonBody(body): JsonBody<dto::UpdateVoitureRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::VOITURES_WRITE)?;
    dto::validate(&body)?;
    let id = parse_id(&id)?;

    let update = VoitureDetailsUpdate {
        immatriculation: body.immatriculation,
        chauffeur: body.chauffeur,
        destination: body.destination,
        depart_at: body.depart_at,
    };
    let voiture = services
        .voitures
        .update(
            cooperative.cooperative_id(),
            &id,
            Box::new(move |v: &mut Voiture| v.update_details(update)),
        )
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(dto::voiture_to_json(&voiture)).into_response())
}

// The occupancy check and the removal are two store calls; a seat sold in
// between is lost with the record.
pub async fn delete_voiture(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::VOITURES_WRITE)?;
    let id = parse_id(&id)?;
    let cooperative_id = cooperative.cooperative_id();

    let voiture = services
        .voiture(cooperative_id, id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("voiture"))?;
    voiture
        .ensure_deletable()
        .map_err(errors::domain_error_to_response)?;

    services
        .voitures
        .remove(cooperative_id, &id)
        .await
        .map_err(errors::store_error_to_response)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn depart_voiture(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::VOITURES_WRITE)?;
    let id = parse_id(&id)?;

    let voiture = services
        .voitures
        .update(cooperative.cooperative_id(), &id, Box::new(|v: &mut Voiture| v.depart()))
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(
        voiture_id = %voiture.id(),
        passagers = voiture.seats().occupied_count(),
        "voiture departed"
    );
    Ok(Json(dto::voiture_to_json(&voiture)).into_response())
}

pub async fn cancel_voiture(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::VOITURES_WRITE)?;
    let id = parse_id(&id)?;

    let voiture = services
        .voitures
        .update(cooperative.cooperative_id(), &id, Box::new(|v: &mut Voiture| v.cancel()))
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(voiture_id = %voiture.id(), "voiture cancelled");
    Ok(Json(dto::voiture_to_json(&voiture)).into_response())
}
