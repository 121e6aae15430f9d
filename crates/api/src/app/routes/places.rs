//! Seat sales and the per-departure waitlist.
//!
//! Each handler is a single atomic update of the departure record, so two
//! counters selling the same seat cannot both succeed.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;

use taxibe_auth::Permission;
use taxibe_booking::{Occupant, ReleasedSeat, Voiture, WaitlistEntry};
use taxibe_infra::update_with;

use crate::app::dto::{self, ApiPath, JsonBody};
use crate::app::errors::{self, ApiResult};
use crate::app::routes::common::{parse_id, require};
use crate::app::services::AppServices;
use crate::context::{CooperativeContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/:id/places", get(list_places).post(assign_seat))
        .route("/:id/places/:seat", delete(release_seat))
        .route("/:id/attente", get(list_waitlist).post(join_waitlist))
        .route("/:id/attente/:client_id", delete(leave_waitlist))
}

pub async fn list_places(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::PLACES_READ)?;
    let id = parse_id(&id)?;

    let voiture = services
        .voiture(cooperative.cooperative_id(), id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("voiture"))?;

    let items = voiture.seat_map().iter().map(dto::seat_to_json).collect::<Vec<_>>();
    Ok(Json(serde_json::json!({
        "voiture_id": id.to_string(),
        "capacite": voiture.classe().capacity(),
        "places_libres": voiture.seats().free_count(),
        "items": items,
    }))
    .into_response())
}

/// Sell a seat. Without `seat` the first free one is taken. The fare comes
/// from the cooperative's configuration at the time of sale.
pub async fn assign_seat(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
    JsonBody(body): JsonBody<dto::AssignSeatRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::PLACES_WRITE)?;
    dto::validate(&body)?;
    let voiture_id = parse_id(&id)?;
    let client_id = parse_id(&body.client_id)?;
    let cooperative_id = cooperative.cooperative_id();

    let client = services
        .referenced_client(cooperative_id, "client_id", client_id)
        .await
        .map_err(errors::store_error_to_response)?;
    let tarif = services
        .tarif(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;

    let (voiture, seat) = update_with(
        services.voitures.as_ref(),
        cooperative_id,
        &voiture_id,
        move |v: &mut Voiture| {
            let occupant = Occupant {
                client_id,
                client_nom: client.nom().to_string(),
                fare: tarif.fare(v.classe(), body.reduit),
                reduced: body.reduit,
                booked_at: Utc::now(),
            };
            v.assign_seat(body.seat, occupant)
        },
    )
    .await
    .map_err(errors::store_error_to_response)?;

    let occupant = voiture
        .seats()
        .get(seat)
        .map_err(errors::domain_error_to_response)?
        .map(dto::occupant_to_json);

    tracing::info!(
        cooperative_id = %cooperative_id,
        voiture_id = %voiture_id,
        seat,
        places_libres = voiture.seats().free_count(),
        "seat sold"
    );
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "numero": seat,
            "occupant": occupant,
            "voiture": dto::voiture_to_json(&voiture),
        })),
    )
        .into_response())
}

/// Free a seat; the head of the waitlist, if any, is moved into it.
pub async fn release_seat(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath((id, seat)): ApiPath<(String, u8)>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::PLACES_WRITE)?;
    let voiture_id = parse_id(&id)?;
    let cooperative_id = cooperative.cooperative_id();

    let tarif = services
        .tarif(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;

    let (voiture, released): (Voiture, ReleasedSeat) = update_with(
        services.voitures.as_ref(),
        cooperative_id,
        &voiture_id,
        move |v: &mut Voiture| v.release_seat(seat, Utc::now(), |classe, reduced| tarif.fare(classe, reduced)),
    )
    .await
    .map_err(errors::store_error_to_response)?;

    if let Some(promoted) = &released.promoted {
        tracing::info!(
            voiture_id = %voiture_id,
            seat,
            client_id = %promoted.client_id,
            "waitlist head promoted"
        );
    }

    Ok(Json(serde_json::json!({
        "numero": released.seat,
        "libere": dto::occupant_to_json(&released.freed),
        "promu": released.promoted.as_ref().map(dto::occupant_to_json),
        "voiture": dto::voiture_to_json(&voiture),
    }))
    .into_response())
}

pub async fn list_waitlist(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::PLACES_READ)?;
    let id = parse_id(&id)?;

    let voiture = services
        .voiture(cooperative.cooperative_id(), id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("voiture"))?;

    let items = voiture
        .waitlist()
        .iter()
        .enumerate()
        .map(|(i, e)| dto::waitlist_entry_to_json(i + 1, e))
        .collect::<Vec<_>>();
    Ok(Json(serde_json::json!({ "items": items })).into_response())
}

pub async fn join_waitlist(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
    JsonBody(body): JsonBody<dto::JoinWaitlistRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::PLACES_WRITE)?;
    dto::validate(&body)?;
    let voiture_id = parse_id(&id)?;
    let client_id = parse_id(&body.client_id)?;
    let cooperative_id = cooperative.cooperative_id();

    let client = services
        .referenced_client(cooperative_id, "client_id", client_id)
        .await
        .map_err(errors::store_error_to_response)?;

    let entry = WaitlistEntry {
        client_id,
        client_nom: client.nom().to_string(),
        reduced: body.reduit,
        joined_at: Utc::now(),
    };
    let response_entry = entry.clone();
    let (_, position) = update_with(
        services.voitures.as_ref(),
        cooperative_id,
        &voiture_id,
        move |v: &mut Voiture| v.join_waitlist(entry),
    )
    .await
    .map_err(errors::store_error_to_response)?;

    Ok((
        StatusCode::CREATED,
        Json(dto::waitlist_entry_to_json(position, &response_entry)),
    )
        .into_response())
}

pub async fn leave_waitlist(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath((id, client_id)): ApiPath<(String, String)>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::PLACES_WRITE)?;
    let voiture_id = parse_id(&id)?;
    let client_id = parse_id(&client_id)?;

    update_with(
        services.voitures.as_ref(),
        cooperative.cooperative_id(),
        &voiture_id,
        move |v: &mut Voiture| v.leave_waitlist(client_id),
    )
    .await
    .map_err(errors::store_error_to_response)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
