use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Datelike, Utc};

use taxibe_auth::Permission;
use taxibe_caisse::{Depense, DepenseUpdate, NewDepense, Periode, ensure_month_open};
use taxibe_core::{Ariary, CooperativeId, RecordId};

use crate::app::dto::{self, ApiPath, ApiQuery, JsonBody};
use crate::app::errors::{self, ApiResult};
use crate::app::routes::common::{parse_id, require};
use crate::app::services::AppServices;
use crate::context::{CooperativeContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_depenses).post(record_depense))
        .route("/:id", get(get_depense).patch(update_depense).delete(delete_depense))
}

/// Expenses sorted by date. `?year=` alone filters a year; `?year=&month=` a
/// single month.
pub async fn list_depenses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiQuery(query): ApiQuery<dto::DepenseQuery>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::DEPENSES_READ)?;

    let periode = match (query.year, query.month) {
        (Some(year), Some(month)) => {
            Some(Periode::new(year, month).map_err(errors::domain_error_to_response)?)
        }
        (None, Some(_)) => return Err(errors::field_error("year", "required when month is given")),
        _ => None,
    };

    let mut depenses = services
        .depenses
        .list(cooperative.cooperative_id())
        .await
        .map_err(errors::store_error_to_response)?;

    depenses.retain(|d| match (periode, query.year) {
        (Some(p), _) => p.contains(d.date()),
        (None, Some(year)) => d.date().year() == year,
        (None, None) => true,
    });
    depenses.sort_by_key(|d| (d.date(), d.created_at()));

    let total = Ariary::sum(depenses.iter().map(|d| d.montant())).map_err(errors::domain_error_to_response)?;
    let items = depenses.iter().map(dto::depense_to_json).collect::<Vec<_>>();
    Ok(Json(serde_json::json!({ "items": items, "total": total })).into_response())
}

async fn ensure_voiture_exists(
    services: &AppServices,
    cooperative_id: CooperativeId,
    raw: &str,
) -> Result<RecordId, axum::response::Response> {
    let id = parse_id(raw)?;
    match services
        .voiture(cooperative_id, id)
        .await
        .map_err(errors::store_error_to_response)?
    {
        Some(_) => Ok(id),
        None => Err(errors::field_error("voiture_id", "unknown voiture")),
    }
}

pub async fn record_depense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::CreateDepenseRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::DEPENSES_WRITE)?;
    dto::validate(&body)?;
    let cooperative_id = cooperative.cooperative_id();

    let voiture_id = match body.voiture_id.as_deref() {
        Some(raw) => Some(ensure_voiture_exists(&services, cooperative_id, raw).await?),
        None => None,
    };

    let closures = services
        .closures(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;
    ensure_month_open(&closures, body.date).map_err(errors::domain_error_to_response)?;

    let depense = Depense::record(NewDepense {
        cooperative_id,
        libelle: body.libelle,
        categorie: body.categorie,
        montant: Ariary(body.montant),
        date: body.date,
        voiture_id,
        now: Utc::now(),
    })
    .map_err(errors::domain_error_to_response)?;

    services
        .depenses
        .insert(depense.clone())
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(
        cooperative_id = %cooperative_id,
        montant = depense.montant().amount(),
        periode = %depense.periode(),
        "depense recorded"
    );
    Ok((StatusCode::CREATED, Json(dto::depense_to_json(&depense))).into_response())
}

pub async fn get_depense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::DEPENSES_READ)?;
    let id = parse_id(&id)?;

    let depense = services
        .depenses
        .get(cooperative.cooperative_id(), &id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("depense"))?;

    Ok(Json(dto::depense_to_json(&depense)).into_response())
}

/// Both the current and the new date must fall in open months.
pub async fn update_depense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
    JsonBody(body): JsonBody<dto::UpdateDepenseRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::DEPENSES_WRITE)?;
    dto::validate(&body)?;
    let id = parse_id(&id)?;
    let cooperative_id = cooperative.cooperative_id();

    let closures = services
        .closures(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;

    let update = DepenseUpdate {
        libelle: body.libelle,
        categorie: body.categorie,
        montant: body.montant.map(Ariary),
        date: body.date,
    };
    let depense = services
        .depenses
        .update(
            cooperative_id,
            &id,
            Box::new(move |d: &mut Depense| {
                ensure_month_open(&closures, d.date())?;
                if let Some(date) = update.date {
                    ensure_month_open(&closures, date)?;
                }
                d.update(update)
            }),
        )
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(dto::depense_to_json(&depense)).into_response())
}

pub async fn delete_depense(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::DEPENSES_WRITE)?;
    let id = parse_id(&id)?;
    let cooperative_id = cooperative.cooperative_id();

    let depense = services
        .depenses
        .get(cooperative_id, &id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("depense"))?;
    let closures = services
        .closures(cooperative_id)
        .await
        .map_err(errors::store_error_to_response)?;
    ensure_month_open(&closures, depense.date()).map_err(errors::domain_error_to_response)?;

    services
        .depenses
        .remove(cooperative_id, &id)
        .await
        .map_err(errors::store_error_to_response)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
