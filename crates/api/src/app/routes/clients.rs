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
use taxibe_booking::{Client, ClientUpdate, NewClient};

use crate::app::dto::{self, ApiPath, ApiQuery, JsonBody};
use crate::app::errors::{self, ApiResult};
use crate::app::routes::common::{parse_id, require};
use crate::app::services::AppServices;
use crate::context::{CooperativeContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_clients).post(register_client))
        .route("/:id", get(get_client).patch(update_client).delete(delete_client))
}

/// Clients sorted by name; `?q=` filters on name or phone number.
pub async fn list_clients(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiQuery(query): ApiQuery<dto::ClientQuery>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLIENTS_READ)?;

    let mut clients = services
        .clients
        .list(cooperative.cooperative_id())
        .await
        .map_err(errors::store_error_to_response)?;

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let needle = q.to_lowercase();
        clients.retain(|c| {
            c.nom().to_lowercase().contains(&needle)
                || c.telephone().is_some_and(|t| t.contains(&needle))
        });
    }
    clients.sort_by_cached_key(|c| c.nom().to_lowercase());

    let items = clients.iter().map(dto::client_to_json).collect::<Vec<_>>();
    Ok(Json(serde_json::json!({ "items": items })).into_response())
}

pub async fn register_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::CreateClientRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLIENTS_WRITE)?;
    dto::validate(&body)?;

    let client = Client::register(NewClient {
        cooperative_id: cooperative.cooperative_id(),
        nom: body.nom,
        telephone: body.telephone,
        cin: body.cin,
        now: Utc::now(),
    })
    .map_err(errors::domain_error_to_response)?;

    services
        .clients
        .insert(client.clone())
        .await
        .map_err(errors::store_error_to_response)?;

    Ok((StatusCode::CREATED, Json(dto::client_to_json(&client))).into_response())
}

pub async fn get_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLIENTS_READ)?;
    let id = parse_id(&id)?;

    let client = services
        .clients
        .get(cooperative.cooperative_id(), &id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("client"))?;

    Ok(Json(dto::client_to_json(&client)).into_response())
}

pub async fn update_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
    JsonBody(body): JsonBody<dto::UpdateClientRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLIENTS_WRITE)?;
    dto::validate(&body)?;
    let id = parse_id(&id)?;

    let update = ClientUpdate {
        nom: body.nom,
        telephone: body.telephone,
        cin: body.cin,
    };
    let client = services
        .clients
        .update(
            cooperative.cooperative_id(),
            &id,
            Box::new(move |c: &mut Client| c.update(update)),
        )
        .await
        .map_err(errors::store_error_to_response)?;

    Ok(Json(dto::client_to_json(&client)).into_response())
}

/// Seats already sold keep the name snapshot taken at booking time.
pub async fn delete_client(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CLIENTS_WRITE)?;
    let id = parse_id(&id)?;

    let removed = services
        .clients
        .remove(cooperative.cooperative_id(), &id)
        .await
        .map_err(errors::store_error_to_response)?;
    if !removed {
        return Err(errors::not_found("client"));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
