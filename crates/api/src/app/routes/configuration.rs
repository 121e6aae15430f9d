use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use chrono::Utc;

use taxibe_auth::Permission;
use taxibe_caisse::{Tarif, TarifSettings};
use taxibe_core::Ariary;

use crate::app::dto::{self, JsonBody};
use crate::app::errors::{self, ApiResult};
use crate::app::routes::common::require;
use crate::app::services::AppServices;
use crate::context::{CooperativeContext, PrincipalContext};

pub fn router() -> Router {
    Router::new().route("/", get(get_configuration).put(save_configuration))
}

/// Current fares and opening cash; defaults until the cooperative saves its own.
pub async fn get_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CONFIGURATION_READ)?;

    let tarif = services
        .tarif(cooperative.cooperative_id())
        .await
        .map_err(errors::store_error_to_response)?;
    Ok(Json(dto::tarif_to_json(&tarif)).into_response())
}

pub async fn save_configuration(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cooperative): Extension<CooperativeContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<dto::ConfigurationRequest>,
) -> ApiResult {
    require(&cooperative, &principal, Permission::CONFIGURATION_WRITE)?;
    dto::validate(&body)?;

    let tarif = Tarif::configure(
        cooperative.cooperative_id(),
        TarifSettings {
            nom_cooperative: body.nom_cooperative,
            logo_url: body.logo_url,
            prix_place: Ariary(body.prix_place),
            prix_vip: Ariary(body.prix_vip),
            taux_reduction: body.taux_reduction,
            solde_initial: Ariary(body.solde_initial),
        },
        Utc::now(),
    )
    .map_err(errors::domain_error_to_response)?;

    services
        .tarifs
        .upsert(tarif.clone())
        .await
        .map_err(errors::store_error_to_response)?;

    tracing::info!(
        cooperative_id = %cooperative.cooperative_id(),
        prix_place = tarif.prix_place().amount(),
        prix_vip = tarif.prix_vip().amount(),
        "configuration saved"
    );
    Ok(Json(dto::tarif_to_json(&tarif)).into_response())
}
