use std::collections::BTreeMap;

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use taxibe_booking::{Client, Occupant, SeatView, Voiture, WaitlistEntry};
use taxibe_caisse::{ClotureMensuelle, Depense, DepenseCategorie, Simulation, Tarif};
use taxibe_core::Entity;

use crate::app::errors;

// -------------------------
// Extraction + validation
// -------------------------

/// `Json<T>` whose rejections use the API's JSON error shape.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection_to_response(rejection)),
        }
    }
}

fn json_rejection_to_response(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let code = if status == StatusCode::UNPROCESSABLE_ENTITY {
        "validation_error"
    } else {
        "invalid_body"
    };
    errors::json_error(status, code, rejection.body_text())
}

/// `Path<T>` whose rejections use the API's JSON error shape.
pub struct ApiPath<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(errors::json_error(rejection.status(), "invalid_path", rejection.body_text())),
        }
    }
}

/// `Query<T>` whose rejections use the API's JSON error shape.
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(errors::json_error(rejection.status(), "invalid_query", rejection.body_text())),
        }
    }
}

/// Run the DTO's declared rules; failures become a 422 with field messages.
pub fn validate<T: Validate>(body: &T) -> Result<(), Response> {
    body.validate().map_err(|errs| {
        let fields: BTreeMap<String, Vec<String>> = errs
            .field_errors()
            .into_iter()
            .map(|(field, list)| {
                let messages = list
                    .iter()
                    .map(|e| match &e.message {
                        Some(m) => m.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        errors::validation_error(fields)
    })
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct ConfigurationRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub nom_cooperative: String,
    #[validate(length(max = 500, message = "must be at most 500 characters"))]
    pub logo_url: Option<String>,
    #[validate(range(min = 1, message = "must be greater than 0"))]
    pub prix_place: i64,
    #[validate(range(min = 1, message = "must be greater than 0"))]
    pub prix_vip: i64,
    #[serde(default)]
    #[validate(range(max = 100, message = "must be between 0 and 100"))]
    pub taux_reduction: u8,
    #[serde(default)]
    #[validate(range(min = 0, message = "must not be negative"))]
    pub solde_initial: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub nom: String,
    #[validate(length(max = 20, message = "must be at most 20 characters"))]
    pub telephone: Option<String>,
    #[validate(length(max = 30, message = "must be at most 30 characters"))]
    pub cin: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 120, message = "must be 1 to 120 characters"))]
    pub nom: Option<String>,
    #[validate(length(max = 20, message = "must be at most 20 characters"))]
    pub telephone: Option<String>,
    #[validate(length(max = 30, message = "must be at most 30 characters"))]
    pub cin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClientQuery {
    /// Case-insensitive substring of the name or phone number.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVoitureRequest {
    pub classe: String,
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    pub immatriculation: String,
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub chauffeur: String,
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub destination: String,
    pub depart_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVoitureRequest {
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    pub immatriculation: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub chauffeur: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub destination: Option<String>,
    pub depart_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct VoitureQuery {
    /// Departure day (UTC), `YYYY-MM-DD`.
    pub date: Option<NaiveDate>,
    pub classe: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignSeatRequest {
    pub client_id: String,
    #[validate(range(min = 1, max = 16, message = "must be between 1 and 16"))]
    pub seat: Option<u8>,
    #[serde(default)]
    pub reduit: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinWaitlistRequest {
    pub client_id: String,
    #[serde(default)]
    pub reduit: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDepenseRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub libelle: String,
    pub categorie: DepenseCategorie,
    #[validate(range(min = 1, message = "must be greater than 0"))]
    pub montant: i64,
    pub date: NaiveDate,
    pub voiture_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDepenseRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub libelle: Option<String>,
    pub categorie: Option<DepenseCategorie>,
    #[validate(range(min = 1, message = "must be greater than 0"))]
    pub montant: Option<i64>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DepenseQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CloseMonthRequest {
    #[validate(range(min = 2000, max = 2100, message = "must be between 2000 and 2100"))]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "must be between 1 and 12"))]
    pub month: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SimulationRequest {
    #[serde(default)]
    pub nb_places: u32,
    #[serde(default)]
    pub nb_vip: u32,
    #[serde(default)]
    pub nb_reduits: u32,
    #[serde(default)]
    #[validate(range(min = 0, message = "must not be negative"))]
    pub depenses: i64,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub montant_compte: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VoitureSimulationQuery {
    #[validate(range(min = 0, message = "must not be negative"))]
    pub montant_compte: Option<i64>,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn tarif_to_json(t: &Tarif) -> serde_json::Value {
    serde_json::json!({
        "nom_cooperative": t.nom_cooperative(),
        "logo_url": t.logo_url(),
        "prix_place": t.prix_place(),
        "prix_vip": t.prix_vip(),
        "taux_reduction": t.taux_reduction(),
        "solde_initial": t.solde_initial(),
        "updated_at": t.updated_at().map(|d| d.to_rfc3339()),
    })
}

pub fn client_to_json(c: &Client) -> serde_json::Value {
    serde_json::json!({
        "id": c.id().to_string(),
        "nom": c.nom(),
        "telephone": c.telephone(),
        "cin": c.cin(),
        "created_at": c.created_at().to_rfc3339(),
    })
}

pub fn voiture_to_json(v: &Voiture) -> serde_json::Value {
    serde_json::json!({
        "id": v.id().to_string(),
        "classe": v.classe().as_str(),
        "immatriculation": v.immatriculation(),
        "chauffeur": v.chauffeur(),
        "destination": v.destination(),
        "depart_at": v.depart_at().to_rfc3339(),
        "status": v.status(),
        "capacite": v.classe().capacity(),
        "places_occupees": v.seats().occupied_count(),
        "places_libres": v.seats().free_count(),
        "en_attente": v.waitlist().len(),
        "created_at": v.created_at().to_rfc3339(),
    })
}

pub fn occupant_to_json(o: &Occupant) -> serde_json::Value {
    serde_json::json!({
        "client_id": o.client_id.to_string(),
        "client_nom": o.client_nom,
        "tarif": o.fare,
        "reduit": o.reduced,
        "booked_at": o.booked_at.to_rfc3339(),
    })
}

pub fn seat_to_json(s: &SeatView) -> serde_json::Value {
    serde_json::json!({
        "numero": s.number,
        "occupee": s.occupied,
        "occupant": s.occupant.as_ref().map(occupant_to_json),
    })
}

pub fn waitlist_entry_to_json(position: usize, e: &WaitlistEntry) -> serde_json::Value {
    serde_json::json!({
        "position": position,
        "client_id": e.client_id.to_string(),
        "client_nom": e.client_nom,
        "reduit": e.reduced,
        "joined_at": e.joined_at.to_rfc3339(),
    })
}

pub fn depense_to_json(d: &Depense) -> serde_json::Value {
    serde_json::json!({
        "id": d.id().to_string(),
        "libelle": d.libelle(),
        "categorie": d.categorie(),
        "montant": d.montant(),
        "date": d.date().to_string(),
        "voiture_id": d.voiture_id().map(|v| v.to_string()),
        "created_at": d.created_at().to_rfc3339(),
    })
}

pub fn cloture_to_json(c: &ClotureMensuelle) -> serde_json::Value {
    serde_json::json!({
        "periode": c.periode().to_string(),
        "year": c.periode().year(),
        "month": c.periode().month(),
        "solde_initial": c.solde_initial(),
        "total_depenses": c.total_depenses(),
        "solde_final": c.solde_final(),
        "nb_depenses": c.nb_depenses(),
        "closed_at": c.closed_at().to_rfc3339(),
    })
}

pub fn simulation_to_json(s: &Simulation) -> serde_json::Value {
    serde_json::json!({
        "nb_places": s.input.nb_places,
        "nb_vip": s.input.nb_vip,
        "nb_reduits": s.input.nb_reduits,
        "prix_place": s.prix_place,
        "prix_vip": s.prix_vip,
        "prix_reduit": s.prix_reduit,
        "recette_normale": s.recette_normale,
        "recette_vip": s.recette_vip,
        "recette_reduite": s.recette_reduite,
        "recette_totale": s.recette_totale,
        "depenses": s.input.depenses,
        "net_attendu": s.net_attendu,
        "montant_compte": s.input.montant_compte,
        "ecart": s.ecart,
        "statut": s.statut,
    })
}
