use axum::{routing::get, Router};

pub mod clients;
pub mod clotures;
pub mod common;
pub mod configuration;
pub mod depenses;
pub mod places;
pub mod simulateur;
pub mod system;
pub mod voitures;

/// Router for all authenticated (cooperative-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/configuration", configuration::router())
        .nest("/clients", clients::router())
        .nest("/voitures", voitures::router().merge(places::router()))
        .nest("/depenses", depenses::router())
        .nest("/clotures", clotures::router())
        .nest("/simulateur", simulateur::router())
}
