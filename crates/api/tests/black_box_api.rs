use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};
use taxibe_api::app::{build_router, services::build_in_memory_services};
use taxibe_api::config::ApiConfig;
use taxibe_auth::{JwtClaims, PrincipalId, Role};
use taxibe_core::CooperativeId;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory stores, bound to an ephemeral port.
        let config = ApiConfig::in_memory(JWT_SECRET);
        let app = build_router(&config, Arc::new(build_in_memory_services()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> (StatusCode, Value) {
        let res = req.send().await.unwrap();
        let status = res.status();
        let text = res.text().await.unwrap();
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        (status, body)
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        self.send(self.client.get(format!("{}{}", self.base_url, path)).bearer_auth(token))
            .await
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            self.client
                .post(format!("{}{}", self.base_url, path))
                .bearer_auth(token)
                .json(&body),
        )
        .await
    }

    async fn put(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            self.client
                .put(format!("{}{}", self.base_url, path))
                .bearer_auth(token)
                .json(&body),
        )
        .await
    }

    async fn patch(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            self.client
                .patch(format!("{}{}", self.base_url, path))
                .bearer_auth(token)
                .json(&body),
        )
        .await
    }

    async fn delete(&self, token: &str, path: &str) -> (StatusCode, Value) {
        self.send(self.client.delete(format!("{}{}", self.base_url, path)).bearer_auth(token))
            .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(cooperative_id: CooperativeId, role: &'static str) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        cooperative_id,
        roles: vec![Role::new(role)],
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_client(srv: &TestServer, token: &str, nom: &str) -> String {
    let (status, body) = srv.post(token, "/clients", json!({ "nom": nom })).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_voiture(srv: &TestServer, token: &str, classe: &str) -> String {
    let (status, body) = srv
        .post(
            token,
            "/voitures",
            json!({
                "classe": classe,
                "immatriculation": "4521 tbe",
                "chauffeur": "Rakotomalala",
                "destination": "Mahajanga",
                "depart_at": (Utc::now() + ChronoDuration::hours(3)).to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .send(srv.client.get(format!("{}/whoami", srv.base_url)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = srv.get("not-a-jwt", "/clients").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = srv
        .send(srv.client.get(format!("{}/health", srv.base_url)))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn cooperative_context_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let cooperative_id = CooperativeId::new();
    let token = mint_jwt(cooperative_id, "admin");

    let (status, body) = srv.get(&token, "/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cooperative_id"].as_str().unwrap(), cooperative_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn configuration_defaults_then_saved_values() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "admin");

    let (status, body) = srv.get(&token, "/configuration").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prix_place"], 20_000);
    assert_eq!(body["prix_vip"], 35_000);
    assert!(body["updated_at"].is_null());

    let (status, body) = srv
        .put(
            &token,
            "/configuration",
            json!({
                "nom_cooperative": "Kofmad",
                "prix_place": 25_000,
                "prix_vip": 40_000,
                "taux_reduction": 20,
                "solde_initial": 100_000,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = srv.get(&token, "/configuration").await;
    assert_eq!(body["nom_cooperative"], "Kofmad");
    assert_eq!(body["taux_reduction"], 20);

    let (status, body) = srv
        .put(
            &token,
            "/configuration",
            json!({ "nom_cooperative": "Kofmad", "prix_place": 0, "prix_vip": 40_000 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["prix_place"].is_array());
}

#[tokio::test]
async fn seats_fill_up_then_waitlist_head_is_promoted() {
    let srv = TestServer::spawn().await;
    let cooperative_id = CooperativeId::new();
    let token_admin = mint_jwt(cooperative_id, "admin");
    let token_guichet = mint_jwt(cooperative_id, "guichetier");

    // Guichetiers sell seats but do not schedule departures.
    let (status, _) = srv
        .post(
            &token_guichet,
            "/voitures",
            json!({
                "classe": "vip",
                "immatriculation": "9090 TBA",
                "chauffeur": "Haja",
                "destination": "Morondava",
                "depart_at": Utc::now().to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let voiture = create_voiture(&srv, &token_admin, "vip").await;

    let mut clients = Vec::new();
    for i in 0..11 {
        clients.push(create_client(&srv, &token_guichet, &format!("Passager {i}")).await);
    }

    for (i, client) in clients.iter().take(10).enumerate() {
        let (status, body) = srv
            .post(
                &token_guichet,
                &format!("/voitures/{voiture}/places"),
                json!({ "client_id": client }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["numero"], i + 1);
        assert_eq!(body["occupant"]["tarif"], 35_000);
    }

    let last = &clients[10];
    let (status, body) = srv
        .post(&token_guichet, &format!("/voitures/{voiture}/places"), json!({ "client_id": last }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = srv
        .post(&token_guichet, &format!("/voitures/{voiture}/attente"), json!({ "client_id": last }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["position"], 1);

    let (status, body) = srv
        .delete(&token_guichet, &format!("/voitures/{voiture}/places/4"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["libere"]["client_id"], clients[3].as_str());
    assert_eq!(body["promu"]["client_id"], last.as_str());

    let (_, body) = srv.get(&token_guichet, &format!("/voitures/{voiture}/places")).await;
    assert_eq!(body["places_libres"], 0);
    assert_eq!(body["items"][3]["occupant"]["client_id"], last.as_str());

    let (_, body) = srv.get(&token_guichet, &format!("/voitures/{voiture}/attente")).await;
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn explicit_seat_rules_and_reduced_fare() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "admin");

    let (status, _) = srv
        .put(
            &token,
            "/configuration",
            json!({ "nom_cooperative": "Cotisse", "prix_place": 20_000, "prix_vip": 35_000, "taux_reduction": 25 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let voiture = create_voiture(&srv, &token, "regular").await;
    let a = create_client(&srv, &token, "Andry").await;
    let b = create_client(&srv, &token, "Bako").await;

    let (status, body) = srv
        .post(&token, &format!("/voitures/{voiture}/places"), json!({ "client_id": a, "seat": 7, "reduit": true }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["numero"], 7);
    assert_eq!(body["occupant"]["tarif"], 15_000);

    // Taken seat, double booking, out-of-range seat, unknown client.
    let (status, _) = srv
        .post(&token, &format!("/voitures/{voiture}/places"), json!({ "client_id": b, "seat": 7 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = srv
        .post(&token, &format!("/voitures/{voiture}/places"), json!({ "client_id": a }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = srv
        .post(&token, &format!("/voitures/{voiture}/places"), json!({ "client_id": b, "seat": 0 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["seat"].is_array());

    let (status, body) = srv
        .post(
            &token,
            &format!("/voitures/{voiture}/places"),
            json!({ "client_id": CooperativeId::new().to_string() }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["client_id"].is_array());

    // Waitlist only opens once the departure is full.
    let (status, _) = srv
        .post(&token, &format!("/voitures/{voiture}/attente"), json!({ "client_id": b }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A departure with passengers cannot be deleted until cancelled.
    let (status, _) = srv.delete(&token, &format!("/voitures/{voiture}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, body) = srv.post(&token, &format!("/voitures/{voiture}/cancel"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["places_occupees"], 0);
    let (status, _) = srv.delete(&token, &format!("/voitures/{voiture}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn departed_voiture_refuses_sales_and_drops_waitlist() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "admin");

    let voiture = create_voiture(&srv, &token, "vip").await;
    for i in 0..10 {
        let client = create_client(&srv, &token, &format!("Mpandeha {i}")).await;
        let (status, _) = srv
            .post(&token, &format!("/voitures/{voiture}/places"), json!({ "client_id": client }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let waiting = create_client(&srv, &token, "Fara").await;
    let (status, _) = srv
        .post(&token, &format!("/voitures/{voiture}/attente"), json!({ "client_id": waiting }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = srv.post(&token, &format!("/voitures/{voiture}/depart"), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "departed");
    assert_eq!(body["places_occupees"], 10);
    assert_eq!(body["en_attente"], 0);

    let late = create_client(&srv, &token, "Tsiry").await;
    let (status, body) = srv
        .post(&token, &format!("/voitures/{voiture}/places"), json!({ "client_id": late }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = srv.delete(&token, &format!("/voitures/{voiture}/places/1")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = srv.get(&token, &format!("/voitures/{voiture}/attente")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());

    let (status, _) = srv.post(&token, &format!("/voitures/{voiture}/depart"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn guichetier_cannot_record_expenses() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "guichetier");

    let (status, body) = srv
        .post(
            &token,
            "/depenses",
            json!({ "libelle": "Gasoil", "categorie": "carburant", "montant": 50_000, "date": "2025-01-10" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = srv.get(&token, "/depenses").await;
    assert_eq!(status, StatusCode::OK);

    let stranger = mint_jwt(CooperativeId::new(), "chauffeur");
    let (status, _) = srv.get(&stranger, "/clients").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn cooperatives_are_isolated() {
    let srv = TestServer::spawn().await;
    let token_a = mint_jwt(CooperativeId::new(), "admin");
    let token_b = mint_jwt(CooperativeId::new(), "admin");

    let id = create_client(&srv, &token_a, "Voahangy").await;

    let (status, _) = srv.get(&token_a, &format!("/clients/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = srv.get(&token_b, &format!("/clients/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = srv.get(&token_b, "/clients").await;
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_input_is_reported_per_field() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "admin");

    let (status, body) = srv.post(&token, "/clients", json!({ "nom": "" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert!(body["errors"]["nom"].is_array());

    let (status, body) = srv
        .post(&token, "/clients", json!({ "nom": "Tahina", "telephone": "034-12-345" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["telephone"].is_array());

    let (status, body) = srv
        .post(
            &token,
            "/voitures",
            json!({
                "classe": "bus",
                "immatriculation": "1111 TAA",
                "chauffeur": "Solo",
                "destination": "Toliara",
                "depart_at": Utc::now().to_rfc3339(),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["classe"].is_array());

    let (status, body) = srv.get(&token, "/clients/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn malformed_path_and_query_values_use_json_errors() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "admin");
    let voiture = create_voiture(&srv, &token, "regular").await;

    let (status, body) = srv.delete(&token, &format!("/voitures/{voiture}/places/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_path");
    assert!(body["message"].is_string());

    let (status, body) = srv.get(&token, "/clotures/2025/janvier").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_path");

    let (status, body) = srv.get(&token, "/voitures?date=xyz").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_query");
    assert!(body["message"].is_string());

    let (status, body) = srv.get(&token, "/depenses?year=deux-mille").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_query");
}

#[tokio::test]
async fn monthly_closures_roll_the_balance_forward() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "admin");

    srv.put(
        &token,
        "/configuration",
        json!({ "nom_cooperative": "Fifiabe", "prix_place": 20_000, "prix_vip": 35_000, "solde_initial": 500_000 }),
    )
    .await;

    for (date, montant) in [("2025-01-05", 60_000), ("2025-01-20", 40_000), ("2025-02-03", 50_000)] {
        let (status, body) = srv
            .post(
                &token,
                "/depenses",
                json!({ "libelle": "Entretien", "categorie": "entretien", "montant": montant, "date": date }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (_, body) = srv.get(&token, "/depenses?year=2025&month=1").await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["total"], 100_000);

    let (status, january) = srv.post(&token, "/clotures", json!({ "year": 2025, "month": 1 })).await;
    assert_eq!(status, StatusCode::CREATED, "{january}");
    assert_eq!(january["solde_initial"], 500_000);
    assert_eq!(january["total_depenses"], 100_000);
    assert_eq!(january["solde_final"], 400_000);

    let (status, february) = srv.post(&token, "/clotures", json!({ "year": 2025, "month": 2 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(february["solde_initial"], 400_000);
    assert_eq!(february["solde_final"], 350_000);

    // Closed months are frozen; duplicates, earlier and future months are refused.
    let (status, _) = srv
        .post(
            &token,
            "/depenses",
            json!({ "libelle": "Taxe", "categorie": "taxe", "montant": 1_000, "date": "2025-01-31" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = srv.post(&token, "/clotures", json!({ "year": 2025, "month": 2 })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = srv.post(&token, "/clotures", json!({ "year": 2099, "month": 12 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    // Only the latest closure can be reopened.
    let (status, body) = srv.delete(&token, "/clotures/2025/1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");

    let (status, _) = srv.delete(&token, "/clotures/2025/2").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = srv.get(&token, "/clotures").await;
    let periodes: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["periode"].as_str().unwrap())
        .collect();
    assert_eq!(periodes, vec!["2025-01"]);
}

#[tokio::test]
async fn months_behind_the_latest_closure_are_frozen() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "admin");

    for month in [3, 5] {
        let (status, body) = srv.post(&token, "/clotures", json!({ "year": 2025, "month": month })).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    // April was skipped and can no longer be closed, so it takes no expenses.
    let (status, body) = srv
        .post(
            &token,
            "/depenses",
            json!({ "libelle": "Pneu", "categorie": "entretien", "montant": 80_000, "date": "2025-04-10" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = srv.post(&token, "/clotures", json!({ "year": 2025, "month": 4 })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = srv
        .post(
            &token,
            "/depenses",
            json!({ "libelle": "Pneu", "categorie": "entretien", "montant": 80_000, "date": "2025-06-02" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

#[tokio::test]
async fn closed_month_expenses_cannot_be_moved_or_deleted() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(CooperativeId::new(), "admin");

    let mut ids = Vec::new();
    for date in ["2025-01-12", "2025-03-08"] {
        let (status, body) = srv
            .post(
                &token,
                "/depenses",
                json!({ "libelle": "Salaire", "categorie": "salaire", "montant": 120_000, "date": date }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        ids.push(body["id"].as_str().unwrap().to_string());
    }
    let (january, march) = (&ids[0], &ids[1]);

    let (status, _) = srv.post(&token, "/clotures", json!({ "year": 2025, "month": 1 })).await;
    assert_eq!(status, StatusCode::CREATED);

    // Moving an open-month expense into the closed month.
    let (status, body) = srv
        .patch(&token, &format!("/depenses/{march}"), json!({ "date": "2025-01-15" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Editing or deleting an expense already in the closed month.
    let (status, _) = srv
        .patch(&token, &format!("/depenses/{january}"), json!({ "montant": 90_000 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = srv.delete(&token, &format!("/depenses/{january}")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = srv.get(&token, &format!("/depenses/{january}")).await;
    assert_eq!(body["montant"], 120_000);
    let (_, body) = srv.get(&token, &format!("/depenses/{march}")).await;
    assert_eq!(body["date"], "2025-03-08");

    // The open month stays editable.
    let (status, body) = srv
        .patch(&token, &format!("/depenses/{march}"), json!({ "montant": 100_000 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["montant"], 100_000);
    let (status, _) = srv.delete(&token, &format!("/depenses/{march}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn simulateur_reports_cash_gap() {
    let srv = TestServer::spawn().await;
    let cooperative_id = CooperativeId::new();
    let caissier = mint_jwt(cooperative_id, "caissier");

    let (status, body) = srv
        .post(
            &caissier,
            "/simulateur",
            json!({ "nb_places": 10, "nb_vip": 2, "depenses": 60_000, "montant_compte": 200_000 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["recette_totale"], 270_000);
    assert_eq!(body["net_attendu"], 210_000);
    assert_eq!(body["ecart"], -10_000);
    assert_eq!(body["statut"], "deficit");

    // Per-departure: counts come from the seat map, expenses from linked ones.
    let voiture = create_voiture(&srv, &caissier, "regular").await;
    for nom in ["Lova", "Mamy"] {
        let client = create_client(&srv, &caissier, nom).await;
        let (status, _) = srv
            .post(&caissier, &format!("/voitures/{voiture}/places"), json!({ "client_id": client }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, body) = srv
        .post(
            &caissier,
            "/depenses",
            json!({
                "libelle": "Gasoil",
                "categorie": "carburant",
                "montant": 15_000,
                "date": Utc::now().date_naive().to_string(),
                "voiture_id": voiture,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = srv
        .get(&caissier, &format!("/simulateur/voitures/{voiture}?montant_compte=25000"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["nb_places"], 2);
    assert_eq!(body["depenses"], 15_000);
    assert_eq!(body["net_attendu"], 25_000);
    assert_eq!(body["statut"], "equilibre");

    let guichetier = mint_jwt(cooperative_id, "guichetier");
    let (status, _) = srv.post(&guichetier, "/simulateur", json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
