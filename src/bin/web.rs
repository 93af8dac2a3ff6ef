//! Single binary web server: read-only JSON API over the tournament engine.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, EVENT_LOG (JSON array of events),
//! LEGACY_TOURNAMENTS (JSON array of tournament configs), SIMULATION_COUNT, SIMULATION_SEED.

use actix_web::{
    get, post,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use ladder_tournaments::{
    now_millis, spawn_prediction, write_csv, EloOracle, Event, PredictionConfig, ReadModel, TournamentCache,
    TournamentConfig, TournamentError, TournamentSummary,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::RwLock;

/// Event log snapshot, its projection and the tournaments built from it.
struct LadderState {
    events: Vec<Event>,
    model: ReadModel,
    cache: TournamentCache,
    prediction: PredictionConfig,
}

type AppState = Data<RwLock<LadderState>>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct PairQuery {
    player1: String,
    player2: String,
}

#[derive(Deserialize)]
struct PredictionQuery {
    #[serde(default)]
    format: Option<String>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: String,
}

/// Path segment: player id (e.g. /api/players/{player}/pending-games)
#[derive(Deserialize)]
struct PlayerPath {
    player: String,
}

fn error_body(e: impl ToString) -> serde_json::Value {
    serde_json::json!({ "error": e.to_string() })
}

fn error_response(e: &TournamentError) -> HttpResponse {
    match e {
        TournamentError::UnknownTournament(_) => HttpResponse::NotFound().json(error_body(e)),
        _ => HttpResponse::InternalServerError().json(error_body(e)),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "ladder-tournaments",
    })
}

/// List all tournaments that built successfully.
#[get("/api/tournaments")]
async fn api_list_tournaments(state: AppState) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let s = &mut *g;
    let summaries: Vec<TournamentSummary> = s.cache.get(&s.model, now_millis()).iter().map(|t| t.summary()).collect();
    HttpResponse::Ok().json(summaries)
}

/// Full view of one tournament: stage, groups, bracket, signups.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let s = &mut *g;
    match s.cache.get(&s.model, now_millis()).lookup(&path.id) {
        Ok(t) => HttpResponse::Ok().json(t.view()),
        Err(e) => error_response(&e),
    }
}

/// Pending tournament games between two players, across all tournaments.
#[get("/api/pending-games")]
async fn api_pending_games(state: AppState, query: Query<PairQuery>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let s = &mut *g;
    let games = s
        .cache
        .get(&s.model, now_millis())
        .find_all_pending_games(&query.player1, &query.player2);
    HttpResponse::Ok().json(games)
}

/// Pending tournament games of one player.
#[get("/api/players/{player}/pending-games")]
async fn api_player_pending_games(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let s = &mut *g;
    let games = s
        .cache
        .get(&s.model, now_millis())
        .find_all_pending_games_by_player(&path.player);
    HttpResponse::Ok().json(games)
}

/// Append an already accepted event and drop the cached tournaments.
#[post("/api/events")]
async fn api_append_event(state: AppState, body: Json<Event>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let s = &mut *g;
    let event = body.into_inner();
    log::info!("appending event at {}", event.time());
    s.events.push(event);
    s.model = ReadModel::from_events(&s.events);
    s.cache.invalidate();
    HttpResponse::Ok().json(serde_json::json!({ "events": s.events.len() }))
}

/// Win probability series for one tournament (JSON, or CSV with ?format=csv).
#[get("/api/tournaments/{id}/prediction")]
async fn api_prediction(state: AppState, path: Path<TournamentPath>, query: Query<PredictionQuery>) -> HttpResponse {
    let (events, legacy, config) = match state.read() {
        Ok(g) => (g.events.clone(), g.cache.legacy().to_vec(), g.prediction.clone()),
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let id = path.into_inner().id;
    let worker = spawn_prediction(events, id, now_millis(), config, legacy, EloOracle::from_model);
    let results = match web::block(move || worker.collect_results()).await {
        Ok(Ok(results)) => results,
        Ok(Err(e)) => return HttpResponse::InternalServerError().json(error_body(e)),
        Err(e) => return HttpResponse::InternalServerError().json(error_body(e)),
    };

    if query.format.as_deref() == Some("csv") {
        let mut body = Vec::new();
        return match write_csv(&results, &mut body) {
            Ok(()) => HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(body),
            Err(e) => HttpResponse::InternalServerError().json(error_body(e)),
        };
    }
    HttpResponse::Ok().json(results)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_event_log() -> String {
    "data/events.json".to_string()
}

fn default_legacy_tournaments() -> String {
    "data/tournaments.json".to_string()
}

/// Read a JSON array from `path`; a missing file is an empty list.
async fn load_json_list<T: DeserializeOwned>(path: &str) -> std::io::Result<Vec<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => serde_json::from_str(&text).map_err(std::io::Error::other),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("{} not found, starting empty", path);
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

fn prediction_config_from_env() -> PredictionConfig {
    let defaults = PredictionConfig::default();
    PredictionConfig {
        simulation_count: std::env::var("SIMULATION_COUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.simulation_count),
        seed: std::env::var("SIMULATION_SEED").ok().and_then(|v| v.parse().ok()),
        ..defaults
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let event_log = std::env::var("EVENT_LOG").unwrap_or_else(|_| default_event_log());
    let legacy_path = std::env::var("LEGACY_TOURNAMENTS").unwrap_or_else(|_| default_legacy_tournaments());

    let events: Vec<Event> = load_json_list(&event_log).await?;
    let legacy: Vec<TournamentConfig> = load_json_list(&legacy_path).await?;
    log::info!(
        "Loaded {} events and {} legacy tournaments",
        events.len(),
        legacy.len()
    );

    let state = Data::new(RwLock::new(LadderState {
        model: ReadModel::from_events(&events),
        events,
        cache: TournamentCache::new(legacy),
        prediction: prediction_config_from_env(),
    }));

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_list_tournaments)
            .service(api_get_tournament)
            .service(api_pending_games)
            .service(api_player_pending_games)
            .service(api_append_event)
            .service(api_prediction)
    })
    .bind(bind)?
    .run()
    .await
}
