//! Single binary web server: admin triggers and read access for the finals engine.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Seed rosters with COMPETITIONS_CSV and TEAMS_CSV.

use actix_web::{
    get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use league_finals::{
    apply_result, bracket_view, build_bracket, champion, config::Config, kick_off_finals, resolve_draw,
    roster, standings, BracketStore, Competition, FinalsError, MatchKey, MatchResultEvent, MemoryStore,
    Round, Slot, Team, TeamStats,
};
use serde::Deserialize;
use uuid::Uuid;

type AppState = Data<MemoryStore>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Path segment: competition id (e.g. /api/competitions/{id})
#[derive(Deserialize)]
struct CompetitionPath {
    id: String,
}

/// Path segments: competition id, round and match number.
#[derive(Deserialize)]
struct MatchPath {
    id: String,
    round: String,
    number: u8,
}

#[derive(Deserialize)]
struct StandingsQuery {
    division: Option<String>,
}

/// One team as sent by the roster service.
#[derive(Deserialize)]
struct TeamBody {
    id: Option<Uuid>,
    name: String,
    #[serde(default)]
    division: Option<String>,
    #[serde(default)]
    stats: TeamStats,
}

#[derive(Deserialize)]
struct ResultBody {
    event_id: String,
    round: Round,
    match_number: u8,
    home_score: Option<u32>,
    away_score: Option<u32>,
    #[serde(default)]
    completed: bool,
}

#[derive(Deserialize)]
struct WinnerBody {
    slot: Slot,
}

fn error_response(e: &FinalsError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        FinalsError::CompetitionNotFound(_) | FinalsError::MatchNotFound { .. } => {
            HttpResponse::NotFound().json(body)
        }
        FinalsError::Store(_) => HttpResponse::InternalServerError().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn respond<T: serde::Serialize>(result: Result<T, FinalsError>) -> HttpResponse {
    match result {
        Ok(v) => HttpResponse::Ok().json(v),
        Err(e) => error_response(&e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "league-finals",
    })
}

/// List registered competitions.
#[get("/api/competitions")]
async fn api_list_competitions(state: AppState) -> HttpResponse {
    respond(state.competitions().map_err(FinalsError::from))
}

/// Register or rename a competition.
#[post("/api/competitions")]
async fn api_upsert_competition(state: AppState, body: Json<Competition>) -> HttpResponse {
    let competition = body.into_inner();
    respond(
        state
            .upsert_competition(competition.clone())
            .map(|()| competition)
            .map_err(FinalsError::from),
    )
}

/// Roster sync: replace the teams of a competition. Finals flags of known team ids are kept.
#[put("/api/competitions/{id}/teams")]
async fn api_replace_teams(state: AppState, path: Path<CompetitionPath>, body: Json<Vec<TeamBody>>) -> HttpResponse {
    let existing = match state.teams(&path.id) {
        Ok(t) => t,
        Err(e) => return error_response(&e.into()),
    };
    let teams: Vec<Team> = body
        .into_inner()
        .into_iter()
        .map(|b| {
            let mut team = Team::new(b.name, path.id.clone()).with_stats(b.stats);
            team.division = b.division;
            if let Some(id) = b.id {
                team.id = id;
                team.eliminated = existing.iter().find(|t| t.id == id).and_then(|t| t.eliminated);
            }
            team
        })
        .collect();
    respond(
        state
            .replace_teams(&path.id, teams)
            .and_then(|()| state.teams(&path.id))
            .map_err(FinalsError::from),
    )
}

/// League table, optionally for one division.
#[get("/api/competitions/{id}/standings")]
async fn api_standings(state: AppState, path: Path<CompetitionPath>, query: Query<StandingsQuery>) -> HttpResponse {
    respond(standings(state.get_ref(), &path.id, query.division.as_deref()))
}

/// Kick off finals: flag qualifiers and eliminated teams.
#[post("/api/competitions/{id}/finals/kickoff")]
async fn api_kickoff(state: AppState, path: Path<CompetitionPath>) -> HttpResponse {
    respond(kick_off_finals(state.get_ref(), &path.id))
}

/// (Re)build the knockout bracket from current qualifiers.
#[post("/api/competitions/{id}/bracket")]
async fn api_build_bracket(state: AppState, path: Path<CompetitionPath>) -> HttpResponse {
    respond(build_bracket(state.get_ref(), &path.id))
}

/// Bracket grouped by round, for rendering.
#[get("/api/competitions/{id}/bracket")]
async fn api_get_bracket(state: AppState, path: Path<CompetitionPath>) -> HttpResponse {
    respond(bracket_view(state.get_ref(), &path.id))
}

#[get("/api/competitions/{id}/champion")]
async fn api_champion(state: AppState, path: Path<CompetitionPath>) -> HttpResponse {
    match champion(state.get_ref(), &path.id) {
        Ok(Some(team)) => HttpResponse::Ok().json(team),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({ "error": "No champion yet" })),
        Err(e) => error_response(&e),
    }
}

/// Match result event from the scheduling calendar.
#[post("/api/competitions/{id}/results")]
async fn api_match_result(state: AppState, path: Path<CompetitionPath>, body: Json<ResultBody>) -> HttpResponse {
    let body = body.into_inner();
    let event = MatchResultEvent {
        event_id: body.event_id,
        competition: path.id.clone(),
        round: body.round,
        match_number: body.match_number,
        home_score: body.home_score,
        away_score: body.away_score,
        completed: body.completed,
    };
    respond(apply_result(state.get_ref(), &event))
}

/// Manually decide a drawn match.
#[put("/api/competitions/{id}/bracket/{round}/{number}/winner")]
async fn api_resolve_draw(state: AppState, path: Path<MatchPath>, body: Json<WinnerBody>) -> HttpResponse {
    let round: Round = match path.round.parse() {
        Ok(r) => r,
        Err(s) => return error_response(&FinalsError::InvalidRound(s)),
    };
    respond(resolve_draw(
        state.get_ref(),
        &path.id,
        MatchKey::new(round, path.number),
        body.slot,
    ))
}

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_list_competitions)
        .service(api_upsert_competition)
        .service(api_replace_teams)
        .service(api_standings)
        .service(api_kickoff)
        .service(api_build_bracket)
        .service(api_get_bracket)
        .service(api_champion)
        .service(api_match_result)
        .service(api_resolve_draw);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let store = MemoryStore::new();
    match (&config.competitions_csv, &config.teams_csv) {
        (Some(competitions), Some(teams)) => {
            if let Err(e) = roster::load_files(&store, competitions, teams) {
                log::error!("Roster import failed: {}", e);
                return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()));
            }
        }
        (None, None) => log::info!("No roster files configured; starting empty"),
        _ => log::warn!("Set both COMPETITIONS_CSV and TEAMS_CSV to import rosters; starting empty"),
    }

    let bind = (config.host.as_str(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(store);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(bind)?
        .run()
        .await
}
