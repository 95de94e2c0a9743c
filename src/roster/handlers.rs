// HTTP handlers for /api/teams and /api/players

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::error::ApiError;
use crate::roster::{
    models::{
        CreatePlayer, CreateTeam, Player, PlayerFilter, Team, TeamFilter, UpdatePlayer, UpdateTeam,
    },
    repository::RosterRepository,
};

/// List teams, optionally filtered by name and status
#[utoipa::path(
    get,
    path = "/api/teams",
    params(TeamFilter),
    responses(
        (status = 200, description = "Matching teams", body = [Team]),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn list_teams(
    State(repo): State<RosterRepository>,
    Query(filter): Query<TeamFilter>,
) -> Result<Json<Vec<Team>>, ApiError> {
    tracing::debug!("Listing teams with filter: {:?}", filter);
    let teams = repo.list_teams(&filter).await?;
    tracing::debug!("Retrieved {} teams", teams.len());
    Ok(Json(teams))
}

/// Get a team by id
#[utoipa::path(
    get,
    path = "/api/teams/{id}",
    params(("id" = i64, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team found", body = Team),
        (status = 404, description = "Team not found", body = String, example = json!({"error": "Team with id 1 not found"}))
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn get_team(
    State(repo): State<RosterRepository>,
    Path(id): Path<i64>,
) -> Result<Json<Team>, ApiError> {
    Ok(Json(repo.find_team(id).await?))
}

/// List the players of a team
#[utoipa::path(
    get,
    path = "/api/teams/{id}/players",
    params(("id" = i64, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team roster", body = [Player]),
        (status = 404, description = "Team not found")
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn get_team_players(
    State(repo): State<RosterRepository>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Player>>, ApiError> {
    Ok(Json(repo.team_players(id).await?))
}

/// Create a team (ADMIN)
#[utoipa::path(
    post,
    path = "/api/teams",
    request_body = CreateTeam,
    responses(
        (status = 201, description = "Team created", body = Team),
        (status = 400, description = "Invalid input data"),
        (status = 403, description = "Access denied"),
        (status = 409, description = "Team name already exists", body = String, example = json!({"error": "Team with name 'Boston Celtics' already exists"}))
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn create_team(
    State(repo): State<RosterRepository>,
    Json(payload): Json<CreateTeam>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    payload.validate()?;
    let team = repo.create_team(payload).await?;
    tracing::info!("Created team {} ('{}')", team.id, team.name);
    Ok((StatusCode::CREATED, Json(team)))
}

/// Update a team (ADMIN)
#[utoipa::path(
    put,
    path = "/api/teams/{id}",
    params(("id" = i64, Path, description = "Team ID")),
    request_body = UpdateTeam,
    responses(
        (status = 200, description = "Team updated", body = Team),
        (status = 400, description = "Invalid input data"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Team not found"),
        (status = 409, description = "Team name already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn update_team(
    State(repo): State<RosterRepository>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTeam>,
) -> Result<Json<Team>, ApiError> {
    payload.validate()?;
    let team = repo.update_team(id, payload).await?;
    tracing::info!("Updated team {}", id);
    Ok(Json(team))
}

/// Delete a team and its players (ADMIN)
#[utoipa::path(
    delete,
    path = "/api/teams/{id}",
    params(("id" = i64, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Team not found")
    ),
    security(("bearer_auth" = [])),
    tag = "teams"
)]
pub async fn delete_team(
    State(repo): State<RosterRepository>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    repo.delete_team(id).await?;
    tracing::info!("Deleted team {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// List players, optionally filtered
#[utoipa::path(
    get,
    path = "/api/players",
    params(PlayerFilter),
    responses(
        (status = 200, description = "Matching players", body = [Player]),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "players"
)]
pub async fn list_players(
    State(repo): State<RosterRepository>,
    Query(filter): Query<PlayerFilter>,
) -> Result<Json<Vec<Player>>, ApiError> {
    tracing::debug!("Listing players with filter: {:?}", filter);
    let players = repo.list_players(&filter).await?;
    tracing::debug!("Retrieved {} players", players.len());
    Ok(Json(players))
}

/// Get a player by id
#[utoipa::path(
    get,
    path = "/api/players/{id}",
    params(("id" = i64, Path, description = "Player ID")),
    responses(
        (status = 200, description = "Player found", body = Player),
        (status = 404, description = "Player not found", body = String, example = json!({"error": "Player with id 1 not found"}))
    ),
    security(("bearer_auth" = [])),
    tag = "players"
)]
pub async fn get_player(
    State(repo): State<RosterRepository>,
    Path(id): Path<i64>,
) -> Result<Json<Player>, ApiError> {
    Ok(Json(repo.find_player(id).await?))
}

/// Create a player (ADMIN)
#[utoipa::path(
    post,
    path = "/api/players",
    request_body = CreatePlayer,
    responses(
        (status = 201, description = "Player created", body = Player),
        (status = 400, description = "Invalid input data or unknown team"),
        (status = 403, description = "Access denied")
    ),
    security(("bearer_auth" = [])),
    tag = "players"
)]
pub async fn create_player(
    State(repo): State<RosterRepository>,
    Json(payload): Json<CreatePlayer>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    payload.validate()?;
    let player = repo.create_player(payload).await?;
    tracing::info!("Created player {} ('{}')", player.id, player.name);
    Ok((StatusCode::CREATED, Json(player)))
}

/// Update a player (ADMIN)
#[utoipa::path(
    put,
    path = "/api/players/{id}",
    params(("id" = i64, Path, description = "Player ID")),
    request_body = UpdatePlayer,
    responses(
        (status = 200, description = "Player updated", body = Player),
        (status = 400, description = "Invalid input data or unknown team"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Player not found")
    ),
    security(("bearer_auth" = [])),
    tag = "players"
)]
pub async fn update_player(
    State(repo): State<RosterRepository>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePlayer>,
) -> Result<Json<Player>, ApiError> {
    payload.validate()?;
    let player = repo.update_player(id, payload).await?;
    tracing::info!("Updated player {}", id);
    Ok(Json(player))
}

/// Delete a player (ADMIN)
#[utoipa::path(
    delete,
    path = "/api/players/{id}",
    params(("id" = i64, Path, description = "Player ID")),
    responses(
        (status = 204, description = "Player deleted"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Player not found")
    ),
    security(("bearer_auth" = [])),
    tag = "players"
)]
pub async fn delete_player(
    State(repo): State<RosterRepository>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    repo.delete_player(id).await?;
    tracing::info!("Deleted player {}", id);
    Ok(StatusCode::NO_CONTENT)
}
