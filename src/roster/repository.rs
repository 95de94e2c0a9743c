use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::ApiError;
use crate::roster::models::{
    CreatePlayer, CreateTeam, Player, PlayerFilter, PlayerRow, Team, TeamFilter, UpdatePlayer,
    UpdateTeam,
};

const TEAM_COLUMNS: &str = "id, name, city, country, founding_year, active";
const PLAYER_COLUMNS: &str = "id, name, jersey_number, team_id, country_of_origin, birth_date, \
     position, height_cm, weight_kg, photo_url, active";

/// Builds the filtered team listing query
///
/// Filters are joined with AND; every value is a bound parameter.
pub fn team_query(filter: &TeamFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM teams", TEAM_COLUMNS));
    let mut clauses = Clauses::default();

    if let Some(search) = filter.search_term() {
        clauses.next(&mut builder).push("name ILIKE ");
        builder.push_bind(contains_pattern(search));
        builder.push(LIKE_ESCAPE);
    }
    if let Some(active) = filter.active {
        clauses.next(&mut builder).push("active = ");
        builder.push_bind(active);
    }

    builder.push(" ORDER BY name");
    builder
}

/// Builds the filtered player listing query
pub fn player_query(filter: &PlayerFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM players", PLAYER_COLUMNS));
    let mut clauses = Clauses::default();

    if let Some(search) = filter.search_term() {
        clauses.next(&mut builder).push("name ILIKE ");
        builder.push_bind(contains_pattern(search));
        builder.push(LIKE_ESCAPE);
    }
    if let Some(team_id) = filter.team_id {
        clauses.next(&mut builder).push("team_id = ");
        builder.push_bind(team_id);
    }
    if let Some(active) = filter.active {
        clauses.next(&mut builder).push("active = ");
        builder.push_bind(active);
    }
    if let Some(country) = filter.country.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        clauses.next(&mut builder).push("country_of_origin ILIKE ");
        builder.push_bind(escape_like(country));
        builder.push(LIKE_ESCAPE);
    }

    builder.push(" ORDER BY name");
    builder
}

const LIKE_ESCAPE: &str = " ESCAPE '\\'";

/// Escapes LIKE metacharacters so user input matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring pattern for `term`
fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

// Emits " WHERE " before the first clause and " AND " before the rest
#[derive(Default)]
struct Clauses {
    started: bool,
}

impl Clauses {
    fn next<'b, 'args>(
        &mut self,
        builder: &'b mut QueryBuilder<'args, Postgres>,
    ) -> &'b mut QueryBuilder<'args, Postgres> {
        builder.push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
        builder
    }
}

fn map_team_write_error(error: sqlx::Error, name: &str) -> ApiError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::Conflict {
            message: format!("Team with name '{}' already exists", name),
        },
        _ => ApiError::DatabaseError(error),
    }
}

fn map_player_write_error(error: sqlx::Error, team_id: Option<i64>) -> ApiError {
    match &error {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => ApiError::InvalidReference {
            message: match team_id {
                Some(id) => format!("Team with id {} does not exist", id),
                None => "Referenced team does not exist".to_string(),
            },
        },
        _ => ApiError::DatabaseError(error),
    }
}

/// Data access for teams and players.
///
/// Expects these tables:
/// `teams(id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL UNIQUE, city TEXT,
///  country TEXT, founding_year INT, active BOOLEAN NOT NULL DEFAULT TRUE)`
/// `players(id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL, jersey_number INT,
///  team_id BIGINT REFERENCES teams(id), country_of_origin TEXT, birth_date DATE,
///  position TEXT, height_cm DOUBLE PRECISION, weight_kg DOUBLE PRECISION,
///  photo_url TEXT, active BOOLEAN NOT NULL DEFAULT TRUE)`
#[derive(Clone)]
pub struct RosterRepository {
    pool: PgPool,
}

impl RosterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_teams(&self, filter: &TeamFilter) -> Result<Vec<Team>, ApiError> {
        let mut query = team_query(filter);
        let teams = query
            .build_query_as::<Team>()
            .fetch_all(&self.pool)
            .await?;
        Ok(teams)
    }

    pub async fn find_team(&self, id: i64) -> Result<Team, ApiError> {
        sqlx::query_as::<_, Team>(&format!("SELECT {} FROM teams WHERE id = $1", TEAM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ApiError::NotFound { resource: "Team", id })
    }

    pub async fn create_team(&self, team: CreateTeam) -> Result<Team, ApiError> {
        sqlx::query_as::<_, Team>(&format!(
            "INSERT INTO teams (name, city, country, founding_year, active) \
             VALUES ($1, $2, $3, $4, TRUE) RETURNING {}",
            TEAM_COLUMNS
        ))
        .bind(&team.name)
        .bind(&team.city)
        .bind(&team.country)
        .bind(team.founding_year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_team_write_error(e, &team.name))
    }

    /// Applies a partial update; omitted fields keep their stored values
    pub async fn update_team(&self, id: i64, changes: UpdateTeam) -> Result<Team, ApiError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, Team>(&format!(
            "SELECT {} FROM teams WHERE id = $1 FOR UPDATE",
            TEAM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound { resource: "Team", id })?;

        let name = changes.name.unwrap_or(existing.name);
        let updated = sqlx::query_as::<_, Team>(&format!(
            "UPDATE teams SET name = $1, city = $2, country = $3, founding_year = $4, active = $5 \
             WHERE id = $6 RETURNING {}",
            TEAM_COLUMNS
        ))
        .bind(&name)
        .bind(changes.city.or(existing.city))
        .bind(changes.country.or(existing.country))
        .bind(changes.founding_year.or(existing.founding_year))
        .bind(changes.active.unwrap_or(existing.active))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_team_write_error(e, &name))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes a team together with its players
    pub async fn delete_team(&self, id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let players = sqlx::query("DELETE FROM players WHERE team_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(ApiError::NotFound { resource: "Team", id });
        }

        tx.commit().await?;
        tracing::debug!("Deleted team {} and {} players", id, players);
        Ok(())
    }

    pub async fn team_players(&self, id: i64) -> Result<Vec<Player>, ApiError> {
        // Distinguish an empty roster from an unknown team
        self.find_team(id).await?;

        let filter = PlayerFilter {
            team_id: Some(id),
            ..Default::default()
        };
        self.list_players(&filter).await
    }

    pub async fn list_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>, ApiError> {
        let mut query = player_query(filter);
        let rows = query
            .build_query_as::<PlayerRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Player::from).collect())
    }

    pub async fn find_player(&self, id: i64) -> Result<Player, ApiError> {
        sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {} FROM players WHERE id = $1",
            PLAYER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Player::from)
        .ok_or(ApiError::NotFound { resource: "Player", id })
    }

    pub async fn create_player(&self, player: CreatePlayer) -> Result<Player, ApiError> {
        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            "INSERT INTO players (name, jersey_number, team_id, country_of_origin, birth_date, \
             position, height_cm, weight_kg, photo_url, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE) RETURNING {}",
            PLAYER_COLUMNS
        ))
        .bind(&player.name)
        .bind(player.jersey_number)
        .bind(player.team_id)
        .bind(&player.country_of_origin)
        .bind(player.birth_date)
        .bind(player.position.map(|p| p.code()))
        .bind(player.height_cm)
        .bind(player.weight_kg)
        .bind(&player.photo_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_player_write_error(e, player.team_id))?;

        Ok(Player::from(row))
    }

    /// Applies a partial update; omitted fields keep their stored values
    pub async fn update_player(&self, id: i64, changes: UpdatePlayer) -> Result<Player, ApiError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, PlayerRow>(&format!(
            "SELECT {} FROM players WHERE id = $1 FOR UPDATE",
            PLAYER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound { resource: "Player", id })?;

        let team_id = changes.team_id.or(existing.team_id);
        let position = changes
            .position
            .map(|p| p.code().to_string())
            .or(existing.position);

        let row = sqlx::query_as::<_, PlayerRow>(&format!(
            "UPDATE players SET name = $1, jersey_number = $2, team_id = $3, \
             country_of_origin = $4, birth_date = $5, position = $6, height_cm = $7, \
             weight_kg = $8, photo_url = $9, active = $10 WHERE id = $11 RETURNING {}",
            PLAYER_COLUMNS
        ))
        .bind(changes.name.unwrap_or(existing.name))
        .bind(changes.jersey_number.or(existing.jersey_number))
        .bind(team_id)
        .bind(changes.country_of_origin.or(existing.country_of_origin))
        .bind(changes.birth_date.or(existing.birth_date))
        .bind(position)
        .bind(changes.height_cm.or(existing.height_cm))
        .bind(changes.weight_kg.or(existing.weight_kg))
        .bind(changes.photo_url.or(existing.photo_url))
        .bind(changes.active.unwrap_or(existing.active))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_player_write_error(e, team_id))?;

        tx.commit().await?;
        Ok(Player::from(row))
    }

    pub async fn delete_player(&self, id: i64) -> Result<(), ApiError> {
        let deleted = sqlx::query("DELETE FROM players WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(ApiError::NotFound { resource: "Player", id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_query_without_filters() {
        let filter = TeamFilter::default();
        let builder = team_query(&filter);

        assert_eq!(
            builder.sql(),
            "SELECT id, name, city, country, founding_year, active FROM teams ORDER BY name"
        );
    }

    #[test]
    fn test_team_query_with_filters() {
        let filter = TeamFilter {
            search: Some("lakers".to_string()),
            active: Some(true),
        };
        let builder = team_query(&filter);
        let sql = builder.sql();

        assert!(sql.contains(" WHERE name ILIKE $1 ESCAPE '\\' AND active = $2 ORDER BY name"));
    }

    #[test]
    fn test_player_query_combined_filters() {
        let filter = PlayerFilter {
            search: Some("curry".to_string()),
            team_id: Some(2),
            active: None,
            country: Some("USA".to_string()),
        };
        let builder = player_query(&filter);
        let sql = builder.sql();

        assert!(sql.starts_with("SELECT id, name, jersey_number"));
        assert!(sql.contains(
            " WHERE name ILIKE $1 ESCAPE '\\' AND team_id = $2 \
             AND country_of_origin ILIKE $3 ESCAPE '\\' ORDER BY name"
        ));
        assert!(!sql.contains("active ="));
    }

    #[test]
    fn test_like_metacharacters_are_escaped() {
        assert_eq!(escape_like("a_b%"), "a\\_b\\%");
        assert_eq!(escape_like(r"c:\temp"), r"c:\\temp");
        assert_eq!(escape_like("Lakers"), "Lakers");
        assert_eq!(contains_pattern("a_b%"), "%a\\_b\\%%");
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let filter = PlayerFilter {
            search: Some("  ".to_string()),
            country: Some("".to_string()),
            ..Default::default()
        };
        let builder = player_query(&filter);

        assert!(!builder.sql().contains("WHERE"));
    }

    #[test]
    fn test_non_database_write_errors_pass_through() {
        let error = map_team_write_error(sqlx::Error::RowNotFound, "Celtics");
        assert!(matches!(error, ApiError::DatabaseError(_)));

        let error = map_player_write_error(sqlx::Error::PoolTimedOut, Some(9));
        assert!(matches!(error, ApiError::DatabaseError(_)));
    }
}
