use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::validation::{validate_not_blank, validate_positive_measurement};

/// Playing position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
}

impl Position {
    /// Short code stored in the database
    pub fn code(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PG" => Some(Position::PointGuard),
            "SG" => Some(Position::ShootingGuard),
            "SF" => Some(Position::SmallForward),
            "PF" => Some(Position::PowerForward),
            "C" => Some(Position::Center),
            _ => None,
        }
    }
}

/// A team in the league
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Team {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Los Angeles Lakers")]
    pub name: String,
    #[schema(example = "Los Angeles")]
    pub city: Option<String>,
    #[schema(example = "USA")]
    pub country: Option<String>,
    #[schema(example = 1947)]
    pub founding_year: Option<i32>,
    #[schema(example = true)]
    pub active: bool,
}

/// Data needed to create a team
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateTeam {
    #[validate(custom = "validate_not_blank", length(max = 100))]
    #[schema(example = "Boston Celtics")]
    pub name: String,
    #[schema(example = "Boston")]
    pub city: Option<String>,
    #[schema(example = "USA")]
    pub country: Option<String>,
    #[validate(range(min = 1800, max = 2100))]
    #[schema(example = 1946)]
    pub founding_year: Option<i32>,
}

/// Partial team update; omitted fields keep their values
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateTeam {
    #[validate(custom = "validate_not_blank", length(max = 100))]
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[validate(range(min = 1800, max = 2100))]
    pub founding_year: Option<i32>,
    pub active: Option<bool>,
}

/// Row shape of the `players` table
#[derive(Debug, Clone, FromRow)]
pub struct PlayerRow {
    pub id: i64,
    pub name: String,
    pub jersey_number: Option<i32>,
    pub team_id: Option<i64>,
    pub country_of_origin: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub position: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub photo_url: Option<String>,
    pub active: bool,
}

/// A player
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Player {
    #[schema(example = 23)]
    pub id: i64,
    #[schema(example = "LeBron James")]
    pub name: String,
    #[schema(example = 23)]
    pub jersey_number: Option<i32>,
    #[schema(example = 1)]
    pub team_id: Option<i64>,
    #[schema(example = "USA")]
    pub country_of_origin: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub position: Option<Position>,
    #[schema(example = 206.0)]
    pub height_cm: Option<f64>,
    #[schema(example = 113.0)]
    pub weight_kg: Option<f64>,
    pub photo_url: Option<String>,
    pub active: bool,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            jersey_number: row.jersey_number,
            team_id: row.team_id,
            country_of_origin: row.country_of_origin,
            birth_date: row.birth_date,
            position: row.position.as_deref().and_then(Position::from_code),
            height_cm: row.height_cm,
            weight_kg: row.weight_kg,
            photo_url: row.photo_url,
            active: row.active,
        }
    }
}

/// Data needed to create a player
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePlayer {
    #[validate(custom = "validate_not_blank", length(max = 100))]
    #[schema(example = "Stephen Curry")]
    pub name: String,
    #[validate(range(min = 0, max = 99))]
    #[schema(example = 30)]
    pub jersey_number: Option<i32>,
    pub team_id: Option<i64>,
    pub country_of_origin: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub position: Option<Position>,
    #[validate(custom = "validate_positive_measurement")]
    pub height_cm: Option<f64>,
    #[validate(custom = "validate_positive_measurement")]
    pub weight_kg: Option<f64>,
    #[validate(url)]
    pub photo_url: Option<String>,
}

/// Partial player update; omitted fields keep their values
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePlayer {
    #[validate(custom = "validate_not_blank", length(max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 99))]
    pub jersey_number: Option<i32>,
    pub team_id: Option<i64>,
    pub country_of_origin: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub position: Option<Position>,
    #[validate(custom = "validate_positive_measurement")]
    pub height_cm: Option<f64>,
    #[validate(custom = "validate_positive_measurement")]
    pub weight_kg: Option<f64>,
    #[validate(url)]
    pub photo_url: Option<String>,
    pub active: Option<bool>,
}

/// Filters for GET /api/teams
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeamFilter {
    /// Case-insensitive substring of the team name
    pub search: Option<String>,
    pub active: Option<bool>,
}

/// Filters for GET /api/players
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlayerFilter {
    /// Case-insensitive substring of the player name
    pub search: Option<String>,
    pub team_id: Option<i64>,
    pub active: Option<bool>,
    pub country: Option<String>,
}

impl PlayerFilter {
    /// Blank search terms mean "no filter"
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

impl TeamFilter {
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_codes() {
        for position in [
            Position::PointGuard,
            Position::ShootingGuard,
            Position::SmallForward,
            Position::PowerForward,
            Position::Center,
        ] {
            assert_eq!(Position::from_code(position.code()), Some(position));
        }
        assert_eq!(Position::from_code("XX"), None);
        assert_eq!(
            serde_json::to_string(&Position::PointGuard).unwrap(),
            "\"POINT_GUARD\""
        );
    }

    #[test]
    fn test_player_from_row_maps_position() {
        let row = PlayerRow {
            id: 30,
            name: "Stephen Curry".to_string(),
            jersey_number: Some(30),
            team_id: Some(2),
            country_of_origin: Some("USA".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1988, 3, 14),
            position: Some("PG".to_string()),
            height_cm: Some(188.0),
            weight_kg: Some(84.0),
            photo_url: None,
            active: true,
        };

        let player = Player::from(row);
        assert_eq!(player.position, Some(Position::PointGuard));
        assert_eq!(player.jersey_number, Some(30));
    }

    #[test]
    fn test_create_player_validation() {
        let json = r#"{
            "name": "Stephen Curry",
            "jersey_number": 30,
            "position": "POINT_GUARD",
            "height_cm": 188.0,
            "birth_date": "1988-03-14"
        }"#;
        let player: CreatePlayer = serde_json::from_str(json).unwrap();
        assert!(player.validate().is_ok());
        assert_eq!(player.position, Some(Position::PointGuard));

        let mut invalid = player.clone();
        invalid.jersey_number = Some(100);
        assert!(invalid.validate().is_err());

        let mut invalid = player.clone();
        invalid.name = "  ".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = player;
        invalid.height_cm = Some(-1.0);
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_update_team_partial() {
        let update: UpdateTeam = serde_json::from_str(r#"{"city": "Brooklyn"}"#).unwrap();
        assert_eq!(update.city.as_deref(), Some("Brooklyn"));
        assert!(update.name.is_none());
        assert!(update.validate().is_ok());

        let update: UpdateTeam = serde_json::from_str(r#"{"founding_year": 1700}"#).unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_blank_search_is_no_filter() {
        let filter = PlayerFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), None);

        let filter = TeamFilter {
            search: Some(" lak ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), Some("lak"));
    }
}
