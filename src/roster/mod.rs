// Roster module
// Team and player CRUD over Postgres

pub mod handlers;
pub mod models;
pub mod repository;

pub use models::{
    CreatePlayer, CreateTeam, Player, PlayerFilter, Position, Team, TeamFilter, UpdatePlayer,
    UpdateTeam,
};
pub use repository::RosterRepository;
