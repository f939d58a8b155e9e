pub mod fixture;
pub mod health;
pub mod routes;
pub mod shifts;
