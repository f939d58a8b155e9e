// handlers/mod.rs - axum handlers, one module per resource.
// Handlers only unwrap the request; decisions live in the engine.

pub mod health;
pub mod routes;
pub mod shifts;
pub mod users;
