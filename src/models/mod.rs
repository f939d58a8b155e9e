pub mod location;
pub mod route;
pub mod user;

pub use location::Location;
pub use route::{Route, RouteStatus, Stop, UNASSIGNED};
pub use user::{User, UserRole};
