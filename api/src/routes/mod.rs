pub mod health_route;
pub mod query;
pub mod suggestions_route;
