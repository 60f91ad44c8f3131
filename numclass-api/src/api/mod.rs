//! HTTP API handlers for numclass-api

pub mod buildinfo;
pub mod classify;
pub mod fun_fact;
pub mod health;

pub use buildinfo::get_build_info;
pub use classify::classify_number;
pub use fun_fact::get_fun_fact;
pub use health::health_routes;
