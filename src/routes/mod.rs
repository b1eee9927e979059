mod auth;
mod health_check;
mod profile;

pub use auth::{login, refresh, register};
pub use health_check::{health_check, index};
pub use profile::get_profile;
