mod auth;
mod content;
mod live;
mod reports;
mod students;
pub mod utils;

pub use utils::*;
