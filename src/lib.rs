pub mod db;

pub mod accounts;
pub mod audit;
pub mod journal;
pub mod posting;
pub mod reports;

pub mod errors;
pub mod schema;

mod utils;

pub use errors::{Error, Result};
pub use posting::*;
pub use reports::*;
