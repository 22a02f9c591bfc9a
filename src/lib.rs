pub mod bscscan;
pub mod caching;
pub mod env;
pub mod health;
pub mod log;
pub mod performance;
pub mod rate_limit;
pub mod registry;
mod serve;
pub mod supply;
pub mod units;

pub use serve::{make_router, start_server, ServeHealth, State};
