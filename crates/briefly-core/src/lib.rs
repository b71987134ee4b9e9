pub mod budget;
pub mod config;
pub mod error;
pub mod hash;
pub mod store;
pub mod types;

pub use budget::RateBudget;
pub use config::Config;
pub use error::BrieflyError;
pub use hash::content_hash;
pub use store::{PgStore, Store};
