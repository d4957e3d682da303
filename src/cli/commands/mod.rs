//! CLI command implementations.

mod batch;
mod config;
mod doctor;
mod history;
mod sources;
mod url;

pub use batch::{parse_selection, run_batch, Selection};
pub use config::run_config;
pub use doctor::run_doctor;
pub use history::run_history;
pub use sources::run_sources;
pub use url::run_url;
