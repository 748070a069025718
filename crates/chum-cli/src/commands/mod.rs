//! Command implementations

mod export;
mod fetch;
mod list;
mod search;
mod show;
mod stats;

pub use export::cmd_export;
pub use fetch::cmd_fetch;
pub use list::cmd_list;
pub use search::cmd_search;
pub use show::cmd_show;
pub use stats::cmd_stats;
