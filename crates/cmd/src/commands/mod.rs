pub mod analyze;
pub mod classify;
pub mod count;
pub mod sql;

pub use analyze::{AnalyzeOptions, analyze_command};
pub use classify::classify_command;
pub use count::count_command;
pub use sql::sql_command;
