pub mod drill_handlers;
pub mod filter_handlers;

pub use drill_handlers::{run_drill_steps, DrillReport};
pub use filter_handlers::{apply_filter_change, parse_filter_change, FilterSummary};
