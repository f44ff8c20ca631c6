pub mod formatting;

pub use formatting::{print_report, Report};
