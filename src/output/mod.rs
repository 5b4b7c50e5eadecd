pub mod formatters;

pub use formatters::{formatter_for, ConsoleFormatter, HtmlFormFormatter, JsonFormatter, SnapshotFormatter};
