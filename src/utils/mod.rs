pub mod constants;
pub mod dates;
pub mod progress;

pub use constants::*;
pub use dates::{month_span, DateRange};
pub use progress::ProgressReporter;
