pub mod aggregate;
pub mod location;
pub mod observation;
pub mod variable;

pub use aggregate::{ClimatologyNormal, MonthlyAggregate};
pub use location::Location;
pub use observation::Observation;
pub use variable::{ClimateVariable, Reducer};
