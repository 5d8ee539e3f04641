pub mod csv_source;
pub mod geoserver;

pub use csv_source::CsvSource;
pub use geoserver::{GeoServerConfig, GeoServerSource};

use crate::error::Result;
use crate::models::{Location, Observation};
use crate::utils::DateRange;

/// A backend that produces daily observations for a set of locations.
///
/// Implementations fail with `SourceUnavailable` when the backend cannot be
/// reached (connection or file error) and with `SourceFormat` when the
/// payload does not match the documented schema. Per-record problems
/// (unresolvable identity, missing value) are logged and skipped, never
/// fatal.
#[allow(async_fn_in_trait)]
pub trait ObservationSource {
    fn kind(&self) -> &'static str;

    async fn fetch(&self, locations: &[Location], range: &DateRange) -> Result<Vec<Observation>>;
}
