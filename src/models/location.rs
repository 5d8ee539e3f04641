use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;

/// Immutable reference data for a measurement location.
///
/// Locations are registered externally (database seed, `ext_id` ties a row
/// to the identifier used by the GeoServer side or by CSV exports).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, sqlx::FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub ext_id: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl Location {
    pub fn new(
        id: i64,
        name: String,
        country: String,
        ext_id: Option<String>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Self> {
        let location = Self {
            id,
            name,
            country,
            ext_id,
            latitude,
            longitude,
        };
        location.validate()?;
        Ok(location)
    }
}
