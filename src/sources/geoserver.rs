use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{EtlError, Result};
use crate::models::{ClimateVariable, Location, Observation};
use crate::sources::ObservationSource;
use crate::utils::constants::{
    ENV_GEOSERVER_PASSWORD, ENV_GEOSERVER_URL, ENV_GEOSERVER_USERNAME, GEOSERVER_LAYER_SUFFIX,
    WFS_OUTPUT_FORMAT, WFS_VERSION,
};
use crate::utils::{DateRange, ProgressReporter};

/// Connection settings for a GeoServer instance.
///
/// The workspace is derived from the country being processed; each climate
/// variable is published as a `<short_name>_daily` feature layer inside it.
#[derive(Debug, Clone)]
pub struct GeoServerConfig {
    pub base_url: String,
    pub workspace: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl GeoServerConfig {
    /// Build a configuration from the environment (`GEOSERVER_URL`, with
    /// optional `GEOSERVER_USERNAME` / `GEOSERVER_PASSWORD` for basic auth).
    pub fn from_env(country: &str) -> Result<Self> {
        let base_url = std::env::var(ENV_GEOSERVER_URL).map_err(|_| {
            EtlError::Config(format!(
                "{} must be set when using the geoserver source",
                ENV_GEOSERVER_URL
            ))
        })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            workspace: country.trim().to_lowercase(),
            username: std::env::var(ENV_GEOSERVER_USERNAME).ok(),
            password: std::env::var(ENV_GEOSERVER_PASSWORD).ok(),
        })
    }

    fn ows_url(&self) -> String {
        format!("{}/{}/ows", self.base_url, self.workspace)
    }

    fn layer_name(&self, variable: ClimateVariable) -> String {
        format!(
            "{}:{}{}",
            self.workspace,
            variable.short_name(),
            GEOSERVER_LAYER_SUFFIX
        )
    }
}

/// Fetches daily observations from a GeoServer WFS endpoint.
///
/// One `GetFeature` request is issued per variable layer, subset to the
/// requested date window. Features carry the service-side identifier in
/// their `ext_id` property, which is matched against the location registry.
pub struct GeoServerSource {
    client: reqwest::Client,
    config: GeoServerConfig,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    ext_id: String,
    date: NaiveDate,
    #[serde(default)]
    value: Option<f64>,
}

impl GeoServerSource {
    pub fn new(config: GeoServerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn from_env(country: &str) -> Result<Self> {
        Ok(Self::new(GeoServerConfig::from_env(country)?))
    }

    /// Request one variable layer; `Ok(None)` means the layer answered with
    /// a non-success status (not published for this workspace) and should be
    /// skipped. Transport failures abort the run.
    async fn fetch_layer(
        &self,
        variable: ClimateVariable,
        range: &DateRange,
    ) -> Result<Option<String>> {
        let layer = self.config.layer_name(variable);
        let cql_filter = format!("date BETWEEN '{}' AND '{}'", range.start, range.end);

        let mut request = self
            .client
            .get(self.config.ows_url())
            .query(&[
                ("service", "WFS"),
                ("version", WFS_VERSION),
                ("request", "GetFeature"),
                ("typeNames", layer.as_str()),
                ("outputFormat", WFS_OUTPUT_FORMAT),
                ("cql_filter", cql_filter.as_str()),
            ]);

        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = request.send().await.map_err(|e| EtlError::SourceUnavailable {
            kind: "geoserver",
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            warn!(
                layer = %layer,
                status = %response.status(),
                "layer request failed, skipping variable"
            );
            return Ok(None);
        }

        let body = response.text().await.map_err(|e| EtlError::SourceUnavailable {
            kind: "geoserver",
            reason: e.to_string(),
        })?;
        Ok(Some(body))
    }
}

impl ObservationSource for GeoServerSource {
    fn kind(&self) -> &'static str {
        "geoserver"
    }

    async fn fetch(&self, locations: &[Location], range: &DateRange) -> Result<Vec<Observation>> {
        info!(
            workspace = %self.config.workspace,
            range = %range,
            "starting GeoServer data extraction"
        );

        let ext_map: HashMap<String, i64> = locations
            .iter()
            .filter_map(|l| l.ext_id.clone().map(|ext| (ext, l.id)))
            .collect();
        if ext_map.is_empty() {
            warn!("no registered location carries an ext_id; nothing can be matched");
        }

        let progress = ProgressReporter::new(
            ClimateVariable::ALL.len() as u64,
            "Extracting location data",
            false,
        );

        let mut observations = Vec::new();
        let mut layers_fetched = 0usize;

        for variable in ClimateVariable::ALL {
            progress.set_message(&format!("Extracting {}", variable));

            let body = match self.fetch_layer(variable, range).await? {
                Some(body) => body,
                None => {
                    progress.increment(1);
                    continue;
                }
            };
            layers_fetched += 1;

            let mut unresolved = 0usize;
            let before = observations.len();
            for properties in parse_features(&body)? {
                let value = match properties.value {
                    Some(value) => value,
                    None => continue,
                };
                if !range.contains(properties.date) {
                    continue;
                }
                match ext_map.get(&properties.ext_id) {
                    Some(location_id) => observations.push(Observation::new(
                        *location_id,
                        variable,
                        properties.date,
                        value,
                    )),
                    None => unresolved += 1,
                }
            }

            if unresolved > 0 {
                warn!(
                    variable = %variable,
                    unresolved, "features with no matching registry location were skipped"
                );
            }
            debug!(
                variable = %variable,
                emitted = observations.len() - before,
                "finished variable layer"
            );
            progress.increment(1);
        }

        progress.finish_with_message(&format!("Extracted {} observations", observations.len()));

        if layers_fetched == 0 {
            return Err(EtlError::SourceUnavailable {
                kind: "geoserver",
                reason: format!(
                    "no variable layers could be fetched from workspace '{}'",
                    self.config.workspace
                ),
            });
        }

        info!(
            total = observations.len(),
            layers_fetched, "GeoServer data extraction completed"
        );
        Ok(observations)
    }
}

/// Decode a WFS `GetFeature` JSON response into feature properties.
fn parse_features(body: &str) -> Result<Vec<FeatureProperties>> {
    let collection: FeatureCollection = serde_json::from_str(body)
        .map_err(|e| EtlError::SourceFormat(format!("unexpected GeoServer payload: {}", e)))?;
    Ok(collection
        .features
        .into_iter()
        .map(|f| f.properties)
        .collect())
}
