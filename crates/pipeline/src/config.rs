//! Pipeline configuration
//!
//! ```yaml
//! columns:
//!   timestamp: pickup_time
//!   latitude: pickup_lat
//! dimensions: [year, continent]
//! engine:
//!   batch_size: 4096
//!   csv:
//!     delimiter: ";"
//! ```
//!
//! Every key is optional; missing keys take the NYC taxi trip defaults.

use crate::dimension::{Dimension, Role};
use crate::error::{Error, Result};
use engine::EngineOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source column name for each field the aggregations read
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnMap {
    pub timestamp: String,
    pub latitude: String,
    pub longitude: String,
    pub payment_type: String,
    pub fare: String,
    pub tip: String,
    pub total: String,
    pub distance: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            timestamp: "tpep_pickup_datetime".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            payment_type: "payment_type".to_string(),
            fare: "fare_amount".to_string(),
            tip: "tip_amount".to_string(),
            total: "total_amount".to_string(),
            distance: "trip_distance".to_string(),
        }
    }
}

impl ColumnMap {
    #[must_use]
    pub fn column(&self, role: Role) -> &str {
        match role {
            Role::Timestamp => &self.timestamp,
            Role::Latitude => &self.latitude,
            Role::Longitude => &self.longitude,
            Role::PaymentType => &self.payment_type,
            Role::Fare => &self.fare,
            Role::Tip => &self.tip,
            Role::Total => &self.total,
            Role::Distance => &self.distance,
        }
    }
}

fn default_dimensions() -> Vec<Dimension> {
    vec![Dimension::Day, Dimension::HourWeekday, Dimension::PaymentType]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub columns: ColumnMap,

    /// Aggregations run by `analyze`, in order
    #[serde(default = "default_dimensions")]
    pub dimensions: Vec<Dimension>,

    #[serde(default)]
    pub engine: EngineOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            dimensions: default_dimensions(),
            engine: EngineOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimensions.is_empty() {
            return Err(Error::Config("at least one dimension is required".to_string()));
        }
        for role in Role::ALL {
            if self.columns.column(role).trim().is_empty() {
                return Err(Error::Config(format!(
                    "column for '{}' must not be empty",
                    role.alias()
                )));
            }
        }
        if self.engine.batch_size == 0 {
            return Err(Error::Config("engine.batch_size must be positive".to_string()));
        }
        self.engine
            .csv
            .validate()
            .map_err(|e| Error::Config(format!("engine.csv: {e}")))?;
        Ok(())
    }
}
