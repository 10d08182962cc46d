use std::path::Path;
use geojson::GeoJson;
use serde_json::Value;

use crate::{DataError, Record};

/// Region shapes reduced to their property bags.
///
/// Geometry is left to the rendering engine; joins and previews only need the
/// properties.
#[derive(Debug, Clone, Default)]
pub struct BoundaryDataset {
    features: Vec<Record>,
}

impl BoundaryDataset {
    /// Parse a GeoJSON document (a FeatureCollection or a single Feature)
    pub fn from_geojson_str(json: &str) -> Result<Self, DataError> {
        let geojson: GeoJson = json.parse()?;
        let features = match geojson {
            GeoJson::FeatureCollection(collection) => collection.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(DataError::GeoJson("expected features, found a bare geometry".to_string()));
            }
        };

        let features = features
            .into_iter()
            .map(|feature| {
                let mut record = Record::new();
                record.insert("type".to_string(), Value::from("Feature"));
                record.insert(
                    "properties".to_string(),
                    Value::Object(feature.properties.unwrap_or_default()),
                );
                record
            })
            .collect();

        Ok(Self { features })
    }

    /// Load a GeoJSON file from disk
    pub fn from_geojson_path(path: &Path) -> Result<Self, DataError> {
        let json = std::fs::read_to_string(path)?;
        let dataset = Self::from_geojson_str(&json)?;
        tracing::info!("Loaded {} boundary features from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Build directly from property bags
    pub fn from_properties(properties: Vec<serde_json::Map<String, Value>>) -> Self {
        let features = properties
            .into_iter()
            .map(|props| {
                let mut record = Record::new();
                record.insert("type".to_string(), Value::from("Feature"));
                record.insert("properties".to_string(), Value::Object(props));
                record
            })
            .collect();
        Self { features }
    }

    pub fn records(&self) -> &[Record] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Distinct string values of one property, in feature order
    pub fn property_values(&self, property: &str) -> Vec<String> {
        let mut values: Vec<String> = Vec::new();
        for feature in &self.features {
            let value = feature
                .get("properties")
                .and_then(|props| props.get(property))
                .and_then(Value::as_str);
            if let Some(value) = value {
                if !values.iter().any(|v| v == value) {
                    values.push(value.to_string());
                }
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "geometry": null, "properties": { "STE_NAME21": "Queensland", "STE_CODE21": "3" } },
            { "type": "Feature", "geometry": null, "properties": { "STE_NAME21": "Tasmania", "STE_CODE21": "6" } },
            { "type": "Feature", "geometry": null, "properties": null }
        ]
    }"#;

    #[test]
    fn test_feature_collection_properties() {
        let dataset = BoundaryDataset::from_geojson_str(STATES).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.property_values("STE_NAME21"), vec!["Queensland", "Tasmania"]);
        assert_eq!(dataset.records()[2]["properties"], serde_json::json!({}));
    }

    #[test]
    fn test_bare_geometry_is_rejected() {
        let geometry = r#"{ "type": "Point", "coordinates": [153.0, -27.5] }"#;
        assert!(matches!(
            BoundaryDataset::from_geojson_str(geometry),
            Err(DataError::GeoJson(_))
        ));
    }
}
