//! GeoJSON types for point exports.
//!
//! An export is a `FeatureCollection` of `Point` features, one per grid
//! point inside the requested bounding box. Variable values are flattened
//! into each feature's properties; missing values serialize as `null`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Array of features.
    pub features: Vec<Feature>,

    /// Units per exported variable.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub units: BTreeMap<String, String>,

    /// Number of features returned.
    #[serde(rename = "numberReturned", skip_serializing_if = "Option::is_none")]
    pub number_returned: Option<usize>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
            units: BTreeMap::new(),
            number_returned: None,
        }
    }

    /// Add multiple features to the collection.
    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features.extend(features);
        self.number_returned = Some(self.features.len());
        self
    }

    /// Record the units of a variable.
    pub fn with_units(mut self, variable: impl Into<String>, units: impl Into<String>) -> Self {
        self.units.insert(variable.into(), units.into());
        self
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional feature identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub geometry: Geometry,

    pub properties: Properties,
}

impl Feature {
    /// Create a new feature with a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry: Geometry::point(lon, lat),
            properties: Properties::new(),
        }
    }

    /// Set the feature ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

/// GeoJSON geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A point geometry.
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: [f64; 2],
    },
}

impl Geometry {
    /// Create a point geometry.
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }
}

/// Properties of an exported point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Properties {
    /// Forecast initialization time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,

    /// Forecast lead in hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<f64>,

    /// Ensemble member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<f64>,

    /// Vertical level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<f64>,

    /// Variable values keyed by name.
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl Properties {
    /// Create new empty properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable value; NaN is recorded as missing.
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        let value = (!value.is_nan()).then_some(value);
        self.values.insert(name.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_feature_serialization() {
        let feature = Feature::point(15.0, 0.0)
            .with_id("42")
            .with_properties(Properties::new().with_value("t2m", 280.5));

        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "Feature");
        assert_eq!(json["id"], "42");
        assert_eq!(json["geometry"]["type"], "Point");
        assert_eq!(json["geometry"]["coordinates"][0], 15.0);
        assert_eq!(json["geometry"]["coordinates"][1], 0.0);
        assert_eq!(json["properties"]["t2m"], 280.5);
        assert!(json["properties"].get("init").is_none());
    }

    #[test]
    fn test_nan_value_is_null() {
        let props = Properties::new().with_value("t2m", f64::NAN);
        let json = serde_json::to_value(&props).unwrap();
        assert!(json["t2m"].is_null());
    }

    #[test]
    fn test_feature_collection() {
        let fc = FeatureCollection::new()
            .with_units("t2m", "K")
            .with_features(vec![Feature::point(1.0, 2.0), Feature::point(3.0, 4.0)]);

        let json = serde_json::to_value(&fc).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"].as_array().unwrap().len(), 2);
        assert_eq!(json["numberReturned"], 2);
        assert_eq!(json["units"]["t2m"], "K");
    }

    #[test]
    fn test_selection_properties() {
        let props = Properties {
            init: Some("2019-12-31T00:00:00Z".to_string()),
            lead: Some(6.0),
            level: Some(500.0),
            ..Default::default()
        }
        .with_value("z", 5500.0);

        let json = serde_json::to_value(&props).unwrap();
        assert_eq!(json["init"], "2019-12-31T00:00:00Z");
        assert_eq!(json["lead"], 6.0);
        assert_eq!(json["level"], 500.0);
        assert_eq!(json["z"], 5500.0);
        assert!(json.get("member").is_none());
    }
}
