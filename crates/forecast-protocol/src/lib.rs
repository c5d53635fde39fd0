//! Forecast subset API protocol
//!
//! Request and response types shared by the forecast HTTP server and its
//! clients:
//!
//! - Subset query parsing and validation (bounding box, dimension selectors,
//!   variable lists)
//! - GeoJSON `FeatureCollection` bodies for point exports
//! - JSON bodies for scalar means, login and health
//! - The error taxonomy with its HTTP status mapping
//!
//! # Example
//!
//! ```rust
//! use forecast_protocol::{SubsetParams, SubsetQuery};
//!
//! let params = SubsetParams {
//!     variable: Some("t2m".to_string()),
//!     west: Some("10".to_string()),
//!     south: Some("-5".to_string()),
//!     east: Some("20".to_string()),
//!     north: Some("5".to_string()),
//!     ..Default::default()
//! };
//! let query = SubsetQuery::from_params(&params).unwrap();
//! assert!(query.bbox.contains_point(15.0, 0.0));
//! ```

pub mod errors;
pub mod geojson;
pub mod queries;
pub mod responses;

// Re-export commonly used types
pub use errors::ApiError;
pub use geojson::{Feature, FeatureCollection, Geometry, Properties};
pub use queries::{parse_lead_hours, QueryError, Selectors, SubsetParams, SubsetQuery};
pub use responses::{
    ExceptionResponse, HealthResponse, LoginRequest, LoginResponse, MeanResponse,
};

/// Media types used in API responses
pub mod media_types {
    /// GeoJSON media type
    pub const GEO_JSON: &str = "application/geo+json";
    /// JSON media type
    pub const JSON: &str = "application/json";
    /// Problem details media type for error bodies
    pub const PROBLEM_JSON: &str = "application/problem+json";
}
