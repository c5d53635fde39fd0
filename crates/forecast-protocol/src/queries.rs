//! Query parameter parsing for the subset endpoints.
//!
//! Both `/mean` and `/export/points` take the same parameters: a variable
//! name (or comma list), the four bounding-box edges and optional selectors
//! for the forecast dimensions.

use chrono::{DateTime, Utc};
use grid_common::time::parse_datetime;
use grid_common::{BboxError, BoundingBox, TimeParseError, TimeUnit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing subset parameters.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    /// Missing required parameter.
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A numeric parameter did not parse.
    #[error("Invalid value for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },

    /// Bounding box failed validation.
    #[error("Invalid bounding box: {0}")]
    InvalidBbox(#[from] BboxError),

    /// A time selector did not parse.
    #[error("Invalid time selector: {0}")]
    InvalidTime(#[from] TimeParseError),

    /// More than one variable where exactly one is expected.
    #[error("Expected a single variable, got {0}")]
    MultipleVariables(usize),
}

/// Raw query string parameters.
///
/// Every field is kept as a string so parse failures surface as
/// [`QueryError`] rather than as extractor rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubsetParams {
    /// Variable name, or a comma separated list.
    pub variable: Option<String>,
    pub west: Option<String>,
    pub south: Option<String>,
    pub east: Option<String>,
    pub north: Option<String>,
    /// Initialization time (ISO 8601 or `YYYY-MM-DD`).
    pub init: Option<String>,
    /// Forecast lead: hours, or a number with a unit suffix (`36h`, `2d`).
    pub lead: Option<String>,
    /// Ensemble member label.
    pub member: Option<String>,
    /// Vertical level label (e.g. pressure in hPa).
    pub level: Option<String>,
}

/// Labels selecting one slice of each forecast dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selectors {
    pub init: Option<DateTime<Utc>>,
    pub lead_hours: Option<f64>,
    pub member: Option<f64>,
    pub level: Option<f64>,
}

impl Selectors {
    /// Whether no selector was given.
    pub fn is_empty(&self) -> bool {
        self.init.is_none()
            && self.lead_hours.is_none()
            && self.member.is_none()
            && self.level.is_none()
    }
}

/// Validated subset query.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetQuery {
    /// Requested variables, in request order, without duplicates.
    pub variables: Vec<String>,
    pub bbox: BoundingBox,
    pub selectors: Selectors,
}

impl SubsetQuery {
    /// Validate raw parameters.
    ///
    /// The variable list is checked first, then the bounding box, then the
    /// selectors.
    pub fn from_params(params: &SubsetParams) -> Result<Self, QueryError> {
        let variables = params
            .variable
            .as_deref()
            .map(parse_variable_names)
            .unwrap_or_default();
        if variables.is_empty() {
            return Err(QueryError::MissingParameter("variable"));
        }

        let west = required_number("west", params.west.as_deref())?;
        let south = required_number("south", params.south.as_deref())?;
        let east = required_number("east", params.east.as_deref())?;
        let north = required_number("north", params.north.as_deref())?;
        let bbox = BoundingBox::from_edges(west, south, east, north)?;

        let selectors = Selectors {
            init: non_empty(params.init.as_deref())
                .map(parse_datetime)
                .transpose()?,
            lead_hours: non_empty(params.lead.as_deref())
                .map(parse_lead_hours)
                .transpose()?,
            member: optional_number("member", params.member.as_deref())?,
            level: optional_number("level", params.level.as_deref())?,
        };

        Ok(Self {
            variables,
            bbox,
            selectors,
        })
    }

    /// The only requested variable.
    pub fn single_variable(&self) -> Result<&str, QueryError> {
        match self.variables.as_slice() {
            [name] => Ok(name),
            names => Err(QueryError::MultipleVariables(names.len())),
        }
    }
}

/// Split a comma separated variable list, dropping blanks and duplicates.
pub fn parse_variable_names(param: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in param.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Parse a lead time into hours.
///
/// Accepts a bare number of hours (`6`, `1.5`) or a number followed by a
/// unit (`36h`, `2d`, `90 min`).
pub fn parse_lead_hours(s: &str) -> Result<f64, QueryError> {
    let s = s.trim();
    let invalid = || QueryError::InvalidNumber {
        name: "lead",
        value: s.to_string(),
    };

    let split = s
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }

    if unit.is_empty() {
        return Ok(value);
    }
    let unit = TimeUnit::parse(unit)?;
    Ok(value * unit.seconds() / TimeUnit::Hours.seconds())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(name: &'static str, value: &str) -> Result<f64, QueryError> {
    value.trim().parse().map_err(|_| QueryError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

fn required_number(name: &'static str, value: Option<&str>) -> Result<f64, QueryError> {
    let value = non_empty(value).ok_or(QueryError::MissingParameter(name))?;
    parse_number(name, value)
}

fn optional_number(name: &'static str, value: Option<&str>) -> Result<Option<f64>, QueryError> {
    non_empty(value).map(|v| parse_number(name, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn params(variable: &str, bbox: (&str, &str, &str, &str)) -> SubsetParams {
        SubsetParams {
            variable: Some(variable.to_string()),
            west: Some(bbox.0.to_string()),
            south: Some(bbox.1.to_string()),
            east: Some(bbox.2.to_string()),
            north: Some(bbox.3.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_query() {
        let query = SubsetQuery::from_params(&params("t2m", ("10", "-5", "20", "5"))).unwrap();
        assert_eq!(query.variables, vec!["t2m"]);
        assert_eq!(query.bbox, BoundingBox::new(10.0, -5.0, 20.0, 5.0));
        assert!(query.selectors.is_empty());
    }

    #[test]
    fn test_missing_variable() {
        let mut p = params("t2m", ("10", "-5", "20", "5"));
        p.variable = None;
        assert_eq!(
            SubsetQuery::from_params(&p),
            Err(QueryError::MissingParameter("variable"))
        );

        p.variable = Some(" , ".to_string());
        assert_eq!(
            SubsetQuery::from_params(&p),
            Err(QueryError::MissingParameter("variable"))
        );
    }

    #[test]
    fn test_missing_edge() {
        let mut p = params("t2m", ("10", "-5", "20", "5"));
        p.north = None;
        assert_eq!(
            SubsetQuery::from_params(&p),
            Err(QueryError::MissingParameter("north"))
        );
    }

    #[test]
    fn test_invalid_edge_number() {
        let p = params("t2m", ("ten", "-5", "20", "5"));
        assert!(matches!(
            SubsetQuery::from_params(&p),
            Err(QueryError::InvalidNumber { name: "west", .. })
        ));
    }

    #[test]
    fn test_inverted_bbox_rejected() {
        let p = params("t2m", ("20", "-5", "10", "5"));
        assert!(matches!(
            SubsetQuery::from_params(&p),
            Err(QueryError::InvalidBbox(BboxError::InvertedLongitude { .. }))
        ));

        let p = params("t2m", ("10", "5", "20", "5"));
        assert!(matches!(
            SubsetQuery::from_params(&p),
            Err(QueryError::InvalidBbox(BboxError::InvertedLatitude { .. }))
        ));
    }

    #[test]
    fn test_non_finite_bbox_rejected() {
        let p = params("t2m", ("NaN", "-5", "20", "5"));
        assert!(matches!(
            SubsetQuery::from_params(&p),
            Err(QueryError::InvalidBbox(BboxError::NonFinite { edge: "west", .. }))
        ));
    }

    #[test]
    fn test_selectors() {
        let mut p = params("t2m,u10", ("10", "-5", "20", "5"));
        p.init = Some("2019-12-31".to_string());
        p.lead = Some("2d".to_string());
        p.member = Some("3".to_string());
        p.level = Some("500".to_string());

        let query = SubsetQuery::from_params(&p).unwrap();
        assert_eq!(
            query.selectors.init,
            Some(Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(query.selectors.lead_hours, Some(48.0));
        assert_eq!(query.selectors.member, Some(3.0));
        assert_eq!(query.selectors.level, Some(500.0));
        assert_eq!(query.variables, vec!["t2m", "u10"]);
    }

    #[test]
    fn test_malformed_selectors() {
        let mut p = params("t2m", ("10", "-5", "20", "5"));
        p.init = Some("yesterday".to_string());
        assert!(matches!(
            SubsetQuery::from_params(&p),
            Err(QueryError::InvalidTime(_))
        ));

        let mut p = params("t2m", ("10", "-5", "20", "5"));
        p.level = Some("high".to_string());
        assert!(matches!(
            SubsetQuery::from_params(&p),
            Err(QueryError::InvalidNumber { name: "level", .. })
        ));
    }

    #[test]
    fn test_parse_lead_hours() {
        assert_eq!(parse_lead_hours("6").unwrap(), 6.0);
        assert_eq!(parse_lead_hours("36h").unwrap(), 36.0);
        assert_eq!(parse_lead_hours("90 min").unwrap(), 1.5);
        assert_eq!(parse_lead_hours("1day").unwrap(), 24.0);
        assert!(parse_lead_hours("h").is_err());
        assert!(parse_lead_hours("6 fortnights").is_err());
    }

    #[test]
    fn test_parse_variable_names() {
        assert_eq!(parse_variable_names("t2m, u10,,t2m"), vec!["t2m", "u10"]);
        assert!(parse_variable_names("").is_empty());
    }

    #[test]
    fn test_single_variable() {
        let query = SubsetQuery::from_params(&params("t2m", ("10", "-5", "20", "5"))).unwrap();
        assert_eq!(query.single_variable().unwrap(), "t2m");

        let query = SubsetQuery::from_params(&params("t2m,u10", ("10", "-5", "20", "5"))).unwrap();
        assert_eq!(
            query.single_variable(),
            Err(QueryError::MultipleVariables(2))
        );
    }
}
