//! Bounding-box subsets of the forecast store.
//!
//! A request selects one label on every non-spatial dimension of a variable
//! and a bounding box on its spatial dimensions. Two spatial layouts are
//! served:
//!
//! - **points**: a flat `point` dimension with `latitude(point)` and
//!   `longitude(point)` coordinates (reduced Gaussian output)
//! - **regular**: separate `latitude` and `longitude` dimensions
//!
//! Only the hyperslab spanning the matching points is read; the bounding-box
//! mask is then applied to that slab in memory.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use forecast_protocol::{
    ApiError, Feature, FeatureCollection, MeanResponse, Properties, Selectors, SubsetQuery,
};
use grid_common::{normalize_longitude, BoundingBox, CfTimeUnits, TimeUnit};
use ndarray::IxDyn;
use regrid::dataset::{label_index, range_indices};
use regrid::grid::{LATITUDE, LONGITUDE, POINT};
use regrid::{ArrayInfo, ZarrDatasetReader};
use tracing::debug;

use crate::config::DimensionNames;
use crate::error::AppError;

type Result<T> = std::result::Result<T, AppError>;

/// Labels of the slice a selection was taken from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedLabels {
    pub init: Option<DateTime<Utc>>,
    pub lead_hours: Option<f64>,
    pub member: Option<f64>,
    pub level: Option<f64>,
}

/// Values of one variable at the points inside a bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub variable: String,
    pub units: Option<String>,
    /// Point identifiers: the store's point index, or `lat_lon` indices.
    pub ids: Vec<String>,
    /// Longitudes wrapped into the bounding box's frame.
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    pub values: Vec<f64>,
    pub labels: SelectedLabels,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Points,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DimKind {
    Init,
    Lead,
    Member,
    Level,
    Other,
}

/// Read-only access to the served forecast store.
pub struct ForecastStore {
    reader: ZarrDatasetReader,
    dims: DimensionNames,
}

impl ForecastStore {
    pub fn open(path: &Path, dims: DimensionNames) -> regrid::Result<Self> {
        let reader = ZarrDatasetReader::open(path)?;
        debug!(
            path = %path.display(),
            variables = reader.data_vars().len(),
            "Opened forecast store"
        );
        Ok(Self { reader, dims })
    }

    /// Names of the data variables.
    pub fn variables(&self) -> Vec<&str> {
        self.reader
            .data_vars()
            .iter()
            .map(|v| v.name.as_str())
            .collect()
    }

    /// NaN-skipping mean of the single requested variable.
    pub fn mean(&self, query: &SubsetQuery) -> Result<MeanResponse> {
        let variable = query.single_variable()?;
        let selection = self.select(variable, query)?;
        Ok(MeanResponse::from_values(
            variable,
            selection.units,
            selection.values,
        ))
    }

    /// Point features carrying every requested variable.
    pub fn export_points(&self, query: &SubsetQuery) -> Result<FeatureCollection> {
        let selections = query
            .variables
            .iter()
            .map(|v| self.select(v, query))
            .collect::<Result<Vec<_>>>()?;

        let Some(first) = selections.first() else {
            return Err(ApiError::InvalidParameter("no variable requested".to_string()).into());
        };
        if let Some(other) = selections
            .iter()
            .find(|s| s.ids != first.ids)
        {
            return Err(ApiError::InvalidParameter(format!(
                "variables '{}' and '{}' are not on the same grid",
                first.variable, other.variable
            ))
            .into());
        }

        let base = Properties {
            init: first
                .labels
                .init
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            lead: first.labels.lead_hours,
            member: first.labels.member,
            level: first.labels.level,
            ..Properties::default()
        };

        let features = (0..first.len())
            .map(|k| {
                let properties = selections
                    .iter()
                    .fold(base.clone(), |p, s| p.with_value(&s.variable, s.values[k]));
                Feature::point(first.lons[k], first.lats[k])
                    .with_id(first.ids[k].clone())
                    .with_properties(properties)
            })
            .collect();

        let collection = selections
            .iter()
            .filter_map(|s| s.units.as_ref().map(|u| (s.variable.clone(), u.clone())))
            .fold(FeatureCollection::new(), |fc, (v, u)| fc.with_units(v, u));

        Ok(collection.with_features(features))
    }

    /// Values of `variable` inside the query's bounding box.
    pub fn select(&self, variable: &str, query: &SubsetQuery) -> Result<Selection> {
        let info = self
            .reader
            .data_var(variable)
            .map_err(|_| ApiError::VariableNotFound(variable.to_string()))?;

        let layout = if info.axis_of(POINT).is_some() {
            Layout::Points
        } else if info.axis_of(LATITUDE).is_some() && info.axis_of(LONGITUDE).is_some() {
            Layout::Regular
        } else {
            return Err(ApiError::InvalidParameter(format!(
                "variable '{}' has no spatial dimensions",
                variable
            ))
            .into());
        };

        let mut ranges: BTreeMap<String, Range<usize>> = BTreeMap::new();
        let mut labels = SelectedLabels::default();
        for (dim, len) in info.dims.iter().zip(&info.shape) {
            if is_spatial(dim) {
                continue;
            }
            let index = self.resolve(dim, *len, &query.selectors, &mut labels)?;
            ranges.insert(dim.clone(), index..index + 1);
        }

        let bbox = &query.bbox;
        let (ids, lons, lats, values) = match layout {
            Layout::Points => self.select_points(info, bbox, ranges)?,
            Layout::Regular => self.select_regular(info, bbox, ranges)?,
        };

        debug!(
            variable = variable,
            points = values.len(),
            "Selected bounding box subset"
        );

        Ok(Selection {
            variable: variable.to_string(),
            units: info.units().map(str::to_string),
            ids,
            lons,
            lats,
            values,
            labels,
        })
    }

    fn select_points(
        &self,
        info: &ArrayInfo,
        bbox: &BoundingBox,
        mut ranges: BTreeMap<String, Range<usize>>,
    ) -> Result<(Vec<String>, Vec<f64>, Vec<f64>, Vec<f64>)> {
        let lats = self.coord_values(LATITUDE)?;
        let lons: Vec<f64> = self
            .coord_values(LONGITUDE)?
            .into_iter()
            .map(|lon| normalize_longitude(lon, bbox.min_x))
            .collect();

        let hits = bbox.filter_points(lons.iter().copied().zip(lats.iter().copied()));
        let (Some(&lo), Some(&hi)) = (hits.first(), hits.last()) else {
            return Err(no_points(bbox));
        };
        ranges.insert(POINT.to_string(), lo..hi + 1);

        let slab = self.reader.read_subset(&info.name, &ranges)?.values();
        let axis = info.axis_of(POINT).unwrap_or(0);
        let mut index = vec![0usize; slab.ndim()];

        let values = hits
            .iter()
            .map(|p| {
                index[axis] = p - lo;
                slab[IxDyn(&index)]
            })
            .collect();

        Ok((
            hits.iter().map(|p| p.to_string()).collect(),
            hits.iter().map(|p| lons[*p]).collect(),
            hits.iter().map(|p| lats[*p]).collect(),
            values,
        ))
    }

    fn select_regular(
        &self,
        info: &ArrayInfo,
        bbox: &BoundingBox,
        mut ranges: BTreeMap<String, Range<usize>>,
    ) -> Result<(Vec<String>, Vec<f64>, Vec<f64>, Vec<f64>)> {
        let lats = self.coord_values(LATITUDE)?;
        let lons: Vec<f64> = self
            .coord_values(LONGITUDE)?
            .into_iter()
            .map(|lon| normalize_longitude(lon, bbox.min_x))
            .collect();

        let lat_hits = range_indices(&lats, bbox.min_y, bbox.max_y);
        let lon_hits = range_indices(&lons, bbox.min_x, bbox.max_x);
        let (Some(&lat_lo), Some(&lat_hi), Some(&lon_lo), Some(&lon_hi)) = (
            lat_hits.first(),
            lat_hits.last(),
            lon_hits.iter().min(),
            lon_hits.iter().max(),
        ) else {
            return Err(no_points(bbox));
        };
        ranges.insert(LATITUDE.to_string(), lat_lo..lat_hi + 1);
        ranges.insert(LONGITUDE.to_string(), lon_lo..lon_hi + 1);

        let slab = self.reader.read_subset(&info.name, &ranges)?.values();
        let lat_axis = info.axis_of(LATITUDE).unwrap_or(0);
        let lon_axis = info.axis_of(LONGITUDE).unwrap_or(1);
        let mut index = vec![0usize; slab.ndim()];

        let n = lat_hits.len() * lon_hits.len();
        let (mut ids, mut out_lons, mut out_lats, mut values) =
            (Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n), Vec::with_capacity(n));
        for &i in &lat_hits {
            for &j in &lon_hits {
                index[lat_axis] = i - lat_lo;
                index[lon_axis] = j - lon_lo;
                ids.push(format!("{}_{}", i, j));
                out_lons.push(lons[j]);
                out_lats.push(lats[i]);
                values.push(slab[IxDyn(&index)]);
            }
        }

        Ok((ids, out_lons, out_lats, values))
    }

    /// Index of the selected label on a non-spatial dimension.
    ///
    /// Dimensions without a selector must have exactly one label.
    fn resolve(
        &self,
        dim: &str,
        len: usize,
        selectors: &Selectors,
        labels: &mut SelectedLabels,
    ) -> Result<usize> {
        let kind = self.kind(dim);
        let (values, units) = self.labels_of(dim, len)?;

        let wanted = match kind {
            DimKind::Init => match selectors.init {
                Some(t) => Some(init_units(dim, units.as_deref())?.encode(t)),
                None => None,
            },
            DimKind::Lead => selectors
                .lead_hours
                .map(|h| lead_unit(units.as_deref()).from_hours(h)),
            DimKind::Member => selectors.member,
            DimKind::Level => selectors.level,
            DimKind::Other => None,
        };

        let index = match wanted {
            Some(label) => label_index(&values, label).ok_or_else(|| {
                ApiError::LabelNotFound(format!("{}={}", dim, describe(kind, selectors, label)))
            })?,
            None if len == 1 => 0,
            None => {
                return Err(ApiError::InvalidParameter(format!(
                    "dimension '{}' has {} labels; select one{}",
                    dim,
                    len,
                    parameter_hint(kind)
                ))
                .into())
            }
        };

        let value = values[index];
        match kind {
            DimKind::Init => {
                labels.init = units
                    .as_deref()
                    .and_then(|u| CfTimeUnits::parse(u).ok())
                    .and_then(|cf| cf.decode(value));
            }
            DimKind::Lead => {
                labels.lead_hours = Some(value / lead_unit(units.as_deref()).from_hours(1.0));
            }
            DimKind::Member => labels.member = Some(value),
            DimKind::Level => labels.level = Some(value),
            DimKind::Other => {}
        }

        Ok(index)
    }

    fn kind(&self, dim: &str) -> DimKind {
        if dim == self.dims.init {
            DimKind::Init
        } else if dim == self.dims.lead {
            DimKind::Lead
        } else if dim == self.dims.member {
            DimKind::Member
        } else if dim == self.dims.level {
            DimKind::Level
        } else {
            DimKind::Other
        }
    }

    /// Coordinate labels and units of a dimension; positional indices when
    /// the store has no coordinate for it.
    fn labels_of(&self, dim: &str, len: usize) -> Result<(Vec<f64>, Option<String>)> {
        match self.reader.coord(dim) {
            Ok(info) => {
                let units = info.units().map(str::to_string);
                Ok((self.coord_values(dim)?, units))
            }
            Err(_) => Ok(((0..len).map(|i| i as f64).collect(), None)),
        }
    }

    fn coord_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.reader.read_array(name)?.to_vec())
    }
}

fn is_spatial(dim: &str) -> bool {
    dim == POINT || dim == LATITUDE || dim == LONGITUDE
}

fn init_units(dim: &str, units: Option<&str>) -> Result<CfTimeUnits> {
    units
        .and_then(|u| CfTimeUnits::parse(u).ok())
        .ok_or_else(|| {
            ApiError::DataAccessError(format!("coordinate '{}' has no CF time units", dim)).into()
        })
}

/// Unit of lead labels; hours unless the coordinate says otherwise.
fn lead_unit(units: Option<&str>) -> TimeUnit {
    units
        .and_then(|u| TimeUnit::parse(u).ok())
        .unwrap_or(TimeUnit::Hours)
}

fn describe(kind: DimKind, selectors: &Selectors, encoded: f64) -> String {
    match (kind, selectors.init, selectors.lead_hours) {
        (DimKind::Init, Some(t), _) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        (DimKind::Lead, _, Some(h)) => format!("{}h", h),
        _ => encoded.to_string(),
    }
}

fn parameter_hint(kind: DimKind) -> &'static str {
    match kind {
        DimKind::Init => " with 'init'",
        DimKind::Lead => " with 'lead'",
        DimKind::Member => " with 'member'",
        DimKind::Level => " with 'level'",
        DimKind::Other => "",
    }
}

fn no_points(bbox: &BoundingBox) -> AppError {
    ApiError::NoDataAvailable(format!(
        "no grid points inside west={}, south={}, east={}, north={}",
        bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
    ))
    .into()
}
