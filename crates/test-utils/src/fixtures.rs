//! Common test fixtures for regridding and forecast API tests.

/// Bounding boxes as `(west, south, east, north)`.
pub mod bbox {
    /// Whole globe in 0..360 longitudes
    pub const GLOBAL: (f64, f64, f64, f64) = (0.0, -90.0, 360.0, 90.0);

    /// Western Europe
    pub const EUROPE: (f64, f64, f64, f64) = (-10.0, 35.0, 30.0, 60.0);

    /// Single point (degenerate bbox)
    pub const POINT: (f64, f64, f64, f64) = (0.0, 0.0, 0.0, 0.0);

    /// Invalid bbox (west > east)
    pub const INVALID: (f64, f64, f64, f64) = (10.0, 10.0, 5.0, 5.0);

    /// Formats a bbox as query parameters.
    pub fn to_query(bbox: (f64, f64, f64, f64)) -> String {
        format!(
            "west={}&south={}&east={}&north={}",
            bbox.0, bbox.1, bbox.2, bbox.3
        )
    }
}

/// Common grid specifications for testing.
pub mod grid {
    /// ERA5 0.25 degree global grid
    pub const ERA5_QUARTER: GridSpec = GridSpec {
        resolution: 0.25,
        n_lat: 721,
        n_lon: 1440,
    };

    /// Coarse global grid for fast tests
    pub const COARSE_10: GridSpec = GridSpec {
        resolution: 10.0,
        n_lat: 19,
        n_lon: 36,
    };

    /// Regular global grid specification.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub resolution: f64,
        pub n_lat: usize,
        pub n_lon: usize,
    }

    impl GridSpec {
        /// Returns the total number of grid cells.
        pub fn size(&self) -> usize {
            self.n_lat * self.n_lon
        }
    }
}

/// Common time values for testing.
pub mod time {
    /// Forecast initialisation used in stores built by tests
    pub const INIT: &str = "2024-01-15T00:00:00";

    /// CF units for init coordinates
    pub const INIT_UNITS: &str = "hours since 1970-01-01 00:00:00";

    /// CF units for lead coordinates
    pub const LEAD_UNITS: &str = "hours";

    /// Lead times in hours
    pub const LEADS: [f64; 3] = [0.0, 6.0, 12.0];
}

/// Credentials understood by mock identity providers.
pub mod auth {
    pub const EMAIL: &str = "forecaster@example.com";
    pub const PASSWORD: &str = "correct-horse";
    pub const TOKEN: &str = "test-access-token";
    pub const UNCONFIRMED_EMAIL: &str = "pending@example.com";
    pub const UNCONFIRMED_TOKEN: &str = "unconfirmed-access-token";
}
