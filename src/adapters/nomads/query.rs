//! NOMADS grib-filter query construction.

use serde::Deserialize;

use crate::domain::cycle::Identity;

const FILTER_ENDPOINT_PREFIX: &str = "https://nomads.ncep.noaa.gov/cgi-bin/filter_gfs_";

/// Grid spacing of the requested product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// 0.5 degree grid.
    #[default]
    Fine,
    /// 1.0 degree grid.
    Coarse,
}

impl Resolution {
    fn grid_tag(&self) -> &'static str {
        match self {
            Resolution::Fine => "0p50",
            Resolution::Coarse => "1p00",
        }
    }

    fn product(&self) -> &'static str {
        match self {
            Resolution::Fine => "pgrb2full",
            Resolution::Coarse => "pgrb2",
        }
    }

    /// Filter endpoint for this grid.
    pub fn default_endpoint(&self) -> String {
        format!("{}{}.pl", FILTER_ENDPOINT_PREFIX, self.grid_tag())
    }

    /// Grid spacing in degrees, for logs.
    pub fn degrees(&self) -> f64 {
        match self {
            Resolution::Fine => 0.5,
            Resolution::Coarse => 1.0,
        }
    }
}

/// Geographic subset requested from the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub left_lon: f64,
    pub right_lon: f64,
    pub top_lat: f64,
    pub bottom_lat: f64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            left_lon: 0.0,
            right_lon: 360.0,
            top_lat: 90.0,
            bottom_lat: -90.0,
        }
    }
}

/// Which variable sets to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variables {
    /// 10 m U/V wind components.
    pub wind: bool,
    /// Surface temperature.
    pub temperature: bool,
}

impl Default for Variables {
    fn default() -> Self {
        Self {
            wind: true,
            temperature: false,
        }
    }
}

/// Everything needed to turn an identity into a filter request.
#[derive(Debug, Clone, PartialEq)]
pub struct NomadsQuery {
    pub endpoint: String,
    pub resolution: Resolution,
    pub variables: Variables,
    pub extent: Extent,
}

impl NomadsQuery {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            endpoint: resolution.default_endpoint(),
            resolution,
            variables: Variables::default(),
            extent: Extent::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = extent;
        self
    }

    /// Upstream file name, e.g. `gfs.t06z.pgrb2full.0p50.f003`.
    pub fn file_name(&self, identity: &Identity) -> String {
        format!(
            "gfs.t{:02}z.{}.{}.f{}",
            identity.cycle().hour(),
            self.resolution.product(),
            self.resolution.grid_tag(),
            identity.offset()
        )
    }

    /// Query parameters in the order the filter documents them.
    pub fn params(&self, identity: &Identity) -> Vec<(&'static str, String)> {
        let cycle = identity.cycle();
        let mut params = vec![("file", self.file_name(identity))];

        if self.variables.temperature {
            params.push(("lev_surface", "on".to_string()));
            params.push(("var_TMP", "on".to_string()));
        }
        if self.variables.wind {
            params.push(("lev_10_m_above_ground", "on".to_string()));
            params.push(("var_UGRD", "on".to_string()));
            params.push(("var_VGRD", "on".to_string()));
        }

        params.push(("leftlon", self.extent.left_lon.to_string()));
        params.push(("rightlon", self.extent.right_lon.to_string()));
        params.push(("toplat", self.extent.top_lat.to_string()));
        params.push(("bottomlat", self.extent.bottom_lat.to_string()));
        params.push((
            "dir",
            format!(
                "/gfs.{}/{:02}/atmos",
                cycle.date().format("%Y%m%d"),
                cycle.hour()
            ),
        ));
        params
    }
}
