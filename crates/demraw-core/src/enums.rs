//! Enumeration types used throughout the exporter.

use serde::{Deserialize, Serialize};

use crate::constants::{UTM_NORTH_BASE, UTM_SOUTH_BASE};

/// How the affine transform's world coordinates are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateKind {
    /// Longitude/latitude degrees.
    Geographic,
    /// Linear units, assumed meters.
    #[default]
    Projected,
}

impl CoordinateKind {
    pub fn label(self) -> &'static str {
        match self {
            CoordinateKind::Geographic => "geographic",
            CoordinateKind::Projected => "projected",
        }
    }
}

/// Hemisphere of a UTM zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    #[default]
    North,
    South,
}

impl Hemisphere {
    /// Hemisphere for a latitude. The equator counts as north.
    pub fn from_latitude(lat: f64) -> Self {
        if lat >= 0.0 {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    /// WGS84 / UTM EPSG base code for this hemisphere.
    pub fn epsg_base(self) -> u32 {
        match self {
            Hemisphere::North => UTM_NORTH_BASE,
            Hemisphere::South => UTM_SOUTH_BASE,
        }
    }
}
