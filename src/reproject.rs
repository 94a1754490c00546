//! Coordinate reprojection through PROJ.

use geo::MapCoords;
use geo_types::{Coord, Geometry};
use proj::{Proj, ProjCreateError, ProjError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReprojectError {
    #[error("could not build transform from {from} to {to}: {source}")]
    Create {
        from: String,
        to: String,
        source: ProjCreateError,
    },
    #[error("coordinate transform failed: {0}")]
    Transform(#[from] ProjError),
}

/// Transforms source geometries into the target CRS.
///
/// Without a source CRS, or when it equals the target, coordinates pass
/// through untouched.
pub struct Reprojector {
    proj: Option<Proj>,
}

impl Reprojector {
    pub fn identity() -> Self {
        Self { proj: None }
    }

    pub fn new(source_crs: Option<&str>, target_crs: &str) -> Result<Self, ReprojectError> {
        let Some(source_crs) = source_crs else {
            return Ok(Self::identity());
        };
        if source_crs.eq_ignore_ascii_case(target_crs) {
            return Ok(Self::identity());
        }

        let proj = Proj::new_known_crs(source_crs, target_crs, None).map_err(|source| {
            ReprojectError::Create {
                from: source_crs.to_string(),
                to: target_crs.to_string(),
                source,
            }
        })?;
        Ok(Self { proj: Some(proj) })
    }

    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    pub fn apply(&self, geometry: Geometry<f64>) -> Result<Geometry<f64>, ReprojectError> {
        let Some(proj) = &self.proj else {
            return Ok(geometry);
        };

        let transformed = geometry.try_map_coords(|c: Coord<f64>| {
            proj.convert((c.x, c.y)).map(|(x, y)| Coord { x, y })
        })?;
        Ok(transformed)
    }
}
