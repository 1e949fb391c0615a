use serde::{Deserialize, Serialize};

use crate::error::GridError;

pub const DEFAULT_MIN_RADIUS: i32 = 1;
pub const DEFAULT_MAX_RADIUS: i32 = 16;

/// Radius limits applied to every resize.
///
/// A grid of radius `r` covers the `(2r-1) x (2r-1)` square around its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Smallest radius a grid can shrink to.
    pub min_radius: i32,
    /// Largest radius a grid can grow to.
    pub max_radius: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_radius: DEFAULT_MIN_RADIUS,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), GridError> {
        if self.min_radius < 1 {
            return Err(GridError::InvalidConfig(format!(
                "min_radius must be at least 1, got {}",
                self.min_radius
            )));
        }
        if self.max_radius < self.min_radius {
            return Err(GridError::InvalidConfig(format!(
                "max_radius ({}) is below min_radius ({})",
                self.max_radius, self.min_radius
            )));
        }
        Ok(())
    }

    /// Clamp a requested radius into `[min_radius, max_radius]`. Inverted
    /// limits resolve to `max_radius` instead of panicking.
    pub fn clamp_radius(&self, radius: i32) -> i32 {
        radius.max(self.min_radius).min(self.max_radius)
    }
}
