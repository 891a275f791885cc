//! Settings for building gradient profiles.

use serde::{Deserialize, Serialize};

use crate::profile::{FinalPoint, ProfileError};

/// Spacing used when a caller does not ask for a specific resolution.
pub const DEFAULT_RESOLUTION: f64 = 10.0;

fn default_resolution() -> f64 {
    DEFAULT_RESOLUTION
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Metres between generated points.
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    #[serde(default)]
    pub final_point: FinalPoint,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            final_point: FinalPoint::default(),
        }
    }
}

impl ProfileConfig {
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.resolution.is_finite() && self.resolution > 0.0 {
            Ok(())
        } else {
            Err(ProfileError::InvalidResolution(self.resolution))
        }
    }

    /// Applies a resolution supplied as text, keeping the current one when the
    /// text is missing or not a number.
    pub fn with_resolution_param(mut self, param: Option<&str>) -> Self {
        if let Some(resolution) = param.and_then(|p| p.trim().parse::<f64>().ok()) {
            self.resolution = resolution;
        }
        self
    }
}

pub fn read_config_json(path: &str) -> std::io::Result<ProfileConfig> {
    let contents = crate::io::read_to_string(path)?;
    let config: ProfileConfig = serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: ProfileConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProfileConfig::default());
        let config: ProfileConfig =
            serde_json::from_str(r#"{"resolution": 25.0, "final_point": "skip"}"#).unwrap();
        assert!((config.resolution - 25.0).abs() < 1e-9);
        assert_eq!(config.final_point, FinalPoint::Skip);
    }

    #[test]
    fn unparseable_resolution_keeps_default() {
        let config = ProfileConfig::default().with_resolution_param(Some("abc"));
        assert!((config.resolution - DEFAULT_RESOLUTION).abs() < 1e-9);
        let config = ProfileConfig::default().with_resolution_param(None);
        assert!((config.resolution - DEFAULT_RESOLUTION).abs() < 1e-9);
        let config = ProfileConfig::default().with_resolution_param(Some(" 2.5 "));
        assert!((config.resolution - 2.5).abs() < 1e-9);
    }

    #[test]
    fn validation() {
        assert!(ProfileConfig::default().validate().is_ok());
        let bad = ProfileConfig {
            resolution: 0.0,
            ..ProfileConfig::default()
        };
        assert_eq!(bad.validate(), Err(ProfileError::InvalidResolution(0.0)));
    }
}
