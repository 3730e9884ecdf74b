//! World settings

use super::{Config, ConfigError};
use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Settings for a [`crate::world::DynamicWorld`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Name used in log output
    pub name: String,
    /// Gravity handed to the physics world
    pub gravity: [f32; 3],
    /// First id handed out by the world; 0 is reserved for "no entity"
    pub first_entity_id: u32,
    /// Cap on live transient particle effects
    pub max_transient_effects: usize,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: "world".to_string(),
            gravity: [0.0, -9.81, 0.0],
            first_entity_id: 1,
            max_transient_effects: 256,
            log_level: "info".to_string(),
        }
    }
}

impl Config for WorldConfig {}

impl WorldConfig {
    /// Gravity as a vector
    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::new(self.gravity[0], self.gravity[1], self.gravity[2])
    }

    /// Reject settings the world cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_entity_id == 0 {
            return Err(ConfigError::Invalid {
                field: "first_entity_id",
                reason: "0 is reserved for \"no entity\"".to_string(),
            });
        }
        if self.max_transient_effects == 0 {
            return Err(ConfigError::Invalid {
                field: "max_transient_effects",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = WorldConfig::from_toml_str("name = \"arena\"\nmax_transient_effects = 8\n").unwrap();
        assert_eq!(config.name, "arena");
        assert_eq!(config.max_transient_effects, 8);
        assert_eq!(config.first_entity_id, 1);
        assert_eq!(config.gravity, [0.0, -9.81, 0.0]);
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("world_config_{}.ron", std::process::id()));
        let path = path.to_string_lossy().to_string();
        let config = WorldConfig {
            name: "saved".to_string(),
            ..WorldConfig::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = WorldConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let path = std::env::temp_dir().join(format!("world_config_{}.ini", std::process::id()));
        let path = path.to_string_lossy().to_string();
        std::fs::write(&path, "name = \"arena\"\n").unwrap();
        let err = WorldConfig::load_from_file(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));

        let err = WorldConfig::default().save_to_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
        assert!(!std::path::Path::new(&path).exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("missing_world_config_{}.toml", std::process::id()));
        let err = WorldConfig::load_from_file(&path.to_string_lossy()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_zero_first_id_rejected() {
        let config = WorldConfig {
            first_entity_id: 0,
            ..WorldConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "first_entity_id", .. })));
    }
}
