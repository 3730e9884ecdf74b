//! Light parameters fed to render proxies

use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
    /// Spot light (like a flashlight)
    Spot,
}

impl LightType {
    /// Name used by property tables
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directional => "Directional",
            Self::Point => "Point",
            Self::Spot => "Spot",
        }
    }

    /// Parse a property-table name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Directional" => Some(Self::Directional),
            "Point" => Some(Self::Point),
            "Spot" => Some(Self::Spot),
            _ => None,
        }
    }
}

/// Light parameters; placement comes from the proxy transform
#[derive(Debug, Clone, PartialEq)]
pub struct LightParams {
    /// Light type
    pub light_type: LightType,
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// Light range (for point/spot lights)
    pub range: f32,
    /// Inner cone angle for spot lights (in radians)
    pub inner_cone_angle: f32,
    /// Outer cone angle for spot lights (in radians)
    pub outer_cone_angle: f32,
    /// Whether this light casts shadows
    pub cast_shadows: bool,
}

impl Default for LightParams {
    fn default() -> Self {
        Self::point(Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0)
    }
}

impl LightParams {
    /// Create a directional light
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            color,
            intensity,
            range: 0.0,
            inner_cone_angle: 0.0,
            outer_cone_angle: 0.0,
            cast_shadows: true,
        }
    }

    /// Create a point light
    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            color,
            intensity,
            range,
            inner_cone_angle: 0.0,
            outer_cone_angle: 0.0,
            cast_shadows: false,
        }
    }

    /// Create a spot light
    pub fn spot(color: Vec3, intensity: f32, range: f32, inner_cone_angle: f32, outer_cone_angle: f32) -> Self {
        Self {
            light_type: LightType::Spot,
            color,
            intensity,
            range,
            inner_cone_angle,
            outer_cone_angle,
            cast_shadows: false,
        }
    }

    /// True when the light reaches the whole world
    pub fn is_unbounded(&self) -> bool {
        self.light_type == LightType::Directional || self.range <= 0.0
    }
}
