// src/config.rs
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::MeshLayout;

/// Constructor-time configuration, loadable from JSON.
///
/// ```json
/// { "layout": { "layout": "grid", "cols": 34, "rows": 20, "seed": 7 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub layout: MeshLayout,
    /// Overrides the host's reduced-motion preference when set.
    pub reduced_motion: Option<bool>,
}

impl AnimatorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolves the reduced-motion flag against the host preference.
    pub fn reduced_motion_or(&self, host_preference: bool) -> bool {
        self.reduced_motion.unwrap_or(host_preference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use crate::layout::{GridLayout, TorusLayout};

    #[test]
    fn empty_json_gives_the_default_torus() {
        let config = AnimatorConfig::from_json("{}").unwrap();
        assert_eq!(config.layout, MeshLayout::Torus(TorusLayout::default()));
        assert!(config.reduced_motion_or(true));
        assert!(!config.reduced_motion_or(false));
    }

    #[test]
    fn grid_config_with_override() {
        let config = AnimatorConfig::from_json(
            r#"{"layout":{"layout":"grid","cols":5,"rows":4,"seed":11},"reduced_motion":false}"#,
        )
        .unwrap();
        assert_eq!(config.layout, MeshLayout::Grid(GridLayout::new(5, 4).with_seed(11)));
        assert!(!config.reduced_motion_or(true));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(AnimatorConfig::from_json("{"), Err(MeshError::Config(_))));
        assert!(matches!(
            AnimatorConfig::from_json(r#"{"layout":{"layout":"sphere"}}"#),
            Err(MeshError::Config(_))
        ));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = AnimatorConfig {
            layout: MeshLayout::Grid(GridLayout::default()),
            reduced_motion: Some(true),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(AnimatorConfig::from_json(&json).unwrap(), config);
    }
}
