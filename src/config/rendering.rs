use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clear_color: [f32; 4],
    /// Starting value of the animated color; only the first two channels move.
    pub initial_color: [f32; 4],
    pub color_step: f32,
    /// Name of the `vec4` uniform the color is written to.
    pub color_uniform: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            initial_color: [0.0, 0.5, 0.8, 1.0],
            color_step: 0.05,
            color_uniform: "u_Color".to_string(),
        }
    }
}
