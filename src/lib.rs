// Library exports for medalboard

pub mod chart;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod filter;
pub mod interaction;
pub mod ir;
pub mod kpi;
pub mod layout;
pub mod palette;
pub mod parser;
pub mod render;
pub mod scale;
pub mod view;

use chart::ChartSpec;
use ir::{Frame, Margin};
use scale::ScaleConfig;
use serde::Deserialize;

pub use error::{BoardError, BoardResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub margin: Margin,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 500 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            margin: Margin::default(),
            format: OutputFormat::Png,
        }
    }
}

impl RenderOptions {
    pub fn frame(&self) -> Frame {
        Frame::new(self.width as f64, self.height as f64, self.margin)
    }
}

/// Contents of a `--config` file. Every section is optional.
///
/// ```json
/// { "chart": { "type": "violin", "bins": 20 }, "scales": { "palette": "viridis" }, "render": { "width": 1000 } }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct BoardConfig {
    #[serde(default)]
    pub chart: Option<ChartSpec>,
    #[serde(default)]
    pub scales: Option<ScaleConfig>,
    #[serde(default)]
    pub render: RenderOptions,
}

impl BoardConfig {
    pub fn from_json_str(input: &str) -> BoardResult<Self> {
        serde_json::from_str(input).map_err(|e| BoardError::data(format!("invalid config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use crate::palette::Palette;

    #[test]
    fn test_render_options_defaults() {
        let options: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, RenderOptions::default());
        let frame = options.frame();
        assert_eq!((frame.width, frame.height), (800.0, 500.0));
        assert_eq!(frame.margin.left, 80.0);
    }

    #[test]
    fn test_board_config_sections() {
        let config = BoardConfig::from_json_str(
            r#"{ "chart": { "type": "violin", "bins": 20 }, "scales": { "palette": "viridis" }, "render": { "width": 1000, "format": "svg" } }"#,
        )
        .unwrap();
        let chart = config.chart.unwrap();
        assert_eq!(chart.kind(), ChartKind::Violin);
        assert_eq!(config.scales.unwrap().palette, Palette::Viridis);
        assert_eq!(config.render.width, 1000);
        assert_eq!(config.render.height, 500);
        assert_eq!(config.render.format, OutputFormat::Svg);
    }

    #[test]
    fn test_board_config_rejects_garbage() {
        assert!(matches!(BoardConfig::from_json_str("[1, 2]"), Err(BoardError::Data(_))));
        assert_eq!(BoardConfig::from_json_str("{}").unwrap(), BoardConfig::default());
    }
}
