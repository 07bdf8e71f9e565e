// Chart view: one chart's scales, geometry and hover state

use crate::chart::{ChartKind, ChartSpec};
use crate::data::Dataset;
use crate::interaction::{HoverController, HoverState, Transition};
use crate::ir::{Frame, Geometry, PrimitiveId};
use crate::layout;
use crate::scale::ScaleConfig;
use serde::Serialize;

pub const EMPTY_MESSAGE: &str = "No data available for selected filters";

/// What a view currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scene", rename_all = "snake_case")]
pub enum Scene {
    Chart { title: String, geometry: Geometry },
    /// Rendered as a dashed box with the message centred in it.
    Placeholder { message: String },
}

impl Scene {
    pub fn placeholder(message: impl Into<String>) -> Self {
        Scene::Placeholder {
            message: message.into(),
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            Scene::Chart { geometry, .. } => Some(geometry),
            Scene::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Scene::Placeholder { .. })
    }
}

/// Binds a chart's layout to its own scale configuration and hover controller.
///
/// A view never shares state with another view; the dataset it is given is only read.
#[derive(Debug, Clone)]
pub struct ChartView {
    spec: Option<ChartSpec>,
    frame: Frame,
    scales: ScaleConfig,
    hover: HoverController,
    scene: Scene,
}

impl ChartView {
    /// Mount a view with the chart's default scales. It shows the empty state until updated.
    pub fn mount(spec: ChartSpec, frame: Frame) -> Self {
        let scales = spec.kind().default_scales();
        Self::mount_with_scales(spec, frame, scales)
    }

    pub fn mount_with_scales(spec: ChartSpec, frame: Frame, scales: ScaleConfig) -> Self {
        let hover = HoverController::new(spec.tooltip());
        Self {
            spec: Some(spec),
            frame,
            scales,
            hover,
            scene: Scene::placeholder(EMPTY_MESSAGE),
        }
    }

    /// Mount by router key. Unknown keys give a view that always shows an "unsupported" placeholder.
    pub fn mount_key(key: &str, frame: Frame) -> Self {
        match key.parse::<ChartKind>() {
            Ok(kind) => Self::mount(ChartSpec::default_for(kind), frame),
            Err(e) => {
                tracing::warn!(key, "unsupported chart type");
                Self {
                    spec: None,
                    frame,
                    scales: ScaleConfig::default(),
                    hover: HoverController::default(),
                    scene: Scene::placeholder(e.to_string()),
                }
            }
        }
    }

    pub fn spec(&self) -> Option<&ChartSpec> {
        self.spec.as_ref()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn scales(&self) -> &ScaleConfig {
        &self.scales
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn hover_state(&self) -> &HoverState {
        self.hover.state()
    }

    /// Rebuild the scene from scratch for new data. Any hover is dropped.
    pub fn update(&mut self, dataset: &Dataset) {
        let Some(spec) = &self.spec else {
            return;
        };
        self.hover.leave();
        self.scene = if dataset.is_empty() {
            Scene::placeholder(EMPTY_MESSAGE)
        } else {
            let geometry = layout::layout(dataset, spec, &self.frame, &self.scales);
            if geometry.is_empty() {
                Scene::placeholder(EMPTY_MESSAGE)
            } else {
                Scene::Chart {
                    title: spec.title().to_string(),
                    geometry,
                }
            }
        };
        tracing::debug!(
            chart = %spec.kind(),
            records = dataset.len(),
            placeholder = self.scene.is_placeholder(),
            "view updated"
        );
    }

    /// Pointer moved to `(x, y)`: enter whatever primitive is on top there, or leave.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Vec<Transition> {
        let hit = self.scene.geometry().and_then(|g| g.hit_test(x, y));
        match hit {
            Some(primitive) => self.hover.enter(primitive),
            None => self.hover.leave().into_iter().collect(),
        }
    }

    /// Pointer entered the primitive with `id`. Unknown ids are ignored.
    pub fn pointer_enter(&mut self, id: PrimitiveId) -> Vec<Transition> {
        match self.scene.geometry().and_then(|g| g.primitive(id)) {
            Some(primitive) => self.hover.enter(primitive),
            None => Vec::new(),
        }
    }

    pub fn pointer_leave(&mut self) -> Option<Transition> {
        self.hover.leave()
    }
}
