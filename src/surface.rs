use std::future::Future;

use crate::model::{DisplayMode, Phase, TransitionKind};

/// How a layer places its content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// `<img>`-style placement: an object-fit plus object-position pair.
    Image {
        fit: &'static str,
        position: &'static str,
    },
    /// Repeating background placement for tile mode.
    Tile,
}

/// Concrete visual properties for one layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayerPlan {
    /// `data:` URL, or `None` when the layer shows nothing.
    pub source: Option<String>,
    pub placement: Placement,
    /// Class driving the host animation; empty when nothing animates.
    pub class: String,
}

/// Full per-layer instruction set for one render.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SurfacePlan {
    pub base: LayerPlan,
    pub top: LayerPlan,
}

/// Immutable view of engine state that a plan is computed from.
#[derive(Clone, Debug, Default)]
pub struct SceneView {
    pub base_src: Option<String>,
    pub top_src: Option<String>,
    pub phase: Phase,
    pub mode: DisplayMode,
    /// Kind of the transition in flight, captured when it started.
    pub kind: TransitionKind,
}

/// Pure mapping from engine state to layer properties. Switching mode never
/// requires reloading either layer's source; both keep whatever they hold.
pub fn plan(view: &SceneView) -> SurfacePlan {
    let placement = placement_for(view.mode);

    let top_class = match view.top_src {
        Some(_) if view.kind != TransitionKind::None && view.phase != Phase::Idle => {
            format!("{} {}", view.kind.as_str(), view.phase.stage_class())
        }
        _ => String::new(),
    };

    SurfacePlan {
        base: LayerPlan {
            source: view.base_src.clone(),
            placement,
            class: String::new(),
        },
        top: LayerPlan {
            source: view.top_src.clone(),
            placement,
            class: top_class,
        },
    }
}

fn placement_for(mode: DisplayMode) -> Placement {
    match mode {
        DisplayMode::Fill => Placement::Image {
            fit: "cover",
            position: "center",
        },
        DisplayMode::Fit => Placement::Image {
            fit: "contain",
            position: "center",
        },
        DisplayMode::Stretch => Placement::Image {
            fit: "fill",
            position: "center",
        },
        DisplayMode::Center => Placement::Image {
            fit: "none",
            position: "center",
        },
        DisplayMode::Tile => Placement::Tile,
    }
}

/// Host-implemented rendering surface. The engine has no dependency on any
/// concrete UI toolkit; a webview layer, a native compositor layer and the
/// test surfaces all sit behind this seam.
pub trait Surface: Send + Sync + 'static {
    /// Applies per-layer properties. Must not block.
    fn apply(&self, plan: &SurfacePlan);

    /// Resolves on the next animation-frame tick of the host renderer.
    fn next_frame(&self) -> impl Future<Output = ()> + Send;
}
