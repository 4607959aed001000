#![forbid(unsafe_code)]

pub mod bridge;
pub mod engine;
pub mod error;
pub mod loader;
pub mod model;
pub mod sniff;
pub mod surface;

pub use bridge::{HostEvent, HostLink, REFRESH_THROTTLE, run_bridge};
pub use engine::{EngineConfig, EngineSnapshot, GUARD_TIMEOUT, PREROLL_FRAMES, WallpaperEngine};
pub use error::{IoKind, MuraleError, MuraleResult};
pub use loader::{ByteSource, FsByteSource, ImageLoader, normalize_path};
pub use model::{DisplayMode, LayerId, Phase, TransitionKind};
pub use surface::{LayerPlan, Placement, SceneView, Surface, SurfacePlan, plan};
