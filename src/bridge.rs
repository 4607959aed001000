use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, warn};

use crate::{
    engine::WallpaperEngine,
    error::MuraleResult,
    loader::ByteSource,
    model::{DisplayMode, LayerId, TransitionKind},
    surface::Surface,
};

/// Minimum spacing between desktop-refresh requests triggered by pointer
/// activity on the rendering surface.
pub const REFRESH_THROTTLE: Duration = Duration::from_millis(400);

/// Messages delivered by the host. Serialized names mirror the
/// `wallpaper-update-*` event family of the host window.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum HostEvent {
    #[serde(rename = "wallpaper-update-image")]
    UpdateImage(String),
    #[serde(rename = "wallpaper-update-style")]
    UpdateStyle(DisplayMode),
    #[serde(rename = "wallpaper-update-transition")]
    UpdateTransition(TransitionKind),
    #[serde(rename = "transition-ended")]
    TransitionEnded { property: String },
    #[serde(rename = "layer-failed")]
    LayerFailed(LayerId),
    #[serde(rename = "pointer-down")]
    PointerDown,
}

/// Host-side effects the bridge can request. Failures are logged, never
/// propagated; the engine keeps working on whatever events still arrive.
pub trait HostLink: Send + Sync + 'static {
    /// One-shot readiness handshake, fired once listeners are wired up, so
    /// the host can begin delivering updates.
    fn window_ready(&self) -> MuraleResult<()>;

    /// Ask the window manager to restore the wallpaper layer's z-order.
    fn request_desktop_refresh(&self);
}

/// Consumes host events until the channel closes and dispatches them to the
/// engine. The single active subscriber for each event kind.
pub async fn run_bridge<B, S, L>(
    engine: Arc<WallpaperEngine<B, S>>,
    link: L,
    mut events: mpsc::Receiver<HostEvent>,
) where
    B: ByteSource,
    S: Surface,
    L: HostLink,
{
    if let Err(err) = link.window_ready() {
        warn!(error = %err, "window ready handshake failed, waiting for events anyway");
    }

    let mut last_refresh: Option<Instant> = None;
    while let Some(event) = events.recv().await {
        match event {
            HostEvent::UpdateImage(path) => {
                // Spawned so a burst keeps flowing into the engine's
                // dedupe/queue logic instead of serializing here.
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.set_image(&path).await });
            }
            HostEvent::UpdateStyle(mode) => engine.set_mode(mode),
            HostEvent::UpdateTransition(kind) => engine.set_transition(kind),
            HostEvent::TransitionEnded { property } => {
                engine.notify_transition_end(&property);
            }
            HostEvent::LayerFailed(layer) => engine.notify_layer_error(layer),
            HostEvent::PointerDown => {
                let now = Instant::now();
                let due = last_refresh
                    .is_none_or(|t| now.duration_since(t) >= REFRESH_THROTTLE);
                if due {
                    last_refresh = Some(now);
                    debug!("requesting desktop refresh");
                    link.request_desktop_refresh();
                }
            }
        }
    }
    debug!("host event channel closed, bridge exiting");
}
