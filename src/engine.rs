use std::{sync::Arc, time::Duration};

use futures::FutureExt as _;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::{
    loader::{ByteSource, ImageLoader, normalize_path},
    model::{DisplayMode, LayerId, Phase, TransitionKind},
    surface::{self, SceneView, Surface},
};

/// Fallback deadline for a transition whose completion signal never arrives
/// (zero-duration styles, throttled renderer, missed event). Empirical value;
/// there is no derived formula.
pub const GUARD_TIMEOUT: Duration = Duration::from_millis(1400);

/// Animation-frame ticks awaited between the prep render and the class flip,
/// so the host paints the pre-transition state before the animation starts.
/// Without it the renderer can skip the transition entirely. Empirical value.
pub const PREROLL_FRAMES: u32 = 2;

#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub guard_timeout: Duration,
    pub preroll_frames: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            guard_timeout: GUARD_TIMEOUT,
            preroll_frames: PREROLL_FRAMES,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Prep,
    Entering,
}

/// The committed layer. Source and path only ever change together, and only
/// on commit, so the path always names the last fully displayed image.
#[derive(Clone, Debug)]
struct Committed {
    src: String,
    path: String,
}

/// The in-flight transition. Holding top source, pending path and stage in
/// one value makes "top set but idle" unrepresentable.
#[derive(Clone, Debug)]
struct Overlay {
    top_src: String,
    pending_path: String,
    stage: Stage,
    /// Captured when the transition starts; a `set_transition` issued
    /// mid-flight only affects the next transition.
    kind: TransitionKind,
    /// Stamp of the presenter cycle that created this overlay. An aborted
    /// cycle may still be running its preroll or guard when a successor's
    /// overlay appears; only the cycle whose stamp matches may flip or
    /// commit it.
    epoch: u64,
}

#[derive(Debug, Default)]
struct State {
    base: Option<Committed>,
    overlay: Option<Overlay>,
    /// Single-slot last-writer-wins queue for requests arriving mid-flight.
    queued: Option<String>,
    busy: bool,
    mode: DisplayMode,
    kind: TransitionKind,
    /// Bumped for every overlay created; see `Overlay::epoch`.
    epoch: u64,
}

impl State {
    fn phase(&self) -> Phase {
        match &self.overlay {
            None => Phase::Idle,
            Some(o) => match o.stage {
                Stage::Prep => Phase::Prep,
                Stage::Entering => Phase::Entering,
            },
        }
    }

    fn view(&self) -> SceneView {
        SceneView {
            base_src: self.base.as_ref().map(|b| b.src.clone()),
            top_src: self.overlay.as_ref().map(|o| o.top_src.clone()),
            phase: self.phase(),
            mode: self.mode,
            kind: self.overlay.as_ref().map_or(self.kind, |o| o.kind),
        }
    }
}

/// Observable engine state, for tests and host debug panels.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct EngineSnapshot {
    pub phase: Phase,
    pub current_path: Option<String>,
    pub base_src: Option<String>,
    pub top_src: Option<String>,
    pub pending_path: Option<String>,
    pub queued_path: Option<String>,
    pub busy: bool,
    pub mode: DisplayMode,
    pub transition: TransitionKind,
}

/// The wallpaper transition state machine.
///
/// Requests are serialized: at most one load/transition runs at a time, and a
/// request arriving mid-flight lands in a single-slot last-writer-wins queue,
/// so out of a burst only the most recent image is ever drawn. On any failure
/// the committed base image stays untouched; a blank surface is never an
/// acceptable outcome.
pub struct WallpaperEngine<B, S> {
    state: Mutex<State>,
    loader: ImageLoader<B>,
    surface: S,
    transition_end: Notify,
    config: EngineConfig,
}

impl<B: ByteSource, S: Surface> WallpaperEngine<B, S> {
    pub fn new(source: B, surface: S) -> Arc<Self> {
        Self::with_config(source, surface, EngineConfig::default())
    }

    pub fn with_config(source: B, surface: S, config: EngineConfig) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
            loader: ImageLoader::new(source),
            surface,
            transition_end: Notify::new(),
            config,
        })
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let st = self.state.lock();
        EngineSnapshot {
            phase: st.phase(),
            current_path: st.base.as_ref().map(|b| b.path.clone()),
            base_src: st.base.as_ref().map(|b| b.src.clone()),
            top_src: st.overlay.as_ref().map(|o| o.top_src.clone()),
            pending_path: st.overlay.as_ref().map(|o| o.pending_path.clone()),
            queued_path: st.queued.clone(),
            busy: st.busy,
            mode: st.mode,
            transition: st.kind,
        }
    }

    pub fn loader(&self) -> &ImageLoader<B> {
        &self.loader
    }

    /// Requests a wallpaper change. Resolves once the request has been drawn,
    /// superseded by a newer one, or dropped on failure.
    pub async fn set_image(self: &Arc<Self>, path: &str) {
        let mut path = normalize_path(path);
        if path.is_empty() {
            warn!("ignoring empty wallpaper path");
            return;
        }

        {
            let mut st = self.state.lock();
            if st.base.as_ref().is_some_and(|b| b.path == path) {
                debug!(%path, "already showing this image");
                return;
            }
            if st.overlay.as_ref().is_some_and(|o| o.pending_path == path) {
                debug!(%path, "already transitioning to this image");
                return;
            }
            if st.busy || st.overlay.is_some() {
                debug!(%path, "engine busy, queueing request");
                st.queued = Some(path.clone());
                drop(st);
                self.loader.prefetch(&path);
                return;
            }
            st.busy = true;
        }

        loop {
            match self.loader.load(&path).await {
                Ok(src) => match self.after_load(&path) {
                    AfterLoad::Present => {
                        self.present(path, src).await;
                        return;
                    }
                    AfterLoad::Supersede(next) => {
                        debug!(stale = %path, %next, "superseded while loading");
                        path = next;
                    }
                    AfterLoad::AlreadyCurrent => return,
                },
                Err(err) => {
                    warn!(%path, error = %err, "wallpaper load failed, keeping current image");
                    match self.after_failure() {
                        Some(next) => path = next,
                        None => return,
                    }
                }
            }
        }
    }

    /// Updates the display mode and re-renders both layers under it. Never
    /// interrupts an in-flight transition.
    pub fn set_mode(&self, mode: DisplayMode) {
        let plan = {
            let mut st = self.state.lock();
            st.mode = mode;
            surface::plan(&st.view())
        };
        debug!(%mode, "display mode updated");
        self.surface.apply(&plan);
    }

    /// Updates the transition kind. Takes effect from the next transition; an
    /// in-flight one keeps the class it started with.
    pub fn set_transition(&self, kind: TransitionKind) {
        let plan = {
            let mut st = self.state.lock();
            st.kind = kind;
            surface::plan(&st.view())
        };
        debug!(%kind, "transition kind updated");
        self.surface.apply(&plan);
    }

    /// Host signal that a layer transition finished. Only an `opacity`
    /// completion while the overlay is entering counts; everything else is
    /// ignored.
    pub fn notify_transition_end(&self, property: &str) {
        if property != "opacity" {
            return;
        }
        let entering = {
            let st = self.state.lock();
            st.overlay.as_ref().is_some_and(|o| o.stage == Stage::Entering)
        };
        if entering {
            self.transition_end.notify_one();
        }
    }

    /// Host signal that a layer failed to display its source. A top-layer
    /// failure aborts the transition without retry; a base-layer failure is
    /// logged only, since the base is already committed.
    pub fn notify_layer_error(&self, layer: LayerId) {
        match layer {
            LayerId::Base => {
                warn!("base layer failed to display, keeping committed state");
            }
            LayerId::Top => {
                let plan = {
                    let mut st = self.state.lock();
                    if st.overlay.take().is_none() {
                        return;
                    }
                    st.busy = false;
                    // Anything queued predates the abort; keeping it would
                    // let it outrank the next, newer request.
                    st.queued = None;
                    surface::plan(&st.view())
                };
                warn!("top layer failed to display, aborting transition");
                self.surface.apply(&plan);
                // Wake the presenter waiting on a now-dead overlay.
                self.transition_end.notify_one();
            }
        }
    }

    /// Post-load reconciliation: a newer request may have arrived while the
    /// bytes loaded, in which case the stale result is never drawn.
    fn after_load(&self, loaded_path: &str) -> AfterLoad {
        let mut st = self.state.lock();
        let queued = st.queued.take_if(|q| *q != loaded_path);
        match queued {
            None => AfterLoad::Present,
            Some(next) => {
                if st.base.as_ref().is_some_and(|b| b.path == next) {
                    st.busy = false;
                    AfterLoad::AlreadyCurrent
                } else {
                    AfterLoad::Supersede(next)
                }
            }
        }
    }

    /// Failure cleanup. The base layer is untouched; if a newer request is
    /// queued it is served next so a burst still converges on its last entry.
    fn after_failure(&self) -> Option<String> {
        let (plan, next) = {
            let mut st = self.state.lock();
            let queued = st.queued.take();
            let next = queued.filter(|q| st.base.as_ref().is_none_or(|b| b.path != *q));
            if next.is_none() {
                st.busy = false;
            }
            (surface::plan(&st.view()), next)
        };
        self.surface.apply(&plan);
        next
    }

    async fn present(self: &Arc<Self>, path: String, src: String) {
        let animated = {
            let st = self.state.lock();
            if st.base.is_none() || st.kind == TransitionKind::None {
                None
            } else {
                Some(st.kind)
            }
        };

        let Some(kind) = animated else {
            debug!(%path, "committing without transition");
            self.finalize(src, path);
            return;
        };

        // Prep render: top layer mounted, animation not yet started.
        let (plan, epoch) = {
            let mut st = self.state.lock();
            st.epoch += 1;
            st.overlay = Some(Overlay {
                top_src: src,
                pending_path: path.clone(),
                stage: Stage::Prep,
                kind,
                epoch: st.epoch,
            });
            (surface::plan(&st.view()), st.epoch)
        };
        self.surface.apply(&plan);

        // Let the host paint the prep state; flipping the class in the same
        // frame can skip the animation entirely.
        for _ in 0..self.config.preroll_frames {
            self.surface.next_frame().await;
        }

        // Drop any stale completion permit from an aborted earlier cycle
        // before the class flip can produce a real one.
        let _ = self.transition_end.notified().now_or_never();

        let plan = {
            let mut st = self.state.lock();
            let Some(overlay) = st.overlay.as_mut().filter(|o| o.epoch == epoch) else {
                // Aborted during preroll, possibly with a successor's overlay
                // already in place; this cycle owns nothing anymore.
                return;
            };
            overlay.stage = Stage::Entering;
            surface::plan(&st.view())
        };
        self.surface.apply(&plan);

        let done = self.transition_end.notified();
        tokio::pin!(done);
        tokio::select! {
            _ = &mut done => {
                debug!(%path, "transition completion signaled");
            }
            _ = tokio::time::sleep(self.config.guard_timeout) => {
                debug!(%path, "completion signal never arrived, guard timer forcing commit");
            }
        }
        self.commit(epoch);
    }

    fn commit(self: &Arc<Self>, epoch: u64) {
        let overlay = {
            let st = self.state.lock();
            st.overlay.clone().filter(|o| o.epoch == epoch)
        };
        let Some(overlay) = overlay else {
            // Aborted while waiting; whatever overlay exists now belongs to a
            // later cycle and commits on that cycle's own race.
            return;
        };
        debug!(path = %overlay.pending_path, "transition committed");
        self.finalize(overlay.top_src, overlay.pending_path);
    }

    /// Promotes `src`/`path` to the base layer, clears the in-flight state
    /// and drains the queue. The dequeued request is re-issued on a spawned
    /// task, never recursively, so bursts cannot grow the call stack.
    fn finalize(self: &Arc<Self>, src: String, path: String) {
        let (plan, next) = {
            let mut st = self.state.lock();
            st.overlay = None;
            st.busy = false;
            let queued = st.queued.take();
            let next = queued.filter(|q| *q != path);
            st.base = Some(Committed { src, path });
            (surface::plan(&st.view()), next)
        };
        self.surface.apply(&plan);

        if let Some(next) = next {
            debug!(path = %next, "draining queued wallpaper");
            let engine = Arc::clone(self);
            tokio::spawn(async move { engine.set_image(&next).await });
        }
    }
}

enum AfterLoad {
    Present,
    Supersede(String),
    AlreadyCurrent,
}
