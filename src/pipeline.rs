//! Blueprint visualizer state machine.
//!
//! One session is live at a time. Each run holds a [`SessionToken`]; every
//! resumption point checks it before touching shared state, so a stopped or
//! superseded run finishes its remote calls but its results are dropped.

use futures::FutureExt;
use futures::future::join_all;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::client::GenerationClient;
use crate::image::InlineImage;
use crate::raster::Rasterizer;

pub const DRAWING_FAILED: &str = "Failed to generate blueprint. Please try again.";
pub const RASTER_FAILED: &str = "Failed to rasterize blueprint.";
pub const PERSPECTIVES_FAILED: &str = "Failed to generate perspectives.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    GeneratingDrawing,
    Rasterizing,
    GeneratingRenders,
    Complete,
    Error,
    Stopped,
}

impl Status {
    /// No further transition happens without a new submission.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Complete | Status::Error | Status::Stopped)
    }

    /// A run is in flight; front-ends disable submission.
    pub fn is_busy(&self) -> bool {
        !self.is_terminal() && *self != Status::Idle
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Idle => "idle",
            Status::GeneratingDrawing => "generating drawing",
            Status::Rasterizing => "rasterizing",
            Status::GeneratingRenders => "generating renders",
            Status::Complete => "complete",
            Status::Error => "error",
            Status::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A named camera framing for styled renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewpoint {
    pub id: &'static str,
    /// Sent to the image model.
    pub prompt_label: &'static str,
    /// Shown to the user.
    pub name: &'static str,
}

/// Every viewpoint, in the order results are presented.
pub const VIEWPOINTS: [Viewpoint; 3] = [
    Viewpoint {
        id: "p1",
        prompt_label: "Isometric View",
        name: "Isometric Cutaway",
    },
    Viewpoint {
        id: "p2",
        prompt_label: "Interior Eye-Level View",
        name: "Interior Eye-Level",
    },
    Viewpoint {
        id: "p3",
        prompt_label: "Top-Down Photorealistic View",
        name: "Realistic Top-Down",
    },
];

/// How much work follows the drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GenerationMode {
    /// Drawing only, no renders.
    DrawingOnly,
    /// One isometric render.
    Fast,
    /// All three renders.
    #[default]
    Quality,
}

impl GenerationMode {
    pub fn viewpoints(&self) -> &'static [Viewpoint] {
        match self {
            GenerationMode::DrawingOnly => &[],
            GenerationMode::Fast => &VIEWPOINTS[..1],
            GenerationMode::Quality => &VIEWPOINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub mode: GenerationMode,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, mode: GenerationMode) -> Self {
        Self {
            prompt: prompt.into(),
            mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub id: String,
    pub label: String,
    pub image: InlineImage,
    pub caption: String,
}

impl RenderResult {
    fn new(viewpoint: &Viewpoint, prompt: &str, image: InlineImage) -> Self {
        Self {
            id: viewpoint.id.to_string(),
            label: viewpoint.name.to_string(),
            image,
            caption: format!("{} of {}", viewpoint.name, prompt),
        }
    }
}

/// Observable state of the live run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationSession {
    pub id: u64,
    pub status: Status,
    pub prompt: String,
    pub mode: GenerationMode,
    pub drawing_markup: Option<String>,
    pub raster_image: Option<InlineImage>,
    /// In viewpoint order, failed viewpoints omitted.
    pub renders: Vec<RenderResult>,
    pub error: Option<String>,
    pub drawing_time: Option<Duration>,
    pub render_time: Option<Duration>,
}

#[derive(Debug, Clone)]
struct SessionToken {
    id: u64,
    cancel: CancellationToken,
}

impl SessionToken {
    fn new(id: u64) -> Self {
        Self {
            id,
            cancel: CancellationToken::new(),
        }
    }
}

#[derive(Debug)]
struct Shared {
    session: GenerationSession,
    token: SessionToken,
}

/// Runs generation sessions and publishes their progress.
#[derive(Clone)]
pub struct Pipeline {
    client: GenerationClient,
    rasterizer: Rasterizer,
    shared: Arc<Mutex<Shared>>,
    progress: Arc<watch::Sender<GenerationSession>>,
    next_id: Arc<AtomicU64>,
}

impl Pipeline {
    pub fn new(client: GenerationClient) -> Self {
        Self::with_rasterizer(client, Rasterizer::snapshot())
    }

    pub fn with_rasterizer(client: GenerationClient, rasterizer: Rasterizer) -> Self {
        let (tx, _rx) = watch::channel(GenerationSession::default());
        Self {
            client,
            rasterizer,
            shared: Arc::new(Mutex::new(Shared {
                session: GenerationSession::default(),
                token: SessionToken::new(0),
            })),
            progress: Arc::new(tx),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Receives a copy of the session after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<GenerationSession> {
        self.progress.subscribe()
    }

    pub async fn snapshot(&self) -> GenerationSession {
        self.shared.lock().await.session.clone()
    }

    /// Run `request` in the background.
    pub fn submit(&self, request: GenerationRequest) -> tokio::task::JoinHandle<Option<GenerationSession>> {
        let this = self.clone();
        tokio::spawn(async move { this.run(request).await })
    }

    /// Halt the live run. Its pending results will be discarded.
    ///
    /// Works from any non-terminal state, including `Idle`. Returns `false`
    /// when the session had already settled.
    pub async fn stop(&self) -> bool {
        let mut shared = self.shared.lock().await;
        if shared.session.status.is_terminal() {
            return false;
        }
        shared.token.cancel.cancel();
        shared.session.status = Status::Stopped;
        shared.session.error = None;
        info!(session = shared.session.id, "generation stopped");
        self.progress.send_replace(shared.session.clone());
        true
    }

    /// Run one session to a terminal state.
    ///
    /// Returns the final session, or `None` when a newer submission took over
    /// before this one finished.
    #[instrument(skip(self, request), fields(mode = ?request.mode))]
    pub async fn run(&self, request: GenerationRequest) -> Option<GenerationSession> {
        let token = self.begin(&request).await;
        let started = Instant::now();

        let markup = match self.client.generate_drawing(&request.prompt).await {
            Ok(markup) => markup,
            Err(e) => {
                error!(error = %e, "drawing generation failed");
                self.fail(&token, DRAWING_FAILED).await;
                return self.finish(&token).await;
            }
        };
        let drawing_time = started.elapsed();
        let viewpoints = request.mode.viewpoints();
        let next = if viewpoints.is_empty() {
            Status::Complete
        } else {
            Status::Rasterizing
        };
        let applied = self
            .update(&token, |s| {
                s.drawing_markup = Some(markup.clone());
                s.drawing_time = Some(drawing_time);
                s.status = next;
            })
            .await;
        if !applied || viewpoints.is_empty() {
            return self.finish(&token).await;
        }

        let raster = match self.rasterizer.rasterize_async(markup).await {
            Ok(img) => img,
            Err(e) => {
                error!(error = %e, "drawing rasterization failed");
                self.fail(&token, RASTER_FAILED).await;
                return self.finish(&token).await;
            }
        };
        let applied = self
            .update(&token, |s| {
                s.raster_image = Some(raster.clone());
                s.status = Status::GeneratingRenders;
            })
            .await;
        if !applied {
            return self.finish(&token).await;
        }

        let render_start = Instant::now();
        let calls = viewpoints.iter().map(|vp| {
            let raster = &raster;
            let prompt = request.prompt.as_str();
            async move {
                self.client
                    .generate_styled_render(prompt, vp.prompt_label, raster)
                    .await
            }
        });
        // join_all yields results in input order whatever the completion order.
        let settled = match AssertUnwindSafe(join_all(calls)).catch_unwind().await {
            Ok(settled) => settled,
            Err(_) => {
                error!("render fan-out panicked");
                self.fail(&token, PERSPECTIVES_FAILED).await;
                return self.finish(&token).await;
            }
        };
        let render_time = render_start.elapsed();
        let renders: Vec<RenderResult> = viewpoints
            .iter()
            .zip(settled)
            .filter_map(|(vp, res)| match res {
                Ok(img) => Some(RenderResult::new(vp, &request.prompt, img)),
                Err(e) => {
                    warn!(viewpoint = vp.id, error = %e, "render failed");
                    None
                }
            })
            .collect();

        if renders.is_empty() {
            warn!("every render failed");
        }
        self.update(&token, |s| {
            s.renders = renders;
            s.render_time = Some(render_time);
            s.status = Status::Complete;
        })
        .await;
        self.finish(&token).await
    }

    /// Supersede any live run and reset the session.
    async fn begin(&self, request: &GenerationRequest) -> SessionToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = SessionToken::new(id);
        let mut shared = self.shared.lock().await;
        shared.token.cancel.cancel();
        shared.token = token.clone();
        shared.session = GenerationSession {
            id,
            status: Status::GeneratingDrawing,
            prompt: request.prompt.clone(),
            mode: request.mode,
            ..GenerationSession::default()
        };
        info!(session = id, prompt = %request.prompt, "generation started");
        self.progress.send_replace(shared.session.clone());
        token
    }

    /// Apply `f` if `token` still owns the session.
    async fn update<F>(&self, token: &SessionToken, f: F) -> bool
    where
        F: FnOnce(&mut GenerationSession),
    {
        let mut shared = self.shared.lock().await;
        if token.cancel.is_cancelled() || shared.token.id != token.id {
            debug!(session = token.id, "discarding stale result");
            return false;
        }
        f(&mut shared.session);
        debug!(session = token.id, status = %shared.session.status, "session updated");
        self.progress.send_replace(shared.session.clone());
        true
    }

    async fn fail(&self, token: &SessionToken, message: &str) {
        self.update(token, |s| {
            s.status = Status::Error;
            s.error = Some(message.to_string());
        })
        .await;
    }

    async fn finish(&self, token: &SessionToken) -> Option<GenerationSession> {
        let shared = self.shared.lock().await;
        (shared.token.id == token.id).then(|| shared.session.clone())
    }
}
