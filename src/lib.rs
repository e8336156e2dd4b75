//! Architectural visualization helpers built on a generative image API.
//!
//! Two tools share this crate. The blueprint visualizer turns a description
//! into an SVG floor plan and photorealistic renders of it ([`Pipeline`]).
//! The scene editor keeps a hand-editable plan of placed components and can
//! replace it with a generated layout or render it ([`SceneEditor`]).

pub mod args;
pub mod client;
pub mod config;
pub mod drawing;
pub mod editor;
pub mod error;
pub mod export;
pub mod image;
pub mod llm;
pub mod logger;
pub mod pipeline;
pub mod prompts;
pub mod raster;
pub mod scene;

pub use client::GenerationClient;
pub use config::Config;
pub use editor::ImageEditSession;
pub use error::{ConfigError, GenerationError};
pub use image::InlineImage;
pub use llm::{GenerativeApi, connect};
pub use pipeline::{
    GenerationMode, GenerationRequest, GenerationSession, Pipeline, RenderResult, Status, Viewpoint,
};
pub use raster::Rasterizer;
pub use scene::{ComponentKind, Scene, SceneEditor, SceneItem};
