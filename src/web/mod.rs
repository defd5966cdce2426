// HTTP surface of the render server.
// Exposes POST /render and GET /health on top of the render pipeline.

mod app;
mod error;
mod handlers;
mod listeners;
mod models;

pub use app::create_app;
pub use error::ApiError;
pub use listeners::create_listener;
pub use models::{HealthResponse, ItemIdList, RenderRequestBody};

use crate::pipeline::RenderPipeline;
use std::sync::Arc;

// Render requests carry a few ids and integers; anything larger is not a valid request.
pub const MAX_REQUEST_SIZE_BYTES: usize = 64 * 1024;

pub type SharedPipeline = Arc<RenderPipeline>;
