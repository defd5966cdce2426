// Request orchestration: compose kits, render, mirror chatheads, package.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifacts::{encode_artifact, mirror_chatheads};
use crate::catalog::ItemCatalog;
use crate::error::RenderError;
use crate::playerkit::{ComposedKits, Gender, compose_kits};
use crate::renderer::{
    BodyPose, CHATHEAD_SUBDIR, RenderContext, Renderer, Rotation, render_body, render_chathead,
};

/// A validated render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub item_ids: Vec<i32>,
    pub rotation: Rotation,
    pub pose_anim: i32,
}

/// Payload returned to the client. Blobs are base64 encoded PNGs.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub request_id: Uuid,
    pub item_names: Vec<String>,
    pub male_render_blob: String,
    pub female_render_blob: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub male_chathead_render_blob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub female_chathead_render_blob: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Cache directory handed to the renderer.
    pub cache_path: PathBuf,
    /// Parent of every job directory.
    pub tmp_root: PathBuf,
    /// Leave job directories on disk after the response is built.
    pub keep_artifacts: bool,
}

/// The private working directory of one request, removed when dropped.
#[derive(Debug)]
pub struct RenderJob {
    id: Uuid,
    dir: PathBuf,
    keep: bool,
}

impl RenderJob {
    pub fn create(tmp_root: &Path, keep: bool) -> Result<Self, RenderError> {
        let id = Uuid::new_v4();
        let dir = tmp_root.join(id.to_string());
        std::fs::create_dir_all(&dir)?;
        debug!("Created job directory {}", dir.display());
        Ok(Self { id, dir, keep })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Drop for RenderJob {
    fn drop(&mut self) {
        if self.keep {
            info!("Keeping artifacts of job {} in {}", self.id, self.dir.display());
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            warn!("Failed to remove job directory {}: {}", self.dir.display(), e);
        }
    }
}

struct RenderedArtifacts {
    male_body: PathBuf,
    female_body: PathBuf,
    chatheads: Option<(PathBuf, PathBuf)>,
}

pub struct RenderPipeline {
    catalog: Arc<ItemCatalog>,
    renderer: Arc<dyn Renderer>,
    settings: PipelineSettings,
}

impl RenderPipeline {
    pub fn new(
        catalog: Arc<ItemCatalog>,
        renderer: Arc<dyn Renderer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            catalog,
            renderer,
            settings,
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub async fn run(&self, request: &RenderRequest) -> Result<RenderResponse, RenderError> {
        // Catalog problems are reported before any directory or process exists.
        let kits = compose_kits(&self.catalog, &request.item_ids)?;

        let job = RenderJob::create(&self.settings.tmp_root, self.settings.keep_artifacts)?;
        info!(
            "Job {}: rendering items {:?} (rotation {}, pose {}, chatheads: {})",
            job.id(),
            request.item_ids,
            request.rotation.index(),
            request.pose_anim,
            kits.render_chatheads
        );

        let artifacts = self.render_all(&job, &kits, request).await?;
        let response = build_payload(&job, kits.item_names, &artifacts).await?;

        info!("Job {}: done", job.id());
        Ok(response)
    }

    async fn render_all(
        &self,
        job: &RenderJob,
        kits: &ComposedKits,
        request: &RenderRequest,
    ) -> Result<RenderedArtifacts, RenderError> {
        let context = RenderContext {
            cache_path: self.settings.cache_path.clone(),
            out_dir: job.dir().to_path_buf(),
        };
        let renderer = self.renderer.as_ref();
        let pose = BodyPose::new(request.pose_anim, request.rotation);

        let (male_kit, male_colors) = kits.kit(Gender::Male);
        let (female_kit, female_colors) = kits.kit(Gender::Female);

        // Male and female outputs have distinct names, so each pair can run together.
        let (male_body, female_body) = tokio::try_join!(
            render_body(renderer, &context, male_kit, male_colors, Gender::Male, pose),
            render_body(renderer, &context, female_kit, female_colors, Gender::Female, pose),
        )?;

        let chatheads = if kits.render_chatheads {
            let pair = tokio::try_join!(
                render_chathead(renderer, &context, male_kit, male_colors, Gender::Male),
                render_chathead(renderer, &context, female_kit, female_colors, Gender::Female),
            )?;

            let chathead_dir = job.dir().join(CHATHEAD_SUBDIR);
            tokio::task::spawn_blocking(move || mirror_chatheads(&chathead_dir))
                .await
                .map_err(|e| RenderError::Io(std::io::Error::other(e)))??;

            Some(pair)
        } else {
            None
        };

        Ok(RenderedArtifacts {
            male_body,
            female_body,
            chatheads,
        })
    }
}

async fn build_payload(
    job: &RenderJob,
    item_names: Vec<String>,
    artifacts: &RenderedArtifacts,
) -> Result<RenderResponse, RenderError> {
    let (male_chathead_render_blob, female_chathead_render_blob) = match &artifacts.chatheads {
        Some((male, female)) => (
            Some(encode_artifact(male).await?),
            Some(encode_artifact(female).await?),
        ),
        None => (None, None),
    };

    Ok(RenderResponse {
        request_id: job.id(),
        item_names,
        male_render_blob: encode_artifact(&artifacts.male_body).await?,
        female_render_blob: encode_artifact(&artifacts.female_body).await?,
        male_chathead_render_blob,
        female_chathead_render_blob,
    })
}
