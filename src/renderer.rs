// Render invoker: argument building and execution of the external renderer.
//
// Every invocation is described by a `RenderInvocation`, which yields both the
// argument tokens and the path of the PNG the renderer writes for them. The
// same values feed both, so the packager never has to re-derive file names.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::RenderError;
use crate::playerkit::{ColorKit, Gender, PlayerKit};

/// Horizontal camera angle per rotation index.
const ROTATION_ANGLES: [i32; 4] = [128, 384, 1152, 1664];

const BODY_X_ANGLE: i32 = 96;
const BODY_Z_ANGLE: i32 = 0;

const CHATHEAD_ANIM: i32 = 589;
const CHATHEAD_Y_ANGLE: i32 = 128;

/// Output subdirectory for body renders.
pub const BODY_SUBDIR: &str = "player";
/// Output subdirectory for chathead renders.
pub const CHATHEAD_SUBDIR: &str = "playerchathead";

/// One of the four snapshot angles a body can be rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation(usize);

impl Rotation {
    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < ROTATION_ANGLES.len())
            .map(Self)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn angle(self) -> i32 {
        ROTATION_ANGLES[self.0]
    }
}

/// Camera and animation parameters of a body render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyPose {
    pub pose_anim: i32,
    pub x_angle: i32,
    pub y_angle: i32,
    pub z_angle: i32,
}

impl BodyPose {
    pub fn new(pose_anim: i32, rotation: Rotation) -> Self {
        Self {
            pose_anim,
            x_angle: BODY_X_ANGLE,
            y_angle: rotation.angle(),
            z_angle: BODY_Z_ANGLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Body(BodyPose),
    Chathead,
}

impl RenderMode {
    fn subdir(&self) -> &'static str {
        match self {
            RenderMode::Body(_) => BODY_SUBDIR,
            RenderMode::Chathead => CHATHEAD_SUBDIR,
        }
    }
}

/// Where a job's renders read the cache from and write their output to.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub cache_path: PathBuf,
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderInvocation {
    pub cache_path: PathBuf,
    pub out_dir: PathBuf,
    pub kit: PlayerKit,
    pub colors: ColorKit,
    pub gender: Gender,
    pub mode: RenderMode,
}

fn join_csv(values: &[i32]) -> String {
    values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn bracketed(values: &[i32]) -> String {
    let inner = values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", inner)
}

/// File name the renderer gives the output for a kit and color kit,
/// e.g. `[0, 0, 2048]_[0, 6, 9, 0, 1].png`.
pub fn artifact_file_name(kit: &PlayerKit, colors: &ColorKit) -> String {
    format!("{}_{}.png", bracketed(kit.slots()), bracketed(colors.values()))
}

impl RenderInvocation {
    pub fn new(
        context: &RenderContext,
        kit: &PlayerKit,
        colors: &ColorKit,
        gender: Gender,
        mode: RenderMode,
    ) -> Self {
        Self {
            cache_path: context.cache_path.clone(),
            out_dir: context.out_dir.clone(),
            kit: *kit,
            colors: *colors,
            gender,
            mode,
        }
    }

    /// Argument tokens passed to the renderer, in order.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--cache".into(),
            self.cache_path.clone().into_os_string(),
            "--out".into(),
            self.out_dir.clone().into_os_string(),
            "--playerkit".into(),
            join_csv(self.kit.slots()).into(),
            "--playercolors".into(),
            join_csv(self.colors.values()).into(),
        ];

        match self.mode {
            RenderMode::Body(pose) => {
                for (flag, value) in [
                    ("--poseanim", pose.pose_anim),
                    ("--xan2d", pose.x_angle),
                    ("--yan2d", pose.y_angle),
                    ("--zan2d", pose.z_angle),
                ] {
                    args.push(flag.into());
                    args.push(value.to_string().into());
                }
            }
            RenderMode::Chathead => {
                args.push("--playerchathead".into());
                args.push("--anim".into());
                args.push(CHATHEAD_ANIM.to_string().into());
                args.push("--lowres".into());
                args.push("--crophead".into());
                args.push("--yan2d".into());
                args.push(CHATHEAD_Y_ANGLE.to_string().into());
            }
        }

        if self.gender.is_female() {
            args.push("--playerfemale".into());
        }

        args
    }

    /// The PNG the renderer writes for this invocation.
    pub fn artifact_path(&self) -> PathBuf {
        self.out_dir
            .join(self.mode.subdir())
            .join(artifact_file_name(&self.kit, &self.colors))
    }
}

/// Something that can carry out a render invocation.
///
/// Success means the renderer reported success; it does not check that the
/// artifact exists.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, invocation: &RenderInvocation) -> Result<(), RenderError>;
}

/// Runs the renderer as a child process, one process per invocation.
#[derive(Debug, Clone)]
pub struct ExternalRenderer {
    program: PathBuf,
    leading_args: Vec<OsString>,
    timeout: Option<Duration>,
}

impl ExternalRenderer {
    /// Runs `program` directly with the invocation tokens.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout: None,
        }
    }

    /// Runs `<java> -jar <jar>` followed by the invocation tokens.
    pub fn java_jar(java: impl Into<PathBuf>, jar: impl AsRef<Path>) -> Self {
        Self {
            program: java.into(),
            leading_args: vec!["-jar".into(), jar.as_ref().as_os_str().to_os_string()],
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Renderer for ExternalRenderer {
    async fn render(&self, invocation: &RenderInvocation) -> Result<(), RenderError> {
        let args = invocation.args();
        debug!(
            "Launching renderer {} {:?} {:?}",
            self.program.display(),
            self.leading_args,
            args
        );

        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed out render drops the future, which must also stop the child.
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, command.output())
                .await
                .map_err(|_| RenderError::RenderTimeout(limit))?,
            None => command.output().await,
        }
        .map_err(|e| {
            RenderError::RenderProcess(format!(
                "failed to launch {}: {}",
                self.program.display(),
                e
            ))
        })?;

        if !output.status.success() {
            warn!(
                "Renderer exited with {}. stderr: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(RenderError::RenderProcess(format!(
                "renderer exited with {}",
                output.status
            )));
        }

        Ok(())
    }
}

/// Renders the full body of `kit` and returns the path of the produced PNG.
pub async fn render_body(
    renderer: &dyn Renderer,
    context: &RenderContext,
    kit: &PlayerKit,
    colors: &ColorKit,
    gender: Gender,
    pose: BodyPose,
) -> Result<PathBuf, RenderError> {
    let invocation = RenderInvocation::new(context, kit, colors, gender, RenderMode::Body(pose));
    renderer.render(&invocation).await?;
    Ok(invocation.artifact_path())
}

/// Renders the cropped head of `kit` and returns the path of the produced PNG.
pub async fn render_chathead(
    renderer: &dyn Renderer,
    context: &RenderContext,
    kit: &PlayerKit,
    colors: &ColorKit,
    gender: Gender,
) -> Result<PathBuf, RenderError> {
    let invocation = RenderInvocation::new(context, kit, colors, gender, RenderMode::Chathead);
    renderer.render(&invocation).await?;
    Ok(invocation.artifact_path())
}
