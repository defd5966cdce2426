use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::prelude::{BASE64_STANDARD, Engine as _};
use http_body_util::BodyExt;
use image::{Rgba, RgbaImage};
use serde_json::{Value, json};
use tower::ServiceExt;

use playerkit_render_server::catalog::{ItemCatalog, ItemDefinition};
use playerkit_render_server::error::RenderError;
use playerkit_render_server::pipeline::{PipelineSettings, RenderPipeline, RenderRequest};
use playerkit_render_server::playerkit::{EQUIPPED_ITEM_OFFSET, Gender};
use playerkit_render_server::renderer::{RenderInvocation, RenderMode, Renderer, Rotation};
use playerkit_render_server::web::create_app;

const LEFT: Rgba<u8> = Rgba([255, 0, 0, 255]);
const RIGHT: Rgba<u8> = Rgba([0, 0, 255, 255]);

#[derive(Clone, Copy)]
enum Behaviour {
    WriteArtifacts,
    WriteUnexpectedName,
    Fail,
}

/// Stands in for the renderer jar: records invocations and writes a 2x1 PNG
/// (red on the left, blue on the right) where the real renderer would.
struct FakeRenderer {
    behaviour: Behaviour,
    invocations: Mutex<Vec<RenderInvocation>>,
}

impl FakeRenderer {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            invocations: Mutex::new(Vec::new()),
        })
    }

    fn invocations(&self) -> Vec<RenderInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

fn write_png(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut image = RgbaImage::new(2, 1);
    image.put_pixel(0, 0, LEFT);
    image.put_pixel(1, 0, RIGHT);
    image.save_with_format(path, image::ImageFormat::Png).unwrap();
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, invocation: &RenderInvocation) -> Result<(), RenderError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        match self.behaviour {
            Behaviour::WriteArtifacts => write_png(&invocation.artifact_path()),
            Behaviour::WriteUnexpectedName => {
                write_png(&invocation.artifact_path().with_file_name("render.png"))
            }
            Behaviour::Fail => {
                return Err(RenderError::RenderProcess(format!(
                    "renderer exited with exit status: 1 (cache {})",
                    invocation.cache_path.display()
                )));
            }
        }
        Ok(())
    }
}

fn item(id: i32, name: &str, wear_pos1: i32, wear_pos2: i32) -> ItemDefinition {
    ItemDefinition {
        id,
        name: name.to_string(),
        wear_pos1,
        wear_pos2,
        wear_pos3: -1,
    }
}

fn catalog() -> ItemCatalog {
    ItemCatalog::from_items([
        item(30321, "Bandana", 0, 8),
        item(1127, "Rune platebody", 4, 6),
    ])
}

fn pipeline(renderer: Arc<FakeRenderer>, tmp_root: &Path) -> Arc<RenderPipeline> {
    Arc::new(RenderPipeline::new(
        Arc::new(catalog()),
        renderer,
        PipelineSettings {
            cache_path: "/srv/caches/cache".into(),
            tmp_root: tmp_root.to_path_buf(),
            keep_artifacts: false,
        },
    ))
}

fn app(renderer: Arc<FakeRenderer>, tmp_root: &Path) -> Router {
    create_app(pipeline(renderer, tmp_root))
}

async fn post_render(app: Router, body: String) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/render")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("build request");
    let resp = app.oneshot(req).await.expect("call app");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.expect("read body").to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

fn decode_png(blob: &Value) -> RgbaImage {
    let bytes = BASE64_STANDARD
        .decode(blob.as_str().expect("blob is a string"))
        .expect("valid base64");
    image::load_from_memory(&bytes).expect("valid png").to_rgba8()
}

#[tokio::test]
async fn head_item_renders_bodies_and_mirrored_chatheads() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(Behaviour::WriteArtifacts);

    let (status, body) = post_render(
        app(renderer.clone(), tmp.path()),
        json!({"ids": "30321", "rotation": 0, "poseAnim": 808}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemNames"], json!(["Bandana"]));

    let invocations = renderer.invocations();
    assert_eq!(invocations.len(), 4);

    let request_id = body["requestId"].as_str().unwrap();
    for invocation in &invocations {
        assert!(invocation.out_dir.ends_with(request_id));
        assert_eq!(invocation.kit.slots()[0], 30321 + EQUIPPED_ITEM_OFFSET);
        assert_eq!(invocation.kit.slots()[8], 0);
    }

    // Body renders are passed through, chatheads come back mirrored.
    for field in ["maleRenderBlob", "femaleRenderBlob"] {
        let image = decode_png(&body[field]);
        assert_eq!(*image.get_pixel(0, 0), LEFT, "{field}");
    }
    for field in ["maleChatheadRenderBlob", "femaleChatheadRenderBlob"] {
        let image = decode_png(&body[field]);
        assert_eq!(*image.get_pixel(0, 0), RIGHT, "{field}");
        assert_eq!(*image.get_pixel(1, 0), LEFT, "{field}");
    }

    assert!(is_empty_dir(tmp.path()), "job directory was not removed");
}

#[tokio::test]
async fn body_renders_use_rotation_angle_and_pose() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(Behaviour::WriteArtifacts);

    let (status, body) = post_render(
        app(renderer.clone(), tmp.path()),
        json!({"ids": "1127", "rotation": 2, "poseAnim": 808}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("maleChatheadRenderBlob").is_none());
    assert!(body.get("femaleChatheadRenderBlob").is_none());

    let invocations = renderer.invocations();
    assert_eq!(invocations.len(), 2);
    let mut genders: Vec<_> = invocations.iter().map(|i| i.gender).collect();
    genders.sort_by_key(|g| g.is_female());
    assert_eq!(genders, vec![Gender::Male, Gender::Female]);

    for invocation in &invocations {
        match invocation.mode {
            RenderMode::Body(pose) => {
                assert_eq!(pose.pose_anim, 808);
                assert_eq!((pose.x_angle, pose.y_angle, pose.z_angle), (96, 1152, 0));
            }
            RenderMode::Chathead => panic!("unexpected chathead render"),
        }
        assert_eq!(invocation.cache_path, Path::new("/srv/caches/cache"));
    }
}

#[tokio::test]
async fn chatheads_depend_on_the_last_item() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(Behaviour::WriteArtifacts);

    let (status, body) = post_render(
        app(renderer.clone(), tmp.path()),
        json!({"ids": "30321,1127", "rotation": 1, "poseAnim": 808}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemNames"], json!(["Bandana", "Rune platebody"]));
    assert!(body.get("maleChatheadRenderBlob").is_none());
    assert_eq!(renderer.invocations().len(), 2);
}

#[tokio::test]
async fn unknown_item_is_rejected_before_rendering() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(Behaviour::WriteArtifacts);

    let (status, body) = post_render(
        app(renderer.clone(), tmp.path()),
        json!({"ids": "30321,4151", "rotation": 0, "poseAnim": 808}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], 400);
    assert!(renderer.invocations().is_empty());
    assert!(is_empty_dir(tmp.path()));
}

#[tokio::test]
async fn rotation_outside_table_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(Behaviour::WriteArtifacts);

    let (status, _) = post_render(
        app(renderer.clone(), tmp.path()),
        json!({"ids": "30321", "rotation": 9, "poseAnim": 808}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(renderer.invocations().is_empty());
    assert!(is_empty_dir(tmp.path()));
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(Behaviour::WriteArtifacts);

    let bodies = [
        "{ not json".to_string(),
        json!({"rotation": 0, "poseAnim": 808}).to_string(),
        json!({"ids": "30321", "poseAnim": 808}).to_string(),
        json!({"ids": "30321", "rotation": "front", "poseAnim": 808}).to_string(),
        json!({"ids": "", "rotation": 0, "poseAnim": 808}).to_string(),
    ];
    for body in bodies {
        let (status, _) = post_render(app(renderer.clone(), tmp.path()), body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
    }

    assert!(renderer.invocations().is_empty());
}

#[tokio::test]
async fn renderer_failure_is_an_opaque_server_error() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(Behaviour::Fail);

    let (status, body) = post_render(
        app(renderer.clone(), tmp.path()),
        json!({"ids": "30321", "rotation": 0, "poseAnim": 808}).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Render failed");
    assert!(!body.to_string().contains("/srv/caches"));
    assert!(is_empty_dir(tmp.path()), "job directory was not removed");
}

#[tokio::test]
async fn misnamed_artifact_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::new(Behaviour::WriteUnexpectedName);
    let pipeline = pipeline(renderer.clone(), tmp.path());

    let result = pipeline
        .run(&RenderRequest {
            item_ids: vec![1127],
            rotation: Rotation::from_index(0).unwrap(),
            pose_anim: 808,
        })
        .await;

    assert!(matches!(result, Err(RenderError::ArtifactNotFound { .. })));
    assert!(is_empty_dir(tmp.path()));

    let (status, _) = post_render(
        create_app(pipeline),
        json!({"ids": "1127", "rotation": 0, "poseAnim": 808}).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_reports_catalog_size() {
    let tmp = tempfile::tempdir().unwrap();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build request");

    let resp = app(FakeRenderer::new(Behaviour::WriteArtifacts), tmp.path())
        .oneshot(req)
        .await
        .expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"status": "ok", "items": 2}));
}
