//! Integration tests driving the dispatcher end-to-end

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use approx::assert_relative_eq;
use image::RgbaImage;
use serde_json::{Value, json};
use stlscope_core::Mesh;
use stlscope_core::mesh::primitives;
use stlscope_core::stl::write_stl;
use stlscope_mcp::backend::{RenderEngine, StlLoader};
use stlscope_mcp::dispatch::{Dispatcher, ToolResponse};
use stlscope_mcp::state::SessionHandle;
use stlscope_mcp::{ErrorKind, ServerConfig, Stage};
use stlscope_render::{RenderError, RenderScene};

fn test_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join(format!("stlscope_it_{}", std::process::id()))
        .join(test);
    std::fs::create_dir_all(&dir).expect("Should create test dir");
    dir
}

fn cube_fixture(test: &str, name: &str, size: f32) -> PathBuf {
    let path = test_dir(test).join(format!("{name}.stl"));
    write_stl(&primitives::cube(size), &path).expect("Should write fixture");
    path
}

fn small_config() -> ServerConfig {
    ServerConfig {
        render_width: 160,
        render_height: 120,
        ..ServerConfig::default()
    }
}

fn dispatcher() -> Dispatcher {
    Dispatcher::new(SessionHandle::new(small_config()))
}

async fn call(dispatcher: &Dispatcher, tool: &str, arguments: Value) -> ToolResponse {
    dispatcher
        .dispatch_json(json!({"tool": tool, "arguments": arguments}))
        .await
}

async fn call_ok(dispatcher: &Dispatcher, tool: &str, arguments: Value) -> Value {
    let response = call(dispatcher, tool, arguments).await;
    assert!(response.is_ok(), "{tool} failed: {}", response.to_json());
    response.result().cloned().unwrap()
}

fn error_kind(response: &ToolResponse) -> ErrorKind {
    response
        .error_info()
        .unwrap_or_else(|| panic!("expected an error, got {}", response.to_json()))
        .kind
}

fn model_names(dispatcher: &Dispatcher) -> Vec<String> {
    dispatcher.session().read(|s| s.registry().names())
}

// ============================================================================
// Registry
// ============================================================================

#[tokio::test]
async fn repeated_loads_get_unique_names() {
    let d = dispatcher();
    let path = cube_fixture("repeated_loads", "cube", 10.0);

    for expected in ["cube", "cube_1", "cube_2"] {
        let info = call_ok(&d, "load_stl", json!({"path": path})).await;
        assert_eq!(info["name"], expected);
        assert_eq!(info["faces"], 12);
        assert_eq!(info["vertices"], 8);
    }

    let listing = call_ok(&d, "list_models", json!({})).await;
    assert_eq!(listing["count"], 3);
    let names: Vec<&str> = listing["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["cube", "cube_1", "cube_2"]);
}

#[tokio::test]
async fn requested_name_collision_gets_suffix() {
    let d = dispatcher();
    let path = cube_fixture("requested_name", "part", 10.0);

    call_ok(&d, "load_stl", json!({"path": path, "name": "base"})).await;
    let info = call_ok(&d, "load_stl", json!({"path": path, "name": "base"})).await;
    assert_eq!(info["name"], "base_1");
}

#[tokio::test]
async fn clear_then_list_is_empty() {
    let d = dispatcher();
    let path = cube_fixture("clear_then_list", "cube", 10.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;
    call_ok(&d, "load_stl", json!({"path": path})).await;

    let cleared = call_ok(&d, "clear_all_models", json!({})).await;
    assert_eq!(cleared["cleared"], 2);

    let listing = call_ok(&d, "list_models", json!({})).await;
    assert_eq!(listing["count"], 0);

    // Idempotent
    let cleared = call_ok(&d, "clear_all_models", json!({})).await;
    assert_eq!(cleared["cleared"], 0);
}

#[tokio::test]
async fn removing_missing_model_leaves_registry_unchanged() {
    let d = dispatcher();
    let path = cube_fixture("remove_missing", "cube", 10.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;

    let response = call(&d, "remove_model", json!({"name": "nope"})).await;
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert_eq!(response.error_info().unwrap().stage, Stage::Execution);
    assert_eq!(model_names(&d), vec!["cube"]);

    let removed = call_ok(&d, "remove_model", json!({"name": "cube"})).await;
    assert_eq!(removed["removed"], "cube");
    assert!(model_names(&d).is_empty());
}

#[tokio::test]
async fn zero_face_file_is_load_error() {
    let d = dispatcher();
    let path = test_dir("zero_face").join("empty.stl");
    write_stl(&Mesh::new(), &path).unwrap();

    let response = call(&d, "load_stl", json!({"path": path})).await;
    assert_eq!(error_kind(&response), ErrorKind::Load);
    assert!(model_names(&d).is_empty());
}

#[tokio::test]
async fn missing_or_unsupported_source_is_load_error() {
    let d = dispatcher();
    let dir = test_dir("missing_source");

    let response = call(&d, "load_stl", json!({"path": dir.join("absent.stl")})).await;
    assert_eq!(error_kind(&response), ErrorKind::Load);

    let obj = dir.join("model.obj");
    std::fs::write(&obj, "v 0 0 0\n").unwrap();
    let response = call(&d, "load_stl", json!({"path": obj})).await;
    assert_eq!(error_kind(&response), ErrorKind::Load);

    assert!(model_names(&d).is_empty());
}

#[tokio::test]
async fn ascii_and_binary_give_same_counts() {
    let d = dispatcher();
    let mesh = primitives::cube(4.0);
    let dir = test_dir("ascii_binary");

    let binary = dir.join("binary.stl");
    write_stl(&mesh, &binary).unwrap();

    let mut text = String::from("solid cube\n");
    for [a, b, c] in mesh.triangles() {
        text.push_str("  facet normal 0 0 0\n    outer loop\n");
        for v in [a, b, c] {
            writeln!(text, "      vertex {} {} {}", v.x, v.y, v.z).unwrap();
        }
        text.push_str("    endloop\n  endfacet\n");
    }
    text.push_str("endsolid cube\n");
    let ascii = dir.join("ascii.stl");
    std::fs::write(&ascii, text).unwrap();

    let from_binary = call_ok(&d, "load_stl", json!({"path": binary})).await;
    let from_ascii = call_ok(&d, "load_stl", json!({"path": ascii})).await;
    assert_eq!(from_binary["faces"], from_ascii["faces"]);
    assert_eq!(from_binary["vertices"], from_ascii["vertices"]);
    assert_eq!(from_ascii["bounds"], from_binary["bounds"]);
}

#[tokio::test]
async fn model_info_reports_statistics() {
    let d = dispatcher();
    let path = cube_fixture("model_info", "block", 10.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;

    let info = call_ok(&d, "get_model_info", json!({"name": "block"})).await;
    assert_relative_eq!(info["volume"].as_f64().unwrap(), 1000.0, epsilon = 1e-6);
    assert_relative_eq!(
        info["diagonal_length"].as_f64().unwrap(),
        10.0 * 3.0_f64.sqrt(),
        epsilon = 1e-4
    );
    assert_eq!(info["center"], json!([0.0, 0.0, 0.0]));

    let response = call(&d, "get_model_info", json!({"name": "other"})).await;
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
}

// ============================================================================
// Styling
// ============================================================================

#[tokio::test]
async fn opacity_out_of_range_is_rejected() {
    let d = dispatcher();
    let path = cube_fixture("opacity_range", "cube", 10.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;

    let response = call(&d, "set_model_opacity", json!({"name": "cube", "opacity": 1.5})).await;
    assert_eq!(error_kind(&response), ErrorKind::Validation);
    assert_eq!(response.error_info().unwrap().stage, Stage::Validation);

    let opacity = d
        .session()
        .read(|s| s.registry().get("cube").unwrap().opacity());
    assert_relative_eq!(opacity, 1.0);

    let info = call_ok(&d, "set_model_opacity", json!({"name": "cube", "opacity": 0.5})).await;
    assert_relative_eq!(info["opacity"].as_f64().unwrap(), 0.5);
}

#[tokio::test]
async fn color_accepts_names_hex_and_components() {
    let d = dispatcher();
    let path = cube_fixture("color_forms", "cube", 10.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;

    for (color, expected) in [
        (json!("red"), json!([1.0, 0.0, 0.0])),
        (json!("#0000ff"), json!([0.0, 0.0, 1.0])),
        (json!([0.0, 1.0, 0.0]), json!([0.0, 1.0, 0.0])),
    ] {
        let info = call_ok(&d, "set_model_color", json!({"name": "cube", "color": color})).await;
        assert_eq!(info["color"], expected);
    }

    let response = call(&d, "set_model_color", json!({"name": "cube", "color": "plaid"})).await;
    assert_eq!(error_kind(&response), ErrorKind::Validation);

    let response = call(&d, "set_model_color", json!({"name": "ghost", "color": "red"})).await;
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
}

#[tokio::test]
async fn transform_moves_world_bounds() {
    let d = dispatcher();
    let path = cube_fixture("transform_bounds", "cube", 2.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;

    let info = call_ok(
        &d,
        "set_model_transform",
        json!({"name": "cube", "translation": [10.0, 0.0, 0.0], "scale": 3.0}),
    )
    .await;
    assert_relative_eq!(info["world_bounds"]["min"][0].as_f64().unwrap(), 7.0, epsilon = 1e-4);
    assert_relative_eq!(info["world_bounds"]["max"][0].as_f64().unwrap(), 13.0, epsilon = 1e-4);
    // Local bounds are unaffected
    assert_relative_eq!(info["bounds"]["max"][0].as_f64().unwrap(), 1.0, epsilon = 1e-6);

    let response = call(&d, "set_model_transform", json!({"name": "cube", "scale": -1.0})).await;
    assert_eq!(error_kind(&response), ErrorKind::Validation);
}

// ============================================================================
// Camera
// ============================================================================

#[tokio::test]
async fn degenerate_camera_leaves_state_unchanged() {
    let d = dispatcher();
    let before = d.session().read(|s| *s.camera().state());

    let response = call(
        &d,
        "set_camera",
        json!({"position": [0.0, 0.0, 0.0], "focal_point": [0.0, 0.0, 0.0]}),
    )
    .await;
    assert_eq!(error_kind(&response), ErrorKind::StateInvariant);

    let after = d.session().read(|s| *s.camera().state());
    assert_eq!(before, after);
}

#[tokio::test]
async fn overflowing_camera_placement_is_rejected() {
    let d = dispatcher();
    let before = d.session().read(|s| *s.camera().state());

    let response = call(
        &d,
        "set_camera",
        json!({"position": [1e308, 0.0, 0.0], "focal_point": [-1e308, 0.0, 0.0]}),
    )
    .await;
    assert_eq!(error_kind(&response), ErrorKind::StateInvariant);

    let after = d.session().read(|s| *s.camera().state());
    assert_eq!(before, after);
    assert!(after.view_up().is_finite());
}

#[tokio::test]
async fn full_azimuth_turn_returns_to_start() {
    let d = dispatcher();
    let before = call_ok(&d, "reset_view", json!({})).await;
    let after = call_ok(&d, "rotate_camera", json!({"azimuth": 360.0})).await;

    for key in ["position", "view_up"] {
        for i in 0..3 {
            assert_relative_eq!(
                before[key][i].as_f64().unwrap(),
                after[key][i].as_f64().unwrap(),
                epsilon = 1e-9
            );
        }
    }
}

#[tokio::test]
async fn elevation_to_poles_stays_valid() {
    let d = dispatcher();
    for elevation in [90.0, -90.0, 90.0] {
        call_ok(&d, "reset_view", json!({})).await;
        let state = call_ok(&d, "rotate_camera", json!({"elevation": elevation})).await;
        assert!(state["distance"].as_f64().unwrap() > 0.0);
    }
}

#[tokio::test]
async fn rotation_order_is_deterministic() {
    let first = dispatcher();
    let second = dispatcher();
    let args = json!({"azimuth": 40.0, "elevation": 25.0, "roll": 10.0});

    let a = call_ok(&first, "rotate_camera", args.clone()).await;
    let b = call_ok(&second, "rotate_camera", args).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn reset_view_is_idempotent() {
    let d = dispatcher();
    call_ok(&d, "rotate_camera", json!({"azimuth": 15.0, "roll": 30.0})).await;

    let first = call_ok(&d, "reset_view", json!({})).await;
    let second = call_ok(&d, "reset_view", json!({})).await;
    assert_eq!(first, second);
    assert_eq!(first["position"], json!([100.0, -100.0, 100.0]));
}

#[tokio::test]
async fn zoom_narrows_view_angle() {
    let d = dispatcher();
    let state = call_ok(&d, "set_camera", json!({"zoom": 1.5})).await;
    assert_relative_eq!(state["view_angle"].as_f64().unwrap(), 20.0, epsilon = 1e-9);
}

// ============================================================================
// Measurement
// ============================================================================

#[tokio::test]
async fn measure_cube_diagonal() {
    let d = dispatcher();
    let result = call_ok(
        &d,
        "measure_distance",
        json!({"point_a": [0.0, 0.0, 0.0], "point_b": [10.0, 10.0, 10.0]}),
    )
    .await;
    assert_relative_eq!(
        result["distance"].as_f64().unwrap(),
        10.0 * 3.0_f64.sqrt(),
        epsilon = 1e-9
    );
}

#[tokio::test]
async fn overflowing_distance_is_validation_error() {
    let d = dispatcher();
    let response = call(
        &d,
        "measure_distance",
        json!({"point_a": [1e308, 0.0, 0.0], "point_b": [-1e308, 0.0, 0.0]}),
    )
    .await;
    assert_eq!(error_kind(&response), ErrorKind::Validation);
}

#[tokio::test]
async fn measure_in_model_frame() {
    let d = dispatcher();
    let path = cube_fixture("measure_model", "cube", 2.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;
    call_ok(&d, "set_model_transform", json!({"name": "cube", "scale": 4.0})).await;

    let result = call_ok(
        &d,
        "measure_distance",
        json!({"point_a": [-1.0, 0.0, 0.0], "point_b": [1.0, 0.0, 0.0], "model": "cube"}),
    )
    .await;
    assert_relative_eq!(result["distance"].as_f64().unwrap(), 8.0, epsilon = 1e-9);

    let response = call(
        &d,
        "measure_distance",
        json!({"point_a": [0.0, 0.0, 0.0], "point_b": [1.0, 0.0, 0.0], "model": "ghost"}),
    )
    .await;
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
}

// ============================================================================
// Screenshots
// ============================================================================

#[tokio::test]
async fn screenshot_writes_file_and_inline_png() {
    let d = dispatcher();
    let path = cube_fixture("screenshot_file", "cube", 50.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;

    let output = test_dir("screenshot_file").join("shots").join("cube.png");
    let response = call(
        &d,
        "take_screenshot",
        json!({"output_path": output, "include_image": true}),
    )
    .await;
    assert!(response.is_ok(), "{}", response.to_json());

    let result = response.result().unwrap();
    assert_eq!(result["width"], 160);
    assert_eq!(result["height"], 120);
    assert_eq!(result["models"], json!(["cube"]));
    assert!(output.exists());

    let png = response.image_png.as_ref().expect("PNG should be inline");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    let saved = image::open(&output).unwrap();
    assert_eq!((saved.width(), saved.height()), (160, 120));
}

#[tokio::test]
async fn screenshot_of_unknown_model_writes_nothing() {
    let d = dispatcher();
    let path = cube_fixture("screenshot_unknown", "cube", 10.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;

    let output = test_dir("screenshot_unknown").join("never.png");
    let response = call(
        &d,
        "take_screenshot",
        json!({"output_path": output, "models": ["ghost"]}),
    )
    .await;
    assert_eq!(error_kind(&response), ErrorKind::NotFound);
    assert!(!output.exists());
}

#[tokio::test]
async fn screenshot_without_models_is_validation_error() {
    let d = dispatcher();
    let output = test_dir("screenshot_empty").join("empty.png");
    let response = call(&d, "take_screenshot", json!({"output_path": output})).await;
    assert_eq!(error_kind(&response), ErrorKind::Validation);
    assert!(!output.exists());
}

/// Records the scenes it is asked to draw
#[derive(Default)]
struct RecordingRenderer {
    calls: AtomicUsize,
    last_items: parking_lot::Mutex<Vec<(String, f32)>>,
}

impl RenderEngine for RecordingRenderer {
    fn render(&self, scene: &RenderScene) -> stlscope_render::Result<RgbaImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_items.lock() = scene
            .items
            .iter()
            .map(|item| (item.name.clone(), item.opacity))
            .collect();
        Ok(RgbaImage::new(scene.width, scene.height))
    }
}

#[tokio::test]
async fn screenshot_uses_injected_renderer() {
    let renderer = Arc::new(RecordingRenderer::default());
    let session =
        SessionHandle::with_backends(small_config(), Arc::new(StlLoader), renderer.clone());
    let d = Dispatcher::new(session);

    let path = cube_fixture("injected_renderer", "cube", 10.0);
    call_ok(&d, "load_stl", json!({"path": path, "name": "a"})).await;
    call_ok(&d, "load_stl", json!({"path": path, "name": "b"})).await;
    call_ok(&d, "set_model_opacity", json!({"name": "b", "opacity": 0.25})).await;

    let output = test_dir("injected_renderer").join("shot.bmp");
    call_ok(&d, "take_screenshot", json!({"output_path": output, "width": 32, "height": 16})).await;

    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        *renderer.last_items.lock(),
        vec![("a".to_string(), 1.0), ("b".to_string(), 0.25)]
    );
    assert!(Path::new(&output).exists());
}

/// Fails every draw as if the camera were unusable
struct FailingRenderer;

impl RenderEngine for FailingRenderer {
    fn render(&self, _scene: &RenderScene) -> stlscope_render::Result<RgbaImage> {
        Err(RenderError::DegenerateCamera)
    }
}

#[tokio::test]
async fn renderer_failure_is_render_error_and_changes_nothing() {
    let session = SessionHandle::with_backends(
        small_config(),
        Arc::new(StlLoader),
        Arc::new(FailingRenderer),
    );
    let d = Dispatcher::new(session);
    let path = cube_fixture("renderer_failure", "cube", 10.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;
    call_ok(&d, "rotate_camera", json!({"azimuth": 30.0})).await;

    let names_before = model_names(&d);
    let info_before = call_ok(&d, "get_model_info", json!({"name": "cube"})).await;
    let camera_before = d.session().read(|s| *s.camera().state());

    let output = test_dir("renderer_failure").join("never.png");
    let response = call(&d, "take_screenshot", json!({"output_path": output})).await;
    assert_eq!(error_kind(&response), ErrorKind::Render);
    assert_eq!(response.error_info().unwrap().stage, Stage::Execution);
    assert!(!output.exists());

    assert_eq!(model_names(&d), names_before);
    assert_eq!(
        call_ok(&d, "get_model_info", json!({"name": "cube"})).await,
        info_before
    );
    assert_eq!(d.session().read(|s| *s.camera().state()), camera_before);
}

#[tokio::test]
async fn unwritable_output_path_is_render_error() {
    let d = dispatcher();
    let path = cube_fixture("unwritable_output", "cube", 10.0);
    call_ok(&d, "load_stl", json!({"path": path})).await;
    let camera_before = d.session().read(|s| *s.camera().state());

    // A regular file standing where the output directory should be
    let blocker = test_dir("unwritable_output").join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let output = blocker.join("shot.png");

    let response = call(&d, "take_screenshot", json!({"output_path": output})).await;
    assert_eq!(error_kind(&response), ErrorKind::Render);
    assert!(!output.exists());
    assert!(blocker.is_file());
    assert_eq!(model_names(&d), vec!["cube"]);
    assert_eq!(d.session().read(|s| *s.camera().state()), camera_before);
}

#[tokio::test]
async fn malformed_call_is_validation_error() {
    let d = dispatcher();
    let response = d
        .dispatch_json(json!({"tool": "set_model_opacity", "arguments": {"name": "a"}}))
        .await;
    assert_eq!(response.tool, "set_model_opacity");
    assert_eq!(error_kind(&response), ErrorKind::Validation);

    let response = d.dispatch_json(json!({"tool": "explode"})).await;
    assert_eq!(error_kind(&response), ErrorKind::Validation);
}
