//! Browser bindings. Each call builds a fresh scene from a params document
//! and hands the render buffers back as plain JS objects.

use anyhow::Context;
use serde::Serialize;
use sylva_core::generator::{Scene, SceneBuffers, SceneParams, SceneStats};
use sylva_core::lsystem::TreeType;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct GenerateResult {
    buffers: SceneBuffers,
    stats: SceneStats,
    elapsed_ms: f64,
}

fn build_scene(params_json: &str) -> anyhow::Result<Scene> {
    let params = if params_json.trim().is_empty() {
        SceneParams::default()
    } else {
        SceneParams::from_json_str(params_json).context("invalid scene params")?
    };
    Scene::new(params).context("scene generation failed")
}

fn to_js_error(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{e:#}"))
}

/// Generate terrain, water, skeleton and placement from a params JSON
/// document. An empty string uses the defaults.
#[wasm_bindgen]
pub async fn generate(params_json: &str) -> Result<JsValue, JsValue> {
    let started = js_sys::Date::now();
    let scene = build_scene(params_json).map_err(to_js_error)?;
    let result = GenerateResult {
        buffers: scene.buffers(),
        stats: scene.stats(),
        elapsed_ms: js_sys::Date::now() - started,
    };
    serde_wasm_bindgen::to_value(&result).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Default params as JSON, for seeding UI controls.
#[wasm_bindgen]
pub fn default_params() -> Result<String, JsValue> {
    SceneParams::default()
        .to_json_string()
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Tree preset labels in index order.
#[wasm_bindgen]
pub fn tree_type_labels() -> Vec<JsValue> {
    TreeType::ALL.iter().map(|t| JsValue::from_str(t.label())).collect()
}
