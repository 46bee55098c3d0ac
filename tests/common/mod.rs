#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use photo_labeler_lib::config::{INPUT_SIZE, TOP_K};
use photo_labeler_lib::services::classifier::backend::InferenceBackend;
use photo_labeler_lib::services::classifier::session::{ModelHandle, ModelLoader};
use photo_labeler_lib::services::file_access::FileAccess;
use photo_labeler_lib::services::image_source::ImageSource;
use photo_labeler_lib::services::permission::{
    ConsentPrompt, NotRequiredGate, PermissionGate, PromptingGate,
};
use photo_labeler_lib::services::runtime::ImmediateRuntime;
use photo_labeler_lib::{AppError, Collaborators, PickResult};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn solid_png(color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(40, 30, Rgb(color));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Files held in memory. A gated uri blocks its read until released.
#[derive(Default)]
pub struct MemoryFiles {
    files: Mutex<HashMap<String, Vec<u8>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl MemoryFiles {
    pub fn with(mut self, uri: &str, bytes: Vec<u8>) -> Self {
        self.files.get_mut().unwrap().insert(uri.to_string(), bytes);
        self
    }

    pub fn gated(self, uri: &str) -> Self {
        self.gates
            .lock()
            .unwrap()
            .insert(uri.to_string(), Arc::new(Notify::new()));
        self
    }

    pub fn release(&self, uri: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(uri) {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl FileAccess for MemoryFiles {
    async fn read_as_base64(&self, uri: &str) -> Result<String, AppError> {
        let gate = self.gates.lock().unwrap().get(uri).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let files = self.files.lock().unwrap();
        let bytes = files
            .get(uri)
            .ok_or_else(|| AppError::Decode(format!("No such file: {}", uri)))?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

/// Logits from the mean of each input channel, plus a constant "gray" class.
pub struct ChannelMeanBackend;

impl InferenceBackend for ChannelMeanBackend {
    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, AppError> {
        let mut logits: Vec<f32> = (0..3)
            .map(|c| input.index_axis(ndarray::Axis(1), c).mean().unwrap_or(0.0))
            .collect();
        logits.push(0.0);
        Ok(logits)
    }
}

pub struct FakeLoader;

#[async_trait]
impl ModelLoader for FakeLoader {
    async fn load(&self) -> Result<ModelHandle, AppError> {
        let labels = ["red", "green", "blue", "gray"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Ok(ModelHandle::new(
            Arc::new(ChannelMeanBackend),
            labels,
            INPUT_SIZE,
            TOP_K,
        ))
    }
}

pub struct BrokenLoader;

#[async_trait]
impl ModelLoader for BrokenLoader {
    async fn load(&self) -> Result<ModelHandle, AppError> {
        Err(AppError::ModelLoad("weights could not be parsed".into()))
    }
}

pub struct DenyingPrompt;

#[async_trait]
impl ConsentPrompt for DenyingPrompt {
    async fn ask(&self) -> bool {
        false
    }
}

pub fn denying_gate() -> Arc<dyn PermissionGate> {
    Arc::new(PromptingGate::new(Arc::new(DenyingPrompt)))
}

pub struct ScriptedSource(pub PickResult);

#[async_trait]
impl ImageSource for ScriptedSource {
    async fn pick_image(&self) -> PickResult {
        self.0.clone()
    }
}

pub fn collaborators(files: Arc<MemoryFiles>) -> Collaborators {
    Collaborators {
        runtime: Arc::new(ImmediateRuntime),
        permission_gate: Arc::new(NotRequiredGate),
        file_access: files,
        model_loader: Arc::new(FakeLoader),
    }
}
