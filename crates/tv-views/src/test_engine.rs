//! In-memory rendering engine for tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tv_render::{InteractionCallback, RenderEngine, RenderError, RenderHandle, RenderOptions};
use tv_spec::ChartSpec;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Render(String, ChartSpec),
    Update(String, ChartSpec),
    Unmount(String),
}

#[derive(Clone, Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<Call>>>,
    callbacks: Arc<Mutex<HashMap<String, InteractionCallback>>>,
    delays: Arc<Mutex<VecDeque<Duration>>>,
    fail_next_update: Arc<AtomicBool>,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn updates(&self) -> Vec<(String, ChartSpec)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update(container, spec) => Some((container, spec)),
                _ => None,
            })
            .collect()
    }

    /// Delay the next update calls, in order
    pub fn delay_updates(&self, delays: &[u64]) {
        self.delays.lock().extend(delays.iter().map(|ms| Duration::from_millis(*ms)));
    }

    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    /// Fire the interaction callback of the view in `container`
    pub fn click(&self, container: &str, datum: Value) -> bool {
        match self.callbacks.lock().get(container) {
            Some(callback) => {
                callback(datum);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl RenderEngine for RecordingEngine {
    async fn render(
        &self,
        container: &str,
        spec: &ChartSpec,
        _options: &RenderOptions,
    ) -> Result<Box<dyn RenderHandle>, RenderError> {
        self.calls.lock().push(Call::Render(container.to_string(), spec.clone()));
        Ok(Box::new(RecordingHandle { container: container.to_string(), engine: self.clone() }))
    }
}

struct RecordingHandle {
    container: String,
    engine: RecordingEngine,
}

#[async_trait]
impl RenderHandle for RecordingHandle {
    fn on_interaction(&self, callback: InteractionCallback) {
        self.engine.callbacks.lock().insert(self.container.clone(), callback);
    }

    async fn update_specification(&self, spec: &ChartSpec) -> Result<(), RenderError> {
        let delay = self.engine.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.engine.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(RenderError::Engine("view crashed".to_string()));
        }
        self.engine.calls.lock().push(Call::Update(self.container.clone(), spec.clone()));
        Ok(())
    }

    async fn unmount(&self) {
        self.engine.callbacks.lock().remove(&self.container);
        self.engine.calls.lock().push(Call::Unmount(self.container.clone()));
    }
}
