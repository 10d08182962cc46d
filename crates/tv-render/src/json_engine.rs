//! A rendering engine that writes every request as a JSON line.
//!
//! Used by the command-line driver to show what a browser engine would be
//! asked to draw, and to replay mark activations into mounted views.

use std::io::Write;
use std::sync::Arc;
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tv_spec::ChartSpec;

use crate::{InteractionCallback, RenderEngine, RenderError, RenderHandle, RenderOptions};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;
type ViewRegistry = Arc<Mutex<AHashMap<String, Arc<MountedView>>>>;

struct MountedView {
    callback: Mutex<Option<InteractionCallback>>,
}

/// Engine writing `{"op": ..., "container": ..., ...}` lines
pub struct JsonEngine {
    out: SharedWriter,
    views: ViewRegistry,
}

impl JsonEngine {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
            views: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Simulate the user activating a mark in `container`
    pub fn activate(&self, container: &str, datum: Value) -> Result<(), RenderError> {
        let view = self
            .views
            .lock()
            .get(container)
            .cloned()
            .ok_or_else(|| RenderError::Detached(container.to_string()))?;

        let callback = view.callback.lock();
        match callback.as_ref() {
            Some(callback) => {
                callback(datum);
                Ok(())
            }
            None => {
                tracing::debug!(container, "Activation on a view without an interaction callback");
                Ok(())
            }
        }
    }
}

fn write_line(out: &SharedWriter, line: &Value) -> Result<(), RenderError> {
    let mut out = out.lock();
    serde_json::to_writer(&mut *out, line)?;
    writeln!(out).map_err(|e| RenderError::Engine(e.to_string()))?;
    out.flush().map_err(|e| RenderError::Engine(e.to_string()))
}

#[async_trait]
impl RenderEngine for JsonEngine {
    async fn render(
        &self,
        container: &str,
        spec: &ChartSpec,
        options: &RenderOptions,
    ) -> Result<Box<dyn RenderHandle>, RenderError> {
        write_line(
            &self.out,
            &json!({ "op": "render", "container": container, "options": options, "spec": spec }),
        )?;

        let view = Arc::new(MountedView { callback: Mutex::new(None) });
        if self.views.lock().insert(container.to_string(), view.clone()).is_some() {
            tracing::warn!(container, "Replaced a view that was never unmounted");
        }

        Ok(Box::new(JsonHandle {
            container: container.to_string(),
            view,
            out: self.out.clone(),
            views: self.views.clone(),
        }))
    }
}

struct JsonHandle {
    container: String,
    view: Arc<MountedView>,
    out: SharedWriter,
    views: ViewRegistry,
}

#[async_trait]
impl RenderHandle for JsonHandle {
    fn on_interaction(&self, callback: InteractionCallback) {
        *self.view.callback.lock() = Some(callback);
    }

    async fn update_specification(&self, spec: &ChartSpec) -> Result<(), RenderError> {
        write_line(
            &self.out,
            &json!({ "op": "update", "container": self.container, "spec": spec }),
        )
    }

    async fn unmount(&self) {
        self.view.callback.lock().take();
        {
            let mut views = self.views.lock();
            if views.get(&self.container).is_some_and(|v| Arc::ptr_eq(v, &self.view)) {
                views.remove(&self.container);
            }
        }
        if let Err(e) = write_line(&self.out, &json!({ "op": "unmount", "container": self.container })) {
            tracing::warn!("Failed to record unmount of {}: {}", self.container, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tv_core::{LensKind, Selection};
    use tv_data::DashboardConfig;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Buffer {
        fn lines(&self) -> Vec<Value> {
            String::from_utf8(self.0.lock().clone())
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn status_spec() -> ChartSpec {
        tv_spec::compile(&Selection::default(), LensKind::StatusBar, &DashboardConfig::default())
    }

    #[tokio::test]
    async fn test_render_update_unmount_are_logged() {
        let buffer = Buffer::default();
        let engine = JsonEngine::new(buffer.clone());
        let spec = status_spec();

        let handle = engine.render("status-bar", &spec, &RenderOptions::default()).await.unwrap();
        handle.update_specification(&spec).await.unwrap();
        handle.unmount().await;

        let ops: Vec<Value> = buffer.lines().iter().map(|line| line["op"].clone()).collect();
        assert_eq!(ops, vec!["render", "update", "unmount"]);
        assert_eq!(buffer.lines()[0]["options"]["renderer"], "svg");
        assert!(engine.activate("status-bar", json!({})).is_err());
    }

    #[tokio::test]
    async fn test_activation_reaches_callback() {
        let engine = JsonEngine::new(Buffer::default());
        let handle = engine.render("choropleth", &status_spec(), &RenderOptions::default()).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        handle.on_interaction(Box::new(move |datum: Value| sink.lock().push(datum)));

        engine.activate("choropleth", json!({ "state": "Tasmania" })).unwrap();
        assert_eq!(*seen.lock(), vec![json!({ "state": "Tasmania" })]);

        assert!(matches!(
            engine.activate("treemap", json!({})),
            Err(RenderError::Detached(name)) if name == "treemap"
        ));

        handle.unmount().await;
        assert!(engine.activate("choropleth", json!({})).is_err());
    }
}
