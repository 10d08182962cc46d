//! Binding between one lens and its mounted view

use std::sync::Arc;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};
use tv_core::{InteractionEvent, LensKind, Selection};
use tv_render::{RenderEngine, RenderHandle, RenderOptions};
use tv_spec::{ChartSpec, SpecCompiler};
use uuid::Uuid;

use crate::queue::EventSink;
use crate::ViewError;

/// Unique identifier for a mounted lens
pub type LensId = Uuid;

/// What a sync did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The compiled spec equals the last one requested; nothing was sent
    Unchanged,
    /// The engine accepted the new spec
    Rendered,
    /// A newer sync was issued while this one was in flight; its result was dropped
    Superseded,
}

struct RenderState {
    generation: u64,
    /// Most recent spec handed to the engine
    requested: ChartSpec,
    /// Most recent spec the engine acknowledged for the newest generation
    rendered: ChartSpec,
}

/// Keeps one mounted view in step with the selection
pub struct LensMountAdapter {
    id: LensId,
    lens: LensKind,
    container: String,
    compiler: Arc<SpecCompiler>,
    handle: Box<dyn RenderHandle>,
    state: Mutex<RenderState>,
}

impl LensMountAdapter {
    /// Compile the lens for `snapshot`, render it, and forward every mark
    /// activation from the view to `sink` untouched
    pub async fn mount(
        engine: &dyn RenderEngine,
        lens: LensKind,
        snapshot: &Selection,
        compiler: Arc<SpecCompiler>,
        options: &RenderOptions,
        sink: EventSink,
    ) -> Result<Self, ViewError> {
        let spec = compiler.compile(snapshot, lens);
        let container = lens.as_str().to_string();

        let handle = engine
            .render(&container, &spec, options)
            .await
            .map_err(|source| ViewError::Render { lens, source })?;

        handle.on_interaction(Box::new(move |datum: Value| {
            sink.send(InteractionEvent::MarkActivated { lens, datum });
        }));

        let id = Uuid::new_v4();
        info!("Mounted {} lens in '{}' ({})", lens, container, id);

        Ok(Self {
            id,
            lens,
            container,
            compiler,
            handle,
            state: Mutex::new(RenderState { generation: 0, requested: spec.clone(), rendered: spec }),
        })
    }

    pub fn id(&self) -> LensId {
        self.id
    }

    pub fn lens(&self) -> LensKind {
        self.lens
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// The spec currently shown by the view
    pub fn rendered_spec(&self) -> ChartSpec {
        self.state.lock().rendered.clone()
    }

    /// Recompile for `snapshot` and push the result if it differs from what
    /// was last requested
    pub async fn sync(&self, snapshot: &Selection) -> Result<SyncOutcome, ViewError> {
        let spec = self.compiler.compile(snapshot, self.lens);

        let generation = {
            let mut state = self.state.lock();
            if state.requested == spec {
                debug!(lens = %self.lens, "Spec unchanged, skipping re-render");
                return Ok(SyncOutcome::Unchanged);
            }
            state.generation += 1;
            state.requested = spec.clone();
            state.generation
        };

        let result = self.handle.update_specification(&spec).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(lens = %self.lens, generation, latest = state.generation, "Dropping superseded render");
            return Ok(SyncOutcome::Superseded);
        }

        match result {
            Ok(()) => {
                state.rendered = spec;
                Ok(SyncOutcome::Rendered)
            }
            Err(source) => {
                // Let the next sync retry
                state.requested = state.rendered.clone();
                Err(ViewError::Render { lens: self.lens, source })
            }
        }
    }

    /// Release the mounted view
    pub async fn unmount(self) {
        self.handle.unmount().await;
        info!("Unmounted {} lens ({})", self.lens, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::event_queue;
    use crate::test_engine::{Call, RecordingEngine};
    use serde_json::json;
    use tv_core::{GroupFilter, RegionCode, SpeciesGroup};
    use tv_data::DashboardConfig;

    fn compiler() -> Arc<SpecCompiler> {
        Arc::new(SpecCompiler::new(DashboardConfig::default()))
    }

    fn birds() -> Selection {
        Selection { active_group: GroupFilter::Only(SpeciesGroup::Birds), active_region: None }
    }

    async fn mount(engine: &RecordingEngine, lens: LensKind) -> (LensMountAdapter, crate::EventQueue) {
        let (sink, queue) = event_queue();
        let adapter = LensMountAdapter::mount(
            engine,
            lens,
            &Selection::default(),
            compiler(),
            &RenderOptions::default(),
            sink,
        )
        .await
        .unwrap();
        (adapter, queue)
    }

    #[tokio::test]
    async fn test_mount_renders_current_snapshot() {
        let engine = RecordingEngine::default();
        let (adapter, _queue) = mount(&engine, LensKind::Treemap).await;

        let expected = compiler().compile(&Selection::default(), LensKind::Treemap);
        assert_eq!(engine.calls(), vec![Call::Render("treemap".to_string(), expected.clone())]);
        assert_eq!(adapter.rendered_spec(), expected);
        assert_eq!(adapter.container(), "treemap");
    }

    #[tokio::test]
    async fn test_sync_skips_structurally_equal_specs() {
        let engine = RecordingEngine::default();
        let (adapter, _queue) = mount(&engine, LensKind::StatusBar).await;

        assert_eq!(adapter.sync(&Selection::default()).await.unwrap(), SyncOutcome::Unchanged);
        assert_eq!(adapter.sync(&birds()).await.unwrap(), SyncOutcome::Rendered);
        assert_eq!(adapter.sync(&birds()).await.unwrap(), SyncOutcome::Unchanged);
        assert_eq!(engine.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_region_selection_filters_stacked_bar() {
        let engine = RecordingEngine::default();
        let (adapter, _queue) = mount(&engine, LensKind::StackedBar).await;

        let qld = Selection { active_group: GroupFilter::All, active_region: Some(RegionCode::Qld) };
        assert_eq!(adapter.sync(&qld).await.unwrap(), SyncOutcome::Rendered);
        assert_eq!(adapter.rendered_spec().filters().len(), 1);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let engine = RecordingEngine::default();
        let (adapter, _queue) = mount(&engine, LensKind::GroupedBar).await;
        engine.delay_updates(&[50, 0]);

        let birds = birds();
        let fish = Selection { active_group: GroupFilter::Only(SpeciesGroup::Fish), active_region: None };
        let (first, second) = tokio::join!(adapter.sync(&birds), adapter.sync(&fish));

        assert_eq!(first.unwrap(), SyncOutcome::Superseded);
        assert_eq!(second.unwrap(), SyncOutcome::Rendered);
        assert_eq!(adapter.rendered_spec(), compiler().compile(&fish, LensKind::GroupedBar));
    }

    #[tokio::test]
    async fn test_engine_failure_is_surfaced_and_retried() {
        let engine = RecordingEngine::default();
        let (adapter, _queue) = mount(&engine, LensKind::StatusBar).await;
        engine.fail_next_update();

        let err = adapter.sync(&birds()).await.unwrap_err();
        assert!(matches!(err, ViewError::Render { lens: LensKind::StatusBar, .. }));
        assert_eq!(adapter.rendered_spec(), compiler().compile(&Selection::default(), LensKind::StatusBar));

        assert_eq!(adapter.sync(&birds()).await.unwrap(), SyncOutcome::Rendered);
    }

    #[tokio::test]
    async fn test_mark_activation_is_forwarded_verbatim() {
        let engine = RecordingEngine::default();
        let (_adapter, mut queue) = mount(&engine, LensKind::Choropleth).await;

        let datum = json!({ "type": "Feature", "properties": { "STE_NAME21": "Queensland" }, "extra": [1, 2] });
        assert!(engine.click("choropleth", datum.clone()));

        assert_eq!(
            queue.try_recv(),
            Some(InteractionEvent::MarkActivated { lens: LensKind::Choropleth, datum })
        );
    }

    #[tokio::test]
    async fn test_unmount_releases_view() {
        let engine = RecordingEngine::default();
        let (adapter, _queue) = mount(&engine, LensKind::Treemap).await;

        adapter.unmount().await;
        assert_eq!(engine.calls().last(), Some(&Call::Unmount("treemap".to_string())));
        assert!(!engine.click("treemap", json!({})));
    }
}
