//! Cross-lens coordination

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use tv_core::{
    GroupFilter, InteractionEvent, InteractionRouter, LensKind, RegionResolver, RouteOutcome,
    Selection, SelectionStore,
};
use tv_data::DashboardConfig;
use tv_render::{RenderEngine, RenderOptions};
use tv_spec::SpecCompiler;

use crate::adapter::{LensId, LensMountAdapter, SyncOutcome};
use crate::queue::{event_queue, EventQueue, EventSink};
use crate::shell::{PageShell, ShellText};
use crate::ViewError;

/// One dashboard session: the selection, its router, the event queue and the
/// mounted lenses
pub struct Dashboard {
    store: Arc<SelectionStore>,
    router: InteractionRouter,
    compiler: Arc<SpecCompiler>,
    options: RenderOptions,
    shell: Arc<PageShell>,
    adapters: Vec<LensMountAdapter>,
    sink: EventSink,
    queue: EventQueue,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Result<Self, ViewError> {
        config.validate()?;

        let store = Arc::new(SelectionStore::new());
        let router = InteractionRouter::new(store.clone(), RegionResolver::new(config.tabular_key_style));
        let options = RenderOptions::from(&config.render);
        let compiler = Arc::new(SpecCompiler::new(config));

        let shell = Arc::new(PageShell::new(&store.snapshot()));
        store.add_subscriber(shell.clone());

        let (sink, queue) = event_queue();

        Ok(Self {
            store,
            router,
            compiler,
            options,
            shell,
            adapters: Vec::new(),
            sink,
            queue,
        })
    }

    /// Mount one lens against the current selection
    pub async fn mount(&mut self, engine: &dyn RenderEngine, lens: LensKind) -> Result<LensId, ViewError> {
        if self.adapter(lens).is_some() {
            return Err(ViewError::AlreadyMounted(lens));
        }

        let adapter = LensMountAdapter::mount(
            engine,
            lens,
            &self.store.snapshot(),
            self.compiler.clone(),
            &self.options,
            self.sink.clone(),
        )
        .await?;

        let id = adapter.id();
        self.adapters.push(adapter);
        Ok(id)
    }

    /// Mount every lens kind
    pub async fn mount_all(&mut self, engine: &dyn RenderEngine) -> Result<(), ViewError> {
        for lens in LensKind::ALL {
            self.mount(engine, lens).await?;
        }
        Ok(())
    }

    pub async fn unmount_all(&mut self) {
        for adapter in self.adapters.drain(..) {
            adapter.unmount().await;
        }
    }

    pub fn adapter(&self, lens: LensKind) -> Option<&LensMountAdapter> {
        self.adapters.iter().find(|adapter| adapter.lens() == lens)
    }

    pub fn adapters(&self) -> &[LensMountAdapter] {
        &self.adapters
    }

    pub fn compiler(&self) -> &SpecCompiler {
        &self.compiler
    }

    pub fn current_selection(&self) -> Selection {
        self.store.snapshot()
    }

    /// Page text for the current selection
    pub fn shell(&self) -> ShellText {
        self.shell.text()
    }

    /// Producer handle for anything that raises interactions
    pub fn event_sink(&self) -> EventSink {
        self.sink.clone()
    }

    pub async fn set_group(&mut self, group: GroupFilter) -> Result<(), ViewError> {
        self.submit(InteractionEvent::GroupSelected { group }).await
    }

    /// Region button press. Unknown keys are ignored.
    pub async fn select_region(&mut self, key: &str) -> Result<(), ViewError> {
        self.submit(InteractionEvent::RegionSelected { key: key.to_string() }).await
    }

    pub async fn reset_all(&mut self) -> Result<(), ViewError> {
        self.submit(InteractionEvent::ResetAll).await
    }

    /// Queue behind anything already pending, then drain
    async fn submit(&mut self, event: InteractionEvent) -> Result<(), ViewError> {
        self.sink.send(event);
        self.process_pending().await.map(|_| ())
    }

    /// Handle every queued event and return how many were handled
    pub async fn process_pending(&mut self) -> Result<usize, ViewError> {
        let mut handled = 0;
        while let Some(event) = self.queue.try_recv() {
            self.dispatch(event).await?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Handle events as they arrive until `shutdown` completes
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<usize, ViewError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut handled = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                event = self.queue.recv() => event,
            };
            let Some(event) = next else { break };

            self.dispatch(event).await?;
            handled += 1;
        }

        info!("Dashboard stopped after {} events", handled);
        Ok(handled)
    }

    /// Route one event, then bring every mounted lens up to date.
    ///
    /// Every lens is synced even if an earlier one fails; the first failure is
    /// returned.
    pub async fn dispatch(&mut self, event: InteractionEvent) -> Result<RouteOutcome, ViewError> {
        let outcome = self.router.route(&event);
        let RouteOutcome::Applied { current, .. } = outcome else {
            return Ok(outcome);
        };

        let mut first_error = None;
        for adapter in &self.adapters {
            match adapter.sync(&current).await {
                Ok(SyncOutcome::Rendered) => debug!(lens = %adapter.lens(), "Lens re-rendered"),
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("{}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }
}
