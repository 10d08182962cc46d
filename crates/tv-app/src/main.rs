//! Main application entry point
//!
//! Mounts every lens on a JSON-lines rendering engine, replays an interaction
//! script through the dashboard queue and optionally previews what each lens
//! would draw from local copies of the datasets.

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use serde_json::json;
use tracing::{info, warn};

use tv_core::{InteractionEvent, RegionResolver};
use tv_data::{BoundaryDataset, DashboardConfig, TabularDataset};
use tv_render::JsonEngine;
use tv_spec::{evaluate, is_highlighted, Datasets};
use tv_views::Dashboard;

mod script;

use script::{read_script, Args};

#[tokio::main]
async fn main() -> Result<()> {
    // Specs go to stdout, logs to stderr
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse(std::env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => DashboardConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    let datasets = match &args.data {
        Some((tabular, boundaries)) => Some(load_datasets(tabular, boundaries, &config)?),
        None => None,
    };

    let engine = JsonEngine::stdout();
    let mut dashboard = Dashboard::new(config)?;
    dashboard.mount_all(&engine).await?;
    info!("Mounted {} lenses", dashboard.adapters().len());

    if let Some(path) = &args.events {
        let events = read_script(path)?;
        info!("Replaying {} events from {}", events.len(), path.display());

        let sink = dashboard.event_sink();
        for event in events {
            match event {
                // Clicks enter through the mounted view, like a real one would
                InteractionEvent::MarkActivated { lens, datum } => {
                    if let Err(e) = engine.activate(lens.as_str(), datum) {
                        warn!("Skipping click: {}", e);
                    }
                }
                event => {
                    sink.send(event);
                }
            }
            dashboard.process_pending().await?;
        }
    }

    let text = dashboard.shell();
    info!(
        heading = %text.heading,
        caption = %text.caption,
        show_reset = text.show_reset,
        "Final selection {:?}",
        dashboard.current_selection()
    );

    if let Some(datasets) = &datasets {
        for adapter in dashboard.adapters() {
            let spec = adapter.rendered_spec();
            let rows = evaluate(&spec, datasets);
            let highlighted = rows.iter().filter(|row| is_highlighted(&spec, row)).count();
            println!(
                "{}",
                json!({ "op": "evaluate", "lens": adapter.lens(), "rows": rows, "highlighted": highlighted })
            );
        }
    }

    dashboard.unmount_all().await;
    Ok(())
}

fn load_datasets(
    tabular: &std::path::Path,
    boundaries: &std::path::Path,
    config: &DashboardConfig,
) -> Result<Datasets> {
    let tabular = TabularDataset::from_csv_path(tabular)
        .with_context(|| format!("failed to load {}", tabular.display()))?;
    let boundaries = BoundaryDataset::from_geojson_path(boundaries)
        .with_context(|| format!("failed to load {}", boundaries.display()))?;

    // Shapes with an unknown spelling are still drawn but never get counts
    let resolver = RegionResolver::new(config.tabular_key_style);
    for name in boundaries.property_values(&config.boundary.name_property) {
        if resolver.resolve_region_code(&name).is_none() {
            warn!("Boundary region '{}' matches no known region", name);
        }
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        let table = pretty_format_batches(&[tabular.batch().clone()])?;
        tracing::debug!("Tabular dataset:\n{}", table);
    }

    Ok(Datasets::load(&tabular, &boundaries)?)
}
