//! Handler for `propview viewport`.

use anyhow::bail;
use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::ViewportArgs;
use crate::adapter::inbound::cli::output;
use crate::application::viewport::{DataOrigin, ViewportOutcome};
use crate::domain::{merge_for_display, GeoBounds, Property};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::services::Services;

#[derive(Tabled)]
struct PropertyRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Lat")]
    lat: String,
    #[tabled(rename = "Lng")]
    lng: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Title")]
    title: String,
}

impl From<&Property> for PropertyRow {
    fn from(p: &Property) -> Self {
        let (lat, lng) = p.coordinates().unwrap_or_default();
        Self {
            id: p.id.to_string(),
            lat: format!("{lat:.5}"),
            lng: format!("{lng:.5}"),
            kind: p.kind.clone(),
            price: p.price.map(|d| format!("${d}")).unwrap_or_default(),
            title: p.title.clone().unwrap_or_default(),
        }
    }
}

/// Execute `viewport`.
pub async fn execute(config: &Config, args: &ViewportArgs) -> anyhow::Result<()> {
    let bounds = GeoBounds::try_new(args.north, args.south, args.east, args.west)?;
    let services = Services::from_config(config)?;
    let loader = services.viewport_loader();

    let outcome = loader.load(bounds).await?;
    let (markers, origin) = match &outcome {
        ViewportOutcome::Ready { properties, origin } => {
            (merge_for_display(properties.iter()), Some(*origin))
        }
        ViewportOutcome::Failed { error, fallback: None } => bail!("viewport fetch failed: {error}"),
        other => {
            output::warning(&describe(other));
            let markers = other
                .properties()
                .map(|set| merge_for_display(set.iter()))
                .unwrap_or_default();
            (markers, None)
        }
    };
    services.dispose();

    let shown = args.limit.unwrap_or(markers.len()).min(markers.len());
    if output::is_json() {
        output::json_output(&json!({
            "command": "viewport",
            "bounds": bounds,
            "origin": origin.map(origin_label),
            "count": markers.len(),
            "properties": &markers[..shown],
        }));
        return Ok(());
    }

    output::section("Viewport");
    output::field("Bounds", bounds);
    output::field("Source", origin.map_or("fallback", origin_label));
    output::field("Properties", markers.len());
    if markers.is_empty() {
        output::note("(no properties in view)");
        return Ok(());
    }
    let rows: Vec<PropertyRow> = markers[..shown].iter().map(PropertyRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    if shown < markers.len() {
        output::note(&format!("... {} more", markers.len() - shown));
    }
    Ok(())
}

fn origin_label(origin: DataOrigin) -> &'static str {
    match origin {
        DataOrigin::Cache => "cache",
        DataOrigin::Network => "network",
    }
}

fn describe(outcome: &ViewportOutcome) -> String {
    match outcome {
        ViewportOutcome::RateLimited { retry_after, .. } => match retry_after {
            Some(wait) => format!("rate limited, retry in {}ms", wait.as_millis()),
            None => "rate limited".to_string(),
        },
        ViewportOutcome::Failed { error, .. } => format!("fetch failed ({error}), showing last data"),
        ViewportOutcome::Superseded => "superseded by a newer viewport".to_string(),
        ViewportOutcome::Unchanged { .. } => "viewport unchanged".to_string(),
        ViewportOutcome::Ready { .. } => "ready".to_string(),
    }
}
