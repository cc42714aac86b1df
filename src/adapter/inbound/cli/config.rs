//! Handler for the `config` command group.

use std::path::Path;

use anyhow::Context;
use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::infrastructure::config::settings::Config;

/// Execute `config show`.
pub fn execute_show(config: &Config) -> anyhow::Result<()> {
    if output::is_json() {
        output::json_output(&serde_json::to_value(config)?);
        return Ok(());
    }

    output::section("Backend");
    output::field("Base URL", &config.api.base_url);
    output::field("Viewport", &config.api.viewport_path);
    output::field("Paging", format!("{} x {}", config.api.max_pages, config.api.page_size));

    output::section("Viewport");
    output::field("Epsilon", format!("{}°", config.viewport.epsilon_deg));
    output::field(
        "Debounce",
        format!(
            "bounds {}ms, zoom {}ms",
            config.viewport.bounds_debounce_ms, config.viewport.zoom_debounce_ms
        ),
    );
    output::field(
        "Prefetch",
        if config.viewport.prefetch {
            format!("x{}", config.viewport.prefetch_factor)
        } else {
            "off".to_string()
        },
    );
    output::field(
        "Cache",
        format!(
            "{} regions, {}s",
            config.region_cache.max_entries, config.region_cache.ttl_secs
        ),
    );
    output::field("Cooldown", format!("{}ms", config.coordinator.cooldown_ms));

    output::section("Video");
    output::field("Base URL", config.video_base_url());
    output::field("Template", &config.video.path_template);
    output::field("Timeout", format!("{}ms", config.video.probe_timeout_ms));
    output::field(
        "Breaker",
        format!(
            "{} failures, {}s cooldown",
            config.circuit_breaker.max_failures, config.circuit_breaker.cooldown_secs
        ),
    );
    output::field(
        "Token",
        if config.video.token.is_some() {
            "set"
        } else {
            "not set"
        },
    );
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> anyhow::Result<()> {
    Config::load(path).with_context(|| format!("invalid configuration: {}", path.display()))?;

    if output::is_json() {
        output::json_output(&json!({
            "command": "config.validate",
            "path": path.display().to_string(),
            "valid": true,
        }));
        return Ok(());
    }
    output::success(&format!("{} is valid", path.display()));
    Ok(())
}
