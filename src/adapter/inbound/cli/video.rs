//! Handler for `propview video`.

use anyhow::bail;
use serde_json::json;

use crate::adapter::inbound::cli::command::VideoArgs;
use crate::adapter::inbound::cli::output;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::services::Services;

/// Execute `video`.
pub async fn execute(config: &Config, args: &VideoArgs) -> anyhow::Result<()> {
    let services = Services::from_config(config)?;
    let result = services.video_resolver().resolve(&args.id).await;
    services.dispose();

    let resolution = match result {
        Ok(resolution) => resolution,
        Err(failure) => {
            if output::is_json() {
                output::json_output(&json!({
                    "command": "video",
                    "id": args.id,
                    "error": failure.kind(),
                    "retry_after_secs": failure.retry_after_secs(),
                }));
            }
            bail!("{failure}");
        }
    };

    if output::is_json() {
        output::json_output(&json!({
            "command": "video",
            "resolution": resolution,
            "absence": resolution.absence(),
        }));
        return Ok(());
    }

    output::section("Video");
    output::field("ID", resolution.id);
    output::field("URL", &resolution.url);
    if resolution.exists {
        output::success("Video available");
        if resolution.fallback {
            output::note("The endpoint serves a fallback video for this property");
        }
    } else {
        output::warning("No video available for this property");
    }
    Ok(())
}
