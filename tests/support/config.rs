use std::io::Write;

use tempfile::NamedTempFile;

/// Write `contents` to a temporary `.toml` file that lives as long as the
/// returned handle.
pub fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("propview-test-")
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

/// Configuration pointing at an unroutable backend so tests never reach a
/// real network.
pub const OFFLINE_CONFIG: &str = r#"
[api]
base_url = "http://127.0.0.1:9"
timeout_ms = 500
connect_timeout_ms = 200

[logging]
level = "error"
"#;
