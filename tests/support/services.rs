use std::sync::Arc;

use propview::infrastructure::services::Services;
use propview::testkit::probe::ScriptedProbe;
use propview::testkit::source::ScriptedPropertySource;

/// Isolated services over scripted collaborators, with prefetch disabled so
/// source call counts only reflect viewport loads.
pub fn scripted(source: Arc<ScriptedPropertySource>, probe: Arc<ScriptedProbe>) -> Services {
    let config = propview::testkit::config::without_prefetch();
    Services::create(&config, source, probe).expect("services")
}
