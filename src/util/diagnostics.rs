//! Process-wide diagnostics state

use std::sync::OnceLock;

use tracing::info;

/// Set the first time a session reports its host capabilities
static CAPABILITY_REPORT: OnceLock<String> = OnceLock::new();

/// Log the host capability banner once per process. Later sessions
/// (restarts, new controllers) skip the log line. Returns `true` when this
/// call produced the report.
pub fn report_capabilities(scene: &str) -> bool {
    let mut reported = false;
    CAPABILITY_REPORT.get_or_init(|| {
        reported = true;
        info!(scene, "Raycast scene capabilities verified");
        scene.to_string()
    });
    reported
}

/// Scene named in the first capability report, if any
pub fn reported_scene() -> Option<&'static str> {
    CAPABILITY_REPORT.get().map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_happens_once() {
        report_capabilities("first");
        assert!(!report_capabilities("second"));
        assert!(reported_scene().is_some());
    }
}
