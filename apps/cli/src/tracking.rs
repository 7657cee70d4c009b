//! Tracking queue wiring for a CLI run.

use std::sync::Arc;

use scenedeploy_analytics::{
    CommonProperties, DnsReachability, EventSink, NoopSink, SegmentSink, TrackingEvent,
    TrackingQueue, UserConfig, user_config_path,
};

use crate::config::CliConfig;

const TRACKING_HOST: &str = "api.segment.io:443";

const NOTICE: &str = "\
scenedeploy collects anonymous usage statistics to improve the tool.
Set \"trackStats\" to false in ~/.scenedeploy/info.json to opt out.";

/// Builds the queue for this run. Any problem with the user file turns
/// tracking off rather than failing the command.
pub fn init(config: &CliConfig, http: reqwest::Client) -> TrackingQueue {
    let (user, created) = match user_config_path().and_then(|path| UserConfig::load_or_create(&path)) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "tracking disabled");
            return TrackingQueue::disabled();
        }
    };

    let sink: Arc<dyn EventSink> = match &config.segment_key {
        Some(key) => Arc::new(SegmentSink::new(http, key.clone())),
        None => Arc::new(NoopSink),
    };
    let common = CommonProperties::detect(user.user_id.clone(), env!("CARGO_PKG_VERSION"));
    let queue = TrackingQueue::new(
        sink,
        Arc::new(DnsReachability::new(TRACKING_HOST)),
        common,
        user.track_stats,
    );

    if created {
        eprintln!("{NOTICE}\n");
        queue.record(TrackingEvent::ShareDataAnswered { share_data: true });
    }
    queue
}
