use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

use crate::event::{CommonProperties, TrackPayload, TrackingEvent};
use crate::reachability::Reachability;
use crate::sink::{EventSink, NoopSink};

/// Owns every in-flight tracking send.
///
/// [`record`](Self::record) never waits on the network. Sends are not
/// retried or persisted, and their relative order is not guaranteed.
pub struct TrackingQueue {
    sink: Arc<dyn EventSink>,
    reachability: Arc<dyn Reachability>,
    common: CommonProperties,
    track_stats: bool,
    tasks: Mutex<JoinSet<()>>,
}

struct AlwaysOnline;

impl Reachability for AlwaysOnline {
    fn is_online(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async { true })
    }
}

impl TrackingQueue {
    pub fn new(
        sink: Arc<dyn EventSink>,
        reachability: Arc<dyn Reachability>,
        common: CommonProperties,
        track_stats: bool,
    ) -> Self {
        Self {
            sink,
            reachability,
            common,
            track_stats,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Queue that drops every event.
    pub fn disabled() -> Self {
        Self::new(
            Arc::new(NoopSink),
            Arc::new(AlwaysOnline),
            CommonProperties::detect("", ""),
            false,
        )
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules `event` for sending and returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn record(&self, event: TrackingEvent) {
        if !self.track_stats && !event.is_consent_answer() {
            trace!(event = event.name(), "tracking disabled, dropping event");
            return;
        }

        let payload = TrackPayload::new(&event, &self.common);
        let sink = Arc::clone(&self.sink);
        let reachability = Arc::clone(&self.reachability);

        self.tasks().spawn(async move {
            if !reachability.is_online().await {
                debug!(event = %payload.event, "offline, dropping event");
                return;
            }
            let name = payload.event.clone();
            match sink.send(payload).await {
                Ok(()) => trace!(event = %name, "event sent"),
                Err(e) => debug!(event = %name, "event not sent: {e}"),
            }
        });
    }

    /// Number of sends not yet collected by [`drain_all`](Self::drain_all).
    pub fn pending(&self) -> usize {
        self.tasks().len()
    }

    /// Waits for every send recorded so far to finish.
    pub async fn drain_all(&self) {
        let mut tasks = std::mem::take(&mut *self.tasks());
        if !tasks.is_empty() {
            debug!(pending = tasks.len(), "draining tracking queue");
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!("tracking task failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::AnalyticsError;
    use crate::event::SCHEMA_VERSION;

    enum Behavior {
        Accept,
        Fail,
        Panic,
    }

    struct RecordingSink {
        delay: Duration,
        behavior: Behavior,
        sent: Mutex<Vec<TrackPayload>>,
    }

    impl RecordingSink {
        fn new(delay: Duration, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                delay,
                behavior,
                sent: Mutex::new(Vec::new()),
            })
        }

        fn names(&self) -> Vec<String> {
            let mut names: Vec<String> = self
                .sent
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.event.clone())
                .collect();
            names.sort();
            names
        }
    }

    impl EventSink for RecordingSink {
        fn send(
            &self,
            payload: TrackPayload,
        ) -> Pin<Box<dyn Future<Output = Result<(), AnalyticsError>> + Send + '_>> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                match self.behavior {
                    Behavior::Accept => {
                        self.sent.lock().unwrap().push(payload);
                        Ok(())
                    }
                    Behavior::Fail => Err(AnalyticsError::Rejected(500)),
                    Behavior::Panic => panic!("sink exploded"),
                }
            })
        }
    }

    struct Fixed(bool);

    impl Reachability for Fixed {
        fn is_online(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
            let online = self.0;
            Box::pin(async move { online })
        }
    }

    fn common() -> CommonProperties {
        CommonProperties {
            os: "linux".into(),
            cli_version: "0.1.0".into(),
            is_ci: false,
            dev_id: "dev-1".into(),
            schema_version: SCHEMA_VERSION,
        }
    }

    fn queue(sink: Arc<RecordingSink>, online: bool, track_stats: bool) -> TrackingQueue {
        TrackingQueue::new(sink, Arc::new(Fixed(online)), common(), track_stats)
    }

    #[tokio::test(start_paused = true)]
    async fn record_does_not_wait_for_send() {
        let sink = RecordingSink::new(Duration::from_secs(30), Behavior::Accept);
        let q = queue(sink.clone(), true, true);

        let started = tokio::time::Instant::now();
        q.record(TrackingEvent::DeployStarted);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(q.pending(), 1);
        assert!(sink.names().is_empty());

        q.drain_all().await;
        assert_eq!(sink.names(), vec!["Scene deploy started"]);
        assert_eq!(q.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_every_send() {
        let sink = RecordingSink::new(Duration::from_millis(250), Behavior::Accept);
        let q = queue(sink.clone(), true, true);

        q.record(TrackingEvent::DeployRequested);
        q.record(TrackingEvent::DeployStarted);
        q.record(TrackingEvent::DeploySucceeded);
        q.drain_all().await;

        assert_eq!(
            sink.names(),
            vec![
                "Scene deploy requested",
                "Scene deploy started",
                "Scene deploy success"
            ]
        );
    }

    #[tokio::test]
    async fn offline_drops_silently() {
        let sink = RecordingSink::new(Duration::ZERO, Behavior::Accept);
        let q = queue(sink.clone(), false, true);

        q.record(TrackingEvent::DeployStarted);
        q.drain_all().await;
        assert!(sink.names().is_empty());
    }

    #[tokio::test]
    async fn opt_out_only_sends_consent_answer() {
        let sink = RecordingSink::new(Duration::ZERO, Behavior::Accept);
        let q = queue(sink.clone(), true, false);

        q.record(TrackingEvent::DeployStarted);
        q.record(TrackingEvent::ShareDataAnswered { share_data: false });
        assert_eq!(q.pending(), 1);
        q.drain_all().await;
        assert_eq!(sink.names(), vec!["Send Anonymous data"]);
    }

    #[tokio::test]
    async fn sink_failures_are_swallowed() {
        let sink = RecordingSink::new(Duration::ZERO, Behavior::Fail);
        let q = queue(sink.clone(), true, true);

        q.record(TrackingEvent::Error {
            error_type: "UPLOAD_ERROR".into(),
            message: "boom".into(),
        });
        q.drain_all().await;
        assert_eq!(q.pending(), 0);
    }

    #[tokio::test]
    async fn panicking_send_does_not_stop_drain() {
        let sink = RecordingSink::new(Duration::ZERO, Behavior::Panic);
        let q = queue(sink, true, true);

        q.record(TrackingEvent::DeployStarted);
        q.record(TrackingEvent::DeploySucceeded);
        q.drain_all().await;
        assert_eq!(q.pending(), 0);
    }

    #[tokio::test]
    async fn disabled_queue_drops_everything() {
        let q = TrackingQueue::disabled();
        q.record(TrackingEvent::DeployStarted);
        assert_eq!(q.pending(), 0);
        q.drain_all().await;
    }
}
