//! Where tracked events end up.

use std::future::Future;
use std::pin::Pin;

use crate::error::AnalyticsError;
use crate::event::TrackPayload;

pub const SEGMENT_TRACK_URL: &str = "https://api.segment.io/v1/track";

pub trait EventSink: Send + Sync {
    fn send(
        &self,
        payload: TrackPayload,
    ) -> Pin<Box<dyn Future<Output = Result<(), AnalyticsError>> + Send + '_>>;
}

/// Posts events to Segment's HTTP tracking API.
pub struct SegmentSink {
    http: reqwest::Client,
    write_key: String,
    endpoint: String,
}

impl SegmentSink {
    pub fn new(http: reqwest::Client, write_key: impl Into<String>) -> Self {
        Self {
            http,
            write_key: write_key.into(),
            endpoint: SEGMENT_TRACK_URL.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl EventSink for SegmentSink {
    fn send(
        &self,
        payload: TrackPayload,
    ) -> Pin<Box<dyn Future<Output = Result<(), AnalyticsError>> + Send + '_>> {
        Box::pin(async move {
            let resp = self
                .http
                .post(&self.endpoint)
                .basic_auth(&self.write_key, Some(""))
                .json(&payload)
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(AnalyticsError::Rejected(resp.status().as_u16()));
            }
            Ok(())
        })
    }
}

/// Discards everything; used when no write key is configured.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn send(
        &self,
        _payload: TrackPayload,
    ) -> Pin<Box<dyn Future<Output = Result<(), AnalyticsError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
