use crate::camera_interface::{CameraResult, CameraService, Notification, SubscriptionAddress};
use crate::prelude::{MotionSignal, Presence, Reading, SignalMode};
use crate::signal::normalize::normalize_leaf;
use crate::signal::tree::collect_leaves;
use crate::telemetry::{MetricsRecorder, TransitionLog};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Leaf field that carries the detection flag in a notification payload.
const VALUE_FIELD: &str = "Value";

/// Case-insensitive topic filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Parses a comma-separated list such as `"Motion, People"`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn matches(&self, topic: &str) -> bool {
        let topic = topic.to_lowercase();
        self.keywords.iter().any(|keyword| topic.contains(keyword.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Samples presence from a pull-point subscription held for its whole life.
pub struct EventSignal {
    camera: Arc<dyn CameraService>,
    subscription: SubscriptionAddress,
    keywords: KeywordSet,
    message_limit: usize,
    metrics: Arc<MetricsRecorder>,
    logger: TransitionLog,
}

impl EventSignal {
    /// Acquires the subscription. The caller decides what a failure means.
    pub fn subscribe(
        camera: Arc<dyn CameraService>,
        keywords: KeywordSet,
        message_limit: usize,
        metrics: Arc<MetricsRecorder>,
    ) -> CameraResult<Self> {
        let subscription = camera.create_event_subscription()?;
        Ok(Self {
            camera,
            subscription,
            keywords,
            message_limit: message_limit.max(1),
            metrics,
            logger: TransitionLog::new(),
        })
    }

    pub fn subscription(&self) -> &SubscriptionAddress {
        &self.subscription
    }

    /// ORs every resolvable `Value` leaf of the notifications whose topic
    /// matches a keyword.
    pub fn evaluate(&self, notifications: &[Notification]) -> Presence {
        let mut leaves = Vec::new();
        for notification in notifications {
            let topic = match notification.topic.as_deref().map(str::trim) {
                Some(topic) if !topic.is_empty() => topic,
                _ => {
                    self.metrics.record_protocol_violation();
                    self.logger.violation("notification without topic");
                    continue;
                }
            };
            if !self.keywords.matches(topic) {
                continue;
            }
            if notification.payload.is_null() {
                self.metrics.record_protocol_violation();
                self.logger
                    .violation(&format!("empty payload on topic {}", topic));
                continue;
            }
            leaves.extend(collect_leaves(&notification.payload, |key, node: &Value| {
                if key.eq_ignore_ascii_case(VALUE_FIELD) {
                    normalize_leaf(node)
                } else {
                    None
                }
            }));
        }
        Presence::from_leaves(leaves)
    }
}

impl MotionSignal for EventSignal {
    fn sample(&mut self, timeout_hint: Duration) -> Reading {
        match self
            .camera
            .pull_messages(&self.subscription, timeout_hint, self.message_limit)
        {
            Ok(notifications) => Reading::Event(self.evaluate(&notifications)),
            Err(err) => {
                self.metrics.record_transport_fault();
                self.logger.fault("pulling event messages", &err);
                Reading::Event(Presence::Unknown)
            }
        }
    }

    fn mode(&self) -> SignalMode {
        SignalMode::Events
    }
}
