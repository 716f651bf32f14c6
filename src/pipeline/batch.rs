//! Batch handler: one webhook delivery, many independent events.

use futures::future::join_all;
use tracing::{Instrument, error, info_span, warn};

use crate::channels::line_types::WebhookEvent;

use super::dispatcher::EventDispatcher;

/// How one event settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Handled,
    Failed,
    Undecodable,
}

/// Tally of a settled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub handled: usize,
    pub failed: usize,
    pub undecodable: usize,
}

impl FromIterator<EventOutcome> for BatchSummary {
    fn from_iter<I: IntoIterator<Item = EventOutcome>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut summary, outcome| {
            summary.total += 1;
            match outcome {
                EventOutcome::Handled => summary.handled += 1,
                EventOutcome::Failed => summary.failed += 1,
                EventOutcome::Undecodable => summary.undecodable += 1,
            }
            summary
        })
    }
}

/// Decode and dispatch every event concurrently, waiting for all to settle.
///
/// Each event's error stays with that event: it is logged and turned into an
/// [`EventOutcome::Failed`] so siblings keep running.
pub async fn handle_batch(
    dispatcher: &EventDispatcher,
    events: Vec<serde_json::Value>,
) -> BatchSummary {
    let tasks = events.into_iter().enumerate().map(|(index, raw)| {
        async move {
            let event = match WebhookEvent::from_value(raw) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable webhook event");
                    return EventOutcome::Undecodable;
                }
            };

            match dispatcher.dispatch(&event).await {
                Ok(()) => EventOutcome::Handled,
                Err(e) => {
                    error!(kind = event.kind(), error = %e, "Event failed");
                    EventOutcome::Failed
                }
            }
        }
        .instrument(info_span!("event", index))
    });

    join_all(tasks).await.into_iter().collect()
}
