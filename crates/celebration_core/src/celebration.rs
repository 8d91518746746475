use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use shared::domain::SubmissionKind;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::first_login::FirstLoginController;

pub const CONFETTI_DURATION: Duration = Duration::from_secs(5);
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub kind: SubmissionKind,
    pub text: String,
    pub toast: String,
    pub confetti_for: Duration,
    pub toast_for: Duration,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CelebrationEvent {
    CakeShown { greeting: String },
    CakeFinished,
    Submitted(Submission),
}

/// Fan-out of celebration events to whatever presentation layer is listening.
pub struct CelebrationFeed {
    events: broadcast::Sender<CelebrationEvent>,
}

impl CelebrationFeed {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CelebrationEvent> {
        self.events.subscribe()
    }

    /// Blank wishes are ignored.
    pub fn submit_wish(&self, text: &str) -> Option<Submission> {
        self.submit(SubmissionKind::Wish, text)
    }

    /// Blank plans are ignored.
    pub fn submit_plan(&self, text: &str) -> Option<Submission> {
        self.submit(SubmissionKind::Plan, text)
    }

    pub fn announce_first_login(&self, display_name: Option<&str>) -> String {
        let name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Friend");
        let greeting = format!("Happy Birthday, {name}!");
        self.publish(CelebrationEvent::CakeShown {
            greeting: greeting.clone(),
        });
        greeting
    }

    fn submit(&self, kind: SubmissionKind, text: &str) -> Option<Submission> {
        let text = text.trim();
        if text.is_empty() {
            debug!("celebration: ignoring blank {kind:?}");
            return None;
        }

        let toast = match kind {
            SubmissionKind::Wish => format!("Birthday wish sent: {text}"),
            SubmissionKind::Plan => format!("Celebration plan created: {text}"),
        };
        let submission = Submission {
            kind,
            text: text.to_string(),
            toast,
            confetti_for: CONFETTI_DURATION,
            toast_for: TOAST_DURATION,
            submitted_at: Utc::now(),
        };
        info!("celebration: {kind:?} submitted");
        self.publish(CelebrationEvent::Submitted(submission.clone()));
        Some(submission)
    }

    fn publish(&self, event: CelebrationEvent) {
        // No subscribers is fine; events are fire-and-forget.
        let _ = self.events.send(event);
    }
}

impl Default for CelebrationFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Load-time flow: claim the session's decision, show the cake, wait for `sequence`, retire the flag.
///
/// The flag is retired only after `sequence` resolves, whether the user watched to the end or
/// dismissed it. Returns whether the celebration ran.
pub async fn run_first_login_sequence<F>(
    controller: &FirstLoginController,
    feed: &CelebrationFeed,
    display_name: Option<&str>,
    sequence: F,
) -> bool
where
    F: Future<Output = ()>,
{
    let Some(ticket) = controller.claim_celebration().await else {
        return false;
    };

    feed.announce_first_login(display_name);
    sequence.await;
    ticket.complete().await;
    feed.publish(CelebrationEvent::CakeFinished);
    true
}

#[cfg(test)]
#[path = "tests/celebration_tests.rs"]
mod tests;
