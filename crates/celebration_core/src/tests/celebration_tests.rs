use super::*;
use std::sync::Arc;
use storage::{DurableStore, MemoryPreferences};
use tokio::sync::oneshot;

fn controller_with_flag() -> (Arc<MemoryPreferences>, FirstLoginController) {
    let medium = Arc::new(MemoryPreferences::new("native"));
    let store = DurableStore::builder().medium(medium.clone()).build();
    (medium, FirstLoginController::new(store))
}

#[tokio::test]
async fn wish_emits_confetti_and_toast() {
    let feed = CelebrationFeed::new();
    let mut events = feed.subscribe();

    let submission = feed.submit_wish("  more cake  ").expect("submitted");
    assert_eq!(submission.kind, SubmissionKind::Wish);
    assert_eq!(submission.text, "more cake");
    assert_eq!(submission.toast, "Birthday wish sent: more cake");
    assert_eq!(submission.confetti_for, Duration::from_secs(5));
    assert_eq!(submission.toast_for, Duration::from_secs(3));

    assert_eq!(
        events.recv().await.expect("event"),
        CelebrationEvent::Submitted(submission)
    );
}

#[tokio::test]
async fn plan_uses_its_own_toast() {
    let feed = CelebrationFeed::new();
    let submission = feed.submit_plan("picnic at noon").expect("submitted");
    assert_eq!(submission.kind, SubmissionKind::Plan);
    assert_eq!(submission.toast, "Celebration plan created: picnic at noon");
}

#[tokio::test]
async fn blank_submissions_emit_nothing() {
    let feed = CelebrationFeed::new();
    let mut events = feed.subscribe();

    assert!(feed.submit_wish("   ").is_none());
    assert!(feed.submit_plan("").is_none());
    assert!(matches!(
        events.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn submitting_without_listeners_still_returns_submission() {
    let feed = CelebrationFeed::new();
    assert!(feed.submit_wish("balloons").is_some());
}

#[tokio::test]
async fn greeting_falls_back_when_name_missing() {
    let feed = CelebrationFeed::new();
    assert_eq!(feed.announce_first_login(Some("Ava")), "Happy Birthday, Ava!");
    assert_eq!(feed.announce_first_login(Some("  ")), "Happy Birthday, Friend!");
    assert_eq!(feed.announce_first_login(None), "Happy Birthday, Friend!");
}

#[tokio::test]
async fn cake_event_carries_capitalised_fallback_greeting() {
    let feed = CelebrationFeed::new();
    let mut events = feed.subscribe();

    feed.announce_first_login(None);
    assert_eq!(
        events.recv().await.expect("event"),
        CelebrationEvent::CakeShown {
            greeting: "Happy Birthday, Friend!".into()
        }
    );
}

#[tokio::test]
async fn sequence_runs_once_and_retires_flag_afterwards() {
    let (_, controller) = controller_with_flag();
    controller.arm().await.expect("arm");
    let feed = CelebrationFeed::new();
    let mut events = feed.subscribe();

    let ran = run_first_login_sequence(&controller, &feed, Some("Ava"), async {
        assert!(
            controller.is_first_login().await,
            "flag must stay pending while the cake is on screen"
        );
    })
    .await;
    assert!(ran);
    assert!(!controller.is_first_login().await);

    assert_eq!(
        events.recv().await.expect("cake"),
        CelebrationEvent::CakeShown {
            greeting: "Happy Birthday, Ava!".to_string()
        }
    );
    assert_eq!(
        events.recv().await.expect("finished"),
        CelebrationEvent::CakeFinished
    );

    let again = run_first_login_sequence(&controller, &feed, Some("Ava"), async {}).await;
    assert!(!again);
}

#[tokio::test]
async fn sequence_is_skipped_without_pending_flag() {
    let (_, controller) = controller_with_flag();
    let feed = CelebrationFeed::new();
    let mut events = feed.subscribe();

    let ran = run_first_login_sequence(&controller, &feed, None, async {
        panic!("sequence must not run");
    })
    .await;
    assert!(!ran);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn interrupted_sequence_leaves_flag_pending() {
    let (medium, controller) = controller_with_flag();
    controller.arm().await.expect("arm");
    let feed = CelebrationFeed::new();
    let (_dismiss_tx, dismiss_rx) = oneshot::channel::<()>();

    let interrupted = tokio::time::timeout(
        Duration::from_millis(20),
        run_first_login_sequence(&controller, &feed, None, async {
            let _ = dismiss_rx.await;
        }),
    )
    .await;
    assert!(interrupted.is_err(), "sequence was cut short");

    let store = DurableStore::builder().medium(medium).build();
    assert!(FirstLoginController::new(store).is_first_login().await);
}
