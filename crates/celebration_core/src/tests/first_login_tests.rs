use super::*;
use storage::{MemoryPreferences, PreferenceMedium};

fn controller() -> (
    Arc<MemoryPreferences>,
    Arc<MemoryPreferences>,
    FirstLoginController,
) {
    let primary = Arc::new(MemoryPreferences::new("primary"));
    let secondary = Arc::new(MemoryPreferences::new("secondary"));
    let store = DurableStore::builder()
        .medium(primary.clone())
        .medium(secondary.clone())
        .build();
    (primary, secondary, FirstLoginController::new(store))
}

#[tokio::test]
async fn absent_flag_is_not_first_login() {
    let (_, _, controller) = controller();
    assert!(!controller.is_first_login().await);
}

#[tokio::test]
async fn pending_flag_is_consumed_once() {
    let (primary, _, controller) = controller();
    controller.arm().await.expect("arm");
    assert_eq!(primary.peek(FIRST_LOGIN_KEY).await.as_deref(), Some("\"true\""));
    assert!(controller.is_first_login().await);
    assert!(controller.is_first_login().await, "reading has no side effect");

    controller.mark_first_login_complete().await;
    assert!(!controller.is_first_login().await);
    assert_eq!(primary.peek(FIRST_LOGIN_KEY).await.as_deref(), Some("\"false\""));

    controller.mark_first_login_complete().await;
    assert!(!controller.is_first_login().await);
}

#[tokio::test]
async fn only_the_true_string_counts() {
    let (primary, _, controller) = controller();
    for raw in ["true", "\"TRUE\"", "\"yes\"", "1", "\"false\"", "null"] {
        primary.set(FIRST_LOGIN_KEY, raw).await.expect("seed");
        assert!(
            !controller.is_first_login().await,
            "stored text {raw} must not count as first login"
        );
    }
}

#[tokio::test]
async fn corrupted_flag_fails_closed() {
    let (primary, _, controller) = controller();
    primary.set(FIRST_LOGIN_KEY, "{broken").await.expect("seed");
    assert!(!controller.is_first_login().await);
}

#[tokio::test]
async fn both_media_down_fails_closed() {
    let (primary, secondary, controller) = controller();
    controller.arm().await.expect("arm");
    primary.set_faulty(true);
    secondary.set_faulty(true);

    assert!(!controller.is_first_login().await);
    assert!(controller.claim_celebration().await.is_none());
    controller.mark_first_login_complete().await;
}

#[tokio::test]
async fn arming_with_primary_down_lands_in_secondary() {
    let (primary, secondary, controller) = controller();
    primary.set_faulty(true);
    controller.arm().await.expect("arm via secondary");
    assert_eq!(
        secondary.peek(FIRST_LOGIN_KEY).await.as_deref(),
        Some("\"true\"")
    );
    assert!(controller.is_first_login().await);
}

#[tokio::test]
async fn ticket_is_issued_once_per_session() {
    let (_, _, controller) = controller();
    controller.arm().await.expect("arm");

    let ticket = controller.claim_celebration().await.expect("first claim");
    assert!(controller.claim_celebration().await.is_none());
    assert!(controller.clone().claim_celebration().await.is_none());

    assert!(controller.is_first_login().await, "flag stays pending until completion");
    ticket.complete().await;
    assert!(!controller.is_first_login().await);
}

#[tokio::test]
async fn concurrent_claims_yield_a_single_ticket() {
    let (_, _, controller) = controller();
    controller.arm().await.expect("arm");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let controller = controller.clone();
        handles.push(tokio::spawn(async move {
            controller.claim_celebration().await.is_some()
        }));
    }

    let mut granted = 0;
    for handle in handles {
        if handle.await.expect("join") {
            granted += 1;
        }
    }
    assert_eq!(granted, 1);
}

#[tokio::test]
async fn dropped_ticket_keeps_flag_pending_for_next_session() {
    let (primary, secondary, first_session) = controller();
    first_session.arm().await.expect("arm");
    drop(first_session.claim_celebration().await.expect("ticket"));

    let store = DurableStore::builder()
        .medium(primary)
        .medium(secondary)
        .build();
    let next_session = FirstLoginController::new(store);
    assert!(next_session.claim_celebration().await.is_some());
}

#[tokio::test]
async fn claim_without_pending_flag_still_uses_up_the_decision() {
    let (_, _, controller) = controller();
    assert!(controller.claim_celebration().await.is_none());
    controller.arm().await.expect("arm");
    assert!(controller.claim_celebration().await.is_none());
}
