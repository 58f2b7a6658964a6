use sqlx::SqlitePool;
use tracing::debug;

use crate::database::{shift_repo, signup_repo, waitlist_repo};
use crate::error::CoordinatorError;
use crate::events::{DomainEvent, EventBus};
use crate::models::{Role, SignupStatus};

use super::now_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpOutcome {
    Reserved,
    Waitlisted,
}

/// Reserve a seat on `shift_id` for `user_id`, falling back to the waitlist
/// when the shift is full.
///
/// Idempotent in both directions: re-RSVPing while `going` stays `Reserved`
/// without consuming another seat, and re-RSVPing while waitlisted keeps the
/// original queue position. A waitlisted user who lands a seat leaves the
/// queue in the same transaction; a queue entry never outlives a `going`
/// signup for the same shift.
pub async fn rsvp(
    pool: &SqlitePool,
    events: &EventBus,
    shift_id: &str,
    user_id: &str,
) -> Result<RsvpOutcome, CoordinatorError> {
    let Some(_shift) = shift_repo::load_shift(pool, shift_id).await? else {
        return Err(CoordinatorError::ShiftNotFound);
    };

    let now = now_rfc3339();
    let mut tx = pool.begin().await?;

    let reserved = signup_repo::reserve_seat(&mut *tx, shift_id, user_id, &now).await?;
    if reserved {
        waitlist_repo::remove_entry(&mut *tx, shift_id, user_id).await?;
    } else {
        waitlist_repo::join_waitlist(&mut *tx, shift_id, user_id, &now).await?;
    }

    tx.commit().await?;

    if reserved {
        events.publish(DomainEvent::SignupChanged {
            shift_id: shift_id.to_string(),
            user_id: user_id.to_string(),
            status: SignupStatus::Going,
        });
        return Ok(RsvpOutcome::Reserved);
    }

    debug!(shift_id, user_id, "Shift full, joining waitlist");
    Ok(RsvpOutcome::Waitlisted)
}

/// Cancel `subject_user_id`'s signup on `shift_id`.
///
/// Users cancel their own signups; admins and moderators may force-cancel
/// anyone's. Cancelling when no signup exists still records `cancelled` as
/// the current state, and the caller's waitlist entry (if any) is dropped.
///
/// When the cancellation frees a seat, the earliest waitlisted user is
/// promoted to `going` inside the same transaction, so two concurrent
/// cancellations can never promote the same user twice and a promotion
/// cannot be lost halfway.
pub async fn cancel(
    pool: &SqlitePool,
    events: &EventBus,
    shift_id: &str,
    subject_user_id: &str,
    actor_user_id: &str,
    actor_role: Role,
) -> Result<(), CoordinatorError> {
    if subject_user_id != actor_user_id && !actor_role.can_manage_attendance() {
        return Err(CoordinatorError::Forbidden);
    }

    let Some(shift) = shift_repo::load_shift(pool, shift_id).await? else {
        return Err(CoordinatorError::ShiftNotFound);
    };

    let now = now_rfc3339();
    let mut tx = pool.begin().await?;

    // The conditional UPDATE runs first so the transaction takes the write
    // lock before any reads it depends on.
    let freed = signup_repo::cancel_going(&mut *tx, shift_id, subject_user_id, &now).await?;
    if !freed {
        signup_repo::upsert_cancelled(&mut *tx, shift_id, subject_user_id, &now).await?;
    }
    waitlist_repo::remove_entry(&mut *tx, shift_id, subject_user_id).await?;

    let mut promoted: Option<String> = None;
    if freed {
        let going = signup_repo::count_going_tx(&mut *tx, shift_id).await?;
        if shift.capacity == 0 || going < shift.capacity {
            // A queue entry is stale once its user already holds a seat;
            // drop those instead of spending the freed seat on them.
            while let Some(head) = waitlist_repo::peek_head(&mut *tx, shift_id).await? {
                waitlist_repo::remove_entry(&mut *tx, shift_id, &head.user_id).await?;
                if signup_repo::is_going_tx(&mut *tx, shift_id, &head.user_id).await? {
                    continue;
                }
                signup_repo::promote_going(&mut *tx, shift_id, &head.user_id, &now).await?;
                promoted = Some(head.user_id);
                break;
            }
        }
    }

    tx.commit().await?;

    events.publish(DomainEvent::SignupChanged {
        shift_id: shift_id.to_string(),
        user_id: subject_user_id.to_string(),
        status: SignupStatus::Cancelled,
    });
    if let Some(user_id) = promoted {
        debug!(shift_id, user_id, "Promoted from waitlist");
        events.publish(DomainEvent::SignupChanged {
            shift_id: shift_id.to_string(),
            user_id,
            status: SignupStatus::Going,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{signup_repo, waitlist_repo};
    use crate::services::attendance_service;
    use crate::services::test_support::{seed_shift, setup_pool};

    async fn status_of(pool: &SqlitePool, shift: &str, user: &str) -> Option<String> {
        signup_repo::load_signup(pool, shift, user)
            .await
            .unwrap()
            .map(|r| r.status)
    }

    #[tokio::test]
    async fn rsvp_reserves_until_capacity_then_waitlists() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 2).await;

        assert_eq!(
            rsvp(&pool, &events, "s1", "alice").await.unwrap(),
            RsvpOutcome::Reserved
        );
        assert_eq!(
            rsvp(&pool, &events, "s1", "bob").await.unwrap(),
            RsvpOutcome::Reserved
        );
        assert_eq!(
            rsvp(&pool, &events, "s1", "carol").await.unwrap(),
            RsvpOutcome::Waitlisted
        );

        let going = crate::database::shift_repo::count_going(&pool, "s1")
            .await
            .unwrap();
        assert_eq!(going, 2);
        let waitlist = waitlist_repo::list_for_shift(&pool, "s1").await.unwrap();
        assert_eq!(waitlist.len(), 1);
        assert_eq!(waitlist[0].user_id, "carol");
    }

    #[tokio::test]
    async fn rsvp_is_idempotent_for_going_user() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 1).await;

        assert_eq!(
            rsvp(&pool, &events, "s1", "alice").await.unwrap(),
            RsvpOutcome::Reserved
        );
        // Shift is now full, but alice already holds the seat.
        assert_eq!(
            rsvp(&pool, &events, "s1", "alice").await.unwrap(),
            RsvpOutcome::Reserved
        );

        let going = crate::database::shift_repo::count_going(&pool, "s1")
            .await
            .unwrap();
        assert_eq!(going, 1);
    }

    #[tokio::test]
    async fn rsvp_on_waitlist_keeps_queue_position() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 1).await;

        rsvp(&pool, &events, "s1", "alice").await.unwrap();
        rsvp(&pool, &events, "s1", "bob").await.unwrap();
        rsvp(&pool, &events, "s1", "carol").await.unwrap();
        // bob retries; carol must not move ahead of him.
        assert_eq!(
            rsvp(&pool, &events, "s1", "bob").await.unwrap(),
            RsvpOutcome::Waitlisted
        );

        let waitlist = waitlist_repo::list_for_shift(&pool, "s1").await.unwrap();
        let order: Vec<&str> = waitlist.iter().map(|w| w.user_id.as_str()).collect();
        assert_eq!(order, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn zero_capacity_is_unbounded() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 0).await;

        for user in ["u1", "u2", "u3", "u4", "u5"] {
            assert_eq!(
                rsvp(&pool, &events, "s1", user).await.unwrap(),
                RsvpOutcome::Reserved
            );
        }
        let going = crate::database::shift_repo::count_going(&pool, "s1")
            .await
            .unwrap();
        assert_eq!(going, 5);
    }

    #[tokio::test]
    async fn rsvp_unknown_shift_fails() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        let err = rsvp(&pool, &events, "missing", "alice").await.unwrap_err();
        assert!(matches!(err, CoordinatorError::ShiftNotFound));
    }

    #[tokio::test]
    async fn concurrent_rsvps_never_exceed_capacity() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 3).await;

        let mut handles = Vec::new();
        for i in 0..10 {
            let pool = pool.clone();
            let events = events.clone();
            handles.push(tokio::spawn(async move {
                rsvp(&pool, &events, "s1", &format!("user-{i}")).await
            }));
        }

        let mut reserved = 0;
        let mut waitlisted = 0;
        for h in handles {
            match h.await.unwrap().unwrap() {
                RsvpOutcome::Reserved => reserved += 1,
                RsvpOutcome::Waitlisted => waitlisted += 1,
            }
        }
        assert_eq!(reserved, 3);
        assert_eq!(waitlisted, 7);

        let going = crate::database::shift_repo::count_going(&pool, "s1")
            .await
            .unwrap();
        assert_eq!(going, 3);
    }

    #[tokio::test]
    async fn cancel_promotes_earliest_waitlisted_user() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 1).await;

        rsvp(&pool, &events, "s1", "x").await.unwrap();
        rsvp(&pool, &events, "s1", "y").await.unwrap();

        cancel(&pool, &events, "s1", "x", "x", Role::User)
            .await
            .unwrap();

        assert_eq!(status_of(&pool, "s1", "x").await.as_deref(), Some("cancelled"));
        assert_eq!(status_of(&pool, "s1", "y").await.as_deref(), Some("going"));
        let going = crate::database::shift_repo::count_going(&pool, "s1")
            .await
            .unwrap();
        assert_eq!(going, 1);
        let waitlist = waitlist_repo::list_for_shift(&pool, "s1").await.unwrap();
        assert!(waitlist.is_empty());
    }

    #[tokio::test]
    async fn waitlist_promotion_is_fifo() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 1).await;

        rsvp(&pool, &events, "s1", "holder").await.unwrap();
        rsvp(&pool, &events, "s1", "first").await.unwrap();
        rsvp(&pool, &events, "s1", "second").await.unwrap();

        cancel(&pool, &events, "s1", "holder", "holder", Role::User)
            .await
            .unwrap();

        assert_eq!(status_of(&pool, "s1", "first").await.as_deref(), Some("going"));
        assert!(status_of(&pool, "s1", "second").await.is_none());
        let waitlist = waitlist_repo::list_for_shift(&pool, "s1").await.unwrap();
        assert_eq!(waitlist.len(), 1);
        assert_eq!(waitlist[0].user_id, "second");
    }

    #[tokio::test]
    async fn example_scenario_capacity_two() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 2).await;

        assert_eq!(
            rsvp(&pool, &events, "s1", "a").await.unwrap(),
            RsvpOutcome::Reserved
        );
        assert_eq!(
            rsvp(&pool, &events, "s1", "b").await.unwrap(),
            RsvpOutcome::Reserved
        );
        assert_eq!(
            rsvp(&pool, &events, "s1", "c").await.unwrap(),
            RsvpOutcome::Waitlisted
        );

        cancel(&pool, &events, "s1", "a", "a", Role::User)
            .await
            .unwrap();

        assert_eq!(status_of(&pool, "s1", "b").await.as_deref(), Some("going"));
        assert_eq!(status_of(&pool, "s1", "c").await.as_deref(), Some("going"));
        assert_eq!(status_of(&pool, "s1", "a").await.as_deref(), Some("cancelled"));
        let going = crate::database::shift_repo::count_going(&pool, "s1")
            .await
            .unwrap();
        assert_eq!(going, 2);
    }

    #[tokio::test]
    async fn cancel_without_signup_records_cancelled() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 2).await;

        cancel(&pool, &events, "s1", "ghost", "ghost", Role::User)
            .await
            .unwrap();
        assert_eq!(
            status_of(&pool, "s1", "ghost").await.as_deref(),
            Some("cancelled")
        );
    }

    #[tokio::test]
    async fn cancel_removes_own_waitlist_entry_without_promotion() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 1).await;

        rsvp(&pool, &events, "s1", "holder").await.unwrap();
        rsvp(&pool, &events, "s1", "queued").await.unwrap();

        cancel(&pool, &events, "s1", "queued", "queued", Role::User)
            .await
            .unwrap();

        // No seat was freed, so the holder keeps it and nobody is promoted.
        assert_eq!(
            status_of(&pool, "s1", "holder").await.as_deref(),
            Some("going")
        );
        let waitlist = waitlist_repo::list_for_shift(&pool, "s1").await.unwrap();
        assert!(waitlist.is_empty());
    }

    #[tokio::test]
    async fn force_cancel_requires_elevated_role() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 2).await;

        rsvp(&pool, &events, "s1", "victim").await.unwrap();

        let err = cancel(&pool, &events, "s1", "victim", "rando", Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::Forbidden));

        cancel(&pool, &events, "s1", "victim", "mod", Role::Moderator)
            .await
            .unwrap();
        assert_eq!(
            status_of(&pool, "s1", "victim").await.as_deref(),
            Some("cancelled")
        );
    }

    #[tokio::test]
    async fn reserving_a_seat_clears_the_callers_waitlist_entry() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 2).await;

        rsvp(&pool, &events, "s1", "a").await.unwrap();
        rsvp(&pool, &events, "s1", "b").await.unwrap();
        rsvp(&pool, &events, "s1", "c").await.unwrap();
        rsvp(&pool, &events, "s1", "d").await.unwrap();

        // Marking a attended lowers the going count without promoting anyone,
        // so c's retry lands a seat while c is still queued.
        attendance_service::mark_attendance(&pool, &events, "s1", "a", true, Role::Admin)
            .await
            .unwrap();
        assert_eq!(
            rsvp(&pool, &events, "s1", "c").await.unwrap(),
            RsvpOutcome::Reserved
        );

        let waitlist = waitlist_repo::list_for_shift(&pool, "s1").await.unwrap();
        let queued: Vec<&str> = waitlist.iter().map(|w| w.user_id.as_str()).collect();
        assert_eq!(queued, vec!["d"]);

        // The next freed seat goes to d, not to c's stale entry.
        cancel(&pool, &events, "s1", "b", "b", Role::User)
            .await
            .unwrap();
        assert_eq!(status_of(&pool, "s1", "d").await.as_deref(), Some("going"));
        let waitlist = waitlist_repo::list_for_shift(&pool, "s1").await.unwrap();
        assert!(waitlist.is_empty());
        let going = crate::database::shift_repo::count_going(&pool, "s1")
            .await
            .unwrap();
        assert_eq!(going, 2);
    }

    #[tokio::test]
    async fn promotion_skips_waitlist_heads_that_already_hold_a_seat() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 2).await;

        rsvp(&pool, &events, "s1", "x").await.unwrap();
        rsvp(&pool, &events, "s1", "y").await.unwrap();

        // Seed a stale entry for x (who already holds a seat) ahead of z.
        for (user, joined_at) in [("x", "2026-09-01T08:00:01Z"), ("z", "2026-09-01T08:00:02Z")] {
            sqlx::query("INSERT INTO shift_waitlist (shift_id, user_id, joined_at) VALUES ('s1', ?1, ?2)")
                .bind(user)
                .bind(joined_at)
                .execute(&pool)
                .await
                .unwrap();
        }

        cancel(&pool, &events, "s1", "y", "y", Role::User)
            .await
            .unwrap();

        assert_eq!(status_of(&pool, "s1", "x").await.as_deref(), Some("going"));
        assert_eq!(status_of(&pool, "s1", "z").await.as_deref(), Some("going"));
        let waitlist = waitlist_repo::list_for_shift(&pool, "s1").await.unwrap();
        assert!(waitlist.is_empty());
    }

    #[tokio::test]
    async fn re_rsvp_after_attendance_resets_checkin_fields() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        seed_shift(&pool, "s1", 2).await;

        rsvp(&pool, &events, "s1", "alice").await.unwrap();
        attendance_service::mark_attendance(&pool, &events, "s1", "alice", true, Role::Admin)
            .await
            .unwrap();

        rsvp(&pool, &events, "s1", "alice").await.unwrap();
        let row = signup_repo::load_signup(&pool, "s1", "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, "going");
        assert!(row.checked_in_at.is_none());
        assert!(row.checkin_method.is_none());

        // Cancelling an attended row sheds the check-in fields as well.
        attendance_service::mark_attendance(&pool, &events, "s1", "alice", true, Role::Admin)
            .await
            .unwrap();
        cancel(&pool, &events, "s1", "alice", "alice", Role::User)
            .await
            .unwrap();
        let row = signup_repo::load_signup(&pool, "s1", "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.status, "cancelled");
        assert!(row.checked_in_at.is_none());
        assert!(row.checkin_method.is_none());
    }

    #[tokio::test]
    async fn cancel_emits_promotion_event() {
        let pool = setup_pool().await;
        let events = EventBus::default();
        let mut rx = events.subscribe();
        seed_shift(&pool, "s1", 1).await;

        rsvp(&pool, &events, "s1", "x").await.unwrap();
        rsvp(&pool, &events, "s1", "y").await.unwrap();
        cancel(&pool, &events, "s1", "x", "x", Role::User)
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if let DomainEvent::SignupChanged {
                user_id, status, ..
            } = ev
            {
                seen.push((user_id, status));
            }
        }
        assert!(seen.contains(&("x".to_string(), SignupStatus::Going)));
        assert!(seen.contains(&("x".to_string(), SignupStatus::Cancelled)));
        assert!(seen.contains(&("y".to_string(), SignupStatus::Going)));
    }
}
