//! End-to-end booking flows through the service with in-memory providers.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, NaiveTime, Utc};
use mentorbook_booking::mocks::{
    InMemoryAvailability, InMemoryBookings, InMemoryCatalog, InMemoryDirectory, InMemoryFeedback,
    RecordingDispatcher,
};
use mentorbook_booking::prelude::*;
use mentorbook_booking::{order_reference, parse_order_reference};
use mentorbook_testing::mocks::FixedClock;
use std::sync::Arc;

type TestService = BookingService<
    InMemoryCatalog,
    InMemoryAvailability,
    InMemoryBookings,
    InMemoryFeedback,
    InMemoryDirectory,
    InMemoryDirectory,
>;

struct Harness {
    service: TestService,
    catalog: InMemoryCatalog,
    bookings: InMemoryBookings,
    dispatcher: RecordingDispatcher,
    mentor: UserId,
}

/// Clock fixed to Monday 2025-06-02 09:00 UTC; availability Monday
/// 09:00-10:00 UTC the following week, offering 30 min with 5/5 buffers.
fn harness(price: Money) -> (Harness, Offering) {
    let clock = FixedClock::new("2025-06-02T09:00:00Z".parse().unwrap());
    let catalog = InMemoryCatalog::new();
    let availability = InMemoryAvailability::new();
    let bookings = InMemoryBookings::new();
    let feedback = InMemoryFeedback::new();
    let directory = InMemoryDirectory::new();
    let dispatcher = RecordingDispatcher::new();

    let mentor = UserId::new();
    let offering = Offering {
        id: OfferingId::new(),
        mentor_id: mentor,
        title: "Resume review".to_string(),
        duration_minutes: 30,
        buffer_before_minutes: 5,
        buffer_after_minutes: 5,
        max_bookings_per_day: 5,
        advance_booking_days: 30,
        min_notice_hours: 24,
        price,
        status: OfferingStatus::Active,
    };
    catalog.put(offering.clone());
    availability.put(
        mentor,
        vec![AvailabilitySlot {
            mentor_id: mentor,
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            timezone: chrono_tz::UTC,
        }],
    );

    let service = BookingService::new(
        catalog.clone(),
        availability.clone(),
        bookings.clone(),
        feedback,
        directory.clone(),
        directory,
        Arc::new(clock),
        Arc::new(dispatcher.clone()),
        BookingConfig::new(),
    );

    (Harness { service, catalog, bookings, dispatcher, mentor }, offering)
}

fn monday(hhmm: &str) -> DateTime<Utc> {
    format!("2025-06-09T{hhmm}:00Z").parse().unwrap()
}

#[tokio::test]
async fn buffer_scenario_from_the_availability_rules() {
    let (h, offering) = harness(Money::from_dollars(25));

    // First mentee books 09:00 -> pending.
    let first = h.service.create_booking(UserId::new(), offering.id, monday("09:00")).await.unwrap();
    assert_eq!(first.status, BookingStatus::Pending);

    // Second mentee requests 09:20: 09:00 + 30min + 5min after-buffer runs
    // to 09:35, past the 09:20 start (minus its own 5min before-buffer).
    let conflict =
        h.service.create_booking(UserId::new(), offering.id, monday("09:20")).await.unwrap_err();
    assert_eq!(conflict, BookingError::SlotConflict);

    // Third mentee requests 09:40: 09:40 - 5min = 09:35 touches the first
    // span's end exactly; half-open spans touch without conflicting.
    let third = h.service.create_booking(UserId::new(), offering.id, monday("09:40")).await;
    assert!(third.is_ok(), "{third:?}");

    assert_eq!(h.bookings.len(), 2);
    let spans = h.bookings.occupied_spans(h.mentor);
    assert!(!spans[0].overlaps(&spans[1]));
}

#[tokio::test]
async fn duration_survives_offering_edits() {
    let (h, mut offering) = harness(Money::from_dollars(25));

    let booking = h.service.create_booking(UserId::new(), offering.id, monday("09:00")).await.unwrap();
    assert_eq!(booking.duration_minutes, 30);

    // The mentor later edits the offering; existing bookings keep their copy.
    offering.duration_minutes = 90;
    h.catalog.put(offering);

    let (reloaded, _) =
        h.service.booking_for(booking.mentee_id, booking.id).await.unwrap();
    assert_eq!(reloaded.duration_minutes, 30);
}

#[tokio::test]
async fn full_lifecycle_with_paid_offering() {
    let (h, offering) = harness(Money::from_dollars(25));
    let mentee = UserId::new();

    let booking = h.service.create_booking(mentee, offering.id, monday("09:00")).await.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Pending);

    // Gateway settles the charge: paid + confirmed via the payment source.
    let reference = order_reference(booking.id, monday("09:00"));
    assert_eq!(parse_order_reference(&reference).unwrap(), booking.id);
    let settled = h.service.settle_payment(&reference, PaymentOutcome::Succeeded).await.unwrap();
    assert_eq!(settled.payment_status, PaymentStatus::Paid);
    assert_eq!(settled.status, BookingStatus::Confirmed);

    // Mentor completes after the session.
    let completed = h
        .service
        .patch_booking(
            h.mentor,
            booking.id,
            BookingPatch { status: Some(BookingStatus::Completed), ..BookingPatch::default() },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    // Mentee rates once.
    let rated = h
        .service
        .patch_booking(
            mentee,
            booking.id,
            BookingPatch {
                mentee_rating: Some(5),
                mentee_feedback: Some("great advice".to_string()),
                ..BookingPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(rated.mentee_rating.map(|r| r.value()), Some(5));

    // Terminal state: no further transitions.
    let err = h
        .service
        .patch_booking(
            h.mentor,
            booking.id,
            BookingPatch { status: Some(BookingStatus::Cancelled), ..BookingPatch::default() },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Cancelled,
        }
    );

    // Notifications flowed for request, settlement, and completion.
    let kinds: Vec<_> = h.dispatcher.sent().iter().map(|n| n.kind).collect();
    assert!(kinds.contains(&NotificationKind::BookingRequested));
    assert!(kinds.contains(&NotificationKind::PaymentSettled));
    assert!(kinds.contains(&NotificationKind::BookingCompleted));
}

#[tokio::test]
async fn free_offering_still_requires_mentor_confirmation() {
    let (h, offering) = harness(Money::from_cents(0));
    let mentee = UserId::new();

    let booking = h.service.create_booking(mentee, offering.id, monday("09:00")).await.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.status, BookingStatus::Pending);

    // Mentee cannot confirm their own booking.
    let err = h
        .service
        .patch_booking(
            mentee,
            booking.id,
            BookingPatch { status: Some(BookingStatus::Confirmed), ..BookingPatch::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden { .. }));

    let confirmed = h
        .service
        .patch_booking(
            h.mentor,
            booking.id,
            BookingPatch { status: Some(BookingStatus::Confirmed), ..BookingPatch::default() },
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn cancellation_records_side_and_reason() {
    let (h, offering) = harness(Money::from_dollars(25));
    let mentee = UserId::new();
    let booking = h.service.create_booking(mentee, offering.id, monday("09:00")).await.unwrap();

    let cancelled = h
        .service
        .patch_booking(
            mentee,
            booking.id,
            BookingPatch {
                status: Some(BookingStatus::Cancelled),
                cancellation_reason: Some("found another mentor".to_string()),
                ..BookingPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by, Some(CancelledBy::Mentee));
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("found another mentor"));

    // The cancelled booking no longer occupies the slot.
    let rebooked = h.service.create_booking(UserId::new(), offering.id, monday("09:00")).await;
    assert!(rebooked.is_ok());
}

#[tokio::test]
async fn concurrent_creations_resolve_to_one_booking() {
    let (h, offering) = harness(Money::from_dollars(25));

    let (a, b) = tokio::join!(
        h.service.create_booking(UserId::new(), offering.id, monday("09:00")),
        h.service.create_booking(UserId::new(), offering.id, monday("09:15")),
    );

    // Both validated against the same empty snapshot; the repository's
    // atomic insert lets exactly one through.
    let outcomes = [a, b];
    let accepted = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(BookingError::SlotConflict)))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(h.bookings.len(), 1);
}

#[tokio::test]
async fn strangers_cannot_read_bookings() {
    let (h, offering) = harness(Money::from_dollars(25));
    let booking = h.service.create_booking(UserId::new(), offering.id, monday("09:00")).await.unwrap();

    let err = h.service.booking_for(UserId::new(), booking.id).await.unwrap_err();
    assert!(matches!(err, BookingError::Forbidden { .. }));

    let (_, party) = h.service.booking_for(h.mentor, booking.id).await.unwrap();
    assert_eq!(party, Party::Mentor);
}

#[tokio::test]
async fn meeting_link_and_notes_are_mentor_writes() {
    let (h, offering) = harness(Money::from_dollars(25));
    let mentee = UserId::new();
    let booking = h.service.create_booking(mentee, offering.id, monday("09:00")).await.unwrap();

    let updated = h
        .service
        .patch_booking(
            h.mentor,
            booking.id,
            BookingPatch {
                status: Some(BookingStatus::Confirmed),
                meeting_link: Some(Some("https://meet.example.com/abc".to_string())),
                mentor_notes: Some(Some("wants system design focus".to_string())),
                ..BookingPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.meeting_link.as_deref(), Some("https://meet.example.com/abc"));
    assert_eq!(updated.mentor_notes.as_deref(), Some("wants system design focus"));

    let err = h
        .service
        .patch_booking(
            mentee,
            booking.id,
            BookingPatch {
                meeting_link: Some(Some("https://evil.example.com".to_string())),
                ..BookingPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Forbidden { .. }));
}

#[tokio::test]
async fn payment_failure_keeps_booking_pending() {
    let (h, offering) = harness(Money::from_dollars(25));
    let booking = h.service.create_booking(UserId::new(), offering.id, monday("09:00")).await.unwrap();

    let reference = order_reference(booking.id, monday("09:00"));
    let settled = h.service.settle_payment(&reference, PaymentOutcome::Failed).await.unwrap();
    assert_eq!(settled.payment_status, PaymentStatus::Failed);
    assert_eq!(settled.status, BookingStatus::Pending);
}

#[tokio::test]
async fn unknown_offering_is_not_found() {
    let (h, _) = harness(Money::from_dollars(25));
    let err = h
        .service
        .create_booking(UserId::new(), OfferingId::new(), monday("09:00"))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::NotFound { entity: "offering" });
}

#[tokio::test]
async fn paused_offering_is_unavailable() {
    let (h, mut offering) = harness(Money::from_dollars(25));
    offering.status = OfferingStatus::Paused;
    h.catalog.put(offering.clone());

    let err =
        h.service.create_booking(UserId::new(), offering.id, monday("09:00")).await.unwrap_err();
    assert_eq!(err, BookingError::OfferingUnavailable);
}

#[tokio::test]
async fn replace_availability_validates_slots() {
    let (h, _) = harness(Money::from_dollars(25));

    let bad = vec![AvailabilitySlot {
        mentor_id: h.mentor,
        day_of_week: 9,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        timezone: chrono_tz::UTC,
    }];
    let err = h.service.replace_availability(h.mentor, bad).await.unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    let good = vec![
        AvailabilitySlot {
            mentor_id: h.mentor,
            day_of_week: 3,
            start_time: NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            timezone: chrono_tz::Europe::Berlin,
        },
        AvailabilitySlot {
            mentor_id: h.mentor,
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            timezone: chrono_tz::Europe::Berlin,
        },
    ];
    let stored = h.service.replace_availability(h.mentor, good).await.unwrap();
    // Returned ordered by (day_of_week, start_time).
    assert_eq!(stored[0].day_of_week, 1);
    assert_eq!(stored[1].day_of_week, 3);
}
