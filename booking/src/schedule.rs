//! Slot-conflict and availability math.
//!
//! A booking occupies `[start - buffer_before, start + duration + buffer_after)`
//! on the mentor's calendar. Buffers are mandatory idle time that counts
//! toward conflict detection but not toward billed duration. All spans are
//! half-open UTC intervals; availability windows are declared in a local
//! timezone and converted before comparison.

use crate::types::{AvailabilitySlot, Booking, Offering};
use chrono::{DateTime, Datelike, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` interval on the mentor's calendar, buffers
/// included.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferedSpan {
    /// Span start (session start minus the before-buffer), UTC
    pub start: DateTime<Utc>,
    /// Span end (session end plus the after-buffer), UTC
    pub end: DateTime<Utc>,
}

impl BufferedSpan {
    /// Build the buffered span for a session.
    #[must_use]
    pub fn new(
        scheduled_at: DateTime<Utc>,
        duration_minutes: u32,
        buffer_before_minutes: u32,
        buffer_after_minutes: u32,
    ) -> Self {
        Self {
            start: scheduled_at - Duration::minutes(i64::from(buffer_before_minutes)),
            end: scheduled_at
                + Duration::minutes(i64::from(duration_minutes))
                + Duration::minutes(i64::from(buffer_after_minutes)),
        }
    }

    /// The span a booking occupies, with its offering's buffers.
    #[must_use]
    pub fn of_booking(booking: &Booking, offering: &Offering) -> Self {
        Self::new(
            booking.scheduled_at,
            booking.duration_minutes,
            offering.buffer_before_minutes,
            offering.buffer_after_minutes,
        )
    }

    /// Half-open overlap test: `[a1, a2)` and `[b1, b2)` conflict iff
    /// `a1 < b2 && b1 < a2`.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Whether a session *start* falls inside one of the mentor's weekly
/// windows.
///
/// The precondition is on the start instant only: sessions near the end
/// of a window may run past it, which is the mentor's declared policy,
/// not a conflict. Each window is evaluated in its own declared timezone:
/// the start is converted, matched against the window's day of week
/// (0 = Sunday), and its local time must fall in
/// `[start_time, end_time)`.
#[must_use]
pub fn within_availability(slots: &[AvailabilitySlot], start: DateTime<Utc>) -> bool {
    slots.iter().any(|slot| {
        let local = start.with_timezone(&slot.timezone);

        #[allow(clippy::cast_possible_truncation)]
        let day = local.weekday().num_days_from_sunday() as u8;

        day == slot.day_of_week
            && local.time() >= slot.start_time
            && local.time() < slot.end_time
    })
}

/// The timezone the mentor's daily cap is counted in: the declared
/// timezone of their availability, falling back to UTC for mentors with
/// no declared windows.
#[must_use]
pub fn mentor_timezone(slots: &[AvailabilitySlot]) -> Tz {
    slots.first().map_or(chrono_tz::UTC, |slot| slot.timezone)
}

/// Count bookings that fall on the same calendar day as `at`, in the
/// given timezone. Callers filter to the statuses that count toward the
/// cap (pending and confirmed).
pub fn bookings_on_day<'a>(
    bookings: impl Iterator<Item = &'a Booking>,
    at: DateTime<Utc>,
    tz: Tz,
) -> usize {
    let day = at.with_timezone(&tz).date_naive();
    bookings
        .filter(|b| b.scheduled_at.with_timezone(&tz).date_naive() == day)
        .count()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{
        BookingId, BookingStatus, Money, OfferingId, OfferingStatus, PaymentStatus, UserId,
    };
    use chrono::NaiveTime;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn test_booking(start: &str, duration: u32) -> Booking {
        Booking {
            id: BookingId::new(),
            mentor_id: UserId::new(),
            mentee_id: UserId::new(),
            offering_id: OfferingId::new(),
            scheduled_at: utc(start),
            duration_minutes: duration,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            meeting_link: None,
            mentor_notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            mentee_rating: None,
            mentee_feedback: None,
            created_at: utc(start),
            updated_at: utc(start),
        }
    }

    fn test_offering(buffer_before: u32, buffer_after: u32) -> Offering {
        Offering {
            id: OfferingId::new(),
            mentor_id: UserId::new(),
            title: "Career chat".to_string(),
            duration_minutes: 30,
            buffer_before_minutes: buffer_before,
            buffer_after_minutes: buffer_after,
            max_bookings_per_day: 5,
            advance_booking_days: 30,
            min_notice_hours: 24,
            price: Money::from_cents(0),
            status: OfferingStatus::Active,
        }
    }

    #[test]
    fn half_open_spans_touching_do_not_overlap() {
        let a = BufferedSpan::new(utc("2025-06-02T09:00:00Z"), 30, 0, 5);
        let b = BufferedSpan::new(utc("2025-06-02T09:35:00Z"), 30, 0, 0);
        assert_eq!(a.end, b.start);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn buffered_spans_overlap() {
        // 09:00 + 30min + 5min after-buffer ends 09:35 > a 09:20 start
        let first = BufferedSpan::new(utc("2025-06-02T09:00:00Z"), 30, 5, 5);
        let second = BufferedSpan::new(utc("2025-06-02T09:20:00Z"), 30, 5, 5);
        assert!(first.overlaps(&second));
    }

    #[test]
    fn span_of_booking_uses_offering_buffers() {
        let booking = test_booking("2025-06-02T09:00:00Z", 30);
        let span = BufferedSpan::of_booking(&booking, &test_offering(5, 10));
        assert_eq!(span.start, utc("2025-06-02T08:55:00Z"));
        assert_eq!(span.end, utc("2025-06-02T09:40:00Z"));
    }

    #[test]
    fn availability_window_covers_starts() {
        // Monday 09:00-10:00 UTC; 2025-06-02 is a Monday.
        let slot = AvailabilitySlot {
            mentor_id: UserId::new(),
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            timezone: chrono_tz::UTC,
        };
        assert!(within_availability(&[slot.clone()], utc("2025-06-02T09:00:00Z")));
        // A late start may run past the window end; only the start matters.
        assert!(within_availability(&[slot.clone()], utc("2025-06-02T09:40:00Z")));
        // The window end itself is exclusive.
        assert!(!within_availability(&[slot.clone()], utc("2025-06-02T10:00:00Z")));
        // Wrong day
        assert!(!within_availability(&[slot], utc("2025-06-03T09:00:00Z")));
    }

    #[test]
    fn availability_respects_slot_timezone() {
        // 09:00-17:00 in New York. 13:00 UTC on 2025-06-02 is 09:00 EDT.
        let slot = AvailabilitySlot {
            mentor_id: UserId::new(),
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            timezone: chrono_tz::America::New_York,
        };
        assert!(within_availability(&[slot.clone()], utc("2025-06-02T13:00:00Z")));
        // 09:00 UTC is 05:00 EDT, outside the window.
        assert!(!within_availability(&[slot], utc("2025-06-02T09:00:00Z")));
    }

    #[test]
    fn daily_count_uses_mentor_timezone() {
        // 2025-06-02T23:30Z is already June 3rd in Auckland (UTC+12).
        let late = test_booking("2025-06-02T23:30:00Z", 30);
        let early = test_booking("2025-06-02T01:00:00Z", 30);
        let bookings = [late, early];

        let same_day_utc = bookings_on_day(
            bookings.iter(),
            utc("2025-06-02T12:00:00Z"),
            chrono_tz::UTC,
        );
        assert_eq!(same_day_utc, 2);

        let auckland = bookings_on_day(
            bookings.iter(),
            utc("2025-06-02T23:45:00Z"),
            chrono_tz::Pacific::Auckland,
        );
        assert_eq!(auckland, 1);
    }

    #[test]
    fn mentor_timezone_defaults_to_utc() {
        assert_eq!(mentor_timezone(&[]), chrono_tz::UTC);
    }
}
