//! Booking reducer: commands, events, and the schedule aggregate.
//!
//! The aggregate is one mentor's schedule: their offerings (read model),
//! their weekly availability, and their open bookings. Commands are
//! validated against this state; valid commands produce events; events are
//! applied to the state and persisted by the imperative shell
//! ([`crate::service::BookingService`]).
//!
//! The in-memory conflict check here is advisory under concurrency (two
//! racing requests each see a clean schedule). The storage layer's
//! exclusion constraint is the authority; the shell maps its violation to
//! the same `SlotConflict` error.

use crate::error::BookingError;
use crate::lifecycle::{
    self, Party, TransitionSource, authorize_transition, resolve_party,
};
use crate::providers::{Notification, NotificationDispatcher, NotificationKind};
use crate::schedule::{BufferedSpan, bookings_on_day, mentor_timezone, within_availability};
use crate::types::{
    AvailabilitySlot, Booking, BookingId, BookingStatus, CancelledBy, Offering, OfferingId,
    OfferingStatus, PaymentOutcome, PaymentStatus, Rating, UserId,
};
use chrono::{DateTime, Duration, Utc};
use mentorbook_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use mentorbook_macros::Action;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the schedule aggregate.
///
/// Commands are requests that must be validated; events are facts recorded
/// after validation and are what the shell persists.
#[derive(Action, Clone, Debug, Serialize)]
pub enum BookingAction {
    // Commands
    /// Mentee requests a session against an offering
    #[command]
    RequestBooking {
        /// Pre-generated booking ID (callers own idempotency)
        booking_id: BookingId,
        /// The requesting mentee
        mentee_id: UserId,
        /// The offering being booked
        offering_id: OfferingId,
        /// Requested session start, UTC
        start: DateTime<Utc>,
    },

    /// Confirm a pending booking
    #[command]
    ConfirmBooking {
        /// Booking to confirm
        booking_id: BookingId,
        /// Acting user
        actor: UserId,
    },

    /// Cancel a pending or confirmed booking
    #[command]
    CancelBooking {
        /// Booking to cancel
        booking_id: BookingId,
        /// Acting user
        actor: UserId,
        /// Optional free-text reason
        reason: Option<String>,
    },

    /// Mark a confirmed booking completed
    #[command]
    CompleteBooking {
        /// Booking to complete
        booking_id: BookingId,
        /// Acting user
        actor: UserId,
    },

    /// Mark a confirmed booking as a no-show
    #[command]
    MarkNoShow {
        /// Booking to mark
        booking_id: BookingId,
        /// Acting user
        actor: UserId,
    },

    /// Payment gateway reported an outcome for this booking
    #[command]
    RecordPaymentOutcome {
        /// Booking the order reference resolved to
        booking_id: BookingId,
        /// What the gateway reported
        outcome: PaymentOutcome,
    },

    /// Set or clear the meeting link (mentor only)
    #[command]
    SetMeetingLink {
        /// Booking to update
        booking_id: BookingId,
        /// Acting user
        actor: UserId,
        /// New link, or `None` to clear
        link: Option<String>,
    },

    /// Set or clear private mentor notes (mentor only)
    #[command]
    SetMentorNotes {
        /// Booking to update
        booking_id: BookingId,
        /// Acting user
        actor: UserId,
        /// New notes, or `None` to clear
        notes: Option<String>,
    },

    /// Mentee rates a completed session (write-once)
    #[command]
    RateSession {
        /// Booking being rated
        booking_id: BookingId,
        /// Acting user
        actor: UserId,
        /// Raw rating value, validated to 1..=5
        rating: u8,
        /// Optional feedback text
        feedback: Option<String>,
    },

    // Events
    /// A booking passed creation validation
    #[event]
    BookingRequested {
        /// The fully built booking (status pending)
        booking: Booking,
    },

    /// The booking was confirmed
    #[event]
    BookingConfirmed {
        /// Booking that was confirmed
        booking_id: BookingId,
        /// Who or what confirmed it
        source: TransitionSource,
        /// When
        at: DateTime<Utc>,
    },

    /// The booking was cancelled
    #[event]
    BookingCancelled {
        /// Booking that was cancelled
        booking_id: BookingId,
        /// Which side cancelled
        cancelled_by: CancelledBy,
        /// Optional free-text reason
        reason: Option<String>,
        /// When
        at: DateTime<Utc>,
    },

    /// The session took place
    #[event]
    BookingCompleted {
        /// Booking that completed
        booking_id: BookingId,
        /// When
        at: DateTime<Utc>,
    },

    /// The mentee did not attend
    #[event]
    BookingNoShow {
        /// Booking that was marked
        booking_id: BookingId,
        /// When
        at: DateTime<Utc>,
    },

    /// A payment outcome was recorded
    #[event]
    PaymentRecorded {
        /// Booking the payment concerns
        booking_id: BookingId,
        /// Resulting payment status
        status: PaymentStatus,
        /// When
        at: DateTime<Utc>,
    },

    /// The meeting link changed
    #[event]
    MeetingLinkUpdated {
        /// Booking that was updated
        booking_id: BookingId,
        /// New link
        link: Option<String>,
        /// When
        at: DateTime<Utc>,
    },

    /// The private mentor notes changed
    #[event]
    MentorNotesUpdated {
        /// Booking that was updated
        booking_id: BookingId,
        /// New notes
        notes: Option<String>,
        /// When
        at: DateTime<Utc>,
    },

    /// The mentee rated the session
    #[event]
    SessionRated {
        /// Booking that was rated
        booking_id: BookingId,
        /// Validated rating
        rating: Rating,
        /// Optional feedback text
        feedback: Option<String>,
        /// When
        at: DateTime<Utc>,
    },

    /// A command failed validation
    #[event]
    CommandRejected {
        /// Why the command was rejected
        error: BookingError,
    },
}

// ============================================================================
// State
// ============================================================================

/// One mentor's schedule: offerings, availability, and open bookings.
#[derive(Clone, Debug, Default)]
pub struct BookingState {
    /// The mentor's offerings, keyed by ID (read model)
    pub offerings: HashMap<OfferingId, Offering>,
    /// The mentor's weekly availability windows (read model)
    pub availability: Vec<AvailabilitySlot>,
    /// Bookings loaded into this aggregate
    pub bookings: HashMap<BookingId, Booking>,
    /// The most recent command rejection, if any
    pub last_error: Option<BookingError>,
}

impl BookingState {
    /// Creates an empty schedule state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a booking in the aggregate
    #[must_use]
    pub fn booking(&self, id: &BookingId) -> Option<&Booking> {
        self.bookings.get(id)
    }

    /// Take the last rejection out of the state
    pub fn take_error(&mut self) -> Option<BookingError> {
        self.last_error.take()
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the booking reducer.
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Clock for notice/advance checks and event timestamps
    pub clock: Arc<dyn Clock>,
    /// Best-effort notification delivery
    pub notifications: Arc<dyn NotificationDispatcher>,
}

impl BookingEnvironment {
    /// Creates a new `BookingEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, notifications: Arc<dyn NotificationDispatcher>) -> Self {
        Self { clock, notifications }
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the schedule aggregate.
#[derive(Clone, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a `RequestBooking` command and builds the booking.
    ///
    /// Preconditions are checked in a fixed order so each failure mode is
    /// distinct and deterministic: offering open, notice period, advance
    /// window, availability window, slot conflict, daily cap.
    fn validate_request_booking(
        state: &BookingState,
        booking_id: BookingId,
        mentee_id: UserId,
        offering_id: OfferingId,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let offering = state
            .offerings
            .get(&offering_id)
            .ok_or(BookingError::NotFound { entity: "offering" })?;

        if offering.status != OfferingStatus::Active {
            return Err(BookingError::OfferingUnavailable);
        }

        if mentee_id == offering.mentor_id {
            return Err(BookingError::Validation(
                "mentors cannot book their own offerings".to_string(),
            ));
        }

        if start < now + Duration::hours(i64::from(offering.min_notice_hours)) {
            return Err(BookingError::InsufficientNotice {
                required_hours: offering.min_notice_hours,
            });
        }

        if start > now + Duration::days(i64::from(offering.advance_booking_days)) {
            return Err(BookingError::TooFarInAdvance {
                max_days: offering.advance_booking_days,
            });
        }

        if !within_availability(&state.availability, start) {
            return Err(BookingError::OutsideAvailability);
        }

        let requested = BufferedSpan::new(
            start,
            offering.duration_minutes,
            offering.buffer_before_minutes,
            offering.buffer_after_minutes,
        );
        for existing in state.bookings.values().filter(|b| b.occupies_slot()) {
            let (before, after) = state
                .offerings
                .get(&existing.offering_id)
                .map_or((0, 0), |o| (o.buffer_before_minutes, o.buffer_after_minutes));
            let span =
                BufferedSpan::new(existing.scheduled_at, existing.duration_minutes, before, after);
            if requested.overlaps(&span) {
                return Err(BookingError::SlotConflict);
            }
        }

        let tz = mentor_timezone(&state.availability);
        let booked_that_day =
            bookings_on_day(state.bookings.values().filter(|b| b.occupies_slot()), start, tz);
        if booked_that_day >= offering.max_bookings_per_day as usize {
            return Err(BookingError::DailyLimitReached { limit: offering.max_bookings_per_day });
        }

        // Free offerings never see the payment gateway: mark them paid up
        // front. Confirmation still requires the mentor.
        let payment_status =
            if offering.price.is_zero() { PaymentStatus::Paid } else { PaymentStatus::Pending };

        Ok(Booking {
            id: booking_id,
            mentor_id: offering.mentor_id,
            mentee_id,
            offering_id,
            scheduled_at: start,
            duration_minutes: offering.duration_minutes,
            status: BookingStatus::Pending,
            payment_status,
            meeting_link: None,
            mentor_notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            mentee_rating: None,
            mentee_feedback: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Resolve the actor's party and authorize a status transition.
    fn authorize(
        state: &BookingState,
        booking_id: BookingId,
        actor: UserId,
        target: BookingStatus,
    ) -> Result<Party, BookingError> {
        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or(BookingError::NotFound { entity: "booking" })?;
        let party = resolve_party(booking, actor)?;
        authorize_transition(booking.status, target, TransitionSource::Party(party))?;
        Ok(party)
    }

    /// Applies an event to state.
    fn apply_event(state: &mut BookingState, action: &BookingAction) {
        match action {
            BookingAction::BookingRequested { booking } => {
                state.bookings.insert(booking.id, booking.clone());
                state.last_error = None;
            },

            BookingAction::BookingConfirmed { booking_id, at, .. } => {
                if let Some(booking) = state.bookings.get_mut(booking_id) {
                    booking.status = BookingStatus::Confirmed;
                    booking.updated_at = *at;
                }
                state.last_error = None;
            },

            BookingAction::BookingCancelled { booking_id, cancelled_by, reason, at } => {
                if let Some(booking) = state.bookings.get_mut(booking_id) {
                    booking.status = BookingStatus::Cancelled;
                    booking.cancelled_by = Some(*cancelled_by);
                    booking.cancellation_reason.clone_from(reason);
                    booking.updated_at = *at;
                }
                state.last_error = None;
            },

            BookingAction::BookingCompleted { booking_id, at } => {
                if let Some(booking) = state.bookings.get_mut(booking_id) {
                    booking.status = BookingStatus::Completed;
                    booking.updated_at = *at;
                }
                state.last_error = None;
            },

            BookingAction::BookingNoShow { booking_id, at } => {
                if let Some(booking) = state.bookings.get_mut(booking_id) {
                    booking.status = BookingStatus::NoShow;
                    booking.updated_at = *at;
                }
                state.last_error = None;
            },

            BookingAction::PaymentRecorded { booking_id, status, at } => {
                if let Some(booking) = state.bookings.get_mut(booking_id) {
                    booking.payment_status = *status;
                    booking.updated_at = *at;
                }
                state.last_error = None;
            },

            BookingAction::MeetingLinkUpdated { booking_id, link, at } => {
                if let Some(booking) = state.bookings.get_mut(booking_id) {
                    booking.meeting_link.clone_from(link);
                    booking.updated_at = *at;
                }
                state.last_error = None;
            },

            BookingAction::MentorNotesUpdated { booking_id, notes, at } => {
                if let Some(booking) = state.bookings.get_mut(booking_id) {
                    booking.mentor_notes.clone_from(notes);
                    booking.updated_at = *at;
                }
                state.last_error = None;
            },

            BookingAction::SessionRated { booking_id, rating, feedback, at } => {
                if let Some(booking) = state.bookings.get_mut(booking_id) {
                    booking.mentee_rating = Some(*rating);
                    booking.mentee_feedback.clone_from(feedback);
                    booking.updated_at = *at;
                }
                state.last_error = None;
            },

            BookingAction::CommandRejected { error } => {
                state.last_error = Some(error.clone());
            },

            // Commands don't modify state
            BookingAction::RequestBooking { .. }
            | BookingAction::ConfirmBooking { .. }
            | BookingAction::CancelBooking { .. }
            | BookingAction::CompleteBooking { .. }
            | BookingAction::MarkNoShow { .. }
            | BookingAction::RecordPaymentOutcome { .. }
            | BookingAction::SetMeetingLink { .. }
            | BookingAction::SetMentorNotes { .. }
            | BookingAction::RateSession { .. } => {},
        }
    }

    /// Reject a command: record the error on state, log, return no effects.
    fn reject(state: &mut BookingState, error: BookingError) -> SmallVec<[Effect<BookingAction>; 4]> {
        tracing::warn!(code = error.code(), "booking command rejected: {error}");
        Self::apply_event(state, &BookingAction::CommandRejected { error });
        SmallVec::new()
    }

    /// Describe a best-effort notification as an effect.
    fn notify_effect(
        env: &BookingEnvironment,
        booking: &Booking,
        kind: NotificationKind,
    ) -> Effect<BookingAction> {
        let future = env.notifications.dispatch(Notification {
            booking_id: booking.id,
            mentor_id: booking.mentor_id,
            mentee_id: booking.mentee_id,
            kind,
        });
        Effect::Future(Box::pin(async move {
            if let Err(error) = future.await {
                tracing::warn!(%error, "notification delivery failed");
            }
            None
        }))
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per lifecycle command
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Creation ==========
            BookingAction::RequestBooking { booking_id, mentee_id, offering_id, start } => {
                let now = env.clock.now();
                let booking = match Self::validate_request_booking(
                    state,
                    booking_id,
                    mentee_id,
                    offering_id,
                    start,
                    now,
                ) {
                    Ok(booking) => booking,
                    Err(error) => return Self::reject(state, error),
                };

                let event = BookingAction::BookingRequested { booking: booking.clone() };
                Self::apply_event(state, &event);

                smallvec![Self::notify_effect(env, &booking, NotificationKind::BookingRequested)]
            },

            // ========== Transitions ==========
            BookingAction::ConfirmBooking { booking_id, actor } => {
                if let Err(error) =
                    Self::authorize(state, booking_id, actor, BookingStatus::Confirmed)
                {
                    return Self::reject(state, error);
                }

                let event = BookingAction::BookingConfirmed {
                    booking_id,
                    source: TransitionSource::Party(Party::Mentor),
                    at: env.clock.now(),
                };
                Self::apply_event(state, &event);

                match state.bookings.get(&booking_id) {
                    Some(booking) => smallvec![Self::notify_effect(
                        env,
                        booking,
                        NotificationKind::BookingConfirmed
                    )],
                    None => SmallVec::new(),
                }
            },

            BookingAction::CancelBooking { booking_id, actor, reason } => {
                let party =
                    match Self::authorize(state, booking_id, actor, BookingStatus::Cancelled) {
                        Ok(party) => party,
                        Err(error) => return Self::reject(state, error),
                    };

                let cancelled_by = CancelledBy::from(party);
                let event = BookingAction::BookingCancelled {
                    booking_id,
                    cancelled_by,
                    reason,
                    at: env.clock.now(),
                };
                Self::apply_event(state, &event);

                match state.bookings.get(&booking_id) {
                    Some(booking) => smallvec![Self::notify_effect(
                        env,
                        booking,
                        NotificationKind::BookingCancelled { by: cancelled_by }
                    )],
                    None => SmallVec::new(),
                }
            },

            BookingAction::CompleteBooking { booking_id, actor } => {
                if let Err(error) =
                    Self::authorize(state, booking_id, actor, BookingStatus::Completed)
                {
                    return Self::reject(state, error);
                }

                let event =
                    BookingAction::BookingCompleted { booking_id, at: env.clock.now() };
                Self::apply_event(state, &event);

                match state.bookings.get(&booking_id) {
                    Some(booking) => smallvec![Self::notify_effect(
                        env,
                        booking,
                        NotificationKind::BookingCompleted
                    )],
                    None => SmallVec::new(),
                }
            },

            BookingAction::MarkNoShow { booking_id, actor } => {
                if let Err(error) =
                    Self::authorize(state, booking_id, actor, BookingStatus::NoShow)
                {
                    return Self::reject(state, error);
                }

                let event = BookingAction::BookingNoShow { booking_id, at: env.clock.now() };
                Self::apply_event(state, &event);

                match state.bookings.get(&booking_id) {
                    Some(booking) => smallvec![Self::notify_effect(
                        env,
                        booking,
                        NotificationKind::BookingNoShow
                    )],
                    None => SmallVec::new(),
                }
            },

            // ========== Payment settlement (system source) ==========
            BookingAction::RecordPaymentOutcome { booking_id, outcome } => {
                let status = match state.bookings.get(&booking_id) {
                    Some(booking) => booking.status,
                    None => {
                        return Self::reject(
                            state,
                            BookingError::NotFound { entity: "booking" },
                        );
                    },
                };

                // Terminal bookings keep their record as-is; a late webhook
                // is acknowledged without mutating state.
                if status.is_terminal() {
                    tracing::warn!(
                        booking_id = %booking_id,
                        status = %status,
                        "payment outcome arrived for a terminal booking; ignored"
                    );
                    return SmallVec::new();
                }

                let now = env.clock.now();

                match outcome {
                    PaymentOutcome::Succeeded => {
                        Self::apply_event(
                            state,
                            &BookingAction::PaymentRecorded {
                                booking_id,
                                status: PaymentStatus::Paid,
                                at: now,
                            },
                        );

                        // Settlement is the one non-party transition source.
                        if status == BookingStatus::Pending
                            && authorize_transition(
                                status,
                                BookingStatus::Confirmed,
                                TransitionSource::Payment,
                            )
                            .is_ok()
                        {
                            Self::apply_event(
                                state,
                                &BookingAction::BookingConfirmed {
                                    booking_id,
                                    source: TransitionSource::Payment,
                                    at: now,
                                },
                            );
                        }

                        match state.bookings.get(&booking_id) {
                            Some(booking) => smallvec![Self::notify_effect(
                                env,
                                booking,
                                NotificationKind::PaymentSettled
                            )],
                            None => SmallVec::new(),
                        }
                    },
                    PaymentOutcome::Failed => {
                        Self::apply_event(
                            state,
                            &BookingAction::PaymentRecorded {
                                booking_id,
                                status: PaymentStatus::Failed,
                                at: now,
                            },
                        );

                        match state.bookings.get(&booking_id) {
                            Some(booking) => smallvec![Self::notify_effect(
                                env,
                                booking,
                                NotificationKind::PaymentFailed
                            )],
                            None => SmallVec::new(),
                        }
                    },
                }
            },

            // ========== Field updates ==========
            BookingAction::SetMeetingLink { booking_id, actor, link } => {
                let guard = state
                    .bookings
                    .get(&booking_id)
                    .ok_or(BookingError::NotFound { entity: "booking" })
                    .and_then(|booking| {
                        let party = resolve_party(booking, actor)?;
                        lifecycle::authorize_meeting_link(booking, party)
                    });
                if let Err(error) = guard {
                    return Self::reject(state, error);
                }

                let event =
                    BookingAction::MeetingLinkUpdated { booking_id, link, at: env.clock.now() };
                Self::apply_event(state, &event);
                SmallVec::new()
            },

            BookingAction::SetMentorNotes { booking_id, actor, notes } => {
                let guard = state
                    .bookings
                    .get(&booking_id)
                    .ok_or(BookingError::NotFound { entity: "booking" })
                    .and_then(|booking| {
                        let party = resolve_party(booking, actor)?;
                        lifecycle::authorize_mentor_notes(party)
                    });
                if let Err(error) = guard {
                    return Self::reject(state, error);
                }

                let event =
                    BookingAction::MentorNotesUpdated { booking_id, notes, at: env.clock.now() };
                Self::apply_event(state, &event);
                SmallVec::new()
            },

            BookingAction::RateSession { booking_id, actor, rating, feedback } => {
                let guard: Result<Rating, BookingError> = state
                    .bookings
                    .get(&booking_id)
                    .ok_or(BookingError::NotFound { entity: "booking" })
                    .and_then(|booking| {
                        let party = resolve_party(booking, actor)?;
                        lifecycle::authorize_session_rating(booking, party)?;
                        lifecycle::parse_rating(rating)
                    });
                let rating = match guard {
                    Ok(rating) => rating,
                    Err(error) => return Self::reject(state, error),
                };

                let event = BookingAction::SessionRated {
                    booking_id,
                    rating,
                    feedback,
                    at: env.clock.now(),
                };
                Self::apply_event(state, &event);
                SmallVec::new()
            },

            // ========== Events (applied directly, e.g. when rehydrating) ==========
            event => {
                Self::apply_event(state, &event);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::providers::LoggingDispatcher;
    use crate::types::Money;
    use chrono::NaiveTime;
    use mentorbook_testing::{ReducerTest, assertions, mocks::FixedClock, test_clock};

    fn test_env() -> BookingEnvironment {
        BookingEnvironment::new(Arc::new(test_clock()), Arc::new(LoggingDispatcher))
    }

    fn env_at(time: &str) -> BookingEnvironment {
        BookingEnvironment::new(
            Arc::new(FixedClock::new(time.parse().unwrap())),
            Arc::new(LoggingDispatcher),
        )
    }

    fn offering(mentor: UserId, price: Money) -> Offering {
        Offering {
            id: OfferingId::new(),
            mentor_id: mentor,
            title: "Code review session".to_string(),
            duration_minutes: 30,
            buffer_before_minutes: 5,
            buffer_after_minutes: 5,
            max_bookings_per_day: 5,
            advance_booking_days: 30,
            min_notice_hours: 24,
            price,
            status: OfferingStatus::Active,
        }
    }

    fn monday_slot(mentor: UserId) -> AvailabilitySlot {
        AvailabilitySlot {
            mentor_id: mentor,
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            timezone: chrono_tz::UTC,
        }
    }

    fn schedule_with(offering: &Offering) -> BookingState {
        let mut state = BookingState::new();
        state.availability = vec![monday_slot(offering.mentor_id)];
        state.offerings.insert(offering.id, offering.clone());
        state
    }

    fn booking_in(state: &mut BookingState, offering: &Offering, status: BookingStatus) -> Booking {
        let booking = Booking {
            id: BookingId::new(),
            mentor_id: offering.mentor_id,
            mentee_id: UserId::new(),
            offering_id: offering.id,
            scheduled_at: "2025-06-09T10:00:00Z".parse().unwrap(),
            duration_minutes: offering.duration_minutes,
            status,
            payment_status: PaymentStatus::Pending,
            meeting_link: None,
            mentor_notes: None,
            cancellation_reason: None,
            cancelled_by: None,
            mentee_rating: None,
            mentee_feedback: None,
            created_at: "2025-06-01T00:00:00Z".parse().unwrap(),
            updated_at: "2025-06-01T00:00:00Z".parse().unwrap(),
        };
        state.bookings.insert(booking.id, booking.clone());
        booking
    }

    #[test]
    fn request_booking_creates_pending() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let offering_id = offering.id;
        let booking_id = BookingId::new();

        // Clock is Monday 2025-06-02 09:00; next Monday 10:00 satisfies
        // notice (24h) and advance (30d) and falls in the window.
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(schedule_with(&offering))
            .when_action(BookingAction::RequestBooking {
                booking_id,
                mentee_id: UserId::new(),
                offering_id,
                start: "2025-06-09T10:00:00Z".parse().unwrap(),
            })
            .then_state(move |state| {
                let booking = state.booking(&booking_id).unwrap();
                assert_eq!(booking.status, BookingStatus::Pending);
                assert_eq!(booking.payment_status, PaymentStatus::Pending);
                assert_eq!(booking.duration_minutes, 30);
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn free_offering_is_paid_up_front() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_cents(0));
        let offering_id = offering.id;
        let booking_id = BookingId::new();

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(schedule_with(&offering))
            .when_action(BookingAction::RequestBooking {
                booking_id,
                mentee_id: UserId::new(),
                offering_id,
                start: "2025-06-09T10:00:00Z".parse().unwrap(),
            })
            .then_state(move |state| {
                let booking = state.booking(&booking_id).unwrap();
                // Free bookings skip the gateway but still await the mentor.
                assert_eq!(booking.payment_status, PaymentStatus::Paid);
                assert_eq!(booking.status, BookingStatus::Pending);
            })
            .run();
    }

    #[test]
    fn notice_boundary_is_inclusive() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let offering_id = offering.id;

        // Exactly now + 24h: accepted. The Sunday clock puts the boundary
        // on Monday 10:00, inside the availability window.
        let env = env_at("2025-06-08T10:00:00Z"); // Sunday 10:00
        let booking_id = BookingId::new();
        ReducerTest::new(BookingReducer::new())
            .with_env(env)
            .given_state(schedule_with(&offering))
            .when_action(BookingAction::RequestBooking {
                booking_id,
                mentee_id: UserId::new(),
                offering_id,
                start: "2025-06-09T10:00:00Z".parse().unwrap(),
            })
            .then_state(move |state| {
                assert!(state.last_error.is_none());
                assert!(state.booking(&booking_id).is_some());
            })
            .run();

        // One second inside the notice period: rejected.
        let env = env_at("2025-06-08T10:00:01Z");
        let booking_id = BookingId::new();
        ReducerTest::new(BookingReducer::new())
            .with_env(env)
            .given_state(schedule_with(&offering))
            .when_action(BookingAction::RequestBooking {
                booking_id,
                mentee_id: UserId::new(),
                offering_id,
                start: "2025-06-09T10:00:00Z".parse().unwrap(),
            })
            .then_state(move |state| {
                assert_eq!(
                    state.last_error,
                    Some(BookingError::InsufficientNotice { required_hours: 24 })
                );
                assert!(state.booking(&booking_id).is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn advance_window_is_enforced() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let offering_id = offering.id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(schedule_with(&offering))
            .when_action(BookingAction::RequestBooking {
                booking_id: BookingId::new(),
                mentee_id: UserId::new(),
                offering_id,
                // ~5 weeks out, beyond the 30-day window
                start: "2025-07-14T10:00:00Z".parse().unwrap(),
            })
            .then_state(|state| {
                assert_eq!(
                    state.last_error,
                    Some(BookingError::TooFarInAdvance { max_days: 30 })
                );
            })
            .run();
    }

    #[test]
    fn outside_availability_is_rejected() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let offering_id = offering.id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(schedule_with(&offering))
            .when_action(BookingAction::RequestBooking {
                booking_id: BookingId::new(),
                mentee_id: UserId::new(),
                offering_id,
                // Tuesday, but availability is Monday only
                start: "2025-06-10T10:00:00Z".parse().unwrap(),
            })
            .then_state(|state| {
                assert_eq!(state.last_error, Some(BookingError::OutsideAvailability));
            })
            .run();
    }

    #[test]
    fn buffered_conflict_is_rejected() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let offering_id = offering.id;
        let mut state = schedule_with(&offering);
        booking_in(&mut state, &offering, BookingStatus::Pending);

        // Existing booking 10:00-10:30 with 5/5 buffers spans 09:55-10:35;
        // 10:20 collides.
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RequestBooking {
                booking_id: BookingId::new(),
                mentee_id: UserId::new(),
                offering_id,
                start: "2025-06-09T10:20:00Z".parse().unwrap(),
            })
            .then_state(|state| {
                assert_eq!(state.last_error, Some(BookingError::SlotConflict));
            })
            .run();
    }

    #[test]
    fn cancelled_bookings_free_their_slot() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let offering_id = offering.id;
        let mut state = schedule_with(&offering);
        booking_in(&mut state, &offering, BookingStatus::Cancelled);

        let booking_id = BookingId::new();
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RequestBooking {
                booking_id,
                mentee_id: UserId::new(),
                offering_id,
                start: "2025-06-09T10:00:00Z".parse().unwrap(),
            })
            .then_state(move |state| {
                assert!(state.last_error.is_none());
                assert!(state.booking(&booking_id).is_some());
            })
            .run();
    }

    #[test]
    fn daily_cap_is_enforced() {
        let mentor = UserId::new();
        let mut offering = offering(mentor, Money::from_dollars(40));
        offering.max_bookings_per_day = 1;
        let offering_id = offering.id;
        let mut state = schedule_with(&offering);
        booking_in(&mut state, &offering, BookingStatus::Confirmed);

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RequestBooking {
                booking_id: BookingId::new(),
                mentee_id: UserId::new(),
                offering_id,
                // Same Monday, far from the 10:00 booking
                start: "2025-06-09T15:00:00Z".parse().unwrap(),
            })
            .then_state(|state| {
                assert_eq!(state.last_error, Some(BookingError::DailyLimitReached { limit: 1 }));
            })
            .run();
    }

    #[test]
    fn mentor_confirms_pending_booking() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Pending);
        let booking_id = booking.id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::ConfirmBooking { booking_id, actor: mentor })
            .then_state(move |state| {
                assert_eq!(state.booking(&booking_id).unwrap().status, BookingStatus::Confirmed);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn mentee_cannot_confirm() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Pending);
        let booking_id = booking.id;
        let mentee = booking.mentee_id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::ConfirmBooking { booking_id, actor: mentee })
            .then_state(move |state| {
                assert!(matches!(state.last_error, Some(BookingError::Forbidden { .. })));
                assert_eq!(state.booking(&booking_id).unwrap().status, BookingStatus::Pending);
            })
            .run();
    }

    #[test]
    fn mentee_cannot_complete_their_own_booking() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Confirmed);
        let booking_id = booking.id;
        let mentee = booking.mentee_id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::CompleteBooking { booking_id, actor: mentee })
            .then_state(move |state| {
                // A legitimate party, but the wrong role: Forbidden, not
                // InvalidTransition.
                assert!(matches!(state.last_error, Some(BookingError::Forbidden { .. })));
            })
            .run();
    }

    #[test]
    fn stranger_cannot_touch_booking() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Pending);
        let booking_id = booking.id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::CancelBooking {
                booking_id,
                actor: UserId::new(),
                reason: None,
            })
            .then_state(|state| {
                assert!(matches!(state.last_error, Some(BookingError::Forbidden { .. })));
            })
            .run();
    }

    #[test]
    fn cancellation_records_which_side() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Confirmed);
        let booking_id = booking.id;
        let mentee = booking.mentee_id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::CancelBooking {
                booking_id,
                actor: mentee,
                reason: Some("schedule clash".to_string()),
            })
            .then_state(move |state| {
                let booking = state.booking(&booking_id).unwrap();
                assert_eq!(booking.status, BookingStatus::Cancelled);
                assert_eq!(booking.cancelled_by, Some(CancelledBy::Mentee));
                assert_eq!(booking.cancellation_reason.as_deref(), Some("schedule clash"));
            })
            .run();
    }

    #[test]
    fn terminal_booking_rejects_transitions() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Completed);
        let booking_id = booking.id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::CancelBooking { booking_id, actor: mentor, reason: None })
            .then_state(move |state| {
                assert_eq!(
                    state.last_error,
                    Some(BookingError::InvalidTransition {
                        from: BookingStatus::Completed,
                        to: BookingStatus::Cancelled,
                    })
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn payment_success_confirms_pending() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Pending);
        let booking_id = booking.id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RecordPaymentOutcome {
                booking_id,
                outcome: PaymentOutcome::Succeeded,
            })
            .then_state(move |state| {
                let booking = state.booking(&booking_id).unwrap();
                assert_eq!(booking.payment_status, PaymentStatus::Paid);
                assert_eq!(booking.status, BookingStatus::Confirmed);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn payment_failure_leaves_status_alone() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Pending);
        let booking_id = booking.id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RecordPaymentOutcome {
                booking_id,
                outcome: PaymentOutcome::Failed,
            })
            .then_state(move |state| {
                let booking = state.booking(&booking_id).unwrap();
                assert_eq!(booking.payment_status, PaymentStatus::Failed);
                assert_eq!(booking.status, BookingStatus::Pending);
            })
            .run();
    }

    #[test]
    fn late_webhook_on_cancelled_booking_is_ignored() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Cancelled);
        let booking_id = booking.id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RecordPaymentOutcome {
                booking_id,
                outcome: PaymentOutcome::Succeeded,
            })
            .then_state(move |state| {
                let booking = state.booking(&booking_id).unwrap();
                assert_eq!(booking.status, BookingStatus::Cancelled);
                assert_eq!(booking.payment_status, PaymentStatus::Pending);
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn meeting_link_is_mentor_only() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Confirmed);
        let booking_id = booking.id;
        let mentee = booking.mentee_id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state.clone())
            .when_action(BookingAction::SetMeetingLink {
                booking_id,
                actor: mentee,
                link: Some("https://meet.example.com/x".to_string()),
            })
            .then_state(|state| {
                assert!(matches!(state.last_error, Some(BookingError::Forbidden { .. })));
            })
            .run();

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::SetMeetingLink {
                booking_id,
                actor: mentor,
                link: Some("https://meet.example.com/x".to_string()),
            })
            .then_state(move |state| {
                assert_eq!(
                    state.booking(&booking_id).unwrap().meeting_link.as_deref(),
                    Some("https://meet.example.com/x")
                );
            })
            .run();
    }

    #[test]
    fn rating_requires_completed_status() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Pending);
        let booking_id = booking.id;
        let mentee = booking.mentee_id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RateSession {
                booking_id,
                actor: mentee,
                rating: 4,
                feedback: None,
            })
            .then_state(|state| {
                assert!(matches!(state.last_error, Some(BookingError::Validation(_))));
            })
            .run();
    }

    #[test]
    fn rating_out_of_range_is_validation_error() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let booking = booking_in(&mut state, &offering, BookingStatus::Completed);
        let booking_id = booking.id;
        let mentee = booking.mentee_id;

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RateSession {
                booking_id,
                actor: mentee,
                rating: 6,
                feedback: None,
            })
            .then_state(move |state| {
                assert!(matches!(state.last_error, Some(BookingError::Validation(_))));
                assert!(state.booking(&booking_id).unwrap().mentee_rating.is_none());
            })
            .run();
    }

    #[test]
    fn rating_is_write_once() {
        let mentor = UserId::new();
        let offering = offering(mentor, Money::from_dollars(40));
        let mut state = schedule_with(&offering);
        let mut booking = booking_in(&mut state, &offering, BookingStatus::Completed);
        booking.mentee_rating = Some(Rating::new(5).unwrap());
        let mentee = booking.mentee_id;
        let booking_id = booking.id;
        state.bookings.insert(booking.id, booking);

        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RateSession {
                booking_id,
                actor: mentee,
                rating: 2,
                feedback: None,
            })
            .then_state(move |state| {
                assert!(matches!(state.last_error, Some(BookingError::Validation(_))));
                assert_eq!(
                    state.booking(&booking_id).unwrap().mentee_rating,
                    Some(Rating::new(5).unwrap())
                );
            })
            .run();
    }
}
