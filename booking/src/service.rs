//! The imperative shell around the booking reducer.
//!
//! Every operation is a stateless, request-scoped unit of work: load the
//! relevant slice of the mentor's schedule from the providers, run the
//! pure reducer against it, persist the outcome, then fire notifications.
//! No state survives between requests; the store is the source of truth.
//!
//! Two races are handled deliberately:
//!
//! - **Creation**: the reducer's conflict check sees a snapshot; the
//!   repository's insert is the authoritative check (storage constraint)
//!   and its violation surfaces as the same `SlotConflict`. The insert is
//!   never retried.
//! - **Transitions**: updates carry the status the request was validated
//!   against; losing that optimistic guard re-runs the request once
//!   against fresh state so the caller gets a precise error.

use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::feedback as feedback_rules;
use crate::lifecycle::{Party, resolve_party};
use crate::providers::{
    AvailabilityStore, BookingRepository, ContentDirectory, FeedbackFilter, FeedbackRepository,
    NotificationDispatcher, OfferingCatalog, ProfileDirectory,
};
use crate::reducer::{BookingAction, BookingEnvironment, BookingReducer, BookingState};
use crate::schedule::BufferedSpan;
use crate::types::{
    Actor, AvailabilitySlot, Booking, BookingId, BookingStatus, Feedback, FeedbackId,
    FeedbackKind, Offering, OfferingId, PaymentOutcome, UserId, UserProfile,
};
use chrono::{DateTime, Utc};
use mentorbook_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer};
use mentorbook_runtime::deadline::{DeadlineError, with_deadline};
use mentorbook_runtime::retry::retry_with_predicate;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Partial update of a booking: a status transition, field updates, or
/// both in one request. `None` means "leave unchanged"; for the
/// mentor-owned text fields the inner `Option` distinguishes clearing
/// from leaving alone.
#[derive(Clone, Debug, Default)]
pub struct BookingPatch {
    /// Requested status transition
    pub status: Option<BookingStatus>,
    /// Free-text reason, recorded when the transition is a cancellation
    pub cancellation_reason: Option<String>,
    /// Set (`Some(Some(_))`) or clear (`Some(None)`) the meeting link
    pub meeting_link: Option<Option<String>>,
    /// Set or clear the private mentor notes
    pub mentor_notes: Option<Option<String>>,
    /// Submit the mentee rating (write-once)
    pub mentee_rating: Option<u8>,
    /// Feedback text accompanying the rating
    pub mentee_feedback: Option<String>,
}

impl BookingPatch {
    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.meeting_link.is_none()
            && self.mentor_notes.is_none()
            && self.mentee_rating.is_none()
            && self.mentee_feedback.is_none()
    }
}

enum PatchOutcome {
    Applied(Booking, SmallVec<[Effect<BookingAction>; 4]>),
    GuardLost,
}

/// The booking service: catalog, availability, repositories, and
/// directories injected as providers, with the reducer as its functional
/// core.
#[derive(Clone)]
pub struct BookingService<C, A, B, F, D, P>
where
    C: OfferingCatalog,
    A: AvailabilityStore,
    B: BookingRepository,
    F: FeedbackRepository,
    D: ContentDirectory,
    P: ProfileDirectory,
{
    catalog: C,
    availability: A,
    bookings: B,
    feedback: F,
    directory: D,
    profiles: P,
    env: BookingEnvironment,
    config: BookingConfig,
    reducer: BookingReducer,
}

impl<C, A, B, F, D, P> BookingService<C, A, B, F, D, P>
where
    C: OfferingCatalog,
    A: AvailabilityStore,
    B: BookingRepository,
    F: FeedbackRepository,
    D: ContentDirectory,
    P: ProfileDirectory,
{
    /// Create the service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: C,
        availability: A,
        bookings: B,
        feedback: F,
        directory: D,
        profiles: P,
        clock: Arc<dyn Clock>,
        notifications: Arc<dyn NotificationDispatcher>,
        config: BookingConfig,
    ) -> Self {
        Self {
            catalog,
            availability,
            bookings,
            feedback,
            directory,
            profiles,
            env: BookingEnvironment::new(clock, notifications),
            config,
            reducer: BookingReducer::new(),
        }
    }

    // ========================================================================
    // Bookings
    // ========================================================================

    /// Create a booking: mentee books an offering at a start time.
    ///
    /// Preconditions run in the reducer against a snapshot of the mentor's
    /// schedule; the repository insert is the authoritative conflict check.
    ///
    /// # Errors
    ///
    /// Any creation-precondition error from the lifecycle spec, plus
    /// `Unavailable`/`Timeout` for infrastructure failures.
    pub async fn create_booking(
        &self,
        mentee: UserId,
        offering_id: OfferingId,
        start: DateTime<Utc>,
    ) -> Result<Booking> {
        let offering = self.load_offering(offering_id).await?;
        let mut state = self.load_schedule(offering.mentor_id).await?;
        state.offerings.entry(offering.id).or_insert_with(|| offering.clone());

        let booking_id = BookingId::new();
        let effects = self.dispatch(
            &mut state,
            BookingAction::RequestBooking { booking_id, mentee_id: mentee, offering_id, start },
        )?;

        let booking = state.booking(&booking_id).cloned().ok_or_else(|| {
            BookingError::Unavailable("booking missing after validation".to_string())
        })?;

        // Authoritative conflict check lives in the store; never retried.
        let span = BufferedSpan::of_booking(&booking, &offering);
        self.write(self.bookings.insert_booking(&booking, span)).await?;

        Self::spawn_effects(effects);
        tracing::info!(
            booking_id = %booking.id,
            mentor_id = %booking.mentor_id,
            offering_id = %offering_id,
            scheduled_at = %booking.scheduled_at,
            "booking created"
        );
        Ok(booking)
    }

    /// Fetch a booking on behalf of one of its parties.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids, `Forbidden` for non-parties.
    pub async fn booking_for(&self, actor: UserId, id: BookingId) -> Result<(Booking, Party)> {
        let booking = self.load_booking(id).await?;
        let party = resolve_party(&booking, actor)?;
        Ok((booking, party))
    }

    /// Every booking the actor participates in.
    ///
    /// # Errors
    ///
    /// `Unavailable`/`Timeout` when the store cannot answer.
    pub async fn bookings_for_user(&self, actor: UserId) -> Result<Vec<Booking>> {
        self.read(|| self.bookings.bookings_for_user(actor)).await
    }

    /// Apply a status transition and/or field updates to a booking.
    ///
    /// The update is guarded by the status the request was validated
    /// against; if a concurrent transition wins, the patch is re-evaluated
    /// once against fresh state.
    ///
    /// # Errors
    ///
    /// `InvalidTransition`, `Forbidden`, `Validation`, `NotFound`, or
    /// infrastructure errors.
    pub async fn patch_booking(
        &self,
        actor: UserId,
        id: BookingId,
        patch: BookingPatch,
    ) -> Result<Booking> {
        if patch.is_empty() {
            return Err(BookingError::Validation("no updates requested".to_string()));
        }

        match self.try_patch(actor, id, &patch).await? {
            PatchOutcome::Applied(booking, effects) => {
                Self::spawn_effects(effects);
                Ok(booking)
            },
            PatchOutcome::GuardLost => match self.try_patch(actor, id, &patch).await? {
                PatchOutcome::Applied(booking, effects) => {
                    Self::spawn_effects(effects);
                    Ok(booking)
                },
                PatchOutcome::GuardLost => Err(BookingError::Unavailable(
                    "booking was concurrently modified; retry".to_string(),
                )),
            },
        }
    }

    async fn try_patch(
        &self,
        actor: UserId,
        id: BookingId,
        patch: &BookingPatch,
    ) -> Result<PatchOutcome> {
        let booking = self.load_booking(id).await?;
        let expected_status = booking.status;

        let mut state = BookingState::new();
        state.bookings.insert(id, booking);

        let mut effects: SmallVec<[Effect<BookingAction>; 4]> = SmallVec::new();

        if let Some(target) = patch.status {
            let command = match target {
                BookingStatus::Confirmed => {
                    BookingAction::ConfirmBooking { booking_id: id, actor }
                },
                BookingStatus::Cancelled => BookingAction::CancelBooking {
                    booking_id: id,
                    actor,
                    reason: patch.cancellation_reason.clone(),
                },
                BookingStatus::Completed => {
                    BookingAction::CompleteBooking { booking_id: id, actor }
                },
                BookingStatus::NoShow => BookingAction::MarkNoShow { booking_id: id, actor },
                BookingStatus::Pending => {
                    return Err(BookingError::InvalidTransition {
                        from: expected_status,
                        to: BookingStatus::Pending,
                    });
                },
            };
            effects.extend(self.dispatch(&mut state, command)?);
        }

        if let Some(link) = patch.meeting_link.clone() {
            effects.extend(self.dispatch(
                &mut state,
                BookingAction::SetMeetingLink { booking_id: id, actor, link },
            )?);
        }

        if let Some(notes) = patch.mentor_notes.clone() {
            effects.extend(self.dispatch(
                &mut state,
                BookingAction::SetMentorNotes { booking_id: id, actor, notes },
            )?);
        }

        if let Some(rating) = patch.mentee_rating {
            effects.extend(self.dispatch(
                &mut state,
                BookingAction::RateSession {
                    booking_id: id,
                    actor,
                    rating,
                    feedback: patch.mentee_feedback.clone(),
                },
            )?);
        } else if patch.mentee_feedback.is_some() {
            return Err(BookingError::Validation(
                "a rating is required when submitting session feedback".to_string(),
            ));
        }

        let updated = state
            .booking(&id)
            .cloned()
            .ok_or_else(|| BookingError::Unavailable("booking missing after patch".to_string()))?;

        if self.write(self.bookings.update_booking(&updated, expected_status)).await? {
            Ok(PatchOutcome::Applied(updated, effects))
        } else {
            tracing::debug!(booking_id = %id, "optimistic status guard lost; reloading");
            Ok(PatchOutcome::GuardLost)
        }
    }

    /// Record a payment outcome reported by the gateway.
    ///
    /// The order reference has the shape `booking_{uuid}_{timestamp}`. A
    /// successful settlement flips `payment_status` to paid and, through
    /// the payment row of the lifecycle table, confirms a pending
    /// booking. Outcomes for terminal bookings are acknowledged and
    /// ignored.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed references, `NotFound` for unknown
    /// bookings, or infrastructure errors.
    pub async fn settle_payment(
        &self,
        order_reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<Booking> {
        let booking_id = parse_order_reference(order_reference)?;

        let booking = self.load_booking(booking_id).await?;
        let expected_status = booking.status;

        let mut state = BookingState::new();
        state.bookings.insert(booking_id, booking);

        let effects = self
            .dispatch(&mut state, BookingAction::RecordPaymentOutcome { booking_id, outcome })?;

        let updated = state.booking(&booking_id).cloned().ok_or_else(|| {
            BookingError::Unavailable("booking missing after settlement".to_string())
        })?;

        if !self.write(self.bookings.update_booking(&updated, expected_status)).await? {
            return Err(BookingError::Unavailable(
                "booking was concurrently modified; retry".to_string(),
            ));
        }

        Self::spawn_effects(effects);
        Ok(updated)
    }

    // ========================================================================
    // Availability
    // ========================================================================

    /// The mentor's weekly availability windows.
    ///
    /// # Errors
    ///
    /// `Unavailable`/`Timeout` when the store cannot answer.
    pub async fn availability_for(&self, mentor: UserId) -> Result<Vec<AvailabilitySlot>> {
        self.read(|| self.availability.slots_for_mentor(mentor)).await
    }

    /// Replace the mentor's availability wholesale.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed windows, or infrastructure errors.
    pub async fn replace_availability(
        &self,
        mentor: UserId,
        slots: Vec<AvailabilitySlot>,
    ) -> Result<Vec<AvailabilitySlot>> {
        for slot in &slots {
            if slot.mentor_id != mentor {
                return Err(BookingError::Validation(
                    "slots must belong to the acting mentor".to_string(),
                ));
            }
            slot.validate()?;
        }
        self.write(self.availability.replace_slots(mentor, slots)).await
    }

    // ========================================================================
    // Feedback
    // ========================================================================

    /// Attach feedback to a booking, article, or event.
    ///
    /// The reference must exist; the `(user, kind, reference)` uniqueness
    /// is the store's to enforce, so a duplicate submission surfaces as
    /// `DuplicateFeedback` rather than a second row.
    ///
    /// # Errors
    ///
    /// `Validation`, `NotFound`, `DuplicateFeedback`, or infrastructure
    /// errors.
    pub async fn submit_feedback(
        &self,
        author: UserId,
        kind: FeedbackKind,
        reference_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> Result<Feedback> {
        if !self.read(|| self.directory.reference_exists(kind, reference_id)).await? {
            return Err(BookingError::NotFound { entity: "referenced item" });
        }

        let feedback =
            feedback_rules::build_feedback(author, kind, reference_id, rating, comment, self.env.clock.now())?;

        self.write(self.feedback.insert_feedback(&feedback)).await?;
        tracing::info!(feedback_id = %feedback.id, kind = kind.as_str(), "feedback recorded");
        Ok(feedback)
    }

    /// Record the content owner's (or an admin's) response. Write-once.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `ResponseAlreadyRecorded`, `Validation`,
    /// or infrastructure errors.
    pub async fn respond_to_feedback(
        &self,
        actor: Actor,
        id: FeedbackId,
        response: String,
    ) -> Result<Feedback> {
        let mut feedback = self.load_feedback(id).await?;
        let owner =
            self.read(|| self.directory.owner_of(feedback.kind, feedback.reference_id)).await?;

        feedback_rules::authorize_response(&feedback, owner, actor)?;
        feedback_rules::apply_response(&mut feedback, actor.id, response, self.env.clock.now())?;

        self.write(self.feedback.update_feedback(&feedback)).await?;
        Ok(feedback)
    }

    /// Author edits their own rating/comment.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, `Validation`, or infrastructure errors.
    pub async fn edit_feedback(
        &self,
        actor: UserId,
        id: FeedbackId,
        rating: Option<u8>,
        comment: Option<String>,
    ) -> Result<Feedback> {
        let mut feedback = self.load_feedback(id).await?;
        feedback_rules::authorize_author_edit(&feedback, actor)?;
        feedback_rules::apply_author_edit(&mut feedback, rating, comment, self.env.clock.now())?;

        self.write(self.feedback.update_feedback(&feedback)).await?;
        Ok(feedback)
    }

    /// Archive feedback (content owner or admin).
    ///
    /// # Errors
    ///
    /// `NotFound`, `Forbidden`, or infrastructure errors.
    pub async fn archive_feedback(&self, actor: Actor, id: FeedbackId) -> Result<Feedback> {
        let mut feedback = self.load_feedback(id).await?;
        let owner =
            self.read(|| self.directory.owner_of(feedback.kind, feedback.reference_id)).await?;

        feedback_rules::authorize_archive(owner, actor)?;
        feedback.status = crate::types::FeedbackStatus::Archived;
        feedback.updated_at = self.env.clock.now();

        self.write(self.feedback.update_feedback(&feedback)).await?;
        Ok(feedback)
    }

    /// Query feedback.
    ///
    /// # Errors
    ///
    /// `Unavailable`/`Timeout` when the store cannot answer.
    pub async fn list_feedback(&self, filter: FeedbackFilter) -> Result<Vec<Feedback>> {
        self.read(|| self.feedback.list(filter)).await
    }

    /// The owner's inbox: feedback on all content they own.
    ///
    /// # Errors
    ///
    /// `Unavailable`/`Timeout` when the store cannot answer.
    pub async fn feedback_inbox(&self, owner: UserId) -> Result<Vec<Feedback>> {
        self.read(|| self.feedback.list_for_owner(owner)).await
    }

    /// Display profile for a user.
    ///
    /// # Errors
    ///
    /// `Unavailable`/`Timeout` when the store cannot answer.
    pub async fn profile(&self, user: UserId) -> Result<Option<UserProfile>> {
        self.read(|| self.profiles.profile(user)).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn dispatch(
        &self,
        state: &mut BookingState,
        action: BookingAction,
    ) -> Result<SmallVec<[Effect<BookingAction>; 4]>> {
        let effects = self.reducer.reduce(state, action, &self.env);
        match state.take_error() {
            Some(error) => Err(error),
            None => Ok(effects),
        }
    }

    async fn load_offering(&self, id: OfferingId) -> Result<Offering> {
        self.read(|| self.catalog.offering(id))
            .await?
            .ok_or(BookingError::NotFound { entity: "offering" })
    }

    async fn load_booking(&self, id: BookingId) -> Result<Booking> {
        self.read(|| self.bookings.booking(id))
            .await?
            .ok_or(BookingError::NotFound { entity: "booking" })
    }

    async fn load_feedback(&self, id: FeedbackId) -> Result<Feedback> {
        self.read(|| self.feedback.feedback(id))
            .await?
            .ok_or(BookingError::NotFound { entity: "feedback" })
    }

    /// Load the mentor's schedule aggregate: offerings, availability, and
    /// slot-occupying bookings.
    async fn load_schedule(&self, mentor: UserId) -> Result<BookingState> {
        let offerings = self.read(|| self.catalog.offerings_for_mentor(mentor)).await?;
        let availability = self.read(|| self.availability.slots_for_mentor(mentor)).await?;
        let active = self.read(|| self.bookings.active_for_mentor(mentor)).await?;

        let mut state = BookingState::new();
        state.offerings = offerings.into_iter().map(|o| (o.id, o)).collect();
        state.availability = availability;
        state.bookings = active.into_iter().map(|b| (b.id, b)).collect();
        Ok(state)
    }

    /// Provider read: deadline per attempt, one retry on transient errors.
    async fn read<T, Op, Fut>(&self, mut operation: Op) -> Result<T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let deadline = self.config.provider_deadline;
        retry_with_predicate(
            self.config.read_retry.clone(),
            || {
                let attempt = operation();
                async move { with_deadline(deadline, attempt).await.map_err(flatten_deadline) }
            },
            BookingError::is_retryable,
        )
        .await
    }

    /// Provider write: deadline, never retried.
    async fn write<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        with_deadline(self.config.provider_deadline, operation).await.map_err(flatten_deadline)
    }

    /// Execute effects fire-and-forget: notification failures are logged
    /// by the effect itself and never fail the operation that spawned
    /// them.
    fn spawn_effects(effects: SmallVec<[Effect<BookingAction>; 4]>) {
        Self::spawn_effect_list(effects.into_vec());
    }

    fn spawn_effect_list(effects: Vec<Effect<BookingAction>>) {
        for effect in effects {
            match effect {
                Effect::None => {},
                Effect::Future(future) => {
                    tokio::spawn(async move {
                        future.await;
                    });
                },
                Effect::Parallel(inner) | Effect::Sequential(inner) => {
                    Self::spawn_effect_list(inner);
                },
                Effect::Delay { duration, .. } => {
                    tracing::debug!(
                        delay_ms = duration.as_millis(),
                        "delayed actions are not scheduled by the request shell"
                    );
                },
            }
        }
    }
}

fn flatten_deadline(err: DeadlineError<BookingError>) -> BookingError {
    match err {
        DeadlineError::Elapsed(_) => BookingError::Timeout,
        DeadlineError::Inner(inner) => inner,
    }
}

// ============================================================================
// Payment order references
// ============================================================================

/// Render the order reference embedded in gateway requests:
/// `booking_{uuid}_{unix_timestamp}`.
#[must_use]
pub fn order_reference(booking_id: BookingId, at: DateTime<Utc>) -> String {
    format!("booking_{}_{}", booking_id, at.timestamp())
}

/// Parse an order reference back to the booking it identifies.
///
/// # Errors
///
/// Returns [`BookingError::Validation`] for anything that does not match
/// `booking_{uuid}_{unix_timestamp}`.
pub fn parse_order_reference(reference: &str) -> Result<BookingId> {
    let malformed =
        || BookingError::Validation(format!("malformed order reference: {reference}"));

    let rest = reference.strip_prefix("booking_").ok_or_else(malformed)?;
    let (id_part, timestamp) = rest.rsplit_once('_').ok_or_else(malformed)?;

    if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    Uuid::parse_str(id_part).map(BookingId::from_uuid).map_err(|_| malformed())
}
