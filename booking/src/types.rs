//! Domain types for the Mentorbook booking platform.
//!
//! This module contains the value objects and entities the booking core
//! operates on: identifiers, money, ratings, offerings, availability slots,
//! bookings, and feedback.

use crate::error::BookingError;
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from a `Uuid`
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a booking
    BookingId
}

uuid_id! {
    /// Unique identifier for an offering
    OfferingId
}

uuid_id! {
    /// Unique identifier for a feedback record
    FeedbackId
}

uuid_id! {
    /// Unique identifier for a platform user (mentor or mentee)
    UserId
}

/// A request actor: the user identity plus whether the fronting identity
/// layer marked them admin-equivalent. Passed explicitly into every
/// operation; never read from ambient session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    /// The acting user
    pub id: UserId,
    /// Whether the actor carries admin privileges
    pub admin: bool,
}

impl Actor {
    /// A regular (non-admin) actor
    #[must_use]
    pub const fn user(id: UserId) -> Self {
        Self { id, admin: false }
    }

    /// An admin-equivalent actor
    #[must_use]
    pub const fn admin(id: UserId) -> Self {
        Self { id, admin: true }
    }
}

// ============================================================================
// Value objects
// ============================================================================

/// Money amount in cents to avoid floating-point issues
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates money from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates money from whole dollars
    #[must_use]
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// Gets the amount in cents
    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// A free offering has a zero price and never sees the payment gateway
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

/// A session rating, constrained to 1..=5 at construction
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Creates a validated rating.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] when the value is outside 1..=5.
    pub fn new(value: u8) -> Result<Self, BookingError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(BookingError::Validation(format!(
                "rating must be between 1 and 5, got {value}"
            )))
        }
    }

    /// The raw value (guaranteed 1..=5)
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = BookingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

// ============================================================================
// Status enums
// ============================================================================

/// Booking lifecycle status.
///
/// `Completed`, `Cancelled`, and `NoShow` are terminal: once reached, no
/// further status transition is permitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting mentor confirmation (initial state)
    Pending,
    /// Confirmed by the mentor (or settled payment)
    Confirmed,
    /// Session took place
    Completed,
    /// Cancelled by either party
    Cancelled,
    /// Mentee did not attend
    NoShow,
}

impl BookingStatus {
    /// Terminal states absorb all further transition attempts
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Stable string form used in storage and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Parse the stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for unknown values.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "no_show" => Ok(Self::NoShow),
            other => Err(BookingError::Validation(format!("unknown booking status: {other}"))),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status: an axis independent from the booking status. A booking
/// can be confirmed while payment is still pending (free offerings never
/// trigger the gateway at all).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No settled payment yet
    Pending,
    /// Gateway reported success (or the offering is free)
    Paid,
    /// Gateway reported failure
    Failed,
}

impl PaymentStatus {
    /// Stable string form used in storage and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    /// Parse the stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for unknown values.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(BookingError::Validation(format!("unknown payment status: {other}"))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome reported by the payment gateway webhook
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    /// Payment settled successfully
    Succeeded,
    /// Payment failed
    Failed,
}

/// Which side of the booking cancelled it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    /// The mentor cancelled
    Mentor,
    /// The mentee cancelled
    Mentee,
}

impl CancelledBy {
    /// Stable string form used in storage and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mentor => "mentor",
            Self::Mentee => "mentee",
        }
    }
}

/// Offering publication status; only `Active` offerings are bookable
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferingStatus {
    /// Not yet published
    Draft,
    /// Bookable
    Active,
    /// Temporarily unbookable
    Paused,
    /// Retired
    Archived,
}

impl OfferingStatus {
    /// Stable string form used in storage and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Archived => "archived",
        }
    }

    /// Parse the stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for unknown values.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "archived" => Ok(Self::Archived),
            other => Err(BookingError::Validation(format!("unknown offering status: {other}"))),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A mentor-defined bookable session template.
///
/// Read-only from the booking core's perspective; its duration, buffers,
/// and booking-rule fields drive creation validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    /// Offering identifier
    pub id: OfferingId,
    /// Mentor who owns this offering
    pub mentor_id: UserId,
    /// Human-readable title
    pub title: String,
    /// Billed session length in minutes
    pub duration_minutes: u32,
    /// Idle minutes reserved before each session (counts toward conflicts)
    pub buffer_before_minutes: u32,
    /// Idle minutes reserved after each session (counts toward conflicts)
    pub buffer_after_minutes: u32,
    /// Cap on pending+confirmed bookings per calendar day
    pub max_bookings_per_day: u32,
    /// How far ahead (days) a session may be booked
    pub advance_booking_days: u32,
    /// Minimum notice (hours) before the requested start
    pub min_notice_hours: u32,
    /// Price; zero means the payment gate is skipped entirely
    pub price: Money,
    /// Publication status
    pub status: OfferingStatus,
}

/// One weekly availability window declared by a mentor.
///
/// `day_of_week` uses 0 = Sunday. Times are local to `timezone`; conflict
/// and window checks convert to UTC before comparing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    /// Mentor who declared the window
    pub mentor_id: UserId,
    /// Day of week, 0 = Sunday through 6 = Saturday
    pub day_of_week: u8,
    /// Window start, local to `timezone`
    pub start_time: NaiveTime,
    /// Window end, local to `timezone`
    pub end_time: NaiveTime,
    /// Timezone the window is declared in
    pub timezone: Tz,
}

impl AvailabilitySlot {
    /// Validate the window shape (day range and ordering).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] when `day_of_week` is out of
    /// range or the window is empty or inverted.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.day_of_week > 6 {
            return Err(BookingError::Validation(format!(
                "day_of_week must be 0-6, got {}",
                self.day_of_week
            )));
        }
        if self.start_time >= self.end_time {
            return Err(BookingError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }
        Ok(())
    }
}

/// One concrete reservation of an offering's time slot by a mentee.
///
/// `duration_minutes` is copied from the offering at creation so later
/// offering edits never reshape existing bookings. A booking is never
/// physically deleted; cancellation is the terminal soft delete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier
    pub id: BookingId,
    /// The mentor side of the booking
    pub mentor_id: UserId,
    /// The mentee side of the booking (never equal to `mentor_id`)
    pub mentee_id: UserId,
    /// The offering this booking reserves (immutable after creation)
    pub offering_id: OfferingId,
    /// Session start, UTC
    pub scheduled_at: DateTime<Utc>,
    /// Session length copied from the offering at creation
    pub duration_minutes: u32,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Payment axis
    pub payment_status: PaymentStatus,
    /// Meeting link, set by the mentor once confirmed
    pub meeting_link: Option<String>,
    /// Private mentor notes, never exposed to the mentee
    pub mentor_notes: Option<String>,
    /// Free-text reason recorded on cancellation
    pub cancellation_reason: Option<String>,
    /// Which side cancelled
    pub cancelled_by: Option<CancelledBy>,
    /// Mentee rating, settable once after completion
    pub mentee_rating: Option<Rating>,
    /// Mentee feedback text, settable once after completion
    pub mentee_feedback: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Session end (start + billed duration), UTC
    #[must_use]
    pub fn end_at(&self) -> DateTime<Utc> {
        self.scheduled_at + chrono::Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Whether the status still participates in conflict detection
    #[must_use]
    pub const fn occupies_slot(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// What a feedback record refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    /// Feedback on a booking (session)
    Booking,
    /// Feedback on an article
    Article,
    /// Feedback on an event
    Event,
}

impl FeedbackKind {
    /// Stable string form used in storage and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Article => "article",
            Self::Event => "event",
        }
    }

    /// Parse the stable string form.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for unknown values.
    pub fn parse(s: &str) -> Result<Self, BookingError> {
        match s {
            "booking" => Ok(Self::Booking),
            "article" => Ok(Self::Article),
            "event" => Ok(Self::Event),
            other => Err(BookingError::Validation(format!("unknown feedback type: {other}"))),
        }
    }
}

/// Feedback visibility status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStatus {
    /// Visible
    Active,
    /// Hidden by the content owner or an admin
    Archived,
}

impl FeedbackStatus {
    /// Stable string form used in storage and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

/// A feedback record. At most one exists per
/// `(user_id, kind, reference_id)` triple; the storage layer enforces the
/// uniqueness so concurrent duplicate submissions resolve to exactly one
/// row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Feedback identifier
    pub id: FeedbackId,
    /// Author of the feedback
    pub user_id: UserId,
    /// What this feedback refers to
    pub kind: FeedbackKind,
    /// Identifier of the referenced booking/article/event
    pub reference_id: Uuid,
    /// Star rating
    pub rating: Rating,
    /// Optional comment
    pub comment: Option<String>,
    /// Response from the content owner (respond-once)
    pub mentor_response: Option<String>,
    /// Who responded
    pub responded_by: Option<UserId>,
    /// When the response was recorded
    pub responded_at: Option<DateTime<Utc>>,
    /// Visibility status
    pub status: FeedbackStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Profiles
// ============================================================================

/// Which side of the marketplace a profile belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    /// A mentor profile
    Mentor,
    /// A mentee profile
    Mentee,
}

/// Display data for a platform user, resolved once at the boundary through
/// [`crate::providers::ProfileDirectory`] rather than re-derived per call
/// site from whichever table happens to contain a name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user this profile describes
    pub user_id: UserId,
    /// Display name
    pub name: String,
    /// Contact email, when known
    pub email: Option<String>,
    /// Avatar URL, when set
    pub avatar_url: Option<String>,
    /// Marketplace side
    pub role: ProfileRole,
}
