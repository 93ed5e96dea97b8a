//! `PostgreSQL`-backed provider implementations.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use mentorbook_booking::error::{BookingError, Result};
use mentorbook_booking::providers::{
    AvailabilityStore, BookingRepository, ContentDirectory, FeedbackFilter, FeedbackRepository,
    OfferingCatalog, ProfileDirectory,
};
use mentorbook_booking::schedule::BufferedSpan;
use mentorbook_booking::types::{
    AvailabilitySlot, Booking, BookingId, BookingStatus, CancelledBy, Feedback, FeedbackId,
    FeedbackKind, FeedbackStatus, Money, Offering, OfferingId, OfferingStatus, PaymentStatus,
    ProfileRole, Rating, UserId, UserProfile,
};
use sqlx::postgres::types::PgRange;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::ops::Bound;
use uuid::Uuid;

/// One store for every Mentorbook provider trait, backed by a shared
/// connection pool.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the given database URL.
    ///
    /// # Errors
    ///
    /// Returns the underlying `sqlx` error when the pool cannot be
    /// established.
    pub async fn connect(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool (e.g. for migrations).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ============================================================================
// Error and column mapping
// ============================================================================

fn db_err(err: sqlx::Error) -> BookingError {
    match err {
        sqlx::Error::PoolTimedOut => BookingError::Timeout,
        other => BookingError::Unavailable(other.to_string()),
    }
}

fn constraint_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.code().map(|code| code.into_owned()),
        _ => None,
    }
}

fn corrupt(context: &str) -> BookingError {
    BookingError::Unavailable(format!("corrupt row: {context}"))
}

fn col_u32(row: &PgRow, name: &str) -> Result<u32> {
    let value: i32 = row.try_get(name).map_err(db_err)?;
    u32::try_from(value).map_err(|_| corrupt(name))
}

fn to_i32(value: u32, name: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| BookingError::Validation(format!("{name} out of range")))
}

fn booking_from_row(row: &PgRow) -> Result<Booking> {
    let status: String = row.try_get("status").map_err(db_err)?;
    let payment_status: String = row.try_get("payment_status").map_err(db_err)?;
    let cancelled_by: Option<String> = row.try_get("cancelled_by").map_err(db_err)?;
    let rating: Option<i16> = row.try_get("mentee_rating").map_err(db_err)?;

    Ok(Booking {
        id: BookingId::from_uuid(row.try_get("id").map_err(db_err)?),
        mentor_id: UserId::from_uuid(row.try_get("mentor_id").map_err(db_err)?),
        mentee_id: UserId::from_uuid(row.try_get("mentee_id").map_err(db_err)?),
        offering_id: OfferingId::from_uuid(row.try_get("offering_id").map_err(db_err)?),
        scheduled_at: row.try_get("scheduled_at").map_err(db_err)?,
        duration_minutes: col_u32(row, "duration_minutes")?,
        status: BookingStatus::parse(&status).map_err(|_| corrupt("status"))?,
        payment_status: PaymentStatus::parse(&payment_status)
            .map_err(|_| corrupt("payment_status"))?,
        meeting_link: row.try_get("meeting_link").map_err(db_err)?,
        mentor_notes: row.try_get("mentor_notes").map_err(db_err)?,
        cancellation_reason: row.try_get("cancellation_reason").map_err(db_err)?,
        cancelled_by: match cancelled_by.as_deref() {
            None => None,
            Some("mentor") => Some(CancelledBy::Mentor),
            Some("mentee") => Some(CancelledBy::Mentee),
            Some(_) => return Err(corrupt("cancelled_by")),
        },
        mentee_rating: match rating {
            None => None,
            Some(value) => Some(
                u8::try_from(value)
                    .ok()
                    .and_then(|v| Rating::new(v).ok())
                    .ok_or_else(|| corrupt("mentee_rating"))?,
            ),
        },
        mentee_feedback: row.try_get("mentee_feedback").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn offering_from_row(row: &PgRow) -> Result<Offering> {
    let status: String = row.try_get("status").map_err(db_err)?;
    Ok(Offering {
        id: OfferingId::from_uuid(row.try_get("id").map_err(db_err)?),
        mentor_id: UserId::from_uuid(row.try_get("mentor_id").map_err(db_err)?),
        title: row.try_get("title").map_err(db_err)?,
        duration_minutes: col_u32(row, "duration_minutes")?,
        buffer_before_minutes: col_u32(row, "buffer_before_minutes")?,
        buffer_after_minutes: col_u32(row, "buffer_after_minutes")?,
        max_bookings_per_day: col_u32(row, "max_bookings_per_day")?,
        advance_booking_days: col_u32(row, "advance_booking_days")?,
        min_notice_hours: col_u32(row, "min_notice_hours")?,
        price: Money::from_cents(row.try_get("price_cents").map_err(db_err)?),
        status: OfferingStatus::parse(&status).map_err(|_| corrupt("offering status"))?,
    })
}

fn slot_from_row(row: &PgRow) -> Result<AvailabilitySlot> {
    let day: i16 = row.try_get("day_of_week").map_err(db_err)?;
    let timezone: String = row.try_get("timezone").map_err(db_err)?;
    Ok(AvailabilitySlot {
        mentor_id: UserId::from_uuid(row.try_get("mentor_id").map_err(db_err)?),
        day_of_week: u8::try_from(day).map_err(|_| corrupt("day_of_week"))?,
        start_time: row.try_get::<NaiveTime, _>("start_time").map_err(db_err)?,
        end_time: row.try_get::<NaiveTime, _>("end_time").map_err(db_err)?,
        timezone: timezone.parse::<Tz>().map_err(|_| corrupt("timezone"))?,
    })
}

fn feedback_from_row(row: &PgRow) -> Result<Feedback> {
    let kind: String = row.try_get("feedback_type").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;
    let rating: i16 = row.try_get("rating").map_err(db_err)?;

    Ok(Feedback {
        id: FeedbackId::from_uuid(row.try_get("id").map_err(db_err)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(db_err)?),
        kind: FeedbackKind::parse(&kind).map_err(|_| corrupt("feedback_type"))?,
        reference_id: row.try_get("reference_id").map_err(db_err)?,
        rating: u8::try_from(rating)
            .ok()
            .and_then(|v| Rating::new(v).ok())
            .ok_or_else(|| corrupt("rating"))?,
        comment: row.try_get("comment").map_err(db_err)?,
        mentor_response: row.try_get("mentor_response").map_err(db_err)?,
        responded_by: row
            .try_get::<Option<Uuid>, _>("responded_by")
            .map_err(db_err)?
            .map(UserId::from_uuid),
        responded_at: row.try_get("responded_at").map_err(db_err)?,
        status: match status.as_str() {
            "active" => FeedbackStatus::Active,
            "archived" => FeedbackStatus::Archived,
            _ => return Err(corrupt("feedback status")),
        },
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

// ============================================================================
// OfferingCatalog
// ============================================================================

impl OfferingCatalog for PgBookingStore {
    async fn offering(&self, id: OfferingId) -> Result<Option<Offering>> {
        sqlx::query("SELECT * FROM offerings WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| offering_from_row(&row))
            .transpose()
    }

    async fn offerings_for_mentor(&self, mentor: UserId) -> Result<Vec<Offering>> {
        sqlx::query("SELECT * FROM offerings WHERE mentor_id = $1")
            .bind(mentor.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(offering_from_row)
            .collect()
    }
}

// ============================================================================
// AvailabilityStore
// ============================================================================

impl AvailabilityStore for PgBookingStore {
    async fn slots_for_mentor(&self, mentor: UserId) -> Result<Vec<AvailabilitySlot>> {
        sqlx::query(
            "SELECT * FROM mentor_availability WHERE mentor_id = $1 \
             ORDER BY day_of_week ASC, start_time ASC",
        )
        .bind(mentor.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(slot_from_row)
        .collect()
    }

    async fn replace_slots(
        &self,
        mentor: UserId,
        slots: Vec<AvailabilitySlot>,
    ) -> Result<Vec<AvailabilitySlot>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM mentor_availability WHERE mentor_id = $1")
            .bind(mentor.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        for slot in &slots {
            sqlx::query(
                "INSERT INTO mentor_availability \
                 (mentor_id, day_of_week, start_time, end_time, timezone) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(mentor.as_uuid())
            .bind(i16::from(slot.day_of_week))
            .bind(slot.start_time)
            .bind(slot.end_time)
            .bind(slot.timezone.name())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        self.slots_for_mentor(mentor).await
    }
}

// ============================================================================
// BookingRepository
// ============================================================================

impl BookingRepository for PgBookingStore {
    async fn booking(&self, id: BookingId) -> Result<Option<Booking>> {
        sqlx::query("SELECT * FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| booking_from_row(&row))
            .transpose()
    }

    async fn active_for_mentor(&self, mentor: UserId) -> Result<Vec<Booking>> {
        sqlx::query(
            "SELECT * FROM bookings \
             WHERE mentor_id = $1 AND status IN ('pending', 'confirmed')",
        )
        .bind(mentor.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(booking_from_row)
        .collect()
    }

    async fn bookings_for_user(&self, user: UserId) -> Result<Vec<Booking>> {
        sqlx::query(
            "SELECT * FROM bookings \
             WHERE mentor_id = $1 OR mentee_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(booking_from_row)
        .collect()
    }

    async fn insert_booking(&self, booking: &Booking, span: BufferedSpan) -> Result<()> {
        let span_range: PgRange<DateTime<Utc>> =
            PgRange { start: Bound::Included(span.start), end: Bound::Excluded(span.end) };

        sqlx::query(
            "INSERT INTO bookings \
             (id, mentor_id, mentee_id, offering_id, scheduled_at, duration_minutes, \
              status, payment_status, meeting_link, mentor_notes, cancellation_reason, \
              cancelled_by, mentee_rating, mentee_feedback, booked_span, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.mentor_id.as_uuid())
        .bind(booking.mentee_id.as_uuid())
        .bind(booking.offering_id.as_uuid())
        .bind(booking.scheduled_at)
        .bind(to_i32(booking.duration_minutes, "duration_minutes")?)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.meeting_link.as_deref())
        .bind(booking.mentor_notes.as_deref())
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.cancelled_by.map(|c| c.as_str()))
        .bind(booking.mentee_rating.map(|r| i16::from(r.value())))
        .bind(booking.mentee_feedback.as_deref())
        .bind(span_range)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match constraint_code(&err).as_deref() {
            // exclusion_violation on bookings_no_overlap: the race lost.
            Some("23P01") => {
                tracing::warn!(
                    booking_id = %booking.id,
                    mentor_id = %booking.mentor_id,
                    "insert rejected by overlap constraint"
                );
                BookingError::SlotConflict
            },
            _ => db_err(err),
        })?;

        Ok(())
    }

    async fn update_booking(&self, booking: &Booking, expected_status: BookingStatus) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE bookings SET \
             status = $2, payment_status = $3, meeting_link = $4, mentor_notes = $5, \
             cancellation_reason = $6, cancelled_by = $7, mentee_rating = $8, \
             mentee_feedback = $9, updated_at = $10 \
             WHERE id = $1 AND status = $11",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.meeting_link.as_deref())
        .bind(booking.mentor_notes.as_deref())
        .bind(booking.cancellation_reason.as_deref())
        .bind(booking.cancelled_by.map(|c| c.as_str()))
        .bind(booking.mentee_rating.map(|r| i16::from(r.value())))
        .bind(booking.mentee_feedback.as_deref())
        .bind(booking.updated_at)
        .bind(expected_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// FeedbackRepository
// ============================================================================

impl FeedbackRepository for PgBookingStore {
    async fn feedback(&self, id: FeedbackId) -> Result<Option<Feedback>> {
        sqlx::query("SELECT * FROM feedback WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| feedback_from_row(&row))
            .transpose()
    }

    async fn insert_feedback(&self, feedback: &Feedback) -> Result<()> {
        sqlx::query(
            "INSERT INTO feedback \
             (id, user_id, feedback_type, reference_id, rating, comment, mentor_response, \
              responded_by, responded_at, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(feedback.id.as_uuid())
        .bind(feedback.user_id.as_uuid())
        .bind(feedback.kind.as_str())
        .bind(feedback.reference_id)
        .bind(i16::from(feedback.rating.value()))
        .bind(feedback.comment.as_deref())
        .bind(feedback.mentor_response.as_deref())
        .bind(feedback.responded_by.map(|u| *u.as_uuid()))
        .bind(feedback.responded_at)
        .bind(feedback.status.as_str())
        .bind(feedback.created_at)
        .bind(feedback.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match constraint_code(&err).as_deref() {
            // unique_violation on feedback_once_per_reference.
            Some("23505") => BookingError::DuplicateFeedback,
            _ => db_err(err),
        })?;

        Ok(())
    }

    async fn update_feedback(&self, feedback: &Feedback) -> Result<()> {
        let result = sqlx::query(
            "UPDATE feedback SET \
             rating = $2, comment = $3, mentor_response = $4, responded_by = $5, \
             responded_at = $6, status = $7, updated_at = $8 \
             WHERE id = $1",
        )
        .bind(feedback.id.as_uuid())
        .bind(i16::from(feedback.rating.value()))
        .bind(feedback.comment.as_deref())
        .bind(feedback.mentor_response.as_deref())
        .bind(feedback.responded_by.map(|u| *u.as_uuid()))
        .bind(feedback.responded_at)
        .bind(feedback.status.as_str())
        .bind(feedback.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound { entity: "feedback" });
        }
        Ok(())
    }

    async fn list(&self, filter: FeedbackFilter) -> Result<Vec<Feedback>> {
        sqlx::query(
            "SELECT * FROM feedback \
             WHERE ($1::TEXT IS NULL OR feedback_type = $1) \
               AND ($2::UUID IS NULL OR reference_id = $2) \
               AND ($3::TEXT IS NULL OR status = $3) \
             ORDER BY created_at DESC",
        )
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.reference_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(feedback_from_row)
        .collect()
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Feedback>> {
        // One query across the three content kinds, instead of probing
        // tables per feedback row.
        sqlx::query(
            "SELECT f.* FROM feedback f \
             WHERE (f.feedback_type = 'booking' AND EXISTS ( \
                        SELECT 1 FROM bookings b \
                        WHERE b.id = f.reference_id AND b.mentor_id = $1)) \
                OR (f.feedback_type = 'article' AND EXISTS ( \
                        SELECT 1 FROM articles a \
                        WHERE a.id = f.reference_id AND a.author_id = $1)) \
                OR (f.feedback_type = 'event' AND EXISTS ( \
                        SELECT 1 FROM events e \
                        WHERE e.id = f.reference_id AND e.created_by = $1)) \
             ORDER BY f.created_at DESC",
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?
        .iter()
        .map(feedback_from_row)
        .collect()
    }
}

// ============================================================================
// Directories
// ============================================================================

impl ContentDirectory for PgBookingStore {
    async fn reference_exists(&self, kind: FeedbackKind, reference_id: Uuid) -> Result<bool> {
        let query = match kind {
            FeedbackKind::Booking => "SELECT EXISTS (SELECT 1 FROM bookings WHERE id = $1)",
            FeedbackKind::Article => "SELECT EXISTS (SELECT 1 FROM articles WHERE id = $1)",
            FeedbackKind::Event => "SELECT EXISTS (SELECT 1 FROM events WHERE id = $1)",
        };
        let row = sqlx::query(query)
            .bind(reference_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get::<bool, _>(0).map_err(db_err)
    }

    async fn owner_of(&self, kind: FeedbackKind, reference_id: Uuid) -> Result<Option<UserId>> {
        let query = match kind {
            FeedbackKind::Booking => "SELECT mentor_id AS owner FROM bookings WHERE id = $1",
            FeedbackKind::Article => "SELECT author_id AS owner FROM articles WHERE id = $1",
            FeedbackKind::Event => "SELECT created_by AS owner FROM events WHERE id = $1",
        };
        let row = sqlx::query(query)
            .bind(reference_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.try_get::<Uuid, _>("owner").map(UserId::from_uuid).map_err(db_err))
            .transpose()
    }
}

impl ProfileDirectory for PgBookingStore {
    async fn profile(&self, user: UserId) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(|r| {
            let role: String = r.try_get("role").map_err(db_err)?;
            Ok(UserProfile {
                user_id: UserId::from_uuid(r.try_get("user_id").map_err(db_err)?),
                name: r.try_get("name").map_err(db_err)?,
                email: r.try_get("email").map_err(db_err)?,
                avatar_url: r.try_get("avatar_url").map_err(db_err)?,
                role: match role.as_str() {
                    "mentor" => ProfileRole::Mentor,
                    "mentee" => ProfileRole::Mentee,
                    _ => return Err(corrupt("profile role")),
                },
            })
        })
        .transpose()
    }
}
