//! Availability resolution and event creation.
//!
//! [`FreebusyResolver::resolve`] is the orchestrator: quota check, cache
//! lookups, one batched freebusy call for whatever the cache couldn't
//! answer, overlap computation and write-through. Provider trouble degrades
//! the outcome (partial `busy` map plus an [`EngineError`]) instead of
//! failing the whole check; only storage failures return `Err`.

use crate::auth::{is_credential_rejection, AccessTokenBroker};
use crate::error::{EngineError, ErrorCode};
use crate::error::TokenError;
use chrono::{DateTime, Utc};
use pollcal_common::services::{CalendarProvider, EventInput, FreeBusySchedule, Interval, ProviderError};
use pollcal_common::PollcalError;
use pollcal_config::models::CalendarCheckConfig;
use pollcal_db::{
    AvailabilityCacheRepository, CredentialRepository, RateLimiterRepository, SelectionRepository,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A candidate meeting time in a poll, identified by the poll's slot id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    pub fn new(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }

    fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

/// Result of one availability check.
///
/// `busy` holds every slot the check could answer; on a degraded check that
/// is the cache-hit subset and `error` names why the rest went unanswered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityOutcome {
    /// Busy flag per slot id. Ordered for stable rendering and logs.
    pub busy: BTreeMap<String, bool>,
    pub checked_at: DateTime<Utc>,
    pub error: Option<EngineError>,
}

impl AvailabilityOutcome {
    fn complete(busy: BTreeMap<String, bool>) -> Self {
        Self {
            busy,
            checked_at: Utc::now(),
            error: None,
        }
    }

    fn degraded(busy: BTreeMap<String, bool>, error: EngineError) -> Self {
        Self {
            busy,
            checked_at: Utc::now(),
            error: Some(error),
        }
    }

    /// Whether every requested slot was answered.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Whether two half-open intervals `[start, end)` intersect.
///
/// Back-to-back meetings do not collide: an interval ending at instant `t`
/// never overlaps one starting at `t`.
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.start < b.end && b.start < a.end
}

/// Whether the slot collides with any busy interval across all calendars in
/// the schedule; tentative intervals count only when the user says so.
pub fn slot_is_busy(slot: &Slot, schedule: &FreeBusySchedule, tentative_as_busy: bool) -> bool {
    let slot_interval = slot.interval();
    schedule.calendars.values().any(|calendar| {
        calendar
            .busy
            .iter()
            .any(|interval| overlaps(&slot_interval, interval))
            || (tentative_as_busy
                && calendar
                    .tentative
                    .iter()
                    .any(|interval| overlaps(&slot_interval, interval)))
    })
}

/// Map a freebusy-call failure onto the engine taxonomy.
pub(crate) fn classify_provider_error(err: ProviderError) -> EngineError {
    match err {
        ProviderError::Status { status, message } => EngineError::new(
            ErrorCode::from_status(status),
            format!("Calendar API returned status {}: {}", status, message),
        ),
        ProviderError::Malformed(message) => EngineError::new(
            ErrorCode::ApiError,
            format!("Calendar API returned an unreadable response: {}", message),
        ),
        ProviderError::Transport(message) => EngineError::new(
            ErrorCode::ApiError,
            format!("Calendar API request failed: {}", message),
        ),
        // The freebusy endpoint never speaks OAuth error bodies; treat it
        // like any other provider failure if it somehow does.
        ProviderError::TokenRejected { code, description } => EngineError::new(
            ErrorCode::ApiError,
            format!("Unexpected token rejection ({}): {}", code, description),
        ),
    }
}

/// Orchestrates one availability check for a (user, poll, slots) triple.
pub struct FreebusyResolver {
    broker: AccessTokenBroker,
    selections: Arc<dyn SelectionRepository>,
    cache: Arc<dyn AvailabilityCacheRepository>,
    limiter: Arc<dyn RateLimiterRepository>,
    provider: Arc<dyn CalendarProvider>,
    settings: CalendarCheckConfig,
}

impl FreebusyResolver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        selections: Arc<dyn SelectionRepository>,
        cache: Arc<dyn AvailabilityCacheRepository>,
        limiter: Arc<dyn RateLimiterRepository>,
        provider: Arc<dyn CalendarProvider>,
        provider_name: impl Into<String>,
        settings: CalendarCheckConfig,
    ) -> Self {
        let broker = AccessTokenBroker::new(credentials, Arc::clone(&provider), provider_name);
        Self {
            broker,
            selections,
            cache,
            limiter,
            provider,
            settings,
        }
    }

    /// Resolve busy/free for every slot of a poll.
    ///
    /// Slots answered from the cache never consume provider quota; the rate
    /// limit only guards the remote path but is charged up front, before the
    /// cache is consulted, so hammering refresh still gets throttled.
    pub async fn resolve(
        &self,
        user_id: &str,
        poll_id: &str,
        slots: &[Slot],
    ) -> Result<AvailabilityOutcome, PollcalError> {
        let mut busy: BTreeMap<String, bool> = BTreeMap::new();

        let limiter_key = format!("calendar_check:{}:{}", user_id, poll_id);
        if !self
            .limiter
            .check(&limiter_key, self.settings.checks_per_minute)
            .await?
        {
            warn!("Availability check quota exceeded for key: {}", limiter_key);
            return Ok(AvailabilityOutcome::degraded(busy, EngineError::rate_limited()));
        }

        let mut unanswered: Vec<&Slot> = Vec::new();
        for slot in slots {
            match self
                .cache
                .get(user_id, &slot.id, self.settings.cache_ttl_secs)
                .await?
            {
                Some(cached) => {
                    busy.insert(slot.id.clone(), cached);
                }
                None => unanswered.push(slot),
            }
        }

        if unanswered.is_empty() {
            debug!(
                "Availability for user {} poll {} served entirely from cache",
                user_id, poll_id
            );
            return Ok(AvailabilityOutcome::complete(busy));
        }

        let access_token = match self.broker.access_token(user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                return Ok(AvailabilityOutcome::degraded(
                    busy,
                    EngineError::not_connected(),
                ))
            }
            Err(TokenError::Provider { code, description }) => {
                let engine_code = if is_credential_rejection(&code) {
                    ErrorCode::TokenRefreshFailed
                } else {
                    ErrorCode::ApiError
                };
                return Ok(AvailabilityOutcome::degraded(
                    busy,
                    EngineError::new(engine_code, format!("{}: {}", code, description)),
                ));
            }
            Err(TokenError::RequestFailed(message)) => {
                return Ok(AvailabilityOutcome::degraded(
                    busy,
                    EngineError::new(ErrorCode::RequestFailed, message),
                ))
            }
            Err(TokenError::Storage(e)) => return Err(e.into()),
        };

        let calendar_ids = self
            .selections
            .selected_ids(user_id)
            .await?;
        if calendar_ids.is_empty() {
            return Ok(AvailabilityOutcome::degraded(
                busy,
                EngineError::no_calendars(),
            ));
        }
        let tentative_as_busy = self
            .selections
            .tentative_as_busy(user_id)
            .await?;

        // One batched call spanning every unanswered slot; per-slot requests
        // would multiply quota cost for no benefit.
        let (Some(range_start), Some(range_end)) = (
            unanswered.iter().map(|slot| slot.start).min(),
            unanswered.iter().map(|slot| slot.end).max(),
        ) else {
            return Ok(AvailabilityOutcome::complete(busy));
        };

        let schedule = match self
            .provider
            .query_free_busy(&access_token, range_start, range_end, &calendar_ids)
            .await
        {
            Ok(schedule) => schedule,
            Err(err) => {
                warn!("Freebusy query failed for user {}: {}", user_id, err);
                return Ok(AvailabilityOutcome::degraded(
                    busy,
                    classify_provider_error(err),
                ));
            }
        };

        for slot in unanswered {
            let slot_busy = slot_is_busy(slot, &schedule, tentative_as_busy);
            self.cache
                .set(user_id, poll_id, &slot.id, slot_busy)
                .await?;
            busy.insert(slot.id.clone(), slot_busy);
        }

        Ok(AvailabilityOutcome::complete(busy))
    }
}

/// Creates the final calendar event once a poll has been scheduled.
///
/// Event creation is best-effort: a poll gets scheduled whether or not the
/// organizer's calendar accepts the event, so every failure path here logs
/// and returns `None` instead of propagating.
pub struct EventCreator {
    broker: AccessTokenBroker,
    provider: Arc<dyn CalendarProvider>,
}

impl EventCreator {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        provider: Arc<dyn CalendarProvider>,
        provider_name: impl Into<String>,
    ) -> Self {
        let broker = AccessTokenBroker::new(credentials, Arc::clone(&provider), provider_name);
        Self { broker, provider }
    }

    /// Insert the event, returning the remote event id when one was created.
    ///
    /// Callers are responsible for not scheduling the same poll twice; this
    /// method performs no deduplication.
    pub async fn create_event(&self, user_id: &str, event: EventInput) -> Option<String> {
        let access_token = match self.broker.access_token(user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(
                    "Skipping calendar event for user {}: no account connected",
                    user_id
                );
                return None;
            }
            Err(e) => {
                warn!(
                    "Token acquisition failed before event creation for user {}: {}",
                    user_id, e
                );
                return None;
            }
        };

        match self.provider.insert_event(&access_token, event).await {
            Ok(created) => {
                info!(
                    "Created calendar event for user {} (id: {:?}, status: {})",
                    user_id, created.event_id, created.status
                );
                created.event_id
            }
            Err(e) => {
                warn!("Calendar event insert failed for user {}: {}", user_id, e);
                None
            }
        }
    }
}
