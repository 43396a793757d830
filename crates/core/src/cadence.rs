//! Digest cadence and due-ness evaluation.
//!
//! A digest is "due" for a user when their preferred send instant for the
//! current period (local calendar day, or anchor day of the current ISO
//! week) has been reached. Evaluation happens in the timezone stored on the
//! preference record, never in server time. All functions here are pure so
//! the timezone edge cases (DST gaps, fold times, late ticks) are testable
//! without a database or a clock.
//!
//! The predicate deliberately stays true for the rest of the period once
//! the send instant has passed: a tick that fires late must still pick the
//! user up, and the `digest_sends` marker is what prevents double sends.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// DigestKind
// ---------------------------------------------------------------------------

/// The two scheduled digest frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    Daily,
    Weekly,
}

impl DigestKind {
    /// Stable string form, matching the `digest_sends.kind` column and the
    /// `notification_preferences.frequency` values.
    pub fn as_str(self) -> &'static str {
        match self {
            DigestKind::Daily => "daily",
            DigestKind::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for DigestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SendSpec
// ---------------------------------------------------------------------------

/// A user's preferred send schedule, decoded from their preference row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendSpec {
    /// Preferred send hour, 0-23, in `tz`.
    pub hour: u32,
    /// Preferred send minute, 0-59, in `tz`.
    pub minute: u32,
    /// Day of week a weekly digest goes out.
    pub weekly_anchor: Weekday,
    /// Timezone the schedule is evaluated in.
    pub tz: Tz,
}

impl SendSpec {
    /// Decode a spec from raw column values.
    ///
    /// `anchor` is an ISO weekday number (1 = Monday .. 7 = Sunday), the
    /// representation stored in `notification_preferences.weekly_anchor`.
    pub fn from_parts(hour: i16, minute: i16, anchor: i16, tz_name: &str) -> Result<Self, CoreError> {
        if !(0..=23).contains(&hour) {
            return Err(CoreError::Validation(format!(
                "send hour must be 0-23, got {hour}"
            )));
        }
        if !(0..=59).contains(&minute) {
            return Err(CoreError::Validation(format!(
                "send minute must be 0-59, got {minute}"
            )));
        }
        let weekly_anchor = weekday_from_iso(anchor).ok_or_else(|| {
            CoreError::Validation(format!("weekly anchor must be 1-7 (ISO), got {anchor}"))
        })?;
        let tz: Tz = tz_name
            .parse()
            .map_err(|_| CoreError::Validation(format!("unknown timezone: {tz_name}")))?;
        Ok(Self {
            hour: hour as u32,
            minute: minute as u32,
            weekly_anchor,
            tz,
        })
    }
}

/// Validate an IANA timezone name against the tz database.
pub fn validate_timezone(name: &str) -> Result<(), CoreError> {
    name.parse::<Tz>()
        .map(|_| ())
        .map_err(|_| CoreError::Validation(format!("unknown timezone: {name}")))
}

/// Map an ISO weekday number (1 = Monday .. 7 = Sunday) to [`Weekday`].
pub fn weekday_from_iso(n: i16) -> Option<Weekday> {
    match n {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Periods and windows
// ---------------------------------------------------------------------------

/// The half-open UTC time range a digest summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// A period for which a digest is currently due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuePeriod {
    /// Idempotency key: `YYYY-MM-DD` for daily, `YYYY-Www` (ISO week) for
    /// weekly, both in the user's local calendar.
    pub period_key: String,
    /// Period start (local midnight / ISO-week Monday midnight) up to the
    /// preferred send instant.
    pub window: Window,
}

/// Resolve a local wall-clock time to a UTC instant.
///
/// Times inside a daylight-saving gap resolve to the nearest valid time
/// forward (in 15-minute steps). Ambiguous fold times resolve to the
/// earlier of the two instants.
pub fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let mut candidate = naive;
    // DST gaps are at most a couple of hours anywhere in the tz database;
    // the bound only exists to make the loop obviously finite.
    for _ in 0..=12 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(t) => return t.with_timezone(&Utc),
            LocalResult::Ambiguous(earlier, _) => return earlier.with_timezone(&Utc),
            LocalResult::None => candidate += Duration::minutes(15),
        }
    }
    // Unreachable for real timezone data; fall back to treating the wall
    // clock as UTC rather than panicking inside the scheduler.
    Utc.from_utc_datetime(&naive)
}

/// Evaluate due-ness of `kind` for `spec` at `reference`.
///
/// Returns `Some` once the user's preferred send instant for the current
/// period has been reached, carrying the period key and summary window.
pub fn due_period(kind: DigestKind, spec: &SendSpec, reference: Timestamp) -> Option<DuePeriod> {
    match kind {
        DigestKind::Daily => daily_period(spec, reference),
        DigestKind::Weekly => weekly_period(spec, reference),
    }
}

fn daily_period(spec: &SendSpec, reference: Timestamp) -> Option<DuePeriod> {
    let local_date = reference.with_timezone(&spec.tz).date_naive();
    let target = resolve_local(spec.tz, send_time_on(local_date, spec)?);
    if target > reference {
        return None;
    }
    let start = resolve_local(spec.tz, local_date.and_hms_opt(0, 0, 0)?);
    Some(DuePeriod {
        period_key: local_date.format("%Y-%m-%d").to_string(),
        window: Window { start, end: target },
    })
}

fn weekly_period(spec: &SendSpec, reference: Timestamp) -> Option<DuePeriod> {
    let local_date = reference.with_timezone(&spec.tz).date_naive();
    let iso = local_date.iso_week();
    let anchor_date = NaiveDate::from_isoywd_opt(iso.year(), iso.week(), spec.weekly_anchor)?;
    let target = resolve_local(spec.tz, send_time_on(anchor_date, spec)?);
    if target > reference {
        return None;
    }
    let monday = NaiveDate::from_isoywd_opt(iso.year(), iso.week(), Weekday::Mon)?;
    let start = resolve_local(spec.tz, monday.and_hms_opt(0, 0, 0)?);
    Some(DuePeriod {
        period_key: format!("{}-W{:02}", iso.year(), iso.week()),
        window: Window { start, end: target },
    })
}

/// The period containing `reference`, without the send-time gate.
///
/// Administrative resends bypass due-ness but still need a period key for
/// the idempotency marker and a window for content generation; the window
/// runs from the period start up to `reference` itself.
pub fn current_period(kind: DigestKind, spec: &SendSpec, reference: Timestamp) -> Option<DuePeriod> {
    let local_date = reference.with_timezone(&spec.tz).date_naive();
    match kind {
        DigestKind::Daily => {
            let start = resolve_local(spec.tz, local_date.and_hms_opt(0, 0, 0)?);
            Some(DuePeriod {
                period_key: local_date.format("%Y-%m-%d").to_string(),
                window: Window {
                    start,
                    end: reference,
                },
            })
        }
        DigestKind::Weekly => {
            let iso = local_date.iso_week();
            let monday = NaiveDate::from_isoywd_opt(iso.year(), iso.week(), Weekday::Mon)?;
            let start = resolve_local(spec.tz, monday.and_hms_opt(0, 0, 0)?);
            Some(DuePeriod {
                period_key: format!("{}-W{:02}", iso.year(), iso.week()),
                window: Window {
                    start,
                    end: reference,
                },
            })
        }
    }
}

fn send_time_on(date: NaiveDate, spec: &SendSpec) -> Option<NaiveDateTime> {
    date.and_hms_opt(spec.hour, spec.minute, 0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn spec(hour: u32, minute: u32, anchor: Weekday, tz: Tz) -> SendSpec {
        SendSpec {
            hour,
            minute,
            weekly_anchor: anchor,
            tz,
        }
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // Daily due-ness
    // -----------------------------------------------------------------------

    #[test]
    fn daily_due_exactly_at_preferred_time() {
        // 08:00 America/New_York == 12:00 UTC during EDT.
        let s = spec(8, 0, Weekday::Mon, chrono_tz::America::New_York);
        let due = due_period(DigestKind::Daily, &s, utc(2026, 8, 4, 12, 0)).unwrap();
        assert_eq!(due.period_key, "2026-08-04");
        // Window starts at local midnight (04:00 UTC) and ends at the send instant.
        assert_eq!(due.window.start, utc(2026, 8, 4, 4, 0));
        assert_eq!(due.window.end, utc(2026, 8, 4, 12, 0));
    }

    #[test]
    fn daily_not_due_before_preferred_time() {
        let s = spec(8, 0, Weekday::Mon, chrono_tz::America::New_York);
        assert!(due_period(DigestKind::Daily, &s, utc(2026, 8, 4, 11, 59)).is_none());
    }

    #[test]
    fn daily_still_due_later_the_same_local_day() {
        // A tick that fires hours late must not skip the user.
        let s = spec(8, 0, Weekday::Mon, chrono_tz::America::New_York);
        let due = due_period(DigestKind::Daily, &s, utc(2026, 8, 4, 22, 0)).unwrap();
        assert_eq!(due.period_key, "2026-08-04");
        assert_eq!(due.window.end, utc(2026, 8, 4, 12, 0));
    }

    #[test]
    fn daily_period_key_uses_local_calendar_day() {
        // 01:00 UTC on Aug 5 is still Aug 4 in New York.
        let s = spec(20, 0, Weekday::Mon, chrono_tz::America::New_York);
        let due = due_period(DigestKind::Daily, &s, utc(2026, 8, 5, 1, 0)).unwrap();
        assert_eq!(due.period_key, "2026-08-04");
    }

    // -----------------------------------------------------------------------
    // DST edge cases
    // -----------------------------------------------------------------------

    #[test]
    fn dst_gap_resolves_to_nearest_valid_time_forward() {
        // Europe/Berlin springs forward 02:00 -> 03:00 on 2026-03-29, so a
        // 02:30 preferred time does not exist; it resolves to 03:00 CEST,
        // which is 01:00 UTC.
        let naive = NaiveDate::from_ymd_opt(2026, 3, 29)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = resolve_local(chrono_tz::Europe::Berlin, naive);
        assert_eq!(resolved, utc(2026, 3, 29, 1, 0));
    }

    #[test]
    fn dst_fold_resolves_to_earlier_instant() {
        // Europe/Berlin falls back on 2026-10-25; 02:30 occurs twice and the
        // earlier occurrence (CEST, UTC+2) wins.
        let naive = NaiveDate::from_ymd_opt(2026, 10, 25)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = resolve_local(chrono_tz::Europe::Berlin, naive);
        assert_eq!(resolved, utc(2026, 10, 25, 0, 30));
    }

    #[test]
    fn daily_due_on_spring_forward_day() {
        let s = spec(2, 30, Weekday::Mon, chrono_tz::Europe::Berlin);
        let due = due_period(DigestKind::Daily, &s, utc(2026, 3, 29, 1, 0)).unwrap();
        assert_eq!(due.period_key, "2026-03-29");
        assert_eq!(due.window.end, utc(2026, 3, 29, 1, 0));
    }

    // -----------------------------------------------------------------------
    // Weekly due-ness
    // -----------------------------------------------------------------------

    #[test]
    fn weekly_due_on_anchor_day() {
        // 2026-08-05 is the Wednesday of ISO week 32.
        let s = spec(9, 0, Weekday::Wed, Tz::UTC);
        let due = due_period(DigestKind::Weekly, &s, utc(2026, 8, 5, 9, 0)).unwrap();
        assert_eq!(due.period_key, "2026-W32");
        // Week window opens on Monday midnight.
        assert_eq!(due.window.start, utc(2026, 8, 3, 0, 0));
        assert_eq!(due.window.end, utc(2026, 8, 5, 9, 0));
    }

    #[test]
    fn weekly_not_due_before_anchor_day() {
        let s = spec(9, 0, Weekday::Fri, Tz::UTC);
        assert!(due_period(DigestKind::Weekly, &s, utc(2026, 8, 5, 9, 0)).is_none());
    }

    #[test]
    fn weekly_still_due_after_anchor_day_within_the_same_week() {
        let s = spec(9, 0, Weekday::Mon, Tz::UTC);
        let due = due_period(DigestKind::Weekly, &s, utc(2026, 8, 5, 12, 0)).unwrap();
        assert_eq!(due.period_key, "2026-W32");
        assert_eq!(due.window.end, utc(2026, 8, 3, 9, 0));
    }

    #[test]
    fn weekly_period_key_is_zero_padded() {
        // 2026-02-02 falls in ISO week 6.
        let s = spec(0, 0, Weekday::Mon, Tz::UTC);
        let due = due_period(DigestKind::Weekly, &s, utc(2026, 2, 2, 0, 0)).unwrap();
        assert_eq!(due.period_key, "2026-W06");
    }

    // -----------------------------------------------------------------------
    // SendSpec decoding
    // -----------------------------------------------------------------------

    #[test]
    fn from_parts_accepts_valid_values() {
        let s = SendSpec::from_parts(8, 30, 3, "Europe/Berlin").unwrap();
        assert_eq!(s.hour, 8);
        assert_eq!(s.minute, 30);
        assert_eq!(s.weekly_anchor, Weekday::Wed);
        assert_eq!(s.tz, chrono_tz::Europe::Berlin);
    }

    #[test]
    fn from_parts_rejects_out_of_range_hour() {
        assert!(SendSpec::from_parts(24, 0, 1, "UTC").is_err());
    }

    #[test]
    fn from_parts_rejects_out_of_range_anchor() {
        assert!(SendSpec::from_parts(8, 0, 0, "UTC").is_err());
        assert!(SendSpec::from_parts(8, 0, 8, "UTC").is_err());
    }

    #[test]
    fn from_parts_rejects_unknown_timezone() {
        assert!(SendSpec::from_parts(8, 0, 1, "Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn current_period_ignores_the_send_time_gate() {
        // 05:00 UTC is before the user's 08:00 preferred time, but a manual
        // trigger still resolves today's period with the window capped at
        // the reference instant.
        let s = spec(8, 0, Weekday::Mon, Tz::UTC);
        assert!(due_period(DigestKind::Daily, &s, utc(2026, 8, 4, 5, 0)).is_none());

        let period = current_period(DigestKind::Daily, &s, utc(2026, 8, 4, 5, 0)).unwrap();
        assert_eq!(period.period_key, "2026-08-04");
        assert_eq!(period.window.start, utc(2026, 8, 4, 0, 0));
        assert_eq!(period.window.end, utc(2026, 8, 4, 5, 0));
    }

    #[test]
    fn current_weekly_period_matches_due_period_key() {
        let s = spec(9, 0, Weekday::Fri, Tz::UTC);
        let period = current_period(DigestKind::Weekly, &s, utc(2026, 8, 5, 9, 0)).unwrap();
        assert_eq!(period.period_key, "2026-W32");
        assert_eq!(period.window.start, utc(2026, 8, 3, 0, 0));
    }

    #[test]
    fn digest_kind_round_trips_as_str() {
        assert_eq!(DigestKind::Daily.as_str(), "daily");
        assert_eq!(DigestKind::Weekly.as_str(), "weekly");
    }
}
