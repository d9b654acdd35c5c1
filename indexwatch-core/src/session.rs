//! Market session clock.
//!
//! A session belongs to the instrument's market, not to the engine: the
//! timezone and trading hours come from configuration. The clock answers the
//! questions the dashboard needs on every refresh: which trading day is it,
//! how far into the session are we, and how many sample blocks exist so far.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Preferred chart window: one hour of 5-minute blocks.
pub const DEFAULT_WINDOW_BLOCKS: usize = 12;

/// Trading hours and sampling granularity of one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSession {
    /// IANA timezone name of the exchange, e.g. `Asia/Kolkata`.
    pub timezone: Tz,
    #[serde(with = "hhmm")]
    pub open: NaiveTime,
    #[serde(with = "hhmm")]
    pub close: NaiveTime,
    /// Width of one sample block in minutes.
    pub interval_minutes: u32,
}

impl Default for MarketSession {
    /// NSE/BSE cash session: 09:15–15:30 IST, 5-minute blocks.
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Kolkata,
            open: NaiveTime::from_hms_opt(9, 15, 0).expect("valid time"),
            close: NaiveTime::from_hms_opt(15, 30, 0).expect("valid time"),
            interval_minutes: 5,
        }
    }
}

impl MarketSession {
    /// Wall clock in the market's timezone.
    pub fn local_now(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.timezone)
    }

    /// The trading day `now` falls on, in market-local terms.
    pub fn session_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local_now(now).date_naive()
    }

    /// Length of the full session in minutes.
    pub fn length_minutes(&self) -> u32 {
        let secs = (self.close - self.open).num_seconds().max(0);
        (secs / 60) as u32
    }

    /// Minutes since the open, clamped to `[0, length_minutes]`.
    pub fn minutes_elapsed(&self, now: DateTime<Utc>) -> u32 {
        let local = self.local_now(now).time();
        if local < self.open {
            0
        } else if local > self.close {
            self.length_minutes()
        } else {
            ((local - self.open).num_seconds() / 60) as u32
        }
    }

    /// Number of complete sample blocks so far, never less than one.
    ///
    /// This is the upper bound of the window-size control.
    pub fn max_blocks(&self, now: DateTime<Utc>) -> usize {
        let interval = self.interval_minutes.max(1);
        ((self.minutes_elapsed(now) / interval) as usize).max(1)
    }

    /// Initial window size: the preferred block count, capped by what exists.
    pub fn default_blocks(&self, now: DateTime<Utc>, preferred: usize) -> usize {
        preferred.clamp(1, self.max_blocks(now))
    }

    /// Clamp a requested window size into `[1, max_blocks]`.
    pub fn clamp_blocks(&self, now: DateTime<Utc>, requested: usize) -> usize {
        requested.clamp(1, self.max_blocks(now))
    }

    /// Whether the market is inside its trading hours at `now`.
    ///
    /// Weekends count as closed; exchange holidays are not known here.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = self.local_now(now);
        let weekday = local.weekday().number_from_monday();
        if weekday > 5 {
            return false;
        }
        let t = local.time();
        t >= self.open && t <= self.close
    }

    /// Convert a UTC epoch timestamp into session-local time.
    pub fn localize(&self, epoch_secs: i64) -> Option<DateTime<FixedOffset>> {
        let utc = DateTime::from_timestamp(epoch_secs, 0)?;
        Some(utc.with_timezone(&self.timezone).fixed_offset())
    }

    /// Whether a session-local timestamp falls on `date` in market terms.
    pub fn is_on_date(&self, timestamp: &DateTime<FixedOffset>, date: NaiveDate) -> bool {
        timestamp.with_timezone(&self.timezone).date_naive() == date
    }

    /// Market-local open instant for `date`.
    pub fn open_at(&self, date: NaiveDate) -> Option<DateTime<Tz>> {
        self.timezone.from_local_datetime(&date.and_time(self.open)).single()
    }
}

/// `HH:MM` (or `HH:MM:SS`) serde adapter for session times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2024-03-04 is a Monday. IST is UTC+05:30.
    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    #[test]
    fn before_open_has_no_elapsed_minutes() {
        let s = MarketSession::default();
        // 03:00 UTC = 08:30 IST
        assert_eq!(s.minutes_elapsed(utc(3, 0)), 0);
        assert_eq!(s.max_blocks(utc(3, 0)), 1);
        assert!(!s.is_open(utc(3, 0)));
    }

    #[test]
    fn mid_session_counts_whole_blocks() {
        let s = MarketSession::default();
        // 05:02 UTC = 10:32 IST → 77 minutes → 15 blocks
        assert_eq!(s.minutes_elapsed(utc(5, 2)), 77);
        assert_eq!(s.max_blocks(utc(5, 2)), 15);
        assert!(s.is_open(utc(5, 2)));
    }

    #[test]
    fn after_close_clamps_to_full_session() {
        let s = MarketSession::default();
        // 12:00 UTC = 17:30 IST
        assert_eq!(s.length_minutes(), 375);
        assert_eq!(s.minutes_elapsed(utc(12, 0)), 375);
        assert_eq!(s.max_blocks(utc(12, 0)), 75);
        assert!(!s.is_open(utc(12, 0)));
    }

    #[test]
    fn default_blocks_caps_preferred_by_available() {
        let s = MarketSession::default();
        // 04:05 UTC = 09:35 IST → 20 minutes → 4 blocks
        assert_eq!(s.default_blocks(utc(4, 5), DEFAULT_WINDOW_BLOCKS), 4);
        assert_eq!(s.default_blocks(utc(12, 0), DEFAULT_WINDOW_BLOCKS), 12);
        assert_eq!(s.clamp_blocks(utc(12, 0), 0), 1);
        assert_eq!(s.clamp_blocks(utc(12, 0), 500), 75);
    }

    #[test]
    fn session_date_uses_market_timezone() {
        let s = MarketSession::default();
        // 2024-03-03 20:00 UTC is already 2024-03-04 01:30 IST
        let late = Utc.with_ymd_and_hms(2024, 3, 3, 20, 0, 0).unwrap();
        assert_eq!(s.session_date(late), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[test]
    fn weekend_is_closed() {
        let s = MarketSession::default();
        // 2024-03-09 is a Saturday; 05:00 UTC = 10:30 IST
        let saturday = Utc.with_ymd_and_hms(2024, 3, 9, 5, 0, 0).unwrap();
        assert!(!s.is_open(saturday));
    }

    #[test]
    fn localize_carries_market_offset() {
        let s = MarketSession::default();
        // 2024-03-04 03:45 UTC = 09:15 IST
        let ts = utc(3, 45).timestamp();
        let local = s.localize(ts).unwrap();
        assert_eq!(local.offset().local_minus_utc(), 5 * 3600 + 1800);
        assert_eq!(local.time(), NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        assert!(s.is_on_date(&local, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()));
        assert!(!s.is_on_date(&local, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
    }

    #[test]
    fn open_at_is_session_open_in_market_time() {
        let s = MarketSession::default();
        let open = s.open_at(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()).unwrap();
        assert_eq!(open.with_timezone(&Utc), utc(3, 45));
    }

    #[test]
    fn session_toml_roundtrip_uses_hhmm() {
        let s = MarketSession::default();
        let text = toml::to_string(&s).unwrap();
        assert!(text.contains("open = \"09:15\""));
        assert!(text.contains("timezone = \"Asia/Kolkata\""));
        let back: MarketSession = toml::from_str(&text).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn rejects_malformed_time() {
        let text = "timezone = \"Asia/Kolkata\"\nopen = \"9h15\"\nclose = \"15:30\"\ninterval_minutes = 5\n";
        assert!(toml::from_str::<MarketSession>(text).is_err());
    }
}
