//! Offer countdown formatting for promotions and coupons.

use chrono::{DateTime, Utc};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86400;

/// Describes how long an offer remains valid.
///
/// - no end date: `"no expiry"`
/// - already ended: `"expired"`
/// - under an hour: `"12m left"`
/// - under a day: `"5h 12m left"`
/// - otherwise: `"3d 4h left"`
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use rentadmin::domain::offer_countdown;
///
/// let now = Utc::now();
/// assert_eq!(offer_countdown(Some(now + Duration::minutes(90)), now), "1h 30m left");
/// assert_eq!(offer_countdown(Some(now - Duration::seconds(1)), now), "expired");
/// assert_eq!(offer_countdown(None, now), "no expiry");
/// ```
#[must_use]
pub fn offer_countdown(ends_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ends_at) = ends_at else {
        return "no expiry".to_string();
    };

    let remaining = (ends_at - now).num_seconds();
    if remaining <= 0 {
        return "expired".to_string();
    }

    let days = remaining / SECONDS_PER_DAY;
    let hours = (remaining % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    let minutes = (remaining % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;

    if days > 0 {
        format!("{days}d {hours}h left")
    } else if hours > 0 {
        format!("{hours}h {minutes}m left")
    } else {
        format!("{}m left", minutes.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn formats_each_range() {
        let now = Utc::now();
        assert_eq!(offer_countdown(Some(now + Duration::days(3) + Duration::hours(4)), now), "3d 4h left");
        assert_eq!(offer_countdown(Some(now + Duration::minutes(12)), now), "12m left");
        assert_eq!(offer_countdown(Some(now + Duration::seconds(20)), now), "1m left");
        assert_eq!(offer_countdown(Some(now), now), "expired");
    }
}
