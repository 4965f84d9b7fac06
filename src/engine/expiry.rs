use chrono::{DateTime, Duration, Utc};

use crate::models::ranked::UrgencyTier;

const SECONDS_PER_DAY: i64 = 86_400;
const SOON_WITHIN_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Urgency {
    pub tier: UrgencyTier,
    pub days_remaining: i64,
}

impl Urgency {
    pub fn label(&self) -> String {
        label(self.tier, self.days_remaining)
    }
}

/// Whole days left before `expiry_at`, counted from `now`.
///
/// Anything already past expiry is negative; the final 24 hours are day 0.
pub fn days_until(expiry_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta = expiry_at - now;
    let mut seconds = delta.num_seconds();
    // num_seconds truncates toward zero; floor it so sub-second overshoot is negative.
    if delta < Duration::seconds(seconds) {
        seconds -= 1;
    }
    seconds.div_euclid(SECONDS_PER_DAY)
}

pub fn classify(expiry_at: DateTime<Utc>, now: DateTime<Utc>) -> UrgencyTier {
    tier_for_days(days_until(expiry_at, now))
}

pub fn assess(expiry_at: DateTime<Utc>, now: DateTime<Utc>) -> Urgency {
    let days_remaining = days_until(expiry_at, now);
    Urgency {
        tier: tier_for_days(days_remaining),
        days_remaining,
    }
}

fn tier_for_days(days: i64) -> UrgencyTier {
    if days < 0 {
        UrgencyTier::Expired
    } else if days == 0 {
        UrgencyTier::Today
    } else if days <= SOON_WITHIN_DAYS {
        UrgencyTier::Soon
    } else {
        UrgencyTier::Normal
    }
}

pub fn label(tier: UrgencyTier, days_remaining: i64) -> String {
    match tier {
        UrgencyTier::Expired => "期限切れ".to_string(),
        UrgencyTier::Today => "今日まで".to_string(),
        UrgencyTier::Soon | UrgencyTier::Normal if days_remaining == 1 => {
            "明日まで".to_string()
        }
        UrgencyTier::Soon | UrgencyTier::Normal => format!("{days_remaining}日後まで"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{assess, classify, days_until, label};
    use crate::models::ranked::UrgencyTier;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn later_the_same_day_is_today() {
        let expiry = Utc.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).unwrap();
        let urgency = assess(expiry, now());
        assert_eq!(urgency.tier, UrgencyTier::Today);
        assert_eq!(urgency.label(), "今日まで");
    }

    #[test]
    fn an_hour_ago_is_expired() {
        let expiry = Utc.with_ymd_and_hms(2024, 1, 14, 23, 0, 0).unwrap();
        let urgency = assess(expiry, now());
        assert_eq!(urgency.tier, UrgencyTier::Expired);
        assert_eq!(urgency.label(), "期限切れ");
    }

    #[test]
    fn expiry_at_exactly_now_is_not_expired() {
        assert_eq!(classify(now(), now()), UrgencyTier::Today);
        assert_eq!(
            classify(now() - Duration::seconds(1), now()),
            UrgencyTier::Expired
        );
    }

    #[test]
    fn soon_covers_one_to_three_days() {
        assert_eq!(classify(now() + Duration::days(1), now()), UrgencyTier::Soon);
        assert_eq!(
            classify(now() + Duration::days(3) + Duration::hours(23), now()),
            UrgencyTier::Soon
        );
        assert_eq!(classify(now() + Duration::days(4), now()), UrgencyTier::Normal);
    }

    #[test]
    fn tomorrow_has_its_own_label() {
        let tomorrow = assess(now() + Duration::hours(30), now());
        assert_eq!(tomorrow.days_remaining, 1);
        assert_eq!(tomorrow.label(), "明日まで");

        let later = assess(now() + Duration::days(2), now());
        assert_eq!(later.tier, UrgencyTier::Soon);
        assert_eq!(later.label(), "2日後まで");

        assert_eq!(label(UrgencyTier::Normal, 10), "10日後まで");
    }

    #[test]
    fn days_until_counts_whole_days() {
        assert_eq!(days_until(now() + Duration::hours(23), now()), 0);
        assert_eq!(days_until(now() + Duration::hours(24), now()), 1);
        assert_eq!(days_until(now() - Duration::hours(25), now()), -2);
    }

    #[test]
    fn half_a_second_past_expiry_is_expired() {
        let expiry = now() - Duration::milliseconds(500);
        assert_eq!(days_until(expiry, now()), -1);
        assert_eq!(classify(expiry, now()), UrgencyTier::Expired);
        assert_eq!(
            classify(now() + Duration::milliseconds(500), now()),
            UrgencyTier::Today
        );
        assert_eq!(
            days_until(now() + Duration::days(1) - Duration::milliseconds(1), now()),
            0
        );
    }
}
