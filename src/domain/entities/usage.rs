use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 1 日あたりの生成回数。日付が変わると 0 から数え直す
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GenerationUsage {
    pub day: Option<NaiveDate>,
    pub count: u32,
}

impl GenerationUsage {
    pub fn used_on(&self, now: DateTime<Utc>) -> u32 {
        if self.day == Some(now.date_naive()) {
            self.count
        } else {
            0
        }
    }

    pub fn record(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.day == Some(today) {
            self.count += 1;
        } else {
            self.day = Some(today);
            self.count = 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_usage_resets_on_new_day() {
        let now = Utc::now();
        let mut usage = GenerationUsage::default();
        usage.record(now);
        usage.record(now);
        assert_eq!(usage.used_on(now), 2);
        assert_eq!(usage.used_on(now + Duration::days(1)), 0);

        usage.record(now + Duration::days(1));
        assert_eq!(usage.count, 1);
    }
}
