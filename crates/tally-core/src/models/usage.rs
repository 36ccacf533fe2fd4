//! Usage counters, resource types, and billing periods.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Tag identifying which quota bucket an action consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    TemplateCreation,
    CaptionGeneration,
    HashtagAnalysis,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::TemplateCreation,
        ResourceType::CaptionGeneration,
        ResourceType::HashtagAnalysis,
    ];

    /// Tag stored in the usage_counters table.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::TemplateCreation => "template_creation",
            Self::CaptionGeneration => "caption_generation",
            Self::HashtagAnalysis => "hashtag_analysis",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "template_creation" => Some(Self::TemplateCreation),
            "caption_generation" => Some(Self::CaptionGeneration),
            "hashtag_analysis" => Some(Self::HashtagAnalysis),
            _ => None,
        }
    }
}

/// The usage window a counter accumulates over: a UTC calendar month.
/// Counters never reset in place — a new period means a new row, keyed by
/// the period's start as unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    /// The calendar month containing `t`, as the half-open window
    /// `[first of month, first of next month)`.
    pub fn containing(t: DateTime<Utc>) -> Self {
        let start = Utc
            .with_ymd_and_hms(t.year(), t.month(), 1, 0, 0, 0)
            .single()
            .expect("first day of a month is always representable");
        let (next_year, next_month) = if t.month() == 12 {
            (t.year() + 1, 1)
        } else {
            (t.year(), t.month() + 1)
        };
        let end = Utc
            .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
            .single()
            .expect("first day of a month is always representable");
        Self { start, end }
    }

    /// Counter key: period start as unix seconds.
    pub fn start_epoch(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t < self.end
    }
}

/// Result of the atomic conditional increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementOutcome {
    pub new_count: u32,
    pub accepted: bool,
}

/// Usage snapshot for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub current: u32,
    pub limit: u32,
    /// Rounded to whole percent; 100 when the limit is zero.
    pub percentage: u32,
    pub has_active_subscription: bool,
}

impl UsageStats {
    pub fn new(current: u32, limit: u32, has_active_subscription: bool) -> Self {
        let percentage = if limit == 0 {
            100
        } else {
            ((current as f64 / limit as f64) * 100.0).round() as u32
        };
        Self {
            current,
            limit,
            percentage,
            has_active_subscription,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_tag_round_trip() {
        for resource in ResourceType::ALL {
            assert_eq!(ResourceType::parse(resource.as_tag()), Some(resource));
        }
        assert_eq!(ResourceType::parse("time_travel"), None);
    }

    #[test]
    fn test_period_containing_mid_month() {
        let t = Utc.with_ymd_and_hms(2025, 3, 15, 12, 30, 0).unwrap();
        let period = Period::containing(t);
        assert_eq!(period.start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(period.end, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());
        assert!(period.contains(t));
    }

    #[test]
    fn test_period_december_rolls_into_next_year() {
        let t = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let period = Period::containing(t);
        assert_eq!(period.end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_adjacent_months_have_distinct_keys() {
        let march = Period::containing(Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap());
        let april = Period::containing(Utc.with_ymd_and_hms(2025, 4, 2, 0, 0, 0).unwrap());
        assert_ne!(march.start_epoch(), april.start_epoch());
        assert_eq!(march.end, april.start);
    }

    #[test]
    fn test_usage_stats_percentage() {
        assert_eq!(UsageStats::new(19, 20, true).percentage, 95);
        assert_eq!(UsageStats::new(20, 20, true).percentage, 100);
        assert_eq!(UsageStats::new(0, 20, true).percentage, 0);
        // Zero limit reads as fully consumed, not a division error.
        assert_eq!(UsageStats::new(0, 0, false).percentage, 100);
    }
}
