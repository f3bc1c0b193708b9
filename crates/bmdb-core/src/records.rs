//! The persisted row shape shared by the crawler, the sinks, the loader, and
//! the query layer.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One flattened row per crawled video: brand context + channel snapshot +
/// video detail + derived columns. Keyed by `video_id`; a full re-crawl
/// replaces prior state for the same key.
///
/// Field order doubles as the CSV column order, so changing it changes the
/// export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRecord {
    pub brand: String,
    pub channel_id: String,
    pub channel_name: String,
    pub channel_subscribers: i64,
    pub video_id: String,
    pub video_title: String,
    pub published_at: DateTime<Utc>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub engagement_rate: Decimal,
    pub duration: String,
    pub tags: String,
    pub category_id: String,
    pub published_date: NaiveDate,
    pub published_time: NaiveTime,
}

impl IngestRecord {
    /// Splits a publish timestamp into the derived date and time columns.
    #[must_use]
    pub fn split_published_at(published_at: DateTime<Utc>) -> (NaiveDate, NaiveTime) {
        (published_at.date_naive(), published_at.time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_published_at_derives_date_and_time() {
        let ts: DateTime<Utc> = "2025-06-01T09:30:15Z".parse().expect("timestamp");
        let (date, time) = IngestRecord::split_published_at(ts);
        assert_eq!(date.to_string(), "2025-06-01");
        assert_eq!(time.to_string(), "09:30:15");
    }

    #[test]
    fn record_serializes_with_stable_field_names() {
        let ts: DateTime<Utc> = "2025-06-01T09:30:15Z".parse().expect("timestamp");
        let (published_date, published_time) = IngestRecord::split_published_at(ts);
        let record = IngestRecord {
            brand: "3CE".to_string(),
            channel_id: "UC123".to_string(),
            channel_name: "3CE Official".to_string(),
            channel_subscribers: 1_200_000,
            video_id: "vid-1".to_string(),
            video_title: "Summer look".to_string(),
            published_at: ts,
            view_count: 1_000,
            like_count: 40,
            comment_count: 10,
            engagement_rate: "5.00".parse().expect("decimal"),
            duration: "PT5M30S".to_string(),
            tags: "makeup,summer".to_string(),
            category_id: "26".to_string(),
            published_date,
            published_time,
        };

        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["brand"], "3CE");
        assert_eq!(json["video_id"], "vid-1");
        assert_eq!(json["engagement_rate"], "5.00");
        assert_eq!(json["published_date"], "2025-06-01");
        assert_eq!(json["published_time"], "09:30:15");
    }
}
