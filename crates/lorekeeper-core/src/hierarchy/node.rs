//! Hierarchy node shapes and the date parsing boundary.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::TimelineLayer;
use crate::error::InsightError;
use crate::store::NodeRecord;

/// Parse a timeline date.
///
/// Accepts a calendar date (`2020-01-01`) or an RFC 3339 timestamp, in which
/// case the date component of the timestamp's own offset is used.
pub fn parse_date(value: &str) -> Result<NaiveDate, InsightError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| InsightError::DateParse {
            value: value.to_string(),
        })
}

fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, InsightError> {
    value.map(parse_date).transpose()
}

/// Reject ranges whose start falls after their end.
pub(crate) fn check_range(
    node_id: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<(), InsightError> {
    match end {
        Some(end) if start > end => Err(InsightError::InvariantViolation {
            node_id: node_id.to_string(),
            message: format!("start_date {start} is after end_date {end}"),
        }),
        _ => Ok(()),
    }
}

/// A node of the user's timeline hierarchy.
///
/// `end_date` of `None` marks an ongoing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: String,
    pub layer: TimelineLayer,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl HierarchyNode {
    /// Create a node, rejecting an end date that precedes the start.
    pub fn new(
        id: impl Into<String>,
        layer: TimelineLayer,
        user_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, InsightError> {
        let id = id.into();
        check_range(&id, start_date, end_date)?;
        Ok(Self {
            id,
            layer,
            user_id: user_id.into(),
            start_date,
            end_date,
        })
    }

    /// Create a node from raw date strings.
    pub fn parse(
        id: impl Into<String>,
        layer: TimelineLayer,
        user_id: impl Into<String>,
        start_date: &str,
        end_date: Option<&str>,
    ) -> Result<Self, InsightError> {
        Self::new(
            id,
            layer,
            user_id,
            parse_date(start_date)?,
            parse_optional_date(end_date)?,
        )
    }

    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Minimal child shape consumed by gap detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildNode {
    pub id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl ChildNode {
    pub fn new(
        id: Option<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, InsightError> {
        check_range(id.as_deref().unwrap_or("<anonymous>"), start_date, end_date)?;
        Ok(Self {
            id,
            start_date,
            end_date,
        })
    }

    /// End of the span this child covers. Ongoing children count as point
    /// events at their start.
    pub fn effective_end(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }
}

impl TryFrom<NodeRecord> for ChildNode {
    type Error = InsightError;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        let start = parse_date(&record.start_date)?;
        let end = parse_optional_date(record.end_date.as_deref())?;
        Self::new(Some(record.id), start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn parse_date_accepts_calendar_dates_and_timestamps() {
        assert_eq!(parse_date("2020-03-01").unwrap(), date("2020-03-01"));
        assert_eq!(
            parse_date("2020-03-01T18:30:00+00:00").unwrap(),
            date("2020-03-01")
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("not-a-date").unwrap_err();
        assert!(matches!(err, InsightError::DateParse { ref value } if value == "not-a-date"));
        assert!(parse_date("2020-02-30").is_err());
    }

    #[test]
    fn node_rejects_inverted_range() {
        let err = HierarchyNode::parse("era-1", TimelineLayer::Era, "u1", "2020-05-01", Some("2020-01-01"))
            .unwrap_err();
        assert!(matches!(err, InsightError::InvariantViolation { ref node_id, .. } if node_id == "era-1"));
    }

    #[test]
    fn node_allows_single_day_and_ongoing() {
        let n = HierarchyNode::parse("a", TimelineLayer::Arc, "u1", "2020-05-01", Some("2020-05-01"))
            .unwrap();
        assert!(!n.is_ongoing());
        let n = HierarchyNode::parse("b", TimelineLayer::Arc, "u1", "2020-05-01", None).unwrap();
        assert!(n.is_ongoing());
    }

    #[test]
    fn child_from_record_parses_at_boundary() {
        let record = NodeRecord {
            id: "ch-1".into(),
            start_date: "2021-01-01".into(),
            end_date: None,
        };
        let child = ChildNode::try_from(record).unwrap();
        assert_eq!(child.effective_end(), date("2021-01-01"));

        let bad = NodeRecord {
            id: "ch-2".into(),
            start_date: "yesterday".into(),
            end_date: None,
        };
        assert!(matches!(
            ChildNode::try_from(bad),
            Err(InsightError::DateParse { .. })
        ));
    }

    #[test]
    fn child_with_inverted_range_is_rejected() {
        let record = NodeRecord {
            id: "ch-3".into(),
            start_date: "2021-06-01".into(),
            end_date: Some("2021-01-01".into()),
        };
        assert!(matches!(
            ChildNode::try_from(record),
            Err(InsightError::InvariantViolation { .. })
        ));
    }
}
