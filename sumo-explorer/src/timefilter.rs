//! Time filtering on child objects
//!
//! Objects carry either a single timestamp (`data.time.t0`), an interval
//! (`data.time.t0` and `data.time.t1`) or no time at all. A [`TimeFilter`]
//! selects one of those shapes and optionally narrows it to a date window.

use crate::error::{ExplorerError, Result};
use crate::query::{bool_query, SearchQuery};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

const T0: &str = "data.time.t0";
const T1: &str = "data.time.t1";
const T0_VALUE: &str = "data.time.t0.value";
const T1_VALUE: &str = "data.time.t1.value";
const TIME: &str = "data.time";

/// Time shape to select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeType {
    Timestamp,
    Interval,
    /// Either a timestamp or an interval
    All,
    /// No time information
    None,
}

impl FromStr for TimeType {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(TimeType::Timestamp),
            "interval" | "time_interval" => Ok(TimeType::Interval),
            "all" => Ok(TimeType::All),
            "none" => Ok(TimeType::None),
            other => Err(ExplorerError::Config(format!("Invalid TimeType: {}", other))),
        }
    }
}

impl fmt::Display for TimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeType::Timestamp => "timestamp",
            TimeType::Interval => "interval",
            TimeType::All => "all",
            TimeType::None => "none",
        };
        f.write_str(name)
    }
}

/// Time selection on child objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFilter {
    pub time_type: TimeType,
    pub start: Option<String>,
    pub end: Option<String>,
    /// Accept intervals where either end falls in the window
    pub overlap: bool,
    /// Match the window bounds exactly instead of as a range
    pub exact: bool,
}

impl TimeFilter {
    pub fn new(time_type: TimeType) -> Self {
        Self {
            time_type,
            start: None,
            end: None,
            overlap: false,
            exact: false,
        }
    }

    pub fn start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    pub fn end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn range(self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start(start).end(end)
    }

    pub fn overlap(mut self, overlap: bool) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    fn has_window(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    fn range_clause(&self, key: &str) -> Value {
        let mut bounds = serde_json::Map::new();
        if let Some(start) = &self.start {
            bounds.insert("gte".to_string(), json!(start));
        }
        if let Some(end) = &self.end {
            bounds.insert("lte".to_string(), json!(end));
        }
        json!({"range": {key: bounds}})
    }

    fn exact_start(&self) -> Result<&str> {
        self.start.as_deref().ok_or_else(|| {
            ExplorerError::Config("exact time match needs a start value".to_string())
        })
    }

    fn exact_end(&self) -> Result<&str> {
        self.end.as_deref().ok_or_else(|| {
            ExplorerError::Config("exact interval match needs an end value".to_string())
        })
    }

    /// Translate into a bool query fragment
    pub fn to_query(&self) -> Result<SearchQuery> {
        let mut must = Vec::new();
        let mut must_not = Vec::new();
        let mut should = Vec::new();
        let mut minimum_should_match = None;

        match self.time_type {
            TimeType::Timestamp => {
                must.push(exists(T0));
                must_not.push(exists(T1));

                if self.has_window() {
                    if self.exact {
                        must.push(term(T0_VALUE, self.exact_start()?));
                    } else {
                        must.push(self.range_clause(T0_VALUE));
                    }
                }
            }
            TimeType::Interval => {
                must.push(exists(T0));
                must.push(exists(T1));

                if self.has_window() {
                    if self.exact {
                        must.push(term(T0_VALUE, self.exact_start()?));
                        must.push(term(T1_VALUE, self.exact_end()?));
                    } else if self.overlap {
                        should.push(self.range_clause(T0_VALUE));
                        should.push(self.range_clause(T1_VALUE));
                        minimum_should_match = Some(1);
                    } else {
                        // Both ends inside the window, not geometric overlap
                        must.push(self.range_clause(T0_VALUE));
                        must.push(self.range_clause(T1_VALUE));
                    }
                }
            }
            TimeType::All => {
                must.push(exists(TIME));

                if self.has_window() {
                    minimum_should_match = Some(1);

                    if self.exact {
                        let start = self.exact_start()?;
                        should.push(term(T0_VALUE, start));
                        should.push(json!({"bool": {"must": [
                            term(T0_VALUE, start),
                            term(T1_VALUE, self.exact_end()?),
                        ]}}));
                    } else if self.overlap {
                        should.push(self.range_clause(T0_VALUE));
                        should.push(self.range_clause(T1_VALUE));
                    } else {
                        should.push(self.range_clause(T0_VALUE));
                        should.push(json!({"bool": {"must": [
                            self.range_clause(T0_VALUE),
                            self.range_clause(T1_VALUE),
                        ]}}));
                    }
                }
            }
            TimeType::None => {
                must_not.push(exists(TIME));
            }
        }

        Ok(SearchQuery::new(bool_query(
            must,
            must_not,
            should,
            minimum_should_match,
        )))
    }
}

fn exists(field: &str) -> Value {
    json!({"exists": {"field": field}})
}

fn term(field: &str, value: &str) -> Value {
    json!({"term": {field: value}})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_without_window() {
        let query = TimeFilter::new(TimeType::Timestamp).to_query().unwrap();
        assert_eq!(
            query.as_value(),
            &json!({"bool": {
                "must": [{"exists": {"field": "data.time.t0"}}],
                "must_not": [{"exists": {"field": "data.time.t1"}}]
            }})
        );
    }

    #[test]
    fn test_timestamp_range() {
        let query = TimeFilter::new(TimeType::Timestamp)
            .range("2018-01-01", "2022-01-01")
            .to_query()
            .unwrap();
        assert_eq!(
            query.clauses("must")[1],
            json!({"range": {"data.time.t0.value": {"gte": "2018-01-01", "lte": "2022-01-01"}}})
        );
    }

    #[test]
    fn test_timestamp_exact() {
        let query = TimeFilter::new(TimeType::Timestamp)
            .start("2018-01-01")
            .exact(true)
            .to_query()
            .unwrap();
        assert_eq!(
            query.clauses("must")[1],
            json!({"term": {"data.time.t0.value": "2018-01-01"}})
        );
    }

    #[test]
    fn test_interval_without_overlap_requires_both_ranges() {
        let query = TimeFilter::new(TimeType::Interval)
            .range("2018-01-01", "2022-01-01")
            .overlap(false)
            .to_query()
            .unwrap();

        let window = json!({"gte": "2018-01-01", "lte": "2022-01-01"});
        assert_eq!(
            query.as_value(),
            &json!({"bool": {"must": [
                {"exists": {"field": "data.time.t0"}},
                {"exists": {"field": "data.time.t1"}},
                {"range": {"data.time.t0.value": window.clone()}},
                {"range": {"data.time.t1.value": window}}
            ]}})
        );
    }

    #[test]
    fn test_interval_with_overlap_moves_ranges_to_should() {
        let query = TimeFilter::new(TimeType::Interval)
            .range("2018-01-01", "2022-01-01")
            .overlap(true)
            .to_query()
            .unwrap();

        let window = json!({"gte": "2018-01-01", "lte": "2022-01-01"});
        assert_eq!(
            query.as_value(),
            &json!({"bool": {
                "must": [
                    {"exists": {"field": "data.time.t0"}},
                    {"exists": {"field": "data.time.t1"}}
                ],
                "should": [
                    {"range": {"data.time.t0.value": window.clone()}},
                    {"range": {"data.time.t1.value": window}}
                ],
                "minimum_should_match": 1
            }})
        );
    }

    #[test]
    fn test_interval_exact() {
        let query = TimeFilter::new(TimeType::Interval)
            .range("2018-01-01", "2020-07-01")
            .exact(true)
            .to_query()
            .unwrap();
        let must = query.clauses("must");
        assert_eq!(must[2], json!({"term": {"data.time.t0.value": "2018-01-01"}}));
        assert_eq!(must[3], json!({"term": {"data.time.t1.value": "2020-07-01"}}));
        assert!(query.clauses("should").is_empty());
    }

    #[test]
    fn test_open_ended_window_only_sets_given_bound() {
        let query = TimeFilter::new(TimeType::Interval)
            .start("2019-01-01")
            .to_query()
            .unwrap();
        assert_eq!(
            query.clauses("must")[2],
            json!({"range": {"data.time.t0.value": {"gte": "2019-01-01"}}})
        );
    }

    #[test]
    fn test_all_combines_shapes() {
        let query = TimeFilter::new(TimeType::All)
            .range("2018-01-01", "2022-01-01")
            .to_query()
            .unwrap();

        assert_eq!(query.clauses("must"), &[json!({"exists": {"field": "data.time"}})]);
        let should = query.clauses("should");
        assert_eq!(should.len(), 2);
        assert!(should[1]["bool"]["must"].is_array());
        assert_eq!(query.as_value()["bool"]["minimum_should_match"], json!(1));
    }

    #[test]
    fn test_all_exact_adds_term_alternatives() {
        let query = TimeFilter::new(TimeType::All)
            .range("2018-01-01", "2022-01-01")
            .exact(true)
            .to_query()
            .unwrap();
        let should = query.clauses("should");
        assert_eq!(should[0], json!({"term": {"data.time.t0.value": "2018-01-01"}}));
        assert_eq!(
            should[1],
            json!({"bool": {"must": [
                {"term": {"data.time.t0.value": "2018-01-01"}},
                {"term": {"data.time.t1.value": "2022-01-01"}}
            ]}})
        );
    }

    #[test]
    fn test_all_without_window_is_existence_only() {
        let query = TimeFilter::new(TimeType::All).exact(true).to_query().unwrap();
        assert_eq!(
            query.as_value(),
            &json!({"bool": {"must": [{"exists": {"field": "data.time"}}]}})
        );
    }

    #[test]
    fn test_none() {
        let query = TimeFilter::new(TimeType::None)
            .range("2018-01-01", "2022-01-01")
            .to_query()
            .unwrap();
        assert_eq!(
            query.as_value(),
            &json!({"bool": {"must_not": [{"exists": {"field": "data.time"}}]}})
        );
    }

    #[test]
    fn test_exact_interval_missing_end_is_config_error() {
        let err = TimeFilter::new(TimeType::Interval)
            .start("2018-01-01")
            .exact(true)
            .to_query()
            .unwrap_err();
        assert!(matches!(err, ExplorerError::Config(_)));
    }

    #[test]
    fn test_parse_time_type() {
        assert_eq!("TIMESTAMP".parse::<TimeType>().unwrap(), TimeType::Timestamp);
        assert_eq!("interval".parse::<TimeType>().unwrap(), TimeType::Interval);
        assert!(matches!(
            "daily".parse::<TimeType>(),
            Err(ExplorerError::Config(_))
        ));
    }
}
