//! Parsing of the test data attached to a problem.
//!
//! Two layouts are accepted:
//! - a list of subtasks, `[{"groupId": 1, "points": 20, "cases": [...]}, ...]`
//! - a legacy flat list of cases, `[{"input": "...", "expectedOutput": "..."}, ...]`,
//!   which becomes a single subtask worth 100 points.
//!
//! The layout is picked by looking at the first element only; every other
//! element must then have the same layout.

use serde::Deserialize;
use serde_json::Value;

use crate::constants::{FULL_SCORE, LEGACY_SUBTASK_POINTS};
use crate::core::domain::{Subtask, TestCase, TestSpec};
use crate::core::errors::ConfigurationError;

#[derive(Deserialize)]
struct RawSubtask {
    #[serde(rename = "groupId", alias = "group_id", default)]
    group_id: Option<u32>,
    #[serde(alias = "pts")]
    points: u32,
    cases: Vec<TestCase>,
}

pub fn parse_test_spec(raw: &str) -> Result<TestSpec, ConfigurationError> {
    let value: Value = serde_json::from_str(raw)?;
    normalize(value)
}

pub fn normalize(value: Value) -> Result<TestSpec, ConfigurationError> {
    let Value::Array(items) = value else {
        return Err(ConfigurationError::NotAList);
    };
    let Some(first) = items.first() else {
        return Err(ConfigurationError::Empty);
    };

    let is_grouped = first.get("cases").is_some();
    let spec = if is_grouped {
        let raw: Vec<RawSubtask> = serde_json::from_value(Value::Array(items))?;
        TestSpec {
            subtasks: raw
                .into_iter()
                .enumerate()
                .map(|(idx, s)| Subtask {
                    group_id: s.group_id.unwrap_or(idx as u32 + 1),
                    points: s.points,
                    cases: s.cases,
                })
                .collect(),
        }
    } else {
        tracing::debug!("Test specification has no groups, wrapping it in one subtask");
        let cases: Vec<TestCase> = serde_json::from_value(Value::Array(items))?;
        TestSpec {
            subtasks: vec![Subtask {
                group_id: 1,
                points: LEGACY_SUBTASK_POINTS,
                cases,
            }],
        }
    };

    validate(&spec)?;
    Ok(spec)
}

fn validate(spec: &TestSpec) -> Result<(), ConfigurationError> {
    for empty in spec.subtasks.iter().filter(|s| s.cases.is_empty()) {
        tracing::warn!(group_id = empty.group_id, "Subtask has no cases, its points are free");
    }

    let total = spec.total_points();
    if total > FULL_SCORE {
        return Err(ConfigurationError::PointsOverflow { total });
    }
    if total < FULL_SCORE {
        tracing::warn!(total, "Subtask points do not add up to a full score");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_spec() {
        let spec = parse_test_spec(
            r#"[
                {"groupId": 1, "points": 5, "cases": [{"input": "3", "expectedOutput": "6"}]},
                {"groupId": 2, "points": 95, "cases": [
                    {"input": "4", "expectedOutput": "10"},
                    {"input": "5", "expectedOutput": "15"}
                ]}
            ]"#,
        )
        .unwrap();

        assert_eq!(spec.subtasks.len(), 2);
        assert_eq!(spec.subtasks[0].points, 5);
        assert_eq!(spec.subtasks[1].group_id, 2);
        assert_eq!(spec.subtasks[1].cases[1].expected_output, "15");
        assert_eq!(spec.case_count(), 3);
    }

    #[test]
    fn test_group_ids_default_to_position() {
        let spec = parse_test_spec(
            r#"[
                {"pts": 40, "cases": [{"input": "1", "output": "1"}]},
                {"pts": 60, "cases": [{"input": "2", "output": "3"}]}
            ]"#,
        )
        .unwrap();

        let ids: Vec<u32> = spec.subtasks.iter().map(|s| s.group_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_legacy_flat_list_becomes_single_subtask() {
        let spec = parse_test_spec(
            r#"[
                {"input": "1 2", "expectedOutput": "3"},
                {"input": "2 2", "expected_output": "4"}
            ]"#,
        )
        .unwrap();

        assert_eq!(spec.subtasks.len(), 1);
        assert_eq!(spec.subtasks[0].points, 100);
        assert_eq!(spec.subtasks[0].cases.len(), 2);
    }

    #[test]
    fn test_mixed_layout_is_rejected() {
        let result = parse_test_spec(
            r#"[
                {"points": 50, "cases": [{"input": "1", "expectedOutput": "1"}]},
                {"input": "2", "expectedOutput": "2"}
            ]"#,
        );
        assert!(matches!(result, Err(ConfigurationError::Malformed(_))));
    }

    #[test]
    fn test_malformed_specs() {
        assert!(matches!(
            parse_test_spec("not json"),
            Err(ConfigurationError::Malformed(_))
        ));
        assert!(matches!(
            parse_test_spec(r#"{"cases": []}"#),
            Err(ConfigurationError::NotAList)
        ));
        assert!(matches!(
            parse_test_spec("[]"),
            Err(ConfigurationError::Empty)
        ));
    }

    #[test]
    fn test_empty_subtask_is_accepted() {
        let spec = parse_test_spec(r#"[{"points": 100, "cases": []}]"#).unwrap();
        assert_eq!(spec.subtasks[0].group_id, 1);
        assert_eq!(spec.case_count(), 0);
    }

    #[test]
    fn test_short_in_out_keys() {
        let spec = parse_test_spec(
            r#"[
                {"pts": 30, "cases": [{"in": "3", "out": "6"}]},
                {"pts": 70, "cases": [{"in": "4", "out": "10"}]}
            ]"#,
        )
        .unwrap();

        assert_eq!(spec.subtasks[0].cases[0].input, "3");
        assert_eq!(spec.subtasks[0].cases[0].expected_output, "6");
        assert_eq!(spec.subtasks[1].cases[0].expected_output, "10");
        assert_eq!(spec.total_points(), 100);
    }

    #[test]
    fn test_points_overflow() {
        let result = parse_test_spec(
            r#"[
                {"points": 60, "cases": [{"input": "", "expectedOutput": ""}]},
                {"points": 60, "cases": [{"input": "", "expectedOutput": ""}]}
            ]"#,
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::PointsOverflow { total: 120 })
        ));
    }
}
