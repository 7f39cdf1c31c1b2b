//! Status filters and enrollment selection helpers.
//!
//! The school-status hierarchy mirrors the `dbo.SyStatus` table: lower
//! ranks are "more current" statuses, so sorting enrollments by rank puts
//! the record an integration should act on first.

use std::collections::HashMap;

use serde_json::Value;
use static_init::dynamic;
use thiserror::Error;

/// JSON pointer to an enrollment's system status category.
const STATUS_CATEGORY_PTR: &str = "/SchoolStatus/SystemSchoolStatus/SystemStatusCategory";
/// JSON pointer to an enrollment's system status code.
const STATUS_CODE_PTR: &str = "/SchoolStatus/SystemSchoolStatus/Code";
/// JSON pointer to an enrollment's start date.
const ENROLLMENT_DATE_PTR: &str = "/EnrollmentDate";

// This is taken from the dbo.SyStatus table
#[dynamic]
static STATUS_HIERARCHY: HashMap<&'static str, i64> = HashMap::from([
    ("NEW", 0),
    ("SCHED", 0),
    ("INT", 0),
    ("NP", 0),
    ("PLACED", 0),
    ("NA", 0),
    ("ATT", 1),
    ("NDS-ATT", 2),
    ("PROB", 3),
    ("NDS-PROB", 4),
    ("LOA", 5),
    ("SPN", 7),
    ("FUT", 9),
    ("NDS-FUT", 10),
    ("BP", 11),
    ("NDS-BP", 12),
    ("REENTRY", 13),
    ("NDS-RE", 14),
    ("APPREC", 16),
    ("PENDAPP", 17),
    ("GRAD", 19),
    ("COMPLETE", 21),
    ("NDS-COMP", 22),
    ("INC", 23),
    ("NDS-INC", 24),
    ("DROP", 25),
    ("NDS-DROP", 26),
    ("APPREJ", 31),
    ("NDS-REJ", 32),
    ("NOSHOW", 33),
    ("NDS-NO", 34),
    ("CANCEL", 35),
    ("NDS-CAN", 36),
    ("TOPROG", 37),
    ("TOCAMP", 37),
    ("FROMPROG", 37),
    ("FROMCAMP", 37),
    ("ISPLACED", 38),
    ("ISNP", 39),
    ("ISNA", 40),
]);

/// Errors raised by the enrollment selection helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The enrollment list was empty.
    #[error("No enrollments were provided.")]
    NoEnrollments,

    /// An enrollment is missing a field the selection depends on.
    #[error("There is an enrollment that does not contain {0}.")]
    MissingField(&'static str),

    /// An enrollment carries a status code absent from the hierarchy table.
    #[error("Unknown school status code '{0}'.")]
    UnknownStatus(String),
}

/// An OData filter matching Active and Admitted students.
///
/// Covers the categories Active ('A'), Enrollment ('E'), NDS-Enrollment
/// ('X') and NDS-Active ('Y').
pub fn active_and_admitted_category_filter(path_to_status_category: &str) -> String {
    format!(
        "({p} eq 'A' or {p} eq 'E' or {p} eq 'X' or {p} eq 'Y')",
        p = path_to_status_category
    )
}

/// An OData filter matching Active students.
///
/// Covers the categories Active ('A') and NDS-Active ('Y').
pub fn active_category_filter(path_to_status_category: &str) -> String {
    format!("({p} eq 'A' or {p} eq 'Y')", p = path_to_status_category)
}

/// An OData filter for backloading data.
///
/// Covers the active and admitted categories plus Permanent Out ('P') and
/// NDS-Permanent Out ('Z').
pub fn backload_filter(path_to_status_category: &str) -> String {
    format!(
        "({p} eq 'A' or {p} eq 'E' or {p} eq 'X' or {p} eq 'Y' or {p} eq 'P' or {p} eq 'Z')",
        p = path_to_status_category
    )
}

/// Returns the most recent enrollment period that has an attending status
/// from a list of enrollments already sorted most-recent-first.
///
/// If no enrollment has an attending category the most recent one is
/// returned; this handles students who are currently attending one program
/// but have been admitted to another.
pub fn current_attending_enrollment(enrollment_periods: &[Value]) -> Result<Value, FilterError> {
    if enrollment_periods.is_empty() {
        return Err(FilterError::NoEnrollments);
    }
    for enrollment in enrollment_periods {
        if status_category(enrollment).is_none() {
            return Err(FilterError::MissingField(
                "a System Status Category",
            ));
        }
    }

    let mut current = &enrollment_periods[0];
    if !matches!(status_category(current), Some("A") | Some("Y")) {
        for enrollment in &enrollment_periods[1..] {
            if matches!(status_category(enrollment), Some("A") | Some("Y")) {
                current = enrollment;
                break;
            }
        }
    }

    Ok(current.clone())
}

/// Selects the current enrollment the way the `dbo.if_AdCurrentEnrollment`
/// SQL function does.
///
/// Requires every enrollment to include
/// `SchoolStatus.SystemSchoolStatus.Code` and `EnrollmentDate`. Enrollments
/// are ordered by descending enrollment date, then stably by the status
/// hierarchy rank; the first entry wins.
pub fn current_enrollment(enrollment_periods: &[Value]) -> Result<Value, FilterError> {
    if enrollment_periods.is_empty() {
        return Err(FilterError::NoEnrollments);
    }

    for enrollment in enrollment_periods {
        let code = status_code(enrollment)
            .ok_or(FilterError::MissingField("a System Status Code"))?;
        if !STATUS_HIERARCHY.contains_key(code) {
            return Err(FilterError::UnknownStatus(code.to_string()));
        }
        if enrollment_date(enrollment).is_none() {
            return Err(FilterError::MissingField("an EnrollmentDate"));
        }
    }

    let mut ordered: Vec<&Value> = enrollment_periods.iter().collect();
    // Most recent enrollment date first; the rank sort below is stable, so
    // ties on rank keep that ordering.
    ordered.sort_by(|a, b| enrollment_date(b).cmp(&enrollment_date(a)));
    ordered.sort_by_key(|enrollment| {
        status_code(enrollment)
            .and_then(|code| STATUS_HIERARCHY.get(code).copied())
            .unwrap_or(i64::MAX)
    });

    Ok(ordered[0].clone())
}

fn status_category(enrollment: &Value) -> Option<&str> {
    enrollment.pointer(STATUS_CATEGORY_PTR).and_then(Value::as_str)
}

fn status_code(enrollment: &Value) -> Option<&str> {
    enrollment.pointer(STATUS_CODE_PTR).and_then(Value::as_str)
}

fn enrollment_date(enrollment: &Value) -> Option<&str> {
    enrollment.pointer(ENROLLMENT_DATE_PTR).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enrollment(id: u64, code: &str, category: &str, date: &str) -> Value {
        json!({
            "Id": id,
            "EnrollmentDate": date,
            "SchoolStatus": {
                "SystemSchoolStatus": {
                    "Code": code,
                    "SystemStatusCategory": category
                }
            }
        })
    }

    #[test]
    fn category_filters_render_the_expected_odata() {
        assert_eq!(
            active_and_admitted_category_filter("s/SystemStatusCategory"),
            "(s/SystemStatusCategory eq 'A' or s/SystemStatusCategory eq 'E' \
             or s/SystemStatusCategory eq 'X' or s/SystemStatusCategory eq 'Y')"
        );
        assert_eq!(active_category_filter("c"), "(c eq 'A' or c eq 'Y')");
        assert_eq!(
            backload_filter("c"),
            "(c eq 'A' or c eq 'E' or c eq 'X' or c eq 'Y' or c eq 'P' or c eq 'Z')"
        );
    }

    #[test]
    fn attending_enrollment_prefers_active_categories() {
        let enrollments = vec![
            enrollment(1, "FUT", "E", "2024-01-01"),
            enrollment(2, "ATT", "A", "2023-01-01"),
        ];
        let chosen = current_attending_enrollment(&enrollments).unwrap();
        assert_eq!(chosen["Id"], 2);
    }

    #[test]
    fn attending_enrollment_falls_back_to_the_most_recent() {
        let enrollments = vec![
            enrollment(1, "FUT", "E", "2024-01-01"),
            enrollment(2, "GRAD", "P", "2023-01-01"),
        ];
        let chosen = current_attending_enrollment(&enrollments).unwrap();
        assert_eq!(chosen["Id"], 1);
    }

    #[test]
    fn attending_enrollment_requires_the_category_field() {
        let enrollments = vec![json!({"Id": 1})];
        assert_eq!(
            current_attending_enrollment(&enrollments),
            Err(FilterError::MissingField("a System Status Category"))
        );
    }

    #[test]
    fn current_enrollment_ranks_by_status_then_recency() {
        let enrollments = vec![
            enrollment(1, "GRAD", "P", "2024-06-01"),
            enrollment(2, "ATT", "A", "2022-01-01"),
            enrollment(3, "ATT", "A", "2023-01-01"),
        ];
        // ATT (rank 1) beats GRAD (rank 19); recency breaks the ATT tie.
        let chosen = current_enrollment(&enrollments).unwrap();
        assert_eq!(chosen["Id"], 3);
    }

    #[test]
    fn current_enrollment_rejects_unknown_status_codes() {
        let enrollments = vec![enrollment(1, "BOGUS", "A", "2024-01-01")];
        assert_eq!(
            current_enrollment(&enrollments),
            Err(FilterError::UnknownStatus("BOGUS".to_string()))
        );
    }

    #[test]
    fn current_enrollment_requires_dates_and_codes() {
        assert_eq!(current_enrollment(&[]), Err(FilterError::NoEnrollments));
        let missing_date = vec![json!({
            "SchoolStatus": {"SystemSchoolStatus": {"Code": "ATT"}}
        })];
        assert_eq!(
            current_enrollment(&missing_date),
            Err(FilterError::MissingField("an EnrollmentDate"))
        );
    }
}
