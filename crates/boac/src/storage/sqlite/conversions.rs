//! SQLite row conversion functions.
//!
//! Pure functions for converting between SQLite rows and domain types.
//! Child collections (memberships, majors, topics, attachments) are loaded
//! separately and attached by the repository.

use boac_core::appointment::Appointment;
use boac_core::cohort::sql::SqlValue;
use boac_core::cohort::{CohortFilter, FilterCriteria};
use boac_core::curated::CuratedGroup;
use boac_core::note::{ContactType, Note, NoteAttachment, NoteTemplate, NoteTemplateAttachment};
use boac_core::student::{CoeProfile, Student, TeamGroup};
use boac_core::topic::Topic;
use boac_core::user::{AuthorizedUser, DeptMembership, DeptRole};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::Row;

// ============================================================================
// User conversions
// ============================================================================

/// Convert a SQLite row to an AuthorizedUser without memberships.
///
/// Expected columns: id, uid, name, title, dept_affiliation, is_admin,
/// can_access_advising_data, created_at
pub fn row_to_user(row: &Row) -> rusqlite::Result<AuthorizedUser> {
    let created_at: String = row.get(7)?;

    Ok(AuthorizedUser {
        id: row.get(0)?,
        uid: row.get(1)?,
        name: row.get(2)?,
        title: row.get(3)?,
        dept_affiliation: row.get(4)?,
        is_admin: row.get(5)?,
        can_access_advising_data: row.get(6)?,
        departments: Vec::new(),
        created_at: parse_datetime(&created_at)?,
    })
}

/// Expected columns: dept_code, role, is_drop_in_advisor
pub fn row_to_membership(row: &Row) -> rusqlite::Result<DeptMembership> {
    let role: String = row.get(1)?;

    Ok(DeptMembership {
        dept_code: row.get(0)?,
        role: parse_role(&role)?,
        is_drop_in_advisor: row.get(2)?,
    })
}

// ============================================================================
// Student conversions
// ============================================================================

/// Convert a SQLite row to a Student without majors or team groups.
///
/// Expected columns: sid, uid, first_name, last_name, gpa, level, units,
/// expected_grad_term, transfer, in_intensive_cohort, is_active_asc,
/// status_asc, coe_advisor_uid, coe_probation, coe_gender, coe_ethnicity,
/// coe_underrepresented
pub fn row_to_student(row: &Row) -> rusqlite::Result<Student> {
    let coe_advisor_uid: Option<String> = row.get(12)?;
    let coe = match coe_advisor_uid {
        Some(advisor_uid) => Some(CoeProfile {
            advisor_uid,
            probation: row.get::<_, Option<bool>>(13)?.unwrap_or_default(),
            gender: row.get(14)?,
            ethnicity: row.get(15)?,
            underrepresented: row.get::<_, Option<bool>>(16)?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(Student {
        sid: row.get(0)?,
        uid: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        gpa: row.get(4)?,
        level: row.get(5)?,
        units: row.get(6)?,
        majors: Vec::new(),
        expected_grad_term: row.get(7)?,
        transfer: row.get(8)?,
        athletics: Vec::new(),
        in_intensive_cohort: row.get(9)?,
        is_active_asc: row.get(10)?,
        status_asc: row.get(11)?,
        coe,
    })
}

/// Expected columns: group_code, group_name, team_code, team_name
pub fn row_to_team_group(row: &Row) -> rusqlite::Result<TeamGroup> {
    Ok(TeamGroup {
        group_code: row.get(0)?,
        group_name: row.get(1)?,
        team_code: row.get(2)?,
        team_name: row.get(3)?,
    })
}

// ============================================================================
// Cohort and curated group conversions
// ============================================================================

/// Expected columns: id, name, owner_uid, criteria, student_count,
/// created_at, updated_at
pub fn row_to_cohort(row: &Row) -> rusqlite::Result<CohortFilter> {
    let criteria: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;

    Ok(CohortFilter {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_uid: row.get(2)?,
        criteria: json_to_criteria(&criteria)?,
        student_count: row.get(4)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// Convert a row to a CuratedGroup without members.
///
/// Expected columns: id, owner_id, name, created_at, updated_at
pub fn row_to_curated_group(row: &Row) -> rusqlite::Result<CuratedGroup> {
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    Ok(CuratedGroup {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        sids: Vec::new(),
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

// ============================================================================
// Note conversions
// ============================================================================

/// Convert a row to a Note without topics or attachments.
///
/// Expected columns: id, sid, author_uid, author_name, author_role,
/// author_dept_codes, subject, body, contact_type, set_date, is_private,
/// created_at, updated_at, deleted_at
pub fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    let author_dept_codes: String = row.get(5)?;
    let contact_type: Option<String> = row.get(8)?;
    let set_date: Option<String> = row.get(9)?;
    let created_at: String = row.get(11)?;
    let updated_at: Option<String> = row.get(12)?;
    let deleted_at: Option<String> = row.get(13)?;

    Ok(Note {
        id: row.get(0)?,
        sid: row.get(1)?,
        author_uid: row.get(2)?,
        author_name: row.get(3)?,
        author_role: row.get(4)?,
        author_dept_codes: json_to_strings(&author_dept_codes)?,
        subject: row.get(6)?,
        body: row.get(7)?,
        topics: Vec::new(),
        attachments: Vec::new(),
        contact_type: contact_type.as_deref().map(parse_contact_type).transpose()?,
        set_date: set_date.as_deref().map(parse_date).transpose()?,
        is_private: row.get(10)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: updated_at.as_deref().map(parse_datetime).transpose()?,
        deleted_at: deleted_at.as_deref().map(parse_datetime).transpose()?,
    })
}

/// Expected columns: id, note_id, path_to_attachment, filename,
/// uploaded_by_uid, created_at, deleted_at
pub fn row_to_note_attachment(row: &Row) -> rusqlite::Result<NoteAttachment> {
    let created_at: String = row.get(5)?;
    let deleted_at: Option<String> = row.get(6)?;

    Ok(NoteAttachment {
        id: row.get(0)?,
        note_id: row.get(1)?,
        path_to_attachment: row.get(2)?,
        filename: row.get(3)?,
        uploaded_by_uid: row.get(4)?,
        created_at: parse_datetime(&created_at)?,
        deleted_at: deleted_at.as_deref().map(parse_datetime).transpose()?,
    })
}

/// Convert a row to a NoteTemplate without topics or attachments.
///
/// Expected columns: id, creator_id, title, subject, body, is_private,
/// created_at, updated_at
pub fn row_to_note_template(row: &Row) -> rusqlite::Result<NoteTemplate> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;

    Ok(NoteTemplate {
        id: row.get(0)?,
        creator_id: row.get(1)?,
        title: row.get(2)?,
        subject: row.get(3)?,
        body: row.get(4)?,
        topics: Vec::new(),
        is_private: row.get(5)?,
        attachments: Vec::new(),
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// Expected columns: id, note_template_id, path_to_attachment, filename,
/// uploaded_by_uid, created_at
pub fn row_to_template_attachment(row: &Row) -> rusqlite::Result<NoteTemplateAttachment> {
    let created_at: String = row.get(5)?;

    Ok(NoteTemplateAttachment {
        id: row.get(0)?,
        note_template_id: row.get(1)?,
        path_to_attachment: row.get(2)?,
        filename: row.get(3)?,
        uploaded_by_uid: row.get(4)?,
        created_at: parse_datetime(&created_at)?,
    })
}

// ============================================================================
// Topic and appointment conversions
// ============================================================================

/// Expected columns: id, topic, available_in_notes,
/// available_in_appointments, created_at, deleted_at
pub fn row_to_topic(row: &Row) -> rusqlite::Result<Topic> {
    let created_at: String = row.get(4)?;
    let deleted_at: Option<String> = row.get(5)?;

    Ok(Topic {
        id: row.get(0)?,
        topic: row.get(1)?,
        available_in_notes: row.get(2)?,
        available_in_appointments: row.get(3)?,
        created_at: parse_datetime(&created_at)?,
        deleted_at: deleted_at.as_deref().map(parse_datetime).transpose()?,
    })
}

/// Convert a row to an Appointment without topic ids.
///
/// Expected columns: id, sid, dept_code, details, created_at, deleted_at
pub fn row_to_appointment(row: &Row) -> rusqlite::Result<Appointment> {
    let created_at: String = row.get(4)?;
    let deleted_at: Option<String> = row.get(5)?;

    Ok(Appointment {
        id: row.get(0)?,
        sid: row.get(1)?,
        dept_code: row.get(2)?,
        details: row.get(3)?,
        topic_ids: Vec::new(),
        created_at: parse_datetime(&created_at)?,
        deleted_at: deleted_at.as_deref().map(parse_datetime).transpose()?,
    })
}

// ============================================================================
// Helper functions
// ============================================================================

fn conversion_error(
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err))
}

fn invalid_value(message: String) -> rusqlite::Error {
    conversion_error(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// Parse a date from ISO 8601 string (YYYY-MM-DD).
fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(conversion_error)
}

/// Parse a datetime from RFC 3339 string.
fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error)
}

fn parse_role(s: &str) -> rusqlite::Result<DeptRole> {
    s.parse().map_err(invalid_value)
}

fn parse_contact_type(s: &str) -> rusqlite::Result<ContactType> {
    s.parse().map_err(conversion_error)
}

fn json_to_criteria(s: &str) -> rusqlite::Result<FilterCriteria> {
    serde_json::from_str(s).map_err(conversion_error)
}

fn json_to_strings(s: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(s).map_err(conversion_error)
}

/// Serialize cohort criteria for the `criteria` column.
pub fn criteria_to_json(criteria: &FilterCriteria) -> Result<String, serde_json::Error> {
    serde_json::to_string(criteria)
}

/// Serialize a string list (author department codes) to JSON.
pub fn strings_to_json(values: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(values)
}

/// Bind value for a parameter produced by `boac_core::cohort::sql`.
pub fn to_sql_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Integer(i) => Value::Integer(*i),
        SqlValue::Real(r) => Value::Real(*r),
        SqlValue::Text(t) => Value::Text(t.clone()),
    }
}

/// Format a DateTime<Utc> for SQLite storage (RFC 3339).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Format a NaiveDate for SQLite storage (YYYY-MM-DD).
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use boac_core::cohort::FilterEntry;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("director").unwrap(), DeptRole::Director);
        assert_eq!(parse_role("Scheduler").unwrap(), DeptRole::Scheduler);
        assert!(parse_role("janitor").is_err());
    }

    #[test]
    fn test_parse_contact_type_uses_labels() {
        assert_eq!(
            parse_contact_type("Online scheduled").unwrap(),
            ContactType::OnlineScheduled
        );
        assert!(parse_contact_type("Carrier pigeon").is_err());
    }

    #[test]
    fn test_criteria_json_survives_storage() {
        let criteria = FilterCriteria::from_filters(&[
            FilterEntry::array("levels", vec!["Junior", "Senior"]),
            FilterEntry::boolean("transfer", true),
        ])
        .unwrap();

        let stored = criteria_to_json(&criteria).unwrap();
        assert_eq!(json_to_criteria(&stored).unwrap(), criteria);
        assert!(json_to_criteria("{not json").is_err());
    }

    #[test]
    fn test_dept_codes_json() {
        let codes = vec!["COENG".to_string(), "QCADV".to_string()];
        let stored = strings_to_json(&codes).unwrap();
        assert_eq!(stored, r#"["COENG","QCADV"]"#);
        assert_eq!(json_to_strings(&stored).unwrap(), codes);
    }

    #[test]
    fn test_to_sql_value() {
        assert_eq!(to_sql_value(&SqlValue::Integer(-1)), Value::Integer(-1));
        assert_eq!(to_sql_value(&SqlValue::Real(2.5)), Value::Real(2.5));
        assert_eq!(
            to_sql_value(&SqlValue::Text("MFB-DB".into())),
            Value::Text("MFB-DB".into())
        );
    }

    #[test]
    fn test_datetime_and_date_formats() {
        let dt = parse_datetime("2019-06-15T10:30:00+00:00").unwrap();
        assert!(format_datetime(&dt).starts_with("2019-06-15T10:30:00"));
        assert!(parse_datetime("yesterday").is_err());

        let date = NaiveDate::from_ymd_opt(2019, 6, 15).unwrap();
        assert_eq!(format_date(&date), "2019-06-15");
        assert_eq!(parse_date("2019-06-15").unwrap(), date);
    }
}
