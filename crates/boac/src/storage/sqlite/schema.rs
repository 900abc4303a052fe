//! SQLite schema and SQL statements used by the repository.
//!
//! Student queries built from cohort criteria live in
//! `boac_core::cohort::sql`; this module holds the fixed statements.

/// Creates every table and index.
pub const CREATE_TABLES: &str = r#"
PRAGMA foreign_keys = ON;

-- Authorized users and their department memberships
CREATE TABLE IF NOT EXISTS authorized_users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uid TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    title TEXT,
    dept_affiliation TEXT,
    is_admin INTEGER NOT NULL DEFAULT 0,
    can_access_advising_data INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS university_dept_members (
    user_id INTEGER NOT NULL,
    dept_code TEXT NOT NULL,
    role TEXT NOT NULL,
    is_drop_in_advisor INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (user_id, dept_code),
    FOREIGN KEY (user_id) REFERENCES authorized_users(id) ON DELETE CASCADE
);

-- Students; COE columns are NULL for students without a COE profile
CREATE TABLE IF NOT EXISTS students (
    sid TEXT PRIMARY KEY,
    uid TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    gpa REAL,
    level TEXT,
    units REAL NOT NULL DEFAULT 0,
    expected_grad_term TEXT,
    transfer INTEGER NOT NULL DEFAULT 0,
    in_intensive_cohort INTEGER NOT NULL DEFAULT 0,
    is_active_asc INTEGER NOT NULL DEFAULT 1,
    status_asc TEXT,
    coe_advisor_uid TEXT,
    coe_probation INTEGER,
    coe_gender TEXT,
    coe_ethnicity TEXT,
    coe_underrepresented INTEGER
);

CREATE TABLE IF NOT EXISTS student_majors (
    sid TEXT NOT NULL,
    major TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (sid, major),
    FOREIGN KEY (sid) REFERENCES students(sid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS team_groups (
    group_code TEXT PRIMARY KEY,
    group_name TEXT NOT NULL,
    team_code TEXT NOT NULL,
    team_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS student_athletes (
    sid TEXT NOT NULL,
    group_code TEXT NOT NULL,
    PRIMARY KEY (sid, group_code),
    FOREIGN KEY (sid) REFERENCES students(sid) ON DELETE CASCADE,
    FOREIGN KEY (group_code) REFERENCES team_groups(group_code)
);

-- Saved cohort filters; criteria is the JSON form of FilterCriteria
CREATE TABLE IF NOT EXISTS cohort_filters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    owner_uid TEXT NOT NULL,
    criteria TEXT NOT NULL,
    student_count INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Curated groups
CREATE TABLE IF NOT EXISTS student_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS student_group_members (
    student_group_id INTEGER NOT NULL,
    sid TEXT NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (student_group_id, sid),
    FOREIGN KEY (student_group_id) REFERENCES student_groups(id) ON DELETE CASCADE
);

-- Notes
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sid TEXT NOT NULL,
    author_uid TEXT NOT NULL,
    author_name TEXT NOT NULL,
    author_role TEXT NOT NULL,
    author_dept_codes TEXT NOT NULL,
    subject TEXT NOT NULL,
    body TEXT NOT NULL,
    contact_type TEXT,
    set_date TEXT,
    is_private INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS note_topics (
    note_id INTEGER NOT NULL,
    topic TEXT NOT NULL,
    position INTEGER NOT NULL,
    FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS note_attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id INTEGER NOT NULL,
    path_to_attachment TEXT NOT NULL,
    filename TEXT NOT NULL,
    uploaded_by_uid TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT,
    FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS notes_read (
    note_id INTEGER NOT NULL,
    viewer_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (note_id, viewer_id),
    FOREIGN KEY (note_id) REFERENCES notes(id) ON DELETE CASCADE
);

-- Note templates
CREATE TABLE IF NOT EXISTS note_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    creator_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    subject TEXT NOT NULL,
    body TEXT NOT NULL,
    is_private INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (creator_id, title)
);

CREATE TABLE IF NOT EXISTS note_template_topics (
    note_template_id INTEGER NOT NULL,
    topic TEXT NOT NULL,
    position INTEGER NOT NULL,
    FOREIGN KEY (note_template_id) REFERENCES note_templates(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS note_template_attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_template_id INTEGER NOT NULL,
    path_to_attachment TEXT NOT NULL,
    filename TEXT NOT NULL,
    uploaded_by_uid TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (note_template_id) REFERENCES note_templates(id) ON DELETE CASCADE
);

-- Topics; labels are unique ignoring case
CREATE TABLE IF NOT EXISTS topics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    topic TEXT NOT NULL,
    available_in_notes INTEGER NOT NULL,
    available_in_appointments INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

-- Drop-in appointments
CREATE TABLE IF NOT EXISTS appointments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sid TEXT NOT NULL,
    dept_code TEXT NOT NULL,
    details TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS appointment_topics (
    appointment_id INTEGER NOT NULL,
    topic_id INTEGER NOT NULL,
    PRIMARY KEY (appointment_id, topic_id),
    FOREIGN KEY (appointment_id) REFERENCES appointments(id) ON DELETE CASCADE
);

-- Indexes for efficient queries
CREATE UNIQUE INDEX IF NOT EXISTS idx_topics_label ON topics(topic COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_students_uid ON students(uid);
CREATE INDEX IF NOT EXISTS idx_cohort_filters_owner ON cohort_filters(owner_uid);
CREATE INDEX IF NOT EXISTS idx_student_groups_owner ON student_groups(owner_id);
CREATE INDEX IF NOT EXISTS idx_notes_sid ON notes(sid);
CREATE INDEX IF NOT EXISTS idx_note_topics_note_id ON note_topics(note_id);
CREATE INDEX IF NOT EXISTS idx_note_attachments_note_id ON note_attachments(note_id);
CREATE INDEX IF NOT EXISTS idx_note_templates_creator ON note_templates(creator_id);
"#;

// User queries
pub const INSERT_USER: &str = r#"
INSERT INTO authorized_users
    (uid, name, title, dept_affiliation, is_admin, can_access_advising_data, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

const USER_COLUMNS: &str =
    "id, uid, name, title, dept_affiliation, is_admin, can_access_advising_data, created_at";

pub fn select_user_where(condition: &str) -> String {
    format!("SELECT {USER_COLUMNS} FROM authorized_users WHERE {condition} ORDER BY id")
}

pub const INSERT_MEMBERSHIP: &str = r#"
INSERT INTO university_dept_members (user_id, dept_code, role, is_drop_in_advisor)
VALUES (?1, ?2, ?3, ?4)
"#;

pub const SELECT_MEMBERSHIPS: &str = r#"
SELECT dept_code, role, is_drop_in_advisor
FROM university_dept_members
WHERE user_id = ?1
ORDER BY rowid
"#;

// Student queries
pub const INSERT_STUDENT: &str = r#"
INSERT INTO students (
    sid, uid, first_name, last_name, gpa, level, units, expected_grad_term, transfer,
    in_intensive_cohort, is_active_asc, status_asc,
    coe_advisor_uid, coe_probation, coe_gender, coe_ethnicity, coe_underrepresented
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
"#;

const STUDENT_COLUMNS: &str = "sid, uid, first_name, last_name, gpa, level, units, \
     expected_grad_term, transfer, in_intensive_cohort, is_active_asc, status_asc, \
     coe_advisor_uid, coe_probation, coe_gender, coe_ethnicity, coe_underrepresented";

pub fn select_student_where(condition: &str) -> String {
    format!("SELECT {STUDENT_COLUMNS} FROM students WHERE {condition}")
}

pub const INSERT_MAJOR: &str =
    "INSERT INTO student_majors (sid, major, position) VALUES (?1, ?2, ?3)";

pub const SELECT_MAJORS: &str =
    "SELECT major FROM student_majors WHERE sid = ?1 ORDER BY position";

pub const INSERT_ATHLETE: &str =
    "INSERT INTO student_athletes (sid, group_code) VALUES (?1, ?2)";

pub const SELECT_ATHLETICS: &str = r#"
SELECT tg.group_code, tg.group_name, tg.team_code, tg.team_name
FROM student_athletes sa
JOIN team_groups tg ON tg.group_code = sa.group_code
WHERE sa.sid = ?1
ORDER BY sa.rowid
"#;

pub const INSERT_TEAM_GROUP: &str = r#"
INSERT INTO team_groups (group_code, group_name, team_code, team_name)
VALUES (?1, ?2, ?3, ?4)
"#;

pub const SELECT_TEAM_GROUPS: &str = r#"
SELECT group_code, group_name, team_code, team_name
FROM team_groups
ORDER BY group_name
"#;

// Cohort queries
pub const INSERT_COHORT: &str = r#"
INSERT INTO cohort_filters (name, owner_uid, criteria, student_count, created_at, updated_at)
VALUES (?1, ?2, ?3, NULL, ?4, ?4)
"#;

const COHORT_COLUMNS: &str =
    "id, name, owner_uid, criteria, student_count, created_at, updated_at";

pub fn select_cohort_where(condition: &str) -> String {
    format!("SELECT {COHORT_COLUMNS} FROM cohort_filters WHERE {condition} ORDER BY id")
}

pub const UPDATE_COHORT: &str = r#"
UPDATE cohort_filters
SET name = ?2, criteria = ?3, student_count = ?4, updated_at = ?5
WHERE id = ?1
"#;

pub const DELETE_COHORT: &str = "DELETE FROM cohort_filters WHERE id = ?1";

// Curated group queries
pub const INSERT_CURATED_GROUP: &str = r#"
INSERT INTO student_groups (owner_id, name, created_at, updated_at)
VALUES (?1, ?2, ?3, ?3)
"#;

const CURATED_GROUP_COLUMNS: &str = "id, owner_id, name, created_at, updated_at";

pub fn select_curated_group_where(condition: &str) -> String {
    format!("SELECT {CURATED_GROUP_COLUMNS} FROM student_groups WHERE {condition} ORDER BY id")
}

pub const UPDATE_CURATED_GROUP: &str = r#"
UPDATE student_groups SET name = ?2, updated_at = ?3 WHERE id = ?1
"#;

pub const DELETE_CURATED_GROUP: &str = "DELETE FROM student_groups WHERE id = ?1";

pub const INSERT_GROUP_MEMBER: &str =
    "INSERT INTO student_group_members (student_group_id, sid, position) VALUES (?1, ?2, ?3)";

pub const DELETE_GROUP_MEMBERS: &str =
    "DELETE FROM student_group_members WHERE student_group_id = ?1";

pub const SELECT_GROUP_MEMBERS: &str = r#"
SELECT sid FROM student_group_members WHERE student_group_id = ?1 ORDER BY position
"#;

// Note queries
pub const INSERT_NOTE: &str = r#"
INSERT INTO notes (
    sid, author_uid, author_name, author_role, author_dept_codes,
    subject, body, contact_type, set_date, is_private, created_at
)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
"#;

const NOTE_COLUMNS: &str = "id, sid, author_uid, author_name, author_role, author_dept_codes, \
     subject, body, contact_type, set_date, is_private, created_at, updated_at, deleted_at";

pub fn select_live_note_where(condition: &str) -> String {
    format!(
        "SELECT {NOTE_COLUMNS} FROM notes WHERE deleted_at IS NULL AND {condition} \
         ORDER BY created_at, id"
    )
}

pub const UPDATE_NOTE: &str = r#"
UPDATE notes
SET subject = ?2, body = ?3, contact_type = ?4, set_date = ?5, is_private = ?6, updated_at = ?7
WHERE id = ?1 AND deleted_at IS NULL
"#;

pub const TOUCH_NOTE: &str =
    "UPDATE notes SET updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL";

pub const SOFT_DELETE_NOTE: &str =
    "UPDATE notes SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL";

pub const INSERT_NOTE_TOPIC: &str =
    "INSERT INTO note_topics (note_id, topic, position) VALUES (?1, ?2, ?3)";

pub const DELETE_NOTE_TOPICS: &str = "DELETE FROM note_topics WHERE note_id = ?1";

pub const SELECT_NOTE_TOPICS: &str =
    "SELECT topic FROM note_topics WHERE note_id = ?1 ORDER BY position";

pub const NOTE_TOPIC_COUNTS: &str = r#"
SELECT lower(nt.topic), COUNT(DISTINCT nt.note_id)
FROM note_topics nt
JOIN notes n ON n.id = nt.note_id
WHERE n.deleted_at IS NULL
GROUP BY lower(nt.topic)
"#;

pub const INSERT_NOTE_ATTACHMENT: &str = r#"
INSERT INTO note_attachments (note_id, path_to_attachment, filename, uploaded_by_uid, created_at)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

const NOTE_ATTACHMENT_COLUMNS: &str =
    "id, note_id, path_to_attachment, filename, uploaded_by_uid, created_at, deleted_at";

pub fn select_live_attachment_where(condition: &str) -> String {
    format!(
        "SELECT {NOTE_ATTACHMENT_COLUMNS} FROM note_attachments \
         WHERE deleted_at IS NULL AND {condition} ORDER BY id"
    )
}

pub const SOFT_DELETE_NOTE_ATTACHMENTS: &str = r#"
UPDATE note_attachments SET deleted_at = ?2 WHERE note_id = ?1 AND deleted_at IS NULL
"#;

pub const SOFT_DELETE_ATTACHMENT: &str = r#"
UPDATE note_attachments SET deleted_at = ?3
WHERE id = ?2 AND note_id = ?1 AND deleted_at IS NULL
"#;

pub const SELECT_LIVE_ATTACHMENT: &str = r#"
SELECT a.id, a.note_id, a.path_to_attachment, a.filename, a.uploaded_by_uid, a.created_at, a.deleted_at
FROM note_attachments a
JOIN notes n ON n.id = a.note_id
WHERE a.id = ?1 AND a.deleted_at IS NULL AND n.deleted_at IS NULL
"#;

pub const INSERT_NOTE_READ: &str = r#"
INSERT OR IGNORE INTO notes_read (note_id, viewer_id, created_at) VALUES (?1, ?2, ?3)
"#;

pub const SELECT_NOTE_READ: &str =
    "SELECT 1 FROM notes_read WHERE note_id = ?1 AND viewer_id = ?2";

// Note template queries
pub const INSERT_NOTE_TEMPLATE: &str = r#"
INSERT INTO note_templates (creator_id, title, subject, body, is_private, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
"#;

const NOTE_TEMPLATE_COLUMNS: &str =
    "id, creator_id, title, subject, body, is_private, created_at, updated_at";

pub fn select_note_template_where(condition: &str) -> String {
    format!(
        "SELECT {NOTE_TEMPLATE_COLUMNS} FROM note_templates WHERE {condition} \
         ORDER BY lower(title), id"
    )
}

pub const DELETE_NOTE_TEMPLATE: &str = "DELETE FROM note_templates WHERE id = ?1";

pub const INSERT_TEMPLATE_TOPIC: &str = r#"
INSERT INTO note_template_topics (note_template_id, topic, position) VALUES (?1, ?2, ?3)
"#;

pub const SELECT_TEMPLATE_TOPICS: &str = r#"
SELECT topic FROM note_template_topics WHERE note_template_id = ?1 ORDER BY position
"#;

pub const INSERT_TEMPLATE_ATTACHMENT: &str = r#"
INSERT INTO note_template_attachments
    (note_template_id, path_to_attachment, filename, uploaded_by_uid, created_at)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const SELECT_TEMPLATE_ATTACHMENTS: &str = r#"
SELECT id, note_template_id, path_to_attachment, filename, uploaded_by_uid, created_at
FROM note_template_attachments
WHERE note_template_id = ?1
ORDER BY id
"#;

pub const SELECT_TEMPLATE_ATTACHMENT: &str = r#"
SELECT id, note_template_id, path_to_attachment, filename, uploaded_by_uid, created_at
FROM note_template_attachments
WHERE id = ?1
"#;

// Topic queries
pub const INSERT_TOPIC: &str = r#"
INSERT INTO topics (topic, available_in_notes, available_in_appointments, created_at)
VALUES (?1, ?2, ?3, ?4)
"#;

const TOPIC_COLUMNS: &str =
    "id, topic, available_in_notes, available_in_appointments, created_at, deleted_at";

pub fn select_topic_where(condition: &str) -> String {
    format!("SELECT {TOPIC_COLUMNS} FROM topics WHERE {condition} ORDER BY id")
}

pub const UPDATE_TOPIC: &str = r#"
UPDATE topics SET topic = ?2, available_in_notes = ?3, available_in_appointments = ?4
WHERE id = ?1
"#;

pub const SET_TOPIC_DELETED_AT: &str = "UPDATE topics SET deleted_at = ?2 WHERE id = ?1";

// Appointment queries
pub const INSERT_APPOINTMENT: &str = r#"
INSERT INTO appointments (sid, dept_code, details, created_at) VALUES (?1, ?2, ?3, ?4)
"#;

pub const INSERT_APPOINTMENT_TOPIC: &str = r#"
INSERT OR IGNORE INTO appointment_topics (appointment_id, topic_id) VALUES (?1, ?2)
"#;

pub const SELECT_APPOINTMENTS: &str = r#"
SELECT id, sid, dept_code, details, created_at, deleted_at
FROM appointments
WHERE ?1 OR deleted_at IS NULL
ORDER BY id
"#;

pub const SELECT_APPOINTMENT_TOPIC_IDS: &str = r#"
SELECT topic_id FROM appointment_topics WHERE appointment_id = ?1 ORDER BY rowid
"#;

pub const APPOINTMENT_TOPIC_COUNTS: &str = r#"
SELECT at.topic_id, COUNT(*)
FROM appointment_topics at
JOIN appointments a ON a.id = at.appointment_id
WHERE a.deleted_at IS NULL
GROUP BY at.topic_id
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_covers_every_entity() {
        for table in [
            "authorized_users",
            "university_dept_members",
            "students",
            "student_majors",
            "team_groups",
            "student_athletes",
            "cohort_filters",
            "student_groups",
            "student_group_members",
            "notes",
            "note_topics",
            "note_attachments",
            "notes_read",
            "note_templates",
            "note_template_topics",
            "note_template_attachments",
            "topics",
            "appointments",
            "appointment_topics",
        ] {
            assert!(
                CREATE_TABLES.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")),
                "missing table {table}"
            );
        }
        assert!(CREATE_TABLES.contains("PRAGMA foreign_keys = ON"));
    }

    #[test]
    fn test_live_note_queries_skip_deleted_rows() {
        let sql = select_live_note_where("sid = ?1");
        assert!(sql.contains("deleted_at IS NULL AND sid = ?1"));
        assert!(sql.ends_with("ORDER BY created_at, id"));

        let sql = select_live_attachment_where("note_id = ?1");
        assert!(sql.contains("deleted_at IS NULL AND note_id = ?1"));
    }

    #[test]
    fn test_templates_sort_by_title_ignoring_case() {
        assert!(select_note_template_where("creator_id = ?1").contains("ORDER BY lower(title), id"));
    }
}
