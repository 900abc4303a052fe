//! SQLite repository implementation.
//!
//! Implements the repository traits from `boac_core::storage` on a single
//! `tokio_rusqlite` connection. Aggregates (users with memberships, notes
//! with topics and attachments) are assembled inside one `call` so each
//! read sees a consistent snapshot.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection as SqlConnection, Params, Row};
use tokio_rusqlite::Connection;

use boac_core::appointment::{Appointment, NewAppointment};
use boac_core::cohort::sql::{count_query, page_query};
use boac_core::cohort::{CohortFilter, NewCohort, StudentPage, StudentQuery};
use boac_core::curated::{CuratedGroup, NewCuratedGroup};
use boac_core::note::{
    NewAttachment, NewNote, NewNoteTemplate, Note, NoteAttachment, NoteDraft, NoteTemplate,
    NoteTemplateAttachment,
};
use boac_core::storage::{
    AppointmentRepository, CohortRepository, CuratedGroupRepository, NoteRepository,
    NoteTemplateRepository, RepositoryError, Result, StudentRepository, TopicRepository,
    UserRepository,
};
use boac_core::student::{Student, TeamGroup};
use boac_core::topic::{sort_topics, NewTopic, Topic};
use boac_core::user::{AuthorizedUser, NewUser};

use super::conversions::{
    criteria_to_json, format_date, format_datetime, row_to_appointment, row_to_cohort,
    row_to_curated_group, row_to_membership, row_to_note, row_to_note_attachment,
    row_to_note_template, row_to_student, row_to_team_group, row_to_template_attachment,
    row_to_topic, row_to_user, strings_to_json, to_sql_value,
};
use super::error::map_tokio_rusqlite_error;
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

fn serialization_error(e: serde_json::Error) -> RepositoryError {
    RepositoryError::Serialization(e.to_string())
}

fn not_found(entity_type: &'static str, id: impl ToString) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type,
        id: id.to_string(),
    }
}

/// Fails with `QueryReturnedNoRows` when a write touched nothing.
fn expect_rows(changed: usize) -> rusqlite::Result<()> {
    if changed == 0 {
        Err(rusqlite::Error::QueryReturnedNoRows)
    } else {
        Ok(())
    }
}

fn query_all<T, P: Params>(
    conn: &SqlConnection,
    sql: &str,
    params: P,
    f: impl FnMut(&Row) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, f)?;
    rows.collect()
}

fn first<T>(items: Vec<T>) -> Option<T> {
    items.into_iter().next()
}

// ============================================================================
// Aggregate loaders
// ============================================================================

fn load_users<P: Params>(
    conn: &SqlConnection,
    condition: &str,
    params: P,
) -> rusqlite::Result<Vec<AuthorizedUser>> {
    let mut users = query_all(conn, &schema::select_user_where(condition), params, row_to_user)?;
    for user in &mut users {
        user.departments = query_all(conn, schema::SELECT_MEMBERSHIPS, [user.id], row_to_membership)?;
    }
    Ok(users)
}

fn load_students<P: Params>(
    conn: &SqlConnection,
    condition: &str,
    params: P,
) -> rusqlite::Result<Vec<Student>> {
    let mut students = query_all(
        conn,
        &schema::select_student_where(condition),
        params,
        row_to_student,
    )?;
    for student in &mut students {
        student.majors = query_all(conn, schema::SELECT_MAJORS, [&student.sid], |r| r.get(0))?;
        student.athletics =
            query_all(conn, schema::SELECT_ATHLETICS, [&student.sid], row_to_team_group)?;
    }
    Ok(students)
}

/// Students in the order of `sids`, skipping unknown SIDs.
fn load_students_in_order(
    conn: &SqlConnection,
    sids: &[String],
) -> rusqlite::Result<Vec<Student>> {
    let mut students = Vec::with_capacity(sids.len());
    for sid in sids {
        students.extend(load_students(conn, "sid = ?1", [sid])?);
    }
    Ok(students)
}

fn load_curated_groups<P: Params>(
    conn: &SqlConnection,
    condition: &str,
    params: P,
) -> rusqlite::Result<Vec<CuratedGroup>> {
    let mut groups = query_all(
        conn,
        &schema::select_curated_group_where(condition),
        params,
        row_to_curated_group,
    )?;
    for group in &mut groups {
        group.sids = query_all(conn, schema::SELECT_GROUP_MEMBERS, [group.id], |r| r.get(0))?;
    }
    Ok(groups)
}

/// Live notes with their topics and live attachments.
fn load_notes<P: Params>(
    conn: &SqlConnection,
    condition: &str,
    params: P,
) -> rusqlite::Result<Vec<Note>> {
    let mut notes = query_all(conn, &schema::select_live_note_where(condition), params, row_to_note)?;
    for note in &mut notes {
        note.topics = query_all(conn, schema::SELECT_NOTE_TOPICS, [note.id], |r| r.get(0))?;
        note.attachments = query_all(
            conn,
            &schema::select_live_attachment_where("note_id = ?1"),
            [note.id],
            row_to_note_attachment,
        )?;
    }
    Ok(notes)
}

fn load_note(conn: &SqlConnection, id: i64) -> rusqlite::Result<Note> {
    first(load_notes(conn, "id = ?1", [id])?).ok_or(rusqlite::Error::QueryReturnedNoRows)
}

fn load_note_templates<P: Params>(
    conn: &SqlConnection,
    condition: &str,
    params: P,
) -> rusqlite::Result<Vec<NoteTemplate>> {
    let mut templates = query_all(
        conn,
        &schema::select_note_template_where(condition),
        params,
        row_to_note_template,
    )?;
    for template in &mut templates {
        template.topics =
            query_all(conn, schema::SELECT_TEMPLATE_TOPICS, [template.id], |r| r.get(0))?;
        template.attachments = query_all(
            conn,
            schema::SELECT_TEMPLATE_ATTACHMENTS,
            [template.id],
            row_to_template_attachment,
        )?;
    }
    Ok(templates)
}

/// Inserts a note row with its topics and attachments. Returns the new id.
fn insert_note(
    conn: &SqlConnection,
    note: &NewNote,
    dept_codes: &str,
    created_at: &str,
) -> rusqlite::Result<i64> {
    let draft = &note.draft;
    conn.execute(
        schema::INSERT_NOTE,
        params![
            note.sid,
            note.author.uid,
            note.author.name,
            note.author.role,
            dept_codes,
            draft.subject,
            draft.body,
            draft.contact_type.map(|c| c.as_str()),
            draft.set_date.as_ref().map(format_date),
            draft.is_private,
            created_at
        ],
    )?;
    let id = conn.last_insert_rowid();
    insert_note_topics(conn, id, &draft.topics)?;
    insert_note_attachments(conn, id, &note.attachments, created_at)?;
    Ok(id)
}

fn insert_note_topics(conn: &SqlConnection, note_id: i64, topics: &[String]) -> rusqlite::Result<()> {
    for (position, topic) in topics.iter().enumerate() {
        conn.execute(schema::INSERT_NOTE_TOPIC, params![note_id, topic, position])?;
    }
    Ok(())
}

fn insert_note_attachments(
    conn: &SqlConnection,
    note_id: i64,
    attachments: &[NewAttachment],
    at: &str,
) -> rusqlite::Result<()> {
    for a in attachments {
        conn.execute(
            schema::INSERT_NOTE_ATTACHMENT,
            params![note_id, a.path_to_attachment, a.filename, a.uploaded_by_uid, at],
        )?;
    }
    Ok(())
}

/// SQLite-based repository implementation.
///
/// Provides async access to SQLite storage for all entity types.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;
        tracing::info!(path = %path, "Opened SQLite database");

        Ok(Self { conn })
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

// ============================================================================
// UserRepository implementation
// ============================================================================

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user(&self, id: i64) -> Result<Option<AuthorizedUser>> {
        self.conn
            .call(move |conn| Ok(first(load_users(conn, "id = ?1", [id]).map_err(wrap_err)?)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "AuthorizedUser", id))
    }

    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<AuthorizedUser>> {
        let uid = uid.to_string();
        let uid_for_err = uid.clone();

        self.conn
            .call(move |conn| Ok(first(load_users(conn, "uid = ?1", [&uid]).map_err(wrap_err)?)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "AuthorizedUser", uid_for_err))
    }

    async fn list_users(&self) -> Result<Vec<AuthorizedUser>> {
        self.conn
            .call(|conn| load_users(conn, "1 = 1", params![]).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "AuthorizedUser", "*"))
    }

    async fn create_user(&self, user: NewUser) -> Result<AuthorizedUser> {
        let uid = user.uid.clone();
        let created_at = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(
                    schema::INSERT_USER,
                    params![
                        user.uid,
                        user.name,
                        user.title,
                        user.dept_affiliation,
                        user.is_admin,
                        user.can_access_advising_data,
                        created_at
                    ],
                )
                .map_err(wrap_err)?;
                let id = tx.last_insert_rowid();
                for m in &user.departments {
                    tx.execute(
                        schema::INSERT_MEMBERSHIP,
                        params![id, m.dept_code, m.role.as_str(), m.is_drop_in_advisor],
                    )
                    .map_err(wrap_err)?;
                }
                let created = first(load_users(&tx, "id = ?1", [id]).map_err(wrap_err)?)
                    .ok_or_else(|| wrap_err(rusqlite::Error::QueryReturnedNoRows))?;
                tx.commit().map_err(wrap_err)?;
                Ok(created)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "AuthorizedUser", uid))
    }
}

// ============================================================================
// StudentRepository implementation
// ============================================================================

#[async_trait]
impl StudentRepository for SqliteRepository {
    async fn get_student(&self, sid: &str) -> Result<Option<Student>> {
        let sid = sid.to_string();
        let sid_for_err = sid.clone();

        self.conn
            .call(move |conn| Ok(first(load_students(conn, "sid = ?1", [&sid]).map_err(wrap_err)?)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Student", sid_for_err))
    }

    async fn get_student_by_uid(&self, uid: &str) -> Result<Option<Student>> {
        let uid = uid.to_string();
        let uid_for_err = uid.clone();

        self.conn
            .call(move |conn| Ok(first(load_students(conn, "uid = ?1", [&uid]).map_err(wrap_err)?)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Student", uid_for_err))
    }

    async fn get_students(&self, sids: &[String]) -> Result<Vec<Student>> {
        let sids = sids.to_vec();

        self.conn
            .call(move |conn| load_students_in_order(conn, &sids).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Student", "*"))
    }

    async fn query_students(&self, query: &StudentQuery) -> Result<StudentPage> {
        let count = count_query(query);
        let page = page_query(query);

        self.conn
            .call(move |conn| {
                let total: i64 = conn
                    .query_row(
                        &count.sql,
                        params_from_iter(count.params.iter().map(to_sql_value)),
                        |r| r.get(0),
                    )
                    .map_err(wrap_err)?;
                let sids: Vec<String> = query_all(
                    conn,
                    &page.sql,
                    params_from_iter(page.params.iter().map(to_sql_value)),
                    |r| r.get(0),
                )
                .map_err(wrap_err)?;
                let students = load_students_in_order(conn, &sids).map_err(wrap_err)?;

                Ok(StudentPage {
                    total_student_count: usize::try_from(total).unwrap_or_default(),
                    students,
                })
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Student", "query"))
    }

    async fn list_team_groups(&self) -> Result<Vec<TeamGroup>> {
        self.conn
            .call(|conn| {
                query_all(conn, schema::SELECT_TEAM_GROUPS, params![], row_to_team_group)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "TeamGroup", "*"))
    }

    async fn create_team_group(&self, group: &TeamGroup) -> Result<()> {
        let group = group.clone();
        let code = group.group_code.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_TEAM_GROUP,
                    params![group.group_code, group.group_name, group.team_code, group.team_name],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "TeamGroup", code))
    }

    async fn create_student(&self, student: &Student) -> Result<()> {
        let s = student.clone();
        let sid = student.sid.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let coe = s.coe.as_ref();
                tx.execute(
                    schema::INSERT_STUDENT,
                    params![
                        s.sid,
                        s.uid,
                        s.first_name,
                        s.last_name,
                        s.gpa,
                        s.level,
                        s.units,
                        s.expected_grad_term,
                        s.transfer,
                        s.in_intensive_cohort,
                        s.is_active_asc,
                        s.status_asc,
                        coe.map(|p| p.advisor_uid.as_str()),
                        coe.map(|p| p.probation),
                        coe.and_then(|p| p.gender.as_deref()),
                        coe.and_then(|p| p.ethnicity.as_deref()),
                        coe.map(|p| p.underrepresented)
                    ],
                )
                .map_err(wrap_err)?;
                for (position, major) in s.majors.iter().enumerate() {
                    tx.execute(schema::INSERT_MAJOR, params![s.sid, major, position])
                        .map_err(wrap_err)?;
                }
                for group in &s.athletics {
                    tx.execute(schema::INSERT_ATHLETE, params![s.sid, group.group_code])
                        .map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Student", sid))
    }
}

// ============================================================================
// CohortRepository implementation
// ============================================================================

#[async_trait]
impl CohortRepository for SqliteRepository {
    async fn get_cohort(&self, id: i64) -> Result<Option<CohortFilter>> {
        self.conn
            .call(move |conn| {
                let cohorts = query_all(conn, &schema::select_cohort_where("id = ?1"), [id], row_to_cohort)
                    .map_err(wrap_err)?;
                Ok(first(cohorts))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CohortFilter", id))
    }

    async fn list_cohorts(&self) -> Result<Vec<CohortFilter>> {
        self.conn
            .call(|conn| {
                query_all(conn, &schema::select_cohort_where("1 = 1"), params![], row_to_cohort)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CohortFilter", "*"))
    }

    async fn list_cohorts_owned_by(&self, uid: &str) -> Result<Vec<CohortFilter>> {
        let uid = uid.to_string();
        let uid_for_err = uid.clone();

        self.conn
            .call(move |conn| {
                query_all(conn, &schema::select_cohort_where("owner_uid = ?1"), [&uid], row_to_cohort)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CohortFilter", uid_for_err))
    }

    async fn create_cohort(&self, cohort: NewCohort) -> Result<CohortFilter> {
        let cohort = cohort.into_cohort(0, Utc::now());
        let criteria = criteria_to_json(&cohort.criteria).map_err(serialization_error)?;
        let created_at = format_datetime(&cohort.created_at);
        let name = cohort.name.clone();
        let owner_uid = cohort.owner_uid.clone();

        let id = self
            .conn
            .call(move |conn| {
                conn.execute(schema::INSERT_COHORT, params![name, owner_uid, criteria, created_at])
                    .map_err(wrap_err)?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CohortFilter", "new"))?;

        Ok(CohortFilter { id, ..cohort })
    }

    async fn update_cohort(&self, cohort: &CohortFilter) -> Result<()> {
        let id = cohort.id;
        let name = cohort.name.clone();
        let criteria = criteria_to_json(&cohort.criteria).map_err(serialization_error)?;
        let student_count = cohort.student_count;
        let updated_at = format_datetime(&cohort.updated_at);

        self.conn
            .call(move |conn| {
                let changed = conn
                    .execute(
                        schema::UPDATE_COHORT,
                        params![id, name, criteria, student_count, updated_at],
                    )
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CohortFilter", id))
    }

    async fn delete_cohort(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                let changed = conn.execute(schema::DELETE_COHORT, [id]).map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CohortFilter", id))
    }
}

// ============================================================================
// CuratedGroupRepository implementation
// ============================================================================

fn insert_group_members(conn: &SqlConnection, group_id: i64, sids: &[String]) -> rusqlite::Result<()> {
    for (position, sid) in sids.iter().enumerate() {
        conn.execute(schema::INSERT_GROUP_MEMBER, params![group_id, sid, position])?;
    }
    Ok(())
}

#[async_trait]
impl CuratedGroupRepository for SqliteRepository {
    async fn get_curated_group(&self, id: i64) -> Result<Option<CuratedGroup>> {
        self.conn
            .call(move |conn| Ok(first(load_curated_groups(conn, "id = ?1", [id]).map_err(wrap_err)?)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CuratedGroup", id))
    }

    async fn list_curated_groups(&self) -> Result<Vec<CuratedGroup>> {
        self.conn
            .call(|conn| load_curated_groups(conn, "1 = 1", params![]).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CuratedGroup", "*"))
    }

    async fn list_curated_groups_owned_by(&self, owner_id: i64) -> Result<Vec<CuratedGroup>> {
        self.conn
            .call(move |conn| load_curated_groups(conn, "owner_id = ?1", [owner_id]).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CuratedGroup", owner_id))
    }

    async fn create_curated_group(&self, group: NewCuratedGroup) -> Result<CuratedGroup> {
        let group = group.into_group(0, Utc::now());
        let owner_id = group.owner_id;
        let name = group.name.clone();
        let sids = group.sids.clone();
        let created_at = format_datetime(&group.created_at);

        let id = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(schema::INSERT_CURATED_GROUP, params![owner_id, name, created_at])
                    .map_err(wrap_err)?;
                let id = tx.last_insert_rowid();
                insert_group_members(&tx, id, &sids).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(id)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CuratedGroup", "new"))?;

        Ok(CuratedGroup { id, ..group })
    }

    async fn update_curated_group(&self, group: &CuratedGroup) -> Result<()> {
        let id = group.id;
        let name = group.name.clone();
        let sids = group.sids.clone();
        let updated_at = format_datetime(&group.updated_at);

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let changed = tx
                    .execute(schema::UPDATE_CURATED_GROUP, params![id, name, updated_at])
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)?;
                tx.execute(schema::DELETE_GROUP_MEMBERS, [id]).map_err(wrap_err)?;
                insert_group_members(&tx, id, &sids).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CuratedGroup", id))
    }

    async fn delete_curated_group(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                let changed = conn
                    .execute(schema::DELETE_CURATED_GROUP, [id])
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "CuratedGroup", id))
    }
}

// ============================================================================
// NoteRepository implementation
// ============================================================================

#[async_trait]
impl NoteRepository for SqliteRepository {
    async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        self.conn
            .call(move |conn| Ok(first(load_notes(conn, "id = ?1", [id]).map_err(wrap_err)?)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", id))
    }

    async fn get_notes_by_sid(&self, sid: &str) -> Result<Vec<Note>> {
        let sid = sid.to_string();
        let sid_for_err = sid.clone();

        self.conn
            .call(move |conn| load_notes(conn, "sid = ?1", [&sid]).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", sid_for_err))
    }

    async fn create_note(&self, note: NewNote) -> Result<Note> {
        let dept_codes = strings_to_json(&note.author.dept_codes).map_err(serialization_error)?;
        let created_at = format_datetime(&Utc::now());
        let sid = note.sid.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let id = insert_note(&tx, &note, &dept_codes, &created_at).map_err(wrap_err)?;
                let created = load_note(&tx, id).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(created)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", sid))
    }

    async fn create_notes(&self, notes: Vec<NewNote>, reader_id: i64) -> Result<Vec<Note>> {
        let rows = notes
            .into_iter()
            .map(|note| {
                let dept_codes = strings_to_json(&note.author.dept_codes)?;
                Ok((note, dept_codes))
            })
            .collect::<std::result::Result<Vec<_>, serde_json::Error>>()
            .map_err(serialization_error)?;
        let created_at = format_datetime(&Utc::now());
        let count = rows.len();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let mut created = Vec::with_capacity(rows.len());
                for (note, dept_codes) in &rows {
                    let id = insert_note(&tx, note, dept_codes, &created_at).map_err(wrap_err)?;
                    tx.execute(schema::INSERT_NOTE_READ, params![id, reader_id, created_at])
                        .map_err(wrap_err)?;
                    created.push(load_note(&tx, id).map_err(wrap_err)?);
                }
                tx.commit().map_err(wrap_err)?;
                Ok(created)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", format!("batch of {count}")))
    }

    async fn update_note(&self, id: i64, draft: &NoteDraft, at: DateTime<Utc>) -> Result<Note> {
        let draft = draft.clone();
        let updated_at = format_datetime(&at);

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let changed = tx
                    .execute(
                        schema::UPDATE_NOTE,
                        params![
                            id,
                            draft.subject,
                            draft.body,
                            draft.contact_type.map(|c| c.as_str()),
                            draft.set_date.as_ref().map(format_date),
                            draft.is_private,
                            updated_at
                        ],
                    )
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)?;
                tx.execute(schema::DELETE_NOTE_TOPICS, [id]).map_err(wrap_err)?;
                insert_note_topics(&tx, id, &draft.topics).map_err(wrap_err)?;
                let updated = load_note(&tx, id).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(updated)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", id))
    }

    async fn delete_note(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let deleted_at = format_datetime(&at);

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let changed = tx
                    .execute(schema::SOFT_DELETE_NOTE, params![id, deleted_at])
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)?;
                tx.execute(schema::SOFT_DELETE_NOTE_ATTACHMENTS, params![id, deleted_at])
                    .map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", id))
    }

    async fn add_attachments(
        &self,
        note_id: i64,
        attachments: Vec<NewAttachment>,
        at: DateTime<Utc>,
    ) -> Result<Note> {
        let at = format_datetime(&at);

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let changed = tx
                    .execute(schema::TOUCH_NOTE, params![note_id, at])
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)?;
                insert_note_attachments(&tx, note_id, &attachments, &at).map_err(wrap_err)?;
                let note = load_note(&tx, note_id).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(note)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", note_id))
    }

    async fn get_attachment(&self, id: i64) -> Result<Option<NoteAttachment>> {
        self.conn
            .call(move |conn| {
                let attachments =
                    query_all(conn, schema::SELECT_LIVE_ATTACHMENT, [id], row_to_note_attachment)
                        .map_err(wrap_err)?;
                Ok(first(attachments))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "NoteAttachment", id))
    }

    async fn delete_attachment(
        &self,
        note_id: i64,
        attachment_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Note> {
        let at = format_datetime(&at);

        let note = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let changed = tx
                    .execute(schema::TOUCH_NOTE, params![note_id, at])
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)?;
                let removed = tx
                    .execute(schema::SOFT_DELETE_ATTACHMENT, params![note_id, attachment_id, at])
                    .map_err(wrap_err)?;
                if removed == 0 {
                    return Ok(None);
                }
                let note = load_note(&tx, note_id).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(Some(note))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", note_id))?;

        note.ok_or_else(|| not_found("NoteAttachment", attachment_id))
    }

    async fn mark_read(&self, note_id: i64, viewer_id: i64) -> Result<()> {
        let created_at = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                load_note(conn, note_id).map_err(wrap_err)?;
                conn.execute(schema::INSERT_NOTE_READ, params![note_id, viewer_id, created_at])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", note_id))
    }

    async fn get_read_note_ids(&self, viewer_id: i64, note_ids: &[i64]) -> Result<HashSet<i64>> {
        let note_ids = note_ids.to_vec();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_NOTE_READ).map_err(wrap_err)?;
                let mut read = HashSet::new();
                for id in note_ids {
                    if stmt.exists([id, viewer_id]).map_err(wrap_err)? {
                        read.insert(id);
                    }
                }
                Ok(read)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", viewer_id))
    }

    async fn note_topic_counts(&self) -> Result<HashMap<String, usize>> {
        self.conn
            .call(|conn| {
                let rows: Vec<(String, usize)> =
                    query_all(conn, schema::NOTE_TOPIC_COUNTS, params![], |r| {
                        Ok((r.get(0)?, r.get(1)?))
                    })
                    .map_err(wrap_err)?;
                Ok(rows.into_iter().collect())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Note", "topics"))
    }
}

// ============================================================================
// NoteTemplateRepository implementation
// ============================================================================

#[async_trait]
impl NoteTemplateRepository for SqliteRepository {
    async fn get_note_template(&self, id: i64) -> Result<Option<NoteTemplate>> {
        self.conn
            .call(move |conn| Ok(first(load_note_templates(conn, "id = ?1", [id]).map_err(wrap_err)?)))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "NoteTemplate", id))
    }

    async fn list_note_templates_by_creator(&self, creator_id: i64) -> Result<Vec<NoteTemplate>> {
        self.conn
            .call(move |conn| {
                load_note_templates(conn, "creator_id = ?1", [creator_id]).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "NoteTemplate", creator_id))
    }

    async fn create_note_template(&self, template: NewNoteTemplate) -> Result<NoteTemplate> {
        let title = template.title.clone();
        let created_at = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                let t = template;
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(
                    schema::INSERT_NOTE_TEMPLATE,
                    params![t.creator_id, t.title, t.subject, t.body, t.is_private, created_at],
                )
                .map_err(wrap_err)?;
                let id = tx.last_insert_rowid();
                for (position, topic) in t.topics.iter().enumerate() {
                    tx.execute(schema::INSERT_TEMPLATE_TOPIC, params![id, topic, position])
                        .map_err(wrap_err)?;
                }
                for a in &t.attachments {
                    tx.execute(
                        schema::INSERT_TEMPLATE_ATTACHMENT,
                        params![id, a.path_to_attachment, a.filename, a.uploaded_by_uid, created_at],
                    )
                    .map_err(wrap_err)?;
                }
                let created = first(load_note_templates(&tx, "id = ?1", [id]).map_err(wrap_err)?)
                    .ok_or_else(|| wrap_err(rusqlite::Error::QueryReturnedNoRows))?;
                tx.commit().map_err(wrap_err)?;
                Ok(created)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "NoteTemplate", title))
    }

    async fn delete_note_template(&self, id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                let changed = conn
                    .execute(schema::DELETE_NOTE_TEMPLATE, [id])
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "NoteTemplate", id))
    }

    async fn get_template_attachments(&self, ids: &[i64]) -> Result<Vec<NoteTemplateAttachment>> {
        let ids = ids.to_vec();

        self.conn
            .call(move |conn| {
                let mut attachments = Vec::with_capacity(ids.len());
                for id in ids {
                    attachments.extend(
                        query_all(
                            conn,
                            schema::SELECT_TEMPLATE_ATTACHMENT,
                            [id],
                            row_to_template_attachment,
                        )
                        .map_err(wrap_err)?,
                    );
                }
                Ok(attachments)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "NoteTemplateAttachment", "*"))
    }
}

// ============================================================================
// TopicRepository implementation
// ============================================================================

fn load_topic(conn: &SqlConnection, id: i64) -> rusqlite::Result<Option<Topic>> {
    Ok(first(query_all(
        conn,
        &schema::select_topic_where("id = ?1"),
        [id],
        row_to_topic,
    )?))
}

#[async_trait]
impl TopicRepository for SqliteRepository {
    async fn list_topics(&self, include_deleted: bool) -> Result<Vec<Topic>> {
        let mut topics = self
            .conn
            .call(move |conn| {
                query_all(
                    conn,
                    &schema::select_topic_where("(?1 OR deleted_at IS NULL)"),
                    [include_deleted],
                    row_to_topic,
                )
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Topic", "*"))?;

        sort_topics(&mut topics);
        Ok(topics)
    }

    async fn get_topic(&self, id: i64) -> Result<Option<Topic>> {
        self.conn
            .call(move |conn| load_topic(conn, id).map_err(wrap_err))
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Topic", id))
    }

    async fn create_topic(&self, topic: NewTopic) -> Result<Topic> {
        let label = topic.topic.clone();
        let now = Utc::now();
        let created_at = format_datetime(&now);

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_TOPIC,
                    params![
                        topic.topic,
                        topic.available_in_notes,
                        topic.available_in_appointments,
                        created_at
                    ],
                )
                .map_err(wrap_err)?;
                Ok(topic.into_topic(conn.last_insert_rowid(), now))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Topic", label))
    }

    async fn update_topic(&self, id: i64, topic: NewTopic) -> Result<Topic> {
        let label = topic.topic.clone();

        let updated = self
            .conn
            .call(move |conn| {
                if load_topic(conn, id).map_err(wrap_err)?.is_none() {
                    return Ok(None);
                }
                conn.execute(
                    schema::UPDATE_TOPIC,
                    params![
                        id,
                        topic.topic,
                        topic.available_in_notes,
                        topic.available_in_appointments
                    ],
                )
                .map_err(wrap_err)?;
                load_topic(conn, id).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Topic", label))?;

        updated.ok_or_else(|| not_found("Topic", id))
    }

    async fn delete_topic(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let deleted_at = format_datetime(&at);

        self.conn
            .call(move |conn| {
                let changed = conn
                    .execute(schema::SET_TOPIC_DELETED_AT, params![id, deleted_at])
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Topic", id))
    }

    async fn undelete_topic(&self, id: i64) -> Result<Topic> {
        self.conn
            .call(move |conn| {
                let changed = conn
                    .execute(schema::SET_TOPIC_DELETED_AT, params![id, None::<String>])
                    .map_err(wrap_err)?;
                expect_rows(changed).map_err(wrap_err)?;
                load_topic(conn, id)
                    .map_err(wrap_err)?
                    .ok_or_else(|| wrap_err(rusqlite::Error::QueryReturnedNoRows))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Topic", id))
    }
}

// ============================================================================
// AppointmentRepository implementation
// ============================================================================

#[async_trait]
impl AppointmentRepository for SqliteRepository {
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        let now = Utc::now();
        let created_at = format_datetime(&now);
        let sid = appointment.sid.clone();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                tx.execute(
                    schema::INSERT_APPOINTMENT,
                    params![
                        appointment.sid,
                        appointment.dept_code,
                        appointment.details,
                        created_at
                    ],
                )
                .map_err(wrap_err)?;
                let id = tx.last_insert_rowid();
                for topic_id in &appointment.topic_ids {
                    tx.execute(schema::INSERT_APPOINTMENT_TOPIC, params![id, topic_id])
                        .map_err(wrap_err)?;
                }
                tx.commit().map_err(wrap_err)?;
                Ok(appointment.into_appointment(id, now))
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Appointment", sid))
    }

    async fn list_appointments(&self, include_deleted: bool) -> Result<Vec<Appointment>> {
        self.conn
            .call(move |conn| {
                let mut appointments =
                    query_all(conn, schema::SELECT_APPOINTMENTS, [include_deleted], row_to_appointment)
                        .map_err(wrap_err)?;
                for appointment in &mut appointments {
                    appointment.topic_ids = query_all(
                        conn,
                        schema::SELECT_APPOINTMENT_TOPIC_IDS,
                        [appointment.id],
                        |r| r.get(0),
                    )
                    .map_err(wrap_err)?;
                }
                Ok(appointments)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Appointment", "*"))
    }

    async fn appointment_topic_counts(&self) -> Result<HashMap<i64, usize>> {
        self.conn
            .call(|conn| {
                let rows: Vec<(i64, usize)> =
                    query_all(conn, schema::APPOINTMENT_TOPIC_COUNTS, params![], |r| {
                        Ok((r.get(0)?, r.get(1)?))
                    })
                    .map_err(wrap_err)?;
                Ok(rows.into_iter().collect())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "Appointment", "topics"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boac_core::cohort::{FilterCriteria, FilterEntry, OrderBy};
    use boac_core::note::{ContactType, NoteAuthor};
    use boac_core::student::CoeProfile;
    use boac_core::user::{DeptMembership, DeptRole};

    async fn repo() -> SqliteRepository {
        SqliteRepository::new_in_memory().await.unwrap()
    }

    fn draft(subject: &str, topics: &[&str]) -> NoteDraft {
        NoteDraft {
            subject: subject.to_string(),
            body: "<p>Body</p>".to_string(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            contact_type: Some(ContactType::Phone),
            set_date: None,
            is_private: false,
        }
    }

    fn attachment(name: &str) -> NewAttachment {
        NewAttachment {
            path_to_attachment: format!("2019/01/01/x_{name}"),
            filename: name.to_string(),
            uploaded_by_uid: "1133399".to_string(),
        }
    }

    async fn advisor(repo: &SqliteRepository) -> AuthorizedUser {
        repo.create_user(
            NewUser::new("1133399", "Roberta Joan Anderson")
                .with_membership(DeptMembership::new("COENG", DeptRole::Advisor).drop_in())
                .with_membership(DeptMembership::new("QCADV", DeptRole::Director)),
        )
        .await
        .unwrap()
    }

    async fn note(repo: &SqliteRepository, user: &AuthorizedUser, attachments: Vec<NewAttachment>) -> Note {
        repo.create_note(NewNote {
            sid: "11667051".to_string(),
            author: NoteAuthor::of(user),
            draft: draft("Hello", &["Housing", "housing", "Study Skills"]),
            attachments,
        })
        .await
        .unwrap()
    }

    async fn seed_students(repo: &SqliteRepository) {
        repo.create_team_group(&TeamGroup::new("MFB-DB", "Football, Defensive Backs", "FBM", "Football"))
            .await
            .unwrap();

        let mut athlete = Student::new("11667051", "61889", "Deborah", "Davies");
        athlete.gpa = Some(3.5);
        athlete.level = Some("Junior".into());
        athlete.majors = vec!["English BA".into(), "Nuclear Engineering BS".into()];
        athlete.athletics = vec![TeamGroup::new("MFB-DB", "Football, Defensive Backs", "FBM", "Football")];

        let mut inactive = Student::new("2345678901", "98765", "Dave", "Doolittle");
        inactive.gpa = Some(2.1);
        inactive.athletics = athlete.athletics.clone();
        inactive.is_active_asc = false;

        let mut coe = Student::new("9000000000", "300847", "Wolfgang", "Pauli-O'Rourke");
        coe.coe = Some(CoeProfile {
            advisor_uid: "1133399".into(),
            probation: true,
            gender: Some("M".into()),
            ethnicity: None,
            underrepresented: false,
        });

        for student in [athlete, inactive, coe] {
            repo.create_student(&student).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_user_with_memberships() {
        let repo = repo().await;
        let created = advisor(&repo).await;
        assert_eq!(created.id, 1);
        assert_eq!(created.departments.len(), 2);
        assert!(created.departments[0].is_drop_in_advisor);

        let found = repo.get_user_by_uid("1133399").await.unwrap().unwrap();
        assert_eq!(found, created);

        let err = repo
            .create_user(NewUser::new("1133399", "Someone Else"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists { .. }));
        assert_eq!(repo.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_student_round_trip_and_order() {
        let repo = repo().await;
        seed_students(&repo).await;

        let athlete = repo.get_student("11667051").await.unwrap().unwrap();
        assert_eq!(athlete.majors, vec!["English BA", "Nuclear Engineering BS"]);
        assert_eq!(athlete.athletics[0].group_code, "MFB-DB");
        assert!(athlete.coe.is_none());

        let coe = repo.get_student_by_uid("300847").await.unwrap().unwrap();
        assert!(coe.coe.unwrap().probation);

        let students = repo
            .get_students(&["9000000000".into(), "404".into(), "11667051".into()])
            .await
            .unwrap();
        let sids: Vec<&str> = students.iter().map(|s| s.sid.as_str()).collect();
        assert_eq!(sids, vec!["9000000000", "11667051"]);
    }

    #[tokio::test]
    async fn test_query_students_agrees_with_in_memory_evaluation() {
        let repo = repo().await;
        seed_students(&repo).await;

        let asc = NewUser::new("1081940", "ASC")
            .with_membership(DeptMembership::new("UWASC", DeptRole::Advisor))
            .into_user(99, Utc::now());
        let query = StudentQuery::for_owner(FilterCriteria::default(), &asc);
        let page = repo.query_students(&query).await.unwrap();
        assert_eq!(page.total_student_count, 1);
        assert_eq!(page.students[0].sid, "11667051");

        let criteria = FilterCriteria::from_filters(&[FilterEntry::boolean("isInactiveAsc", true)])
            .unwrap();
        let page = repo
            .query_students(&StudentQuery::for_owner(criteria, &asc))
            .await
            .unwrap();
        assert_eq!(page.students[0].sid, "2345678901");

        let admin = NewUser::new("2040", "Admin").admin().into_user(98, Utc::now());
        let query = StudentQuery::for_owner(FilterCriteria::default(), &admin)
            .with_order(OrderBy::Gpa)
            .with_page(1, Some(1));
        let page = repo.query_students(&query).await.unwrap();
        assert_eq!(page.total_student_count, 3);
        assert_eq!(page.students.len(), 1);
        assert_eq!(page.students[0].sid, "11667051");
    }

    #[tokio::test]
    async fn test_cohort_lifecycle() {
        let repo = repo().await;
        let criteria =
            FilterCriteria::from_filters(&[FilterEntry::array("levels", vec!["Junior"])]).unwrap();
        let mut cohort = repo
            .create_cohort(NewCohort {
                name: "Juniors".to_string(),
                owner_uid: "2040".to_string(),
                criteria: criteria.clone(),
            })
            .await
            .unwrap();
        assert_eq!(cohort.id, 1);

        cohort.student_count = Some(12);
        repo.update_cohort(&cohort).await.unwrap();
        let stored = repo.get_cohort(cohort.id).await.unwrap().unwrap();
        assert_eq!(stored.student_count, Some(12));
        assert_eq!(stored.criteria, criteria);
        assert_eq!(repo.list_cohorts_owned_by("2040").await.unwrap().len(), 1);

        repo.delete_cohort(cohort.id).await.unwrap();
        let err = repo.delete_cohort(cohort.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_curated_group_keeps_member_order() {
        let repo = repo().await;
        let mut group = repo
            .create_curated_group(NewCuratedGroup::new(
                7,
                "Cool Kids",
                vec!["3".into(), "1".into(), "3".into()],
            ))
            .await
            .unwrap();
        assert_eq!(group.sids, vec!["3", "1"]);

        group.add_sids(&["2"]);
        group.name = "Cooler Kids".to_string();
        repo.update_curated_group(&group).await.unwrap();

        let stored = repo.get_curated_group(group.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Cooler Kids");
        assert_eq!(stored.sids, vec!["3", "1", "2"]);
        assert_eq!(repo.list_curated_groups_owned_by(7).await.unwrap().len(), 1);

        repo.delete_curated_group(group.id).await.unwrap();
        assert!(repo.get_curated_group(group.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_note_attachment_lifecycle() {
        let repo = repo().await;
        let user = advisor(&repo).await;
        let created = note(&repo, &user, vec![attachment("a.pdf"), attachment("b.pdf")]).await;
        assert_eq!(created.attachments.len(), 2);
        assert_eq!(created.author_dept_codes, vec!["COENG", "QCADV"]);
        assert_eq!(created.contact_type, Some(ContactType::Phone));
        assert!(created.updated_at.is_none());

        let removed = created.attachments[0].id;
        let updated = repo
            .delete_attachment(created.id, removed, Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.attachments.len(), 1);
        assert!(updated.updated_at.is_some());
        assert!(repo.get_attachment(removed).await.unwrap().is_none());

        let err = repo
            .delete_attachment(created.id, removed, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, not_found("NoteAttachment", removed));

        let updated = repo
            .add_attachments(created.id, vec![attachment("c.pdf")], Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.attachments[1].filename, "c.pdf");
    }

    #[tokio::test]
    async fn test_update_and_delete_note() {
        let repo = repo().await;
        let user = advisor(&repo).await;
        let created = note(&repo, &user, vec![attachment("a.pdf")]).await;

        let updated = repo
            .update_note(created.id, &draft("Changed", &["Other"]), Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.subject, "Changed");
        assert_eq!(updated.topics, vec!["Other"]);

        repo.delete_note(created.id, Utc::now()).await.unwrap();
        assert!(repo.get_note(created.id).await.unwrap().is_none());
        assert!(repo.get_notes_by_sid("11667051").await.unwrap().is_empty());
        assert!(repo
            .get_attachment(created.attachments[0].id)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            repo.mark_read(created.id, user.id).await.unwrap_err(),
            RepositoryError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_read_state_and_topic_counts() {
        let repo = repo().await;
        let user = advisor(&repo).await;
        let first_note = note(&repo, &user, vec![]).await;
        let second_note = note(&repo, &user, vec![]).await;

        repo.mark_read(first_note.id, 7).await.unwrap();
        repo.mark_read(first_note.id, 7).await.unwrap();

        let read = repo
            .get_read_note_ids(7, &[first_note.id, second_note.id])
            .await
            .unwrap();
        assert_eq!(read, HashSet::from([first_note.id]));

        let counts = repo.note_topic_counts().await.unwrap();
        assert_eq!(counts.get("housing"), Some(&2));
        assert_eq!(counts.get("study skills"), Some(&2));
    }

    fn batch(user: &AuthorizedUser, sids: &[&str]) -> Vec<NewNote> {
        sids.iter()
            .map(|sid| NewNote {
                sid: sid.to_string(),
                author: NoteAuthor::of(user),
                draft: draft("Batch", &["Housing"]),
                attachments: vec![attachment("shared.pdf")],
            })
            .collect()
    }

    #[tokio::test]
    async fn test_batch_notes_are_read_by_author() {
        let repo = repo().await;
        let user = advisor(&repo).await;

        let notes = repo
            .create_notes(batch(&user, &["11667051", "2345678901"]), user.id)
            .await
            .unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].sid, "2345678901");
        assert_eq!(notes[1].attachments[0].filename, "shared.pdf");

        let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();
        let read = repo.get_read_note_ids(user.id, &ids).await.unwrap();
        assert_eq!(read, ids.iter().copied().collect::<HashSet<_>>());
    }

    #[tokio::test]
    async fn test_failed_batch_stores_nothing() {
        let repo = repo().await;
        let user = advisor(&repo).await;
        repo.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_sid BEFORE INSERT ON notes \
                     WHEN NEW.sid = '2345678901' BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .unwrap();

        let result = repo
            .create_notes(batch(&user, &["11667051", "2345678901"]), user.id)
            .await;

        assert!(result.is_err());
        assert!(repo.get_notes_by_sid("11667051").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_template_titles_are_unique_per_creator() {
        let repo = repo().await;
        let template = |creator_id| NewNoteTemplate {
            creator_id,
            title: "Welcome".to_string(),
            subject: "Welcome to BOAC".to_string(),
            body: String::new(),
            topics: vec!["Housing".to_string()],
            is_private: false,
            attachments: vec![attachment("w.pdf")],
        };

        let created = repo.create_note_template(template(1)).await.unwrap();
        assert_eq!(created.topics, vec!["Housing"]);
        let err = repo.create_note_template(template(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists { .. }));
        assert!(repo.create_note_template(template(2)).await.is_ok());

        let attachments = repo
            .get_template_attachments(&[created.attachments[0].id, 999])
            .await
            .unwrap();
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].note_template_id, created.id);

        repo.delete_note_template(created.id).await.unwrap();
        assert!(repo
            .get_template_attachments(&[created.attachments[0].id])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_topic_labels_are_unique_ignoring_case() {
        let repo = repo().await;
        let topic = repo
            .create_topic(NewTopic::new("Housing", true, false).unwrap())
            .await
            .unwrap();
        let other = repo
            .create_topic(NewTopic::new("Study Skills", true, true).unwrap())
            .await
            .unwrap();

        let err = repo
            .create_topic(NewTopic::new("HOUSING", false, true).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists { .. }));

        let err = repo
            .update_topic(other.id, NewTopic::new("housing", true, true).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyExists { .. }));
        let err = repo
            .update_topic(404, NewTopic::new("Lost", true, true).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err, not_found("Topic", 404));

        repo.delete_topic(topic.id, Utc::now()).await.unwrap();
        assert_eq!(repo.list_topics(false).await.unwrap().len(), 1);
        assert_eq!(repo.list_topics(true).await.unwrap().len(), 2);

        let restored = repo.undelete_topic(topic.id).await.unwrap();
        assert!(!restored.is_deleted());
    }

    #[tokio::test]
    async fn test_appointment_topic_counts_skip_deleted() {
        let repo = repo().await;
        repo.create_appointment(NewAppointment::new("11667051", "QCADV", "Drop-in", vec![1, 2]))
            .await
            .unwrap();
        repo.create_appointment(NewAppointment::new("2345678901", "QCADV", "Drop-in", vec![1]))
            .await
            .unwrap();

        let appointments = repo.list_appointments(false).await.unwrap();
        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[0].topic_ids, vec![1, 2]);

        let counts = repo.appointment_topic_counts().await.unwrap();
        assert_eq!(counts.get(&1), Some(&2));
        assert_eq!(counts.get(&2), Some(&1));
    }
}
