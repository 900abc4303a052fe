use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::appointment::{Appointment, NewAppointment};
use crate::cohort::{CohortFilter, NewCohort, StudentPage, StudentQuery};
use crate::curated::{CuratedGroup, NewCuratedGroup};
use crate::note::{
    NewAttachment, NewNote, NewNoteTemplate, Note, NoteAttachment, NoteDraft, NoteTemplate,
    NoteTemplateAttachment,
};
use crate::student::{Student, TeamGroup};
use crate::topic::{NewTopic, Topic};
use crate::user::{AuthorizedUser, NewUser};

use super::Result;

/// Repository for authorized users and their department memberships.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a user by id.
    async fn get_user(&self, id: i64) -> Result<Option<AuthorizedUser>>;

    /// Gets a user by campus UID.
    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<AuthorizedUser>>;

    /// Lists every user.
    async fn list_users(&self) -> Result<Vec<AuthorizedUser>>;

    /// Creates a user. Fails with `AlreadyExists` for a known UID.
    async fn create_user(&self, user: NewUser) -> Result<AuthorizedUser>;
}

/// Repository for students and athletic team groups.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Gets a student by SID.
    async fn get_student(&self, sid: &str) -> Result<Option<Student>>;

    /// Gets a student by campus UID.
    async fn get_student_by_uid(&self, uid: &str) -> Result<Option<Student>>;

    /// Gets students in the order of `sids`. Unknown SIDs are skipped.
    async fn get_students(&self, sids: &[String]) -> Result<Vec<Student>>;

    /// Evaluates a student query: filter, scope, order and page.
    async fn query_students(&self, query: &StudentQuery) -> Result<StudentPage>;

    /// Lists all team groups.
    async fn list_team_groups(&self) -> Result<Vec<TeamGroup>>;

    /// Creates a team group.
    async fn create_team_group(&self, group: &TeamGroup) -> Result<()>;

    /// Creates a student along with majors and team memberships.
    async fn create_student(&self, student: &Student) -> Result<()>;
}

/// Repository for saved cohort filters.
#[async_trait]
pub trait CohortRepository: Send + Sync {
    /// Gets a cohort by id.
    async fn get_cohort(&self, id: i64) -> Result<Option<CohortFilter>>;

    /// Lists every cohort.
    async fn list_cohorts(&self) -> Result<Vec<CohortFilter>>;

    /// Lists cohorts owned by a UID.
    async fn list_cohorts_owned_by(&self, uid: &str) -> Result<Vec<CohortFilter>>;

    /// Creates a cohort.
    async fn create_cohort(&self, cohort: NewCohort) -> Result<CohortFilter>;

    /// Replaces name, criteria and cached count of an existing cohort.
    async fn update_cohort(&self, cohort: &CohortFilter) -> Result<()>;

    /// Deletes a cohort by id.
    async fn delete_cohort(&self, id: i64) -> Result<()>;
}

/// Repository for curated groups.
#[async_trait]
pub trait CuratedGroupRepository: Send + Sync {
    /// Gets a curated group by id.
    async fn get_curated_group(&self, id: i64) -> Result<Option<CuratedGroup>>;

    /// Lists every curated group.
    async fn list_curated_groups(&self) -> Result<Vec<CuratedGroup>>;

    /// Lists curated groups owned by a user.
    async fn list_curated_groups_owned_by(&self, owner_id: i64) -> Result<Vec<CuratedGroup>>;

    /// Creates a curated group.
    async fn create_curated_group(&self, group: NewCuratedGroup) -> Result<CuratedGroup>;

    /// Replaces the name and membership of an existing group.
    async fn update_curated_group(&self, group: &CuratedGroup) -> Result<()>;

    /// Deletes a curated group by id.
    async fn delete_curated_group(&self, id: i64) -> Result<()>;
}

/// Repository for advising notes, their attachments and read state.
///
/// Deleted notes and attachments are kept with `deleted_at` set and are
/// never returned.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Gets a note by id.
    async fn get_note(&self, id: i64) -> Result<Option<Note>>;

    /// Gets the notes about a student, oldest first.
    async fn get_notes_by_sid(&self, sid: &str) -> Result<Vec<Note>>;

    /// Creates a note with its attachments.
    async fn create_note(&self, note: NewNote) -> Result<Note>;

    /// Creates one note per entry and marks each read by `reader_id`.
    /// Either every note is stored or none is.
    async fn create_notes(&self, notes: Vec<NewNote>, reader_id: i64) -> Result<Vec<Note>>;

    /// Replaces the content of a note and sets `updated_at`.
    async fn update_note(&self, id: i64, draft: &NoteDraft, at: DateTime<Utc>) -> Result<Note>;

    /// Soft-deletes a note and its attachments.
    async fn delete_note(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Adds attachments to a note and sets `updated_at`.
    async fn add_attachments(
        &self,
        note_id: i64,
        attachments: Vec<NewAttachment>,
        at: DateTime<Utc>,
    ) -> Result<Note>;

    /// Gets an attachment by id.
    async fn get_attachment(&self, id: i64) -> Result<Option<NoteAttachment>>;

    /// Soft-deletes one attachment of a note and sets `updated_at`.
    async fn delete_attachment(
        &self,
        note_id: i64,
        attachment_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Note>;

    /// Records that a user has read a note. Idempotent.
    async fn mark_read(&self, note_id: i64, viewer_id: i64) -> Result<()>;

    /// Which of `note_ids` the viewer has read.
    async fn get_read_note_ids(&self, viewer_id: i64, note_ids: &[i64]) -> Result<HashSet<i64>>;

    /// Counts non-deleted notes per lowercased topic label.
    async fn note_topic_counts(&self) -> Result<HashMap<String, usize>>;
}

/// Repository for note templates.
#[async_trait]
pub trait NoteTemplateRepository: Send + Sync {
    /// Gets a template by id.
    async fn get_note_template(&self, id: i64) -> Result<Option<NoteTemplate>>;

    /// Lists a creator's templates ordered by title.
    async fn list_note_templates_by_creator(&self, creator_id: i64) -> Result<Vec<NoteTemplate>>;

    /// Creates a template. Fails with `AlreadyExists` when the creator already
    /// has a template with the same title.
    async fn create_note_template(&self, template: NewNoteTemplate) -> Result<NoteTemplate>;

    /// Deletes a template and its attachments.
    async fn delete_note_template(&self, id: i64) -> Result<()>;

    /// Gets template attachments by id. Unknown ids are skipped.
    async fn get_template_attachments(&self, ids: &[i64]) -> Result<Vec<NoteTemplateAttachment>>;
}

/// Repository for topics.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Lists topics, optionally including soft-deleted ones.
    async fn list_topics(&self, include_deleted: bool) -> Result<Vec<Topic>>;

    /// Gets a topic by id, deleted or not.
    async fn get_topic(&self, id: i64) -> Result<Option<Topic>>;

    /// Creates a topic. Labels are unique, ignoring case.
    async fn create_topic(&self, topic: NewTopic) -> Result<Topic>;

    /// Replaces the label and availability of a topic.
    async fn update_topic(&self, id: i64, topic: NewTopic) -> Result<Topic>;

    /// Soft-deletes a topic.
    async fn delete_topic(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Clears `deleted_at` on a topic.
    async fn undelete_topic(&self, id: i64) -> Result<Topic>;
}

/// Repository for appointments.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Creates an appointment.
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment>;

    /// Lists appointments, optionally including soft-deleted ones.
    async fn list_appointments(&self, include_deleted: bool) -> Result<Vec<Appointment>>;

    /// Counts non-deleted appointments per topic id.
    async fn appointment_topic_counts(&self) -> Result<HashMap<i64, usize>>;
}
