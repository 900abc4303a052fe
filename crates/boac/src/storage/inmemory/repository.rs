//! In-memory repository implementation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use boac_core::appointment::{Appointment, NewAppointment};
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

/// Monotonic id generator starting at 1.
#[derive(Debug, Default)]
struct Sequence(AtomicI64);

impl Sequence {
    fn next(&self) -> i64 {
        self.reserve(1)
    }

    /// Reserves `count` consecutive ids and returns the first.
    fn reserve(&self, count: usize) -> i64 {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        self.0.fetch_add(count, Ordering::SeqCst) + 1
    }
}

#[derive(Debug, Default)]
struct Sequences {
    users: Sequence,
    cohorts: Sequence,
    curated_groups: Sequence,
    notes: Sequence,
    note_attachments: Sequence,
    note_templates: Sequence,
    template_attachments: Sequence,
    topics: Sequence,
    appointments: Sequence,
}

/// In-memory storage backend for development and tests.
///
/// Uses ordered maps wrapped in `Arc<RwLock<_>>` for thread-safe access.
/// Data is not persisted and will be lost when the repository is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<RwLock<BTreeMap<i64, AuthorizedUser>>>,
    students: Arc<RwLock<BTreeMap<String, Student>>>,
    team_groups: Arc<RwLock<BTreeMap<String, TeamGroup>>>,
    cohorts: Arc<RwLock<BTreeMap<i64, CohortFilter>>>,
    curated_groups: Arc<RwLock<BTreeMap<i64, CuratedGroup>>>,
    notes: Arc<RwLock<BTreeMap<i64, Note>>>,
    note_reads: Arc<RwLock<HashSet<(i64, i64)>>>,
    note_templates: Arc<RwLock<BTreeMap<i64, NoteTemplate>>>,
    topics: Arc<RwLock<BTreeMap<i64, Topic>>>,
    appointments: Arc<RwLock<BTreeMap<i64, Appointment>>>,
    ids: Arc<Sequences>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(entity_type: &'static str, id: impl ToString) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type,
        id: id.to_string(),
    }
}

fn already_exists(entity_type: &'static str, id: impl ToString) -> RepositoryError {
    RepositoryError::AlreadyExists {
        entity_type,
        id: id.to_string(),
    }
}

/// A live note with removed attachments stripped.
fn visible(note: &Note) -> Option<Note> {
    if note.is_deleted() {
        return None;
    }
    let mut note = note.clone();
    note.attachments.retain(|a| a.deleted_at.is_none());
    Some(note)
}

fn live_note_mut(notes: &mut BTreeMap<i64, Note>, id: i64) -> Result<&mut Note> {
    notes
        .get_mut(&id)
        .filter(|n| !n.is_deleted())
        .ok_or_else(|| not_found("Note", id))
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: i64) -> Result<Option<AuthorizedUser>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_user_by_uid(&self, uid: &str) -> Result<Option<AuthorizedUser>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.uid == uid).cloned())
    }

    async fn list_users(&self) -> Result<Vec<AuthorizedUser>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn create_user(&self, user: NewUser) -> Result<AuthorizedUser> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.uid == user.uid) {
            return Err(already_exists("AuthorizedUser", &user.uid));
        }
        let user = user.into_user(self.ids.users.next(), Utc::now());
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl StudentRepository for InMemoryRepository {
    async fn get_student(&self, sid: &str) -> Result<Option<Student>> {
        Ok(self.students.read().await.get(sid).cloned())
    }

    async fn get_student_by_uid(&self, uid: &str) -> Result<Option<Student>> {
        let students = self.students.read().await;
        Ok(students.values().find(|s| s.uid == uid).cloned())
    }

    async fn get_students(&self, sids: &[String]) -> Result<Vec<Student>> {
        let students = self.students.read().await;
        Ok(sids.iter().filter_map(|sid| students.get(sid).cloned()).collect())
    }

    async fn query_students(&self, query: &StudentQuery) -> Result<StudentPage> {
        let students = self.students.read().await;
        Ok(query.apply(students.values().cloned()))
    }

    async fn list_team_groups(&self) -> Result<Vec<TeamGroup>> {
        let mut groups: Vec<TeamGroup> = self.team_groups.read().await.values().cloned().collect();
        groups.sort_by(|a, b| a.group_name.cmp(&b.group_name));
        Ok(groups)
    }

    async fn create_team_group(&self, group: &TeamGroup) -> Result<()> {
        let mut groups = self.team_groups.write().await;
        if groups.contains_key(&group.group_code) {
            return Err(already_exists("TeamGroup", &group.group_code));
        }
        groups.insert(group.group_code.clone(), group.clone());
        Ok(())
    }

    async fn create_student(&self, student: &Student) -> Result<()> {
        let mut students = self.students.write().await;
        if students.contains_key(&student.sid) {
            return Err(already_exists("Student", &student.sid));
        }
        students.insert(student.sid.clone(), student.clone());
        Ok(())
    }
}

#[async_trait]
impl CohortRepository for InMemoryRepository {
    async fn get_cohort(&self, id: i64) -> Result<Option<CohortFilter>> {
        Ok(self.cohorts.read().await.get(&id).cloned())
    }

    async fn list_cohorts(&self) -> Result<Vec<CohortFilter>> {
        Ok(self.cohorts.read().await.values().cloned().collect())
    }

    async fn list_cohorts_owned_by(&self, uid: &str) -> Result<Vec<CohortFilter>> {
        let cohorts = self.cohorts.read().await;
        Ok(cohorts
            .values()
            .filter(|c| c.is_owned_by(uid))
            .cloned()
            .collect())
    }

    async fn create_cohort(&self, cohort: NewCohort) -> Result<CohortFilter> {
        let cohort = cohort.into_cohort(self.ids.cohorts.next(), Utc::now());
        self.cohorts
            .write()
            .await
            .insert(cohort.id, cohort.clone());
        Ok(cohort)
    }

    async fn update_cohort(&self, cohort: &CohortFilter) -> Result<()> {
        let mut cohorts = self.cohorts.write().await;
        let existing = cohorts
            .get_mut(&cohort.id)
            .ok_or_else(|| not_found("CohortFilter", cohort.id))?;
        *existing = cohort.clone();
        Ok(())
    }

    async fn delete_cohort(&self, id: i64) -> Result<()> {
        self.cohorts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("CohortFilter", id))
    }
}

#[async_trait]
impl CuratedGroupRepository for InMemoryRepository {
    async fn get_curated_group(&self, id: i64) -> Result<Option<CuratedGroup>> {
        Ok(self.curated_groups.read().await.get(&id).cloned())
    }

    async fn list_curated_groups(&self) -> Result<Vec<CuratedGroup>> {
        Ok(self.curated_groups.read().await.values().cloned().collect())
    }

    async fn list_curated_groups_owned_by(&self, owner_id: i64) -> Result<Vec<CuratedGroup>> {
        let groups = self.curated_groups.read().await;
        Ok(groups
            .values()
            .filter(|g| g.is_owned_by(owner_id))
            .cloned()
            .collect())
    }

    async fn create_curated_group(&self, group: NewCuratedGroup) -> Result<CuratedGroup> {
        let group = group.into_group(self.ids.curated_groups.next(), Utc::now());
        self.curated_groups
            .write()
            .await
            .insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_curated_group(&self, group: &CuratedGroup) -> Result<()> {
        let mut groups = self.curated_groups.write().await;
        let existing = groups
            .get_mut(&group.id)
            .ok_or_else(|| not_found("CuratedGroup", group.id))?;
        *existing = group.clone();
        Ok(())
    }

    async fn delete_curated_group(&self, id: i64) -> Result<()> {
        self.curated_groups
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("CuratedGroup", id))
    }
}

#[async_trait]
impl NoteRepository for InMemoryRepository {
    async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        Ok(self.notes.read().await.get(&id).and_then(visible))
    }

    async fn get_notes_by_sid(&self, sid: &str) -> Result<Vec<Note>> {
        let notes = self.notes.read().await;
        let mut found: Vec<Note> = notes
            .values()
            .filter(|n| n.sid == sid)
            .filter_map(visible)
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn create_note(&self, note: NewNote) -> Result<Note> {
        let first_attachment_id = self.ids.note_attachments.reserve(note.attachments.len());
        let note = note.into_note(self.ids.notes.next(), Utc::now(), first_attachment_id);
        self.notes.write().await.insert(note.id, note.clone());
        Ok(note)
    }

    async fn create_notes(&self, notes: Vec<NewNote>, reader_id: i64) -> Result<Vec<Note>> {
        let now = Utc::now();
        let created: Vec<Note> = notes
            .into_iter()
            .map(|note| {
                let first_attachment_id = self.ids.note_attachments.reserve(note.attachments.len());
                note.into_note(self.ids.notes.next(), now, first_attachment_id)
            })
            .collect();

        let mut stored = self.notes.write().await;
        let mut reads = self.note_reads.write().await;
        for note in &created {
            stored.insert(note.id, note.clone());
            reads.insert((note.id, reader_id));
        }
        Ok(created)
    }

    async fn update_note(&self, id: i64, draft: &NoteDraft, at: DateTime<Utc>) -> Result<Note> {
        let mut notes = self.notes.write().await;
        let note = live_note_mut(&mut notes, id)?;
        note.subject = draft.subject.clone();
        note.body = draft.body.clone();
        note.topics = draft.topics.clone();
        note.contact_type = draft.contact_type;
        note.set_date = draft.set_date;
        note.is_private = draft.is_private;
        note.updated_at = Some(at);
        visible(note).ok_or_else(|| not_found("Note", id))
    }

    async fn delete_note(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut notes = self.notes.write().await;
        let note = live_note_mut(&mut notes, id)?;
        note.deleted_at = Some(at);
        for attachment in note.attachments.iter_mut().filter(|a| a.deleted_at.is_none()) {
            attachment.deleted_at = Some(at);
        }
        Ok(())
    }

    async fn add_attachments(
        &self,
        note_id: i64,
        attachments: Vec<NewAttachment>,
        at: DateTime<Utc>,
    ) -> Result<Note> {
        let mut notes = self.notes.write().await;
        let note = live_note_mut(&mut notes, note_id)?;
        let first_id = self.ids.note_attachments.reserve(attachments.len());
        note.attachments.extend(
            attachments
                .into_iter()
                .zip(first_id..)
                .map(|(a, id)| a.into_attachment(id, note_id, at)),
        );
        note.updated_at = Some(at);
        visible(note).ok_or_else(|| not_found("Note", note_id))
    }

    async fn get_attachment(&self, id: i64) -> Result<Option<NoteAttachment>> {
        let notes = self.notes.read().await;
        Ok(notes
            .values()
            .filter(|n| !n.is_deleted())
            .flat_map(|n| n.attachments.iter())
            .find(|a| a.id == id && a.deleted_at.is_none())
            .cloned())
    }

    async fn delete_attachment(
        &self,
        note_id: i64,
        attachment_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Note> {
        let mut notes = self.notes.write().await;
        let note = live_note_mut(&mut notes, note_id)?;
        let attachment = note
            .attachments
            .iter_mut()
            .find(|a| a.id == attachment_id && a.deleted_at.is_none())
            .ok_or_else(|| not_found("NoteAttachment", attachment_id))?;
        attachment.deleted_at = Some(at);
        note.updated_at = Some(at);
        visible(note).ok_or_else(|| not_found("Note", note_id))
    }

    async fn mark_read(&self, note_id: i64, viewer_id: i64) -> Result<()> {
        if self.get_note(note_id).await?.is_none() {
            return Err(not_found("Note", note_id));
        }
        self.note_reads.write().await.insert((note_id, viewer_id));
        Ok(())
    }

    async fn get_read_note_ids(&self, viewer_id: i64, note_ids: &[i64]) -> Result<HashSet<i64>> {
        let reads = self.note_reads.read().await;
        Ok(note_ids
            .iter()
            .copied()
            .filter(|id| reads.contains(&(*id, viewer_id)))
            .collect())
    }

    async fn note_topic_counts(&self) -> Result<HashMap<String, usize>> {
        let notes = self.notes.read().await;
        let mut counts = HashMap::new();
        for note in notes.values().filter(|n| !n.is_deleted()) {
            let labels: HashSet<String> = note.topics.iter().map(|t| t.to_lowercase()).collect();
            for label in labels {
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl NoteTemplateRepository for InMemoryRepository {
    async fn get_note_template(&self, id: i64) -> Result<Option<NoteTemplate>> {
        Ok(self.note_templates.read().await.get(&id).cloned())
    }

    async fn list_note_templates_by_creator(&self, creator_id: i64) -> Result<Vec<NoteTemplate>> {
        let templates = self.note_templates.read().await;
        let mut found: Vec<NoteTemplate> = templates
            .values()
            .filter(|t| t.is_created_by(creator_id))
            .cloned()
            .collect();
        found.sort_by_cached_key(|t| (t.title.to_lowercase(), t.id));
        Ok(found)
    }

    async fn create_note_template(&self, template: NewNoteTemplate) -> Result<NoteTemplate> {
        let mut templates = self.note_templates.write().await;
        let duplicate = templates
            .values()
            .any(|t| t.creator_id == template.creator_id && t.title == template.title);
        if duplicate {
            return Err(already_exists("NoteTemplate", &template.title));
        }
        let first_attachment_id = self
            .ids
            .template_attachments
            .reserve(template.attachments.len());
        let template =
            template.into_template(self.ids.note_templates.next(), Utc::now(), first_attachment_id);
        templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn delete_note_template(&self, id: i64) -> Result<()> {
        self.note_templates
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("NoteTemplate", id))
    }

    async fn get_template_attachments(&self, ids: &[i64]) -> Result<Vec<NoteTemplateAttachment>> {
        let templates = self.note_templates.read().await;
        let attachments: HashMap<i64, &NoteTemplateAttachment> = templates
            .values()
            .flat_map(|t| t.attachments.iter())
            .map(|a| (a.id, a))
            .collect();
        Ok(ids
            .iter()
            .filter_map(|id| attachments.get(id).map(|a| (*a).clone()))
            .collect())
    }
}

fn label_taken(topics: &BTreeMap<i64, Topic>, label: &str, except: Option<i64>) -> bool {
    topics
        .values()
        .any(|t| Some(t.id) != except && t.topic.eq_ignore_ascii_case(label))
}

#[async_trait]
impl TopicRepository for InMemoryRepository {
    async fn list_topics(&self, include_deleted: bool) -> Result<Vec<Topic>> {
        let topics = self.topics.read().await;
        let mut found: Vec<Topic> = topics
            .values()
            .filter(|t| include_deleted || !t.is_deleted())
            .cloned()
            .collect();
        sort_topics(&mut found);
        Ok(found)
    }

    async fn get_topic(&self, id: i64) -> Result<Option<Topic>> {
        Ok(self.topics.read().await.get(&id).cloned())
    }

    async fn create_topic(&self, topic: NewTopic) -> Result<Topic> {
        let mut topics = self.topics.write().await;
        if label_taken(&topics, &topic.topic, None) {
            return Err(already_exists("Topic", &topic.topic));
        }
        let topic = topic.into_topic(self.ids.topics.next(), Utc::now());
        topics.insert(topic.id, topic.clone());
        Ok(topic)
    }

    async fn update_topic(&self, id: i64, topic: NewTopic) -> Result<Topic> {
        let mut topics = self.topics.write().await;
        if label_taken(&topics, &topic.topic, Some(id)) {
            return Err(already_exists("Topic", &topic.topic));
        }
        let existing = topics.get_mut(&id).ok_or_else(|| not_found("Topic", id))?;
        existing.topic = topic.topic;
        existing.available_in_notes = topic.available_in_notes;
        existing.available_in_appointments = topic.available_in_appointments;
        Ok(existing.clone())
    }

    async fn delete_topic(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let mut topics = self.topics.write().await;
        let topic = topics.get_mut(&id).ok_or_else(|| not_found("Topic", id))?;
        topic.deleted_at = Some(at);
        Ok(())
    }

    async fn undelete_topic(&self, id: i64) -> Result<Topic> {
        let mut topics = self.topics.write().await;
        let topic = topics.get_mut(&id).ok_or_else(|| not_found("Topic", id))?;
        topic.deleted_at = None;
        Ok(topic.clone())
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryRepository {
    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        let appointment = appointment.into_appointment(self.ids.appointments.next(), Utc::now());
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn list_appointments(&self, include_deleted: bool) -> Result<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(appointments
            .values()
            .filter(|a| include_deleted || a.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn appointment_topic_counts(&self) -> Result<HashMap<i64, usize>> {
        let appointments = self.appointments.read().await;
        let mut counts = HashMap::new();
        for appointment in appointments.values().filter(|a| a.deleted_at.is_none()) {
            let topic_ids: HashSet<i64> = appointment.topic_ids.iter().copied().collect();
            for topic_id in topic_ids {
                *counts.entry(topic_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
