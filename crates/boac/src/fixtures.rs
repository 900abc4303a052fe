//! Development and test data.
//!
//! Seeds users, team groups, student athletes, cohorts, a curated group,
//! topics, appointments and a couple of notes. Loading is skipped when the
//! store already holds the fixture users.

use anyhow::Context;
use boac_core::appointment::NewAppointment;
use boac_core::cohort::{FilterCriteria, NewCohort};
use boac_core::curated::NewCuratedGroup;
use boac_core::note::{ContactType, NewNote, NoteAuthor, NoteDraft};
use boac_core::student::{CoeProfile, Student, TeamGroup};
use boac_core::topic::{NewTopic, OTHER_TOPIC};
use boac_core::user::{DeptMembership, DeptRole, NewUser, ASC_DEPT_CODE, CE3_DEPT_CODE, COE_DEPT_CODE};
use chrono::{NaiveDate, Utc};

use crate::state::AppState;

pub const ADMIN_UID: &str = "2040";
pub const ASC_AND_COE_ADVISOR_UID: &str = "1133399";
pub const ASC_ADVISOR_UID: &str = "1081940";
pub const ASC_DIRECTOR_UID: &str = "90412";
pub const ASC_ADVISOR_DIRECTOR_UID: &str = "6446";
pub const COE_DIRECTOR_UID: &str = "1022796";
pub const CE3_ADVISOR_UID: &str = "188242";
pub const COE_SCHEDULER_UID: &str = "6972201";
pub const NO_ADVISING_DATA_UID: &str = "1015674";
pub const DROP_IN_ADVISOR_UID: &str = "53791";

fn users() -> Vec<NewUser> {
    vec![
        NewUser::new(ADMIN_UID, "Oliver Heyer").admin(),
        NewUser::new(DROP_IN_ADVISOR_UID, "Peter Pan")
            .with_membership(DeptMembership::new("QCADV", DeptRole::Advisor).drop_in()),
        NewUser::new(ASC_AND_COE_ADVISOR_UID, "Sandeep Jayaprakash")
            .with_membership(DeptMembership::new(ASC_DEPT_CODE, DeptRole::Advisor))
            .with_membership(DeptMembership::new(COE_DEPT_CODE, DeptRole::Advisor)),
        NewUser::new(ASC_ADVISOR_UID, "Lynn Kaplan")
            .with_membership(DeptMembership::new(ASC_DEPT_CODE, DeptRole::Advisor)),
        NewUser::new(ASC_DIRECTOR_UID, "Rosa Delgado")
            .with_membership(DeptMembership::new(ASC_DEPT_CODE, DeptRole::Director)),
        NewUser::new(ASC_ADVISOR_DIRECTOR_UID, "Brigitte Lin")
            .with_title("Head Academic Advisor")
            .with_membership(DeptMembership::new(ASC_DEPT_CODE, DeptRole::Director)),
        NewUser::new(COE_DIRECTOR_UID, "Joni Mitchell")
            .with_membership(DeptMembership::new(COE_DEPT_CODE, DeptRole::Director)),
        NewUser::new(CE3_ADVISOR_UID, "Nico Alvarez")
            .with_dept_affiliation("Centers for Educational Equity and Excellence")
            .with_membership(DeptMembership::new(CE3_DEPT_CODE, DeptRole::Advisor)),
        NewUser::new(COE_SCHEDULER_UID, "Sam Scheduler")
            .with_membership(DeptMembership::new(COE_DEPT_CODE, DeptRole::Scheduler)),
        NewUser::new(NO_ADVISING_DATA_UID, "Terry Tam")
            .without_advising_data()
            .with_membership(DeptMembership::new("QCADV", DeptRole::Director).drop_in()),
    ]
}

fn team_groups() -> [TeamGroup; 6] {
    [
        TeamGroup::new("MFB-DB", "Football, Defensive Backs", "FBM", "Football"),
        TeamGroup::new("MFB-DL", "Football, Defensive Line", "FBM", "Football"),
        TeamGroup::new("WFH", "Women's Field Hockey", "FHW", "Women's Field Hockey"),
        TeamGroup::new("MBB", "Men's Baseball", "BAM", "Men's Baseball"),
        TeamGroup::new("MTE", "Men's Tennis", "TNM", "Men's Tennis"),
        TeamGroup::new("WTE", "Women's Tennis", "TNW", "Women's Tennis"),
    ]
}

struct StudentSeed {
    sid: &'static str,
    uid: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    groups: &'static [&'static str],
    gpa: Option<f64>,
    level: Option<&'static str>,
    units: f64,
    majors: &'static [&'static str],
    expected_grad_term: Option<&'static str>,
    in_intensive_cohort: bool,
}

const STUDENTS: &[StudentSeed] = &[
    StudentSeed {
        sid: "11667051",
        uid: "61889",
        first_name: "Deborah",
        last_name: "Davies",
        groups: &["WFH", "WTE"],
        gpa: None,
        level: None,
        units: 0.0,
        majors: &["History BA"],
        expected_grad_term: Some("2198"),
        in_intensive_cohort: true,
    },
    StudentSeed {
        sid: "8901234567",
        uid: "123456",
        first_name: "John David",
        last_name: "Crossman",
        groups: &[],
        gpa: Some(1.85),
        level: Some("Freshman"),
        units: 12.0,
        majors: &["Economics BA"],
        expected_grad_term: Some("2222"),
        in_intensive_cohort: true,
    },
    StudentSeed {
        sid: "2345678901",
        uid: "98765",
        first_name: "Dave",
        last_name: "Doolittle",
        groups: &["MFB-DB", "MFB-DL"],
        gpa: Some(3.495),
        level: Some("Junior"),
        units: 34.0,
        majors: &["Chemistry BS"],
        expected_grad_term: Some("2208"),
        in_intensive_cohort: false,
    },
    StudentSeed {
        sid: "3456789012",
        uid: "242881",
        first_name: "Paul",
        last_name: "Kerschen",
        groups: &["MFB-DL"],
        gpa: Some(3.005),
        level: Some("Junior"),
        units: 70.0,
        majors: &["English BA", "Political Economy BA"],
        expected_grad_term: Some("2208"),
        in_intensive_cohort: true,
    },
    StudentSeed {
        sid: "5678901234",
        uid: "9933311",
        first_name: "Sandeep",
        last_name: "Jayaprakash",
        groups: &["MFB-DB", "MFB-DL", "MTE"],
        gpa: Some(3.501),
        level: Some("Senior"),
        units: 102.0,
        majors: &["Letters & Sci Undeclared UG"],
        expected_grad_term: Some("2198"),
        in_intensive_cohort: false,
    },
    StudentSeed {
        sid: "7890123456",
        uid: "1049291",
        first_name: "Paul",
        last_name: "Farestveit",
        groups: &["MBB"],
        gpa: Some(3.9),
        level: Some("Senior"),
        units: 110.0,
        majors: &["History BA"],
        expected_grad_term: Some("2202"),
        in_intensive_cohort: true,
    },
    StudentSeed {
        sid: "890127492",
        uid: "211159",
        first_name: "Siegfried",
        last_name: "Schlemiel",
        groups: &["MFB-DB", "MFB-DL", "MTE", "WFH", "WTE"],
        gpa: Some(0.4),
        level: Some("Sophomore"),
        units: 8.0,
        majors: &["Mathematics"],
        expected_grad_term: None,
        in_intensive_cohort: true,
    },
    StudentSeed {
        sid: "9000000000",
        uid: "300847",
        first_name: "Wolfgang",
        last_name: "Pauli-O'Rourke",
        groups: &[],
        gpa: Some(2.9),
        level: Some("Graduate"),
        units: 140.0,
        majors: &["Engineering Physics BS"],
        expected_grad_term: Some("2218"),
        in_intensive_cohort: false,
    },
];

fn students(groups: &[TeamGroup]) -> Vec<Student> {
    let mut students: Vec<Student> = STUDENTS
        .iter()
        .map(|seed| {
            let mut student = Student::new(seed.sid, seed.uid, seed.first_name, seed.last_name);
            student.gpa = seed.gpa;
            student.level = seed.level.map(str::to_string);
            student.units = seed.units;
            student.majors = seed.majors.iter().map(|m| m.to_string()).collect();
            student.expected_grad_term = seed.expected_grad_term.map(str::to_string);
            student.in_intensive_cohort = seed.in_intensive_cohort;
            student.athletics = groups
                .iter()
                .filter(|g| seed.groups.contains(&g.group_code.as_str()))
                .cloned()
                .collect();
            student
        })
        .collect();

    for student in &mut students {
        match student.sid.as_str() {
            "2345678901" => student.transfer = true,
            "890127492" => {
                student.is_active_asc = false;
                student.status_asc = Some("Trouble".to_string());
            }
            "8901234567" => {
                student.coe = Some(CoeProfile {
                    advisor_uid: ASC_AND_COE_ADVISOR_UID.to_string(),
                    probation: false,
                    gender: Some("M".to_string()),
                    ethnicity: Some("H".to_string()),
                    underrepresented: true,
                });
            }
            "5678901234" => {
                student.coe = Some(CoeProfile {
                    advisor_uid: ASC_AND_COE_ADVISOR_UID.to_string(),
                    probation: false,
                    gender: Some("M".to_string()),
                    ethnicity: Some("B".to_string()),
                    underrepresented: false,
                });
            }
            "9000000000" => {
                student.coe = Some(CoeProfile {
                    advisor_uid: COE_DIRECTOR_UID.to_string(),
                    probation: true,
                    gender: Some("F".to_string()),
                    ethnicity: Some("X".to_string()),
                    underrepresented: false,
                });
            }
            _ => {}
        }
    }
    students
}

fn group_codes(codes: &[&str]) -> Option<Vec<String>> {
    Some(codes.iter().map(|c| c.to_string()).collect())
}

fn cohorts() -> Vec<NewCohort> {
    let cohort = |uid: &str, name: &str, criteria: FilterCriteria| NewCohort {
        name: name.to_string(),
        owner_uid: uid.to_string(),
        criteria,
    };
    vec![
        cohort(
            ADMIN_UID,
            "All sports",
            FilterCriteria {
                group_codes: group_codes(&["MFB-DL", "WFH"]),
                ..FilterCriteria::default()
            },
        ),
        cohort(
            ADMIN_UID,
            "Football, Defense",
            FilterCriteria {
                group_codes: group_codes(&["MFB-DB", "MFB-DL"]),
                ..FilterCriteria::default()
            },
        ),
        cohort(
            ADMIN_UID,
            "Field Hockey",
            FilterCriteria {
                group_codes: group_codes(&["WFH"]),
                ..FilterCriteria::default()
            },
        ),
        cohort(
            ASC_AND_COE_ADVISOR_UID,
            "Defense Backs, Inactive",
            FilterCriteria {
                group_codes: group_codes(&["MFB-DB"]),
                is_inactive_asc: Some(true),
                ..FilterCriteria::default()
            },
        ),
        cohort(
            ASC_AND_COE_ADVISOR_UID,
            "Defense Backs, Active",
            FilterCriteria {
                group_codes: group_codes(&["MFB-DB"]),
                is_inactive_asc: Some(false),
                ..FilterCriteria::default()
            },
        ),
        cohort(
            ASC_AND_COE_ADVISOR_UID,
            "Defense Backs, All",
            FilterCriteria {
                group_codes: group_codes(&["MFB-DB"]),
                ..FilterCriteria::default()
            },
        ),
        cohort(
            ASC_AND_COE_ADVISOR_UID,
            "Undeclared students",
            FilterCriteria {
                majors: Some(vec!["Undeclared".to_string()]),
                is_inactive_asc: Some(false),
                ..FilterCriteria::default()
            },
        ),
        cohort(
            ASC_AND_COE_ADVISOR_UID,
            "All sports",
            FilterCriteria {
                group_codes: group_codes(&["MFB-DL", "WFH"]),
                is_inactive_asc: Some(false),
                ..FilterCriteria::default()
            },
        ),
    ]
}

/// `(label, available_in_notes, available_in_appointments, deleted)`
const TOPICS: &[(&str, bool, bool, bool)] = &[
    ("Academic Progress", true, true, false),
    ("Career Planning", true, false, false),
    ("Housing", true, true, false),
    ("Study Skills", true, true, false),
    ("Good Show", true, false, true),
    ("Probation", false, true, true),
    (OTHER_TOPIC, true, true, false),
];

fn draft(subject: &str, body: &str, topics: &[&str]) -> NoteDraft {
    NoteDraft {
        subject: subject.to_string(),
        body: body.to_string(),
        topics: topics.iter().map(|t| t.to_string()).collect(),
        contact_type: None,
        set_date: None,
        is_private: false,
    }
}

/// Loads the fixture data into an empty store.
pub async fn load(state: &AppState) -> anyhow::Result<()> {
    if state.users.get_user_by_uid(ADMIN_UID).await?.is_some() {
        tracing::info!("Fixtures already loaded");
        return Ok(());
    }

    for user in users() {
        state.users.create_user(user).await?;
    }

    let groups = team_groups();
    for group in &groups {
        state.students.create_team_group(group).await?;
    }
    let students = students(&groups);
    for student in &students {
        state.students.create_student(student).await?;
    }

    for cohort in cohorts() {
        state.cohorts.create_cohort(cohort).await?;
    }

    let owner = state
        .users
        .get_user_by_uid(ASC_ADVISOR_DIRECTOR_UID)
        .await?
        .context("Curated group owner missing")?;
    state
        .curated_groups
        .create_curated_group(NewCuratedGroup::new(
            owner.id,
            "Cool Kids",
            ["3456789012", "5678901234", "11667051", "7890123456"]
                .map(String::from)
                .to_vec(),
        ))
        .await?;

    let now = Utc::now();
    let mut topic_ids = Vec::with_capacity(TOPICS.len());
    for &(label, in_notes, in_appointments, deleted) in TOPICS {
        let topic = state
            .topics
            .create_topic(NewTopic::new(label, in_notes, in_appointments)?)
            .await?;
        if deleted {
            state.topics.delete_topic(topic.id, now).await?;
        }
        topic_ids.push(topic.id);
    }

    for (sid, dept_code, details, topics) in [
        ("11667051", "QCADV", "Drop-in to discuss study habits", vec![topic_ids[0], topic_ids[3]]),
        ("5678901234", COE_DEPT_CODE, "Housing question", vec![topic_ids[2]]),
        ("2345678901", COE_DEPT_CODE, "Probation check-in", vec![topic_ids[5], topic_ids[0]]),
    ] {
        state
            .appointments
            .create_appointment(NewAppointment::new(sid, dept_code, details, topics))
            .await?;
    }

    let advisor = state
        .users
        .get_user_by_uid(ASC_AND_COE_ADVISOR_UID)
        .await?
        .context("Note author missing")?;
    let mut first = draft(
        "Midterm check-in",
        "Reviewed progress; see https://berkeley.edu/tutoring for tutoring hours.",
        &["Academic Progress", "Study Skills"],
    );
    first.contact_type = Some(ContactType::InPersonScheduled);
    first.set_date = NaiveDate::from_ymd_opt(2019, 10, 14);
    state
        .notes
        .create_note(NewNote {
            sid: "11667051".to_string(),
            author: NoteAuthor::of(&advisor),
            draft: first,
            attachments: Vec::new(),
        })
        .await?;

    let ce3_advisor = state
        .users
        .get_user_by_uid(CE3_ADVISOR_UID)
        .await?
        .context("Private note author missing")?;
    let mut private = draft(
        "Confidential follow-up",
        "Discussed financial circumstances.",
        &["housing"],
    );
    private.is_private = true;
    state
        .notes
        .create_note(NewNote {
            sid: "11667051".to_string(),
            author: NoteAuthor::of(&ce3_advisor),
            draft: private,
            attachments: Vec::new(),
        })
        .await?;

    tracing::info!(
        students = students.len(),
        topics = topic_ids.len(),
        "Fixtures loaded"
    );
    Ok(())
}
