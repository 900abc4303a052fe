//! Student query: population scope, criteria, ordering and pagination.
//!
//! [`StudentQuery::apply`] evaluates a query over in-memory students. The
//! SQLite backend runs the same query through [`super::sql`]; both must agree
//! on matching and ordering.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use crate::student::{level_rank, Student};
use crate::user::{AuthorizedUser, ASC_DEPT_CODE, COE_DEPT_CODE};

use super::criteria::{non_empty, DECLARED_MAJOR, UNDECLARED_MAJOR};
use super::{CriteriaError, FilterCriteria};

/// Default page size for student listings.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    FirstName,
    #[default]
    LastName,
    Gpa,
    Level,
    Major,
    Units,
    GroupName,
}

impl FromStr for OrderBy {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_name" | "firstName" => Ok(OrderBy::FirstName),
            "last_name" | "lastName" => Ok(OrderBy::LastName),
            "gpa" | "cumulativeGPA" => Ok(OrderBy::Gpa),
            "level" => Ok(OrderBy::Level),
            "major" => Ok(OrderBy::Major),
            "units" | "cumulativeUnits" => Ok(OrderBy::Units),
            "group_name" | "groupName" => Ok(OrderBy::GroupName),
            other => Err(CriteriaError::InvalidOrderBy(other.to_string())),
        }
    }
}

/// The part of the student population a cohort owner can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationScope {
    Everyone,
    Restricted { athletes: bool, coe: bool },
}

impl PopulationScope {
    /// Admins see everyone. ASC membership contributes athletes, COE
    /// membership contributes COE students, any other department opens the
    /// whole population.
    pub fn for_owner(owner: &AuthorizedUser) -> Self {
        if owner.is_admin {
            return PopulationScope::Everyone;
        }
        let mut athletes = false;
        let mut coe = false;
        for membership in &owner.departments {
            if membership.dept_code.eq_ignore_ascii_case(ASC_DEPT_CODE) {
                athletes = true;
            } else if membership.dept_code.eq_ignore_ascii_case(COE_DEPT_CODE) {
                coe = true;
            } else {
                return PopulationScope::Everyone;
            }
        }
        PopulationScope::Restricted { athletes, coe }
    }

    pub fn includes(&self, student: &Student) -> bool {
        match self {
            PopulationScope::Everyone => true,
            PopulationScope::Restricted { athletes, coe } => {
                (*athletes && student.is_athlete()) || (*coe && student.coe.is_some())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentQuery {
    pub criteria: FilterCriteria,
    pub scope: PopulationScope,
    /// Hide athletes no longer active with ASC.
    pub exclude_inactive_athletes: bool,
    /// Restrict to an explicit SID list (curated groups).
    pub sids: Option<Vec<String>>,
    pub order_by: OrderBy,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl StudentQuery {
    /// A criteria query evaluated on behalf of `owner`.
    pub fn for_owner(criteria: FilterCriteria, owner: &AuthorizedUser) -> Self {
        let asc_only = !owner.is_admin && owner.is_member_of(ASC_DEPT_CODE);
        Self {
            exclude_inactive_athletes: asc_only && criteria.is_inactive_asc.is_none(),
            criteria,
            scope: PopulationScope::for_owner(owner),
            sids: None,
            order_by: OrderBy::default(),
            offset: 0,
            limit: None,
        }
    }

    /// An ordering/pagination query over a fixed set of students.
    pub fn for_sids(sids: Vec<String>) -> Self {
        Self {
            criteria: FilterCriteria::default(),
            scope: PopulationScope::Everyone,
            exclude_inactive_athletes: false,
            sids: Some(sids),
            order_by: OrderBy::default(),
            offset: 0,
            limit: None,
        }
    }

    pub fn with_order(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_page(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn matches(&self, student: &Student) -> bool {
        let c = &self.criteria;

        if !self.scope.includes(student) {
            return false;
        }
        if let Some(sids) = &self.sids {
            if !sids.contains(&student.sid) {
                return false;
            }
        }
        if self.exclude_inactive_athletes && student.is_athlete() && !student.is_active_asc {
            return false;
        }
        if non_empty(&c.group_codes) {
            let codes = c.group_codes.as_deref().unwrap_or_default();
            if !student.athletics.iter().any(|g| codes.contains(&g.group_code)) {
                return false;
            }
        }
        if non_empty(&c.gpa_ranges) {
            let in_range = student.gpa.is_some_and(|gpa| {
                c.gpa_ranges
                    .iter()
                    .flatten()
                    .any(|range| range.contains(gpa))
            });
            if !in_range {
                return false;
            }
        }
        if non_empty(&c.unit_ranges)
            && !c
                .unit_ranges
                .iter()
                .flatten()
                .any(|range| range.contains(student.units))
        {
            return false;
        }
        if non_empty(&c.levels) && !contains_opt(&c.levels, student.level.as_deref()) {
            return false;
        }
        if non_empty(&c.majors) && !matches_majors(c.majors.as_deref().unwrap_or_default(), student)
        {
            return false;
        }
        if let Some(range) = &c.last_name_range {
            if !in_last_name_range(range, &student.last_name) {
                return false;
            }
        }
        if non_empty(&c.expected_grad_terms)
            && !contains_opt(&c.expected_grad_terms, student.expected_grad_term.as_deref())
        {
            return false;
        }
        if c.transfer.is_some_and(|t| t != student.transfer) {
            return false;
        }

        let coe = student.coe.as_ref();
        if non_empty(&c.genders)
            && !contains_opt(&c.genders, coe.and_then(|p| p.gender.as_deref()))
        {
            return false;
        }
        if non_empty(&c.ethnicities)
            && !contains_opt(&c.ethnicities, coe.and_then(|p| p.ethnicity.as_deref()))
        {
            return false;
        }
        if let Some(flag) = c.underrepresented {
            if coe.map(|p| p.underrepresented) != Some(flag) {
                return false;
            }
        }
        if non_empty(&c.advisor_ldap_uids)
            && !contains_opt(&c.advisor_ldap_uids, coe.map(|p| p.advisor_uid.as_str()))
        {
            return false;
        }
        if let Some(flag) = c.coe_probation {
            if coe.map(|p| p.probation) != Some(flag) {
                return false;
            }
        }

        if let Some(flag) = c.in_intensive_cohort {
            if !student.is_athlete() || student.in_intensive_cohort != flag {
                return false;
            }
        }
        if let Some(inactive) = c.is_inactive_asc {
            if !student.is_athlete() || student.is_active_asc == inactive {
                return false;
            }
        }
        true
    }

    /// Orders two students by the requested key, then by name and SID.
    /// Missing sort values come last.
    pub fn compare(&self, a: &Student, b: &Student) -> Ordering {
        let primary = match self.order_by {
            OrderBy::FirstName => a
                .first_name
                .to_ascii_lowercase()
                .cmp(&b.first_name.to_ascii_lowercase()),
            OrderBy::LastName => Ordering::Equal,
            OrderBy::Gpa => nulls_last(a.gpa, b.gpa, |x, y| x.total_cmp(y)),
            OrderBy::Level => level_rank(a.level.as_deref()).cmp(&level_rank(b.level.as_deref())),
            OrderBy::Major => nulls_last(a.first_major(), b.first_major(), |x, y| x.cmp(y)),
            OrderBy::Units => a.units.total_cmp(&b.units),
            OrderBy::GroupName => {
                nulls_last(a.first_group_name(), b.first_group_name(), |x, y| x.cmp(y))
            }
        };
        primary
            .then_with(|| a.last_name.to_ascii_lowercase().cmp(&b.last_name.to_ascii_lowercase()))
            .then_with(|| a.first_name.to_ascii_lowercase().cmp(&b.first_name.to_ascii_lowercase()))
            .then_with(|| a.sid.cmp(&b.sid))
    }

    /// Filters, orders and paginates `students`.
    pub fn apply(&self, students: impl IntoIterator<Item = Student>) -> StudentPage {
        let mut matching: Vec<Student> = students
            .into_iter()
            .filter(|s| self.matches(s))
            .collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let total_student_count = matching.len();
        let students = matching
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();

        StudentPage {
            total_student_count,
            students,
        }
    }
}

/// One page of a student query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentPage {
    pub total_student_count: usize,
    pub students: Vec<Student>,
}

fn contains_opt(values: &Option<Vec<String>>, value: Option<&str>) -> bool {
    match (values, value) {
        (Some(values), Some(value)) => values.iter().any(|v| v == value),
        _ => false,
    }
}

fn matches_majors(wanted: &[String], student: &Student) -> bool {
    wanted.iter().any(|major| match major.as_str() {
        DECLARED_MAJOR => student
            .majors
            .iter()
            .any(|m| !m.to_ascii_lowercase().contains("undeclared")),
        UNDECLARED_MAJOR => student
            .majors
            .iter()
            .any(|m| m.to_ascii_lowercase().contains("undeclared")),
        exact => student.majors.iter().any(|m| m == exact),
    })
}

/// Compares the first letter of the last name against the range bounds.
fn in_last_name_range(range: &[String], last_name: &str) -> bool {
    let (Some(start), Some(end)) = (range.first(), range.get(1)) else {
        return false;
    };
    match (
        first_letter(last_name),
        first_letter(start),
        first_letter(end),
    ) {
        (Some(letter), Some(start), Some(end)) => start <= letter && letter <= end,
        _ => false,
    }
}

pub(crate) fn first_letter(s: &str) -> Option<char> {
    s.trim().chars().next().map(|c| c.to_ascii_uppercase())
}

fn nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::cohort::{FilterEntry, NumericRange};
    use crate::student::{CoeProfile, TeamGroup};
    use crate::user::{DeptMembership, DeptRole, NewUser};

    fn team(code: &str, name: &str) -> TeamGroup {
        TeamGroup::new(code, name, "FBM", "Football")
    }

    fn students() -> Vec<Student> {
        let mut doolittle = Student::new("2345678901", "98765", "Dave", "Doolittle");
        doolittle.gpa = Some(3.495);
        doolittle.level = Some("Junior".into());
        doolittle.units = 34.0;
        doolittle.majors = vec!["Chemistry BS".into()];
        doolittle.athletics = vec![
            team("MFB-DB", "Football, Defensive Backs"),
            team("MFB-DL", "Football, Defensive Line"),
        ];

        let mut kerschen = Student::new("3456789012", "242881", "Paul", "Kerschen");
        kerschen.gpa = Some(3.005);
        kerschen.level = Some("Junior".into());
        kerschen.units = 70.0;
        kerschen.majors = vec!["English BA".into(), "Political Economy BA".into()];
        kerschen.athletics = vec![team("MFB-DL", "Football, Defensive Line")];
        kerschen.in_intensive_cohort = true;

        let mut sandeep = Student::new("5678901234", "9933311", "Sandeep", "Jayaprakash");
        sandeep.gpa = Some(3.501);
        sandeep.level = Some("Senior".into());
        sandeep.units = 102.0;
        sandeep.majors = vec!["Letters & Sci Undeclared UG".into()];
        sandeep.athletics = vec![
            team("MFB-DB", "Football, Defensive Backs"),
            team("MFB-DL", "Football, Defensive Line"),
        ];

        let mut schlemiel = Student::new("890127492", "211159", "Siegfried", "Schlemiel");
        schlemiel.gpa = Some(0.4);
        schlemiel.level = Some("Sophomore".into());
        schlemiel.units = 8.0;
        schlemiel.majors = vec!["Mathematics".into()];
        schlemiel.athletics = vec![team("MFB-DL", "Football, Defensive Line")];
        schlemiel.is_active_asc = false;

        let mut pauli = Student::new("9000000000", "300847", "Wolfgang", "Pauli-O'Rourke");
        pauli.gpa = Some(2.2);
        pauli.level = Some("Sophomore".into());
        pauli.units = 45.0;
        pauli.majors = vec!["Physics BS".into()];
        pauli.coe = Some(CoeProfile {
            advisor_uid: "1133399".into(),
            probation: true,
            gender: Some("M".into()),
            ethnicity: None,
            underrepresented: false,
        });

        vec![doolittle, kerschen, sandeep, schlemiel, pauli]
    }

    fn admin() -> AuthorizedUser {
        NewUser::new("2040", "Admin").admin().into_user(1, Utc::now())
    }

    fn member_of(dept: &str) -> AuthorizedUser {
        NewUser::new("1081940", "Advisor")
            .with_membership(DeptMembership::new(dept, DeptRole::Advisor))
            .into_user(2, Utc::now())
    }

    fn sids(page: &StudentPage) -> Vec<&str> {
        page.students.iter().map(|s| s.sid.as_str()).collect()
    }

    fn criteria(filters: &[FilterEntry]) -> FilterCriteria {
        FilterCriteria::from_filters(filters).unwrap()
    }

    #[test]
    fn test_order_by_parse_accepts_camel_case() {
        assert_eq!("groupName".parse::<OrderBy>(), Ok(OrderBy::GroupName));
        assert_eq!("first_name".parse::<OrderBy>(), Ok(OrderBy::FirstName));
        assert!("shoe_size".parse::<OrderBy>().is_err());
    }

    #[test]
    fn test_scope_for_owner() {
        assert_eq!(PopulationScope::for_owner(&admin()), PopulationScope::Everyone);
        assert_eq!(
            PopulationScope::for_owner(&member_of("UWASC")),
            PopulationScope::Restricted {
                athletes: true,
                coe: false
            }
        );
        assert_eq!(
            PopulationScope::for_owner(&member_of("QCADV")),
            PopulationScope::Everyone
        );
    }

    #[test]
    fn test_asc_owner_defaults_to_active_athletes() {
        let filters = criteria(&[FilterEntry::array("groupCodes", "MFB-DL")]);

        let asc_page = StudentQuery::for_owner(filters.clone(), &member_of("UWASC"))
            .with_order(OrderBy::Gpa)
            .apply(students());
        assert_eq!(asc_page.total_student_count, 3);
        assert_eq!(asc_page.students[0].last_name, "Kerschen");

        let admin_page = StudentQuery::for_owner(filters, &admin())
            .with_order(OrderBy::Gpa)
            .apply(students());
        assert_eq!(admin_page.total_student_count, 4);
        assert_eq!(admin_page.students[0].last_name, "Schlemiel");
    }

    #[test]
    fn test_explicit_inactive_filter() {
        let filters = criteria(&[FilterEntry::boolean("isInactiveAsc", true)]);
        let page = StudentQuery::for_owner(filters, &member_of("UWASC")).apply(students());
        assert_eq!(sids(&page), vec!["890127492"]);
    }

    #[test]
    fn test_coe_scope_excludes_athletes() {
        let filters = criteria(&[FilterEntry::array("levels", "Sophomore")]);
        let page = StudentQuery::for_owner(filters, &member_of("COENG")).apply(students());
        assert_eq!(sids(&page), vec!["9000000000"]);
    }

    #[test]
    fn test_gpa_and_unit_ranges() {
        let filters = criteria(&[
            FilterEntry::array("gpaRanges", "numrange(3, 3.5, '[)')"),
            FilterEntry::array("gpaRanges", "numrange(0, 1, '[)')"),
        ]);
        let page = StudentQuery::for_owner(filters, &admin()).apply(students());
        assert_eq!(sids(&page), vec!["2345678901", "3456789012", "890127492"]);

        let units = FilterCriteria {
            unit_ranges: Some(vec![NumericRange::parse("numrange(60, NULL, '[)')").unwrap()]),
            ..Default::default()
        };
        let page = StudentQuery::for_owner(units, &admin()).apply(students());
        assert_eq!(sids(&page), vec!["5678901234", "3456789012"]);
    }

    #[test]
    fn test_undeclared_major_matches_substring() {
        let filters = criteria(&[FilterEntry::array("majors", "Undeclared")]);
        let page = StudentQuery::for_owner(filters, &admin()).apply(students());
        assert_eq!(sids(&page), vec!["5678901234"]);

        let declared = criteria(&[FilterEntry::array("majors", "Declared")]);
        let page = StudentQuery::for_owner(declared, &admin()).apply(students());
        assert_eq!(page.total_student_count, 4);
    }

    #[test]
    fn test_last_name_range() {
        let filters = criteria(&[FilterEntry::range("lastNameRange", "d", "k")]);
        let page = StudentQuery::for_owner(filters, &admin()).apply(students());
        assert_eq!(sids(&page), vec!["2345678901", "5678901234", "3456789012"]);
    }

    #[test]
    fn test_coe_probation_and_advisor() {
        let filters = criteria(&[
            FilterEntry::boolean("coeProbation", true),
            FilterEntry::array("advisorLdapUids", "1133399"),
        ]);
        let page = StudentQuery::for_owner(filters, &admin()).apply(students());
        assert_eq!(sids(&page), vec!["9000000000"]);
    }

    #[test]
    fn test_intensive_cohort_only_applies_to_athletes() {
        let filters = criteria(&[FilterEntry::boolean("inIntensiveCohort", false)]);
        let page = StudentQuery::for_owner(filters, &admin()).apply(students());
        assert_eq!(
            sids(&page),
            vec!["2345678901", "5678901234", "890127492"]
        );
    }

    #[test]
    fn test_order_by_major_and_group_name() {
        let filters = criteria(&[FilterEntry::array("groupCodes", "MFB-DL")]);
        let owner = member_of("UWASC");

        let by_major = StudentQuery::for_owner(filters.clone(), &owner)
            .with_order(OrderBy::Major)
            .apply(students());
        assert_eq!(by_major.students[0].majors[0], "Chemistry BS");

        let by_group = StudentQuery::for_owner(filters, &owner)
            .with_order(OrderBy::GroupName)
            .apply(students());
        assert_eq!(
            sids(&by_group),
            vec!["2345678901", "5678901234", "3456789012"]
        );
    }

    #[test]
    fn test_pagination_keeps_total() {
        let page = StudentQuery::for_owner(FilterCriteria::default(), &admin())
            .with_page(1, Some(2))
            .apply(students());
        assert_eq!(page.total_student_count, 5);
        assert_eq!(sids(&page), vec!["5678901234", "3456789012"]);
    }

    #[test]
    fn test_name_ordering_folds_ascii_case_only() {
        let query = StudentQuery::for_sids(Vec::new()).with_order(OrderBy::LastName);
        let lower = Student::new("1", "1", "Ana", "ébert");
        let upper = Student::new("2", "2", "Bo", "Émile");
        let plain = Student::new("3", "3", "Cy", "emile");

        assert_eq!(query.compare(&upper, &lower), Ordering::Less);
        assert_eq!(query.compare(&plain, &upper), Ordering::Less);
    }

    #[test]
    fn test_sids_query_orders_fixed_set() {
        let page = StudentQuery::for_sids(vec!["890127492".into(), "2345678901".into()])
            .with_order(OrderBy::Level)
            .apply(students());
        assert_eq!(sids(&page), vec!["890127492", "2345678901"]);
    }
}
