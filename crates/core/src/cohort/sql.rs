//! Translates a [`StudentQuery`] into parameterized SQL.
//!
//! Expected tables: `students s`, `student_majors (sid, major)`,
//! `student_athletes (sid, group_code)` and `team_groups`. Statements use
//! anonymous `?` placeholders bound in order from [`SqlQuery::params`].

use super::criteria::{non_empty, DECLARED_MAJOR, UNDECLARED_MAJOR};
use super::query::{first_letter, OrderBy, PopulationScope, StudentQuery};
use super::NumericRange;

const IS_ATHLETE: &str = "EXISTS (SELECT 1 FROM student_athletes sa WHERE sa.sid = s.sid)";
const FIRST_MAJOR: &str = "(SELECT min(lower(m.major)) FROM student_majors m WHERE m.sid = s.sid)";
const FIRST_GROUP_NAME: &str = "(SELECT min(lower(tg.group_name)) FROM student_athletes sa \
     JOIN team_groups tg ON tg.group_code = sa.group_code WHERE sa.sid = s.sid)";
const NAME_TIEBREAK: &str = "lower(s.last_name), lower(s.first_name), s.sid";

/// A bound SQL parameter, independent of any driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Default)]
struct WhereClause {
    conditions: Vec<String>,
    params: Vec<SqlValue>,
}

impl WhereClause {
    fn push(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    fn push_in(&mut self, column: &str, values: &[String]) {
        let placeholders = self.bind_all(values);
        self.push(format!("{column} IN ({placeholders})"));
    }

    fn push_flag(&mut self, condition: &str, flag: bool) {
        self.params.push(SqlValue::Integer(i64::from(flag)));
        self.push(condition);
    }

    fn bind_all(&mut self, values: &[String]) -> String {
        self.params
            .extend(values.iter().cloned().map(SqlValue::Text));
        vec!["?"; values.len()].join(", ")
    }

    fn range(&mut self, column: &str, range: &NumericRange) -> String {
        let mut parts = Vec::new();
        if let Some(lo) = range.lower {
            let op = if range.lower_inclusive { ">=" } else { ">" };
            parts.push(format!("{column} {op} ?"));
            self.params.push(SqlValue::Real(lo));
        }
        if let Some(hi) = range.upper {
            let op = if range.upper_inclusive { "<=" } else { "<" };
            parts.push(format!("{column} {op} ?"));
            self.params.push(SqlValue::Real(hi));
        }
        if parts.is_empty() {
            format!("{column} IS NOT NULL")
        } else {
            format!("({})", parts.join(" AND "))
        }
    }

    fn push_ranges(&mut self, column: &str, ranges: &[NumericRange]) {
        let alternatives: Vec<String> = ranges.iter().map(|r| self.range(column, r)).collect();
        self.push(format!("({})", alternatives.join(" OR ")));
    }

    fn render(&self) -> String {
        if self.conditions.is_empty() {
            "1 = 1".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }
}

fn where_clause(query: &StudentQuery) -> WhereClause {
    let c = &query.criteria;
    let mut w = WhereClause::default();

    if let PopulationScope::Restricted { athletes, coe } = query.scope {
        let mut parts = Vec::new();
        if athletes {
            parts.push(IS_ATHLETE.to_string());
        }
        if coe {
            parts.push("s.coe_advisor_uid IS NOT NULL".to_string());
        }
        if parts.is_empty() {
            w.push("0 = 1");
        } else {
            w.push(format!("({})", parts.join(" OR ")));
        }
    }
    if let Some(sids) = &query.sids {
        if sids.is_empty() {
            w.push("0 = 1");
        } else {
            w.push_in("s.sid", sids);
        }
    }
    if query.exclude_inactive_athletes {
        w.push(format!("(NOT {IS_ATHLETE} OR s.is_active_asc = 1)"));
    }
    if let Some(codes) = c.group_codes.as_deref().filter(|v| !v.is_empty()) {
        let placeholders = w.bind_all(codes);
        w.push(format!(
            "EXISTS (SELECT 1 FROM student_athletes sa WHERE sa.sid = s.sid \
             AND sa.group_code IN ({placeholders}))"
        ));
    }
    if let Some(ranges) = c.gpa_ranges.as_deref().filter(|v| !v.is_empty()) {
        w.push_ranges("s.gpa", ranges);
    }
    if let Some(ranges) = c.unit_ranges.as_deref().filter(|v| !v.is_empty()) {
        w.push_ranges("s.units", ranges);
    }
    if let Some(levels) = c.levels.as_deref().filter(|v| !v.is_empty()) {
        w.push_in("s.level", levels);
    }
    if let Some(majors) = c.majors.as_deref().filter(|v| !v.is_empty()) {
        let mut alternatives = Vec::new();
        let mut exact = Vec::new();
        for major in majors {
            match major.as_str() {
                DECLARED_MAJOR => alternatives.push(
                    "EXISTS (SELECT 1 FROM student_majors m WHERE m.sid = s.sid \
                     AND lower(m.major) NOT LIKE '%undeclared%')"
                        .to_string(),
                ),
                UNDECLARED_MAJOR => alternatives.push(
                    "EXISTS (SELECT 1 FROM student_majors m WHERE m.sid = s.sid \
                     AND lower(m.major) LIKE '%undeclared%')"
                        .to_string(),
                ),
                _ => exact.push(major.clone()),
            }
        }
        if !exact.is_empty() {
            let placeholders = w.bind_all(&exact);
            alternatives.push(format!(
                "EXISTS (SELECT 1 FROM student_majors m WHERE m.sid = s.sid \
                 AND m.major IN ({placeholders}))"
            ));
        }
        w.push(format!("({})", alternatives.join(" OR ")));
    }
    if let Some(range) = &c.last_name_range {
        let bounds: Vec<String> = range
            .iter()
            .take(2)
            .map(|b| first_letter(b).map(String::from).unwrap_or_default())
            .collect();
        w.params.extend(bounds.into_iter().map(SqlValue::Text));
        w.push("upper(substr(trim(s.last_name), 1, 1)) BETWEEN ? AND ?");
    }
    if let Some(terms) = c.expected_grad_terms.as_deref().filter(|v| !v.is_empty()) {
        w.push_in("s.expected_grad_term", terms);
    }
    if let Some(flag) = c.transfer {
        w.push_flag("s.transfer = ?", flag);
    }
    if let Some(genders) = c.genders.as_deref().filter(|v| !v.is_empty()) {
        w.push_in("s.coe_gender", genders);
    }
    if let Some(ethnicities) = c.ethnicities.as_deref().filter(|v| !v.is_empty()) {
        w.push_in("s.coe_ethnicity", ethnicities);
    }
    if let Some(flag) = c.underrepresented {
        w.push_flag("s.coe_underrepresented = ?", flag);
    }
    if non_empty(&c.advisor_ldap_uids) {
        w.push_in(
            "s.coe_advisor_uid",
            c.advisor_ldap_uids.as_deref().unwrap_or_default(),
        );
    }
    if let Some(flag) = c.coe_probation {
        w.push_flag("s.coe_probation = ?", flag);
    }
    if let Some(flag) = c.in_intensive_cohort {
        w.push_flag(&format!("{IS_ATHLETE} AND s.in_intensive_cohort = ?"), flag);
    }
    if let Some(inactive) = c.is_inactive_asc {
        w.push_flag(&format!("{IS_ATHLETE} AND s.is_active_asc = ?"), !inactive);
    }
    w
}

fn order_clause(order_by: OrderBy) -> String {
    match order_by {
        OrderBy::FirstName => "lower(s.first_name), lower(s.last_name), s.sid".to_string(),
        OrderBy::LastName => NAME_TIEBREAK.to_string(),
        OrderBy::Gpa => format!("s.gpa IS NULL, s.gpa, {NAME_TIEBREAK}"),
        OrderBy::Level => format!(
            "CASE s.level WHEN 'Freshman' THEN 1 WHEN 'Sophomore' THEN 2 \
             WHEN 'Junior' THEN 3 WHEN 'Senior' THEN 4 WHEN 'Graduate' THEN 5 \
             ELSE 9 END, {NAME_TIEBREAK}"
        ),
        OrderBy::Major => format!("{FIRST_MAJOR} IS NULL, {FIRST_MAJOR}, {NAME_TIEBREAK}"),
        OrderBy::Units => format!("s.units, {NAME_TIEBREAK}"),
        OrderBy::GroupName => {
            format!("{FIRST_GROUP_NAME} IS NULL, {FIRST_GROUP_NAME}, {NAME_TIEBREAK}")
        }
    }
}

/// `SELECT COUNT(*)` over the matching students.
pub fn count_query(query: &StudentQuery) -> SqlQuery {
    let w = where_clause(query);
    SqlQuery {
        sql: format!("SELECT COUNT(*) FROM students s WHERE {}", w.render()),
        params: w.params,
    }
}

/// Ordered, paginated SIDs of the matching students.
pub fn page_query(query: &StudentQuery) -> SqlQuery {
    let mut w = where_clause(query);
    let sql = format!(
        "SELECT s.sid FROM students s WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
        w.render(),
        order_clause(query.order_by)
    );
    let limit = query
        .limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1);
    w.params.push(SqlValue::Integer(limit));
    w.params
        .push(SqlValue::Integer(i64::try_from(query.offset).unwrap_or(i64::MAX)));
    SqlQuery { sql, params: w.params }
}
