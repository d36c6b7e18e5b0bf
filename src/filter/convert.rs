//! FetchXML filter tree → SQL boolean expression.

use crate::model::{ConnectionType, StorageMode};
use crate::sql::ident::{qualified, quote_identifier, quote_string_single};

use super::ast::{
    Condition, ConditionOperator, DateUnit, FetchQuery, FilterGroup, FilterItem, LinkEntity,
    LinkType,
};
use super::datetime::TimeShift;
use super::parse::parse_fetch_xml;
use super::value::{format_like, format_value};

/// Sentinel the row source resolves to the signed-in user.
const CURRENT_USER: &str = "CURRENT_USER";

/// Environment facts that gate operator availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterEnvironment {
    /// Data comes from a replica with no session user.
    pub fabric_link: bool,
    /// Data is bulk-imported under a service identity.
    pub import_mode: bool,
}

impl FilterEnvironment {
    pub fn for_target(connection: ConnectionType, storage: StorageMode) -> Self {
        Self {
            fabric_link: !connection.has_user_context(),
            import_mode: storage == StorageMode::Import,
        }
    }

    fn user_context_unavailable(&self) -> Option<&'static str> {
        if self.fabric_link {
            Some("no current-user context on a Fabric Link source")
        } else if self.import_mode {
            Some("no current-user context in import mode")
        } else {
            None
        }
    }
}

/// Outcome of one conversion. Never an error: unconvertible pieces are
/// dropped and reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterConversion {
    pub sql_where_clause: String,
    pub is_fully_supported: bool,
    pub unsupported_features: Vec<String>,
    /// Ordered trace of the conversion for troubleshooting.
    pub debug_log: Vec<String>,
}

impl FilterConversion {
    pub fn has_clause(&self) -> bool {
        !self.sql_where_clause.is_empty()
    }
}

/// Translates saved-view filters into WHERE clauses.
#[derive(Debug, Clone, Default)]
pub struct FilterConverter {
    shift: TimeShift,
    environment: FilterEnvironment,
}

impl FilterConverter {
    pub fn new(utc_offset_hours: f64) -> Self {
        Self {
            shift: TimeShift::from_hours(utc_offset_hours),
            environment: FilterEnvironment::default(),
        }
    }

    pub fn with_environment(mut self, environment: FilterEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Parse and translate a FetchXML document. Unparsable input yields an
    /// empty, not-supported result.
    pub fn convert(&self, fetch_xml: &str, table_alias: &str) -> FilterConversion {
        match parse_fetch_xml(fetch_xml) {
            Ok(query) => self.convert_query(&query, table_alias),
            Err(err) => {
                tracing::warn!(error = %err, "unparsable filter XML");
                FilterConversion {
                    sql_where_clause: String::new(),
                    is_fully_supported: false,
                    unsupported_features: vec![format!("unparsable filter: {}", err)],
                    debug_log: vec![format!("parse failed: {}", err)],
                }
            }
        }
    }

    /// Translate an already-parsed filter tree.
    pub fn convert_query(&self, query: &FetchQuery, table_alias: &str) -> FilterConversion {
        let mut tx = Translation::new(self);
        tx.log(format!(
            "converting filter for entity '{}' as {}",
            query.entity, table_alias
        ));

        let mut clauses = Vec::new();
        for group in &query.filters {
            if let Some(clause) = tx.group(group, table_alias) {
                clauses.push(clause);
            }
        }
        for link in &query.links {
            if let Some(sql) = tx.link(link, table_alias) {
                clauses.push(Clause::atomic(sql));
            }
        }

        let sql = combine(clauses).unwrap_or_default();
        tx.log(format!("result: {}", if sql.is_empty() { "<empty>" } else { &sql }));
        tracing::debug!(
            entity = %query.entity,
            unsupported = tx.unsupported.len(),
            "filter converted"
        );

        FilterConversion {
            is_fully_supported: tx.unsupported.is_empty(),
            sql_where_clause: sql,
            unsupported_features: tx.unsupported,
            debug_log: tx.debug_log,
        }
    }
}

/// A translated fragment; `compound` marks a top-level AND/OR join that
/// needs parentheses when embedded.
struct Clause {
    sql: String,
    compound: bool,
}

impl Clause {
    fn atomic(sql: String) -> Self {
        Self {
            sql,
            compound: false,
        }
    }
}

/// AND together sibling clauses at the root or inside a join.
fn combine(clauses: Vec<Clause>) -> Option<String> {
    match clauses.len() {
        0 => None,
        1 => clauses.into_iter().next().map(|c| c.sql),
        _ => Some(
            clauses
                .into_iter()
                .map(|c| if c.compound { format!("({})", c.sql) } else { c.sql })
                .collect::<Vec<_>>()
                .join(" AND "),
        ),
    }
}

/// Per-conversion state: diagnostics and the generated-alias counter.
struct Translation<'c> {
    converter: &'c FilterConverter,
    unsupported: Vec<String>,
    debug_log: Vec<String>,
    next_alias: usize,
}

impl<'c> Translation<'c> {
    fn new(converter: &'c FilterConverter) -> Self {
        Self {
            converter,
            unsupported: Vec::new(),
            debug_log: Vec::new(),
            next_alias: 0,
        }
    }

    fn log(&mut self, line: String) {
        tracing::trace!("{}", line);
        self.debug_log.push(line);
    }

    fn unsupported(&mut self, feature: String) {
        self.log(format!("unsupported: {}", feature));
        self.unsupported.push(feature);
    }

    fn group(&mut self, group: &FilterGroup, alias: &str) -> Option<Clause> {
        let mut parts = Vec::new();
        for item in &group.items {
            let part = match item {
                FilterItem::Condition(condition) => self.condition(condition, alias),
                FilterItem::Group(nested) => self.group(nested, alias).map(|c| format!("({})", c.sql)),
                FilterItem::Link(link) => self.link(link, alias),
            };
            if let Some(part) = part {
                parts.push(part);
            }
        }
        match parts.len() {
            0 => None,
            1 => parts.pop().map(Clause::atomic),
            _ => Some(Clause {
                sql: parts.join(group.logic.sql_separator()),
                compound: true,
            }),
        }
    }

    fn link(&mut self, link: &LinkEntity, parent_alias: &str) -> Option<String> {
        match &link.link_type {
            LinkType::Outer => {
                self.log(format!(
                    "outer link-entity '{}' does not restrict rows; skipped",
                    link.name
                ));
                return None;
            }
            LinkType::Other(kind) => {
                self.unsupported(format!(
                    "link-entity '{}' with link-type '{}'",
                    link.name, kind
                ));
                return None;
            }
            LinkType::Inner | LinkType::Any | LinkType::NotAny => {}
        }
        if link.from.trim().is_empty() || link.to.trim().is_empty() {
            self.unsupported(format!("link-entity '{}' without from/to attributes", link.name));
            return None;
        }

        let alias = match &link.alias {
            Some(alias) => alias.clone(),
            None => {
                let generated = format!("le{}", self.next_alias);
                self.next_alias += 1;
                generated
            }
        };
        self.log(format!(
            "link-entity '{}' as {} joined on {}.{} = {}.{}",
            link.name, alias, alias, link.from, parent_alias, link.to
        ));

        let mut inner = Vec::new();
        for group in &link.filters {
            if let Some(clause) = self.group(group, &alias) {
                inner.push(clause);
            }
        }
        for nested in &link.links {
            if let Some(sql) = self.link(nested, &alias) {
                inner.push(Clause::atomic(sql));
            }
        }

        let mut subquery = format!(
            "SELECT 1 FROM {} AS {} WHERE {} = {}",
            quote_identifier(&link.name),
            quote_identifier(&alias),
            qualified(&alias, &link.from),
            qualified(parent_alias, &link.to)
        );
        if let Some(filter) = combine(inner) {
            subquery.push_str(" AND (");
            subquery.push_str(&filter);
            subquery.push(')');
        }
        let keyword = if link.link_type == LinkType::NotAny {
            "NOT EXISTS"
        } else {
            "EXISTS"
        };
        Some(format!("{} ({})", keyword, subquery))
    }

    fn condition(&mut self, condition: &Condition, alias: &str) -> Option<String> {
        use ConditionOperator as Op;

        if let Some(entity) = &condition.entity_name {
            self.unsupported(format!(
                "condition on attribute '{}' references join alias '{}'",
                condition.attribute, entity
            ));
            return None;
        }

        let col = qualified(alias, &condition.attribute);
        let shift = self.converter.shift;
        let sql = match &condition.operator {
            Op::Eq => self.compare(condition, &col, "="),
            Op::Ne => self.compare(condition, &col, "<>"),
            Op::Gt => self.compare(condition, &col, ">"),
            Op::Ge => self.compare(condition, &col, ">="),
            Op::Lt => self.compare(condition, &col, "<"),
            Op::Le => self.compare(condition, &col, "<="),
            Op::Null => Some(format!("{} IS NULL", col)),
            Op::NotNull => Some(format!("{} IS NOT NULL", col)),
            Op::Like => self
                .value(condition)
                .map(|v| format!("{} LIKE {}", col, quote_string_single(&v))),
            Op::NotLike => self
                .value(condition)
                .map(|v| format!("{} NOT LIKE {}", col, quote_string_single(&v))),
            Op::BeginsWith => self
                .value(condition)
                .map(|v| format!("{} LIKE {}", col, format_like(&v, "", "%"))),
            Op::NotBeginWith => self
                .value(condition)
                .map(|v| format!("{} NOT LIKE {}", col, format_like(&v, "", "%"))),
            Op::EndsWith => self
                .value(condition)
                .map(|v| format!("{} LIKE {}", col, format_like(&v, "%", ""))),
            Op::NotEndWith => self
                .value(condition)
                .map(|v| format!("{} NOT LIKE {}", col, format_like(&v, "%", ""))),
            Op::In => self.membership(condition, &col, "IN"),
            Op::NotIn => self.membership(condition, &col, "NOT IN"),
            Op::Between => self.between(condition, &col, "BETWEEN"),
            Op::NotBetween => self.between(condition, &col, "NOT BETWEEN"),
            Op::Today => Some(same_day(&shift, &col, 0)),
            Op::Yesterday => Some(same_day(&shift, &col, -1)),
            Op::Tomorrow => Some(same_day(&shift, &col, 1)),
            Op::ThisWeek => Some(same_week(&shift, &col, 0)),
            Op::LastWeek => Some(same_week(&shift, &col, -1)),
            Op::NextWeek => Some(same_week(&shift, &col, 1)),
            Op::ThisMonth => Some(same_month(&shift, &col, 0)),
            Op::LastMonth => Some(same_month(&shift, &col, -1)),
            Op::NextMonth => Some(same_month(&shift, &col, 1)),
            Op::ThisYear => Some(same_year(&shift, &col, 0)),
            Op::LastYear => Some(same_year(&shift, &col, -1)),
            Op::NextYear => Some(same_year(&shift, &col, 1)),
            Op::LastSevenDays => last_window(&shift, &col, DateUnit::Day, 7),
            Op::NextSevenDays => next_window(&shift, &col, DateUnit::Day, 7),
            Op::LastX(unit) => self.count(condition).and_then(|n| {
                let sql = last_window(&shift, &col, *unit, n);
                self.in_range(condition, sql)
            }),
            Op::NextX(unit) => self.count(condition).and_then(|n| {
                let sql = next_window(&shift, &col, *unit, n);
                self.in_range(condition, sql)
            }),
            Op::OlderThanX(unit) => self.count(condition).and_then(|n| {
                let sql = older_than(&shift, &col, *unit, n);
                self.in_range(condition, sql)
            }),
            Op::On => self.value(condition).map(|v| {
                format!(
                    "CAST({} AS DATE) = CAST({} AS DATE)",
                    shift.apply(&col),
                    format_value(&v)
                )
            }),
            Op::OnOrAfter => self
                .value(condition)
                .map(|v| format!("{} >= {}", shift.apply(&col), format_value(&v))),
            Op::OnOrBefore => self
                .value(condition)
                .map(|v| format!("{} <= {}", shift.apply(&col), format_value(&v))),
            Op::EqUserId => self.current_user(condition, &col, "="),
            Op::NeUserId => self.current_user(condition, &col, "<>"),
            Op::EqUserTeams => self.user_teams(condition, &col, "IN"),
            Op::NeUserTeams => self.user_teams(condition, &col, "NOT IN"),
            Op::Unrecognized(name) => {
                self.unsupported(format!(
                    "unsupported operator '{}' on attribute '{}'",
                    name, condition.attribute
                ));
                None
            }
        };

        if let Some(sql) = &sql {
            self.log(format!(
                "condition {} {} -> {}",
                condition.attribute, condition.operator, sql
            ));
        }
        sql
    }

    fn value(&mut self, condition: &Condition) -> Option<String> {
        match condition.scalar_value() {
            Some(v) => Some(v.to_string()),
            None => {
                self.unsupported(format!(
                    "operator '{}' on attribute '{}' has no value",
                    condition.operator, condition.attribute
                ));
                None
            }
        }
    }

    /// Period count of a relative-date operator, within the `int` range
    /// `DATEADD` accepts.
    fn count(&mut self, condition: &Condition) -> Option<i64> {
        let raw = self.value(condition)?;
        match raw.trim().parse::<i64>() {
            Ok(n) if (0..=i64::from(i32::MAX)).contains(&n) => Some(n),
            _ => {
                self.unsupported(format!(
                    "operator '{}' on attribute '{}' needs a count between 0 and {}, got '{}'",
                    condition.operator,
                    condition.attribute,
                    i32::MAX,
                    raw
                ));
                None
            }
        }
    }

    fn in_range(&mut self, condition: &Condition, sql: Option<String>) -> Option<String> {
        if sql.is_none() {
            self.unsupported(format!(
                "operator '{}' on attribute '{}' moves past the supported date range",
                condition.operator, condition.attribute
            ));
        }
        sql
    }

    fn compare(&mut self, condition: &Condition, col: &str, op: &str) -> Option<String> {
        self.value(condition)
            .map(|v| format!("{} {} {}", col, op, format_value(&v)))
    }

    fn membership(&mut self, condition: &Condition, col: &str, keyword: &str) -> Option<String> {
        let values = condition.list_values();
        if values.is_empty() {
            self.log(format!(
                "'{}' on attribute '{}' has no values; clause dropped",
                condition.operator, condition.attribute
            ));
            return None;
        }
        let list = values
            .iter()
            .map(|v| format_value(v))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{} {} ({})", col, keyword, list))
    }

    fn between(&mut self, condition: &Condition, col: &str, keyword: &str) -> Option<String> {
        let values = condition.list_values();
        if values.len() != 2 {
            self.unsupported(format!(
                "operator '{}' on attribute '{}' needs exactly two values",
                condition.operator, condition.attribute
            ));
            return None;
        }
        Some(format!(
            "{} {} {} AND {}",
            col,
            keyword,
            format_value(&values[0]),
            format_value(&values[1])
        ))
    }

    fn current_user(&mut self, condition: &Condition, col: &str, op: &str) -> Option<String> {
        if let Some(reason) = self.converter.environment.user_context_unavailable() {
            self.unsupported(format!(
                "operator '{}' on attribute '{}': {}",
                condition.operator, condition.attribute, reason
            ));
            return None;
        }
        Some(format!("{} {} {}", col, op, CURRENT_USER))
    }

    fn user_teams(&mut self, condition: &Condition, col: &str, keyword: &str) -> Option<String> {
        if let Some(reason) = self.converter.environment.user_context_unavailable() {
            self.unsupported(format!(
                "operator '{}' on attribute '{}': {}",
                condition.operator, condition.attribute, reason
            ));
            return None;
        }
        tracing::warn!(
            attribute = %condition.attribute,
            operator = %condition.operator,
            "team membership filter emitted best-effort"
        );
        self.unsupported(format!(
            "operator '{}' on attribute '{}' is partially supported: team membership relation may be unavailable",
            condition.operator, condition.attribute
        ));
        Some(format!(
            "{} {} (SELECT tm.teamid FROM teammembership AS tm WHERE tm.systemuserid = {})",
            col, keyword, CURRENT_USER
        ))
    }
}

fn same_day(shift: &TimeShift, col: &str, offset: i64) -> String {
    let reference = if offset == 0 {
        shift.now()
    } else {
        shift.now_plus(DateUnit::Day, offset)
    };
    format!(
        "CAST({} AS DATE) = CAST({} AS DATE)",
        shift.apply(col),
        reference
    )
}

fn same_week(shift: &TimeShift, col: &str, offset: i64) -> String {
    let local = shift.apply(col);
    let reference = if offset == 0 {
        shift.now()
    } else {
        shift.now_plus(DateUnit::Week, offset)
    };
    format!(
        "(DATEPART(week, {local}) = DATEPART(week, {reference}) AND DATEPART(year, {local}) = DATEPART(year, {reference}))"
    )
}

fn same_month(shift: &TimeShift, col: &str, offset: i64) -> String {
    let local = shift.apply(col);
    let reference = if offset == 0 {
        shift.now()
    } else {
        shift.now_plus(DateUnit::Month, offset)
    };
    format!("(MONTH({local}) = MONTH({reference}) AND YEAR({local}) = YEAR({reference}))")
}

fn same_year(shift: &TimeShift, col: &str, offset: i64) -> String {
    let reference = if offset == 0 {
        shift.now()
    } else {
        shift.now_plus(DateUnit::Year, offset)
    };
    format!("YEAR({}) = YEAR({})", shift.apply(col), reference)
}

fn range(shift: &TimeShift, col: &str, lower: String, upper: String) -> String {
    let local = shift.apply(col);
    format!("({local} >= {lower} AND {local} < {upper})")
}

/// `DATEADD` takes an `int` increment.
fn increment(n: Option<i64>) -> Option<i64> {
    n.filter(|n| i32::try_from(*n).is_ok())
}

/// `count` periods ending at the start of the next period.
fn last_window(shift: &TimeShift, col: &str, unit: DateUnit, count: i64) -> Option<String> {
    let start = increment(1i64.checked_sub(count))?;
    Some(range(
        shift,
        col,
        shift.period_boundary(unit, start),
        shift.period_boundary(unit, 1),
    ))
}

/// `count` periods starting at the start of the next period.
fn next_window(shift: &TimeShift, col: &str, unit: DateUnit, count: i64) -> Option<String> {
    let end = increment(1i64.checked_add(count))?;
    Some(range(
        shift,
        col,
        shift.period_boundary(unit, 1),
        shift.period_boundary(unit, end),
    ))
}

fn older_than(shift: &TimeShift, col: &str, unit: DateUnit, count: i64) -> Option<String> {
    let back = increment(count.checked_neg())?;
    Some(format!("{} < {}", shift.apply(col), shift.now_plus(unit, back)))
}
