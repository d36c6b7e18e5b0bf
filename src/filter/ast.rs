//! Typed FetchXML filter tree.

use std::fmt;

/// Join operator of a filter group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("or") {
            LogicalOperator::Or
        } else {
            LogicalOperator::And
        }
    }

    pub fn sql_separator(&self) -> &'static str {
        match self {
            LogicalOperator::And => " AND ",
            LogicalOperator::Or => " OR ",
        }
    }
}

/// Calendar unit used by relative date operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateUnit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl DateUnit {
    /// T-SQL datepart name.
    pub fn datepart(&self) -> &'static str {
        match self {
            DateUnit::Hour => "hour",
            DateUnit::Day => "day",
            DateUnit::Week => "week",
            DateUnit::Month => "month",
            DateUnit::Year => "year",
        }
    }

    fn from_plural(s: &str) -> Option<Self> {
        match s {
            "hours" => Some(DateUnit::Hour),
            "days" => Some(DateUnit::Day),
            "weeks" => Some(DateUnit::Week),
            "months" => Some(DateUnit::Month),
            "years" => Some(DateUnit::Year),
            _ => None,
        }
    }
}

/// Closed set of condition operators, with an explicit fallback for
/// operator names the converter does not know.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Null,
    NotNull,
    Like,
    NotLike,
    BeginsWith,
    NotBeginWith,
    EndsWith,
    NotEndWith,
    In,
    NotIn,
    Between,
    NotBetween,
    Today,
    Yesterday,
    Tomorrow,
    ThisWeek,
    LastWeek,
    NextWeek,
    ThisMonth,
    LastMonth,
    NextMonth,
    ThisYear,
    LastYear,
    NextYear,
    LastSevenDays,
    NextSevenDays,
    LastX(DateUnit),
    NextX(DateUnit),
    OlderThanX(DateUnit),
    On,
    OnOrAfter,
    OnOrBefore,
    EqUserId,
    NeUserId,
    EqUserTeams,
    NeUserTeams,
    Unrecognized(String),
}

impl ConditionOperator {
    /// Parse an operator name. Never fails: unknown names become
    /// [`ConditionOperator::Unrecognized`].
    pub fn parse(name: &str) -> Self {
        let lowered = name.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "eq" => Self::Eq,
            "ne" | "neq" => Self::Ne,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "null" => Self::Null,
            "not-null" => Self::NotNull,
            "like" => Self::Like,
            "not-like" => Self::NotLike,
            "begins-with" => Self::BeginsWith,
            "not-begin-with" => Self::NotBeginWith,
            "ends-with" => Self::EndsWith,
            "not-end-with" => Self::NotEndWith,
            "in" => Self::In,
            "not-in" => Self::NotIn,
            "between" => Self::Between,
            "not-between" => Self::NotBetween,
            "today" => Self::Today,
            "yesterday" => Self::Yesterday,
            "tomorrow" => Self::Tomorrow,
            "this-week" => Self::ThisWeek,
            "last-week" => Self::LastWeek,
            "next-week" => Self::NextWeek,
            "this-month" => Self::ThisMonth,
            "last-month" => Self::LastMonth,
            "next-month" => Self::NextMonth,
            "this-year" => Self::ThisYear,
            "last-year" => Self::LastYear,
            "next-year" => Self::NextYear,
            "last-seven-days" => Self::LastSevenDays,
            "next-seven-days" => Self::NextSevenDays,
            "on" => Self::On,
            "on-or-after" => Self::OnOrAfter,
            "on-or-before" => Self::OnOrBefore,
            "eq-userid" => Self::EqUserId,
            "ne-userid" => Self::NeUserId,
            "eq-userteams" => Self::EqUserTeams,
            "ne-userteams" => Self::NeUserTeams,
            other => Self::parse_relative(other)
                .unwrap_or_else(|| Self::Unrecognized(name.trim().to_string())),
        }
    }

    fn parse_relative(name: &str) -> Option<Self> {
        if let Some(unit) = name.strip_prefix("last-x-") {
            return DateUnit::from_plural(unit).map(Self::LastX);
        }
        if let Some(unit) = name.strip_prefix("next-x-") {
            return DateUnit::from_plural(unit).map(Self::NextX);
        }
        let unit = name
            .strip_prefix("olderthan-x-")
            .or_else(|| name.strip_prefix("older-x-"))?;
        DateUnit::from_plural(unit).map(Self::OlderThanX)
    }

    /// Canonical operator name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Null => "null",
            Self::NotNull => "not-null",
            Self::Like => "like",
            Self::NotLike => "not-like",
            Self::BeginsWith => "begins-with",
            Self::NotBeginWith => "not-begin-with",
            Self::EndsWith => "ends-with",
            Self::NotEndWith => "not-end-with",
            Self::In => "in",
            Self::NotIn => "not-in",
            Self::Between => "between",
            Self::NotBetween => "not-between",
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Tomorrow => "tomorrow",
            Self::ThisWeek => "this-week",
            Self::LastWeek => "last-week",
            Self::NextWeek => "next-week",
            Self::ThisMonth => "this-month",
            Self::LastMonth => "last-month",
            Self::NextMonth => "next-month",
            Self::ThisYear => "this-year",
            Self::LastYear => "last-year",
            Self::NextYear => "next-year",
            Self::LastSevenDays => "last-seven-days",
            Self::NextSevenDays => "next-seven-days",
            Self::LastX(unit) => match unit {
                DateUnit::Hour => "last-x-hours",
                DateUnit::Day => "last-x-days",
                DateUnit::Week => "last-x-weeks",
                DateUnit::Month => "last-x-months",
                DateUnit::Year => "last-x-years",
            },
            Self::NextX(unit) => match unit {
                DateUnit::Hour => "next-x-hours",
                DateUnit::Day => "next-x-days",
                DateUnit::Week => "next-x-weeks",
                DateUnit::Month => "next-x-months",
                DateUnit::Year => "next-x-years",
            },
            Self::OlderThanX(unit) => match unit {
                DateUnit::Hour => "olderthan-x-hours",
                DateUnit::Day => "olderthan-x-days",
                DateUnit::Week => "olderthan-x-weeks",
                DateUnit::Month => "olderthan-x-months",
                DateUnit::Year => "olderthan-x-years",
            },
            Self::On => "on",
            Self::OnOrAfter => "on-or-after",
            Self::OnOrBefore => "on-or-before",
            Self::EqUserId => "eq-userid",
            Self::NeUserId => "ne-userid",
            Self::EqUserTeams => "eq-userteams",
            Self::NeUserTeams => "ne-userteams",
            Self::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub attribute: String,
    pub operator: ConditionOperator,
    /// `value` attribute.
    pub value: Option<String>,
    /// Child `<value>` elements.
    pub values: Vec<String>,
    /// Join alias the condition refers to, when written at the outer scope.
    pub entity_name: Option<String>,
}

impl Condition {
    pub fn new(attribute: impl Into<String>, operator: &str, value: Option<&str>) -> Self {
        Self {
            attribute: attribute.into(),
            operator: ConditionOperator::parse(operator),
            value: value.map(str::to_string),
            values: Vec::new(),
            entity_name: None,
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Values for list operators: `<value>` children win, otherwise the
    /// `value` attribute split on commas. Blank entries are dropped.
    pub fn list_values(&self) -> Vec<String> {
        if !self.values.is_empty() {
            return self
                .values
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
        }
        self.value
            .as_deref()
            .map(|v| {
                v.split(',')
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Single scalar value: the attribute, else the first `<value>` child.
    pub fn scalar_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .or_else(|| self.values.first().map(String::as_str))
    }
}

/// Item inside a filter group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterItem {
    Condition(Condition),
    Group(FilterGroup),
    Link(LinkEntity),
}

/// `<filter type="and|or">`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterGroup {
    pub logic: LogicalOperator,
    pub items: Vec<FilterItem>,
}

impl FilterGroup {
    pub fn new(logic: LogicalOperator) -> Self {
        Self {
            logic,
            items: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.items.push(FilterItem::Condition(condition));
        self
    }

    pub fn with_group(mut self, group: FilterGroup) -> Self {
        self.items.push(FilterItem::Group(group));
        self
    }
}

/// `link-type` of a link-entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkType {
    #[default]
    Inner,
    Outer,
    Any,
    NotAny,
    Other(String),
}

impl LinkType {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "inner" | "exists" | "in" => LinkType::Inner,
            "outer" => LinkType::Outer,
            "any" => LinkType::Any,
            "not any" => LinkType::NotAny,
            _ => LinkType::Other(s.trim().to_string()),
        }
    }
}

/// `<link-entity>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkEntity {
    pub name: String,
    /// Attribute on the linked table.
    pub from: String,
    /// Attribute on the parent table.
    pub to: String,
    pub alias: Option<String>,
    pub link_type: LinkType,
    pub filters: Vec<FilterGroup>,
    pub links: Vec<LinkEntity>,
}

/// Root `<entity>` of a saved view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchQuery {
    pub entity: String,
    pub filters: Vec<FilterGroup>,
    pub links: Vec<LinkEntity>,
}
