//! Timezone-shifted date arithmetic in T-SQL.
//!
//! Stored timestamps are UTC; filter semantics are defined in a local
//! calendar. Every stored column and every "now" is shifted by the
//! configured offset before comparison.

use super::ast::DateUnit;

/// Fixed UTC offset at minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeShift {
    minutes: i32,
}

impl TimeShift {
    /// Build from fractional hours. `5.5` keeps its half hour.
    pub fn from_hours(hours: f64) -> Self {
        Self {
            minutes: (hours * 60.0).round() as i32,
        }
    }

    pub fn minutes(&self) -> i32 {
        self.minutes
    }

    /// Shift an expression into local time.
    pub fn apply(&self, expr: &str) -> String {
        if self.minutes % 60 == 0 {
            format!("DATEADD(hour, {}, {})", self.minutes / 60, expr)
        } else {
            format!("DATEADD(minute, {}, {})", self.minutes, expr)
        }
    }

    /// Local "now".
    pub fn now(&self) -> String {
        self.apply("GETUTCDATE()")
    }

    /// `now` offset by `count` units.
    pub fn now_plus(&self, unit: DateUnit, count: i64) -> String {
        format!("DATEADD({}, {}, {})", unit.datepart(), count, self.now())
    }

    /// Start of the current `unit` period in local time.
    pub fn period_start(&self, unit: DateUnit) -> String {
        let part = unit.datepart();
        format!("DATEADD({part}, DATEDIFF({part}, 0, {}), 0)", self.now())
    }

    /// Start of the current period moved by `count` periods.
    pub fn period_boundary(&self, unit: DateUnit, count: i64) -> String {
        if count == 0 {
            return self.period_start(unit);
        }
        format!(
            "DATEADD({}, {}, {})",
            unit.datepart(),
            count,
            self.period_start(unit)
        )
    }
}
