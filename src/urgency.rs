//! Reminder urgency classification.
//!
//! Pure functions of the due date and the current date. A loan is urgent when
//! it falls due within two days, which includes anything already overdue. A
//! loan without a due date is never urgent.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Days before the due date at which a reminder turns urgent.
pub const URGENT_WINDOW_DAYS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Urgent,
    Reminder,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Urgent => "URGENT",
            Urgency::Reminder => "REMINDER",
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Urgency::Urgent)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed day count from `today` to the due date. Negative when overdue.
pub fn days_until_due(due_date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    due_date.map(|due| (due - today).num_days())
}

pub fn is_overdue(due_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    days_until_due(due_date, today).is_some_and(|days| days < 0)
}

pub fn classify(due_date: Option<NaiveDate>, today: NaiveDate) -> Urgency {
    match days_until_due(due_date, today) {
        Some(days) if days <= URGENT_WINDOW_DAYS => Urgency::Urgent,
        _ => Urgency::Reminder,
    }
}

/// Status label shown on reminders: `OVERDUE` once the due date has passed.
pub fn due_status_label(due_date: Option<NaiveDate>, today: NaiveDate) -> &'static str {
    if is_overdue(due_date, today) {
        "OVERDUE"
    } else {
        "PENDING"
    }
}
