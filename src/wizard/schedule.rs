// ABOUTME: Schedule form for the final wizard step
// ABOUTME: Submit-time validation and conversion into the backend's schedule payload

use chrono::{NaiveDateTime, Weekday};

use crate::error::{ConsoleError, Result};
use crate::remote::models::ScheduleSpec;

const WIRE_DATETIME: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    Daily { days: Vec<Weekday> },
    Monthly { day_of_month: u32, month_interval: u32 },
    /// Once a year on the start date.
    Yearly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleForm {
    pub import_name: String,
    pub start: Option<NaiveDateTime>,
    pub stop: Option<NaiveDateTime>,
    /// `None` means a one-off run.
    pub recurrence: Option<Recurrence>,
    pub indefinitely: bool,
    pub immediately: bool,
    pub email_notifications: bool,
    pub email: String,
}

/// Top-level fields plus the nested schedule, as the create-import request splits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleParts {
    pub import_name: String,
    pub email_notifications: bool,
    pub email: String,
    pub schedule: ScheduleSpec,
}

impl ScheduleForm {
    /// Run once, right away.
    pub fn immediate(name: impl Into<String>) -> Self {
        Self {
            import_name: name.into(),
            immediately: true,
            ..Default::default()
        }
    }

    /// Checked at submit time against `now`, not continuously.
    pub fn validate(&self, now: NaiveDateTime) -> Result<()> {
        if self.import_name.trim().is_empty() {
            return Err(ConsoleError::validation("Import name is required."));
        }

        if !self.immediately {
            let start = self
                .start
                .ok_or_else(|| ConsoleError::validation("Start date/time is required."))?;
            if start < now {
                return Err(ConsoleError::validation(
                    "Start date/time cannot be in the past.",
                ));
            }
        }

        if self.email_notifications {
            let email = self.email.trim();
            if email.is_empty() {
                return Err(ConsoleError::validation(
                    "Email address is required for notifications.",
                ));
            }
            if !email.contains('@') {
                return Err(ConsoleError::validation("Email address is not valid."));
            }
        }

        if let Some(Recurrence::Monthly {
            day_of_month,
            month_interval,
        }) = &self.recurrence
        {
            if !(1..=31).contains(day_of_month) {
                return Err(ConsoleError::validation(
                    "Day of month must be between 1 and 31.",
                ));
            }
            if *month_interval < 1 {
                return Err(ConsoleError::validation(
                    "Month interval must be at least 1.",
                ));
            }
        }

        Ok(())
    }

    pub fn to_parts(&self) -> ScheduleParts {
        let mut spec = ScheduleSpec {
            start_date: self
                .start
                .map(|d| d.format(WIRE_DATETIME).to_string())
                .unwrap_or_default(),
            stop_date: self
                .stop
                .map(|d| d.format(WIRE_DATETIME).to_string())
                .unwrap_or_default(),
            recurring: self.recurrence.is_some(),
            indefinetely: self.indefinitely,
            immediately: self.immediately,
            ..Default::default()
        };

        match &self.recurrence {
            Some(Recurrence::Daily { days }) => {
                spec.daily = true;
                for day in days {
                    match day {
                        Weekday::Sun => spec.sunday = true,
                        Weekday::Mon => spec.monday = true,
                        Weekday::Tue => spec.tuesday = true,
                        Weekday::Wed => spec.wednesday = true,
                        Weekday::Thu => spec.thursday = true,
                        Weekday::Fri => spec.friday = true,
                        Weekday::Sat => spec.saturday = true,
                    }
                }
            }
            Some(Recurrence::Monthly {
                day_of_month,
                month_interval,
            }) => {
                spec.monthly = true;
                spec.day = day_of_month.to_string();
                spec.month = month_interval.to_string();
            }
            Some(Recurrence::Yearly) => spec.yearly = true,
            None => {}
        }

        ScheduleParts {
            import_name: self.import_name.trim().to_string(),
            email_notifications: self.email_notifications,
            email: if self.email_notifications {
                self.email.trim().to_string()
            } else {
                String::new()
            },
            schedule: spec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn name_is_required() {
        let form = ScheduleForm::immediate("   ");
        assert!(form.validate(at(1, 9)).unwrap_err().is_validation());
    }

    #[test]
    fn past_start_rejected_unless_immediate() {
        let mut form = ScheduleForm {
            import_name: "Nightly".into(),
            start: Some(at(1, 8)),
            ..Default::default()
        };
        assert!(form.validate(at(1, 9)).is_err());

        form.start = Some(at(1, 9));
        assert!(form.validate(at(1, 9)).is_ok());

        form.start = Some(at(1, 8));
        form.immediately = true;
        assert!(form.validate(at(1, 9)).is_ok());
    }

    #[test]
    fn start_required_for_scheduled_runs() {
        let form = ScheduleForm {
            import_name: "Nightly".into(),
            ..Default::default()
        };
        let err = form.validate(at(1, 9)).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Start date/time is required.");
    }

    #[test]
    fn email_required_only_with_notifications() {
        let mut form = ScheduleForm::immediate("Nightly");
        assert!(form.validate(at(1, 9)).is_ok());

        form.email_notifications = true;
        assert!(form.validate(at(1, 9)).is_err());

        form.email = "ops@example.com".into();
        assert!(form.validate(at(1, 9)).is_ok());
    }

    #[test]
    fn monthly_bounds_are_checked() {
        let mut form = ScheduleForm::immediate("Monthly");
        form.recurrence = Some(Recurrence::Monthly {
            day_of_month: 32,
            month_interval: 1,
        });
        assert!(form.validate(at(1, 9)).is_err());

        form.recurrence = Some(Recurrence::Monthly {
            day_of_month: 15,
            month_interval: 0,
        });
        assert!(form.validate(at(1, 9)).is_err());
    }

    #[test]
    fn daily_recurrence_sets_weekday_flags() {
        let form = ScheduleForm {
            import_name: " Weekdays ".into(),
            start: Some(at(2, 6)),
            recurrence: Some(Recurrence::Daily {
                days: vec![Weekday::Mon, Weekday::Fri],
            }),
            email: "ignored@example.com".into(),
            ..Default::default()
        };
        let parts = form.to_parts();
        assert_eq!(parts.import_name, "Weekdays");
        assert_eq!(parts.email, "");
        assert_eq!(parts.schedule.start_date, "2025-06-02T06:00");
        assert!(parts.schedule.recurring && parts.schedule.daily);
        assert!(parts.schedule.monday && parts.schedule.friday);
        assert!(!parts.schedule.sunday && !parts.schedule.monthly);
    }

    #[test]
    fn monthly_recurrence_fills_day_and_interval() {
        let mut form = ScheduleForm::immediate("Monthly");
        form.recurrence = Some(Recurrence::Monthly {
            day_of_month: 15,
            month_interval: 2,
        });
        let spec = form.to_parts().schedule;
        assert!(spec.monthly && spec.immediately);
        assert_eq!(spec.day, "15");
        assert_eq!(spec.month, "2");
    }
}
