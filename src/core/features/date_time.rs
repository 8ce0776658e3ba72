//! Date utilities: age and the span between two dates

use crate::shared::error::{AppError, AppResult};
use crate::shared::types::{FieldSpec, WidgetInput, WidgetOutput};
use super::Calculator;
use chrono::{Datelike, Local, Months, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(input: &WidgetInput, key: &str) -> AppResult<NaiveDate> {
    let raw = input
        .text(key)
        .ok_or_else(|| AppError::Validation(format!("Missing '{}' parameter", key)))?;
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| AppError::Validation(format!("Invalid date '{}': {}", raw, e)))
}

/// Calendar difference as (years, months, days); `on` must not precede `birth`
///
/// Month-ends clamp, so Jan 31 plus one month is the last day of February.
pub fn calendar_age(birth: NaiveDate, on: NaiveDate) -> (i64, i64, i64) {
    let mut total_months =
        (on.year() - birth.year()) as i64 * 12 + on.month() as i64 - birth.month() as i64;
    if on.day() < birth.day() {
        total_months -= 1;
    }

    let anchor = birth
        .checked_add_months(Months::new(total_months.max(0) as u32))
        .unwrap_or(birth);
    let days = (on - anchor).num_days();

    (total_months / 12, total_months % 12, days)
}

#[derive(Debug, Clone, Default)]
pub struct AgeWidget {
    /// Fixed "today" for reproducible results; the local date otherwise
    pub today: Option<NaiveDate>,
}

impl Calculator for AgeWidget {
    fn id(&self) -> &str {
        "age"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::date("birth_date", "Date of birth"),
            FieldSpec::date("on_date", "Age on"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let birth = parse_date(input, "birth_date")?;
        let on = if input.is_blank("on_date") {
            self.today.unwrap_or_else(|| Local::now().date_naive())
        } else {
            parse_date(input, "on_date")?
        };
        if on < birth {
            return Err(AppError::Validation("Date of birth is after the reference date".to_string()));
        }

        let (years, months, days) = calendar_age(birth, on);
        let total_days = (on - birth).num_days();

        Ok(WidgetOutput::new(format!("{}y {}m {}d", years, months, days))
            .value("years", years as f64)
            .value("months", months as f64)
            .value("days", days as f64)
            .value("total_days", total_days as f64)
            .detail("total_days", total_days.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct DateDiffWidget;

impl Calculator for DateDiffWidget {
    fn id(&self) -> &str {
        "date-diff"
    }

    fn fields(&self) -> Vec<FieldSpec> {
        vec![
            FieldSpec::date("start", "Start date"),
            FieldSpec::date("end", "End date"),
        ]
    }

    fn compute(&self, input: &WidgetInput) -> AppResult<WidgetOutput> {
        let start = parse_date(input, "start")?;
        let end = parse_date(input, "end")?;
        let days = (end - start).num_days();

        Ok(WidgetOutput::new(format!("{} days", days))
            .value("days", days as f64)
            .value("weeks", days as f64 / 7.0)
            .detail("weeks", format!("{} weeks {} days", days / 7, days % 7)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_age() {
        assert_eq!(calendar_age(date(1990, 5, 15), date(2024, 5, 20)), (34, 0, 5));
        assert_eq!(calendar_age(date(1990, 5, 15), date(2024, 5, 14)), (33, 11, 29));
        assert_eq!(calendar_age(date(2000, 1, 31), date(2000, 3, 1)), (0, 1, 1));
    }

    #[test]
    fn test_age_widget_with_fixed_today() {
        let widget = AgeWidget { today: Some(date(2024, 5, 20)) };
        let input = WidgetInput::from_pairs([("birth_date", "1990-05-15")]);
        let output = widget.compute(&input).unwrap();
        assert_eq!(output.primary, "34y 0m 5d");
    }

    #[test]
    fn test_age_rejects_future_birth() {
        let widget = AgeWidget { today: Some(date(2024, 5, 20)) };
        let input = WidgetInput::from_pairs([("birth_date", "2030-01-01")]);
        assert!(widget.compute(&input).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_date_diff() {
        let input = WidgetInput::from_pairs([("start", "2024-01-01"), ("end", "2024-03-01")]);
        let output = DateDiffWidget.compute(&input).unwrap();
        assert_eq!(output.primary, "60 days");
        assert_eq!(output.details[0].value, "8 weeks 4 days");
    }

    #[test]
    fn test_bad_date_is_invalid_input() {
        let input = WidgetInput::from_pairs([("start", "yesterday"), ("end", "2024-03-01")]);
        assert!(DateDiffWidget.compute(&input).unwrap_err().is_invalid_input());
    }
}
