use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult, leave::working_days};

/// A calendar month, written `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let invalid = || DomainError::invalid(format!("period must be YYYY-MM, got {raw:?}"));
        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or_default()
    }

    pub fn working_days(&self) -> i32 {
        working_days(self.first_day(), self.last_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One employee's pay for a period. Amounts are minor currency units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayslipLine {
    pub emp_email: String,
    pub name: String,
    pub gross: i64,
    pub bonus: i64,
    pub deductions: i64,
    pub unpaid_leave_days: i32,
    pub unpaid_leave_deduction: i64,
    pub net: i64,
}

#[derive(Clone, Debug)]
pub struct PayrollInput<'a> {
    pub emp_email: &'a str,
    pub name: &'a str,
    pub monthly_salary: i64,
    pub bonus: i64,
    pub deductions: i64,
    pub unpaid_leave_days: i32,
}

pub fn compute_line(input: &PayrollInput<'_>, period: Period) -> DomainResult<PayslipLine> {
    if input.bonus < 0 || input.deductions < 0 {
        return Err(DomainError::invalid(format!(
            "bonus and deductions for {} must not be negative",
            input.emp_email
        )));
    }
    let gross = input.monthly_salary.max(0);
    let period_days = i64::from(period.working_days().max(1));
    let unpaid_days = i64::from(input.unpaid_leave_days.clamp(0, period.working_days()));
    let unpaid_leave_deduction =
        i64::try_from(i128::from(gross) * i128::from(unpaid_days) / i128::from(period_days))
            .unwrap_or(gross);
    let net = (gross + input.bonus - input.deductions - unpaid_leave_deduction).max(0);
    Ok(PayslipLine {
        emp_email: input.emp_email.to_string(),
        name: input.name.to_string(),
        gross,
        bonus: input.bonus,
        deductions: input.deductions,
        unpaid_leave_days: unpaid_days as i32,
        unpaid_leave_deduction,
        net,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_parses_and_formats() {
        let period = Period::parse("2026-02").unwrap();
        assert_eq!(period.to_string(), "2026-02");
        assert_eq!(period.first_day(), NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(period.last_day(), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(
            Period::parse("2025-12").unwrap().last_day(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
        );
        for bad in ["2026-13", "2026-2", "26-02", "2026/02", ""] {
            assert!(Period::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn february_2026_has_twenty_working_days() {
        assert_eq!(Period::parse("2026-02").unwrap().working_days(), 20);
    }

    #[test]
    fn unpaid_leave_is_prorated() {
        let period = Period::parse("2026-02").unwrap();
        let line = compute_line(
            &PayrollInput {
                emp_email: "ada@acme.test",
                name: "Ada",
                monthly_salary: 100_000,
                bonus: 5_000,
                deductions: 2_000,
                unpaid_leave_days: 2,
            },
            period,
        )
        .unwrap();
        assert_eq!(line.unpaid_leave_deduction, 10_000);
        assert_eq!(line.net, 100_000 + 5_000 - 2_000 - 10_000);
    }

    #[test]
    fn net_never_goes_negative() {
        let period = Period::parse("2026-02").unwrap();
        let line = compute_line(
            &PayrollInput {
                emp_email: "bo@acme.test",
                name: "Bo",
                monthly_salary: 1_000,
                bonus: 0,
                deductions: 5_000,
                unpaid_leave_days: 0,
            },
            period,
        )
        .unwrap();
        assert_eq!(line.net, 0);
    }

    #[test]
    fn negative_adjustments_are_rejected() {
        let period = Period::parse("2026-02").unwrap();
        let input = PayrollInput {
            emp_email: "x@acme.test",
            name: "X",
            monthly_salary: 1_000,
            bonus: -1,
            deductions: 0,
            unpaid_leave_days: 0,
        };
        assert!(compute_line(&input, period).is_err());
    }
}
