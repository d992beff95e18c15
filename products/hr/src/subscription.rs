use chrono::{DateTime, Duration, Utc};
use entity::companies::{self, Plan};
use serde::Serialize;

use crate::{DomainError, DomainResult};

/// Length of one paid month.
pub const BILLING_MONTH_DAYS: i64 = 30;
pub const MAX_MONTHS_PER_ORDER: i32 = 12;
pub const CURRENCY: &str = "INR";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTerms {
    pub plan: Plan,
    /// Minor units per seat per month.
    pub price_per_seat: i64,
    pub max_seats: i32,
}

/// Seat rules for a deployment. The free tier size is configurable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeatPolicy {
    pub free_seats: i32,
}

impl Default for SeatPolicy {
    fn default() -> Self {
        Self { free_seats: 5 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuote {
    pub plan: Plan,
    pub seats: i32,
    pub months: i32,
    pub amount: i64,
}

impl SeatPolicy {
    pub fn terms(&self, plan: Plan) -> PlanTerms {
        match plan {
            Plan::Free => PlanTerms {
                plan,
                price_per_seat: 0,
                max_seats: self.free_seats,
            },
            Plan::Basic => PlanTerms {
                plan,
                price_per_seat: 4_900,
                max_seats: 50,
            },
            Plan::Premium => PlanTerms {
                plan,
                price_per_seat: 9_900,
                max_seats: 500,
            },
        }
    }

    pub fn catalog(&self) -> Vec<PlanTerms> {
        [Plan::Free, Plan::Basic, Plan::Premium]
            .into_iter()
            .map(|plan| self.terms(plan))
            .collect()
    }

    /// A paid plan whose `active_until` is still in the future.
    pub fn is_active(&self, company: &companies::Model, now: DateTime<Utc>) -> bool {
        company.plan != Plan::Free
            && company
                .active_until
                .is_some_and(|until| until.with_timezone(&Utc) > now)
    }

    /// Expired paid plans fall back to the free tier.
    pub fn seat_limit(&self, company: &companies::Model, now: DateTime<Utc>) -> i32 {
        if self.is_active(company, now) {
            company.seats
        } else {
            self.free_seats
        }
    }

    pub fn ensure_seat_available(
        &self,
        company: &companies::Model,
        seats_in_use: u64,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let limit = self.seat_limit(company, now);
        if seats_in_use >= u64::try_from(limit.max(0)).unwrap_or(0) {
            return Err(DomainError::SeatLimitReached { limit });
        }
        Ok(())
    }

    pub fn quote(
        &self,
        plan: Plan,
        seats: i32,
        months: i32,
        seats_in_use: u64,
    ) -> DomainResult<OrderQuote> {
        if plan == Plan::Free {
            return Err(DomainError::invalid("the free plan cannot be purchased"));
        }
        if !(1..=MAX_MONTHS_PER_ORDER).contains(&months) {
            return Err(DomainError::invalid(format!(
                "months must be between 1 and {MAX_MONTHS_PER_ORDER}"
            )));
        }
        let terms = self.terms(plan);
        if seats < 1 || seats > terms.max_seats {
            return Err(DomainError::invalid(format!(
                "seats must be between 1 and {}",
                terms.max_seats
            )));
        }
        if u64::try_from(seats).unwrap_or(0) < seats_in_use {
            return Err(DomainError::invalid(format!(
                "{seats_in_use} employees already on the roster; buy at least that many seats"
            )));
        }
        Ok(OrderQuote {
            plan,
            seats,
            months,
            amount: terms.price_per_seat * i64::from(seats) * i64::from(months),
        })
    }
}

/// New `active_until` after paying for `months` of `plan`. Renewing the
/// plan that is still running extends it; anything else starts from `now`.
pub fn extended_until(
    company: &companies::Model,
    plan: Plan,
    months: i32,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let current = company.active_until.map(|until| until.with_timezone(&Utc));
    let start = match current {
        Some(until) if company.plan == plan && until > now => until,
        _ => now,
    };
    start + Duration::days(BILLING_MONTH_DAYS * i64::from(months.max(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn company(plan: Plan, seats: i32, active_until: Option<DateTime<Utc>>) -> companies::Model {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        companies::Model {
            name: "Acme".into(),
            owner_email: "owner@acme.test".into(),
            plan,
            seats,
            active_until: active_until.map(Into::into),
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn free_company_uses_free_limit() {
        let policy = SeatPolicy { free_seats: 3 };
        let acme = company(Plan::Free, 0, None);
        assert_eq!(policy.seat_limit(&acme, now()), 3);
        assert!(policy.ensure_seat_available(&acme, 2, now()).is_ok());
        assert_eq!(
            policy.ensure_seat_available(&acme, 3, now()),
            Err(DomainError::SeatLimitReached { limit: 3 })
        );
    }

    #[test]
    fn active_paid_plan_uses_purchased_seats() {
        let policy = SeatPolicy::default();
        let acme = company(Plan::Basic, 20, Some(now() + Duration::days(1)));
        assert!(policy.is_active(&acme, now()));
        assert_eq!(policy.seat_limit(&acme, now()), 20);
    }

    #[test]
    fn expired_paid_plan_falls_back_to_free() {
        let policy = SeatPolicy::default();
        let acme = company(Plan::Premium, 100, Some(now() - Duration::seconds(1)));
        assert!(!policy.is_active(&acme, now()));
        assert_eq!(policy.seat_limit(&acme, now()), 5);
    }

    #[test]
    fn quote_multiplies_price_seats_months() {
        let policy = SeatPolicy::default();
        let quote = policy.quote(Plan::Basic, 10, 3, 4).unwrap();
        assert_eq!(quote.amount, 4_900 * 10 * 3);
    }

    #[test]
    fn quote_rejects_bad_orders() {
        let policy = SeatPolicy::default();
        assert!(policy.quote(Plan::Free, 5, 1, 0).is_err());
        assert!(policy.quote(Plan::Basic, 5, 0, 0).is_err());
        assert!(policy.quote(Plan::Basic, 5, 13, 0).is_err());
        assert!(policy.quote(Plan::Basic, 51, 1, 0).is_err());
        assert!(policy.quote(Plan::Basic, 5, 1, 6).is_err());
    }

    #[test]
    fn renewal_extends_running_plan() {
        let until = now() + Duration::days(10);
        let acme = company(Plan::Basic, 10, Some(until));
        assert_eq!(
            extended_until(&acme, Plan::Basic, 2, now()),
            until + Duration::days(60)
        );
    }

    #[test]
    fn plan_change_or_lapse_restarts_from_now() {
        let acme = company(Plan::Basic, 10, Some(now() + Duration::days(10)));
        assert_eq!(
            extended_until(&acme, Plan::Premium, 1, now()),
            now() + Duration::days(30)
        );
        let lapsed = company(Plan::Basic, 10, Some(now() - Duration::days(10)));
        assert_eq!(
            extended_until(&lapsed, Plan::Basic, 1, now()),
            now() + Duration::days(30)
        );
    }
}
