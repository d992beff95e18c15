use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use entity::{
    companies::{self, Plan},
    payment_logs::{self, PaymentStatus},
};
use platform_api::{ApiError, ApiResult};
use platform_payments::{OrderRequest, PaymentError, verify_payment_signature};
use products_hr::subscription::{CURRENCY, PlanTerms, extended_until};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait, prelude::DateTimeWithTimeZone,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    domain_error,
    employees::{load_company, seats_in_use},
};
use crate::{http::AppState, session::SessionUser};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/billing", get(billing_overview))
        .route("/billing/orders", post(create_order))
        .route("/billing/verify", post(verify_payment))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscriptionView {
    plan: Plan,
    seats: i32,
    active_until: Option<DateTime<Utc>>,
    active: bool,
    seats_used: u64,
    seat_limit: i32,
}

impl SubscriptionView {
    pub(crate) fn new(
        state: &AppState,
        company: &companies::Model,
        seats_used: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            plan: company.plan,
            seats: company.seats,
            active_until: company.active_until.map(|until| until.with_timezone(&Utc)),
            active: state.seats.is_active(company, now),
            seats_used,
            seat_limit: state.seats.seat_limit(company, now),
        }
    }
}

pub(crate) async fn subscription_view(
    state: &AppState,
    company_name: &str,
) -> ApiResult<SubscriptionView> {
    let company = load_company(&state.pool, company_name).await?;
    let used = seats_in_use(&state.pool, company_name).await?;
    Ok(SubscriptionView::new(state, &company, used, Utc::now()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BillingOverview {
    subscription: SubscriptionView,
    plans: Vec<PlanTerms>,
    payments: Vec<payment_logs::Model>,
}

async fn billing_overview(
    State(state): State<AppState>,
    user: SessionUser,
) -> ApiResult<Json<BillingOverview>> {
    user.require_employer()?;
    let subscription = subscription_view(&state, &user.company_name).await?;
    let payments = payment_logs::Entity::find()
        .filter(payment_logs::Column::CompanyName.eq(user.company_name.as_str()))
        .order_by_desc(payment_logs::Column::CreatedAt)
        .all(&state.pool)
        .await?;
    Ok(Json(BillingOverview {
        subscription,
        plans: state.seats.catalog(),
        payments,
    }))
}

#[derive(Deserialize)]
struct OrderBody {
    plan: Plan,
    seats: i32,
    months: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    order_id: String,
    amount: i64,
    currency: String,
    key_id: String,
}

fn gateway_error(err: PaymentError) -> ApiError {
    match err {
        PaymentError::Rejected(reason) => {
            ApiError::invalid(format!("payment gateway rejected the order: {reason}"))
        }
        other => ApiError::internal(other.into()),
    }
}

#[instrument(name = "billing.order", skip_all, fields(company = %user.company_name))]
async fn create_order(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<OrderBody>,
) -> ApiResult<Json<OrderResponse>> {
    user.require_employer()?;
    let used = seats_in_use(&state.pool, &user.company_name).await?;
    let quote = state
        .seats
        .quote(body.plan, body.seats, body.months, used)
        .map_err(domain_error)?;

    // Gateway receipts are capped at 40 characters.
    let receipt = format!("smarthr_{}", Uuid::new_v4().simple());
    let order = state
        .payments
        .create_order(&OrderRequest {
            amount: quote.amount,
            currency: CURRENCY.to_string(),
            receipt,
            notes: json!({
                "company": user.company_name,
                "plan": quote.plan,
                "seats": quote.seats,
                "months": quote.months,
            }),
        })
        .await
        .map_err(gateway_error)?;

    let now = Utc::now();
    payment_logs::ActiveModel {
        id: Set(Uuid::new_v4()),
        company_name: Set(user.company_name.clone()),
        order_id: Set(order.id.clone()),
        payment_id: Set(None),
        plan: Set(quote.plan),
        seats: Set(quote.seats),
        months: Set(quote.months),
        amount: Set(quote.amount),
        currency: Set(CURRENCY.to_string()),
        status: Set(PaymentStatus::Created),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.pool)
    .await?;

    info!(order_id = %order.id, amount = quote.amount, "order created");
    Ok(Json(OrderResponse {
        order_id: order.id,
        amount: quote.amount,
        currency: CURRENCY.to_string(),
        key_id: state.payments.key_id().to_string(),
    }))
}

pub(crate) async fn payment_log_by_order<C: ConnectionTrait>(
    db: &C,
    order_id: &str,
) -> ApiResult<Option<payment_logs::Model>> {
    Ok(payment_logs::Entity::find()
        .filter(payment_logs::Column::OrderId.eq(order_id))
        .one(db)
        .await?)
}

/// Marks a payment log paid and applies its plan to the company. Returns
/// `false` when the log was already paid.
///
/// The log is claimed with a conditional update, so a checkout callback and
/// a webhook for the same order apply it once between them.
pub(crate) async fn apply_payment(
    state: &AppState,
    order_id: &str,
    payment_id: &str,
) -> ApiResult<bool> {
    let txn = state.pool.begin().await?;
    let log = payment_log_by_order(&txn, order_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let now = Utc::now();
    let stamp: DateTimeWithTimeZone = now.into();
    let claimed = payment_logs::Entity::update_many()
        .col_expr(
            payment_logs::Column::Status,
            Expr::value(PaymentStatus::Paid.to_value()),
        )
        .col_expr(payment_logs::Column::PaymentId, Expr::value(payment_id))
        .col_expr(payment_logs::Column::UpdatedAt, Expr::value(stamp))
        .filter(payment_logs::Column::Id.eq(log.id))
        .filter(payment_logs::Column::Status.ne(PaymentStatus::Paid))
        .exec(&txn)
        .await?;
    if claimed.rows_affected == 0 {
        return Ok(false);
    }

    // Touch the company row first so concurrent orders extend it in turn.
    companies::Entity::update_many()
        .col_expr(companies::Column::UpdatedAt, Expr::value(stamp))
        .filter(companies::Column::Name.eq(log.company_name.as_str()))
        .exec(&txn)
        .await?;
    let company = load_company(&txn, &log.company_name).await?;
    let until = extended_until(&company, log.plan, log.months, now);
    let mut active = company.into_active_model();
    active.plan = Set(log.plan);
    active.seats = Set(log.seats);
    active.active_until = Set(Some(until.into()));
    active.updated_at = Set(stamp);
    active.update(&txn).await?;
    txn.commit().await?;

    info!(company = %log.company_name, order_id, %until, "subscription applied");
    Ok(true)
}

/// Flags a still-open order as failed. Paid logs are left alone.
pub(crate) async fn mark_failed<C: ConnectionTrait>(
    db: &C,
    log: payment_logs::Model,
    payment_id: Option<&str>,
) -> ApiResult<()> {
    let mut update = payment_logs::Entity::update_many()
        .col_expr(
            payment_logs::Column::Status,
            Expr::value(PaymentStatus::Failed.to_value()),
        )
        .col_expr(
            payment_logs::Column::UpdatedAt,
            Expr::value(DateTimeWithTimeZone::from(Utc::now())),
        )
        .filter(payment_logs::Column::Id.eq(log.id))
        .filter(payment_logs::Column::Status.eq(PaymentStatus::Created));
    if let Some(payment_id) = payment_id {
        update = update.col_expr(payment_logs::Column::PaymentId, Expr::value(payment_id));
    }
    update.exec(db).await?;
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyBody {
    order_id: String,
    payment_id: String,
    signature: String,
}

#[instrument(name = "billing.verify", skip_all, fields(company = %user.company_name))]
async fn verify_payment(
    State(state): State<AppState>,
    user: SessionUser,
    Json(body): Json<VerifyBody>,
) -> ApiResult<Json<SubscriptionView>> {
    user.require_employer()?;
    let log = payment_log_by_order(&state.pool, &body.order_id)
        .await?
        .filter(|log| log.company_name == user.company_name)
        .ok_or(ApiError::NotFound)?;

    let valid = verify_payment_signature(
        state.payments.key_secret(),
        &body.order_id,
        &body.payment_id,
        &body.signature,
    );
    if !valid {
        warn!(order_id = %body.order_id, "payment signature mismatch");
        mark_failed(&state.pool, log, Some(&body.payment_id)).await?;
        return Err(ApiError::invalid("payment signature mismatch"));
    }

    if !apply_payment(&state, &body.order_id, &body.payment_id).await? {
        info!(order_id = %body.order_id, "payment already applied");
    }
    Ok(Json(subscription_view(&state, &user.company_name).await?))
}
