//! This file defines the statistics route and the pure aggregation functions
//! it is built from: summary totals, per-category breakdowns and the monthly
//! series, plus the derived views used for charts.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    app_state::TransactionState,
    models::{Transaction, TransactionType, User},
    stores::{TransactionQuery, TransactionStore},
};

/// How many categories the top-categories view keeps.
pub const TOP_CATEGORY_COUNT: usize = 5;

/// Aggregate totals over a set of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all income amounts.
    pub total_income: f64,
    /// The sum of all expense amounts.
    pub total_expense: f64,
    /// `total_income - total_expense`.
    pub net_balance: f64,
}

/// Per-category income and expense subtotals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// The category label.
    pub category: String,
    /// The sum of this category's income amounts.
    pub income: f64,
    /// The sum of this category's expense amounts.
    pub expense: f64,
    /// `income + expense`, the category's overall activity.
    pub total: f64,
}

/// Per-calendar-month income, expense and balance subtotals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// The month key in `YYYY-MM` format.
    pub month: String,
    /// The sum of this month's income amounts.
    pub income: f64,
    /// The sum of this month's expense amounts.
    pub expense: f64,
    /// `income - expense`.
    pub balance: f64,
}

/// A month/balance point of the balance trend view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// The month key in `YYYY-MM` format.
    pub month: String,
    /// The month's balance.
    pub balance: f64,
}

/// The payload of the statistics route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Aggregate totals over the (date filtered) transaction set.
    pub summary: Summary,
    /// Per-category subtotals, one entry per observed category.
    pub category_data: Vec<CategorySummary>,
    /// Per-month subtotals in chronological order.
    pub monthly_data: Vec<MonthlySummary>,
    /// The categories with the most activity, largest first.
    pub top_categories: Vec<CategorySummary>,
    /// The month-by-month balance, in chronological order.
    pub balance_trend: Vec<TrendPoint>,
}

/// Sum the income and expense amounts of `transactions`.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut total_income = 0.0;
    let mut total_expense = 0.0;

    for transaction in transactions {
        match transaction.transaction_type() {
            TransactionType::Income => total_income += transaction.amount(),
            TransactionType::Expense => total_expense += transaction.amount(),
        }
    }

    Summary {
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
    }
}

/// Group `transactions` by category label and sum each side.
///
/// A category whose transactions are all of one type reports zero for the
/// other type rather than omitting it. The output is sorted by category label,
/// making the result independent of the order transactions were fetched in.
pub fn category_breakdown(transactions: &[Transaction]) -> Vec<CategorySummary> {
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let entry = totals.entry(transaction.category()).or_insert((0.0, 0.0));
        match transaction.transaction_type() {
            TransactionType::Income => entry.0 += transaction.amount(),
            TransactionType::Expense => entry.1 += transaction.amount(),
        }
    }

    totals
        .into_iter()
        .map(|(category, (income, expense))| CategorySummary {
            category: category.to_string(),
            income,
            expense,
            total: income + expense,
        })
        .collect()
}

/// The `YYYY-MM` grouping key for a transaction date.
///
/// The key uses the date's own year and month; no timezone normalization is
/// performed.
fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Group `transactions` by calendar month and sum each side.
///
/// The output is sorted ascending by the `YYYY-MM` key, which for this format
/// is chronological order. A month whose transactions are all of one type
/// reports zero for the other type.
pub fn monthly_series(transactions: &[Transaction]) -> Vec<MonthlySummary> {
    let mut totals: BTreeMap<String, (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let entry = totals
            .entry(month_key(transaction.date()))
            .or_insert((0.0, 0.0));
        match transaction.transaction_type() {
            TransactionType::Income => entry.0 += transaction.amount(),
            TransactionType::Expense => entry.1 += transaction.amount(),
        }
    }

    totals
        .into_iter()
        .map(|(month, (income, expense))| MonthlySummary {
            month,
            income,
            expense,
            balance: income - expense,
        })
        .collect()
}

/// The `count` categories with the largest `total`, descending.
///
/// Ties are broken by category label so the output is deterministic.
pub fn top_categories(breakdown: &[CategorySummary], count: usize) -> Vec<CategorySummary> {
    let mut sorted = breakdown.to_vec();
    sorted.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    sorted.truncate(count);

    sorted
}

/// Project the monthly series down to its month/balance pairs.
pub fn balance_trend(monthly_data: &[MonthlySummary]) -> Vec<TrendPoint> {
    monthly_data
        .iter()
        .map(|summary| TrendPoint {
            month: summary.month.clone(),
            balance: summary.balance,
        })
        .collect()
}

/// The query parameters accepted by the statistics route.
///
/// Both bounds are inclusive and independently optional. The client sends
/// empty strings for unset bounds, so they are taken as strings and parsed
/// explicitly.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsParams {
    /// Include transactions on or after this date (`YYYY-MM-DD`).
    pub start_date: Option<String>,
    /// Include transactions on or before this date (`YYYY-MM-DD`).
    pub end_date: Option<String>,
}

fn parse_date_param(param: Option<String>) -> Result<Option<NaiveDate>, Error> {
    match param.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(|_| Error::InvalidDateFormat(text.to_string())),
    }
}

/// A route handler for computing aggregate statistics over the authenticated
/// user's transactions, optionally restricted to an inclusive date range.
///
/// The aggregation is a pure function of the fetched transaction set: the same
/// set and range always produce the same payload.
///
/// # Errors
/// Returns an [Error::InvalidDateFormat] if a date parameter is present,
/// non-empty and not a `YYYY-MM-DD` date.
pub async fn get_stats_endpoint<T>(
    State(state): State<TransactionState<T>>,
    Extension(user): Extension<User>,
    Query(params): Query<StatsParams>,
) -> Result<Json<StatsResponse>, Error>
where
    T: TransactionStore + Clone + Send + Sync,
{
    let start_date = parse_date_param(params.start_date)?;
    let end_date = parse_date_param(params.end_date)?;

    let transactions = state.transaction_store.get_by_user(
        user.id(),
        TransactionQuery {
            start_date,
            end_date,
            sort_date: None,
        },
    )?;

    let summary = summarize(&transactions);
    let category_data = category_breakdown(&transactions);
    let monthly_data = monthly_series(&transactions);
    let top_categories = top_categories(&category_data, TOP_CATEGORY_COUNT);
    let balance_trend = balance_trend(&monthly_data);

    Ok(Json(StatsResponse {
        summary,
        category_data,
        monthly_data,
        top_categories,
        balance_trend,
    }))
}
