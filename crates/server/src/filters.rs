//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use crate::db::products::LOW_STOCK_THRESHOLD;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// CSS class for a stock level badge.
///
/// Usage in templates: `{{ product.stock_quantity|stock_class }}`
#[askama::filter_fn]
pub fn stock_class(value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(stock_class_for(&value.to_string()))
}

fn stock_class_for(value: &str) -> &'static str {
    match value.parse::<i32>() {
        Ok(0) => "stock-out",
        Ok(n) if n < LOW_STOCK_THRESHOLD => "stock-low",
        Ok(_) => "stock-ok",
        Err(_) => "stock-unknown",
    }
}
