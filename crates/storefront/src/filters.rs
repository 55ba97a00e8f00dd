//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year, for the footer.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css, computed by `build.rs`.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// CSS class for an order status badge.
///
/// Usage in templates: `<span class="badge {{ order.status|status_class }}">`
#[askama::filter_fn]
pub fn status_class(status: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(status_class_for(&status.to_string()))
}

/// `status-` followed by the label in lowercase with dashes, `status-en-proceso`.
#[must_use]
pub fn status_class_for(label: &str) -> String {
    let slug = label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!("status-{slug}")
}
