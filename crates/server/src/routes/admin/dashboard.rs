//! Admin dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};

use crate::db::{DashboardCounts, DashboardRepository, OrderRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminPage;
use crate::models::CustomerOrder;
use crate::state::AppState;

/// Orders shown in the recent activity panel.
const RECENT_ORDER_LIMIT: i64 = 5;

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub username: String,
    pub counts: DashboardCounts,
    pub recent_orders: Vec<CustomerOrder>,
}

/// HTMX fragment polled by the dashboard.
#[derive(Template, WebTemplate)]
#[template(path = "admin/partials/recent_activity.html")]
pub struct RecentActivityTemplate {
    pub recent_orders: Vec<CustomerOrder>,
}

/// `GET /admin/dashboard`
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdminPage(admin): RequireAdminPage,
) -> Result<impl IntoResponse> {
    let counts = DashboardRepository::new(state.pool()).counts().await?;
    let recent_orders = OrderRepository::new(state.pool())
        .list_with_customers(RECENT_ORDER_LIMIT)
        .await?;

    Ok(DashboardTemplate {
        username: admin.username,
        counts,
        recent_orders,
    })
}

/// `GET /admin/recent-activity`
pub async fn recent_activity(
    State(state): State<AppState>,
    RequireAdminPage(_): RequireAdminPage,
) -> Result<impl IntoResponse> {
    let recent_orders = OrderRepository::new(state.pool())
        .list_with_customers(RECENT_ORDER_LIMIT)
        .await?;

    Ok(RecentActivityTemplate { recent_orders })
}
