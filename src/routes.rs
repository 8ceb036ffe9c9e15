use axum::{
    routing::{get, post},
    Router,
};

use crate::{auth, billing, customers, dashboard, kasbons, orders, payments, report};

pub fn api_routes() -> Router {
    Router::new()
        .route("/api/register", post(auth::register_user))
        .route("/api/login", post(auth::login_user))
        .route("/api/logout", post(auth::logout_user))
        .route("/api/me", get(auth::current_user))
        .merge(dashboard::routes())
        .merge(billing::api::routes())
        .merge(report::routes())
        .merge(customers::routes())
        .merge(orders::routes())
        .merge(kasbons::routes())
        .merge(payments::routes())
}
