pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{
    companies, connections, evaluations, lists, messaging, notifications, research, trust, users,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Users
        .route("/api/v1/users", post(users::handlers::handle_create_user))
        .route("/api/v1/users/:id", get(users::handlers::handle_get_user))
        .route(
            "/api/v1/users/:id/preferences",
            patch(users::handlers::handle_update_preferences),
        )
        .route(
            "/api/v1/users/:id/evaluations",
            get(evaluations::handlers::handle_received_evaluations),
        )
        .route(
            "/api/v1/users/:id/trust",
            get(trust::handlers::handle_user_trust),
        )
        // Companies
        .route(
            "/api/v1/companies",
            get(companies::handlers::handle_search_companies)
                .post(companies::handlers::handle_create_company),
        )
        .route(
            "/api/v1/companies/:slug",
            get(companies::handlers::handle_get_company)
                .patch(companies::handlers::handle_update_company),
        )
        .route(
            "/api/v1/companies/:slug/history",
            get(companies::handlers::handle_company_history),
        )
        .route(
            "/api/v1/companies/:slug/sources",
            get(companies::handlers::handle_company_sources),
        )
        .route(
            "/api/v1/companies/:slug/evaluations",
            get(evaluations::handlers::handle_company_evaluations),
        )
        .route(
            "/api/v1/companies/:slug/trust",
            get(trust::handlers::handle_company_trust),
        )
        .route(
            "/api/v1/companies/:slug/research/refresh",
            post(research::handlers::handle_refresh_research),
        )
        // Evaluations
        .route(
            "/api/v1/evaluations",
            post(evaluations::handlers::handle_create_evaluation),
        )
        .route(
            "/api/v1/evaluations/:id",
            get(evaluations::handlers::handle_get_evaluation)
                .patch(evaluations::handlers::handle_update_evaluation)
                .delete(evaluations::handlers::handle_delete_evaluation),
        )
        .route(
            "/api/v1/evaluations/:id/like",
            post(evaluations::handlers::handle_toggle_like),
        )
        .route(
            "/api/v1/evaluations/:id/replies",
            post(evaluations::handlers::handle_add_reply),
        )
        // Trust
        .route("/api/v1/rankings", get(trust::handlers::handle_rankings))
        .route("/api/v1/trust-map", get(trust::handlers::handle_trust_map))
        .route(
            "/api/v1/trust-graph",
            get(trust::handlers::handle_trust_graph),
        )
        // Connections
        .route(
            "/api/v1/connections",
            get(connections::handlers::handle_list_connections),
        )
        .route(
            "/api/v1/connections/requests",
            get(connections::handlers::handle_pending_requests)
                .post(connections::handlers::handle_send_request),
        )
        .route(
            "/api/v1/connections/requests/:id/accept",
            post(connections::handlers::handle_accept_request),
        )
        .route(
            "/api/v1/connections/requests/:id/reject",
            post(connections::handlers::handle_reject_request),
        )
        .route(
            "/api/v1/connections/requests/:id/cancel",
            post(connections::handlers::handle_cancel_request),
        )
        .route(
            "/api/v1/connections/:id",
            delete(connections::handlers::handle_remove_connection),
        )
        .route(
            "/api/v1/connections/:id/strength",
            patch(connections::handlers::handle_set_strength),
        )
        .route(
            "/api/v1/connections/:id/block",
            post(connections::handlers::handle_block),
        )
        .route(
            "/api/v1/connections/:id/unblock",
            post(connections::handlers::handle_unblock),
        )
        // Messages
        .route(
            "/api/v1/messages",
            post(messaging::handlers::handle_send_message),
        )
        .route(
            "/api/v1/messages/inbox",
            get(messaging::handlers::handle_inbox),
        )
        .route(
            "/api/v1/messages/sent",
            get(messaging::handlers::handle_sent),
        )
        .route(
            "/api/v1/messages/thread",
            get(messaging::handlers::handle_thread),
        )
        .route(
            "/api/v1/messages/unread-count",
            get(messaging::handlers::handle_unread_count),
        )
        .route(
            "/api/v1/messages/:id/read",
            post(messaging::handlers::handle_mark_message_read),
        )
        // Notifications
        .route(
            "/api/v1/notifications",
            get(notifications::handlers::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::handlers::handle_mark_all_read),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(notifications::handlers::handle_mark_read),
        )
        // Shared lists
        .route(
            "/api/v1/lists",
            get(lists::handlers::handle_owner_lists).post(lists::handlers::handle_create_list),
        )
        .route(
            "/api/v1/lists/:id",
            get(lists::handlers::handle_get_list)
                .patch(lists::handlers::handle_update_list)
                .delete(lists::handlers::handle_delete_list),
        )
        .route(
            "/api/v1/lists/:id/items",
            post(lists::handlers::handle_add_item),
        )
        .route(
            "/api/v1/lists/:id/items/:item_id",
            delete(lists::handlers::handle_remove_item),
        )
        .with_state(state)
}
