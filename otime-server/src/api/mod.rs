pub mod error;
pub mod routes;
pub mod state;
pub mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        // WebSockets
        .route("/ws/cardreader", get(ws::cardreader_handler))
        .route("/ws/updates", get(ws::updates_handler))
        // Events
        .route(
            "/api/events",
            get(routes::events::list).post(routes::events::create),
        )
        .route(
            "/api/events/{id}",
            get(routes::events::get)
                .put(routes::events::update)
                .delete(routes::events::delete),
        )
        .route("/api/events/{id}/results", get(routes::events::class_results))
        // Courses
        .route(
            "/api/events/{event_id}/courses",
            get(routes::courses::list).post(routes::courses::create),
        )
        .route(
            "/api/events/{event_id}/courses/{id}",
            axum::routing::put(routes::courses::update).delete(routes::courses::delete),
        )
        // Classes
        .route(
            "/api/events/{event_id}/classes",
            get(routes::classes::list).post(routes::classes::create),
        )
        .route(
            "/api/events/{event_id}/classes/{id}",
            axum::routing::put(routes::classes::update).delete(routes::classes::delete),
        )
        // Clubs
        .route(
            "/api/clubs",
            get(routes::clubs::list).post(routes::clubs::create),
        )
        .route(
            "/api/clubs/{id}",
            axum::routing::put(routes::clubs::update).delete(routes::clubs::delete),
        )
        // Competitors
        .route(
            "/api/competitors",
            get(routes::competitors::list).post(routes::competitors::create),
        )
        .route(
            "/api/competitors/{id}",
            axum::routing::put(routes::competitors::update).delete(routes::competitors::delete),
        )
        // Entries
        .route(
            "/api/events/{event_id}/entries",
            get(routes::entries::list),
        )
        .route("/api/entries", post(routes::entries::upsert))
        .route(
            "/api/entries/{id}",
            get(routes::entries::get).delete(routes::entries::delete),
        )
        .route("/api/entries/{id}/result", post(routes::entries::edit_result))
        .route(
            "/api/events/{event_id}/entries/import",
            post(routes::entries::import),
        )
        .route(
            "/api/events/{event_id}/entries/export",
            get(routes::entries::export),
        )
        // Series
        .route("/api/series", get(routes::series::standing))
        .route(
            "/api/series/settings",
            get(routes::series::get_settings).put(routes::series::put_settings),
        )
        // Card reader batch replay + name assignment
        .route("/api/cardreader/log", post(routes::cardreader::replay_log))
        .route(
            "/api/cardreader/assign-name",
            post(routes::cardreader::assign_name),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
