use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Scorecard Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::tournaments::list_tournaments,
        crate::routes::tournaments::create_tournament,
        crate::routes::tournaments::get_tournament,
        crate::routes::tournaments::rename_tournament,
        crate::routes::tournaments::delete_tournament,
        crate::routes::tournaments::verify_pin,
        crate::routes::tournaments::start_tournament,
        crate::routes::tournaments::close_tournament,
        crate::routes::tournaments::list_players,
        crate::routes::tournaments::register_player,
        crate::routes::tournaments::update_player,
        crate::routes::tournaments::set_dnf,
        crate::routes::tournaments::list_scores,
        crate::routes::tournaments::submit_score,
        crate::routes::tournaments::leaderboard,
        crate::routes::sse::room_stream,
        crate::routes::directory::list_players,
        crate::routes::directory::create_player,
        crate::routes::directory::get_player,
        crate::routes::directory::rename_player,
        crate::routes::directory::delete_player,
        crate::routes::directory::list_history,
        crate::routes::directory::add_history,
        crate::routes::directory::delete_history,
        crate::routes::directory::player_stats,
        crate::routes::directory::merge_players,
        crate::routes::directory::export_directory,
        crate::routes::directory::import_directory,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::ScoreSubmittedEvent,
            crate::dto::sse::LeaderboardEvent,
            crate::dto::sse::PlayerRegisteredEvent,
            crate::dto::sse::PlayerUpdatedEvent,
            crate::dto::sse::TournamentStatusEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "tournaments", description = "Tournament rooms and their lifecycle"),
        (name = "players", description = "Players registered in a room"),
        (name = "scores", description = "Per-hole score sync and leaderboard"),
        (name = "directory", description = "Persistent player directory and statistics"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_room_and_directory_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/tournaments/{code}/scores",
            "/tournaments/{code}/events",
            "/players/{id}/stats",
            "/players/merge",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
