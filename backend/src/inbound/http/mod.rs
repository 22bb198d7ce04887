//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod characters;
pub mod error;
pub mod films;
pub mod health;
pub mod paging;
pub mod starships;
pub mod state;
pub mod sync;
mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register the `/api/v1` endpoints on a scope or app.
///
/// Search routes are registered ahead of the `{id}` routes so `search` is
/// never parsed as an identifier.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use starwars_rest::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(error::json_config())
        .app_data(error::query_config())
        .app_data(error::path_config())
        .service(films::search_films)
        .service(films::list_films)
        .service(films::create_film)
        .service(films::get_film)
        .service(films::replace_film)
        .service(films::patch_film)
        .service(films::delete_film)
        .service(characters::search_characters)
        .service(characters::list_characters)
        .service(characters::create_character)
        .service(characters::get_character)
        .service(characters::replace_character)
        .service(characters::patch_character)
        .service(characters::delete_character)
        .service(starships::search_starships)
        .service(starships::list_starships)
        .service(starships::create_starship)
        .service(starships::get_starship)
        .service(starships::replace_starship)
        .service(starships::patch_starship)
        .service(starships::delete_starship)
        .service(sync::trigger_sync)
        .service(sync::sync_status);
}
