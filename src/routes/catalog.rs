use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch},
};

/// Catalog Router Module
///
/// Categories and their menus. GET endpoints are open to anonymous clients.
/// POST, PATCH and DELETE handlers take an `Owner` argument, which answers 401
/// without a valid session and 400 for accounts that are not `OWNER`.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        // GET /categories lists by descending order.
        // POST /categories appends a category at max(order) + 1.
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        // PATCH swaps `order` with the category currently holding the requested value.
        .route(
            "/categories/{categoryId}",
            patch(handlers::update_category).delete(handlers::delete_category),
        )
        .route(
            "/categories/{categoryId}/menus",
            get(handlers::list_menus).post(handlers::create_menu),
        )
        .route(
            "/categories/{categoryId}/menus/{menuId}",
            get(handlers::get_menu)
                .patch(handlers::update_menu)
                .delete(handlers::delete_menu),
        )
}

