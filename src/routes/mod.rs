use axum::Router;
use utoipa::openapi::{InfoBuilder, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::app_state::AppState;

pub mod carts;
pub mod orders;

pub const SWAGGER_UI_PATH: &str = "/swagger-ui";
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

/// Every API route, mounted under `/api`.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/api",
        carts::routes_with_openapi().merge(orders::routes_with_openapi()),
    )
}

pub fn swagger_ui(openapi: OpenApi) -> SwaggerUi {
    SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_JSON_PATH, openapi)
}

/// Assembles the full application: API routes plus the Swagger UI serving their document.
pub fn build_router(state: AppState) -> Router {
    let (router, mut openapi) = routes_with_openapi().split_for_parts();
    openapi.info = InfoBuilder::new()
        .title("Back-office OrderService API")
        .version("1.0.0")
        .build();

    router.merge(swagger_ui(openapi)).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let (_, openapi) = routes_with_openapi().split_for_parts();
        let paths: Vec<&str> = openapi.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/cart/items",
            "/api/cart/items/{id}",
            "/api/cart/checkout",
            "/api/orders",
            "/api/orders/{id}",
            "/api/orders/{id}/status",
            "/api/orders/{id}/cancel",
        ] {
            assert!(paths.contains(&expected), "missing {expected} in {paths:?}");
        }
    }
}
