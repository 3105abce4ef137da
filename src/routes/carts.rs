use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use validator::Validate;

use crate::{
    app_error::{AppError, ErrorResponse},
    app_state::AppState,
    models::{CartItemEntity, OrderEntity},
    money::line_subtotal,
    validation::{ValidatedJson, checked, path_id},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_cart_items))
        .routes(utoipa_axum::routes!(add_cart_item))
        .routes(utoipa_axum::routes!(update_cart_item))
        .routes(utoipa_axum::routes!(delete_cart_item))
        .routes(utoipa_axum::routes!(checkout))
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRes {
    pub id: i64,
    pub order_id: Option<i64>,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub price: f64,
    pub subtotal: f64,
}

impl From<CartItemEntity> for CartItemRes {
    fn from(item: CartItemEntity) -> Self {
        Self {
            subtotal: line_subtotal(item.quantity, item.price),
            id: item.id,
            order_id: item.order_id,
            product_id: item.product_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CartItemReq {
    #[validate(required(message = "Product ID is required"))]
    product_id: Option<i64>,
    #[validate(
        required(message = "Quantity is required"),
        range(min = 1, message = "Quantity must be positive")
    )]
    quantity: Option<i32>,
}

/// Fetch every cart line, including lines already assigned to an order.
#[utoipa::path(
    get,
    path = "/cart/items",
    tags = ["Cart"],
    responses(
        (status = 200, description = "List cart items", body = Vec<CartItemRes>)
    )
)]
async fn get_cart_items(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let items = state.carts().list_cart().await?;
    let items: Vec<CartItemRes> = items.into_iter().map(CartItemRes::from).collect();
    Ok(Json(items))
}

/// Add a product to the cart, snapshotting its current name and price.
#[utoipa::path(
    post,
    path = "/cart/items",
    tags = ["Cart"],
    request_body = CartItemReq,
    responses(
        (status = 201, description = "Cart item added", body = CartItemRes),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse)
    )
)]
async fn add_cart_item(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CartItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let product_id = checked(body.product_id, "productId")?;
    let quantity = checked(body.quantity, "quantity")?;

    let item = state.carts().add_line(product_id, quantity).await?;
    Ok((StatusCode::CREATED, Json(CartItemRes::from(item))))
}

/// Replace the product and quantity of a live cart line.
#[utoipa::path(
    put,
    path = "/cart/items/{id}",
    tags = ["Cart"],
    params(
        ("id" = i64, Path, description = "Cart item ID to update")
    ),
    request_body = CartItemReq,
    responses(
        (status = 200, description = "Cart item updated", body = CartItemRes),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Cart item or product not found", body = ErrorResponse),
        (status = 422, description = "Cart item belongs to an order", body = ErrorResponse)
    )
)]
async fn update_cart_item(
    id: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CartItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(id)?;
    let product_id = checked(body.product_id, "productId")?;
    let quantity = checked(body.quantity, "quantity")?;

    let item = state.carts().update_line(id, product_id, quantity).await?;
    Ok(Json(CartItemRes::from(item)))
}

/// Remove a live cart line.
#[utoipa::path(
    delete,
    path = "/cart/items/{id}",
    tags = ["Cart"],
    params(
        ("id" = i64, Path, description = "Cart item ID to delete")
    ),
    responses(
        (status = 204, description = "Cart item deleted"),
        (status = 404, description = "Cart item not found", body = ErrorResponse),
        (status = 422, description = "Cart item belongs to an order", body = ErrorResponse)
    )
)]
async fn delete_cart_item(
    id: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(id)?;
    state.carts().delete_line(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CheckoutReq {
    #[validate(required(message = "Customer ID is required"))]
    customer_id: Option<i64>,
    customer_name: Option<String>,
}

/// Turn every live cart line into a new order.
#[utoipa::path(
    post,
    path = "/cart/checkout",
    tags = ["Cart"],
    request_body = CheckoutReq,
    responses(
        (status = 201, description = "Order created from the cart", body = OrderEntity),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 422, description = "Cart is empty", body = ErrorResponse)
    )
)]
async fn checkout(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CheckoutReq>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = checked(body.customer_id, "customerId")?;

    let order = state.orders().checkout(customer_id, body.customer_name).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
