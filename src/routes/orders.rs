use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use validator::Validate;

use crate::{
    app_error::{AppError, ErrorResponse},
    app_state::AppState,
    datetime::parse_query_datetime,
    models::{OrderEntity, OrderStatus},
    pagination::{DEFAULT_PAGE_SIZE, OrderFilter, Page, PageRequest, Sort},
    validation::{ValidatedJson, checked, path_id},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_orders))
        .routes(utoipa_axum::routes!(create_order))
        .routes(utoipa_axum::routes!(get_order))
        .routes(utoipa_axum::routes!(update_order_status))
        .routes(utoipa_axum::routes!(cancel_order))
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PageRes<T> {
    pub content: Vec<T>,
    pub number: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> From<Page<T>> for PageRes<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            content: page.items,
            number: page.page_index,
            size: page.page_size,
            total_elements: page.total_items,
            total_pages: page.total_pages,
        }
    }
}

#[derive(Deserialize, IntoParams, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
struct ListOrdersParams {
    /// Only orders with exactly this status.
    #[param(value_type = Option<OrderStatus>)]
    status: Option<String>,
    /// Inclusive lower bound, `yyyy-MM-ddTHH:mm:ss` or `yyyy-MM-dd`.
    start_date: Option<String>,
    /// Inclusive upper bound, `yyyy-MM-ddTHH:mm:ss` or `yyyy-MM-dd`.
    end_date: Option<String>,
    /// Zero-based page index.
    #[param(value_type = Option<i64>)]
    page: Option<String>,
    /// Page size.
    #[param(value_type = Option<i64>)]
    size: Option<String>,
    /// `field[,asc|desc]`, e.g. `orderDate,desc`.
    sort: Option<String>,
}

/// Parses one optional query value, recording a `field: reason` line on failure.
fn parse_param<T>(
    raw: Option<String>,
    field: &str,
    errors: &mut Vec<String>,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Option<T> {
    let raw = raw.filter(|raw| !raw.trim().is_empty())?;
    match parse(raw.trim()) {
        Ok(value) => Some(value),
        Err(reason) => {
            errors.push(format!("{}: {}", field, reason));
            None
        }
    }
}

impl ListOrdersParams {
    fn into_query(self) -> Result<(OrderFilter, PageRequest), AppError> {
        let mut errors = Vec::new();

        let status = parse_param(self.status, "status", &mut errors, |raw| {
            raw.parse::<OrderStatus>()
        });
        let date = |raw: &str| {
            parse_query_datetime(raw).ok_or_else(|| {
                format!("invalid date '{raw}', expected yyyy-MM-dd or yyyy-MM-ddTHH:mm:ss")
            })
        };
        let start_date = parse_param(self.start_date, "startDate", &mut errors, date);
        let end_date = parse_param(self.end_date, "endDate", &mut errors, date);
        let number = |raw: &str| {
            raw.parse::<i64>()
                .map_err(|_| format!("'{raw}' is not a whole number"))
        };
        let index = parse_param(self.page, "page", &mut errors, number).unwrap_or(0);
        let size =
            parse_param(self.size, "size", &mut errors, number).unwrap_or(DEFAULT_PAGE_SIZE);
        let sort = match self.sort.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => match Sort::parse(&raw) {
                Ok(sort) => sort,
                Err(AppError::Validation(sort_errors)) => {
                    errors.extend(sort_errors);
                    Sort::default()
                }
                Err(err) => return Err(err),
            },
            None => Sort::default(),
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let filter = OrderFilter::new(status, start_date, end_date)?;
        let page = PageRequest::new(index, size, sort)?;
        Ok((filter, page))
    }
}

/// Fetch a page of orders, optionally filtered by status and order date.
#[utoipa::path(
    get,
    path = "/orders",
    tags = ["Orders"],
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Page of orders", body = PageRes<OrderEntity>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) =
        params.map_err(|rejection| AppError::validation("query", rejection.body_text()))?;
    let (filter, page) = params.into_query()?;

    let orders = state.orders().list_orders(&filter, &page).await?;
    Ok(Json(PageRes::from(orders)))
}

#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreateOrderReq {
    #[validate(required(message = "Customer ID is required"))]
    customer_id: Option<i64>,
    customer_name: Option<String>,
    #[validate(
        required(message = "Total amount is required"),
        range(exclusive_min = 0.0, message = "Total amount must be positive")
    )]
    total_amount: Option<f64>,
}

/// Create a new order in status CREATED.
#[utoipa::path(
    post,
    path = "/orders",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Created order successfully", body = OrderEntity),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let customer_id = checked(body.customer_id, "customerId")?;
    let total_amount = checked(body.total_amount, "totalAmount")?;

    let order = state
        .orders()
        .create_order(customer_id, body.customer_name, total_amount)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Fetch a specific order.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tags = ["Orders"],
    params(
        ("id" = i64, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = OrderEntity),
        (status = 404, description = "Order not found", body = ErrorResponse)
    )
)]
async fn get_order(
    id: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(id)?;
    let order = state.orders().get_order(id).await?;
    Ok(Json(order))
}

#[derive(Deserialize, Validate, ToSchema)]
struct UpdateOrderStatusReq {
    #[validate(required(message = "Status is required"))]
    status: Option<OrderStatus>,
}

/// Move an order along its lifecycle.
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    tags = ["Orders"],
    params(
        ("id" = i64, Path, description = "Order ID to update")
    ),
    request_body = UpdateOrderStatusReq,
    responses(
        (status = 200, description = "Order status updated", body = OrderEntity),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 422, description = "Illegal status transition", body = ErrorResponse)
    )
)]
async fn update_order_status(
    id: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<UpdateOrderStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(id)?;
    let status = checked(body.status, "status")?;

    let order = state.orders().update_order_status(id, status).await?;
    Ok(Json(order))
}

/// Cancel an order that has not been delivered or cancelled yet.
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    tags = ["Orders"],
    params(
        ("id" = i64, Path, description = "Order ID to cancel")
    ),
    responses(
        (status = 200, description = "Cancelled order successfully", body = OrderEntity),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 422, description = "Order can no longer be cancelled", body = ErrorResponse)
    )
)]
async fn cancel_order(
    id: Result<Path<i64>, PathRejection>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(id)?;
    let order = state.orders().cancel_order(id).await?;
    Ok(Json(order))
}
