use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use diesel::{
    AsChangeset, AsExpression, FromSqlRow, Selectable,
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    prelude::{Identifiable, Insertable, Queryable},
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::datetime;

// Order status

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
    ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Created,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Created,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{s}'"))
    }
}

impl ToSql<Text, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for OrderStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        Ok(raw.parse()?)
    }
}

// Catalog

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::products)]
pub struct CreateProductEntity {
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

// Cart items

/// A cart line. Live while `order_id` is `None`, frozen once checkout assigns it to an order.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemEntity {
    pub id: i64,
    pub order_id: Option<i64>,
    pub product_id: i64,
    pub product_name: String,
    pub price: f64,
    pub quantity: i32,
}

impl CartItemEntity {
    pub fn is_frozen(&self) -> bool {
        self.order_id.is_some()
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateCartItemEntity {
    pub product_id: i64,
    pub product_name: String,
    pub price: f64,
    pub quantity: i32,
}

/// Fresh product snapshot plus quantity written over a live cart line.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateCartItemEntity {
    pub product_id: i64,
    pub product_name: String,
    pub price: f64,
    pub quantity: i32,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct OrderEntity {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    #[serde(with = "datetime::local_format")]
    #[schema(value_type = String, example = "2024-01-15T10:30:00")]
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
    pub total_amount: f64,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub order_date: NaiveDateTime,
    pub status: OrderStatus,
    pub total_amount: f64,
}
