use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::{app_error::AppError, models::OrderStatus};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Order attributes a listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSortField {
    #[default]
    Id,
    CustomerId,
    CustomerName,
    OrderDate,
    Status,
    TotalAmount,
}

impl FromStr for OrderSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(OrderSortField::Id),
            "customerId" | "customer_id" => Ok(OrderSortField::CustomerId),
            "customerName" | "customer_name" => Ok(OrderSortField::CustomerName),
            "orderDate" | "order_date" => Ok(OrderSortField::OrderDate),
            "status" => Ok(OrderSortField::Status),
            "totalAmount" | "total_amount" => Ok(OrderSortField::TotalAmount),
            other => Err(format!("unknown sort property '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: OrderSortField,
    pub direction: SortDirection,
}

impl Sort {
    /// Parses `field[,asc|desc]`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let mut parts = raw.split(',').map(str::trim);
        let field = parts
            .next()
            .filter(|field| !field.is_empty())
            .unwrap_or("id")
            .parse::<OrderSortField>()
            .map_err(|reason| AppError::validation("sort", reason))?;

        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(AppError::validation(
                    "sort",
                    format!("unknown sort direction '{other}'"),
                ));
            }
        };

        if parts.next().is_some() {
            return Err(AppError::validation("sort", "expected field[,asc|desc]"));
        }

        Ok(Sort { field, direction })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: i64,
    pub size: i64,
    pub sort: Sort,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            index: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }
}

impl PageRequest {
    pub fn new(index: i64, size: i64, sort: Sort) -> Result<Self, AppError> {
        let mut errors = Vec::new();
        if index < 0 {
            errors.push("page: must be greater than or equal to 0".to_string());
        }
        if size <= 0 {
            errors.push("size: must be greater than 0".to_string());
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(Self { index, size, sort })
    }

    pub fn offset(&self) -> i64 {
        self.index.saturating_mul(self.size)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
}

impl OrderFilter {
    pub fn new(
        status: Option<OrderStatus>,
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
    ) -> Result<Self, AppError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(AppError::validation(
                    "startDate",
                    "must not be after endDate",
                ));
            }
        }
        Ok(Self {
            status,
            start_date,
            end_date,
        })
    }

    pub fn matches(&self, status: OrderStatus, order_date: NaiveDateTime) -> bool {
        self.status.is_none_or(|wanted| wanted == status)
            && self.start_date.is_none_or(|start| order_date >= start)
            && self.end_date.is_none_or(|end| order_date <= end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_index: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: &PageRequest, total_items: i64) -> Self {
        let total_pages = total_items / request.size + i64::from(total_items % request.size != 0);
        Self {
            items,
            page_index: request.index,
            page_size: request.size,
            total_items,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_defaults_to_ascending() {
        let sort = Sort::parse("orderDate").unwrap();
        assert_eq!(sort.field, OrderSortField::OrderDate);
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn sort_reads_direction_case_insensitively() {
        let sort = Sort::parse("totalAmount,DESC").unwrap();
        assert_eq!(sort.field, OrderSortField::TotalAmount);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn unknown_sort_field_is_a_validation_error() {
        let err = Sort::parse("price,asc").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref errors) if errors[0].starts_with("sort:")));
    }

    #[test]
    fn page_request_rejects_negative_index_and_zero_size() {
        let AppError::Validation(errors) = PageRequest::new(-1, 0, Sort::default()).unwrap_err()
        else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(0, 2, Sort::default()).unwrap();
        assert_eq!(Page::<()>::new(vec![], &request, 5).total_pages, 3);
        assert_eq!(Page::<()>::new(vec![], &request, 4).total_pages, 2);
        assert_eq!(Page::<()>::new(vec![], &request, 0).total_pages, 0);
    }

    #[test]
    fn largest_page_size_counts_a_single_page() {
        let request = PageRequest::new(3, i64::MAX, Sort::default()).unwrap();
        assert_eq!(request.offset(), i64::MAX);
        assert_eq!(Page::<()>::new(vec![], &request, 2).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], &request, 0).total_pages, 0);
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0);
        let end = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0);
        assert!(OrderFilter::new(None, start, end).is_err());
        assert!(OrderFilter::new(None, end, start).is_ok());
        assert!(OrderFilter::new(None, start, None).is_ok());
    }
}
