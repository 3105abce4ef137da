use chrono::{NaiveDate, NaiveDateTime};

/// Wire format for every timestamp the API emits.
pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses a query-string date. Accepts a full local date-time (fractional seconds allowed)
/// or a bare date, which is read as the start of that day.
pub fn parse_query_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(datetime) = raw.parse::<NaiveDateTime>() {
        return Some(datetime);
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub mod local_format {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    use super::LOCAL_DATETIME_FORMAT;

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(LOCAL_DATETIME_FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_datetime() {
        let parsed = parse_query_datetime("2024-03-01T12:45:10").unwrap();
        assert_eq!(parsed.to_string(), "2024-03-01 12:45:10");
    }

    #[test]
    fn bare_date_is_start_of_day() {
        let parsed = parse_query_datetime("2024-12-31").unwrap();
        assert_eq!(parsed.format(LOCAL_DATETIME_FORMAT).to_string(), "2024-12-31T00:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_query_datetime("31/12/2024").is_none());
        assert!(parse_query_datetime("").is_none());
    }
}
