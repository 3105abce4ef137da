use chrono::{Local, NaiveDateTime, SubsecRound};

/// Source of order timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock, truncated to the microsecond precision PostgreSQL stores.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(6)
    }
}
