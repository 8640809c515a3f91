mod attendance;
mod content;
mod fee;
mod notice;
mod result;
mod staff;
mod student;

pub use attendance::*;
pub use content::*;
pub use fee::*;
pub use notice::*;
pub use result::*;
pub use staff::*;
pub use student::*;

use chrono::{DateTime, NaiveDateTime, Utc};

pub(crate) fn utc_or_now(dt: Option<NaiveDateTime>) -> DateTime<Utc> {
    dt.map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        .unwrap_or_else(Utc::now)
}

pub(crate) fn utc(dt: Option<NaiveDateTime>) -> Option<DateTime<Utc>> {
    dt.map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
}
