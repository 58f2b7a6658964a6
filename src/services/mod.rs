pub mod attendance_service;
pub mod capacity_service;
pub mod checkin_service;

#[cfg(test)]
pub(crate) mod test_support;

use chrono::{SecondsFormat, Utc};

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
