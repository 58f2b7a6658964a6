use serde::{Deserialize, Serialize};

/// Attendance state machine per (shift, user) signup.
///
/// `going` is the only status that counts against capacity. `attended` and
/// `no_show` are terminal bookkeeping states set by attendance actions and
/// never free a seat for waitlist promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupStatus {
    Going,
    Cancelled,
    Attended,
    NoShow,
}

impl SignupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SignupStatus::Going => "going",
            SignupStatus::Cancelled => "cancelled",
            SignupStatus::Attended => "attended",
            SignupStatus::NoShow => "no_show",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "going" => Some(SignupStatus::Going),
            "cancelled" => Some(SignupStatus::Cancelled),
            "attended" => Some(SignupStatus::Attended),
            "no_show" => Some(SignupStatus::NoShow),
            _ => None,
        }
    }
}

/// How an `attended` status was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinMethod {
    Manual,
    Token,
}

impl CheckinMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckinMethod::Manual => "manual",
            CheckinMethod::Token => "token",
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignupRow {
    pub shift_id: String,
    pub user_id: String,
    pub status: String,
    pub checked_in_at: Option<String>,
    pub checkin_method: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
