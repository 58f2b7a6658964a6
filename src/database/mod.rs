pub mod checkin_token_repo;
pub mod profile_repo;
pub mod schema;
pub mod shift_repo;
pub mod signup_repo;
pub mod waitlist_repo;
