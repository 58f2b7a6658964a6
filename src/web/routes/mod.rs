pub mod checkin;
pub mod shifts;
