pub mod checkin_tokens;
pub mod profiles;
pub mod shifts;
pub mod signups;
pub mod waitlist;

pub use checkin_tokens::CheckinTokenRow;
pub use profiles::Role;
pub use shifts::ShiftRow;
pub use signups::{CheckinMethod, SignupRow, SignupStatus};
pub use waitlist::WaitlistEntryRow;
