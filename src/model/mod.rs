mod member;
mod quarter;
mod roster;
mod window;

pub use member::{Member, Profile};
pub use quarter::Quarter;
pub use roster::{MemberDirectory, RosterStore, TeamRoster};
pub use window::Window;
