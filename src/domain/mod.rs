mod access;
mod attendance;
mod group;
mod money;
mod month;
mod payment;
mod payout;
mod person;
mod schedule;

pub use access::*;
pub use attendance::*;
pub use group::*;
pub use money::*;
pub use month::*;
pub use payment::*;
pub use payout::*;
pub use person::*;
pub use schedule::*;
