pub mod account;
pub mod organization;
pub mod role;

pub use account::{Account, SanitizedAccount};
pub use organization::Organization;
pub use role::{AccountStatus, Role};
