mod cookie;
pub mod password;
pub mod registration;
pub mod session;
pub mod verification;

pub use password::{confirm_password_reset, request_password_reset};
pub use registration::{register_organization, register_owner, register_player};
pub use session::{login, logout};
pub use verification::verify_email;
