//! Business logic for the account lifecycle, plus the collaborators it
//! depends on (store, mailer, token signing).

pub mod auth;
pub mod email;
pub mod error;
pub mod jwt;
pub mod store;

pub use auth::{AuthService, Registration, Session};
pub use email::{
    EmailError, EmailProvider, LogEmailProvider, MockEmailProvider, SmtpEmailProvider,
};
pub use error::ServiceError;
pub use jwt::{Claims, TokenError, TokenExpiry, TokenService};
pub use store::{AccountStore, InMemoryAccountStore, PgAccountStore, StoreError};
