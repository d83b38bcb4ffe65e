// Service-account authentication

pub mod service_account;
pub mod token;

pub use service_account::*;
pub use token::*;
