pub mod factory;
pub mod login;
pub mod principal;
pub mod token;

pub use factory::{build_login_service, build_token_service};
pub use login::LoginService;
pub use principal::{CredentialFailure, Principal, SecurityContext};
pub use token::{Claims, IssuedToken, TokenError, TokenService};
