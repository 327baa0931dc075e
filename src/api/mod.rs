//! Gateway API implementation

mod auth;
mod errors;
mod event;
pub mod handlers;

pub use auth::{PASSWORD_TAG, USERNAME_TAG};
pub use errors::GatewayError;
pub use event::{GatewayEvent, GatewayResponse, PathParameters};
pub use handlers::Gateway;
