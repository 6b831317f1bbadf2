//! API helpers and endpoints next to the redirect itself

pub use health::health;
pub use request::PathParameters;
pub use request::QueryParameters;
pub use response::Error;
pub use response::Success;

mod health;
mod request;
mod response;
