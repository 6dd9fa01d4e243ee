mod form;
mod id;
mod request;
mod response;

pub use form::*;
pub use id::*;
pub use request::*;
pub use response::*;
