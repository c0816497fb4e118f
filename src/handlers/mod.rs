//! HTTP handlers, one submodule per resource. Each handler unpacks the request,
//! hands it to the matching service with the caller's identity and wraps the result
//! in the response envelope. Ownership of `{id}` routes is checked by the policy
//! layer before any of these run.

pub mod comments;
pub mod images;
pub mod social_medias;
pub mod users;

pub use comments::*;
pub use images::*;
pub use social_medias::*;
pub use users::*;
