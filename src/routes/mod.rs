/// Router Module Index
///
/// Splits the HTTP surface by access level. Access control is attached as router
/// layers in these modules, never inside the handlers.

/// Routes open to anonymous clients: health check, registration and login.
pub mod public;

/// Routes behind the authentication gate. The `{id}` edit/delete routes additionally
/// pass the ownership policy for their resource kind.
pub mod authenticated;
