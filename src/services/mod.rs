//! Use-case layer. Each submodule holds one entity's business rules. Payloads are
//! checked through the `Validate` derives on the request models, owners come from the
//! caller's [`Identity`](crate::token::Identity), and partial edits are merged before
//! the calls into the [`Repository`](crate::repository::Repository).
//!
//! Services never see HTTP types and never check ownership themselves; by the time an
//! edit or delete reaches them the ownership policy has already run.

pub mod comments;
pub mod images;
pub mod social_medias;
pub mod users;

/// The new value of a text field in a partial edit, or `None` when the field was
/// absent or carries the value already stored.
pub(crate) fn changed(current: &str, incoming: Option<String>) -> Option<String> {
    incoming.filter(|value| value != current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_values_are_dropped() {
        assert_eq!(changed("a", Some("a".into())), None);
        assert_eq!(changed("a", Some("b".into())), Some("b".into()));
        assert_eq!(changed("a", None), None);
    }
}
