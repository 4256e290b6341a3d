use uuid::Uuid;

use crate::models::shared_list::Visibility;

/// Whether `viewer` may see a list owned by `owner`.
/// `viewer_is_connection` means the two share an active connection.
pub fn can_view(
    visibility: Visibility,
    owner: Uuid,
    viewer: Option<Uuid>,
    viewer_is_connection: bool,
) -> bool {
    if viewer == Some(owner) {
        return true;
    }
    match visibility {
        Visibility::Public => true,
        Visibility::Connections => viewer.is_some() && viewer_is_connection,
        Visibility::Private => false,
    }
}

/// Only the owner's own lookups skip the view counter.
pub fn counts_as_view(owner: Uuid, viewer: Option<Uuid>) -> bool {
    matches!(viewer, Some(v) if v != owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_sees_everything() {
        let owner = Uuid::new_v4();
        for visibility in [Visibility::Private, Visibility::Connections, Visibility::Public] {
            assert!(can_view(visibility, owner, Some(owner), false));
        }
    }

    #[test]
    fn test_private_hidden_from_others() {
        let owner = Uuid::new_v4();
        assert!(!can_view(Visibility::Private, owner, Some(Uuid::new_v4()), true));
        assert!(!can_view(Visibility::Private, owner, None, false));
    }

    #[test]
    fn test_connections_only() {
        let owner = Uuid::new_v4();
        let friend = Uuid::new_v4();
        assert!(can_view(Visibility::Connections, owner, Some(friend), true));
        assert!(!can_view(Visibility::Connections, owner, Some(friend), false));
        assert!(!can_view(Visibility::Connections, owner, None, false));
    }

    #[test]
    fn test_public_visible_to_anonymous() {
        assert!(can_view(Visibility::Public, Uuid::new_v4(), None, false));
    }

    #[test]
    fn test_counts_as_view() {
        let owner = Uuid::new_v4();
        assert!(!counts_as_view(owner, Some(owner)));
        assert!(!counts_as_view(owner, None));
        assert!(counts_as_view(owner, Some(Uuid::new_v4())));
    }
}
