/// `Node / ssh_key / cloud_credential / cloud_provision view/manage` and
/// `Deployment view/manage/delete`: owning user only. Every one of those
/// rules reduces to the same comparison, so there is one function instead
/// of one per resource.
pub fn is_owner(caller_id: Option<i64>, owner_id: Option<i64>) -> bool {
    match (caller_id, owner_id) {
        (Some(caller), Some(owner)) => caller == owner,
        _ => false,
    }
}

/// `Template view`: anyone if published, otherwise creator only.
pub fn can_view_template(caller_id: Option<i64>, creator_id: Option<i64>, published: bool) -> bool {
    published || is_owner(caller_id, creator_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_match_requires_both_present_and_equal() {
        assert!(is_owner(Some(1), Some(1)));
        assert!(!is_owner(Some(1), Some(2)));
        assert!(!is_owner(None, Some(1)));
        assert!(!is_owner(Some(1), None));
    }

    #[test]
    fn published_templates_are_visible_to_anyone() {
        assert!(can_view_template(None, Some(1), true));
        assert!(can_view_template(Some(999), Some(1), true));
    }

    #[test]
    fn unpublished_templates_are_creator_only() {
        assert!(!can_view_template(None, Some(1), false));
        assert!(!can_view_template(Some(2), Some(1), false));
        assert!(can_view_template(Some(1), Some(1), false));
    }
}
