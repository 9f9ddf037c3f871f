/// Authorization gate
///
/// A caller may act on a business's websites when it is the business
/// itself or a `member` profile attached to that business.
use std::sync::Arc;

use crate::db::ProfileDirectory;
use crate::error::{AppError, Result};
use crate::models::{Role, UserProfile};

pub struct AuthorizationGate {
    profiles: Arc<dyn ProfileDirectory>,
}

impl AuthorizationGate {
    pub fn new(profiles: Arc<dyn ProfileDirectory>) -> Self {
        Self { profiles }
    }

    pub async fn authorize(&self, caller: &str, business_id: &str) -> Result<()> {
        if caller == business_id {
            return Ok(());
        }

        let profile = match self.profiles.find_profile(caller).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(caller, business_id, "Profile lookup failed, denying: {}", e);
                None
            }
        };

        if profile.as_ref().is_some_and(|p| is_member_of(p, business_id)) {
            return Ok(());
        }

        tracing::info!(caller, business_id, "Denied access to business websites");
        Err(AppError::Forbidden(
            "Caller may not manage this business's websites".to_string(),
        ))
    }
}

fn is_member_of(profile: &UserProfile, business_id: &str) -> bool {
    profile.role == Role::Member && profile.business_id.as_deref() == Some(business_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role, business_id: Option<&str>) -> UserProfile {
        UserProfile {
            uid: "u1".into(),
            role,
            business_id: business_id.map(String::from),
        }
    }

    #[test]
    fn test_membership_requires_role_and_business() {
        assert!(is_member_of(&profile(Role::Member, Some("b1")), "b1"));
        assert!(!is_member_of(&profile(Role::Member, Some("b2")), "b1"));
        assert!(!is_member_of(&profile(Role::Customer, Some("b1")), "b1"));
        assert!(!is_member_of(&profile(Role::Member, None), "b1"));
    }
}
