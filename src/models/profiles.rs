/// Role carried by the identity provider alongside the user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    /// Unknown or missing role strings fall back to the least-privileged role.
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            _ => Role::User,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admins and moderators may mark attendance and force-cancel signups.
    pub fn can_manage_attendance(self) -> bool {
        matches!(self, Role::Admin | Role::Moderator)
    }
}
