/// Who is asking, as far as the workflows need to know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub display_name: String,
    /// Membership in the editor role, looked up by the chat layer.
    pub holds_role: bool,
}

/// Edit permission: the administrator, or anyone holding the editor role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    admin_id: i64,
}

impl Access {
    pub fn new(admin_id: i64) -> Self {
        Self { admin_id }
    }

    pub fn is_admin(&self, caller: &Caller) -> bool {
        caller.id == self.admin_id
    }

    pub fn permits(&self, caller: &Caller) -> bool {
        self.is_admin(caller) || caller.holds_role
    }
}
