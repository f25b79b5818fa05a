use crate::actor_framework::Entity;
use crate::domain::{User, UserCreate, UserPatch};
use super::UserError;

impl Entity for User {
    type Id = String;
    type CreatePayload = UserCreate;
    type Patch = UserPatch;
    type Action = ();
    type ActionResult = ();
    type Error = UserError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new User from creation parameters.
    ///
    /// # Errors
    /// Rejects an empty name or an address without `@`.
    fn from_create(id: String, params: UserCreate) -> Result<Self, UserError> {
        if params.name.trim().is_empty() {
            return Err(UserError::ValidationError("Name is required".to_string()));
        }
        if !params.email.contains('@') {
            return Err(UserError::ValidationError("A valid email is required".to_string()));
        }
        Ok(User::new(id, params))
    }

    /// Emails are unique across the collection, compared after normalization.
    fn unique_key(&self) -> Option<String> {
        Some(self.email.clone())
    }

    /// Updates the user's profile information. The role is not patchable.
    fn on_update(&mut self, patch: UserPatch) -> Result<(), UserError> {
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(UserError::ValidationError("Name is required".to_string()));
            }
            self.name = name.trim().to_string();
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), UserError> {
        Ok(())
    }
}
