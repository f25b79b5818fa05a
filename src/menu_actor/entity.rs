use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{MenuItem, MenuItemCreate, MenuItemPatch};
use super::MenuError;

fn validate_name(name: &str) -> Result<(), MenuError> {
    if name.trim().is_empty() {
        return Err(MenuError::ValidationError("Name is required".to_string()));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), MenuError> {
    if !price.is_finite() || price < 0.0 {
        return Err(MenuError::ValidationError(format!("Invalid price: {price}")));
    }
    Ok(())
}

impl Entity for MenuItem {
    type Id = String;
    type CreatePayload = MenuItemCreate;
    type Patch = MenuItemPatch;
    type Action = ();
    type ActionResult = ();
    type Error = MenuError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new MenuItem from creation parameters.
    ///
    /// # Errors
    /// Returns `ValidationError` for an empty name or a negative price.
    fn from_create(id: String, params: MenuItemCreate) -> Result<Self, MenuError> {
        validate_name(&params.name)?;
        validate_price(params.price)?;
        Ok(MenuItem::new(id, params))
    }

    /// Applies the fields present in the patch and bumps `updated_at`.
    fn on_update(&mut self, patch: MenuItemPatch) -> Result<(), MenuError> {
        if let Some(name) = patch.name {
            validate_name(&name)?;
            self.name = name.trim().to_string();
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            self.price = price;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(available) = patch.available {
            self.available = available;
        }
        if let Some(ingredients) = patch.ingredients {
            self.ingredients = ingredients;
        }
        if let Some(info) = patch.nutritional_info {
            self.nutritional_info = Some(info);
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), MenuError> {
        Ok(())
    }
}
