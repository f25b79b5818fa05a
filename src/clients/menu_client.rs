use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::domain::{Category, MenuItem, MenuItemCreate, MenuItemPatch, MenuQuery};
use crate::images::{ImageStore, ImageUpload};
use crate::menu_actor::MenuError;

/// Client for interacting with the Menu actor.
#[derive(Clone)]
pub struct MenuClient {
    inner: ResourceClient<MenuItem>,
    images: Arc<dyn ImageStore>,
}

impl_client_methods!(MenuClient, MenuItem, MenuError, menu_item);

impl MenuClient {
    pub fn new(inner: ResourceClient<MenuItem>, images: Arc<dyn ImageStore>) -> Self {
        Self { inner, images }
    }

    /// Items matching the query, newest first.
    #[instrument(skip(self))]
    pub async fn list_menu(&self, query: MenuQuery) -> Result<Vec<MenuItem>, MenuError> {
        debug!("Sending request");
        let mut items = self
            .inner
            .list_where(move |item: &MenuItem| query.matches(item))
            .await
            .map_err(MenuError::from)?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }

    #[instrument(skip(self))]
    pub async fn fetch_menu_item(&self, id: String) -> Result<MenuItem, MenuError> {
        self.get_menu_item(id.clone())
            .await?
            .ok_or(MenuError::NotFound(id))
    }

    /// Distinct categories currently used by any item.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, MenuError> {
        debug!("Sending request");
        let items = self.inner.list().await.map_err(MenuError::from)?;
        let used: BTreeSet<Category> = items.iter().map(|item| item.category).collect();
        Ok(used.into_iter().collect())
    }

    #[instrument(skip(self, payload, image), fields(item_name = %payload.name))]
    pub async fn create_menu_item(
        &self,
        mut payload: MenuItemCreate,
        image: Option<ImageUpload>,
    ) -> Result<MenuItem, MenuError> {
        debug!("Sending request");
        if let Some(image) = image {
            // A failed upload leaves `image` unset, which yields the placeholder.
            payload.image = self.try_upload(image).await;
        }
        let item = self.inner.create(payload).await.map_err(MenuError::from)?;
        info!(item_id = %item.id, "Menu item created");
        Ok(item)
    }

    #[instrument(skip(self, patch, image))]
    pub async fn update_menu_item(
        &self,
        id: String,
        mut patch: MenuItemPatch,
        image: Option<ImageUpload>,
    ) -> Result<MenuItem, MenuError> {
        debug!("Sending request");
        if let Some(image) = image {
            // On failure the patch carries no image, so the current one is kept.
            patch.image = self.try_upload(image).await;
        }
        self.inner.update(id, patch).await.map_err(MenuError::from)
    }

    async fn try_upload(&self, image: ImageUpload) -> Option<String> {
        match self.images.upload(image).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "Image upload failed, continuing without it");
                None
            }
        }
    }
}
