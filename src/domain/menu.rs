use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Image reference used when no upload succeeded.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg?height=200&width=200";

/// The fixed set of menu sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Hot Drinks")]
    HotDrinks,
    #[serde(rename = "Cold Beverages")]
    ColdBeverages,
    #[serde(rename = "Snacks")]
    Snacks,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::HotDrinks, Category::ColdBeverages, Category::Snacks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::HotDrinks => "Hot Drinks",
            Category::ColdBeverages => "Cold Beverages",
            Category::Snacks => "Snacks",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category: {s}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
}

/// Represents a sellable item in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub image: String,
    pub available: bool,
    pub ingredients: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<NutritionalInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new menu item.
#[derive(Debug, Clone)]
pub struct MenuItemCreate {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub image: Option<String>,
    pub available: bool,
    pub ingredients: Vec<String>,
    pub nutritional_info: Option<NutritionalInfo>,
}

/// Payload for updating a menu item. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub image: Option<String>,
    pub available: Option<bool>,
    pub ingredients: Option<Vec<String>>,
    pub nutritional_info: Option<NutritionalInfo>,
}

/// Catalog listing refinements.
#[derive(Debug, Clone, Default)]
pub struct MenuQuery {
    /// Exact match against the category's display name.
    pub category: Option<String>,
    /// Case-insensitive substring match on the item name.
    pub search: Option<String>,
    pub include_unavailable: bool,
}

impl MenuQuery {
    pub fn available() -> Self {
        Self::default()
    }

    pub fn everything() -> Self {
        Self {
            include_unavailable: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &MenuItem) -> bool {
        if !self.include_unavailable && !item.available {
            return false;
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if item.category.as_str() != category {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            if !item.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

impl MenuItem {
    pub fn new(id: impl Into<String>, params: MenuItemCreate) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: params.name.trim().to_string(),
            description: params.description,
            price: params.price,
            category: params.category,
            image: params.image.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            available: params.available,
            ingredients: params.ingredients,
            nutritional_info: params.nutritional_info,
            created_at: now,
            updated_at: now,
        }
    }
}
