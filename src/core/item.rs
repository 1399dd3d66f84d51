use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed set of categories an item can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Kitchen,
    Bedroom,
    Bathroom,
    #[serde(rename = "Living Room")]
    LivingRoom,
    Cleaning,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Kitchen,
        Self::Bedroom,
        Self::Bathroom,
        Self::LivingRoom,
        Self::Cleaning,
    ];

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Kitchen => "Kitchen",
            Self::Bedroom => "Bedroom",
            Self::Bathroom => "Bathroom",
            Self::LivingRoom => "Living Room",
            Self::Cleaning => "Cleaning",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "Kitchen" => Some(Self::Kitchen),
            "Bedroom" => Some(Self::Bedroom),
            "Bathroom" => Some(Self::Bathroom),
            "Living Room" => Some(Self::LivingRoom),
            "Cleaning" => Some(Self::Cleaning),
            _ => None,
        }
    }
}

/// Which slice of the list a derived view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == category,
        }
    }
}

/// A single entry on the shared list.
///
/// `id` is opaque: backend-assigned in synced mode, locally generated in
/// cache-only mode. `created_at` is the sole ordering key (newest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub store: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// A product candidate returned by the search adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub brands: Option<String>,
    pub price: Option<String>,
}

/// An item without identity: the create payload. The backend (or the local
/// id generator, in cache-only mode) supplies `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDraft {
    pub name: String,
    pub image: Option<String>,
    pub price: Option<String>,
    pub store: Option<String>,
    pub category: Category,
    pub completed: bool,
}

impl ItemDraft {
    /// Build a draft from a selected search result and the chosen category.
    pub fn from_product(product: &SearchResult, category: Category) -> Self {
        Self {
            name: product.name.clone(),
            image: product.image.clone(),
            price: product.price.clone(),
            store: product.brands.clone(),
            category,
            completed: false,
        }
    }

    /// Materialize the draft locally with a generated id and local clock.
    pub fn into_local_item(self) -> Item {
        Item {
            id: next_local_id(),
            name: self.name,
            image: self.image,
            price: self.price,
            store: self.store,
            category: self.category,
            completed: self.completed,
            created_at: Utc::now(),
        }
    }
}

/// A field-merge update. `None` fields are left off the wire so the backend
/// touches only what is named.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ItemPatch {
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

static LAST_LOCAL_ID: AtomicI64 = AtomicI64::new(0);

/// Generate a locally-unique item id: epoch milliseconds, bumped past the
/// previous id so two adds in the same millisecond stay distinct and
/// monotonic.
pub fn next_local_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_LOCAL_ID.load(Ordering::SeqCst);
    loop {
        let id = now.max(last + 1);
        match LAST_LOCAL_ID.compare_exchange(last, id, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return id.to_string(),
            Err(observed) => last = observed,
        }
    }
}
