use serde::{Deserialize, Serialize};

/// Titles longer than this are truncated at construction.
pub const MAX_TITLE_LEN: usize = 200;

/// One product line in a cart lookup result.
///
/// Invariants are enforced by the constructors: the identifier is stored
/// uppercase, the title is capped at [`MAX_TITLE_LEN`] characters, and
/// `line_total` is always `unit_price * quantity`. A `unit_price` of 0.0
/// means "unknown price", never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub identifier: String,
    pub title: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub line_total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub product_url: String,
}

impl LineItem {
    pub fn new(
        identifier: &str,
        title: &str,
        unit_price: f64,
        quantity: u32,
        image_url: Option<String>,
        product_url: String,
    ) -> Self {
        let quantity = quantity.max(1);
        Self {
            identifier: identifier.to_uppercase(),
            title: truncate_title(title),
            unit_price,
            quantity,
            line_total: unit_price * quantity as f64,
            image_url,
            product_url,
        }
    }

    /// Degraded record for an identifier whose lookup failed: known identity,
    /// unknown price, requested quantity.
    pub fn placeholder(identifier: &str, quantity: u32, product_url: String) -> Self {
        let identifier = identifier.to_uppercase();
        let title = Self::placeholder_title(&identifier);
        Self::new(&identifier, &title, 0.0, quantity, None, product_url)
    }

    pub fn placeholder_title(identifier: &str) -> String {
        format!("Product {identifier}")
    }

    /// Apply a requested quantity, recomputing `line_total`.
    ///
    /// The only post-construction mutation: the orchestrator merges cart-URL
    /// quantities onto items extracted with a default quantity of 1.
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self.line_total = self.unit_price * self.quantity as f64;
        self
    }
}

fn truncate_title(title: &str) -> String {
    title.trim().chars().take(MAX_TITLE_LEN).collect()
}
