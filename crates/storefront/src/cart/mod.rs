//! Shopping cart store.
//!
//! [`CartStore`] owns the cart contents. It is an explicit object handed to
//! whoever needs it; there is no process-wide cart. Every mutation writes the
//! whole cart to [`CartStorage`] and notifies subscribers with a
//! [`CartEvent`].
//!
//! Invariants:
//! - at most one [`CartItem`] per product id
//! - every quantity is at least 1
//! - totals are computed on read, never cached

pub mod storage;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use maison_core::{Money, Product, ProductId};

use crate::error::add_breadcrumb;

pub use storage::{CART_STORAGE_KEY, CartStorage, FileStorage, MemoryStorage, StorageError};

/// A product in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.product.price * self.quantity
    }
}

/// A change to the cart, delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A product not previously in the cart was added.
    Added {
        product_id: ProductId,
        name: String,
        quantity: u32,
    },
    /// The quantity of a product already in the cart changed.
    Updated {
        product_id: ProductId,
        name: String,
        quantity: u32,
    },
    Removed { product_id: ProductId, name: String },
    Cleared,
}

impl CartEvent {
    /// Short notification title.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Added { .. } => "Item added to cart",
            Self::Updated { .. } => "Item updated in cart",
            Self::Removed { .. } => "Item removed from cart",
            Self::Cleared => "Cart cleared",
        }
    }

    /// Notification body.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Added { name, .. } => format!("{name} has been added to your cart"),
            Self::Updated { name, quantity, .. } => {
                format!("{name} quantity updated to {quantity}")
            }
            Self::Removed { name, .. } => format!("{name} has been removed from your cart"),
            Self::Cleared => "All items have been removed from your cart".to_owned(),
        }
    }
}

impl fmt::Display for CartEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.description())
    }
}

type Listener = Box<dyn Fn(&CartEvent) + Send + Sync>;

/// The cart, backed by durable storage.
pub struct CartStore {
    items: Vec<CartItem>,
    storage: Box<dyn CartStorage>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.items)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Open the cart, rehydrating it from `storage`.
    ///
    /// Unreadable or corrupt data is logged and yields an empty cart; the
    /// stored blob is left alone until the next mutation overwrites it.
    pub fn open(storage: impl CartStorage + 'static) -> Self {
        let items = load_items(&storage);
        debug!(items = items.len(), "Cart loaded");
        Self {
            items,
            storage: Box::new(storage),
            listeners: Vec::new(),
        }
    }

    /// Register an observer called synchronously after every change.
    pub fn subscribe(&mut self, listener: impl Fn(&CartEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Cart contents in the order products were first added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of `product_id` in the cart, if present.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.position(product_id)
            .and_then(|i| self.items.get(i))
            .map(|item| item.quantity)
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Add `quantity` of `product`, incrementing an existing entry.
    ///
    /// Adding zero does nothing.
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            debug!(product_id = %product.id, "Ignoring add of zero quantity");
            return;
        }

        let event = if let Some(item) = self.entry_mut(&product.id) {
            item.quantity = item.quantity.saturating_add(quantity);
            CartEvent::Updated {
                product_id: product.id.clone(),
                name: item.product.name.clone(),
                quantity: item.quantity,
            }
        } else {
            self.items.push(CartItem {
                product: product.clone(),
                quantity,
            });
            CartEvent::Added {
                product_id: product.id.clone(),
                name: product.name.clone(),
                quantity,
            }
        };
        self.commit(&event);
    }

    /// Remove the entry for `product_id`. Absent ids are ignored.
    pub fn remove_from_cart(&mut self, product_id: &ProductId) {
        let Some(index) = self.position(product_id) else {
            debug!(%product_id, "Remove of product not in cart");
            return;
        };
        let item = self.items.remove(index);
        self.commit(&CartEvent::Removed {
            product_id: item.product.id,
            name: item.product.name,
        });
    }

    /// Set the quantity of `product_id` exactly.
    ///
    /// A quantity below 1 is rejected without change; use
    /// [`remove_from_cart`](Self::remove_from_cart) to delete an entry.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: u32) {
        if quantity < 1 {
            debug!(%product_id, "Rejected quantity update below 1");
            return;
        }
        let Some(item) = self.entry_mut(product_id) else {
            debug!(%product_id, "Quantity update for product not in cart");
            return;
        };
        if item.quantity == quantity {
            return;
        }
        item.quantity = quantity;
        let event = CartEvent::Updated {
            product_id: item.product.id.clone(),
            name: item.product.name.clone(),
            quantity,
        };
        self.commit(&event);
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.commit(&CartEvent::Cleared);
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| &item.product.id == product_id)
    }

    fn entry_mut(&mut self, product_id: &ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product.id == product_id)
    }

    fn commit(&self, event: &CartEvent) {
        self.persist();

        let product_id = match event {
            CartEvent::Added { product_id, .. }
            | CartEvent::Updated { product_id, .. }
            | CartEvent::Removed { product_id, .. } => Some(product_id.as_str()),
            CartEvent::Cleared => None,
        };
        match product_id {
            Some(id) => add_breadcrumb("cart", event.title(), Some(&[("product_id", id)])),
            None => add_breadcrumb("cart", event.title(), None),
        }

        for listener in &self.listeners {
            listener(event);
        }
    }

    // A failed write leaves the in-memory cart authoritative for this session.
    fn persist(&self) {
        let blob = match serde_json::to_string(&self.items) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to serialize cart");
                return;
            }
        };
        if let Err(e) = self.storage.set(CART_STORAGE_KEY, &blob) {
            warn!(error = %e, "Failed to persist cart");
        }
    }
}

fn load_items(storage: &dyn CartStorage) -> Vec<CartItem> {
    let blob = match storage.get(CART_STORAGE_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read stored cart, starting empty");
            return Vec::new();
        }
    };

    let stored: Vec<CartItem> = match serde_json::from_str(&blob) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "Discarding corrupt stored cart");
            return Vec::new();
        }
    };

    // Hand-edited blobs may repeat a product or carry zero quantities.
    let mut items: Vec<CartItem> = Vec::with_capacity(stored.len());
    for item in stored.into_iter().filter(|item| item.quantity > 0) {
        if let Some(existing) = items
            .iter_mut()
            .find(|existing| existing.product.id == item.product.id)
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            items.push(item);
        }
    }
    items
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::catalog::Catalog;

    fn product(id: &str) -> Product {
        Catalog::builtin()
            .unwrap()
            .get(&ProductId::new(id))
            .cloned()
            .unwrap()
    }

    fn recorder(cart: &mut CartStore) -> Arc<Mutex<Vec<CartEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        cart.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        events
    }

    #[test]
    fn test_add_increments_existing_entry() {
        let mut cart = CartStore::open(MemoryStorage::new());
        let jacket = product("1");

        cart.add_to_cart(&jacket, 2);
        cart.add_to_cart(&jacket, 3);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&jacket.id), Some(5));
        assert_eq!(cart.total_items(), 5);
    }

    #[test]
    fn test_totals_across_products() {
        let mut cart = CartStore::open(MemoryStorage::new());
        cart.add_to_cart(&product("1"), 1);
        cart.add_to_cart(&product("7"), 2);
        cart.add_to_cart(&product("5"), 1);

        assert_eq!(cart.items().len(), 3);
        assert_eq!(cart.total_items(), 4);
        // 2800 + 2 * 390 + 650
        assert_eq!(cart.subtotal(), Money::from_major(4230));
    }

    #[test]
    fn test_update_quantity_replaces_and_rejects_zero() {
        let mut cart = CartStore::open(MemoryStorage::new());
        let scarf = product("7");
        cart.add_to_cart(&scarf, 4);

        cart.update_quantity(&scarf.id, 2);
        assert_eq!(cart.quantity_of(&scarf.id), Some(2));

        cart.update_quantity(&scarf.id, 0);
        assert_eq!(cart.quantity_of(&scarf.id), Some(2));

        cart.update_quantity(&ProductId::new("missing"), 3);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = CartStore::open(MemoryStorage::new());
        let events = recorder(&mut cart);
        cart.add_to_cart(&product("2"), 1);

        cart.remove_from_cart(&ProductId::new("missing"));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(events.lock().unwrap().len(), 1);

        cart.remove_from_cart(&ProductId::new("2"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_events_describe_changes() {
        let mut cart = CartStore::open(MemoryStorage::new());
        let events = recorder(&mut cart);
        let bag = product("2");

        cart.add_to_cart(&bag, 1);
        cart.add_to_cart(&bag, 1);
        cart.update_quantity(&bag.id, 2);
        cart.remove_from_cart(&bag.id);
        cart.clear_cart();
        cart.add_to_cart(&bag, 0);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], CartEvent::Added { quantity: 1, .. }));
        assert_eq!(
            events[1].to_string(),
            "Item updated in cart: GG Marmont Medium Bag quantity updated to 2"
        );
        assert!(matches!(events[2], CartEvent::Removed { .. }));
    }

    #[test]
    fn test_cart_survives_restart() {
        let storage = MemoryStorage::new();
        let mut cart = CartStore::open(storage.clone());
        cart.add_to_cart(&product("1"), 1);
        cart.add_to_cart(&product("3"), 2);
        let before = cart.items().to_vec();
        drop(cart);

        let reopened = CartStore::open(storage);
        assert_eq!(reopened.items(), before.as_slice());
        assert_eq!(reopened.total_items(), 3);
    }

    #[test]
    fn test_corrupt_blob_yields_empty_cart() {
        let storage = MemoryStorage::new();
        storage.set(CART_STORAGE_KEY, "{not json").unwrap();

        let cart = CartStore::open(storage.clone());
        assert!(cart.is_empty());
        assert_eq!(
            storage.get(CART_STORAGE_KEY).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_rehydration_merges_duplicates_and_drops_zero() {
        let jacket = product("1");
        let scarf = product("7");
        let blob = serde_json::to_string(&vec![
            CartItem { product: jacket.clone(), quantity: 1 },
            CartItem { product: scarf.clone(), quantity: 0 },
            CartItem { product: jacket.clone(), quantity: 2 },
        ])
        .unwrap();
        let storage = MemoryStorage::new();
        storage.set(CART_STORAGE_KEY, &blob).unwrap();

        let cart = CartStore::open(storage);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.quantity_of(&jacket.id), Some(3));
        assert_eq!(cart.quantity_of(&scarf.id), None);
    }

    struct BrokenStorage;

    impl CartStorage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _blob: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn test_write_failure_keeps_change() {
        let mut cart = CartStore::open(BrokenStorage);
        cart.add_to_cart(&product("1"), 1);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_file_backed_cart_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = CartStore::open(FileStorage::new(dir.path()));
        cart.add_to_cart(&product("12"), 1);
        drop(cart);

        let reopened = CartStore::open(FileStorage::new(dir.path()));
        assert_eq!(reopened.quantity_of(&ProductId::new("12")), Some(1));
    }
}
