// File: src/favorites.rs
use crate::core::types::{Drink, FavoriteEntry};
use crate::persistence::{load_or_default, save_logged, KeyValueStore, FAVORITES_KEY};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum Toggle {
    Added(FavoriteEntry),
    Removed,
    /// The drink has no such (size, milk) variant; nothing changed.
    Missing,
}

/// Starred variants in insertion order. Every mutation rewrites the whole
/// collection to the store.
#[derive(Debug, Clone, Default)]
pub struct FavoritesStore {
    entries: Vec<FavoriteEntry>,
}

impl FavoritesStore {
    /// Loads the persisted collection; a missing or corrupt value yields an
    /// empty one.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let entries: Vec<FavoriteEntry> = load_or_default(store, FAVORITES_KEY);
        Self { entries }
    }

    pub fn list(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, drink_id: &str, size: &str, milk_type: &str) -> bool {
        self.entries.iter().any(|e| e.is(drink_id, size, milk_type))
    }

    /// Removes the (drink, size, milk) favorite if present, otherwise stars
    /// it with a copy of the variant's current nutrition.
    pub fn toggle(
        &mut self,
        store: &mut dyn KeyValueStore,
        drink: &Drink,
        size: &str,
        milk_type: &str,
    ) -> Toggle {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|e| e.is(&drink.id, size, milk_type))
        {
            self.entries.remove(pos);
            self.persist(store);
            info!("unstarred {} / {size} / {milk_type}", drink.id);
            return Toggle::Removed;
        }

        let Some(variant) = drink.variant(size, milk_type) else {
            warn!("{} has no {size} / {milk_type} variant", drink.id);
            return Toggle::Missing;
        };

        let entry = FavoriteEntry {
            drink_id: drink.id.clone(),
            drink_name: drink.name.clone(),
            size: size.to_string(),
            milk_type: milk_type.to_string(),
            nutrition: variant.nutrition.clone(),
        };
        self.entries.push(entry.clone());
        self.persist(store);
        info!("starred {} / {size} / {milk_type}", drink.id);
        Toggle::Added(entry)
    }

    /// Empties the collection. Callers gate this behind a user confirmation.
    pub fn clear(&mut self, store: &mut dyn KeyValueStore) {
        self.entries.clear();
        self.persist(store);
        info!("cleared all favorites");
    }

    fn persist(&self, store: &mut dyn KeyValueStore) {
        save_logged(store, FAVORITES_KEY, &self.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MilkVariant, NutrientValue, Nutrition, Size};
    use crate::persistence::MemoryStore;

    fn latte() -> Drink {
        let mut oat = Nutrition::default();
        oat.insert("calories", NutrientValue::Number(150u32.into()));
        Drink {
            id: "latte".to_string(),
            name: "Latte".to_string(),
            sizes: vec![Size {
                size: "Tall".to_string(),
                milk_variants: vec![
                    MilkVariant { milk_type: "Whole".to_string(), nutrition: Nutrition::default() },
                    MilkVariant { milk_type: "Oat".to_string(), nutrition: oat },
                ],
            }],
        }
    }

    #[test]
    fn test_toggle_twice_restores_collection() {
        let mut store = MemoryStore::new();
        let mut favorites = FavoritesStore::load(&store);
        let drink = latte();

        favorites.toggle(&mut store, &drink, "Tall", "Whole");
        let before = favorites.list().to_vec();

        assert!(matches!(favorites.toggle(&mut store, &drink, "Tall", "Oat"), Toggle::Added(_)));
        assert_eq!(favorites.toggle(&mut store, &drink, "Tall", "Oat"), Toggle::Removed);
        assert_eq!(favorites.list(), before.as_slice());
        assert_eq!(FavoritesStore::load(&store).list(), before.as_slice());
    }

    #[test]
    fn test_added_entry_snapshots_nutrition() {
        let mut store = MemoryStore::new();
        let mut favorites = FavoritesStore::default();
        let mut drink = latte();

        favorites.toggle(&mut store, &drink, "Tall", "Oat");
        drink.sizes[0].milk_variants[1].nutrition = Nutrition::default();

        let entry = &favorites.list()[0];
        assert_eq!(entry.drink_name, "Latte");
        assert_eq!(entry.nutrition.display("calories"), "150 kcal");
    }

    #[test]
    fn test_missing_variant_is_noop() {
        let mut store = MemoryStore::new();
        let mut favorites = FavoritesStore::default();
        assert_eq!(favorites.toggle(&mut store, &latte(), "Venti", "Oat"), Toggle::Missing);
        assert!(favorites.is_empty());
        assert_eq!(store.get(FAVORITES_KEY).unwrap(), None);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let mut store = MemoryStore::new();
        let mut favorites = FavoritesStore::default();
        let drink = latte();
        favorites.toggle(&mut store, &drink, "Tall", "Oat");
        favorites.toggle(&mut store, &drink, "Tall", "Whole");
        let milks: Vec<_> = favorites.list().iter().map(|e| e.milk_type.as_str()).collect();
        assert_eq!(milks, ["Oat", "Whole"]);
        assert!(favorites.contains("latte", "Tall", "Whole"));
        assert!(!favorites.contains("latte", "Grande", "Whole"));
    }

    #[test]
    fn test_clear_persists_empty_collection() {
        let mut store = MemoryStore::new();
        let mut favorites = FavoritesStore::default();
        favorites.toggle(&mut store, &latte(), "Tall", "Oat");

        favorites.clear(&mut store);
        assert!(favorites.list().is_empty());
        assert_eq!(store.get(FAVORITES_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_malformed_store_loads_empty() {
        let mut store = MemoryStore::new();
        store.set(FAVORITES_KEY, "[{\"drinkId\": 3}").unwrap();
        assert!(FavoritesStore::load(&store).list().is_empty());
    }
}
