// src/core/filter.rs
use crate::core::types::{Dataset, Drink, Size, ALL};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Size labels that always lead the size facet, in this order, when present.
pub const CANONICAL_SIZES: [&str; 3] = ["Tall", "Grande", "Venti"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search_text: String,
    pub selected_size: String,
    pub selected_milk: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            selected_size: ALL.to_string(),
            selected_milk: ALL.to_string(),
        }
    }
}

impl FilterState {
    /// Trimmed, lowercased search text. Empty means nothing is shown.
    pub fn needle(&self) -> String {
        self.search_text.trim().to_lowercase()
    }

    pub fn is_searching(&self) -> bool {
        !self.search_text.trim().is_empty()
    }
}

fn accepts(selected: &str, label: &str) -> bool {
    selected == ALL || selected == label
}

/// Drinks matching the search text and both facets, each narrowed to the
/// sizes and milk variants that satisfy the facets. Dataset order is kept.
///
/// A drink is included when some size matches the size facet and some
/// variant matches the milk facet, independently. Every size passing the size
/// facet is kept, so a narrowed size may hold no variants at all.
pub fn filter(dataset: &Dataset, state: &FilterState) -> Vec<Drink> {
    let needle = state.needle();
    if needle.is_empty() {
        return vec![];
    }

    dataset
        .drinks
        .iter()
        .filter(|drink| drink.name.to_lowercase().contains(&needle))
        .filter(|drink| {
            state.selected_size == ALL
                || drink.sizes.iter().any(|s| s.size == state.selected_size)
        })
        .filter(|drink| {
            state.selected_milk == ALL
                || drink
                    .sizes
                    .iter()
                    .flat_map(|s| &s.milk_variants)
                    .any(|v| v.milk_type == state.selected_milk)
        })
        .map(|drink| narrow(drink, state))
        .collect()
}

fn narrow(drink: &Drink, state: &FilterState) -> Drink {
    let sizes = drink
        .sizes
        .iter()
        .filter(|s| accepts(&state.selected_size, &s.size))
        .map(|s| Size {
            size: s.size.clone(),
            milk_variants: s
                .milk_variants
                .iter()
                .filter(|v| accepts(&state.selected_milk, &v.milk_type))
                .cloned()
                .collect(),
        })
        .collect();

    Drink {
        id: drink.id.clone(),
        name: drink.name.clone(),
        sizes,
    }
}

/// Size facet values: "All", the canonical triad (those present), then the
/// rest by usage count descending, ties broken case-insensitively ascending.
pub fn all_sizes(dataset: &Dataset, usage: &HashMap<String, u64>) -> Vec<String> {
    let labels: BTreeSet<&str> = dataset
        .drinks
        .iter()
        .flat_map(|d| &d.sizes)
        .map(|s| s.size.as_str())
        .collect();

    let mut facet = vec![ALL.to_string()];
    facet.extend(
        CANONICAL_SIZES
            .iter()
            .filter(|c| labels.contains(*c))
            .map(|c| c.to_string()),
    );

    let mut rest: Vec<&str> = labels
        .into_iter()
        .filter(|l| !CANONICAL_SIZES.contains(l) && *l != ALL)
        .collect();
    rest.sort_by_key(|l| {
        (
            Reverse(usage.get(*l).copied().unwrap_or(0)),
            l.to_lowercase(),
        )
    });
    facet.extend(rest.into_iter().map(str::to_string));
    facet
}

/// Milk facet values: "All" then every distinct milk type, lexically ascending.
/// Usage does not reorder this facet.
pub fn all_milk_types(dataset: &Dataset) -> Vec<String> {
    let labels: BTreeSet<&str> = dataset
        .drinks
        .iter()
        .flat_map(|d| &d.sizes)
        .flat_map(|s| &s.milk_variants)
        .map(|v| v.milk_type.as_str())
        .filter(|m| *m != ALL)
        .collect();

    std::iter::once(ALL.to_string())
        .chain(labels.into_iter().map(str::to_string))
        .collect()
}
