use crate::core::debounce::Debouncer;
use crate::core::filter::{all_milk_types, all_sizes, filter, FilterState};
use crate::core::types::{Dataset, Drink, FavoriteEntry};
use crate::favorites::{FavoritesStore, Toggle};
use crate::persistence::{
    load_or_default, save_logged, KeyValueStore, DISCLAIMER_KEY, INSTALL_PROMPT_KEY,
};
use crate::usage::UsageTracker;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Everything the presentation layer can ask the catalog to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Raw search box contents after a keystroke.
    SearchInput(String),
    SelectSize(String),
    SelectMilk(String),
    ToggleFavorite {
        drink_id: String,
        size: String,
        milk_type: String,
    },
    RequestClearFavorites,
    ConfirmClearFavorites,
    CancelClearFavorites,
    AcceptDisclaimer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Filter state changed and results were recomputed.
    Refiltered,
    /// A search pass is scheduled behind the debounce window.
    SearchPending,
    Starred(FavoriteEntry),
    Unstarred,
    /// Clearing needs a `ConfirmClearFavorites` next.
    AwaitingConfirmation,
    Cleared,
    DisclaimerAccepted,
    /// The intent did not apply to the current state; nothing changed.
    Ignored,
}

/// Facet values offered while a search is active.
#[derive(Debug, Clone, PartialEq)]
pub struct Facets {
    pub sizes: Vec<String>,
    pub milk_types: Vec<String>,
    pub selected_size: String,
    pub selected_milk: String,
}

/// What the presentation layer should draw right now.
#[derive(Debug)]
pub struct View<'a> {
    pub input: &'a str,
    pub results: &'a [Drink],
    /// Present only while searching.
    pub facets: Option<Facets>,
    /// Present only while not searching.
    pub favorites: Option<&'a [FavoriteEntry]>,
    pub confirm_clear: bool,
    pub show_disclaimer: bool,
}

/// The catalog controller. Owns the dataset, the applied filter state, the
/// persisted stores and the search debouncer; single-threaded.
pub struct Catalog {
    dataset: Dataset,
    store: Box<dyn KeyValueStore>,
    input: String,
    state: FilterState,
    results: Vec<Drink>,
    favorites: FavoritesStore,
    usage: UsageTracker,
    debouncer: Debouncer,
    /// Size picked but not yet counted; cycling past a size replaces it.
    unsettled_size: Option<String>,
    size_settle: Debouncer,
    pending_clear: bool,
    disclaimer_accepted: bool,
    install_prompt_shown: bool,
    filter_passes: usize,
}

impl Catalog {
    pub fn new(dataset: Dataset, store: Box<dyn KeyValueStore>) -> Self {
        let favorites = FavoritesStore::load(store.as_ref());
        let usage = UsageTracker::load(store.as_ref());
        let disclaimer_accepted = load_or_default(store.as_ref(), DISCLAIMER_KEY);
        let install_prompt_shown = load_or_default(store.as_ref(), INSTALL_PROMPT_KEY);
        info!(
            "catalog ready: {} drinks, {} favorites",
            dataset.drinks.len(),
            favorites.len()
        );

        Self {
            dataset,
            store,
            input: String::new(),
            state: FilterState::default(),
            results: Vec::new(),
            favorites,
            usage,
            debouncer: Debouncer::default(),
            unsettled_size: None,
            size_settle: Debouncer::default(),
            pending_clear: false,
            disclaimer_accepted,
            install_prompt_shown,
            filter_passes: 0,
        }
    }

    pub fn dispatch(&mut self, intent: Intent, now: Instant) -> Outcome {
        if !matches!(intent, Intent::SelectSize(_)) {
            self.settle_size();
        }
        match intent {
            Intent::SearchInput(text) => {
                self.input = text;
                self.debouncer.schedule(now);
                Outcome::SearchPending
            }
            Intent::SelectSize(size) => {
                if !self.sizes().contains(&size) {
                    warn!("size `{size}` is not offered");
                    return Outcome::Ignored;
                }
                self.state.selected_size.clone_from(&size);
                self.unsettled_size = Some(size);
                self.size_settle.schedule(now);
                self.refilter();
                Outcome::Refiltered
            }
            Intent::SelectMilk(milk) => {
                if !all_milk_types(&self.dataset).contains(&milk) {
                    warn!("milk type `{milk}` is not offered");
                    return Outcome::Ignored;
                }
                self.state.selected_milk = milk;
                self.refilter();
                Outcome::Refiltered
            }
            Intent::ToggleFavorite {
                drink_id,
                size,
                milk_type,
            } => self.toggle_favorite(&drink_id, &size, &milk_type),
            Intent::RequestClearFavorites => {
                if self.favorites.is_empty() {
                    return Outcome::Ignored;
                }
                self.pending_clear = true;
                Outcome::AwaitingConfirmation
            }
            Intent::ConfirmClearFavorites => {
                if !std::mem::take(&mut self.pending_clear) {
                    warn!("clear confirmed without a pending request");
                    return Outcome::Ignored;
                }
                self.favorites.clear(self.store.as_mut());
                Outcome::Cleared
            }
            Intent::CancelClearFavorites => {
                if std::mem::take(&mut self.pending_clear) {
                    debug!("clear favorites cancelled");
                }
                Outcome::Ignored
            }
            Intent::AcceptDisclaimer => {
                if self.disclaimer_accepted {
                    return Outcome::Ignored;
                }
                self.disclaimer_accepted = true;
                save_logged(self.store.as_mut(), DISCLAIMER_KEY, &true);
                Outcome::DisclaimerAccepted
            }
        }
    }

    fn toggle_favorite(&mut self, drink_id: &str, size: &str, milk_type: &str) -> Outcome {
        let Some(drink) = self.dataset.drink(drink_id) else {
            warn!("no drink with id `{drink_id}`");
            return Outcome::Ignored;
        };
        match self
            .favorites
            .toggle(self.store.as_mut(), drink, size, milk_type)
        {
            Toggle::Added(entry) => Outcome::Starred(entry),
            Toggle::Removed => Outcome::Unstarred,
            Toggle::Missing => Outcome::Ignored,
        }
    }

    /// Counts the selected size once it has been left alone for the quiet
    /// period, then runs the debounced search pass if due. Returns whether
    /// results changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.size_settle.fire(now) {
            self.settle_size();
        }
        if !self.debouncer.fire(now) {
            return false;
        }
        self.apply_input();
        true
    }

    /// Runs any pending search pass and counts any unsettled size now.
    pub fn flush(&mut self) {
        self.settle_size();
        if self.debouncer.is_pending() {
            self.debouncer.cancel();
            self.apply_input();
        }
    }

    /// How long the event loop may sleep before `tick` has work to do.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        match (self.debouncer.remaining(now), self.size_settle.remaining(now)) {
            (Some(search), Some(size)) => Some(search.min(size)),
            (search, size) => search.or(size),
        }
    }

    fn settle_size(&mut self) {
        self.size_settle.cancel();
        if let Some(size) = self.unsettled_size.take() {
            self.usage.record(self.store.as_mut(), &size);
        }
    }

    fn apply_input(&mut self) {
        self.state.search_text.clone_from(&self.input);
        self.refilter();
    }

    fn refilter(&mut self) {
        self.results = filter(&self.dataset, &self.state);
        self.filter_passes += 1;
        debug!(
            "filter pass {}: {:?} -> {} drinks",
            self.filter_passes,
            self.state,
            self.results.len()
        );
    }

    /// Returns true exactly once, the first time it is asked after the
    /// disclaimer was accepted.
    pub fn take_install_prompt(&mut self) -> bool {
        if !self.disclaimer_accepted || self.install_prompt_shown {
            return false;
        }
        self.install_prompt_shown = true;
        save_logged(self.store.as_mut(), INSTALL_PROMPT_KEY, &true);
        true
    }

    pub fn view(&self) -> View<'_> {
        let searching = self.state.is_searching();
        View {
            input: &self.input,
            results: &self.results,
            facets: searching.then(|| Facets {
                sizes: self.sizes(),
                milk_types: all_milk_types(&self.dataset),
                selected_size: self.state.selected_size.clone(),
                selected_milk: self.state.selected_milk.clone(),
            }),
            favorites: (!searching).then(|| self.favorites.list()),
            confirm_clear: self.pending_clear,
            show_disclaimer: !self.disclaimer_accepted,
        }
    }

    pub fn sizes(&self) -> Vec<String> {
        all_sizes(&self.dataset, self.usage.snapshot())
    }

    pub fn milk_types(&self) -> Vec<String> {
        all_milk_types(&self.dataset)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.state
    }

    pub fn results(&self) -> &[Drink] {
        &self.results
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn is_starred(&self, drink_id: &str, size: &str, milk_type: &str) -> bool {
        self.favorites.contains(drink_id, size, milk_type)
    }

    pub fn filter_passes(&self) -> usize {
        self.filter_passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ALL;
    use crate::loader::parse_dataset;
    use crate::persistence::MemoryStore;

    fn catalog() -> Catalog {
        let dataset = parse_dataset(
            r#"{"drinks": [
                {"id": "latte", "name": "Latte", "sizes": [
                    {"size": "Tall", "milkVariants": [{"milkType": "Whole", "nutrition": {}}, {"milkType": "Oat", "nutrition": {"calories": 140}}]},
                    {"size": "Grande", "milkVariants": [{"milkType": "Whole", "nutrition": {}}, {"milkType": "Oat", "nutrition": {}}]}
                ]},
                {"id": "mocha", "name": "Mocha", "sizes": [
                    {"size": "Trenta", "milkVariants": [{"milkType": "Whole", "nutrition": {}}]}
                ]}
            ]}"#,
        )
        .unwrap();
        Catalog::new(dataset, Box::new(MemoryStore::new()))
    }

    fn toggle(drink_id: &str, size: &str, milk_type: &str) -> Intent {
        Intent::ToggleFavorite {
            drink_id: drink_id.to_string(),
            size: size.to_string(),
            milk_type: milk_type.to_string(),
        }
    }

    #[test]
    fn test_typing_burst_runs_one_filter_pass() {
        let mut catalog = catalog();
        let start = Instant::now();

        for (i, text) in ["l", "la", "lat", "latt", "latte"].iter().enumerate() {
            let now = start + Duration::from_millis(i as u64 * 50);
            catalog.dispatch(Intent::SearchInput(text.to_string()), now);
            assert!(!catalog.tick(now));
        }
        assert_eq!(catalog.filter_passes(), 0);
        assert!(catalog.view().results.is_empty());

        assert!(catalog.tick(start + Duration::from_millis(200 + 300)));
        assert!(!catalog.tick(start + Duration::from_secs(5)));
        assert_eq!(catalog.filter_passes(), 1);
        assert_eq!(catalog.results().len(), 1);
        assert_eq!(catalog.filter_state().search_text, "latte");
    }

    #[test]
    fn test_search_hides_favorites_and_shows_facets() {
        let mut catalog = catalog();
        let now = Instant::now();
        catalog.dispatch(toggle("latte", "Tall", "Oat"), now);

        let view = catalog.view();
        assert_eq!(view.favorites.map(<[_]>::len), Some(1));
        assert!(view.facets.is_none());

        catalog.dispatch(Intent::SearchInput("lat".into()), now);
        catalog.flush();
        let view = catalog.view();
        assert!(view.favorites.is_none());
        let facets = view.facets.unwrap();
        assert_eq!(facets.sizes, ["All", "Tall", "Grande", "Trenta"]);
        assert_eq!(facets.milk_types, ["All", "Oat", "Whole"]);
    }

    #[test]
    fn test_facet_selection_refilters_and_records_usage() {
        let mut catalog = catalog();
        let now = Instant::now();
        catalog.dispatch(Intent::SearchInput("a".into()), now);
        catalog.flush();
        assert_eq!(catalog.results().len(), 2);

        assert_eq!(catalog.dispatch(Intent::SelectSize("Trenta".into()), now), Outcome::Refiltered);
        assert_eq!(catalog.results().len(), 1);
        assert_eq!(catalog.usage().count("Trenta"), 0);
        catalog.flush();
        assert_eq!(catalog.usage().count("Trenta"), 1);

        assert_eq!(catalog.dispatch(Intent::SelectSize(ALL.into()), now), Outcome::Refiltered);
        assert_eq!(catalog.dispatch(Intent::SelectMilk("Oat".into()), now), Outcome::Refiltered);
        assert_eq!(catalog.results().len(), 1);
        assert_eq!(catalog.results()[0].id, "latte");

        assert_eq!(catalog.dispatch(Intent::SelectMilk("Goat".into()), now), Outcome::Ignored);
        assert_eq!(catalog.dispatch(Intent::SelectSize("Huge".into()), now), Outcome::Ignored);
    }

    #[test]
    fn test_sizes_passed_while_cycling_are_not_counted() {
        let mut catalog = catalog();
        let start = Instant::now();
        catalog.dispatch(Intent::SearchInput("a".into()), start);
        catalog.flush();

        for (i, size) in ["Tall", "Grande", "Trenta"].iter().enumerate() {
            let now = start + Duration::from_millis(i as u64 * 100);
            catalog.dispatch(Intent::SelectSize(size.to_string()), now);
            catalog.tick(now);
        }
        assert!(catalog.usage().snapshot().is_empty());
        assert_eq!(
            catalog.next_deadline(start + Duration::from_millis(200)),
            Some(Duration::from_millis(300))
        );

        catalog.tick(start + Duration::from_millis(499));
        assert!(catalog.usage().snapshot().is_empty());
        catalog.tick(start + Duration::from_millis(500));
        assert_eq!(catalog.usage().count("Trenta"), 1);
        assert_eq!(catalog.usage().count("Tall"), 0);
        assert_eq!(catalog.usage().count("Grande"), 0);
        assert_eq!(catalog.next_deadline(start + Duration::from_millis(500)), None);
    }

    #[test]
    fn test_next_intent_settles_size() {
        let mut catalog = catalog();
        let now = Instant::now();
        catalog.dispatch(Intent::SearchInput("a".into()), now);
        catalog.flush();

        catalog.dispatch(Intent::SelectSize("Grande".into()), now);
        catalog.dispatch(Intent::SelectMilk("Oat".into()), now);
        assert_eq!(catalog.usage().count("Grande"), 1);

        catalog.dispatch(Intent::SelectSize(ALL.into()), now);
        catalog.flush();
        assert_eq!(catalog.usage().count("Grande"), 1);
        assert!(!catalog.usage().snapshot().contains_key(ALL));
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let mut catalog = catalog();
        let now = Instant::now();
        assert_eq!(catalog.dispatch(Intent::RequestClearFavorites, now), Outcome::Ignored);

        catalog.dispatch(toggle("latte", "Tall", "Oat"), now);
        assert_eq!(catalog.dispatch(Intent::ConfirmClearFavorites, now), Outcome::Ignored);
        assert_eq!(catalog.favorites().len(), 1);

        assert_eq!(catalog.dispatch(Intent::RequestClearFavorites, now), Outcome::AwaitingConfirmation);
        assert!(catalog.view().confirm_clear);
        catalog.dispatch(Intent::CancelClearFavorites, now);
        assert_eq!(catalog.favorites().len(), 1);

        catalog.dispatch(Intent::RequestClearFavorites, now);
        assert_eq!(catalog.dispatch(Intent::ConfirmClearFavorites, now), Outcome::Cleared);
        assert!(catalog.favorites().is_empty());
        assert!(!catalog.view().confirm_clear);
    }

    #[test]
    fn test_toggle_unknown_targets_are_ignored() {
        let mut catalog = catalog();
        let now = Instant::now();
        assert_eq!(catalog.dispatch(toggle("chai", "Tall", "Oat"), now), Outcome::Ignored);
        assert_eq!(catalog.dispatch(toggle("mocha", "Tall", "Oat"), now), Outcome::Ignored);
        assert!(catalog.favorites().is_empty());

        assert!(matches!(catalog.dispatch(toggle("mocha", "Trenta", "Whole"), now), Outcome::Starred(_)));
        assert!(catalog.is_starred("mocha", "Trenta", "Whole"));
        assert_eq!(catalog.dispatch(toggle("mocha", "Trenta", "Whole"), now), Outcome::Unstarred);
    }

    #[test]
    fn test_disclaimer_then_install_prompt_once() {
        let mut catalog = catalog();
        let now = Instant::now();
        assert!(catalog.view().show_disclaimer);
        assert!(!catalog.take_install_prompt());

        assert_eq!(catalog.dispatch(Intent::AcceptDisclaimer, now), Outcome::DisclaimerAccepted);
        assert!(!catalog.view().show_disclaimer);
        assert!(catalog.take_install_prompt());
        assert!(!catalog.take_install_prompt());
        assert_eq!(catalog.dispatch(Intent::AcceptDisclaimer, now), Outcome::Ignored);
    }
}
