use crate::assistant::{ChatResult, Prompts};
use crate::catalog::{Catalog, CatalogError, DEFAULT_CATEGORIES};
use crate::chat::{ChatPhase, ChatSession, Submission};
use crate::filter::{VisibleProducts, filter_products};
use crate::selection::{SelectionSet, SelectionStore};
use crate::storage::KeyValueStore;
use crate::types::{LayoutDirection, Product, ProductId};
use crate::view::{
    AppView, ChatLineView, ChatView, EmptyState, GridView, ProductCard, UiAction, render_summary,
};
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum CatalogState {
    NotLoaded,
    Loading,
    Loaded(Catalog),
    Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewState {
    pub active_category: Option<String>,
    pub search_term: String,
}

/// All application state, owned in one place and mutated through the
/// handlers below.
pub struct AppState<K> {
    catalog: CatalogState,
    selection: SelectionStore<K>,
    view: ViewState,
    chat: ChatSession,
    direction: LayoutDirection,
}

impl<K: KeyValueStore> AppState<K> {
    pub fn new(store: K, prompts: Prompts) -> Self {
        let selection = SelectionStore::open(store);
        info!(selected = selection.selection().len(), "restored selection");
        Self {
            catalog: CatalogState::NotLoaded,
            selection,
            view: ViewState::default(),
            chat: ChatSession::new(prompts),
            direction: LayoutDirection::default(),
        }
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionSet {
        self.selection.selection()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatSession {
        &mut self.chat
    }

    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    fn products(&self) -> &[Product] {
        loaded_products(&self.catalog)
    }

    /// Records the chosen category. Returns true when the catalog must be
    /// fetched before products can be shown.
    pub fn select_category(&mut self, category: &str) -> bool {
        let category = category.trim();
        self.view.active_category = (!category.is_empty()).then(|| category.to_string());

        if self.view.active_category.is_none() {
            return false;
        }
        if matches!(self.catalog, CatalogState::NotLoaded | CatalogState::Failed(_)) {
            self.catalog = CatalogState::Loading;
            return true;
        }
        false
    }

    pub fn catalog_loaded(&mut self, result: Result<Vec<Product>, CatalogError>) {
        match result {
            Ok(products) => {
                let catalog = Catalog::new(products);
                if let Err(err) = self.selection.retain_known(&catalog) {
                    warn!(error = %err, "failed to persist pruned selection");
                }
                self.catalog = CatalogState::Loaded(catalog);
            }
            Err(err) => {
                warn!(error = %err, "catalog fetch failed");
                self.catalog = CatalogState::Failed(err.to_string());
            }
        }
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.view.search_term = term.to_string();
    }

    /// Flips `id` in the selection. Once the catalog is loaded, ids it does
    /// not contain are ignored.
    pub fn toggle_selection(&mut self, id: ProductId) {
        if let CatalogState::Loaded(catalog) = &self.catalog {
            if catalog.find(id).is_none() {
                warn!(id, "ignoring toggle for a product not in the catalog");
                return;
            }
        }
        if let Err(err) = self.selection.toggle(id) {
            warn!(id, error = %err, "failed to persist selection");
        }
    }

    pub fn clear_selection(&mut self) {
        if let Err(err) = self.selection.clear() {
            warn!(error = %err, "failed to persist cleared selection");
        }
    }

    pub fn toggle_direction(&mut self) {
        self.direction = self.direction.toggled();
    }

    pub fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::ToggleProduct(id) => self.toggle_selection(id),
            UiAction::ClearSelection => self.clear_selection(),
            UiAction::ToggleDirection => self.toggle_direction(),
        }
    }

    /// Selected products resolved against the catalog, in selection order.
    pub fn selected_products(&self) -> Vec<&Product> {
        resolve_selected(self.products(), self.selection())
    }

    pub fn submit_chat(&mut self, text: &str) -> Submission {
        self.chat.submit_chat(text)
    }

    pub fn submit_routine(&mut self) -> ChatResult<Submission> {
        let selected = resolve_selected(loaded_products(&self.catalog), self.selection.selection());
        self.chat.submit_routine(&selected)
    }

    pub fn visible_products(&self) -> VisibleProducts<'_> {
        let category = self.view.active_category.as_deref().unwrap_or("");
        filter_products(self.products(), category, &self.view.search_term)
    }

    pub fn render(&self) -> AppView {
        let grid = match (&self.catalog, self.view.active_category.is_some()) {
            (_, false) => GridView::Placeholder(EmptyState::NoCategory),
            (CatalogState::NotLoaded | CatalogState::Loading, true) => GridView::Loading,
            (CatalogState::Failed(message), true) => GridView::CatalogError(message.clone()),
            (CatalogState::Loaded(_), true) => match self.visible_products() {
                VisibleProducts::NoCategory => GridView::Placeholder(EmptyState::NoCategory),
                VisibleProducts::NoMatches => GridView::Placeholder(EmptyState::NoMatches),
                VisibleProducts::Products(products) => GridView::Cards(
                    products
                        .into_iter()
                        .map(|product| ProductCard::from_product(product, self.selection()))
                        .collect(),
                ),
            },
        };

        let mut categories: Vec<String> =
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
        if let CatalogState::Loaded(catalog) = &self.catalog {
            for category in catalog.categories() {
                if !categories.contains(&category) {
                    categories.push(category);
                }
            }
        }

        AppView {
            direction: self.direction,
            categories,
            active_category: self.view.active_category.clone(),
            search_term: self.view.search_term.clone(),
            grid,
            summary: render_summary(self.selection(), self.products()),
            chat: ChatView {
                lines: self.chat.lines().iter().map(ChatLineView::from_line).collect(),
                typing: self.chat.phase() == ChatPhase::Sending,
                queued: self.chat.queued(),
            },
        }
    }
}

fn loaded_products(catalog: &CatalogState) -> &[Product] {
    match catalog {
        CatalogState::Loaded(catalog) => catalog.products(),
        _ => &[],
    }
}

fn resolve_selected<'a>(products: &'a [Product], selection: &SelectionSet) -> Vec<&'a Product> {
    selection
        .ids()
        .iter()
        .filter_map(|id| products.iter().find(|product| product.id == *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SELECTION_KEY;
    use crate::storage::MemoryStore;

    fn product(id: ProductId, name: &str, category: &str) -> Product {
        Product {
            id,
            name: name.into(),
            brand: "Brand".into(),
            category: category.into(),
            description: String::new(),
            image: String::new(),
        }
    }

    fn state_with(store: MemoryStore) -> AppState<MemoryStore> {
        AppState::new(store, Prompts::for_brand("L'Oréal"))
    }

    #[test]
    fn catalog_is_requested_once_on_first_category() {
        let mut state = state_with(MemoryStore::new());
        assert!(!state.select_category(""));
        assert!(state.select_category("skincare"));
        assert_eq!(state.render().grid, GridView::Loading);
        assert!(!state.select_category("haircare"));

        state.catalog_loaded(Ok(vec![product(1, "Serum", "skincare")]));
        assert!(!state.select_category("skincare"));
    }

    #[test]
    fn failed_catalog_is_visible_and_retried() {
        let mut state = state_with(MemoryStore::new());
        state.select_category("skincare");
        state.catalog_loaded(Err(CatalogError::Status { status: 404 }));

        assert!(matches!(state.render().grid, GridView::CatalogError(_)));

        assert!(state.select_category("skincare"));
        state.catalog_loaded(Ok(vec![product(1, "Serum", "skincare")]));
        assert!(matches!(state.render().grid, GridView::Cards(ref cards) if cards.len() == 1));
    }

    #[test]
    fn no_category_and_no_matches_render_differently() {
        let mut state = state_with(MemoryStore::new());
        assert_eq!(state.render().grid, GridView::Placeholder(EmptyState::NoCategory));

        state.select_category("skincare");
        state.catalog_loaded(Ok(vec![product(1, "Serum", "skincare")]));
        state.set_search_term("shampoo");
        assert_eq!(state.render().grid, GridView::Placeholder(EmptyState::NoMatches));

        state.select_category("");
        assert_eq!(state.render().grid, GridView::Placeholder(EmptyState::NoCategory));
    }

    #[test]
    fn loading_catalog_prunes_stale_selection() {
        let store = MemoryStore::new();
        store.set(SELECTION_KEY, "[1, 77]").unwrap();
        let mut state = state_with(store);

        let summary = state.render().summary;
        assert!(summary.items.is_empty());
        assert!(summary.clear_all.is_some());

        state.select_category("skincare");
        state.catalog_loaded(Ok(vec![product(1, "Serum", "skincare")]));

        assert_eq!(state.selection().ids(), &[1]);
        assert_eq!(state.render().summary.items.len(), 1);
    }

    #[test]
    fn unknown_id_is_not_selected_once_catalog_is_loaded() {
        let mut state = state_with(MemoryStore::new());
        state.select_category("skincare");
        state.catalog_loaded(Ok(vec![product(1, "Serum", "skincare")]));

        state.apply(UiAction::ToggleProduct(99));

        assert!(state.selection().is_empty());
        let summary = state.render().summary;
        assert!(summary.items.is_empty());
        assert_eq!(summary.clear_all, None);

        state.apply(UiAction::ToggleProduct(1));
        assert_eq!(state.selection().ids(), &[1]);
    }

    #[test]
    fn categories_merge_defaults_with_catalog() {
        let mut state = state_with(MemoryStore::new());
        assert!(state.render().categories.contains(&"haircare".to_string()));

        state.select_category("skincare");
        state.catalog_loaded(Ok(vec![product(1, "Shadow", "eyes")]));
        let categories = state.render().categories;
        assert_eq!(categories.last().map(String::as_str), Some("eyes"));
        assert_eq!(categories.iter().filter(|c| c.as_str() == "skincare").count(), 1);
    }

    #[test]
    fn apply_dispatches_actions() {
        let mut state = state_with(MemoryStore::new());
        state.apply(UiAction::ToggleProduct(4));
        state.apply(UiAction::ToggleProduct(2));
        assert_eq!(state.selection().ids(), &[4, 2]);

        state.apply(UiAction::ClearSelection);
        assert!(state.selection().is_empty());

        state.apply(UiAction::ToggleDirection);
        assert_eq!(state.render().direction, LayoutDirection::Rtl);
    }

    #[test]
    fn routine_uses_resolved_selection() {
        let mut state = state_with(MemoryStore::new());
        state.select_category("skincare");
        state.catalog_loaded(Ok(vec![
            product(1, "Serum", "skincare"),
            product(2, "Cleanser", "skincare"),
        ]));
        state.toggle_selection(2);
        state.toggle_selection(1);

        let names: Vec<_> = state.selected_products().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Cleanser", "Serum"]);

        match state.submit_routine().unwrap() {
            Submission::Dispatch(request) => {
                let body = &request.messages[1].content;
                assert!(body.find("Cleanser").unwrap() < body.find("Serum").unwrap());
            }
            other => panic!("expected dispatch, got {other:?}"),
        }
        assert!(state.render().chat.typing);
    }
}
