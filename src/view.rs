//! Declarative view description
//!
//! Everything a front-end needs to draw the screen, derived from application
//! state without side effects. Widgets carry [`UiAction`]s instead of
//! callbacks; the front-end hands them back to `AppState::apply`.

use crate::chat::{ChatLine, LineKind};
use crate::selection::SelectionSet;
use crate::types::{LayoutDirection, Product, ProductId};
use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use once_cell::sync::Lazy;
use time::{UtcOffset, format_description::FormatItem, macros::format_description};

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options
});

const LINE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    ToggleProduct(ProductId),
    ClearSelection,
    ToggleDirection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyState {
    NoCategory,
    NoMatches,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoCategory => "Select a category to view products",
            EmptyState::NoMatches => "No products match your search in this category",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductCard {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub image: String,
    pub selected: bool,
    pub on_click: UiAction,
}

impl ProductCard {
    pub fn from_product(product: &Product, selection: &SelectionSet) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            description: product.description.clone(),
            image: product.image.clone(),
            selected: selection.contains(product.id),
            on_click: UiAction::ToggleProduct(product.id),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GridView {
    Placeholder(EmptyState),
    Loading,
    CatalogError(String),
    Cards(Vec<ProductCard>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SummaryItem {
    pub id: ProductId,
    pub name: String,
    pub remove: UiAction,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummaryView {
    pub items: Vec<SummaryItem>,
    pub clear_all: Option<UiAction>,
}

/// Selected-products panel.
///
/// Ids that do not resolve against `products` are skipped; the clear-all
/// control follows the raw selection so stale ids can still be cleared.
pub fn render_summary(selection: &SelectionSet, products: &[Product]) -> SummaryView {
    let items = selection
        .ids()
        .iter()
        .filter_map(|id| products.iter().find(|product| product.id == *id))
        .map(|product| SummaryItem {
            id: product.id,
            name: product.name.clone(),
            remove: UiAction::ToggleProduct(product.id),
        })
        .collect();

    SummaryView {
        items,
        clear_all: (!selection.is_empty()).then_some(UiAction::ClearSelection),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatLineView {
    pub kind: LineKind,
    pub text: String,
    /// Rendered markdown for assistant lines, escaped text otherwise
    pub html: String,
    pub timestamp: Option<String>,
}

impl ChatLineView {
    pub fn from_line(line: &ChatLine) -> Self {
        let html = match line.kind {
            LineKind::Assistant => markdown_to_html(&line.text),
            LineKind::User | LineKind::Error => escape_html(&line.text),
        };
        Self {
            kind: line.kind,
            text: line.text.clone(),
            html,
            timestamp: format_line_timestamp(line),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatView {
    pub lines: Vec<ChatLineView>,
    /// A request is in flight; show the typing indicator.
    pub typing: bool,
    pub queued: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppView {
    pub direction: LayoutDirection,
    pub categories: Vec<String>,
    pub active_category: Option<String>,
    pub search_term: String,
    pub grid: GridView,
    pub summary: SummaryView,
    pub chat: ChatView,
}

pub fn markdown_to_html(md: &str) -> String {
    let adapter = SyntectAdapter::new(Some("base16-ocean.dark"));
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&adapter);
    markdown_to_html_with_plugins(md, &MARKDOWN_OPTIONS, &plugins)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn format_line_timestamp(line: &ChatLine) -> Option<String> {
    let mut datetime = line.created_at;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(LINE_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: ProductId, name: &str) -> Product {
        Product {
            id,
            name: name.into(),
            brand: "Brand".into(),
            category: "skincare".into(),
            description: String::new(),
            image: String::new(),
        }
    }

    #[test]
    fn summary_lists_resolved_ids_in_selection_order() {
        let products = vec![product(1, "Serum"), product(2, "Cleanser"), product(3, "Toner")];
        let selection: SelectionSet = vec![3, 1].into();

        let summary = render_summary(&selection, &products);

        let names: Vec<_> = summary.items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["Toner", "Serum"]);
        assert_eq!(summary.items[0].remove, UiAction::ToggleProduct(3));
        assert_eq!(summary.clear_all, Some(UiAction::ClearSelection));
    }

    #[test]
    fn summary_drops_unknown_ids_but_keeps_clear_all() {
        let selection: SelectionSet = vec![42].into();
        let summary = render_summary(&selection, &[]);
        assert!(summary.items.is_empty());
        assert_eq!(summary.clear_all, Some(UiAction::ClearSelection));
    }

    #[test]
    fn empty_selection_has_no_clear_all() {
        let summary = render_summary(&SelectionSet::new(), &[product(1, "Serum")]);
        assert_eq!(summary, SummaryView::default());
    }

    #[test]
    fn card_reflects_selection() {
        let selection: SelectionSet = vec![1].into();
        let card = ProductCard::from_product(&product(1, "Serum"), &selection);
        assert!(card.selected);
        assert_eq!(card.on_click, UiAction::ToggleProduct(1));
    }

    #[test]
    fn user_text_is_escaped_and_assistant_markdown_rendered() {
        assert_eq!(escape_html("<b>&'\""), "&lt;b&gt;&amp;&#39;&quot;");
        let html = markdown_to_html("**Step 1**: cleanse");
        assert!(html.contains("<strong>Step 1</strong>"));
    }

    #[test]
    fn empty_states_have_distinct_messages() {
        assert_ne!(EmptyState::NoCategory.message(), EmptyState::NoMatches.message());
    }
}
