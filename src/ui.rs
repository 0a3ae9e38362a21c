use crate::assistant::{AssistantBackend, HttpAssistant, Prompts};
use crate::catalog::{CatalogSource, source_for};
use crate::chat::{LineKind, Submission};
use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::FileStore;
use crate::view::{ChatLineView, ChatView, GridView, ProductCard, SummaryView, UiAction};
use dioxus::events::Key;
use dioxus::prelude::*;
use std::sync::Arc;
use tracing::warn;

type SharedState = Signal<AppState<FileStore>>;

const APP_CSS: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #fafafa; color: #111; }
.app { max-width: 1100px; margin: 0 auto; padding: 24px; }
.toolbar { display: flex; justify-content: space-between; align-items: center; }
.search-section { display: flex; flex-direction: column; gap: 12px; margin-bottom: 20px; }
.search-section select, .search-section input { padding: 12px; font-size: 16px; }
.placeholder-message { padding: 40px; text-align: center; color: #666; border: 1px dashed #ccc; }
.placeholder-message.error { color: #b00020; border-color: #b00020; }
.products-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 16px; }
.product-card { position: relative; border: 1px solid #ddd; padding: 12px; cursor: pointer; background: #fff; }
.product-card.selected { border: 2px solid #c8102e; }
.product-card img { width: 100%; height: 160px; object-fit: contain; }
.product-desc-overlay { font-size: 13px; color: #444; }
.selected-products { margin-top: 24px; }
.selected-product-item { display: flex; justify-content: space-between; padding: 6px 0; }
.btn { padding: 8px 16px; border: 1px solid #ccc; background: #eee; cursor: pointer; }
.btn-primary { background: #000; color: #fff; border-color: #000; }
.chat-window { border: 1px solid #ddd; background: #fff; padding: 12px; height: 360px; overflow-y: auto; margin-top: 24px; }
.message { margin: 8px 0; padding: 8px 12px; }
.message.user { text-align: end; }
.message.error { color: #b00020; }
.message-meta { font-size: 11px; color: #999; }
.composer { display: flex; gap: 8px; margin-top: 8px; }
.composer input { flex: 1; padding: 10px; }
"#;

#[derive(Clone)]
struct Services {
    catalog: Arc<dyn CatalogSource>,
    assistant: Arc<dyn AssistantBackend>,
}

fn load_config() -> AppConfig {
    AppConfig::from_env().unwrap_or_else(|err| {
        warn!(error = %err, "invalid configuration, falling back to defaults");
        AppConfig::default()
    })
}

/// Sends `submission` if it is ready and keeps sending whatever the session
/// queues behind it.
fn dispatch(state: SharedState, assistant: Arc<dyn AssistantBackend>, submission: Submission) {
    let Submission::Dispatch(first) = submission else {
        return;
    };
    spawn(async move {
        let mut state = state;
        let mut next = Some(first);
        while let Some(request) = next {
            let outcome = assistant.complete(&request.messages).await;
            next = state.write().chat_mut().finish(request.ticket, outcome);
        }
    });
}

#[component]
pub fn App() -> Element {
    let config = use_hook(load_config);
    let services = use_hook(|| Services {
        catalog: source_for(&config.catalog, config.catalog_timeout),
        assistant: Arc::new(HttpAssistant::new(&config.assistant)),
    });
    let mut state = use_signal(|| {
        AppState::new(
            FileStore::new(config.storage_dir.clone()),
            Prompts::for_brand(&config.brand),
        )
    });

    let view = state.read().render();

    let catalog = services.catalog.clone();
    let on_category = move |ev: FormEvent| {
        if state.write().select_category(&ev.value()) {
            let catalog = catalog.clone();
            spawn(async move {
                let mut state = state;
                let result = catalog.fetch().await;
                state.write().catalog_loaded(result);
            });
        }
    };

    let chat_assistant = services.assistant.clone();
    let on_send = move |text: String| {
        let submission = state.write().submit_chat(&text);
        dispatch(state, chat_assistant.clone(), submission);
    };

    let routine_assistant = services.assistant.clone();
    let on_generate = move |_: ()| {
        let submitted = state.write().submit_routine();
        match submitted {
            Ok(submission) => dispatch(state, routine_assistant.clone(), submission),
            Err(err) => warn!(error = %err, "could not build routine request"),
        }
    };

    rsx! {
        style { dangerous_inner_html: APP_CSS }
        div { class: "app", dir: view.direction.as_attr(),
            div { class: "toolbar",
                h1 { "Routine Builder" }
                button {
                    class: "btn",
                    onclick: move |_| state.write().apply(UiAction::ToggleDirection),
                    "Toggle RTL"
                }
            }
            div { class: "search-section",
                select {
                    value: view.active_category.clone().unwrap_or_default(),
                    onchange: on_category,
                    option { value: "", "Choose a category" }
                    for category in view.categories.iter() {
                        option { key: "{category}", value: "{category}", "{category}" }
                    }
                }
                input {
                    r#type: "text",
                    placeholder: "Search products by name or keyword...",
                    value: "{view.search_term}",
                    oninput: move |ev: FormEvent| state.write().set_search_term(&ev.value()),
                }
            }
            ProductGrid { state, grid: view.grid.clone() }
            SelectedProducts { state, summary: view.summary.clone(), ongenerate: on_generate }
            ChatPanel { chat: view.chat.clone(), onsend: on_send }
        }
    }
}

#[component]
fn ProductGrid(state: SharedState, grid: GridView) -> Element {
    match grid {
        GridView::Placeholder(empty) => rsx! {
            div { class: "placeholder-message", "{empty.message()}" }
        },
        GridView::Loading => rsx! {
            div { class: "placeholder-message", "Loading products…" }
        },
        GridView::CatalogError(message) => rsx! {
            div { class: "placeholder-message error", "Could not load products: {message}" }
        },
        GridView::Cards(cards) => rsx! {
            div { class: "products-grid",
                for card in cards {
                    ProductTile { key: "{card.id}", state, card: card.clone() }
                }
            }
        },
    }
}

#[component]
fn ProductTile(state: SharedState, card: ProductCard) -> Element {
    let mut state = state;
    let class = if card.selected {
        "product-card selected"
    } else {
        "product-card"
    };
    let action = card.on_click;
    rsx! {
        div { class: class, onclick: move |_| state.write().apply(action),
            if !card.image.is_empty() {
                img { src: "{card.image}", alt: "{card.name}" }
            }
            div { class: "product-info",
                h3 { "{card.name}" }
                p { "{card.brand}" }
            }
            div { class: "product-desc-overlay",
                p { "{card.description}" }
            }
        }
    }
}

#[component]
fn SelectedProducts(state: SharedState, summary: SummaryView, ongenerate: EventHandler<()>) -> Element {
    let mut state = state;
    rsx! {
        div { class: "selected-products",
            h2 { "Selected Products" }
            div { id: "selectedProductsList",
                for item in summary.items.iter() {
                    div { key: "{item.id}", class: "selected-product-item",
                        span { "{item.name}" }
                        RemoveButton { state, action: item.remove, label: "Remove" }
                    }
                }
                if let Some(action) = summary.clear_all {
                    button {
                        class: "btn",
                        onclick: move |_| state.write().apply(action),
                        "Clear All"
                    }
                }
            }
            button {
                class: "btn btn-primary",
                onclick: move |_| ongenerate.call(()),
                "Generate Routine"
            }
        }
    }
}

#[component]
fn RemoveButton(state: SharedState, action: UiAction, label: &'static str) -> Element {
    let mut state = state;
    rsx! {
        button { class: "btn", onclick: move |_| state.write().apply(action), "{label}" }
    }
}

#[component]
fn ChatPanel(chat: ChatView, onsend: EventHandler<String>) -> Element {
    let mut input = use_signal(String::new);
    let mut submit = move || {
        let text = input();
        if text.trim().is_empty() {
            return;
        }
        input.set(String::new());
        onsend.call(text);
    };

    rsx! {
        div { class: "chat-window",
            for (i, line) in chat.lines.iter().enumerate() {
                ChatLineRow { key: "{i}", line: line.clone() }
            }
            if chat.typing {
                div { class: "message assistant typing", "..." }
            }
        }
        div { class: "composer",
            input {
                r#type: "text",
                placeholder: "Ask me about products or routines…",
                value: "{input}",
                oninput: move |ev: FormEvent| input.set(ev.value()),
                onkeydown: move |ev: KeyboardEvent| {
                    if ev.key() == Key::Enter {
                        ev.prevent_default();
                        submit();
                    }
                },
            }
            button { class: "btn btn-primary", onclick: move |_| submit(), "Send" }
        }
    }
}

#[component]
fn ChatLineRow(line: ChatLineView) -> Element {
    let kind = match line.kind {
        LineKind::User => "user",
        LineKind::Assistant => "assistant",
        LineKind::Error => "error",
    };
    let copy_payload = line.text.clone();
    rsx! {
        div { class: "message {kind}",
            div { dangerous_inner_html: "{line.html}" }
            div { class: "message-meta",
                if let Some(ts) = line.timestamp.as_ref() {
                    span { "{ts}" }
                }
                if line.kind == LineKind::Assistant {
                    button {
                        class: "btn",
                        onclick: move |_| copy_to_clipboard(copy_payload.clone()),
                        "Copy"
                    }
                }
            }
        }
    }
}

#[cfg(feature = "desktop")]
fn copy_to_clipboard(text: String) {
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        let _ = clipboard.set_text(text);
    }
}

#[cfg(not(feature = "desktop"))]
fn copy_to_clipboard(_text: String) {}
