fn main() {
    routine_builder::config::load_dotenv();
    routine_builder::logging::init();
    dioxus::launch(routine_builder::ui::App);
}
