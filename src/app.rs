use crate::conversation::ChatPanel;
use crate::loading::Loading;
use crate::login::Login;
use crate::nav::Nav;
use crate::state::{self, ChatState};
use labadain_client::entities::user::User;
use labadain_client::{Client, Config};
use leptos::logging::log;
use leptos::*;

#[component]
pub fn App() -> impl IntoView {
    let config = Config::from_build_env();
    log!("Backend {}", config.api_base);
    let client = Client::new(config);
    provide_context(client.clone());

    let chat = ChatState::new();
    provide_context(chat);

    let user: RwSignal<Option<User>> = create_rw_signal(state::load_user());
    provide_context(user);

    // Keyed on the id so a profile update does not reload the session.
    let user_id = create_memo(move |_| user.with(|user| user.as_ref().map(|user| user.id)));
    create_effect(move |_| match user_id.get() {
        Some(id) => chat.open(client.clone(), id),
        None => chat.close(),
    });

    view! {
        <div class="flex flex-row">
            {move || {
                if user.with(Option::is_some) {
                    view! {
                        <Nav />
                        {move || {
                            if chat.loading.get() {
                                view! { <Loading /> }.into_view()
                            } else {
                                view! { <ChatPanel /> }.into_view()
                            }
                        }}
                    }
                        .into_view()
                } else {
                    view! { <Login /> }.into_view()
                }
            }}
        </div>
    }
}
