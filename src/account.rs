use crate::dialog::Confirm;
use crate::state;
use labadain_client::commands::login::ProfileUpdate;
use labadain_client::entities::user::User;
use labadain_client::Client;
use leptos::leptos_dom::ev::SubmitEvent;
use leptos::*;

const DELETE_ACCOUNT_PROMPT: &str =
    "Ita hakarak hamoos ita-nia konta no istóriku hotu? Asaun ida-ne'e labele fila fali.";

/// The signed-in user's name, with rename and account deletion.
#[component]
pub fn Account() -> impl IntoView {
    let client = store_value(expect_context::<Client>());
    let user = expect_context::<RwSignal<Option<User>>>();

    let (editing, set_editing) = create_signal(false);
    let (draft, set_draft) = create_signal(String::new());
    let (confirm_delete, set_confirm_delete) = create_signal(false);
    let (error, set_error) = create_signal(None::<String>);

    let name = move || user.with(|user| user.as_ref().map(|user| user.name.clone()));

    let start_edit = move |_| {
        set_draft.set(user.with_untracked(|user| {
            user.as_ref().map(|user| user.name.clone()).unwrap_or_default()
        }));
        set_error.set(None);
        set_editing.set(true);
    };

    let rename = move |ev: SubmitEvent| {
        ev.prevent_default();
        let new_name = draft.get_untracked().trim().to_string();
        let Some(current) = user.get_untracked() else {
            return;
        };
        if new_name.is_empty() || new_name == current.name {
            set_editing.set(false);
            return;
        }
        let update = ProfileUpdate {
            name: Some(new_name),
            avatar_url: None,
        };
        spawn_local(async move {
            match client.get_value().update_profile(&current, &update).await {
                Ok(updated) => {
                    state::save_user(&updated);
                    user.set(Some(updated));
                    set_editing.set(false);
                }
                Err(err) => set_error.set(Some(err.user_message())),
            }
        });
    };

    let delete_account = move |_: ()| {
        set_confirm_delete.set(false);
        let Some(current) = user.get_untracked() else {
            return;
        };
        spawn_local(async move {
            match client.get_value().delete_account(&current).await {
                Ok(()) => {
                    state::clear_user();
                    user.set(None);
                }
                Err(err) => set_error.set(Some(err.user_message())),
            }
        });
    };

    view! {
        <div class="grow flex flex-col text-left text-sm text-gray-500 dark:text-gray-400">
            {move || {
                if editing.get() {
                    view! {
                        <form on:submit=rename>
                            <input
                                type="text"
                                class="w-full p-1 rounded border border-gray-300 dark:bg-gray-700 dark:border-gray-600"
                                on:input=move |ev| set_draft.set(event_target_value(&ev))
                                prop:value=draft
                            />
                        </form>
                    }
                        .into_view()
                } else {
                    view! {
                        <button type="button" class="text-left" title="Troka naran" on:click=start_edit>
                            {name}
                        </button>
                    }
                        .into_view()
                }
            }}
            <button
                type="button"
                class="text-left text-xs text-red-500"
                on:click=move |_| set_confirm_delete.set(true)
            >
                "Hamoos konta"
            </button>
            {move || error.get().map(|error| view! { <span class="text-xs text-red-600">{error}</span> })}
            <Show when=move || confirm_delete.get()>
                <Confirm
                    text=DELETE_ACCOUNT_PROMPT
                    on_cancel=move |_| set_confirm_delete.set(false)
                    on_confirm=delete_account
                />
            </Show>
        </div>
    }
}
