use crate::account::Account;
use crate::dialog::Confirm;
use crate::state::{self, ChatState};
use labadain_client::entities::chat::ChatId;
use labadain_client::entities::user::User;
use labadain_client::Client;
use chrono::{DateTime, Local};
use leptos::ev::MouseEvent;
use leptos::*;

const DELETE_CHAT_PROMPT: &str = "Ita hakarak hamoos istóriku konversa ida-ne'e?";

const BUTTON: &str = "text-white bg-gray-800 hover:bg-gray-900 focus:outline-none focus:ring-4 focus:ring-gray-300 font-medium rounded-lg text-sm px-5 py-2.5 me-2 mb-2 dark:bg-gray-800 dark:hover:bg-gray-700 dark:focus:ring-gray-700 dark:border-gray-700";

#[component]
pub fn Nav() -> impl IntoView {
    let chat = expect_context::<ChatState>();
    let client = store_value(expect_context::<Client>());
    let user = expect_context::<RwSignal<Option<User>>>();
    let (show, set_show) = create_signal(true);
    let pending_delete = create_rw_signal(None::<ChatId>);

    let confirm_delete = move |_: ()| {
        if let Some(id) = pending_delete.get_untracked() {
            chat.delete_chat(client.get_value(), id);
        }
        pending_delete.set(None);
    };

    let logout = move |_| {
        state::clear_user();
        user.set(None);
    };

    view! {
        <Show when=move || !show.get()>
            <div
                class="lg:hidden text-gray-500 dark:text-gray-400 p-5 absolute top-0 left-0"
                on:click=move |_| set_show.update(|s| *s = !*s)
            >
                <svg viewBox="0 0 10 8" width="20">
                    <path
                        d="M1 1h8M1 4h 8M1 7h8"
                        stroke="currentColor"
                        fill="currentColor"
                        stroke-width="2"
                        stroke-linecap="round"
                    />
                </svg>
            </div>
        </Show>
        <div
            class="lg:w-1/5 w-full lg:flex border-e-2 dark:border-gray-800 min-h-dvh max-h-dvh overflow-y-auto dark:text-white"
            class:hidden=move || !show.get()
        >
            <div class="text-center w-full flex flex-col vertical-align">
                <div
                    class="lg:hidden text-gray-500 dark:text-gray-400 p-5"
                    on:click=move |_| set_show.update(|s| *s = !*s)
                >
                    <svg viewBox="0 0 10 10" width="20">
                        <path
                            d="M1 1L9 9M1 9L9 1"
                            stroke="currentColor"
                            fill="currentColor"
                            stroke-width="2"
                            stroke-linecap="round"
                        />
                    </svg>
                </div>
                <div class="flex flex-row m-4">
                    <h5 class="text-base py-2.5 font-semibold text-gray-500 uppercase dark:text-gray-400 w-full">
                        Labadain
                    </h5>
                </div>
                <div>
                    <button
                        type="button"
                        class=BUTTON
                        disabled=move || chat.streaming.get()
                        on:click=move |_| chat.new_chat()
                    >
                        "+ Chat foun"
                    </button>
                </div>
                <div class="py-4 overflow-y-auto grow">
                    <ul class="space-y-2 font-medium">
                        <For
                            each=move || chat.chats.get()
                            key=|c| (c.id.clone(), c.title.clone(), c.updated_at)
                            children=move |c| {
                                let open_id = c.id.clone();
                                let delete_id = c.id.clone();
                                let selected_id = c.id.clone();
                                let updated = DateTime::<Local>::from(c.updated_at)
                                    .format("%d/%m %H:%M")
                                    .to_string();
                                let onclick = move |ev: MouseEvent| {
                                    ev.prevent_default();
                                    set_show.set(false);
                                    chat.open_chat(open_id.clone());
                                };
                                let ondelete = move |ev: MouseEvent| {
                                    ev.stop_propagation();
                                    pending_delete.set(Some(delete_id.clone()));
                                };
                                view! {
                                    <li on:click=onclick>
                                        <a
                                            href="#"
                                            class="flex items-center p-2 text-gray-900 rounded-lg dark:text-white hover:bg-gray-100 dark:hover:bg-gray-700 group"
                                            class=(
                                                "bg-gray-100",
                                                move || chat.current.with(|id| id.as_ref() == Some(&selected_id)),
                                            )
                                        >
                                            <span class="ms-3 grow text-left truncate">{c.title}</span>
                                            <span class="text-xs text-gray-400">{updated}</span>
                                            <button
                                                type="button"
                                                class="invisible group-hover:visible text-gray-500 px-2"
                                                on:click=ondelete
                                            >
                                                "×"
                                            </button>
                                        </a>
                                    </li>
                                }
                            }
                        />
                    </ul>
                </div>
                <div class="flex flex-row items-center m-4 gap-2">
                    <Account />
                    <button type="button" class=BUTTON on:click=logout>
                        Logout
                    </button>
                </div>
            </div>
        </div>
        <Show when=move || pending_delete.with(Option::is_some)>
            <Confirm
                text=DELETE_CHAT_PROMPT
                on_cancel=move |_| pending_delete.set(None)
                on_confirm=confirm_delete
            />
        </Show>
    }
}
