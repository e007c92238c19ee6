use crate::message::Message;
use crate::state::ChatState;
use labadain_client::attachment::{check_size, ACCEPT};
use labadain_client::entities::user::User;
use labadain_client::suggestions::suggestions;
use labadain_client::{Attachment, Client};
use leptos::leptos_dom::ev::SubmitEvent;
use leptos::*;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, HtmlInputElement};

async fn read_file(file: &File) -> Result<Attachment, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|err: JsValue| format!("Could not read {}: {err:?}", file.name()))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(Attachment::new(file.name(), bytes))
}

#[component]
pub fn ChatPanel() -> impl IntoView {
    let chat = expect_context::<ChatState>();
    let client = store_value(expect_context::<Client>());
    let user = expect_context::<RwSignal<Option<User>>>();
    let limit = client.with_value(|client| client.config().max_upload_bytes);

    let (message, set_message) = create_signal(String::new());
    let (file, set_file) = create_signal(None::<Attachment>);
    let (file_error, set_file_error) = create_signal(None::<String>);

    let pick_file = move |ev: ev::Event| {
        let input = event_target::<HtmlInputElement>(&ev);
        let picked = input.files().and_then(|files| files.get(0));
        input.set_value("");
        let Some(picked) = picked else {
            return;
        };
        set_file.set(None);
        if let Err(err) = check_size(picked.size() as u64, limit) {
            set_file_error.set(Some(err.user_message()));
            return;
        }
        set_file_error.set(None);
        spawn_local(async move {
            match read_file(&picked).await {
                Ok(attachment) => set_file.set(Some(attachment)),
                Err(err) => set_file_error.set(Some(err)),
            }
        });
    };

    let send = move |text: String| {
        if text.trim().is_empty() || chat.streaming.get_untracked() {
            return;
        }
        set_message.set(String::new());
        set_file_error.set(None);
        let attachment = file.get_untracked();
        set_file.set(None);
        chat.send(client.get_value(), text, attachment);
    };
    let send_message = move |ev: SubmitEvent| {
        ev.prevent_default();
        send(message.get_untracked());
    };

    let user_id = move || user.with(|user| user.as_ref().map(|user| user.id));

    view! {
        <div class="h-dvh max-h-dvh grow flex flex-col scrollbar lg:w-4/5 w-screen max-w-screen">
            <main class="grow flex flex-col overflow-auto max-h-screen">
                {move || {
                    let user_id = user_id();
                    chat.messages
                        .get()
                        .into_iter()
                        .map(|message| view! { <Message message user_id /> })
                        .collect_view()
                }}
            </main>
            {move || {
                let empty = chat.messages.with(Vec::is_empty) && !chat.streaming.get();
                empty
                    .then(|| {
                        let offered = message.with(|input| suggestions(input));
                        view! {
                            <div class="grid lg:grid-cols-2 gap-2 px-4 pb-2">
                                {offered
                                    .iter()
                                    .map(|&text| {
                                        view! {
                                            <button
                                                type="button"
                                                class="p-3 text-left text-sm text-gray-700 border border-gray-200 rounded-lg hover:bg-gray-100 dark:text-gray-300 dark:border-gray-700 dark:hover:bg-gray-700"
                                                on:click=move |_| send(text.to_string())
                                            >
                                                {text}
                                            </button>
                                        }
                                    })
                                    .collect_view()}
                            </div>
                        }
                    })
            }}
            {move || {
                chat.notice
                    .get()
                    .map(|notice| {
                        view! {
                            <p class="px-4 py-2 text-sm text-red-600 dark:text-red-400">{notice}</p>
                        }
                    })
            }}
            <form class="w-full" on:submit=send_message>
                <label for="chat" class="sr-only">
                    Ita-nia mensajen
                </label>
                {move || {
                    file_error
                        .get()
                        .map(|err| view! { <p class="px-4 text-sm text-red-600">{err}</p> })
                }}
                {move || {
                    file.get()
                        .map(|file| {
                            view! {
                                <p class="px-4 text-sm text-gray-500 dark:text-gray-400">
                                    {file.file_name}
                                    <button type="button" class="ms-2" on:click=move |_| set_file.set(None)>
                                        "×"
                                    </button>
                                </p>
                            }
                        })
                }}
                <div class="flex items-center px-3 py-2 bg-gray-50 dark:bg-gray-700">
                    <label class="inline-flex justify-center p-2 text-gray-500 rounded-lg cursor-pointer hover:text-gray-900 hover:bg-gray-100 dark:text-gray-400 dark:hover:text-white dark:hover:bg-gray-600">
                        <svg
                            class="w-5 h-5"
                            aria-hidden="true"
                            xmlns="http://www.w3.org/2000/svg"
                            fill="none"
                            viewBox="0 0 20 20"
                        >
                            <path
                                stroke="currentColor"
                                stroke-linecap="round"
                                stroke-linejoin="round"
                                stroke-width="2"
                                d="M6 10V4a4 4 0 1 1 8 0v9a2 2 0 1 1-4 0V6"
                            />
                        </svg>
                        <span class="sr-only">Tau dokumentu</span>
                        <input type="file" class="hidden" accept=ACCEPT on:change=pick_file />
                    </label>
                    <input
                        id="chat"
                        class="block mx-4 p-2.5 w-full text-sm text-gray-900 bg-white rounded-lg border border-gray-300 focus:ring-blue-500 focus:border-blue-500 dark:bg-gray-800 dark:border-gray-600 dark:placeholder-gray-400 dark:text-white dark:focus:ring-blue-500 dark:focus:border-blue-500 resize-none"
                        placeholder="Hakerek ita-nia pergunta..."
                        on:input=move |ev| set_message.set(event_target_value(&ev))
                        prop:value=message
                    />
                    {move || {
                        if chat.streaming.get() {
                            view! {
                                <button
                                    type="button"
                                    class="inline-flex justify-center p-2 text-red-600 rounded-full cursor-pointer hover:bg-red-100 dark:text-red-500 dark:hover:bg-gray-600"
                                    on:click=move |_| chat.stop()
                                >
                                    <svg class="w-5 h-5" aria-hidden="true" viewBox="0 0 20 20" fill="currentColor">
                                        <rect x="4" y="4" width="12" height="12" rx="2" />
                                    </svg>
                                    <span class="sr-only">Para</span>
                                </button>
                            }
                        } else {
                            view! {
                                <button
                                    type="submit"
                                    class="inline-flex justify-center p-2 text-blue-600 rounded-full cursor-pointer hover:bg-blue-100 dark:text-blue-500 dark:hover:bg-gray-600"
                                >
                                    <svg
                                        class="w-5 h-5 rotate-90 rtl:-rotate-90"
                                        aria-hidden="true"
                                        xmlns="http://www.w3.org/2000/svg"
                                        fill="currentColor"
                                        viewBox="0 0 18 20"
                                    >
                                        <path d="m17.914 18.594-8-18a1 1 0 0 0-1.828 0l-8 18a1 1 0 0 0 1.157 1.376L8 18.281V9a1 1 0 0 1 2 0v9.281l6.758 1.689a1 1 0 0 0 1.156-1.376Z" />
                                    </svg>
                                    <span class="sr-only">Haruka</span>
                                </button>
                            }
                        }
                    }}
                </div>
            </form>
        </div>
    }
}
