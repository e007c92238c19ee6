use crate::interop;
use crate::state;
use labadain_client::commands::login::{Credentials, SIGNUP_CONFIRMATION};
use labadain_client::entities::user::User;
use labadain_client::Client;
use leptos::leptos_dom::ev::SubmitEvent;
use leptos::logging::warn;
use leptos::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Login,
    Signup,
}

const APPLE_FAILED: &str = "Apple authentication failed";

const INPUT: &str = "bg-gray-50 border border-gray-300 text-gray-900 text-sm rounded-lg focus:ring-blue-500 focus:border-blue-500 block w-full p-2.5 dark:bg-gray-700 dark:border-gray-600 dark:placeholder-gray-400 dark:text-white";

#[component]
pub fn Login() -> impl IntoView {
    let client = store_value(expect_context::<Client>());
    let user = expect_context::<RwSignal<Option<User>>>();

    let (mode, set_mode) = create_signal(Mode::Login);
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (name, set_name) = create_signal(String::new());
    let (busy, set_busy) = create_signal(false);
    let (message, set_message) = create_signal(None::<String>);
    let (confirm_pending, set_confirm_pending) = create_signal(false);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let name = name.get_untracked();
        let credentials = Credentials::new(
            &email.get_untracked(),
            &password.get_untracked(),
            Some(name.as_str()),
        );
        let mode = mode.get_untracked();
        set_busy.set(true);
        set_message.set(None);
        spawn_local(async move {
            let client = client.get_value();
            match mode {
                Mode::Login => match client.login(&credentials).await {
                    Ok(logged_in) => {
                        state::save_user(&logged_in);
                        user.set(Some(logged_in));
                    }
                    Err(err) => set_message.set(Some(err.user_message())),
                },
                Mode::Signup => match client.signup(&credentials).await {
                    Ok(_) => {
                        set_mode.set(Mode::Login);
                        set_password.set(String::new());
                        set_confirm_pending.set(true);
                        set_message.set(Some(SIGNUP_CONFIRMATION.to_string()));
                    }
                    Err(err) => set_message.set(Some(err.user_message())),
                },
            }
            set_busy.set(false);
        });
    };

    let resend = move |_| {
        let address = email.get_untracked();
        spawn_local(async move {
            match client.get_value().resend_confirmation(&address).await {
                Ok(()) => set_message.set(Some(SIGNUP_CONFIRMATION.to_string())),
                Err(err) => set_message.set(Some(err.user_message())),
            }
        });
    };

    let finish = move |result: Result<User, labadain_client::Error>| {
        match result {
            Ok(logged_in) => {
                state::save_user(&logged_in);
                user.set(Some(logged_in));
            }
            Err(err) => set_message.set(Some(err.user_message())),
        }
        set_busy.set(false);
    };

    let (google_id, apple_id) = client.with_value(|client| {
        let config = client.config();
        (config.google_client_id.clone(), config.apple_client_id.clone())
    });

    let google_ref = create_node_ref::<html::Div>();
    if let Some(client_id) = google_id {
        google_ref.on_load(move |div| {
            let on_credential = move |credential: String| {
                set_busy.set(true);
                set_message.set(None);
                spawn_local(async move {
                    let Some(client) = client.try_get_value() else {
                        return;
                    };
                    finish(client.login_google(&credential).await);
                });
            };
            if let Err(err) = interop::google_button(&client_id, &div, on_credential) {
                warn!("Google sign-in unavailable: {err:?}");
            }
        });
    }

    let apple = apple_id.map(|client_id| {
        let sign_in = move |_| {
            let client_id = client_id.clone();
            set_message.set(None);
            spawn_local(async move {
                let signed = match interop::apple_sign_in(&client_id).await {
                    Ok(signed) => signed,
                    Err(err) => {
                        warn!("Apple sign-in failed: {err:?}");
                        set_message.set(Some(APPLE_FAILED.to_string()));
                        return;
                    }
                };
                let Some(client) = client.try_get_value() else {
                    return;
                };
                set_busy.set(true);
                finish(client.login_apple(&signed.id_token, signed.name.as_deref()).await);
            });
        };
        view! {
            <button
                type="button"
                class="text-white bg-black hover:bg-gray-800 font-medium rounded-lg text-sm px-5 py-2.5"
                disabled=move || busy.get()
                on:click=sign_in
            >
                "Sign in with Apple"
            </button>
        }
    });

    let toggle = move |_| {
        set_message.set(None);
        set_mode.update(|mode| {
            *mode = match mode {
                Mode::Login => Mode::Signup,
                Mode::Signup => Mode::Login,
            }
        });
    };

    view! {
        <div class="flex items-center justify-center border border-gray-200 bg-gray-50 dark:bg-gray-800 dark:border-gray-700 w-full h-screen">
            <form class="w-80 flex flex-col gap-3" on:submit=submit>
                <h1 class="text-xl font-semibold text-gray-900 dark:text-white">
                    {move || if mode.get() == Mode::Login { "Login" } else { "Kria konta" }}
                </h1>
                <input
                    type="email"
                    required
                    class=INPUT
                    placeholder="Email"
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    prop:value=email
                />
                <Show when=move || mode.get() == Mode::Signup>
                    <input
                        type="text"
                        class=INPUT
                        placeholder="Naran"
                        on:input=move |ev| set_name.set(event_target_value(&ev))
                        prop:value=name
                    />
                </Show>
                <input
                    type="password"
                    required
                    class=INPUT
                    placeholder="Password"
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    prop:value=password
                />
                {move || {
                    message
                        .get()
                        .map(|message| {
                            view! { <p class="text-sm text-gray-700 dark:text-gray-300">{message}</p> }
                        })
                }}
                <button
                    type="submit"
                    class="text-white bg-blue-700 hover:bg-blue-800 focus:ring-4 focus:ring-blue-300 font-medium rounded-lg text-sm px-5 py-2.5 dark:bg-blue-600 dark:hover:bg-blue-700 focus:outline-none dark:focus:ring-blue-800"
                    class:cursor-not-allowed=move || busy.get()
                    disabled=move || busy.get()
                >
                    {move || match (busy.get(), mode.get()) {
                        (true, _) => "Hein...",
                        (false, Mode::Login) => "Login",
                        (false, Mode::Signup) => "Rejista",
                    }}
                </button>
                <button type="button" class="text-sm text-blue-600 dark:text-blue-400" on:click=toggle>
                    {move || {
                        if mode.get() == Mode::Login {
                            "La iha konta? Rejista"
                        } else {
                            "Iha ona konta? Login"
                        }
                    }}
                </button>
                <div node_ref=google_ref class="flex justify-center"></div>
                {apple}
                <Show when=move || confirm_pending.get()>
                    <button
                        type="button"
                        class="text-sm text-gray-500 dark:text-gray-400"
                        on:click=resend
                    >
                        "Haruka fali email konfirmasaun"
                    </button>
                </Show>
            </form>
        </div>
    }
}
