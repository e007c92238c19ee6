use crate::interop;
use labadain_client::commands::interactions::{Interaction, InteractionCounts, InteractionState};
use labadain_client::entities::message::{Message as Msg, Role};
use labadain_client::{Client, StatusPhase};
use leptos::logging::warn;
use leptos::*;

pub fn render_markdown(content: &str) -> String {
    let parser = pulldown_cmark::Parser::new(content);
    let mut parsed = String::new();
    pulldown_cmark::html::push_html(&mut parsed, parser);
    parsed
}

#[component]
pub fn Message(message: Msg, user_id: Option<i64>) -> impl IntoView {
    let is_me = message.role == Role::User;
    let pending = message.is_pending();
    let actions = match (message.role, message.id, user_id) {
        (Role::Assistant, Some(id), Some(user_id)) if !message.streaming => {
            let content = message.content.clone();
            Some(view! { <Actions message_id=id user_id content /> })
        }
        _ => None,
    };
    let parsed = render_markdown(&message.content);
    view! {
        <div class="flex items-start m-5 gap-2.5" class:flex-row-reverse=move || is_me>
            <div class="flex flex-col gap-1 max-w-[90%]">
                <span class="text-sm font-semibold text-gray-900 dark:text-white">
                    {if is_me { "Ita" } else { "Labadain" }}
                </span>
                <div class="flex flex-col leading-1.5 p-4 border-gray-200 bg-gray-100 rounded-e-xl rounded-es-xl dark:bg-gray-700">
                    {if pending {
                        view! { <PendingStatus /> }.into_view()
                    } else {
                        view! {
                            <div class="text-sm font-normal text-gray-900 dark:text-white" inner_html=parsed />
                        }
                            .into_view()
                    }}
                </div>
                {actions}
            </div>
        </div>
    }
}

/// Label shown until the first fragment of a reply arrives.
#[component]
fn PendingStatus() -> impl IntoView {
    let (phase, set_phase) = create_signal(StatusPhase::Processing);
    let handles: Vec<_> = StatusPhase::schedule()
        .into_iter()
        .filter_map(|(after, next)| set_timeout_with_handle(move || set_phase.set(next), after).ok())
        .collect();
    on_cleanup(move || {
        for handle in handles {
            handle.clear();
        }
    });
    view! {
        <span class="text-sm italic text-gray-500 dark:text-gray-400 animate-pulse">
            {move || phase.get().label()}
        </span>
    }
}

#[component]
fn Actions(message_id: i64, user_id: i64, content: String) -> impl IntoView {
    let client = store_value(expect_context::<Client>());
    let content = store_value(content);
    let (state, set_state) = create_signal(InteractionState::default());
    let (counts, set_counts) = create_signal(InteractionCounts::default());

    spawn_local(async move {
        match client.get_value().interaction_counts(message_id).await {
            Ok(loaded) => set_counts.set(loaded),
            Err(err) => warn!("Could not load interactions of {message_id}: {err}"),
        }
    });

    let interact = move |interaction: Interaction| {
        let mut next = state.get_untracked();
        if !next.apply(interaction) {
            return;
        }
        set_state.set(next);
        spawn_local(async move {
            match client
                .get_value()
                .record_interaction(message_id, interaction, user_id)
                .await
            {
                Ok(updated) => set_counts.set(updated),
                Err(err) => warn!("Could not record {interaction:?}: {err}"),
            }
        });
    };

    let copy = move |_| {
        let text = content.get_value();
        spawn_local(async move {
            match interop::copy_text(&text).await {
                Ok(()) => interact(Interaction::Copy),
                Err(err) => warn!("Could not copy message {message_id}: {err:?}"),
            }
        });
    };

    view! {
        <div class="flex flex-row gap-3 text-sm text-gray-500 dark:text-gray-400">
            <button type="button" title="Kopia" on:click=copy>
                "📋 "
                {move || counts.get().copies}
            </button>
            <button
                type="button"
                class=("text-blue-600", move || state.get().liked)
                on:click=move |_| interact(Interaction::Like)
            >
                "👍 "
                {move || counts.get().likes}
            </button>
            <button
                type="button"
                class=("text-red-600", move || state.get().disliked)
                on:click=move |_| interact(Interaction::Dislike)
            >
                "👎 "
                {move || counts.get().dislikes}
            </button>
        </div>
    }
}
