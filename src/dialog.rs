use leptos::*;

pub const DIALOG_TITLE: &str = "Labadain LX-361";

/// Modal asking the user to confirm a destructive action.
#[component]
pub fn Confirm(
    #[prop(into)] text: String,
    #[prop(into)] on_cancel: Callback<()>,
    #[prop(into)] on_confirm: Callback<()>,
) -> impl IntoView {
    view! {
        <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/50">
            <div class="w-80 p-5 rounded-lg bg-white text-left dark:bg-gray-800 dark:text-white">
                <h3 class="mb-2 font-semibold">{DIALOG_TITLE}</h3>
                <p class="mb-4 text-sm text-gray-600 dark:text-gray-300">{text}</p>
                <div class="flex justify-end gap-2">
                    <button
                        type="button"
                        class="px-4 py-2 text-sm rounded-lg border border-gray-300 dark:border-gray-600"
                        on:click=move |_| on_cancel.call(())
                    >
                        "Kansela"
                    </button>
                    <button
                        type="button"
                        class="px-4 py-2 text-sm text-white rounded-lg bg-red-600 hover:bg-red-700"
                        on:click=move |_| on_confirm.call(())
                    >
                        "Hamoos"
                    </button>
                </div>
            </div>
        </div>
    }
}
