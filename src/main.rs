mod account;
mod app;
mod conversation;
mod dialog;
mod interop;
mod loading;
mod logging;
mod login;
mod message;
mod nav;
mod state;

use app::*;
use leptos::*;

fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    mount_to_body(|| {
        view! { <App /> }
    })
}
