use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["google", "accounts", "id"], js_name = initialize, catch)]
    fn google_initialize(config: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["google", "accounts", "id"], js_name = renderButton, catch)]
    fn google_render_button(parent: &web_sys::HtmlElement, options: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["AppleID", "auth"], js_name = init, catch)]
    fn apple_init(config: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = ["AppleID", "auth"], js_name = signIn, catch)]
    async fn apple_sign_in_popup() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["navigator", "clipboard"], js_name = writeText, catch)]
    async fn write_text(text: &str) -> Result<JsValue, JsValue>;
}

#[derive(Serialize)]
struct GoogleInit<'a> {
    client_id: &'a str,
}

#[derive(Serialize)]
struct GoogleButton {
    theme: &'static str,
    size: &'static str,
    text: &'static str,
}

#[derive(Deserialize)]
struct GoogleResponse {
    credential: Option<String>,
}

/// Renders the Google sign-in button into `parent`. `on_credential` gets the
/// ID token, or an empty string when Google returned none.
pub fn google_button<F>(client_id: &str, parent: &web_sys::HtmlElement, mut on_credential: F) -> Result<(), JsValue>
where
    F: FnMut(String) + 'static,
{
    let callback = Closure::<dyn FnMut(JsValue)>::new(move |response: JsValue| {
        let credential = serde_wasm_bindgen::from_value::<GoogleResponse>(response)
            .ok()
            .and_then(|response| response.credential)
            .unwrap_or_default();
        on_credential(credential);
    });
    let config = serde_wasm_bindgen::to_value(&GoogleInit { client_id })?;
    js_sys::Reflect::set(&config, &"callback".into(), callback.as_ref())?;
    google_initialize(&config)?;
    // GIS keeps calling the callback for the lifetime of the page.
    callback.forget();

    let options = serde_wasm_bindgen::to_value(&GoogleButton {
        theme: "outline",
        size: "large",
        text: "signin_with",
    })?;
    google_render_button(parent, options)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppleInit<'a> {
    client_id: &'a str,
    scope: &'static str,
    #[serde(rename = "redirectURI")]
    redirect_uri: String,
    use_popup: bool,
}

#[derive(Debug, Deserialize)]
struct AppleResponse {
    authorization: AppleAuthorization,
    user: Option<AppleUser>,
}

#[derive(Debug, Deserialize)]
struct AppleAuthorization {
    id_token: String,
}

/// Apple only sends the user's name on the first sign-in.
#[derive(Debug, Deserialize)]
struct AppleUser {
    name: Option<AppleName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppleName {
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct AppleSignIn {
    pub id_token: String,
    pub name: Option<String>,
}

impl From<AppleResponse> for AppleSignIn {
    fn from(response: AppleResponse) -> Self {
        let name = response
            .user
            .and_then(|user| user.name)
            .and_then(|name| {
                let full = [name.first_name, name.last_name]
                    .into_iter()
                    .flatten()
                    .map(|part| part.trim().to_string())
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                (!full.is_empty()).then_some(full)
            });
        AppleSignIn {
            id_token: response.authorization.id_token,
            name,
        }
    }
}

/// Opens the Apple sign-in popup.
pub async fn apple_sign_in(client_id: &str) -> Result<AppleSignIn, JsValue> {
    let redirect_uri = leptos::window().location().origin()?;
    apple_init(serde_wasm_bindgen::to_value(&AppleInit {
        client_id,
        scope: "name email",
        redirect_uri,
        use_popup: true,
    })?)?;
    let response = apple_sign_in_popup().await?;
    let response: AppleResponse = serde_wasm_bindgen::from_value(response)?;
    Ok(response.into())
}

pub async fn copy_text(text: &str) -> Result<(), JsValue> {
    write_text(text).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_in(user: serde_json::Value) -> AppleSignIn {
        let mut response = serde_json::json!({
            "authorization": { "id_token": "apple.jwt", "code": "c" }
        });
        if !user.is_null() {
            response["user"] = user;
        }
        serde_json::from_value::<AppleResponse>(response).unwrap().into()
    }

    #[test]
    fn apple_name_only_on_first_sign_in() {
        let first = sign_in(serde_json::json!({
            "email": "ana@privaterelay.appleid.com",
            "name": { "firstName": "Ana", "lastName": " Soares " }
        }));
        assert_eq!(first.id_token, "apple.jwt");
        assert_eq!(first.name.as_deref(), Some("Ana Soares"));

        let blank = sign_in(serde_json::json!({ "name": { "firstName": " " } }));
        assert_eq!(blank.name, None);

        assert_eq!(sign_in(serde_json::Value::Null).name, None);
    }
}
