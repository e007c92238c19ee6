use super::{check, Client};
use crate::attachment::Attachment;
use crate::commands::chats::SavedChat;
use crate::conversation::{ChatBackend, StreamRequest};
use crate::entities::chat::ChatId;
use crate::entities::message::Message;
use crate::Error;
use bytes::Bytes;
use futures::stream::LocalBoxStream;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::Serialize;
use tracing::info;

/// Raw body of a streaming reply.
pub type ByteStream = LocalBoxStream<'static, Result<Bytes, Error>>;

#[derive(Serialize)]
struct Payload<'a> {
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    force_search: Option<bool>,
}

impl Client {
    pub async fn stream_chat(
        &self,
        messages: &[Message],
        force_search: Option<bool>,
    ) -> Result<ByteStream, Error> {
        let url = self.url(&self.config.stream_path)?;
        info!("Sending {} messages to {url}", messages.len());
        let res = self
            .http
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&Payload {
                messages,
                force_search,
            })
            .send()
            .await?;
        let res = check(res, "Failed to get a reply").await?;
        Ok(body_stream(res))
    }

    pub async fn upload_chat(
        &self,
        input_text: &str,
        attachment: &Attachment,
        messages: &[Message],
        force_search: bool,
    ) -> Result<ByteStream, Error> {
        let url = self.url(&self.config.upload_path)?;
        let mut file = Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone());
        if let Some(mime) = &attachment.mime {
            file = file.mime_str(mime)?;
        }
        let form = Form::new()
            .text("input_text", input_text.to_string())
            .part("file", file)
            .text("messages", serde_json::to_string(messages)?)
            .text("force_search", force_search.to_string());
        info!(
            "Uploading {} ({} bytes) to {url}",
            attachment.file_name,
            attachment.size()
        );
        let res = self
            .http
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .multipart(form)
            .send()
            .await?;
        let res = check(res, "Failed to upload file").await?;
        Ok(body_stream(res))
    }
}

fn body_stream(res: Response) -> ByteStream {
    res.bytes_stream()
        .map(|chunk| chunk.map_err(Error::from))
        .boxed_local()
}

impl ChatBackend for Client {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, Error> {
        match &request.attachment {
            Some(attachment) => {
                self.upload_chat(
                    &request.input_text,
                    attachment,
                    &request.messages,
                    request.force_search,
                )
                .await
            }
            None => {
                let force_search = request.force_search.then_some(true);
                self.stream_chat(&request.messages, force_search).await
            }
        }
    }

    async fn save_chat(
        &self,
        user_id: i64,
        chat_id: Option<&ChatId>,
        messages: &[Message],
    ) -> Result<SavedChat, Error> {
        Client::save_chat(self, user_id, chat_id, messages).await
    }
}
