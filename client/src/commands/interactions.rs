use super::{check, Client};
use crate::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Like,
    Dislike,
    Copy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InteractionCounts {
    pub likes: u64,
    pub dislikes: u64,
    pub copies: u64,
    pub share_fb: u64,
    pub share_linkedin: u64,
    pub share_link: u64,
}

#[derive(Serialize)]
struct Interact {
    message_id: i64,
    interaction_type: Interaction,
    user_id: i64,
}

impl Client {
    pub async fn interaction_counts(&self, message_id: i64) -> Result<InteractionCounts, Error> {
        let url = self.url(&format!("/messages/{message_id}/interactions"))?;
        let res = self.http.get(url).send().await?;
        Ok(check(res, "Failed to load interactions").await?.json().await?)
    }

    pub async fn record_interaction(
        &self,
        message_id: i64,
        interaction: Interaction,
        user_id: i64,
    ) -> Result<InteractionCounts, Error> {
        let url = self.url(&format!("/messages/{message_id}/interact"))?;
        let res = self
            .http
            .post(url)
            .json(&Interact {
                message_id,
                interaction_type: interaction,
                user_id,
            })
            .send()
            .await?;
        Ok(check(res, "Failed to record interaction").await?.json().await?)
    }
}

/// What the current user did to one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionState {
    pub liked: bool,
    pub disliked: bool,
}

impl InteractionState {
    /// Returns `false` when the interaction changes nothing and should not be sent.
    pub fn apply(&mut self, interaction: Interaction) -> bool {
        match interaction {
            Interaction::Like if self.liked => false,
            Interaction::Like => {
                self.liked = true;
                self.disliked = false;
                true
            }
            Interaction::Dislike if self.disliked => false,
            Interaction::Dislike => {
                self.disliked = true;
                self.liked = false;
                true
            }
            _ => true,
        }
    }
}
