use crate::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl User {
    pub fn bearer(&self) -> Result<&str, Error> {
        match self.token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::Unauthorized(
                "Sesaun la válidu. Favór halo login fali.".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_requires_token() {
        let mut user: User =
            serde_json::from_str(r#"{"id":3,"email":"maria@labadain.tl","name":"maria"}"#).unwrap();
        assert!(matches!(user.bearer(), Err(Error::Unauthorized(_))));
        user.token = Some(String::new());
        assert!(matches!(user.bearer(), Err(Error::Unauthorized(_))));
        user.token = Some("abc".to_string());
        assert_eq!(user.bearer().unwrap(), "abc");
    }
}
