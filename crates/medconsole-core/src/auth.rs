use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Trimmed username, as sent on the wire.
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterRequest {
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        }
    }
}

/// Identity fields cached alongside the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "accessToken")]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<Identity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    #[serde(alias = "accessToken")]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_response_shape() {
        let resp: LoginResponse = serde_json::from_value(json!({
            "token": "abc",
            "refreshToken": "r-1",
            "user": {"id": 3, "username": "admin", "name": "Admin User"}
        }))
        .unwrap();

        assert_eq!(resp.token.as_deref(), Some("abc"));
        let user = resp.user.unwrap();
        assert_eq!(user.id.as_deref(), Some("3"));
        assert_eq!(user.display_name.as_deref(), Some("Admin User"));
    }

    #[test]
    fn test_register_request_serializes_camel_case() {
        let req = RegisterRequest {
            name: " Jane Doe ".into(),
            username: "jane".into(),
            password: "Str0ng!pw".into(),
            confirm_password: "Str0ng!pw".into(),
        }
        .normalized();
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["name"], "Jane Doe");
        assert_eq!(value["confirmPassword"], "Str0ng!pw");
    }
}
