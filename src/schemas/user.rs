use serde::Deserialize;
use uuid::Uuid;

/// User payload from the Identity collaborator. Only display data is
/// consumed here; the id is required so envelope shapes never mis-parse as a
/// bare user object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserInfo {
    #[serde(alias = "Id")]
    pub(crate) id: Uuid,
    #[serde(default, alias = "DisplayName")]
    pub(crate) display_name: Option<String>,
    #[serde(default, alias = "Email")]
    pub(crate) email: Option<String>,
}
