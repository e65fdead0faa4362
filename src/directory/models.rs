//! Directory user models from the Microsoft Graph `users` collection.

use serde::Deserialize;

/// A user as returned by Graph; every field may be missing or null.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub mail: Option<String>,
}

/// One page of the `GET /users` response.
#[derive(Debug, Deserialize)]
pub(crate) struct UserListResponse {
    #[serde(default)]
    pub value: Vec<GraphUser>,

    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// A directory user ready for printing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecord {
    pub display_name: String,
    pub id: String,
    pub mail: String,
}

impl From<GraphUser> for UserRecord {
    fn from(user: GraphUser) -> Self {
        Self {
            display_name: user.display_name.unwrap_or_default(),
            id: user.id.unwrap_or_default(),
            mail: user.mail.unwrap_or_default(),
        }
    }
}
