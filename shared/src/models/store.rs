//! Store and membership models

use serde::{Deserialize, Serialize};

/// Membership role within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreRole {
    Owner,
    Editor,
    Viewer,
}

impl StoreRole {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }

    /// Staff roles may mutate orders and stock; viewers only read.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }
}

/// Store entity — one tenant's independently branded catalog and order stream
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Store {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    /// Unique across all stores, immutable post-creation
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create store payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreCreate {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Store membership row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StoreMember {
    pub store_id: i64,
    pub user_id: String,
    pub role: String,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip_and_staff() {
        for role in [StoreRole::Owner, StoreRole::Editor, StoreRole::Viewer] {
            assert_eq!(StoreRole::from_db(role.as_db()), Some(role));
        }
        assert!(StoreRole::Owner.is_staff());
        assert!(StoreRole::Editor.is_staff());
        assert!(!StoreRole::Viewer.is_staff());
        assert_eq!(StoreRole::from_db("admin"), None);
    }
}
