use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory bearer-token map. Clones share the same sessions.
#[derive(Debug, Clone, Default)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<String, Session>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, user: &User) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let session = Session {
            user_id: user.id.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        self.inner.write().await.insert(token.clone(), session);
        token
    }

    pub async fn get(&self, token: &str) -> Option<Session> {
        self.inner.read().await.get(token).cloned()
    }

    pub async fn remove(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "abc123".into(),
            email: "alice@example.com".into(),
            name: Some("alice".into()),
        }
    }

    #[tokio::test]
    async fn tokens_resolve_until_removed() {
        let sessions = Sessions::new();
        let token = sessions.create(&user()).await;
        assert_eq!(token.len(), 32);

        let session = sessions.get(&token).await.unwrap();
        assert_eq!(session.user_id, "abc123");
        assert_eq!(session.email, "alice@example.com");

        assert!(sessions.remove(&token).await);
        assert!(sessions.get(&token).await.is_none());
        assert!(!sessions.remove(&token).await);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let sessions = Sessions::new();
        let other = sessions.clone();
        let a = sessions.create(&user()).await;
        let b = other.create(&user()).await;
        assert_ne!(a, b);
        assert!(other.get(&a).await.is_some());
        assert!(sessions.get(&b).await.is_some());
    }
}
