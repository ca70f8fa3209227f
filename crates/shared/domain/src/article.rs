//! Article domain entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::topic::Topic;
use crate::user::User;

/// Article together with its author's name and topic name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Article {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub creation_date: DateTime<Utc>,
    pub topic_id: Uuid,
    pub topic_name: String,
    pub text: String,
    pub views: i64,
}

impl Article {
    /// A freshly written article with no views
    pub fn new(author: &User, topic: &Topic, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: author.id,
            user_name: author.name.clone(),
            creation_date: Utc::now(),
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            text,
            views: 0,
        }
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Fail unless `user_id` wrote this article.
    pub fn ensure_author(&self, user_id: Uuid) -> DomainResult<()> {
        if self.is_authored_by(user_id) {
            Ok(())
        } else {
            Err(DomainError::NotAuthor)
        }
    }

    /// Merge an edit. Missing fields keep their current value; the author,
    /// creation date and view count never change.
    pub fn apply(&mut self, topic: Option<Topic>, text: Option<String>) {
        if let Some(topic) = topic {
            self.topic_id = topic.id;
            self.topic_name = topic.name;
        }
        if let Some(text) = text {
            self.text = text;
        }
    }

    pub fn record_view(&mut self) {
        self.views += 1;
    }
}

/// Requested edit of an article
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleChanges {
    pub topic_id: Option<Uuid>,
    pub text: Option<String>,
}

impl ArticleChanges {
    pub fn is_empty(&self) -> bool {
        self.topic_id.is_none() && self.text.is_none()
    }
}
