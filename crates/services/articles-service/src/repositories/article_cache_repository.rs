//! Popular-article cache.
//!
//! Each cached article is a hash under `article:{id}`. Every method only
//! stages a command on the key-value session and returns the index of its
//! reply in the next commit; [`ArticleCacheRepository::decode`] turns an
//! HMGET reply back into an [`Article`].

use std::sync::Arc;

use chrono::NaiveDateTime;
use uow::{
    Capabilities, Capability, KvSession, Reply, Repository, SessionId, StoreSession, UowError,
    UowResult,
};
use uuid::Uuid;

use super::RepositoryName;
use domain::{Article, DATETIME_STRING_FORMAT};

pub const ARTICLE_KEY_PREFIX: &str = "article:";

const ARTICLE_FIELDS: [&str; 8] = [
    "id",
    "user_id",
    "user_name",
    "creation_date",
    "topic_name",
    "topic_id",
    "text",
    "views",
];

pub struct ArticleCacheRepository {
    session: Arc<KvSession>,
    capabilities: Capabilities,
}

impl ArticleCacheRepository {
    pub fn new(session: Arc<KvSession>, capabilities: Capabilities) -> Self {
        Self {
            session,
            capabilities,
        }
    }

    pub fn key(id: Uuid) -> String {
        format!("{ARTICLE_KEY_PREFIX}{id}")
    }

    /// Stage a full write of `article`.
    pub fn create(&self, article: &Article) -> UowResult<usize> {
        self.require(Capability::Create)?;
        let fields = vec![
            ("id".to_string(), article.id.to_string()),
            ("user_id".to_string(), article.user_id.to_string()),
            ("user_name".to_string(), article.user_name.clone()),
            (
                "creation_date".to_string(),
                article
                    .creation_date
                    .format(DATETIME_STRING_FORMAT)
                    .to_string(),
            ),
            ("topic_name".to_string(), article.topic_name.clone()),
            ("topic_id".to_string(), article.topic_id.to_string()),
            ("text".to_string(), article.text.clone()),
            ("views".to_string(), article.views.to_string()),
        ];
        Ok(self.session.hash_set(Self::key(article.id), fields))
    }

    /// Stage a write of the fields an author can edit, leaving the cached
    /// view count untouched.
    pub fn refresh(&self, article: &Article) -> UowResult<usize> {
        self.require(Capability::Update)?;
        let fields = vec![
            ("topic_name".to_string(), article.topic_name.clone()),
            ("topic_id".to_string(), article.topic_id.to_string()),
            ("text".to_string(), article.text.clone()),
        ];
        Ok(self.session.hash_set(Self::key(article.id), fields))
    }

    /// Stage an HMGET of every article field under `key`.
    pub fn retrieve(&self, key: &str) -> UowResult<usize> {
        self.require(Capability::Retrieve)?;
        Ok(self.session.hash_multi_get(key, &ARTICLE_FIELDS))
    }

    /// Stage a lookup of every cached article key.
    pub fn retrieve_keys(&self) -> UowResult<usize> {
        self.require(Capability::Retrieve)?;
        Ok(self.session.keys(format!("{ARTICLE_KEY_PREFIX}*")))
    }

    /// Stage a DEL of `keys`. Nothing is staged for an empty list.
    pub fn delete(&self, keys: Vec<String>) -> UowResult<Option<usize>> {
        self.require(Capability::Delete)?;
        if keys.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.session.delete(keys)))
    }

    /// Decode an HMGET reply staged by [`retrieve`](Self::retrieve).
    /// A missing entry decodes to `None`.
    pub fn decode(reply: Reply) -> UowResult<Option<Article>> {
        let values = reply.into_optional_texts()?;
        if values.iter().all(Option::is_none) {
            return Ok(None);
        }
        if values.len() != ARTICLE_FIELDS.len() || values.iter().any(Option::is_none) {
            tracing::warn!("Skipping partially cached article");
            return Ok(None);
        }

        let mut fields = values.into_iter().flatten();
        let mut next = |name: &str| {
            fields
                .next()
                .ok_or_else(|| UowError::unexpected_reply(format!("missing field {name}")))
        };

        let id = parse_uuid(&next("id")?)?;
        let user_id = parse_uuid(&next("user_id")?)?;
        let user_name = next("user_name")?;
        let creation_date = NaiveDateTime::parse_from_str(&next("creation_date")?, DATETIME_STRING_FORMAT)
            .map_err(|e| UowError::unexpected_reply(format!("bad creation_date: {e}")))?
            .and_utc();
        let topic_name = next("topic_name")?;
        let topic_id = parse_uuid(&next("topic_id")?)?;
        let text = next("text")?;
        let views = next("views")?
            .parse::<i64>()
            .map_err(|e| UowError::unexpected_reply(format!("bad views: {e}")))?;

        Ok(Some(Article {
            id,
            user_id,
            user_name,
            creation_date,
            topic_id,
            topic_name,
            text,
            views,
        }))
    }
}

fn parse_uuid(value: &str) -> UowResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| UowError::unexpected_reply(format!("bad uuid {value}: {e}")))
}

impl Repository for ArticleCacheRepository {
    fn name(&self) -> &str {
        RepositoryName::ArticleCache.as_str()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn session_id(&self) -> SessionId {
        self.session.id()
    }
}
