//! Article topics.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{TOPIC_NEWS_ID, TOPIC_SCIENCE_ID, TOPIC_TECH_ID};

/// Article topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Topic {
    pub id: Uuid,
    pub name: String,
}

impl Topic {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Topics every installation starts with
pub fn seeded_topics() -> Vec<Topic> {
    vec![
        Topic::new(TOPIC_TECH_ID, "Техническая"),
        Topic::new(TOPIC_SCIENCE_ID, "Научная"),
        Topic::new(TOPIC_NEWS_ID, "Новостная"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_topics_have_distinct_ids() {
        let topics = seeded_topics();
        assert_eq!(topics.len(), 3);
        assert_ne!(topics[0].id, topics[1].id);
        assert_ne!(topics[1].id, topics[2].id);
        assert_ne!(topics[0].id, topics[2].id);
    }
}
