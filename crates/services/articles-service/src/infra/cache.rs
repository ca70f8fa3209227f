//! Redis connections and the batched command executor.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, RedisError, Value};
use uow::{Command, PipelineExecutor, Reply, StoreError, UowError, UowResult};

pub const REDIS_STORE: &str = "redis";

/// Redis connection wrapper. Cheap to clone; clones share the multiplexed
/// connection.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to the Redis instance at `url`.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }

    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    /// Check connectivity with a PING.
    pub async fn ping(&self) -> Result<(), RedisError> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    /// Executor that sends staged commands over this connection.
    pub fn pipeline(&self) -> RedisPipeline {
        RedisPipeline {
            connection: self.connection.clone(),
        }
    }
}

/// Runs a command batch as one MULTI/EXEC pipeline.
pub struct RedisPipeline {
    connection: ConnectionManager,
}

#[async_trait]
impl PipelineExecutor for RedisPipeline {
    fn store(&self) -> &'static str {
        REDIS_STORE
    }

    async fn execute(&self, commands: Vec<Command>) -> UowResult<Vec<Reply>> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in &commands {
            append(&mut pipe, command);
        }

        let mut conn = self.connection.clone();
        let values: Vec<Value> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| UowError::from(StoreError::new(REDIS_STORE, e)))?;

        values.into_iter().map(into_reply).collect()
    }
}

fn append(pipe: &mut redis::Pipeline, command: &Command) {
    match command {
        Command::HashSet { key, fields } => {
            pipe.cmd("HSET").arg(key);
            for (field, value) in fields {
                pipe.arg(field).arg(value);
            }
        }
        Command::HashMultiGet { key, fields } => {
            pipe.cmd("HMGET").arg(key).arg(fields);
        }
        Command::Delete { keys } => {
            pipe.cmd("DEL").arg(keys);
        }
        Command::Keys { pattern } => {
            pipe.cmd("KEYS").arg(pattern);
        }
        Command::Set {
            key,
            value,
            expire_secs,
        } => {
            pipe.cmd("SET").arg(key).arg(value);
            if let Some(secs) = expire_secs {
                pipe.arg("EX").arg(*secs);
            }
        }
        Command::Get { key } => {
            pipe.cmd("GET").arg(key);
        }
    }
}

fn into_reply(value: Value) -> UowResult<Reply> {
    let reply = match value {
        Value::Nil => Reply::Nil,
        Value::Okay => Reply::Ok,
        Value::Int(n) => Reply::Int(n),
        Value::SimpleString(text) => Reply::Text(text),
        Value::BulkString(bytes) => Reply::Text(
            String::from_utf8(bytes).map_err(|e| UowError::from(StoreError::new(REDIS_STORE, e)))?,
        ),
        Value::Array(items) | Value::Set(items) => {
            Reply::Array(items.into_iter().map(into_reply).collect::<UowResult<_>>()?)
        }
        other => {
            return Err(UowError::unexpected_reply(format!(
                "unsupported redis value {:?}",
                other
            )))
        }
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_reply_decodes_nested_arrays() {
        let value = Value::Array(vec![
            Value::BulkString(b"alice".to_vec()),
            Value::Nil,
            Value::Int(3),
        ]);

        let reply = into_reply(value).unwrap();

        assert_eq!(
            reply,
            Reply::Array(vec![Reply::Text("alice".into()), Reply::Nil, Reply::Int(3)])
        );
    }

    #[test]
    fn test_into_reply_rejects_invalid_utf8() {
        let err = into_reply(Value::BulkString(vec![0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, UowError::Store(_)));
    }

    #[test]
    fn test_set_with_expiry_appends_ex() {
        let mut pipe = redis::pipe();
        append(
            &mut pipe,
            &Command::Set {
                key: "refresh_token:1".into(),
                value: "jwt".into(),
                expire_secs: Some(60),
            },
        );

        let packed = String::from_utf8_lossy(&pipe.get_packed_pipeline()).to_string();
        assert!(packed.contains("SET"));
        assert!(packed.contains("EX"));
        assert!(packed.contains("60"));
    }
}
