//! Fire-once warnings raised by their call sites. Each test checks the
//! global set after its own action, so test order does not matter.

mod common;

use common::{person_config, CountingDriver};
use docmap::domain::warnings::{self, Warning};
use docmap::{FieldType, Instance, ModelConfig, ModelRegistry, QueryExecutor};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_string_written_to_binary_field_warns() {
    let stored = FieldType::Binary.coerce("avatar", json!("hi")).unwrap();
    assert_eq!(stored, json!({"$binary": "6869"}));
    assert!(warnings::global().has_fired(Warning::StringStoredAsBinary));
}

#[tokio::test]
async fn test_changing_persisted_shard_key_warns() {
    let executor = QueryExecutor::new(Arc::new(CountingDriver::new()));
    let config = ModelRegistry::new().register_config(person_config()).unwrap();
    let mut ada = Instance::new(config);
    ada.write_attribute("region", json!("eu")).unwrap();
    executor.insert(&mut ada).await.unwrap();

    ada.write_attribute("region", json!("us")).unwrap();
    assert!(warnings::global().has_fired(Warning::ShardKeyChanged));
}

#[tokio::test]
async fn test_write_without_shard_key_value_warns() {
    let executor = QueryExecutor::new(Arc::new(CountingDriver::new()));
    let config = Arc::new(
        ModelConfig::new("Device")
            .field("serial", FieldType::String)
            .field("site", FieldType::String)
            .shard_key(&["site"])
            .finalize()
            .unwrap(),
    );
    let mut device = Instance::new(config);
    device.write_attribute("serial", json!("A-1")).unwrap();
    executor.insert(&mut device).await.unwrap();
    assert!(warnings::global().has_fired(Warning::UnshardedUpdate));
}
