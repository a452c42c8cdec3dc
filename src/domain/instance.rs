use crate::domain::criteria::Projection;
use crate::domain::document::{get_path, new_id, values_equal, Document, ID_FIELD};
use crate::domain::error::DocError;
use crate::domain::model::ModelConfig;
use crate::domain::warnings::{warn_once, Warning};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// An in-memory model object bound to one document
#[derive(Debug, Clone)]
pub struct Instance {
    config: Arc<ModelConfig>,
    attributes: Document,
    // 上次加载或保存时的值，用于变更检测和分片键定位
    original: Document,
    projection: Projection,
    written: HashSet<String>,
    persisted: bool,
}

impl Instance {
    pub fn new(config: Arc<ModelConfig>) -> Self {
        let mut attributes = Document::new();
        attributes.insert(ID_FIELD.to_string(), Value::String(new_id()));
        for field in &config.fields {
            if let Some(default) = &field.default {
                attributes.insert(field.name.clone(), default.clone());
            }
        }

        Self {
            config,
            attributes,
            original: Document::new(),
            projection: Projection::All,
            written: HashSet::new(),
            persisted: false,
        }
    }

    /// Wrap a document loaded from the store with the projection it was
    /// loaded under
    pub fn from_document(config: Arc<ModelConfig>, doc: Document, projection: Projection) -> Self {
        Self {
            config,
            original: doc.clone(),
            attributes: doc,
            projection,
            written: HashSet::new(),
            persisted: true,
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        &self.config.name
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.get(ID_FIELD).and_then(Value::as_str)
    }

    /// `_id` as the store holds it
    pub fn id_in_db(&self) -> Option<&str> {
        if self.persisted {
            self.original.get(ID_FIELD).and_then(Value::as_str)
        } else {
            self.id()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn attributes(&self) -> &Document {
        &self.attributes
    }

    pub fn into_document(self) -> Document {
        self.attributes
    }

    /// Whether `name` was loaded (not excluded by a projection) or written since
    pub fn is_loaded(&self, name: &str) -> bool {
        self.projection.is_loaded(name) || self.written.contains(name)
    }

    pub fn read_attribute(&self, name: &str) -> Result<Value, DocError> {
        if self.config.is_declared(name) {
            if !self.is_loaded(name) {
                return Err(DocError::MissingAttribute {
                    model: self.config.name.clone(),
                    field: name.to_string(),
                });
            }
            return Ok(self.attributes.get(name).cloned().unwrap_or(Value::Null));
        }

        self.attributes
            .get(name)
            .cloned()
            .ok_or_else(|| DocError::UnknownAttribute {
                model: self.config.name.clone(),
                field: name.to_string(),
            })
    }

    pub fn write_attribute(&mut self, name: &str, value: Value) -> Result<(), DocError> {
        let value = if name == ID_FIELD {
            let value = crate::domain::model::FieldType::String.coerce(name, value)?;
            if self.persisted && self.id_in_db() != value.as_str() {
                return Err(DocError::ImmutableAttribute {
                    model: self.config.name.clone(),
                    field: ID_FIELD.to_string(),
                });
            }
            value
        } else if let Some(field) = self.config.get_field(name) {
            field.coerce(value)?
        } else if self.config.dynamic {
            value
        } else {
            return Err(DocError::UnknownAttribute {
                model: self.config.name.clone(),
                field: name.to_string(),
            });
        };

        if self.persisted && self.is_shard_key_field(name) {
            let before = self.original.get(name).unwrap_or(&Value::Null);
            if !values_equal(before, &value) {
                warn_once(Warning::ShardKeyChanged);
            }
        }

        self.attributes.insert(name.to_string(), value);
        self.written.insert(name.to_string());
        Ok(())
    }

    /// Declared fields plus whatever dynamic attributes are present
    pub fn has_attribute(&self, name: &str) -> bool {
        self.config.is_declared(name) || self.attributes.contains_key(name)
    }

    pub fn dynamic_attribute_names(&self) -> Vec<&str> {
        self.attributes
            .keys()
            .filter(|k| !self.config.is_declared(k))
            .map(String::as_str)
            .collect()
    }

    fn is_shard_key_field(&self, name: &str) -> bool {
        self.config
            .shard_key
            .iter()
            .any(|path| path.split('.').next() == Some(name))
    }

    fn selector_from(&self, source: &Document) -> Document {
        let mut selector = Document::new();
        for path in &self.config.shard_key {
            let value = get_path(source, path).cloned().unwrap_or(Value::Null);
            selector.insert(path.clone(), value);
        }
        selector
    }

    /// Shard key selector built from the current values
    pub fn shard_key_selector(&self) -> Document {
        self.selector_from(&self.attributes)
    }

    /// Shard key selector built from the values the store currently holds
    pub fn shard_key_selector_in_db(&self) -> Document {
        if self.persisted {
            self.selector_from(&self.original)
        } else {
            self.shard_key_selector()
        }
    }

    /// Attributes whose value differs from the last loaded/persisted state
    pub fn changed_attributes(&self) -> Document {
        self.attributes
            .iter()
            .filter(|(k, v)| {
                self.original
                    .get(k.as_str())
                    .map(|before| !values_equal(before, v))
                    .unwrap_or(true)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.original = self.attributes.clone();
        self.persisted = true;
    }

    pub fn inspect(&self) -> String {
        let mut parts = Vec::new();
        if let Some(id) = self.attributes.get(ID_FIELD) {
            parts.push(format!("{}: {}", ID_FIELD, id));
        }
        for field in &self.config.fields {
            if !self.is_loaded(&field.name) {
                continue;
            }
            let value = self.attributes.get(&field.name).unwrap_or(&Value::Null);
            parts.push(format!("{}: {}", field.name, value));
        }
        for name in self.dynamic_attribute_names() {
            parts.push(format!("{}: {}", name, self.attributes[name]));
        }
        format!("#<{} {}>", self.config.name, parts.join(", "))
    }
}
