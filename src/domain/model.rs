use crate::domain::document::ID_FIELD;
use crate::domain::error::DocError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

// 字段类型，决定写入时的转换规则
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Binary,
    Time,
    Array,
    Hash,
    Any,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Binary => "binary",
            FieldType::Time => "time",
            FieldType::Array => "array",
            FieldType::Hash => "hash",
            FieldType::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub kind: FieldType,
    #[serde(default)]
    pub default: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

fn default_field_type() -> FieldType {
    FieldType::Any
}

/// Declaration of a model: where its documents live, which fields it has
/// and how they are coerced, and which fields make up its shard key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub shard_key: Vec<String>,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl ModelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            collection: default_collection_name(&name),
            name,
            fields: Vec::new(),
            shard_key: Vec::new(),
            dynamic: false,
        }
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldType) -> Self {
        self.fields.push(Field::new(name, kind));
        self
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        kind: FieldType,
        default: Value,
    ) -> Self {
        self.fields.push(Field::new(name, kind).with_default(default));
        self
    }

    pub fn shard_key<S: AsRef<str>>(mut self, paths: &[S]) -> Self {
        self.shard_key = paths.iter().map(|p| p.as_ref().to_string()).collect();
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        name == ID_FIELD || self.get_field(name).is_some()
    }

    pub fn is_sharded(&self) -> bool {
        !self.shard_key.is_empty()
    }

    /// Fill in derived values and check the declaration is consistent.
    pub fn finalize(mut self) -> Result<Self, DocError> {
        if self.name.trim().is_empty() {
            return Err(DocError::Config("model name cannot be empty".to_string()));
        }
        if self.collection.is_empty() {
            self.collection = default_collection_name(&self.name);
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name == ID_FIELD {
                return Err(DocError::Config(format!(
                    "{}: '{}' is reserved",
                    self.name, ID_FIELD
                )));
            }
            if field.name.is_empty() || field.name.contains('.') {
                return Err(DocError::Config(format!(
                    "{}: invalid field name '{}'",
                    self.name, field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(DocError::Config(format!(
                    "{}: field '{}' declared twice",
                    self.name, field.name
                )));
            }
        }

        for field in &mut self.fields {
            if let Some(default) = field.default.take() {
                field.default = Some(field.coerce(default)?);
            }
        }

        let mut keys = HashSet::new();
        for path in &self.shard_key {
            let head = path.split('.').next().unwrap_or_default();
            if path.is_empty() || path.split('.').any(str::is_empty) {
                return Err(DocError::Config(format!(
                    "{}: invalid shard key path '{}'",
                    self.name, path
                )));
            }
            if !self.dynamic && !self.is_declared(head) {
                return Err(DocError::Config(format!(
                    "{}: shard key '{}' refers to undeclared field '{}'",
                    self.name, path, head
                )));
            }
            if !keys.insert(path.as_str()) {
                return Err(DocError::Config(format!(
                    "{}: shard key '{}' listed twice",
                    self.name, path
                )));
            }
        }

        Ok(self)
    }
}

/// Typed model registration
pub trait Model: 'static {
    fn config() -> ModelConfig;
}

/// Naive pluralisation: snake_case plus "s" ("BlogPost" -> "blog_posts")
pub fn default_collection_name(model: &str) -> String {
    let mut out = String::with_capacity(model.len() + 1);
    for (i, c) in model.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    if !out.ends_with('s') {
        out.push('s');
    }
    out
}
