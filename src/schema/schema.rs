use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Keyword,
    Numeric,
    Date,
    Boolean,
    Stored,
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(FieldType::Text),
            "keyword" => Ok(FieldType::Keyword),
            "numeric" => Ok(FieldType::Numeric),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            "stored" => Ok(FieldType::Stored),
            other => Err(Error::invalid_argument(format!("Invalid field type: {}", other))),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Numeric => "numeric",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Stored => "stored",
        };
        write!(f, "{}", name)
    }
}

/// Field definition with analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub indexed: bool,
    pub stored: bool,
    pub analyzed: bool,
    pub boost: f64,                // Always > 0
    pub analyzer: Option<String>,  // Overrides the field analyzer table
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        let analyzed = matches!(field_type, FieldType::Text | FieldType::Keyword);
        FieldDefinition {
            name: name.to_string(),
            field_type,
            indexed: field_type != FieldType::Stored,
            stored: true,
            analyzed,
            boost: 1.0,
            analyzer: None,
        }
    }

    pub fn boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    pub fn not_analyzed(mut self) -> Self {
        self.analyzed = false;
        self
    }

    pub fn not_stored(mut self) -> Self {
        self.stored = false;
        self
    }

    pub fn is_searchable(&self) -> bool {
        self.indexed && matches!(self.field_type, FieldType::Text | FieldType::Keyword)
    }
}

/// Partial field definition read from configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOverride {
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub indexed: Option<bool>,
    pub stored: Option<bool>,
    pub analyzed: Option<bool>,
    pub boost: Option<f64>,
    pub analyzer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOverrides {
    pub enable_fuzzy: Option<bool>,
    pub enable_stemming: Option<bool>,
    pub enable_synonyms: Option<bool>,
    pub fields: BTreeMap<String, FieldOverride>,
}

/// Bibliographic field schema plus feature toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfiguration {
    pub fields: BTreeMap<String, FieldDefinition>,
    pub enable_fuzzy: bool,
    pub enable_stemming: bool,
    pub enable_synonyms: bool,
}

impl FieldConfiguration {
    pub fn new() -> Self {
        use FieldType::*;

        let definitions = vec![
            FieldDefinition::new("title", Text).boost(2.0),
            FieldDefinition::new("abstract", Text),
            FieldDefinition::new("author", Text).boost(1.5),
            FieldDefinition::new("editor", Text).boost(1.2),
            FieldDefinition::new("note", Text).boost(0.5),
            FieldDefinition::new("journal", Keyword),
            FieldDefinition::new("booktitle", Keyword),
            FieldDefinition::new("publisher", Keyword).boost(0.8),
            FieldDefinition::new("series", Keyword).boost(0.8),
            FieldDefinition::new("school", Keyword).boost(0.8),
            FieldDefinition::new("institution", Keyword).boost(0.8),
            FieldDefinition::new("organization", Keyword).boost(0.8),
            FieldDefinition::new("keywords", Keyword).boost(1.2),
            FieldDefinition::new("tags", Keyword),
            FieldDefinition::new("entry_type", Keyword),
            FieldDefinition::new("key", Keyword).not_analyzed(),
            FieldDefinition::new("doi", Keyword).not_analyzed(),
            FieldDefinition::new("isbn", Keyword).not_analyzed(),
            FieldDefinition::new("issn", Keyword).not_analyzed(),
            FieldDefinition::new("url", Keyword).not_analyzed(),
            FieldDefinition::new("year", Numeric),
            FieldDefinition::new("volume", Numeric),
            FieldDefinition::new("number", Numeric),
            FieldDefinition::new("chapter", Numeric),
            FieldDefinition::new("added", Date),
            FieldDefinition::new("modified", Date),
            FieldDefinition::new("content", Text).not_stored().boost(0.8),
            FieldDefinition::new("search_text", Text).not_stored(),
            FieldDefinition::new("author_list", Stored),
            FieldDefinition::new("editor_list", Stored),
        ];

        FieldConfiguration {
            fields: definitions.into_iter().map(|d| (d.name.clone(), d)).collect(),
            enable_fuzzy: true,
            enable_stemming: true,
            enable_synonyms: true,
        }
    }

    pub fn with_overrides(overrides: &SchemaOverrides) -> Result<Self> {
        let mut config = FieldConfiguration::new();
        config.apply_overrides(overrides)?;
        Ok(config)
    }

    /// Parse overrides from a JSON document and apply them
    pub fn from_json_str(json: &str) -> Result<Self> {
        let overrides: SchemaOverrides = serde_json::from_str(json)?;
        FieldConfiguration::with_overrides(&overrides)
    }

    /// Merge overrides into known fields and add unknown ones.
    /// Nothing is changed when any entry is invalid.
    pub fn apply_overrides(&mut self, overrides: &SchemaOverrides) -> Result<()> {
        let mut updated = self.fields.clone();

        for (name, field) in &overrides.fields {
            let base = match updated.get(name) {
                Some(existing) => existing.clone(),
                None => {
                    let field_type = field.field_type.as_deref().unwrap_or("text").parse()?;
                    FieldDefinition::new(name, field_type)
                }
            };

            let boost = field.boost.unwrap_or(base.boost);
            if !(boost > 0.0) {
                return Err(Error::invalid_argument(format!(
                    "Field '{}' boost must be positive, got {}", name, boost
                )));
            }

            updated.insert(name.clone(), FieldDefinition {
                name: name.clone(),
                field_type: base.field_type,
                indexed: field.indexed.unwrap_or(base.indexed),
                stored: field.stored.unwrap_or(base.stored),
                analyzed: field.analyzed.unwrap_or(base.analyzed),
                boost,
                analyzer: field.analyzer.clone().or(base.analyzer),
            });
        }

        self.fields = updated;
        self.enable_fuzzy = overrides.enable_fuzzy.unwrap_or(self.enable_fuzzy);
        self.enable_stemming = overrides.enable_stemming.unwrap_or(self.enable_stemming);
        self.enable_synonyms = overrides.enable_synonyms.unwrap_or(self.enable_synonyms);
        Ok(())
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Whether the field goes through text analysis
    pub fn should_process(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|f| f.analyzed)
    }

    pub fn get_analyzer(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|f| f.analyzer.as_deref())
    }

    pub fn boost(&self, field: &str) -> Option<f64> {
        self.fields.get(field).map(|f| f.boost)
    }

    pub fn searchable_fields(&self) -> Vec<&str> {
        self.names_where(FieldDefinition::is_searchable)
    }

    pub fn facet_fields(&self) -> Vec<&str> {
        self.names_where(|f| f.indexed && f.field_type == FieldType::Keyword)
    }

    pub fn numeric_fields(&self) -> Vec<&str> {
        self.names_where(|f| f.indexed && f.field_type == FieldType::Numeric)
    }

    pub fn date_fields(&self) -> Vec<&str> {
        self.names_where(|f| f.indexed && f.field_type == FieldType::Date)
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn names_where(&self, predicate: impl Fn(&FieldDefinition) -> bool) -> Vec<&str> {
        self.fields.values()
            .filter(|f| predicate(f))
            .map(|f| f.name.as_str())
            .collect()
    }
}

impl Default for FieldConfiguration {
    fn default() -> Self {
        Self::new()
    }
}
