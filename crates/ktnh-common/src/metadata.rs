//! Provenance metadata embedded in generated CloudFormation templates
//!
//! Every template written by ktnh carries a `Metadata.KTNH` section:
//!
//! | Key | Description |
//! |-----|-------------|
//! | `Generator` | Always [`GENERATOR_NAME`] |
//! | `Version` | Generator version ([`GENERATOR_VERSION`]) |
//! | `DBIdentifier` | Full DB cluster/instance identifier |
//! | `DBType` | `aurora` or `rds` |
//!
//! Stack names alone are not trusted: a stack is only considered managed when
//! this section is present and matches.

use crate::db_kind::DatabaseKind;
use crate::defaults::{GENERATOR_NAME, GENERATOR_VERSION};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors reading or validating template metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Template body is not valid YAML/JSON
    #[error("failed to parse template body: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required metadata field is missing or empty
    #[error("metadata field '{0}' is empty")]
    EmptyField(&'static str),
}

/// The `Metadata.KTNH` section of a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedMetadata {
    #[serde(rename = "Generator", default, deserialize_with = "scalar_string")]
    pub generator: String,
    #[serde(rename = "Version", default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(rename = "DBIdentifier", default, deserialize_with = "scalar_string")]
    pub db_identifier: String,
    #[serde(rename = "DBType", default, deserialize_with = "scalar_string")]
    pub db_type: String,
}

impl ManagedMetadata {
    /// Metadata describing a stack generated by this version of ktnh
    pub fn new(db_identifier: &str, kind: DatabaseKind) -> Self {
        Self {
            generator: GENERATOR_NAME.to_string(),
            version: GENERATOR_VERSION.to_string(),
            db_identifier: db_identifier.to_string(),
            db_type: kind.as_str().to_string(),
        }
    }

    /// Check that all required fields are present and non-empty
    pub fn validate(&self) -> Result<(), MetadataError> {
        let fields = [
            ("Generator", &self.generator),
            ("Version", &self.version),
            ("DBIdentifier", &self.db_identifier),
            ("DBType", &self.db_type),
        ];

        for (name, value) in fields {
            if value.is_empty() {
                return Err(MetadataError::EmptyField(name));
            }
        }

        Ok(())
    }
}

/// Criteria a stack's metadata must meet; `None` fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOption {
    pub db_identifier: Option<String>,
    pub db_kind: Option<DatabaseKind>,
}

#[derive(Debug, Default, Deserialize)]
struct TemplateDocument {
    #[serde(rename = "Metadata", default)]
    metadata: TemplateMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct TemplateMetadata {
    #[serde(rename = "KTNH", default)]
    ktnh: ManagedMetadata,
}

/// Accept any YAML scalar as a string (`Version: 1` and `Version: '1'` alike)
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a scalar value, found {other:?}"
        ))),
    }
}

/// Extract `Metadata.KTNH` from a template body.
///
/// A body without the section yields empty metadata; callers reject it via
/// [`ManagedMetadata::validate`].
pub fn parse_template_metadata(template_body: &str) -> Result<ManagedMetadata, MetadataError> {
    debug!("Parsing template body");

    if template_body.trim().is_empty() {
        return Ok(ManagedMetadata::default());
    }

    let document: TemplateDocument = serde_yaml::from_str(template_body)?;
    let metadata = document.metadata.ktnh;

    debug!(
        generator = %metadata.generator,
        version = %metadata.version,
        db_identifier = %metadata.db_identifier,
        db_type = %metadata.db_type,
        "Extracted metadata from template"
    );

    Ok(metadata)
}

/// Verify template metadata against `option`.
///
/// Returns an error only when the metadata is malformed. Mismatches of the
/// generator, identifier or kind are a plain `Ok(false)`.
pub fn verify_metadata(
    metadata: &ManagedMetadata,
    option: &VerifyOption,
) -> Result<bool, MetadataError> {
    metadata.validate()?;

    if metadata.generator != GENERATOR_NAME {
        debug!(
            expected = GENERATOR_NAME,
            actual = %metadata.generator,
            "Generator name mismatch"
        );
        return Ok(false);
    }

    if let Some(expected) = &option.db_identifier {
        if &metadata.db_identifier != expected {
            debug!(
                expected = %expected,
                actual = %metadata.db_identifier,
                "DB identifier mismatch"
            );
            return Ok(false);
        }
    }

    if let Some(kind) = option.db_kind {
        if metadata.db_type != kind.as_str() {
            debug!(
                expected = kind.as_str(),
                actual = %metadata.db_type,
                "DB type mismatch"
            );
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ManagedMetadata {
        ManagedMetadata::new("my-db", DatabaseKind::Cluster)
    }

    #[test]
    fn parses_yaml_metadata() {
        let body = r#"
AWSTemplateFormatVersion: '2010-09-09'
Metadata:
  KTNH:
    Generator: 'koreru-toki-no-hiho'
    Version: 1
    DBIdentifier: 'my-db'
    DBType: 'aurora'
Resources: {}
"#;
        assert_eq!(parse_template_metadata(body).unwrap(), valid());
    }

    #[test]
    fn parses_json_metadata() {
        let body = r#"{"Metadata":{"KTNH":{"Generator":"koreru-toki-no-hiho","Version":"1","DBIdentifier":"my-db","DBType":"aurora"}}}"#;
        assert_eq!(parse_template_metadata(body).unwrap(), valid());
    }

    #[test]
    fn missing_section_is_empty_metadata() {
        let metadata = parse_template_metadata("Resources: {}\n").unwrap();
        assert_eq!(metadata, ManagedMetadata::default());
        assert!(matches!(
            metadata.validate(),
            Err(MetadataError::EmptyField("Generator"))
        ));

        assert_eq!(parse_template_metadata("").unwrap(), ManagedMetadata::default());
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = parse_template_metadata("Metadata: [unclosed").unwrap_err();
        assert!(matches!(err, MetadataError::Parse(_)));
    }

    #[test]
    fn verify_matches_with_and_without_filters() {
        let option = VerifyOption {
            db_identifier: Some("my-db".to_string()),
            db_kind: Some(DatabaseKind::Cluster),
        };
        assert!(verify_metadata(&valid(), &option).unwrap());
        assert!(verify_metadata(&valid(), &VerifyOption::default()).unwrap());
    }

    #[test]
    fn verify_rejects_each_empty_field() {
        let cases: [(&str, fn(&mut ManagedMetadata)); 4] = [
            ("Generator", |m| m.generator.clear()),
            ("Version", |m| m.version.clear()),
            ("DBIdentifier", |m| m.db_identifier.clear()),
            ("DBType", |m| m.db_type.clear()),
        ];

        for (field, clear) in cases {
            let mut metadata = valid();
            clear(&mut metadata);
            match verify_metadata(&metadata, &VerifyOption::default()) {
                Err(MetadataError::EmptyField(f)) => assert_eq!(f, field),
                other => panic!("expected EmptyField({field}), got {other:?}"),
            }
        }
    }

    #[test]
    fn verify_mismatches_are_not_errors() {
        let mut other_generator = valid();
        other_generator.generator = "someone-else".to_string();
        assert!(!verify_metadata(&other_generator, &VerifyOption::default()).unwrap());

        let wrong_id = VerifyOption {
            db_identifier: Some("other-db".to_string()),
            db_kind: None,
        };
        assert!(!verify_metadata(&valid(), &wrong_id).unwrap());

        let wrong_kind = VerifyOption {
            db_identifier: None,
            db_kind: Some(DatabaseKind::Instance),
        };
        assert!(!verify_metadata(&valid(), &wrong_kind).unwrap());
    }
}
