//! `modules.yaml`: a multi-document YAML stream of module streams and their
//! defaults. Only `modulemd` documents contribute to the module enumeration.

use serde::Deserialize;
use serde_yaml::Value;

use crate::model::ModuleInfo;
use crate::traits::LoadError;

const DOCUMENT: &str = "modules.yaml";

#[derive(Debug, Deserialize)]
struct ModuleDocument {
    document: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ModuleStream {
    name: String,
    stream: Value,
    version: Value,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    arch: Option<String>,
    #[serde(default)]
    artifacts: Option<Artifacts>,
}

#[derive(Debug, Default, Deserialize)]
struct Artifacts {
    #[serde(default)]
    rpms: Vec<String>,
}

pub fn parse_modules(content: &str) -> Result<Vec<ModuleInfo>, LoadError> {
    let mut modules = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let document = ModuleDocument::deserialize(document)?;
        if document.document != "modulemd" {
            continue;
        }

        let stream: ModuleStream = serde_yaml::from_value(document.data)?;
        let full_identifier = format!(
            "{}:{}:{}:{}:{}",
            stream.name,
            scalar(&stream.stream)?,
            scalar(&stream.version)?,
            stream.context.unwrap_or_default(),
            stream.arch.unwrap_or_default(),
        );
        modules.push(ModuleInfo {
            full_identifier,
            artifacts: stream.artifacts.unwrap_or_default().rpms,
        });
    }

    Ok(modules)
}

/// Streams and versions are strings or numbers depending on the producer.
fn scalar(value: &Value) -> Result<String, LoadError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(LoadError::invalid(
            DOCUMENT,
            format!("expected a scalar, found {other:?}"),
        )),
    }
}
