//! Generated content for a new module: the Flask route declaration the
//! source must expose and the default metadata document.

use serde::Serialize;
use std::collections::BTreeMap;

/// File name of the container specification in every module
pub const CONTAINER_SPEC_FILE: &str = "Dockerfile";

/// File name of the dependency specification in every module
pub const DEPENDENCY_SPEC_FILE: &str = "requirements.txt";

/// Route declaration the module source must contain, e.g.
/// `@app.route('/Foo', methods=['POST'])`
pub fn route_declaration(module_name: &str) -> String {
    format!("@app.route('/{module_name}', methods=['POST'])")
}

/// `{name}.py`
pub fn source_file_name(module_name: &str) -> String {
    format!("{module_name}.py")
}

/// `{name}.json`
pub fn metadata_file_name(module_name: &str) -> String {
    format!("{module_name}.json")
}

/// Metadata entry for one input parameter of a module
#[derive(Debug, Serialize)]
struct InputParameter {
    description: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// The three input parameters every anonymization module starts with.
/// Field order is the serialized key order.
#[derive(Debug, Serialize)]
struct SeededInputs {
    #[serde(rename = "File")]
    file: InputParameter,
    #[serde(rename = "Column to be anonymized")]
    column_to_anonymize: InputParameter,
    #[serde(rename = "Direct identifier columns")]
    direct_identifier_columns: InputParameter,
}

#[derive(Debug, Serialize)]
struct ModuleMetadata {
    #[serde(rename = "conceptual_Explanation")]
    conceptual_explanation: &'static str,
    #[serde(rename = "technical_Explanation")]
    technical_explanation: &'static str,
    inputs: SeededInputs,
    #[serde(rename = "application_Platform")]
    application_platform: &'static str,
    #[serde(rename = "deployable_Module")]
    deployable_module: &'static str,
    #[serde(rename = "incremental_Updates")]
    incremental_updates: &'static str,
}

impl ModuleMetadata {
    fn seeded() -> Self {
        Self {
            conceptual_explanation: "",
            technical_explanation: "",
            inputs: SeededInputs {
                file: InputParameter {
                    description: "",
                    kind: "CSV file",
                },
                column_to_anonymize: InputParameter {
                    description:
                        "The name of the column with numerical data that requires anonymization.",
                    kind: "String",
                },
                direct_identifier_columns: InputParameter {
                    description: "A list of columns that serve as direct identifiers.",
                    kind: "Array of Strings",
                },
            },
            application_platform: "",
            deployable_module: "",
            incremental_updates: "",
        }
    }
}

/// Default metadata document for a module, keyed by the trimmed name and
/// pretty-printed with a 4-space indent.
///
/// Returns an empty string when the trimmed name is empty.
pub fn metadata_document(module_name: &str) -> String {
    let name = module_name.trim();
    if name.is_empty() {
        return String::new();
    }

    let mut document = BTreeMap::new();
    document.insert(name, ModuleMetadata::seeded());

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if let Err(e) = document.serialize(&mut serializer) {
        tracing::warn!(module = name, error = %e, "Failed to render metadata document");
        return String::new();
    }

    String::from_utf8(buf).unwrap_or_default()
}
