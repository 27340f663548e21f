//! Loading a synthesized cloud assembly (`cdk.out`) from disk.

use crate::error::{Error, Result};
use crate::types::{CloudAssembly, Stack};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the manifest file at the root of every assembly directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const STACK_ARTIFACT: &str = "aws:cloudformation:stack";
const NESTED_ASSEMBLY_ARTIFACT: &str = "cdk:cloud-assembly";

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    artifacts: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(rename = "type")]
    artifact_type: String,
    #[serde(default)]
    properties: ArtifactProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactProperties {
    template_file: Option<String>,
    stack_name: Option<String>,
    directory_name: Option<String>,
}

impl CloudAssembly {
    /// Load an assembly from a `cdk.out` directory.
    ///
    /// Stacks are returned in manifest order. Nested assemblies (stages) are
    /// loaded recursively and their stacks take the nested artifact's place.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let mut stacks = Vec::new();
        load_into(dir.as_ref(), &mut stacks)?;
        Ok(Self { stacks })
    }
}

fn load_into(dir: &Path, stacks: &mut Vec<Stack>) -> Result<()> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(Error::ManifestNotFound(manifest_path));
    }

    log::debug!("Reading cloud assembly manifest {}", manifest_path.display());
    let manifest: Manifest = read_json(&manifest_path)?;

    for (id, value) in manifest.artifacts {
        let artifact: Artifact =
            serde_json::from_value(value).map_err(|e| Error::InvalidManifest {
                path: manifest_path.clone(),
                message: format!("artifact '{id}': {e}"),
            })?;

        match artifact.artifact_type.as_str() {
            STACK_ARTIFACT => {
                let stack_name = artifact.properties.stack_name.unwrap_or_else(|| id.clone());
                let template_file =
                    artifact
                        .properties
                        .template_file
                        .ok_or_else(|| Error::InvalidManifest {
                            path: manifest_path.clone(),
                            message: format!("stack artifact '{id}' has no templateFile"),
                        })?;

                let template_path = dir.join(template_file);
                if !template_path.exists() {
                    return Err(Error::TemplateNotFound {
                        stack: stack_name,
                        path: template_path,
                    });
                }

                let template: Value = read_json(&template_path)?;
                stacks.push(Stack::new(stack_name, template));
            }
            NESTED_ASSEMBLY_ARTIFACT => {
                let directory =
                    artifact
                        .properties
                        .directory_name
                        .ok_or_else(|| Error::InvalidManifest {
                            path: manifest_path.clone(),
                            message: format!("nested assembly '{id}' has no directoryName"),
                        })?;
                load_into(&dir.join(directory), stacks)?;
            }
            other => log::trace!("Ignoring artifact '{id}' of type {other}"),
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| Error::Json {
        path: PathBuf::from(path),
        source,
    })
}
