//! Deployment template loading.
//!
//! Parses a SAM-style deployment template (YAML or JSON) into function
//! specifications. Only function resources are considered; everything else
//! in the template is skipped. Validation failures are fatal to startup and
//! carry the precise reason so the user can fix the template.

use super::function::{DebugConfig, FunctionSpec};
use crate::error::TemplateError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Resource types recognized as invocable functions.
const FUNCTION_RESOURCE_TYPES: &[&str] =
    &["AWS::Serverless::Function", "AWS::Lambda::Function"];

const DEFAULT_MEMORY_MB: u32 = 128;
const DEFAULT_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(rename = "Resources", default)]
    resources: BTreeMap<String, Resource>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    #[serde(rename = "Type")]
    resource_type: String,
    #[serde(rename = "Properties", default)]
    properties: FunctionProperties,
}

#[derive(Debug, Default, Deserialize)]
struct FunctionProperties {
    #[serde(rename = "Handler")]
    handler: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
    #[serde(rename = "CodeUri")]
    code_uri: Option<String>,
    #[serde(rename = "MemorySize")]
    memory_size: Option<u32>,
    #[serde(rename = "Timeout")]
    timeout: Option<u64>,
    #[serde(rename = "Environment")]
    environment: Option<Environment>,
}

#[derive(Debug, Default, Deserialize)]
struct Environment {
    #[serde(rename = "Variables", default)]
    variables: BTreeMap<String, String>,
}

/// Options applied on top of the template contents.
#[derive(Debug, Default, Clone)]
pub struct TemplateOptions {
    /// Per-function environment overrides, JSON file keyed by function name.
    pub env_vars_file: Option<std::path::PathBuf>,
    /// Debug settings to attach to every loaded function.
    pub debug: Option<DebugConfig>,
}

/// Load and validate function specs from a template file.
pub fn load_template(
    path: &Path,
    options: &TemplateOptions,
) -> Result<Vec<FunctionSpec>, TemplateError> {
    let path_display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TemplateError::not_found(&path_display)
        } else {
            TemplateError::parse(&path_display, e.to_string())
        }
    })?;

    // serde_yaml accepts JSON input as well, so one parser covers both
    // template formats.
    let template: TemplateFile = serde_yaml::from_str(&raw)
        .map_err(|e| TemplateError::parse(&path_display, e.to_string()))?;

    let overrides = options
        .env_vars_file
        .as_deref()
        .map(load_env_overrides)
        .transpose()?
        .unwrap_or_default();

    let mut specs = Vec::new();
    for (logical_id, resource) in &template.resources {
        if !FUNCTION_RESOURCE_TYPES.contains(&resource.resource_type.as_str()) {
            debug!(
                resource = %logical_id,
                resource_type = %resource.resource_type,
                "Skipping non-function resource"
            );
            continue;
        }
        let spec = build_spec(logical_id, &resource.properties, &overrides, options)?;
        specs.push(spec);
    }

    info!(
        template = %path_display,
        functions = specs.len(),
        "Loaded deployment template"
    );
    Ok(specs)
}

fn build_spec(
    logical_id: &str,
    props: &FunctionProperties,
    overrides: &BTreeMap<String, BTreeMap<String, String>>,
    options: &TemplateOptions,
) -> Result<FunctionSpec, TemplateError> {
    let handler = props
        .handler
        .clone()
        .ok_or_else(|| TemplateError::invalid_function(logical_id, "missing Handler"))?;
    let runtime = props
        .runtime
        .clone()
        .ok_or_else(|| TemplateError::invalid_function(logical_id, "missing Runtime"))?;

    let timeout_secs = props.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(TemplateError::invalid_function(
            logical_id,
            "Timeout must be greater than 0",
        ));
    }

    let mut env_vars = props
        .environment
        .as_ref()
        .map(|e| e.variables.clone())
        .unwrap_or_default();
    if let Some(function_overrides) = overrides.get(logical_id) {
        for (key, value) in function_overrides {
            env_vars.insert(key.clone(), value.clone());
        }
    }

    Ok(FunctionSpec {
        name: logical_id.to_string(),
        handler,
        runtime,
        memory_mb: props.memory_size.unwrap_or(DEFAULT_MEMORY_MB),
        timeout_secs,
        env_vars,
        code_uri: props.code_uri.clone().unwrap_or_else(|| ".".to_string()),
        debug: options.debug.clone(),
    })
}

/// Load the per-function environment override file:
/// `{"FunctionName": {"VAR": "value", ...}, ...}`.
fn load_env_overrides(
    path: &Path,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, TemplateError> {
    let path_display = path.display().to_string();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| TemplateError::env_vars_file(&path_display, e.to_string()))?;
    serde_json::from_str(&raw)
        .map_err(|e| TemplateError::env_vars_file(&path_display, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE_TEMPLATE: &str = r#"
AWSTemplateFormatVersion: '2010-09-09'
Transform: AWS::Serverless-2016-10-31
Resources:
  HelloWorld:
    Type: AWS::Serverless::Function
    Properties:
      Handler: app.lambda_handler
      Runtime: python3.12
      CodeUri: hello_world/
      MemorySize: 256
      Timeout: 10
      Environment:
        Variables:
          TABLE_NAME: demo
  Echo:
    Type: AWS::Lambda::Function
    Properties:
      Handler: index.handler
      Runtime: nodejs20.x
  Bucket:
    Type: AWS::S3::Bucket
    Properties: {}
"#;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_template_parses_function_resources() {
        let file = write_temp(SAMPLE_TEMPLATE);
        let specs = load_template(file.path(), &TemplateOptions::default()).unwrap();
        assert_eq!(specs.len(), 2);

        let hello = specs.iter().find(|s| s.name == "HelloWorld").unwrap();
        assert_eq!(hello.handler, "app.lambda_handler");
        assert_eq!(hello.runtime, "python3.12");
        assert_eq!(hello.memory_mb, 256);
        assert_eq!(hello.timeout_secs, 10);
        assert_eq!(hello.env_vars.get("TABLE_NAME").unwrap(), "demo");
        assert_eq!(hello.code_uri, "hello_world/");
    }

    #[test]
    fn test_load_template_skips_non_function_resources() {
        let file = write_temp(SAMPLE_TEMPLATE);
        let specs = load_template(file.path(), &TemplateOptions::default()).unwrap();
        assert!(!specs.iter().any(|s| s.name == "Bucket"));
    }

    #[test]
    fn test_load_template_defaults() {
        let file = write_temp(SAMPLE_TEMPLATE);
        let specs = load_template(file.path(), &TemplateOptions::default()).unwrap();
        let echo = specs.iter().find(|s| s.name == "Echo").unwrap();
        assert_eq!(echo.memory_mb, 128);
        assert_eq!(echo.timeout_secs, 3);
        assert_eq!(echo.code_uri, ".");
    }

    #[test]
    fn test_load_template_accepts_json() {
        let json = r#"{
            "Resources": {
                "Fn": {
                    "Type": "AWS::Serverless::Function",
                    "Properties": {"Handler": "main.handler", "Runtime": "go1.x"}
                }
            }
        }"#;
        let file = write_temp(json);
        let specs = load_template(file.path(), &TemplateOptions::default()).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].runtime, "go1.x");
    }

    #[test]
    fn test_load_template_missing_file() {
        let err = load_template(
            Path::new("/nonexistent/template.yaml"),
            &TemplateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { .. }));
    }

    #[test]
    fn test_load_template_missing_handler_is_fatal() {
        let file = write_temp(
            r#"
Resources:
  Broken:
    Type: AWS::Serverless::Function
    Properties:
      Runtime: python3.12
"#,
        );
        let err = load_template(file.path(), &TemplateOptions::default()).unwrap_err();
        assert!(err.to_string().contains("missing Handler"));
    }

    #[test]
    fn test_load_template_zero_timeout_rejected() {
        let file = write_temp(
            r#"
Resources:
  Broken:
    Type: AWS::Serverless::Function
    Properties:
      Handler: app.handler
      Runtime: python3.12
      Timeout: 0
"#,
        );
        let err = load_template(file.path(), &TemplateOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Timeout must be greater than 0"));
    }

    #[test]
    fn test_load_template_invalid_yaml() {
        let file = write_temp("Resources:\n  - not: [a, mapping");
        let err = load_template(file.path(), &TemplateOptions::default()).unwrap_err();
        assert!(matches!(err, TemplateError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_env_vars_file_overrides_template() {
        let template = write_temp(SAMPLE_TEMPLATE);
        let env_file = write_temp(r#"{"HelloWorld": {"TABLE_NAME": "override", "EXTRA": "1"}}"#);
        let options = TemplateOptions {
            env_vars_file: Some(env_file.path().to_path_buf()),
            debug: None,
        };
        let specs = load_template(template.path(), &options).unwrap();
        let hello = specs.iter().find(|s| s.name == "HelloWorld").unwrap();
        assert_eq!(hello.env_vars.get("TABLE_NAME").unwrap(), "override");
        assert_eq!(hello.env_vars.get("EXTRA").unwrap(), "1");
    }

    #[test]
    fn test_env_vars_file_invalid_json() {
        let template = write_temp(SAMPLE_TEMPLATE);
        let env_file = write_temp("not json");
        let options = TemplateOptions {
            env_vars_file: Some(env_file.path().to_path_buf()),
            debug: None,
        };
        let err = load_template(template.path(), &options).unwrap_err();
        assert!(matches!(err, TemplateError::EnvVarsFile { .. }));
    }

    #[test]
    fn test_debug_option_applied_to_all_functions() {
        let template = write_temp(SAMPLE_TEMPLATE);
        let options = TemplateOptions {
            env_vars_file: None,
            debug: DebugConfig::from_options(5858, &[]),
        };
        let specs = load_template(template.path(), &options).unwrap();
        assert!(specs.iter().all(|s| s.debug_enabled()));
    }
}
