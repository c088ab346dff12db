//! Compiled, immutable tool catalog.

use crate::config::{HttpParamLocation, ParameterSpec, QueryStyleConfig, ToolDefinition};
use crate::runtime::{HttpToolsError, Result};
use crate::semantics::annotations_for_method;
use openapiv3::QueryStyle;
use regex::Regex;
use reqwest::Method;
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use tracing::warn;

static PATH_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder regex"));

/// A tool ready to be listed and executed.
pub struct CatalogTool {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) method: Method,
    pub(crate) path: String,
    /// Placeholder names found in `path`, in order of appearance.
    pub(crate) path_keys: Vec<String>,
    /// Declared placements, keyed by argument name.
    pub(crate) parameters: HashMap<String, DeclaredParam>,
    pub(crate) input_schema: Arc<JsonObject>,
    pub(crate) output_schema: Option<Arc<JsonObject>>,
    pub(crate) annotations: ToolAnnotations,
    pub(crate) validator: Option<jsonschema::Validator>,
}

impl CatalogTool {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn input_schema(&self) -> &JsonObject {
        &self.input_schema
    }

    #[must_use]
    pub fn has_output_schema(&self) -> bool {
        self.output_schema.is_some()
    }

    fn to_tool(&self) -> Tool {
        let mut tool = Tool::new(
            self.name.clone(),
            self.description.clone().unwrap_or_default(),
            Arc::clone(&self.input_schema),
        );
        tool.output_schema.clone_from(&self.output_schema);
        tool.annotations = Some(self.annotations.clone());
        tool
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DeclaredParam {
    pub(crate) http_name: String,
    pub(crate) location: HttpParamLocation,
    pub(crate) required: bool,
    pub(crate) query: Option<QuerySerialization>,
}

#[derive(Debug, Clone)]
pub(crate) struct QuerySerialization {
    pub(crate) style: QueryStyle,
    pub(crate) explode: bool,
    pub(crate) allow_reserved: bool,
    pub(crate) allow_empty_value: bool,
}

impl Default for QuerySerialization {
    fn default() -> Self {
        Self {
            style: QueryStyle::Form,
            explode: true,
            allow_reserved: false,
            allow_empty_value: false,
        }
    }
}

/// The set of tools served by one adapter instance.
///
/// Cheap to clone; the tools themselves are shared.
#[derive(Clone, Default)]
pub struct ToolCatalog {
    tools: Arc<Vec<CatalogTool>>,
    index: Arc<HashMap<String, usize>>,
}

impl ToolCatalog {
    /// Compile tool definitions.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate or empty tool names, invalid HTTP methods, non-object input
    /// schemas, or duplicate parameter declarations.
    pub fn new(definitions: Vec<ToolDefinition>) -> Result<Self> {
        let mut tools = Vec::with_capacity(definitions.len());
        let mut index = HashMap::with_capacity(definitions.len());

        for def in definitions {
            if def.name.trim().is_empty() {
                return Err(HttpToolsError::Config(
                    "Tool definition with an empty name".to_string(),
                ));
            }
            if index.contains_key(&def.name) {
                return Err(HttpToolsError::Config(format!(
                    "Duplicate tool name '{}'",
                    def.name
                )));
            }
            let tool = compile_tool(def)?;
            index.insert(tool.name.clone(), tools.len());
            tools.push(tool);
        }

        Ok(Self {
            tools: Arc::new(tools),
            index: Arc::new(index),
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CatalogTool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The MCP `Tool`s exposed by this catalog, in definition order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(CatalogTool::to_tool).collect()
    }
}

fn compile_tool(def: ToolDefinition) -> Result<CatalogTool> {
    let ToolDefinition {
        name,
        description,
        input_schema,
        output_schema,
        annotations,
        metadata,
    } = def;

    let method_str = metadata.method.trim();
    let method: Method = method_str.to_uppercase().parse().map_err(|_| {
        HttpToolsError::Config(format!(
            "Invalid HTTP method '{method_str}' in tool '{name}'"
        ))
    })?;

    let Value::Object(input_schema) = input_schema else {
        return Err(HttpToolsError::Config(format!(
            "Invalid inputSchema for tool '{name}': must be a JSON object"
        )));
    };

    let output_schema = match output_schema {
        None | Some(Value::Null) => None,
        Some(Value::Object(o)) => Some(Arc::new(o)),
        Some(_) => {
            return Err(HttpToolsError::Config(format!(
                "Invalid outputSchema for tool '{name}': must be a JSON object"
            )));
        }
    };

    let mut path = metadata.path.trim().to_string();
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    let path_keys = PATH_PLACEHOLDER
        .captures_iter(&path)
        .map(|c| c[1].to_string())
        .collect();

    let schema_required: HashSet<&str> = input_schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    let parameters = declare_parameters(&name, &metadata.parameters, &schema_required)?;

    let validator = match jsonschema::validator_for(&Value::Object(input_schema.clone())) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(
                tool = %name,
                error = %e,
                "inputSchema is not a valid JSON Schema; arguments will not be validated"
            );
            None
        }
    };

    Ok(CatalogTool {
        annotations: annotations.unwrap_or_else(|| annotations_for_method(&method)),
        name,
        description,
        method,
        path,
        path_keys,
        parameters,
        input_schema: Arc::new(input_schema),
        output_schema,
        validator,
    })
}

fn declare_parameters(
    tool_name: &str,
    specs: &[ParameterSpec],
    schema_required: &HashSet<&str>,
) -> Result<HashMap<String, DeclaredParam>> {
    let mut out = HashMap::with_capacity(specs.len());

    for spec in specs {
        if out.contains_key(&spec.name) {
            return Err(HttpToolsError::Config(format!(
                "Duplicate parameter '{}' in tool '{tool_name}'",
                spec.name
            )));
        }

        let required = spec.required.unwrap_or_else(|| {
            spec.location == HttpParamLocation::Path || schema_required.contains(spec.name.as_str())
        });

        let query = (spec.location == HttpParamLocation::Query).then(|| {
            let style = spec.style.map_or(QueryStyle::Form, map_query_style);
            QuerySerialization {
                explode: spec.explode.unwrap_or_else(|| default_query_explode(&style)),
                style,
                allow_reserved: spec.allow_reserved.unwrap_or(false),
                allow_empty_value: spec.allow_empty_value.unwrap_or(false),
            }
        });

        out.insert(
            spec.name.clone(),
            DeclaredParam {
                http_name: spec.http_name.clone().unwrap_or_else(|| spec.name.clone()),
                location: spec.location,
                required,
                query,
            },
        );
    }

    Ok(out)
}

fn map_query_style(s: QueryStyleConfig) -> QueryStyle {
    match s {
        QueryStyleConfig::Form => QueryStyle::Form,
        QueryStyleConfig::SpaceDelimited => QueryStyle::SpaceDelimited,
        QueryStyleConfig::PipeDelimited => QueryStyle::PipeDelimited,
        QueryStyleConfig::DeepObject => QueryStyle::DeepObject,
    }
}

fn default_query_explode(style: &QueryStyle) -> bool {
    matches!(style, QueryStyle::Form | QueryStyle::DeepObject)
}
