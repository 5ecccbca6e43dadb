//! MCP-specific protocol types.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// MCP protocol version.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Initialize response result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol version the server supports.
    pub protocol_version: String,
    /// Server capabilities.
    pub capabilities: ServerCapabilities,
    /// Server information.
    pub server_info: ServerInfo,
}

/// Server information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl ServerInfo {
    /// Create server information from a name and version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Server capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Tools capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Tools capability. Serializes as an empty marker object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {}

/// JSON type of a tool input property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// A JSON number.
    Number,
    /// A JSON string.
    String,
}

/// Declarative schema of a single tool input property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySchema {
    /// JSON type of the property.
    #[serde(rename = "type")]
    pub kind: PropertyType,
    /// Human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values, for enumerations.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
    /// Value applied when the caller omits the property.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertySchema {
    fn new(kind: PropertyType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: Some(description.into()),
            allowed: None,
            default: None,
        }
    }

    /// A number property.
    #[must_use]
    pub fn number(description: impl Into<String>) -> Self {
        Self::new(PropertyType::Number, description)
    }

    /// A string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(PropertyType::String, description)
    }

    /// Restrict the property to a fixed set of values.
    #[must_use]
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Document the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Input schema of a tool: always a JSON object.
///
/// Properties keep their declaration order on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(serialize_with = "ordered_properties")]
    properties: Vec<(String, PropertySchema)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
}

fn ordered_properties<S: Serializer>(
    properties: &[(String, PropertySchema)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(properties.iter().map(|(name, schema)| (name, schema)))
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::object()
    }
}

impl InputSchema {
    /// An object schema without properties.
    #[must_use]
    pub const fn object() -> Self {
        Self {
            kind: "object",
            properties: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Add an optional property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        self.properties.push((name.into(), schema));
        self
    }

    /// Add a property the caller must supply.
    #[must_use]
    pub fn required_property(mut self, name: impl Into<String>, schema: PropertySchema) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.push((name, schema));
        self
    }

    /// Look up a property by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }

    /// Names of the required properties.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }
}

/// MCP tool descriptor, as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name, unique within a server.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema for tool input.
    pub input_schema: InputSchema,
}

impl ToolDescriptor {
    /// Create a tool descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// List tools result.
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResult<'a> {
    /// Available tools.
    pub tools: &'a [ToolDescriptor],
}

/// Tool call result.
#[derive(Debug, Clone, Serialize)]
pub struct CallToolResult {
    /// Result content.
    pub content: Vec<Content>,
}

impl CallToolResult {
    /// Create a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text(TextContent { text: text.into() })],
        }
    }

    /// Wrap a JSON value as a single pretty-printed text item.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn pretty_json(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::to_string_pretty(value).map(Self::text)
    }
}

/// Content types in MCP responses.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Text content.
    Text(TextContent),
}

/// Text content.
#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    /// Text value.
    pub text: String,
}
