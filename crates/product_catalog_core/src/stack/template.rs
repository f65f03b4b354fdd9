use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    pub description: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub parameters: BTreeMap<String, Parameter>,
    pub resources: BTreeMap<String, Resource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub outputs: BTreeMap<String, Output>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub kind: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,
}

impl Resource {
    pub fn new(kind: impl Into<String>, properties: Value) -> Self {
        Self {
            kind: kind.into(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    pub fn depends_on<I, S>(mut self, logical_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(logical_ids.into_iter().map(Into::into));
        self
    }

    /// Sets both deletion and update-replace policy.
    pub fn removal_policy(mut self, policy: &str) -> Self {
        self.deletion_policy = Some(policy.to_string());
        self.update_replace_policy = Some(policy.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub description: String,
    pub value: Value,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: description.into(),
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn add_parameter(&mut self, logical_id: &str, description: &str, default: Option<&str>) {
        self.parameters.insert(
            logical_id.to_string(),
            Parameter {
                kind: "String".to_string(),
                description: description.to_string(),
                default: default.map(str::to_string),
            },
        );
    }

    pub fn add_resource(&mut self, logical_id: impl Into<String>, resource: Resource) {
        self.resources.insert(logical_id.into(), resource);
    }

    pub fn add_output(&mut self, logical_id: &str, description: &str, value: Value) {
        self.outputs.insert(
            logical_id.to_string(),
            Output {
                description: description.to_string(),
                value,
            },
        );
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    pub fn resources_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, resource)| resource.kind == kind)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 over the compact JSON rendering.
    ///
    /// Maps are `BTreeMap`s so the rendering, and hence the digest, is
    /// stable across runs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(
            serde_json::to_vec(self).expect("serialization of template should not fail"),
        );
        format!("{:x}", hasher.finalize())
    }
}

pub fn ref_(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index.to_string(), list] })
}

pub fn split(delimiter: &str, source: Value) -> Value {
    json!({ "Fn::Split": [delimiter, source] })
}

pub fn availability_zone(index: usize) -> Value {
    select(index, json!({ "Fn::GetAZs": "" }))
}

pub fn tags(name: &str) -> Value {
    json!([{ "Key": "Name", "Value": name }])
}
