use product_catalog_core::stack::{synthesize, Resource, StackConfig, Template};
use serde_json::Value;

pub fn default_template() -> Template {
    synthesize(&StackConfig::default()).expect("default config should synthesize")
}

pub fn resource<'a>(template: &'a Template, logical_id: &str) -> &'a Resource {
    template
        .resource(logical_id)
        .unwrap_or_else(|| panic!("resource '{logical_id}' should exist"))
}

/// Every `Ref` and `Fn::GetAtt` target mentioned anywhere inside `value`.
pub fn referenced_ids(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(value, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Object(object) => {
            if let Some(Value::String(target)) = object.get("Ref") {
                found.push(target.clone());
            }
            if let Some(Value::Array(parts)) = object.get("Fn::GetAtt") {
                if let Some(Value::String(target)) = parts.first() {
                    found.push(target.clone());
                }
            }
            if let Some(Value::String(text)) = object.get("Fn::Sub") {
                found.extend(sub_references(text));
            }
            for nested in object.values() {
                collect_references(nested, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, found);
            }
        }
        _ => {}
    }
}

fn sub_references(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        let logical_id = name.split('.').next().unwrap_or(name);
        found.push(logical_id.to_string());
        rest = &after[end + 1..];
    }
    found
}
