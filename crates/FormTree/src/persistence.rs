use crate::error::TreeError;
use crate::model::{Item, NodeId, QuestionnaireTree};
use serde_json::{Map, Value, json};

const ITEM_KEY: &str = "item";

/// A Questionnaire resource split into its form-level fields and its item tree.
#[derive(Clone, Debug, Default)]
pub struct Questionnaire {
    /// Form-level fields (`title`, `status`, `meta`, ...) without `item`.
    pub resource: Map<String, Value>,
    /// The nested `item` arrays, flattened into an arena.
    pub tree: QuestionnaireTree,
}

impl Questionnaire {
    /// Bare minimum draft form used when the builder starts from scratch.
    pub fn default_form() -> Self {
        let mut resource = Map::new();
        resource.insert("resourceType".into(), json!("Questionnaire"));
        resource.insert("title".into(), json!("New Form"));
        resource.insert("status".into(), json!("draft"));
        resource.insert(
            "meta".into(),
            json!({ "profile": ["http://hl7.org/fhir/5.0/StructureDefinition/Questionnaire"] }),
        );
        Self {
            resource,
            tree: QuestionnaireTree::default(),
        }
    }

    pub fn parse(json: &str) -> Result<Self, TreeError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(value)
    }

    /// Imports a Questionnaire resource into a fresh tree.
    ///
    /// Nested `item` arrays become child nodes; everything else is kept verbatim.
    #[tracing::instrument(skip(value))]
    pub fn from_json(value: Value) -> Result<Self, TreeError> {
        let mut resource = match value {
            Value::Object(resource) => resource,
            other => return Err(TreeError::NotAQuestionnaire(json_kind(&other).to_string())),
        };
        if let Some(kind) = resource.get("resourceType").and_then(Value::as_str)
            && kind != "Questionnaire"
        {
            return Err(TreeError::NotAQuestionnaire(kind.to_string()));
        }

        let mut tree = QuestionnaireTree::default();
        if let Some(items) = resource.remove(ITEM_KEY) {
            load_items(&mut tree, None, items, "item")?;
        }

        tracing::debug!(items = tree.len(), "Questionnaire imported");
        Ok(Self { resource, tree })
    }

    /// Serializes the form back into a Questionnaire resource.
    pub fn to_json(&self) -> Value {
        let mut resource = self.resource.clone();
        let items = save_items(&self.tree, self.tree.roots());
        if !items.is_empty() {
            resource.insert(ITEM_KEY.to_string(), Value::Array(items));
        }
        Value::Object(resource)
    }
}

fn load_items(
    tree: &mut QuestionnaireTree,
    parent: Option<NodeId>,
    items: Value,
    path: &str,
) -> Result<(), TreeError> {
    let items = match items {
        Value::Array(items) => items,
        other => {
            return Err(TreeError::MalformedItem {
                path: path.to_string(),
                source: serde::de::Error::custom(format!(
                    "expected array, found {}",
                    json_kind(&other)
                )),
            });
        }
    };

    for (index, mut raw) in items.into_iter().enumerate() {
        let item_path = format!("{path}[{index}]");
        let nested = raw.as_object_mut().and_then(|obj| obj.remove(ITEM_KEY));
        let item: Item = serde_json::from_value(raw).map_err(|source| TreeError::MalformedItem {
            path: item_path.clone(),
            source,
        })?;

        let id = tree.add_item(parent, item)?;
        if let Some(children) = nested {
            load_items(tree, Some(id), children, &format!("{item_path}.item"))?;
        }
    }
    Ok(())
}

fn save_items(tree: &QuestionnaireTree, ids: &[NodeId]) -> Vec<Value> {
    ids.iter()
        .filter_map(|&id| {
            let item = tree.item(id)?;
            // Item only holds plain JSON values, serialization cannot fail.
            let mut value = serde_json::to_value(item).ok()?;
            let children = save_items(tree, tree.children(id));
            if let (Value::Object(obj), false) = (&mut value, children.is_empty()) {
                obj.insert(ITEM_KEY.to_string(), Value::Array(children));
            }
            Some(value)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
