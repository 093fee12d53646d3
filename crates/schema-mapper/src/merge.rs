//! Merging of already mapped JSON Schema fragments.
//!
//! Used whenever a node refers to a shared component and also carries local
//! keywords, and when generic overrides are layered on top of a base
//! reference. The rules are order sensitive; the right-hand side wins for
//! plain keywords.

use serde_json::{Map, Value};

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn reference(value: &Value) -> Option<&str> {
    value.get("$ref").and_then(Value::as_str)
}

fn has(value: &Value, key: &str) -> bool {
    value.get(key).is_some()
}

/// Merge `right` into `left`.
///
/// 1. An empty side yields the other side.
/// 2. Identical values, and identical `$ref`s, collapse to one.
/// 3. `allOf` on either side flattens both into one deduplicated `allOf`.
/// 4. `oneOf` members merge element-wise.
/// 5. `anyOf` members are unioned.
/// 6. A `$ref` next to anything else becomes `allOf: [left, right]`.
/// 7. Otherwise objects merge: `properties` deeply, `required` as a union,
///    object `additionalProperties` shallowly, and `right` wins elsewhere.
pub fn merge_schema(left: &Value, right: &Value) -> Value {
    if is_empty(left) {
        return right.clone();
    }
    if is_empty(right) || left == right {
        return left.clone();
    }
    let (Value::Object(left_map), Value::Object(right_map)) = (left, right) else {
        return right.clone();
    };

    if let (Some(a), Some(b)) = (reference(left), reference(right))
        && a == b
    {
        return Value::Object(merge_objects(left_map, right_map));
    }
    if has(left, "allOf") || has(right, "allOf") {
        return merge_all_of(left, right);
    }
    if has(left, "oneOf") || has(right, "oneOf") {
        return merge_members(left_map, right_map, "oneOf", zip_members);
    }
    if has(left, "anyOf") || has(right, "anyOf") {
        return merge_members(left_map, right_map, "anyOf", union_members);
    }
    if has(left, "$ref") || has(right, "$ref") {
        return wrap_all_of(vec![left.clone(), right.clone()], false);
    }
    Value::Object(merge_objects(left_map, right_map))
}

fn wrap_all_of(entries: Vec<Value>, nullable: bool) -> Value {
    let mut map = Map::new();
    map.insert("allOf".to_string(), Value::Array(entries));
    if nullable {
        map.insert("nullable".to_string(), Value::Bool(true));
    }
    Value::Object(map)
}

fn flatten_into(entries: &mut Vec<Value>, value: &Value) {
    let Some(list) = value.get("allOf").and_then(Value::as_array) else {
        entries.push(value.clone());
        return;
    };
    entries.extend(list.iter().cloned());
    if let Value::Object(map) = value {
        let rest: Map<String, Value> = map
            .iter()
            .filter(|(key, _)| *key != "allOf" && *key != "nullable")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if !rest.is_empty() {
            entries.push(Value::Object(rest));
        }
    }
}

fn carries_nullable(value: &Value) -> bool {
    value.get("nullable") == Some(&Value::Bool(true))
}

fn merge_all_of(left: &Value, right: &Value) -> Value {
    let nullable = carries_nullable(left) || carries_nullable(right);
    let mut flat = Vec::new();
    flatten_into(&mut flat, left);
    flatten_into(&mut flat, right);

    let mut entries: Vec<Value> = Vec::with_capacity(flat.len());
    for entry in flat {
        if is_empty(&entry) || entries.contains(&entry) {
            continue;
        }
        if let Some(target) = reference(&entry)
            && entries.iter().any(|e| reference(e) == Some(target))
        {
            continue;
        }
        entries.push(entry);
    }

    if entries.len() > 2 {
        let mut folded: Vec<Value> = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(last) = folded.last_mut()
                && foldable(last, &entry)
            {
                *last = merge_schema(last, &entry);
            } else {
                folded.push(entry);
            }
        }
        entries = folded;
    }

    if entries.len() == 1 && !nullable {
        return entries.swap_remove(0);
    }
    wrap_all_of(entries, nullable)
}

/// Adjacent plain fragments of the same JSON type (arrays excluded) are
/// folded into one.
fn foldable(a: &Value, b: &Value) -> bool {
    let plain = |v: &Value| {
        v.is_object() && !has(v, "$ref") && !has(v, "allOf") && !has(v, "oneOf") && !has(v, "anyOf")
    };
    plain(a) && plain(b) && a.get("type") == b.get("type") && a.get("type") != Some(&Value::from("array"))
}

fn zip_members(left: &[Value], right: &[Value]) -> Vec<Value> {
    let mut members: Vec<Value> = left
        .iter()
        .zip(right)
        .map(|(a, b)| merge_schema(a, b))
        .collect();
    let longer = if left.len() > right.len() { left } else { right };
    members.extend(longer.iter().skip(members.len()).cloned());
    members
}

fn union_members(left: &[Value], right: &[Value]) -> Vec<Value> {
    let mut members = left.to_vec();
    for member in right {
        if !members.contains(member) {
            members.push(member.clone());
        }
    }
    members
}

fn merge_members(
    left: &Map<String, Value>,
    right: &Map<String, Value>,
    keyword: &str,
    combine: fn(&[Value], &[Value]) -> Vec<Value>,
) -> Value {
    let members = |map: &Map<String, Value>| {
        map.get(keyword)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let without = |map: &Map<String, Value>| {
        let mut map = map.clone();
        map.remove(keyword);
        map
    };

    let mut merged = Map::new();
    merged.insert(
        keyword.to_string(),
        Value::Array(combine(&members(left), &members(right))),
    );
    merged.extend(merge_objects(&without(left), &without(right)));
    Value::Object(merged)
}

fn merge_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = left.clone();
    for (key, value) in right {
        let combined = match (key.as_str(), merged.get(key), value) {
            ("properties", Some(Value::Object(a)), Value::Object(b)) => {
                let mut props = a.clone();
                for (name, schema) in b {
                    let schema = match props.get(name) {
                        Some(existing) => merge_schema(existing, schema),
                        None => schema.clone(),
                    };
                    props.insert(name.clone(), schema);
                }
                Value::Object(props)
            }
            ("required", Some(Value::Array(a)), Value::Array(b)) => {
                Value::Array(union_members(a, b))
            }
            ("additionalProperties", Some(Value::Object(a)), Value::Object(b)) => {
                let mut shallow = a.clone();
                shallow.extend(b.iter().map(|(k, v)| (k.clone(), v.clone())));
                Value::Object(shallow)
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}
