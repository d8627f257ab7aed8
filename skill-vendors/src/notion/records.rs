//! Flat records built from Notion API objects.
//!
//! Notion wraps every text value in rich-text arrays and every database cell
//! in a typed property object. These helpers unwrap both into plain JSON
//! scalars.

use serde_json::{json, Map, Value};

use crate::flatten::at;

/// Concatenated `plain_text` of a rich-text array.
pub(super) fn plain_text(rich: &Value) -> String {
    rich.as_array()
        .map(|items| items.iter().filter_map(|i| i["plain_text"].as_str()).collect())
        .unwrap_or_default()
}

/// Rich-text array holding a single text run.
pub(super) fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

/// Paragraph block with `content` as its only run.
pub(super) fn paragraph(content: &str) -> Value {
    json!({ "object": "block", "type": "paragraph", "paragraph": { "rich_text": rich_text(content) } })
}

/// Name of the `title`-typed entry of a properties object.
///
/// Pages under a page use `title`; database rows use whatever the database
/// calls its title column.
pub(super) fn title_property(properties: &Value) -> Option<String> {
    properties
        .as_object()?
        .iter()
        .find(|(_, prop)| prop["type"] == "title")
        .map(|(name, _)| name.clone())
}

fn page_title(page: &Value) -> String {
    page["properties"]
        .as_object()
        .and_then(|props| props.values().find(|p| p["type"] == "title"))
        .map(|p| plain_text(&p["title"]))
        .unwrap_or_default()
}

fn parent_id(object: &Value) -> Value {
    match object.pointer("/parent/type").and_then(Value::as_str) {
        Some("workspace") => Value::String("workspace".to_owned()),
        Some(kind) => object["parent"][kind].clone(),
        None => Value::Null,
    }
}

pub(super) fn page(p: &Value) -> Value {
    json!({
        "id": p["id"],
        "url": p["url"],
        "title": page_title(p),
        "createdTime": p["created_time"],
        "lastEditedTime": p["last_edited_time"],
        "archived": p["archived"],
        "parentType": at(p, "/parent/type"),
        "parentId": parent_id(p),
    })
}

/// What a page write returns: enough to find the page again.
pub(super) fn page_ref(p: &Value) -> Value {
    json!({ "id": p["id"], "url": p["url"], "archived": p["archived"] })
}

/// A database row: the page record plus its cells as plain values.
pub(super) fn row(p: &Value) -> Value {
    let mut record = page(p);
    let cells: Map<String, Value> = p["properties"]
        .as_object()
        .map(|props| props.iter().map(|(name, prop)| (name.clone(), property_value(prop))).collect())
        .unwrap_or_default();
    record["properties"] = Value::Object(cells);
    record
}

pub(super) fn database(d: &Value) -> Value {
    let columns: Map<String, Value> = d["properties"]
        .as_object()
        .map(|props| props.iter().map(|(name, prop)| (name.clone(), prop["type"].clone())).collect())
        .unwrap_or_default();
    json!({
        "id": d["id"],
        "url": d["url"],
        "title": plain_text(&d["title"]),
        "description": plain_text(&d["description"]),
        "properties": columns,
        "createdTime": d["created_time"],
        "lastEditedTime": d["last_edited_time"],
        "archived": d["archived"],
        "parentType": at(d, "/parent/type"),
        "parentId": parent_id(d),
    })
}

/// Page or database record, tagged with its `object` kind.
pub(super) fn search_result(r: &Value) -> Value {
    let mut record = if r["object"] == "database" { database(r) } else { page(r) };
    record["object"] = r["object"].clone();
    record
}

pub(super) fn block(b: &Value) -> Value {
    let kind = b["type"].as_str().unwrap_or_default();
    let body = &b[kind];
    let text = if body["rich_text"].is_array() {
        Value::String(plain_text(&body["rich_text"]))
    } else {
        body["title"].as_str().map_or(Value::Null, |t| Value::String(t.to_owned()))
    };
    json!({
        "id": b["id"],
        "type": kind,
        "text": text,
        "checked": body["checked"],
        "hasChildren": b["has_children"],
    })
}

pub(super) fn user(u: &Value) -> Value {
    json!({
        "id": u["id"],
        "name": u["name"],
        "type": u["type"],
        "email": at(u, "/person/email"),
        "avatarUrl": u["avatar_url"],
    })
}

pub(super) fn comment(c: &Value) -> Value {
    json!({
        "id": c["id"],
        "text": plain_text(&c["rich_text"]),
        "discussionId": c["discussion_id"],
        "createdTime": c["created_time"],
        "createdBy": at(c, "/created_by/id"),
    })
}

/// Plain value of one database cell.
pub(super) fn property_value(prop: &Value) -> Value {
    let kind = prop["type"].as_str().unwrap_or_default();
    let v = &prop[kind];
    match kind {
        "title" | "rich_text" => Value::String(plain_text(v)),
        "number" | "checkbox" | "url" | "email" | "phone_number" | "created_time" | "last_edited_time" => v.clone(),
        "select" | "status" => v["name"].clone(),
        "multi_select" => v
            .as_array()
            .map(|items| items.iter().map(|i| i["name"].clone()).collect())
            .unwrap_or_else(|| json!([])),
        "date" => {
            if v.is_null() {
                Value::Null
            } else {
                json!({ "start": v["start"], "end": v["end"] })
            }
        }
        "people" | "relation" => v
            .as_array()
            .map(|items| items.iter().map(|i| i["id"].clone()).collect())
            .unwrap_or_else(|| json!([])),
        "created_by" | "last_edited_by" => v["id"].clone(),
        "files" => v
            .as_array()
            .map(|items| items.iter().map(|i| i["name"].clone()).collect())
            .unwrap_or_else(|| json!([])),
        "formula" => {
            let inner = v["type"].as_str().unwrap_or_default();
            v[inner].clone()
        }
        "unique_id" => match (v["prefix"].as_str(), v["number"].as_i64()) {
            (Some(prefix), Some(n)) => Value::String(format!("{prefix}-{n}")),
            (None, Some(n)) => Value::from(n),
            _ => Value::Null,
        },
        "rollup" => {
            let inner = v["type"].as_str().unwrap_or_default();
            v[inner].clone()
        }
        _ => Value::Null,
    }
}
