//! Flat records built from Linear GraphQL nodes.
//!
//! Nested relations are resolved to their display value (`state.name`,
//! `team.key`, ...) so callers never chase a second lookup.

use serde_json::{json, Value};

use crate::flatten::{at, pluck};

pub(super) fn issue(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "identifier": node["identifier"],
        "title": node["title"],
        "description": node["description"],
        "priority": node["priority"],
        "state": at(node, "/state/name"),
        "assignee": at(node, "/assignee/name"),
        "team": at(node, "/team/key"),
        "project": at(node, "/project/name"),
        "labels": pluck(&at(node, "/labels/nodes"), "name"),
        "url": node["url"],
        "createdAt": node["createdAt"],
        "updatedAt": node["updatedAt"],
    })
}

pub(super) fn project(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "name": node["name"],
        "description": node["description"],
        "state": node["state"],
        "progress": node["progress"],
        "lead": at(node, "/lead/name"),
        "teams": pluck(&at(node, "/teams/nodes"), "key"),
        "targetDate": node["targetDate"],
        "url": node["url"],
    })
}

pub(super) fn team(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "key": node["key"],
        "name": node["name"],
        "description": node["description"],
    })
}

pub(super) fn comment(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "body": node["body"],
        "author": at(node, "/user/name"),
        "createdAt": node["createdAt"],
    })
}

pub(super) fn user(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "name": node["name"],
        "displayName": node["displayName"],
        "email": node["email"],
        "active": node["active"],
        "admin": node["admin"],
    })
}

pub(super) fn cycle(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "number": node["number"],
        "name": node["name"],
        "startsAt": node["startsAt"],
        "endsAt": node["endsAt"],
        "progress": node["progress"],
    })
}

pub(super) fn label(node: &Value) -> Value {
    json!({
        "id": node["id"],
        "name": node["name"],
        "color": node["color"],
        "team": at(node, "/team/key"),
    })
}
