//! Builders for domain primitives used across tests.

use serde_json::{json, Value};

use crate::domain::addon::dataverse::SHORT_NAME;
use crate::domain::{ExternalAccount, Node, User};

/// A registered user with a predictable email.
pub fn user(name: &str) -> User {
    User::registered(name, format!("{}@example.com", name.to_lowercase()))
}

/// An unregistered placeholder account.
pub fn unregistered_user(name: &str) -> User {
    User::unregistered(name, format!("{}@example.com", name.to_lowercase()))
}

/// A top-level project.
pub fn project(title: &str) -> Node {
    Node::new(title)
}

/// A Dataverse API-token account on `host`.
pub fn dataverse_account(host: &str, token: &str) -> ExternalAccount {
    let mut account = ExternalAccount::new(SHORT_NAME, token, host, token);
    account.display_name = Some(host.to_string());
    account
}

/// An atomic registration schema document with one required text question.
pub fn atomic_schema(name: &str, version: i32) -> Value {
    json!({
        "name": name,
        "version": version,
        "description": format!("{name} template"),
        "blocks": [
            {"block_type": "page-heading", "display_text": "Study"},
            {"block_type": "question-label", "display_text": "Summary"},
            {"block_type": "long-text-input", "registration_response_key": "summary", "required": true},
            {"block_type": "question-label", "display_text": "Design"},
            {"block_type": "single-select-input", "registration_response_key": "design"},
            {"block_type": "select-input-option", "display_text": "Experimental"},
            {"block_type": "select-input-option", "display_text": "Observational"}
        ]
    })
}

/// A page-based registration schema document with one required question.
pub fn page_schema(name: &str, version: i32) -> Value {
    json!({
        "name": name,
        "version": version,
        "pages": [{
            "id": "page1",
            "title": "Study",
            "questions": [{
                "qid": "q1",
                "title": "Title",
                "type": "string",
                "format": "text",
                "required": true
            }]
        }]
    })
}
