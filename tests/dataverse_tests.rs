mod harness;

use std::sync::Arc;

use harness::temp_db::TempDb;
use osfcore::application::addon::DataverseService;
use osfcore::domain::Node;
use osfcore::error::Error;
use osfcore::port::{NodeStore, UserStore};
use osfcore::testkit::dataverse::ScriptedDataverse;
use osfcore::testkit::domain::{project, user};
use serde_json::json;

const HOST: &str = "demo.dataverse.org";
const DOI: &str = "doi:10.5072/FK2/XYZ123";

#[tokio::test]
async fn waterbutler_payloads_for_an_authorized_project() {
    let db = TempDb::create();
    let store = db.store();
    let api = Arc::new(ScriptedDataverse::new().with_dataset("42", DOI));
    let addon = DataverseService::new(store.clone(), api.clone());

    let owner = user("Owner");
    let node = project("Survey");
    store.save_user(&owner).await.unwrap();
    store.save_node(&node).await.unwrap();

    let account = addon.connect_account(&owner, HOST, "token-1").await.unwrap();
    let result = addon.add_user_auth(&node, &owner, &account.id).await.unwrap();
    assert_eq!(result["result"]["nodeHasAuth"], json!(true));
    addon
        .set_dataset(&node, "demo", "Demo Dataverse", DOI, "Survey data")
        .await
        .unwrap();

    assert_eq!(
        addon.waterbutler_credentials(&node).await.unwrap(),
        json!({"token": "token-1"})
    );
    let settings = addon.waterbutler_settings(&node).await.unwrap();
    assert_eq!(settings["host"], json!(HOST));
    assert_eq!(settings["doi"], json!(DOI));
    assert_eq!(settings["id"], json!("42"));

    // The resolved id is persisted; a second lookup does not hit the API.
    addon.waterbutler_settings(&node).await.unwrap();
    assert_eq!(api.call_count(), 1);

    let log = addon
        .create_waterbutler_log(
            &node,
            Some(&owner.id),
            "file_added",
            &json!({"materialized": "/results.csv", "path": "/123"}),
        )
        .await
        .unwrap();
    assert_eq!(log.action, "dataverse_file_added");
}

#[tokio::test]
async fn fork_and_delete_follow_the_authorizer() {
    let db = TempDb::create();
    let store = db.store();
    let addon = DataverseService::new(store.clone(), Arc::new(ScriptedDataverse::new()));

    let owner = user("Owner");
    let other = user("Other");
    let node = project("Survey");
    store.save_user(&owner).await.unwrap();
    store.save_user(&other).await.unwrap();
    store.save_node(&node).await.unwrap();
    let account = addon.connect_account(&owner, HOST, "token-1").await.unwrap();
    addon.add_user_auth(&node, &owner, &account.id).await.unwrap();

    let fork = Node::new("Survey (fork)");
    store.save_node(&fork).await.unwrap();
    assert!(addon.after_fork(&node, &fork, &other.id).await.unwrap().is_some());
    assert!(!addon.node_settings(&fork).await.unwrap().has_auth());

    addon.after_delete(&node, &owner.id).await.unwrap();
    let settings = addon.node_settings(&node).await.unwrap();
    assert!(!settings.has_auth());
    assert!(matches!(
        addon.waterbutler_settings(&node).await,
        Err(Error::Unauthorized(_))
    ));
}

#[tokio::test]
async fn rejected_token_surfaces_as_unauthorized() {
    let db = TempDb::create();
    let store = db.store();
    let addon = DataverseService::new(store.clone(), Arc::new(ScriptedDataverse::rejecting()));

    let owner = user("Owner");
    let node = project("Survey");
    store.save_user(&owner).await.unwrap();
    store.save_node(&node).await.unwrap();
    let account = addon.connect_account(&owner, HOST, "expired").await.unwrap();
    addon.add_user_auth(&node, &owner, &account.id).await.unwrap();
    addon
        .set_dataset(&node, "demo", "Demo Dataverse", DOI, "Survey data")
        .await
        .unwrap();

    let err = addon.waterbutler_settings(&node).await.unwrap_err();
    assert_eq!(err.http_status(), 401);
}
