mod harness;

use harness::temp_db::TempDb;
use osfcore::application::schema::SchemaService;
use osfcore::error::Error;
use osfcore::testkit::domain::{atomic_schema, page_schema};
use serde_json::json;

#[tokio::test]
async fn atomic_schema_round_trip_through_the_database() {
    let db = TempDb::create();
    let schemas = SchemaService::new(db.store());

    let imported = schemas
        .import_registration_schema(atomic_schema("Open-Ended", 1))
        .await
        .unwrap();
    assert!(imported.created);
    assert_eq!(imported.blocks, 7);

    let blocks = schemas.blocks(&imported.id).await.unwrap();
    let keys: Vec<_> = blocks
        .iter()
        .filter_map(|b| b.registration_response_key.as_deref())
        .collect();
    assert_eq!(keys, vec!["summary", "design"]);
    let positions: Vec<_> = blocks.iter().map(|b| b.position).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);

    let fresh = SchemaService::new(TempDb::create().store());
    assert!(matches!(
        fresh.get(&imported.id).await,
        Err(Error::NotFound { .. })
    ));
}

#[tokio::test]
async fn registration_responses_follow_required_and_options() {
    let db = TempDb::create();
    let schemas = SchemaService::new(db.store());
    let id = schemas
        .import_registration_schema(atomic_schema("Open-Ended", 1))
        .await
        .unwrap()
        .id;

    assert!(schemas
        .validate_registration_responses(
            &id,
            &json!({"summary": "We measure things.", "design": "Experimental"}),
            true,
        )
        .await
        .unwrap());

    // Draft responses may leave required questions empty.
    assert!(schemas
        .validate_registration_responses(&id, &json!({"summary": ""}), false)
        .await
        .unwrap());

    assert!(matches!(
        schemas
            .validate_registration_responses(&id, &json!({"summary": ""}), true)
            .await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        schemas
            .validate_registration_responses(
                &id,
                &json!({"summary": "ok", "design": "Astrology"}),
                true,
            )
            .await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn page_schema_metadata_requires_answers() {
    let db = TempDb::create();
    let schemas = SchemaService::new(db.store());
    let id = schemas
        .import_registration_schema(page_schema("Pages", 1))
        .await
        .unwrap()
        .id;

    schemas
        .validate_metadata(&id, &json!({"q1": {"value": "A title"}}), false, true)
        .await
        .unwrap();
    schemas
        .validate_metadata(&id, &json!({}), false, false)
        .await
        .unwrap();
    assert!(matches!(
        schemas.validate_metadata(&id, &json!({}), false, true).await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn newer_versions_shadow_older_ones() {
    let db = TempDb::create();
    let schemas = SchemaService::new(db.store());
    schemas
        .import_registration_schema(atomic_schema("Open-Ended", 1))
        .await
        .unwrap();
    schemas
        .import_registration_schema(atomic_schema("Open-Ended", 2))
        .await
        .unwrap();
    schemas
        .import_registration_schema(page_schema("Pages", 1))
        .await
        .unwrap();

    let latest = schemas.latest_versions(true).await.unwrap();
    let names: Vec<_> = latest
        .iter()
        .map(|s| (s.base.name.as_str(), s.base.schema_version))
        .collect();
    assert_eq!(names, vec![("Open-Ended", 2), ("Pages", 1)]);
    assert_eq!(schemas.all().await.unwrap().len(), 3);
}
