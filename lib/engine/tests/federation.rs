#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use async_trait::async_trait;
use fedql_engine::adapter::{
    AdapterRegistry, ExecutionOutcome, ExecutionRequest, LocalStoreAdapter, SourceAdapter,
};
use fedql_engine::{AdapterError, EngineError, FederationEngine};
use fedql_model::pattern::Selection;
use fedql_model::{ConfigurationError, ExecutionConfig, FederationSchema};
use fedql_store::{MemoryStore, RdfFormat};
use insta::assert_snapshot;
use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use tracing_test::traced_test;

const PEOPLE: &str = r#"
@prefix schema: <http://schema.org/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix ex: <http://example.com/> .

ex:alice a schema:Person ;
    schema:name "Alice" ;
    rdfs:label "Alice"@en , "Alicia"@es ;
    schema:birthDate "1990-01-01" ;
    schema:nationality ex:fr ;
    schema:knows ex:bob .

ex:bob a schema:Person ;
    schema:name "Bob" ;
    rdfs:label "Bob"@en , "Bob"@de ;
    schema:nationality ex:de .

ex:fr a schema:Country .
ex:de a schema:Country .
"#;

const COUNTRIES: &str = r#"
@prefix schema: <http://schema.org/> .
@prefix ex: <http://example.com/> .

ex:fr a schema:Country ; schema:name "France" .
ex:de a schema:Country ; schema:name "Germany" .
ex:it a schema:Country ; schema:name "Italy" .
"#;

const EXTRA: &str = r#"
@prefix schema: <http://schema.org/> .
@prefix ex: <http://example.com/> .

ex:alice a schema:Person ; schema:alternateName "Ally" .
ex:carol a schema:Person ; schema:name "Carol" .
"#;

fn schema() -> Result<FederationSchema, Box<dyn Error>> {
    Ok(serde_json::from_value(json!({
        "types": {
            "Person": {
                "id": "http://schema.org/Person",
                "fields": {
                    "name": { "services": ["people"], "targetName": "String" },
                    "label": { "services": ["people"], "targetName": "hgqls_Literal", "isList": true },
                    "birthDate": { "services": ["people"], "targetName": "String" },
                    "nationality": { "services": ["people"], "targetName": "Country" },
                    "knows": { "services": ["people"], "targetName": "Person", "isList": true },
                    "nickname": { "services": ["extra"], "targetName": "String" }
                }
            },
            "Country": {
                "id": "http://schema.org/Country",
                "fields": {
                    "name": { "services": ["countries"], "targetName": "String" }
                }
            }
        },
        "fields": {
            "name": { "id": "http://schema.org/name" },
            "label": { "id": "http://www.w3.org/2000/01/rdf-schema#label" },
            "birthDate": { "id": "http://schema.org/birthDate" },
            "nationality": { "id": "http://schema.org/nationality" },
            "knows": { "id": "http://schema.org/knows" },
            "nickname": { "id": "http://schema.org/alternateName" }
        },
        "queryFields": {
            "people": { "services": ["people"], "targetName": "Person" },
            "everyone": { "services": ["people", "extra"], "targetName": "Person" },
            "partly": { "services": ["people", "broken"], "targetName": "Person" },
            "person": {
                "services": ["people"],
                "targetName": "Person",
                "kind": "getById",
                "isList": false
            },
            "broken": { "services": ["broken"], "targetName": "Country" },
            "unassigned": { "services": [], "targetName": "Country" }
        },
        "mutationService": "people",
        "mutationFields": {
            "insert_Person": { "targetName": "Person", "action": "insert" },
            "delete_Person": { "targetName": "Person", "action": "delete" }
        }
    }))?)
}

/// An adapter whose backend is always down.
#[derive(Debug)]
struct FailingAdapter;

#[async_trait]
impl SourceAdapter for FailingAdapter {
    fn id(&self) -> &str {
        "broken"
    }

    async fn execute(&self, _request: ExecutionRequest<'_>) -> Result<ExecutionOutcome, AdapterError> {
        Err(AdapterError::Timeout(std::time::Duration::from_secs(60)))
    }
}

fn local(id: &str, data: &str) -> Result<Arc<dyn SourceAdapter>, Box<dyn Error>> {
    let store = MemoryStore::from_reader(RdfFormat::Turtle, data.as_bytes())?;
    Ok(Arc::new(LocalStoreAdapter::new(id, store, None)))
}

fn engine_with(execution: &ExecutionConfig) -> Result<FederationEngine, Box<dyn Error>> {
    let mut registry = AdapterRegistry::new();
    registry.register(local("people", PEOPLE)?)?;
    registry.register(local("countries", COUNTRIES)?)?;
    registry.register(local("extra", EXTRA)?)?;
    registry.register(Arc::new(FailingAdapter))?;
    Ok(FederationEngine::with_registry(
        schema()?,
        registry,
        execution,
    )?)
}

fn engine() -> Result<FederationEngine, Box<dyn Error>> {
    engine_with(&ExecutionConfig::default())
}

fn people_with_nationality() -> Selection {
    Selection::field("people").with_selections([
        Selection::field("_id"),
        Selection::field("name"),
        Selection::field("nationality").with_selections([Selection::field("name")]),
    ])
}

#[tokio::test]
async fn test_cross_source_query() -> Result<(), Box<dyn Error>> {
    let response = engine()?.query(&[people_with_nationality()]).await?;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        json!({
            "people": [
                {
                    "_id": "http://example.com/alice",
                    "name": "Alice",
                    "nationality": { "name": "France" }
                },
                {
                    "_id": "http://example.com/bob",
                    "name": "Bob",
                    "nationality": { "name": "Germany" }
                }
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_batching_does_not_change_the_result() -> Result<(), Box<dyn Error>> {
    let unbatched = engine()?.query(&[people_with_nationality()]).await?;
    let batched = engine_with(&ExecutionConfig {
        batch_size: 1,
        workers: 1,
        ..ExecutionConfig::default()
    })?
    .query(&[people_with_nationality()])
    .await?;
    assert_eq!(batched.data, unbatched.data);
    Ok(())
}

#[tokio::test]
async fn test_nested_split_below_a_list() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[Selection::field("people").with_selections([
            Selection::field("_id"),
            Selection::field("knows").with_selections([
                Selection::field("_id"),
                Selection::field("nationality").with_selections([Selection::field("name")]),
            ]),
        ])])
        .await?;
    assert_eq!(
        response.data,
        json!({
            "people": [
                {
                    "_id": "http://example.com/alice",
                    "knows": [
                        { "_id": "http://example.com/bob", "nationality": { "name": "Germany" } }
                    ]
                },
                { "_id": "http://example.com/bob", "knows": [] }
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_sibling_fields_of_another_source() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[Selection::field("people").with_selections([
            Selection::field("name"),
            Selection::field("birthDate"),
            Selection::field("nickname"),
        ])])
        .await?;
    assert_eq!(
        response.data,
        json!({
            "people": [
                { "name": "Alice", "birthDate": "1990-01-01", "nickname": "Ally" },
                { "name": "Bob", "birthDate": null, "nickname": null }
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_plan_splits_fields_by_owner() -> Result<(), Box<dyn Error>> {
    let plan = engine()?.plan(&[Selection::field("people").with_selections([
        Selection::field("name"),
        Selection::field("birthDate"),
        Selection::field("nickname"),
    ])])?;

    assert_eq!(plan.roots().len(), 1);
    let root = plan.unit(plan.roots().units()[0]);
    assert_eq!(root.adapter.id(), "people");
    assert_eq!(root.children.len(), 1);
    let forest = &root.children["x_1"];
    assert_eq!(forest.len(), 1);
    let child = plan.unit(forest.units()[0]);
    assert_eq!(child.adapter.id(), "extra");
    assert_eq!(child.root_type, "Person");
    assert_eq!(child.fragment.nodes().count(), 1);
    assert_ne!(root.execution_id, child.execution_id);
    Ok(())
}

#[tokio::test]
async fn test_plan_display() -> Result<(), Box<dyn Error>> {
    let plan = engine()?.plan(&[
        people_with_nationality(),
        Selection::field("person")
            .with_arg("_id", "http://example.com/bob")
            .with_selections([Selection::field("nickname")]),
    ])?;
    assert_snapshot!(plan.to_string().trim_end(), @r"
    people (Query)
      people(?x_1) { _id(?x_1_1), name(?x_1_2), nationality(?x_1_3) }
      ?x_1_3 =>
        countries (Country)
          name(?x_1_3_1)
    people (Query)
      person(?x_2)
      ?x_2 =>
        extra (Person)
          nickname(?x_2_1)
    ");
    Ok(())
}

#[tokio::test]
async fn test_language_of_literal_placeholder() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[Selection::field("people").with_selections([
            Selection::field("_id"),
            Selection::field("label")
                .with_selections([Selection::field("hgqls_value").with_arg("lang", "es")]),
        ])])
        .await?;
    assert_eq!(
        response.data,
        json!({
            "people": [
                { "_id": "http://example.com/alice", "label": [{ "hgqls_value": "Alicia" }] },
                { "_id": "http://example.com/bob", "label": [] }
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_equal_literals_in_different_languages() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[Selection::field("person")
            .with_arg("_id", "http://example.com/bob")
            .with_selections([
                Selection::field("label").with_selections([Selection::field("hgqls_value")])
            ])])
        .await?;
    assert_eq!(
        response.data,
        json!({
            "person": {
                "label": [{ "hgqls_value": "Bob" }, { "hgqls_value": "Bob" }]
            }
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_pagination_of_root_fields() -> Result<(), Box<dyn Error>> {
    let engine = engine()?;
    let first = engine
        .query(&[Selection::field("people")
            .with_arg("order", "DESCENDING")
            .with_arg("limit", 1)
            .with_selections([Selection::field("_id")])])
        .await?;
    assert_eq!(
        first.data,
        json!({ "people": [{ "_id": "http://example.com/bob" }] })
    );

    let second = engine
        .query(&[Selection::field("people")
            .with_arg("order", "DESCENDING")
            .with_arg("offset", 1)
            .with_arg("limit", 1)
            .with_selections([Selection::field("_id")])])
        .await?;
    assert_eq!(
        second.data,
        json!({ "people": [{ "_id": "http://example.com/alice" }] })
    );
    Ok(())
}

#[tokio::test]
async fn test_lookup_by_id() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[Selection::field("person")
            .with_alias("bob")
            .with_arg("_id", "http://example.com/bob")
            .with_selections([
                Selection::field("_type"),
                Selection::field("name"),
                Selection::field("birthDate"),
            ])])
        .await?;
    assert_eq!(
        response.data,
        json!({
            "bob": {
                "_type": "http://schema.org/Person",
                "name": "Bob",
                "birthDate": null
            }
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_fan_out_unions_sources() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[Selection::field("everyone").with_selections([Selection::field("_id")])])
        .await?;
    assert_eq!(
        response.data,
        json!({
            "everyone": [
                { "_id": "http://example.com/alice" },
                { "_id": "http://example.com/bob" },
                { "_id": "http://example.com/carol" }
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_failing_source_is_isolated() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[
            Selection::field("people").with_selections([Selection::field("name")]),
            Selection::field("broken").with_selections([Selection::field("_id")]),
        ])
        .await?;
    assert_eq!(
        response.data,
        json!({ "people": [{ "name": "Alice" }, { "name": "Bob" }] })
    );
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].contains("broken"));
    Ok(())
}

#[tokio::test]
async fn test_failing_fan_out_member_is_reported() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[Selection::field("partly").with_selections([Selection::field("_id")])])
        .await?;
    assert_eq!(
        response.data,
        json!({
            "partly": [
                { "_id": "http://example.com/alice" },
                { "_id": "http://example.com/bob" }
            ]
        })
    );
    assert_eq!(response.errors.len(), 1, "{:?}", response.errors);
    assert!(response.errors[0].starts_with("Execution on service 'broken' failed"));
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_unassigned_root_field_is_a_warning() -> Result<(), Box<dyn Error>> {
    let response = engine()?
        .query(&[
            Selection::field("unassigned").with_selections([Selection::field("_id")]),
            Selection::field("people").with_selections([Selection::field("name")]),
        ])
        .await?;
    assert_eq!(response.warnings.len(), 1);
    assert!(logs_contain(
        "The query field 'unassigned' has no assigned service and is skipped"
    ));
    assert!(response.data.get("unassigned").is_none());
    assert!(response.data.get("people").is_some());
    Ok(())
}

#[tokio::test]
async fn test_invalid_query_is_rejected() -> Result<(), Box<dyn Error>> {
    let engine = engine()?;
    assert!(engine
        .query(&[Selection::field("people").with_selections([Selection::field("unknown")])])
        .await
        .is_err());
    assert!(engine
        .query(&[Selection::field("people").with_arg("order", "SIDEWAYS")])
        .await
        .is_err());
    Ok(())
}

#[tokio::test]
async fn test_response_document() -> Result<(), Box<dyn Error>> {
    let response = engine()?.query(&[people_with_nationality()]).await?;
    let document = serde_json::to_value(&response)?;
    assert_eq!(document["@context"]["_id"], "@id");
    assert_eq!(document["@context"]["name"], "http://schema.org/name");
    assert_eq!(
        document["@context"]["nationality"],
        "http://schema.org/nationality"
    );
    assert!(document.get("errors").is_none());
    Ok(())
}

#[tokio::test]
async fn test_update_local_source() -> Result<(), Box<dyn Error>> {
    let engine = engine()?;
    let result = engine
        .update(
            "countries",
            "INSERT DATA { <http://example.com/es> a <http://schema.org/Country> }",
        )
        .await;
    assert!(result.is_ok());
    assert!(engine.update("nowhere", "CLEAR ALL").await.is_err());
    assert!(engine.update("broken", "CLEAR ALL").await.is_err());
    Ok(())
}

fn people_ids() -> Selection {
    Selection::field("people").with_selections([Selection::field("_id"), Selection::field("name")])
}

#[tokio::test]
async fn test_insert_mutation() -> Result<(), Box<dyn Error>> {
    let engine = engine()?;
    let response = engine
        .mutate(&[Selection::field("insert_Person")
            .with_arg("_id", "http://example.com/dave")
            .with_arg("name", "Dave")
            .with_arg("nationality", json!({ "_id": "http://example.com/it" }))
            .with_selections([
                Selection::field("_id"),
                Selection::field("name"),
                Selection::field("nationality").with_selections([Selection::field("name")]),
            ])])
        .await?;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data,
        json!({
            "insert_Person": {
                "_id": "http://example.com/dave",
                "name": "Dave",
                "nationality": { "name": "Italy" }
            }
        })
    );

    let people = engine.query(&[people_ids()]).await?;
    assert_eq!(people.data["people"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn test_delete_mutation_by_id() -> Result<(), Box<dyn Error>> {
    let engine = engine()?;
    let response = engine
        .mutate(&[Selection::field("delete_Person")
            .with_alias("removed")
            .with_arg("_id", "http://example.com/bob")
            .with_selections([Selection::field("_id")])])
        .await?;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert!(response.data.get("removed").is_some());

    let people = engine
        .query(&[Selection::field("people").with_selections([
            Selection::field("_id"),
            Selection::field("knows").with_selections([Selection::field("_id")]),
        ])])
        .await?;
    assert_eq!(
        people.data,
        json!({ "people": [{ "_id": "http://example.com/alice", "knows": [] }] })
    );
    Ok(())
}

#[tokio::test]
async fn test_delete_mutation_by_value() -> Result<(), Box<dyn Error>> {
    let engine = engine()?;
    engine
        .mutate(&[Selection::field("delete_Person")
            .with_arg("name", "Bob")
            .with_selections([Selection::field("_id")])])
        .await?;
    let people = engine.query(&[people_ids()]).await?;
    assert_eq!(
        people.data,
        json!({
            "people": [
                { "_id": "http://example.com/alice", "name": "Alice" },
                { "_id": "http://example.com/bob", "name": null }
            ]
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_mutation_changes_nothing() -> Result<(), Box<dyn Error>> {
    let engine = engine()?;
    let result = engine
        .mutate(&[
            Selection::field("insert_Person")
                .with_arg("_id", "http://example.com/dave")
                .with_selections([Selection::field("_id")]),
            Selection::field("insert_Person")
                .with_arg("name", "Nobody")
                .with_selections([Selection::field("_id")]),
        ])
        .await;
    assert!(result.is_err());
    let people = engine.query(&[people_ids()]).await?;
    assert_eq!(people.data["people"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn test_mutation_without_mutation_service() -> Result<(), Box<dyn Error>> {
    let mut schema = schema()?;
    schema.mutation_fields.clear();
    schema.mutation_service = None;
    let mut registry = AdapterRegistry::new();
    registry.register(local("people", PEOPLE)?)?;
    registry.register(local("countries", COUNTRIES)?)?;
    registry.register(local("extra", EXTRA)?)?;
    registry.register(Arc::new(FailingAdapter))?;
    let engine = FederationEngine::with_registry(schema, registry, &ExecutionConfig::default())?;
    assert!(matches!(
        engine
            .mutate(&[Selection::field("delete_Person").with_arg("_id", "http://example.com/bob")])
            .await,
        Err(EngineError::Configuration(ConfigurationError::MissingMutationService))
    ));
    Ok(())
}
