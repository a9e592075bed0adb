#![cfg(test)]
#![allow(clippy::panic_in_result_fn)]

use fedql_store::{MemoryStore, QuerySolution, RdfFormat, StoreError};
use oxrdf::{Literal, NamedNode, Term};
use std::error::Error;
use std::fs;

const DATA: &str = r#"
@prefix schema: <http://schema.org/> .
@prefix foaf: <http://xmlns.com/foaf/0.1/> .
@prefix ex: <http://example.com/> .

ex:alice a schema:Person ;
    schema:name "Alice"@en , "Alicia"@es ;
    schema:knows ex:bob .

ex:bob a foaf:Person ;
    foaf:name "Bob" ;
    foaf:knows ex:carol .

ex:carol a schema:Person ;
    schema:name "Carol" .

ex:paris a schema:City ;
    schema:name "Paris"@fr .
"#;

fn store() -> Result<MemoryStore, Box<dyn Error>> {
    Ok(MemoryStore::from_reader(RdfFormat::Turtle, DATA.as_bytes())?)
}

fn iri(value: &str) -> Term {
    NamedNode::new_unchecked(value).into()
}

fn values(solutions: &[QuerySolution], variable: &str) -> Vec<Option<Term>> {
    solutions.iter().map(|s| s.get(variable).cloned()).collect()
}

#[tokio::test]
async fn test_subselect_with_order_and_limit() -> Result<(), Box<dyn Error>> {
    let solutions = store()?
        .query(
            "SELECT * WHERE { { SELECT ?x_1 WHERE { ?x_1 a <http://schema.org/Person> . } \
             ORDER BY DESC(?x_1) LIMIT 1 } }",
        )
        .await?;
    assert_eq!(
        values(&solutions, "x_1"),
        vec![Some(iri("http://example.com/carol"))]
    );
    Ok(())
}

#[tokio::test]
async fn test_optional_keeps_rows_without_data() -> Result<(), Box<dyn Error>> {
    let solutions = store()?
        .query(
            "SELECT * WHERE { VALUES ?x_1 { <http://example.com/alice> <http://example.com/paris> } \
             OPTIONAL { ?x_1 <http://schema.org/knows> ?x_1_1 . } }",
        )
        .await?;
    assert_eq!(solutions.len(), 2);
    let paris = solutions
        .iter()
        .find(|s| s.get("x_1") == Some(&iri("http://example.com/paris")))
        .ok_or("missing row for paris")?;
    assert_eq!(paris.get("x_1_1"), None);
    Ok(())
}

#[tokio::test]
async fn test_language_filter_inside_optional() -> Result<(), Box<dyn Error>> {
    let solutions = store()?
        .query(
            "SELECT * WHERE { VALUES ?x_1 { <http://example.com/alice> } \
             OPTIONAL { ?x_1 <http://schema.org/name> ?x_1_1 . FILTER (lang(?x_1_1) = \"es\") } }",
        )
        .await?;
    assert_eq!(
        values(&solutions, "x_1_1"),
        vec![Some(Literal::new_language_tagged_literal("Alicia", "es")?.into())]
    );
    Ok(())
}

#[tokio::test]
async fn test_alternative_paths_and_type_union() -> Result<(), Box<dyn Error>> {
    let solutions = store()?
        .query(
            "SELECT * WHERE { { ?x_1 a <http://schema.org/Person> } UNION { ?x_1 a <http://xmlns.com/foaf/0.1/Person> } \
             OPTIONAL { ?x_1 <http://schema.org/knows>|<http://xmlns.com/foaf/0.1/knows> ?x_1_1 . } }",
        )
        .await?;
    let mut pairs: Vec<(String, Option<String>)> = solutions
        .iter()
        .map(|s| {
            (
                s.get("x_1").map(ToString::to_string).unwrap_or_default(),
                s.get("x_1_1").map(ToString::to_string),
            )
        })
        .collect();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![
            (
                "<http://example.com/alice>".to_owned(),
                Some("<http://example.com/bob>".to_owned())
            ),
            (
                "<http://example.com/bob>".to_owned(),
                Some("<http://example.com/carol>".to_owned())
            ),
            ("<http://example.com/carol>".to_owned(), None),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_literal_filter() -> Result<(), Box<dyn Error>> {
    let solutions = store()?
        .query(
            "SELECT ?o WHERE { <http://example.com/alice> ?p ?o . FILTER(isLiteral(?o)) }",
        )
        .await?;
    assert_eq!(solutions.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_named_graph() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::from_reader(
        RdfFormat::TriG,
        b"<http://example.com/g> { <http://example.com/s> <http://example.com/p> \"in graph\" . }\n\
          <http://example.com/s> <http://example.com/p> \"in default\" ."
            .as_ref(),
    )?;
    let solutions = store
        .query("SELECT ?o WHERE { GRAPH <http://example.com/g> { ?s ?p ?o } }")
        .await?;
    assert_eq!(
        values(&solutions, "o"),
        vec![Some(Literal::new_simple_literal("in graph").into())]
    );
    Ok(())
}

#[tokio::test]
async fn test_unsupported_query_form() -> Result<(), Box<dyn Error>> {
    let result = store()?.query("ASK { ?s ?p ?o }").await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn test_update_is_persisted() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("people.ttl");
    fs::write(&path, DATA)?;

    let store = MemoryStore::open(&path, None)?;
    let before = store.len().await?;
    store
        .update(
            "INSERT DATA { <http://example.com/dave> a <http://schema.org/Person> } ; \
             DELETE WHERE { <http://example.com/paris> ?p ?o }",
        )
        .await?;
    assert_eq!(store.len().await?, before + 1 - 2);

    let reloaded = MemoryStore::open(&path, Some("turtle"))?;
    let solutions = reloaded
        .query("SELECT ?x WHERE { ?x a <http://schema.org/Person> }")
        .await?;
    assert_eq!(solutions.len(), 3);
    assert!(reloaded
        .query("SELECT ?p WHERE { <http://example.com/paris> ?p ?o }")
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_persist_leaves_store_unchanged() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("people.ttl");
    fs::write(&path, DATA)?;
    let store = MemoryStore::open(&path, None)?;
    let before = store.len().await?;

    // The temporary file cannot be created where a directory exists.
    fs::create_dir(dir.path().join("people.tmp"))?;
    let result = store
        .update("INSERT DATA { <http://example.com/dave> a <http://schema.org/Person> }")
        .await;

    assert!(matches!(result, Err(StoreError::Persist { .. })), "{result:?}");
    assert_eq!(store.len().await?, before);
    assert!(store
        .query("SELECT ?p WHERE { <http://example.com/dave> ?p ?o }")
        .await?
        .is_empty());
    assert_eq!(fs::read_to_string(&path)?, DATA);
    Ok(())
}

#[tokio::test]
async fn test_update_without_file() -> Result<(), Box<dyn Error>> {
    let store = store()?;
    store
        .update("DELETE WHERE { <http://example.com/paris> ?p ?o }")
        .await?;
    assert!(store
        .query("SELECT ?p WHERE { <http://example.com/paris> ?p ?o }")
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_named_graphs_cannot_be_dumped_as_turtle() -> Result<(), Box<dyn Error>> {
    let store = MemoryStore::from_reader(
        RdfFormat::TriG,
        b"<http://example.com/g> { <http://example.com/s> <http://example.com/p> \"o\" . }".as_ref(),
    )?;
    let result = store.dump_to_writer(RdfFormat::Turtle, Vec::new()).await;
    assert!(matches!(result, Err(StoreError::DatasetFormatExpected(_))), "{result:?}");
    let nquads = store.dump_to_writer(RdfFormat::NQuads, Vec::new()).await?;
    assert!(String::from_utf8(nquads)?.contains("<http://example.com/g>"));
    Ok(())
}
