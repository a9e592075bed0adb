use crate::cli::{Args, Command};
use anyhow::Context;
use clap::Parser;
use fedql::model::pattern::Selection;
use fedql::{load_engine, Response};
use std::fs;
use std::io::{self, stdin, stdout, Read, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let matches = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let engine = load_engine(&matches.config)
        .with_context(|| format!("Failed to load {}", matches.config.display()))?;
    match matches.command {
        Command::Query { query_file, pretty } => {
            let selections = read_selections(query_file.as_deref())?;
            let response = engine.query(&selections).await?;
            print_response(&response, pretty)
        }
        Command::Mutate { query_file, pretty } => {
            let selections = read_selections(query_file.as_deref())?;
            let response = engine.mutate(&selections).await?;
            print_response(&response, pretty)
        }
        Command::Plan { query_file } => {
            let selections = read_selections(query_file.as_deref())?;
            let plan = engine.plan(&selections)?;
            let mut stdout = stdout().lock();
            write!(stdout, "{plan}")?;
            Ok(stdout.flush()?)
        }
        Command::Update {
            service,
            update,
            update_file,
        } => {
            let update = match (update, update_file) {
                (Some(update), _) => update,
                (None, Some(file)) => fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?,
                (None, None) => read_stdin()?,
            };
            engine.update(&service, &update).await?;
            Ok(())
        }
    }
}

fn print_response(response: &Response, pretty: bool) -> anyhow::Result<()> {
    let mut stdout = stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, response)?;
    } else {
        serde_json::to_writer(&mut stdout, response)?;
    }
    writeln!(stdout)?;
    Ok(stdout.flush()?)
}

fn read_selections(file: Option<&Path>) -> anyhow::Result<Vec<Selection>> {
    let document = match file {
        Some(file) => fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?,
        None => read_stdin()?,
    };
    serde_json::from_str(&document).context("The query must be a JSON array of selections")
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buffer = String::new();
    stdin().lock().read_to_string(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use crate::cli::Args;
    use anyhow::Result;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;

    const CONFIG: &str = r#"{
        "services": [
            { "id": "people", "type": "LocalModel", "filepath": "people.ttl" }
        ],
        "schema": {
            "types": {
                "Person": {
                    "id": "http://schema.org/Person",
                    "fields": { "name": { "services": ["people"], "targetName": "String" } }
                }
            },
            "fields": { "name": { "id": "http://schema.org/name" } },
            "queryFields": {
                "people": { "services": ["people"], "targetName": "Person" },
                "person": { "services": ["people"], "targetName": "Person", "kind": "getById" }
            },
            "mutationService": "people",
            "mutationFields": { "insert_Person": { "targetName": "Person", "action": "insert" } }
        }
    }"#;

    const QUERY: &str = r#"[{ "name": "people", "selections": [{ "name": "name" }] }]"#;

    fn cli_command() -> Result<Command> {
        Ok(Command::cargo_bin("fedql")?)
    }

    fn federation() -> Result<TempDir> {
        let dir = TempDir::new()?;
        dir.child("federation.json").write_str(CONFIG)?;
        dir.child("people.ttl").write_str(
            "<http://example.com/alice> a <http://schema.org/Person> ; <http://schema.org/name> \"Alice\" .\n",
        )?;
        Ok(dir)
    }

    #[test]
    fn cli_help() -> Result<()> {
        cli_command()?
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("Usage"));
        Ok(())
    }

    #[test]
    fn cli_query() -> Result<()> {
        let dir = federation()?;
        let output = cli_command()?
            .arg("--config")
            .arg(dir.child("federation.json").path())
            .arg("query")
            .write_stdin(QUERY)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let response: serde_json::Value = serde_json::from_slice(&output)?;
        assert_eq!(
            response["data"],
            serde_json::json!({ "people": [{ "name": "Alice" }] })
        );
        assert_eq!(response["@context"]["name"], "http://schema.org/name");
        Ok(())
    }

    #[test]
    fn cli_query_from_file() -> Result<()> {
        let dir = federation()?;
        let query = dir.child("query.json");
        query.write_str(QUERY)?;
        cli_command()?
            .arg("--config")
            .arg(dir.child("federation.json").path())
            .arg("query")
            .arg("--query-file")
            .arg(query.path())
            .arg("--pretty")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"Alice\""));
        Ok(())
    }

    #[test]
    fn cli_plan() -> Result<()> {
        let dir = federation()?;
        cli_command()?
            .arg("--config")
            .arg(dir.child("federation.json").path())
            .arg("plan")
            .write_stdin(QUERY)
            .assert()
            .success()
            .stdout(predicate::str::contains("people"));
        Ok(())
    }

    #[test]
    fn cli_update() -> Result<()> {
        let dir = federation()?;
        cli_command()?
            .arg("--config")
            .arg(dir.child("federation.json").path())
            .arg("update")
            .arg("--service")
            .arg("people")
            .arg("--update")
            .arg("INSERT DATA { <http://example.com/bob> a <http://schema.org/Person> ; <http://schema.org/name> \"Bob\" }")
            .assert()
            .success();
        cli_command()?
            .arg("--config")
            .arg(dir.child("federation.json").path())
            .arg("query")
            .write_stdin(QUERY)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"Bob\""));
        Ok(())
    }

    #[test]
    fn cli_mutate() -> Result<()> {
        let dir = federation()?;
        cli_command()?
            .arg("--config")
            .arg(dir.child("federation.json").path())
            .arg("mutate")
            .write_stdin(
                r#"[{
                    "name": "insert_Person",
                    "args": { "_id": "http://example.com/carol", "name": "Carol" },
                    "selections": [{ "name": "_id" }, { "name": "name" }]
                }]"#,
            )
            .assert()
            .success()
            .stdout(predicate::str::contains("\"Carol\""));
        dir.child("people.ttl")
            .assert(predicate::str::contains("http://example.com/carol"));
        Ok(())
    }

    #[test]
    fn cli_invalid_query() -> Result<()> {
        let dir = federation()?;
        cli_command()?
            .arg("--config")
            .arg(dir.child("federation.json").path())
            .arg("query")
            .write_stdin("{")
            .assert()
            .failure()
            .stderr(predicate::str::contains("JSON array"));
        Ok(())
    }

    #[test]
    fn cli_missing_config() -> Result<()> {
        cli_command()?
            .arg("--config")
            .arg("/nonexistent/federation.json")
            .arg("plan")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to load"));
        Ok(())
    }

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }
}
