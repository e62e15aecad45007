//! `eduhub setup` - create collections, schemas and indexes in the configured
//! store.

use serde_json::json;
use tracing::instrument;

use eduhub_core::application::{CatalogService, CourseService, ports::DocumentStore};

use crate::{cli::SetupArgs, config::AppConfig, error::CliResult, output::OutputManager};

#[instrument(skip_all, fields(reset = args.reset))]
pub fn execute(args: SetupArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let store = super::open_store(&config)?;
    let catalog = CatalogService::new(Box::new(store.clone()));
    let courses = CourseService::with_collection(
        Box::new(store.clone()),
        config.store.courses_collection.clone(),
    );

    if args.reset {
        let dropped = catalog.drop_collections()?;
        if store.drop_collection(courses.collection())? {
            output.warning(&format!("Dropped '{}'", courses.collection()))?;
        }
        output.warning(&format!("Dropped {dropped} collection(s)"))?;
    }

    catalog.create_collections()?;
    store.create_collection(courses.collection())?;
    let schemas = catalog.apply_schemas()?;

    // The unique email index cannot be built over duplicates.
    let duplicates = catalog.remove_duplicate_emails()?;
    for dup in &duplicates {
        output.warning(&format!(
            "Removed {} duplicate user(s) with email '{}'",
            dup.removed, dup.email
        ))?;
    }

    let mut indexes = catalog.create_indexes()?;
    indexes.push((courses.collection().to_string(), courses.ensure_indexes()?));

    if output.is_json() {
        let indexes: Vec<_> = indexes
            .iter()
            .map(|(collection, name)| json!({ "collection": collection, "index": name }))
            .collect();
        output.json(&json!({
            "store": store.path().display().to_string(),
            "collections": store.list_collections()?,
            "schemas": schemas,
            "duplicatesRemoved": duplicates,
            "indexes": indexes,
        }))?;
        return Ok(());
    }

    output.success(&format!("Store ready at {}", store.path().display()))?;
    output.header("Collections:")?;
    for name in store.list_collections()? {
        output.print(&format!("  {name}"))?;
    }
    output.header("Schemas:")?;
    for name in &schemas {
        output.print(&format!("  {name}"))?;
    }
    output.header("Indexes:")?;
    for (collection, name) in &indexes {
        output.print(&format!("  {collection}.{name}"))?;
    }
    Ok(())
}
