use bulkfhir_client::NdjsonLoader;
use colored::Colorize;

use crate::cli::TypesArgs;

pub async fn run(args: &TypesArgs) -> anyhow::Result<()> {
    let store = NdjsonLoader::new(&args.file).load().await?;

    if store.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    for resource_type in store.types() {
        let count = store.records(&resource_type).map_or(0, <[_]>::len);
        println!("{} {count}", resource_type.cyan().bold());
    }

    Ok(())
}
