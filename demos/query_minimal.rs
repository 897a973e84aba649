use csv_query::{read_headers, run_query, FileRegistry, Filter, ReadMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = FileRegistry::new("./uploads");
    registry.ensure_root().await?;

    let name = registry
        .register("sample.csv", "text/csv", &b"city,country\nLyon,FR\nLima,PE\nLeeds,GB\n"[..])
        .await?;
    println!("stored as {name}");
    println!("headers: {:?}", read_headers(&registry, &name).await?);

    let filter = Filter::page(1, 2).with_search("city", "L");
    let mut rows = registry.open(&name, ReadMode::Full).await?;
    let result = run_query(&mut rows, &filter).await?;
    println!("{} matches, first page: {}", result.matched, serde_json::to_string(&result.data)?);
    Ok(())
}
