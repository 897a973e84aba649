use async_compression::tokio::write::{GzipEncoder, ZstdEncoder};
use csv_query::{
    read_headers, run_query, total_pages, ErrorKind, FileRegistry, Filter, QueryResponse,
    ReadMode,
};
use std::path::Path;
use tokio::io::AsyncWriteExt;

fn fifty_rows() -> String {
    let body: Vec<String> = (0..50).map(|i| format!("value1_{i},value2_{i}")).collect();
    format!("header1,header2\n{}", body.join("\n"))
}

async fn query(registry: &FileRegistry, id: &str, filter: &Filter) -> anyhow::Result<QueryResponse> {
    let mut rows = registry.open(id, ReadMode::Full).await?;
    let result = run_query(&mut rows, filter).await?;
    Ok(QueryResponse::new(result, filter))
}

fn registry_with(dir: &Path, files: &[(&str, &str)]) -> anyhow::Result<FileRegistry> {
    for (name, text) in files {
        std::fs::write(dir.join(name), text)?;
    }
    Ok(FileRegistry::new(dir))
}

#[tokio::test]
async fn single_row_file_is_one_page() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = registry_with(dir.path(), &[("test.csv", "header1,header2\nvalue1,value2")])?;

    let resp = query(&registry, "test.csv", &Filter::page(1, 10)).await?;
    assert_eq!(resp.row_count, 1);
    assert_eq!(resp.total_pages, 1);
    assert_eq!(
        serde_json::to_value(&resp.data)?,
        serde_json::json!([{ "header1": "value1", "header2": "value2" }])
    );
    Ok(())
}

#[tokio::test]
async fn second_page_of_fifty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let text = fifty_rows();
    let registry = registry_with(dir.path(), &[("test.csv", &text)])?;

    let resp = query(&registry, "test.csv", &Filter::page(2, 10)).await?;
    assert_eq!(resp.data.len(), 10);
    assert_eq!(resp.current_page, 2);
    assert_eq!(resp.row_count, 50);
    assert_eq!(resp.total_pages, 5);
    assert_eq!(resp.data[0].get("header1"), Some("value1_10"));
    assert_eq!(resp.data[9].get("header1"), Some("value1_19"));
    Ok(())
}

#[tokio::test]
async fn exact_value_filter_finds_one_row() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let text = fifty_rows();
    let registry = registry_with(dir.path(), &[("test.csv", &text)])?;

    let filter = Filter::default().with_search("header1", "value1_39");
    let resp = query(&registry, "test", &filter).await?;
    assert_eq!(resp.data.len(), 1);
    assert_eq!(resp.total_pages, 1);
    assert_eq!(resp.data[0].get("header1"), Some("value1_39"));
    Ok(())
}

#[tokio::test]
async fn missing_file_is_not_found() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = FileRegistry::new(dir.path());

    let err = registry
        .open("non_existent.csv", ReadMode::Full)
        .await
        .err()
        .expect("no such file");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = read_headers(&registry, "non_existent.csv").await.err().expect("no such file");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}

#[tokio::test]
async fn headers_of_small_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = registry_with(dir.path(), &[("test.csv", "header1,header2\nvalue1,value2")])?;
    assert_eq!(read_headers(&registry, "test.csv").await?, ["header1", "header2"]);
    Ok(())
}

#[tokio::test]
async fn unfiltered_count_is_every_row_for_any_page_size() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let text = fifty_rows();
    let registry = registry_with(dir.path(), &[("test.csv", &text)])?;

    for limit in [1, 3, 7, 10, 49, 50, 51, 1000] {
        for page in [1, 2, 8] {
            let resp = query(&registry, "test.csv", &Filter::page(page, limit)).await?;
            assert_eq!(resp.row_count, 50);
            assert_eq!(resp.total_pages, total_pages(50, limit));
            assert!(resp.data.len() as u64 <= limit);

            let first_rank = (page - 1) * limit;
            for (offset, rec) in resp.data.iter().enumerate() {
                let want = format!("value1_{}", first_rank + offset as u64);
                assert_eq!(rec.get("header1"), Some(want.as_str()));
            }
        }
    }
    Ok(())
}

#[tokio::test]
async fn unknown_search_field_matches_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let text = fifty_rows();
    let registry = registry_with(dir.path(), &[("test.csv", &text)])?;

    let resp = query(&registry, "test.csv", &Filter::default().with_search("header9", "value")).await?;
    assert_eq!(resp.row_count, 0);
    assert_eq!(resp.total_pages, 0);
    assert!(resp.data.is_empty());
    Ok(())
}

#[tokio::test]
async fn gzip_entries_are_read_transparently() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let gz_path = dir.path().join("big.csv.gz");

    let file = tokio::fs::File::create(&gz_path).await?;
    let mut gz = GzipEncoder::new(file);
    gz.write_all(b"sku,col1\n").await?;
    for i in 0..100_000 {
        gz.write_all(format!("SKU{i:06},{i}\n").as_bytes()).await?;
    }
    gz.shutdown().await?;

    let registry = FileRegistry::new(dir.path());
    assert_eq!(read_headers(&registry, "big.csv.gz").await?, ["sku", "col1"]);

    let filter = Filter::page(2, 3).with_search("sku", "SKU0999");
    let resp = query(&registry, "big.csv.gz", &filter).await?;
    // SKU099900..SKU099999
    assert_eq!(resp.row_count, 100);
    assert_eq!(resp.total_pages, 34);
    assert_eq!(resp.data[0].get("sku"), Some("SKU099903"));
    Ok(())
}

#[tokio::test]
async fn zstd_entries_are_read_transparently() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let zst_path = dir.path().join("big.csv.zst");

    let file = tokio::fs::File::create(&zst_path).await?;
    let mut zst = ZstdEncoder::new(file);
    zst.write_all(b"sku,col1\n").await?;
    for i in 0..20_000 {
        zst.write_all(format!("SKU{i:06},{i}\n").as_bytes()).await?;
    }
    zst.shutdown().await?;

    let registry = FileRegistry::new(dir.path());
    assert_eq!(read_headers(&registry, "big.csv.zst").await?, ["sku", "col1"]);

    let resp = query(&registry, "big.csv.zst", &Filter::page(3, 1000)).await?;
    assert_eq!(resp.row_count, 20_000);
    assert_eq!(resp.total_pages, 20);
    assert_eq!(resp.data.len(), 1000);
    assert_eq!(resp.data[0].get("sku"), Some("SKU002000"));
    assert_eq!(resp.data[999].get("col1"), Some("2999"));
    Ok(())
}

#[tokio::test]
async fn uploaded_file_is_queryable_under_its_new_name() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let registry = FileRegistry::new(dir.path());

    let name = registry
        .register("test.csv", "text/csv; charset=utf-8", fifty_rows().as_bytes())
        .await?;
    assert_ne!(name, "test.csv");
    assert!(registry.list().await?.contains(&name));

    let resp = query(&registry, &name, &Filter::page(5, 10)).await?;
    assert_eq!(resp.data.len(), 10);
    assert_eq!(resp.data[9].get("header2"), Some("value2_49"));
    Ok(())
}
