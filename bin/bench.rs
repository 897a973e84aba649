use clap::{Arg, Command};
use csv_query::config::parse_charset;
use csv_query::{run_query, total_pages, Filter, ReadMode, RowStream};
use std::path::PathBuf;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("bench")
        .about("Time one filter + page query over a local CSV file")
        .arg(Arg::new("path").long("path").value_parser(clap::value_parser!(PathBuf)).required(true))
        .arg(Arg::new("field").long("field").help("Column to search (empty = no filter)").default_value(""))
        .arg(Arg::new("value").long("value").help("Substring to look for").default_value(""))
        .arg(Arg::new("page").long("page").value_parser(clap::value_parser!(u64)).default_value("1"))
        .arg(Arg::new("limit").long("limit").value_parser(clap::value_parser!(u64)).default_value("10"))
        .arg(Arg::new("charset").long("charset").default_value("utf-8"))
        .get_matches();

    let path = matches
        .get_one::<PathBuf>("path")
        .ok_or_else(|| anyhow::anyhow!("Provide --path <file>"))?;
    let filter = Filter::page(
        matches.get_one::<u64>("page").copied().unwrap_or(1),
        matches.get_one::<u64>("limit").copied().unwrap_or(10),
    )
    .with_search(
        matches.get_one::<String>("field").cloned().unwrap_or_default(),
        matches.get_one::<String>("value").cloned().unwrap_or_default(),
    );
    let charset = parse_charset(matches.get_one::<String>("charset").map(String::as_str).unwrap_or("utf-8"))?;

    let start = Instant::now();
    let mut rows = RowStream::open(path, charset, ReadMode::Full).await?;
    let result = run_query(&mut rows, &filter).await?;
    let elapsed = start.elapsed().as_secs_f64();
    let rps = (rows.rows_read() as f64) / elapsed.max(f64::EPSILON);

    println!(
        "source={} scanned={} matched={} returned={} pages={}\nelapsed={:.3}s rows/sec={:.0}",
        path.display(),
        rows.rows_read(),
        result.matched,
        result.data.len(),
        total_pages(result.matched, filter.limit),
        elapsed,
        rps
    );
    Ok(())
}
