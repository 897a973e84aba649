use clap::{Arg, Command};
use csv_query::config::parse_charset;
use csv_query::ServiceConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let matches = Command::new("serve")
        .about("Serve CSV upload, listing, header and query endpoints")
        .arg(Arg::new("bind").long("bind").value_parser(clap::value_parser!(SocketAddr)))
        .arg(Arg::new("upload-dir").long("upload-dir").value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("max-limit").long("max-limit").help("Largest page size a client may request").value_parser(clap::value_parser!(u64)))
        .arg(Arg::new("read-timeout-secs").long("read-timeout-secs").value_parser(clap::value_parser!(u64)))
        .arg(Arg::new("charset").long("charset").help("Charset of stored files (any WHATWG label)"))
        .get_matches();

    // flags win over CSV_QUERY_* variables
    let mut config = ServiceConfig::from_env()?;
    if let Some(bind) = matches.get_one::<SocketAddr>("bind") {
        config.bind = *bind;
    }
    if let Some(dir) = matches.get_one::<PathBuf>("upload-dir") {
        config.upload_dir = dir.clone();
    }
    if let Some(max) = matches.get_one::<u64>("max-limit") {
        config.max_limit = *max;
    }
    if let Some(secs) = matches.get_one::<u64>("read-timeout-secs") {
        config.read_timeout = Duration::from_secs(*secs);
    }
    if let Some(label) = matches.get_one::<String>("charset") {
        config.charset = parse_charset(label)?;
    }

    csv_query::server::serve(config).await
}
