use clap::{Arg, Command};
use std::io::{self, Write};

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .about("Write a deterministic CSV fixture to stdout")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("cols")
                .long("cols")
                .value_parser(clap::value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new("no_trailing_newline")
                .long("no-trailing-newline")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let rows = matches.get_one::<u64>("rows").copied().unwrap_or(0);
    let cols = matches.get_one::<usize>("cols").copied().unwrap_or(2).max(1);
    let trailing = !matches.get_flag("no_trailing_newline");

    let mut out = io::BufWriter::new(io::stdout().lock());

    // header1,header2,...
    let header: Vec<String> = (1..=cols).map(|c| format!("header{c}")).collect();
    write!(&mut out, "{}", header.join(","))?;

    // value1_0,value2_0 / value1_1,value2_1 / ...
    for i in 0..rows {
        writeln!(&mut out)?;
        for c in 1..=cols {
            if c > 1 {
                write!(&mut out, ",")?;
            }
            write!(&mut out, "value{c}_{i}")?;
        }
        if i % 10_000 == 0 {
            out.flush()?;
        }
    }
    if trailing {
        writeln!(&mut out)?;
    }

    out.flush()?;
    Ok(())
}
