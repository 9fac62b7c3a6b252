use std::env;
use std::process;

use querychunk::QueryParser;

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} [options] QUERY...

Parses a media search query into slots and prints them as JSON.

Options:
  -h, --help            Print this message
  -n, --networks LIST   Comma-separated network names (e.g. espn,cnn)",
    prog_name
  )
}

struct Args {
  query: String,
  networks: Vec<String>,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    if v.is_empty() {
      return Err(Self::make_error_message("bad argument vector", "querychunk"));
    }

    let mut iter = v.into_iter();
    let prog_name = iter.next().unwrap();

    let mut words: Vec<String> = Vec::new();
    let mut networks: Vec<String> = Vec::new();

    while let Some(o) = iter.next() {
      match o.as_str() {
        "-h" | "--help" => {
          println!("{}", usage(&prog_name));
          process::exit(0);
        }
        "-n" | "--networks" => {
          let list = iter
            .next()
            .ok_or_else(|| Self::make_error_message("--networks needs a value", &prog_name))?;
          networks.extend(list.split(',').map(|n| n.trim().to_string()));
        }
        _ => words.push(o),
      }
    }

    if words.is_empty() {
      return Err(Self::make_error_message("no query given", prog_name));
    }

    Ok(Self {
      query: words.join(" "),
      networks,
    })
  }
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let args = match Args::parse(env::args().collect()) {
    Ok(args) => args,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(1);
    }
  };

  let parser = QueryParser::builtin();
  match parser.parse(&args.query, &args.networks) {
    Ok(mapping) => match serde_json::to_string_pretty(&mapping) {
      Ok(json) => println!("{}", json),
      Err(e) => {
        eprintln!("serialization error: {}", e);
        process::exit(1);
      }
    },
    Err(e) => {
      eprintln!("parse error: {}", e);
      process::exit(1);
    }
  }
}
