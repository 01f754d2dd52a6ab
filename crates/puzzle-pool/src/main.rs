use std::io::{BufRead, Write};
use std::process;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use puzzle_pool::{Board, Difficulty, Pool, PoolConfig, Priority, TaskRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Solve,
    Validate,
    Generate,
}

#[derive(Debug)]
struct Cli {
    command: Command,
    boards: Vec<String>,
    difficulty: Difficulty,
    count: usize,
    priority: Priority,
    workers: Option<usize>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}");
                eprintln!();
            }
            print_usage();
            process::exit(2);
        }
    };

    init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Usage: puzzle-pool <solve|validate> [options] [<board>...]");
    eprintln!("       puzzle-pool generate [options]");
    eprintln!();
    eprintln!("Boards are 81 characters, digits 1-9 with 0 or . for empty cells.");
    eprintln!("With no <board> arguments, boards are read from stdin, one per line.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --difficulty <d>  easy, medium, hard or extreme [default: medium]");
    eprintln!("  --count <n>       Puzzles to generate [default: 1]");
    eprintln!("  --low             Submit at low priority");
    eprintln!("  --workers <n>     Concurrency hint [default: $PUZZLE_POOL_CONCURRENCY or CPU count]");
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut command: Option<Command> = None;
    let mut boards = Vec::new();
    let mut difficulty = Difficulty::default();
    let mut count = 1;
    let mut priority = Priority::High;
    let mut workers = None;

    let mut i = 1; // skip argv[0]
    while i < args.len() {
        match args[i].as_str() {
            "--difficulty" => {
                i += 1;
                difficulty = args
                    .get(i)
                    .ok_or("--difficulty requires a value")?
                    .parse()?;
            }
            "--count" => {
                i += 1;
                let value = args.get(i).ok_or("--count requires a value")?;
                count = value
                    .parse()
                    .map_err(|_| format!("invalid count '{value}'"))?;
            }
            "--workers" => {
                i += 1;
                let value = args.get(i).ok_or("--workers requires a value")?;
                workers = Some(
                    value
                        .parse()
                        .map_err(|_| format!("invalid worker count '{value}'"))?,
                );
            }
            "--low" => priority = Priority::Low,
            "--help" | "-h" => return Err(String::new()),
            arg if arg.starts_with('-') => return Err(format!("unknown flag: {arg}")),
            arg if command.is_none() => {
                command = Some(match arg {
                    "solve" => Command::Solve,
                    "validate" => Command::Validate,
                    "generate" => Command::Generate,
                    other => return Err(format!("unknown command '{other}'")),
                });
            }
            arg => boards.push(arg.to_string()),
        }
        i += 1;
    }

    let command = command.ok_or("missing command")?;
    if command == Command::Generate && !boards.is_empty() {
        return Err("generate takes no boards".to_string());
    }
    Ok(Cli {
        command,
        boards,
        difficulty,
        count,
        priority,
        workers,
    })
}

/// `RUST_LOG` wins; otherwise `PUZZLE_POOL_LOG` picks the level for our crates.
/// `LOG_FORMAT=json` switches to JSON lines. Logs go to stderr.
fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match std::env::var("PUZZLE_POOL_LOG").as_deref() {
            Ok("trace") => "trace",
            Ok("debug") => "debug",
            Ok("info") => "info",
            Ok("error") => "error",
            _ => "warn",
        };
        EnvFilter::new(format!("puzzle_pool={level},sudoku_engine={level}"))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init();
    }
}

fn requests(cli: &Cli) -> anyhow::Result<Vec<TaskRequest>> {
    if cli.command == Command::Generate {
        return Ok((0..cli.count)
            .map(|_| TaskRequest::Generate {
                difficulty: cli.difficulty,
            })
            .collect());
    }

    let lines = if cli.boards.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read boards from stdin")?
    } else {
        cli.boards.clone()
    };

    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| -> anyhow::Result<TaskRequest> {
            let board: Board = line
                .parse()
                .with_context(|| format!("invalid board '{}'", line.trim()))?;
            Ok(match cli.command {
                Command::Validate => TaskRequest::Validate { board },
                _ => TaskRequest::Solve { board },
            })
        })
        .collect()
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let requests = requests(&cli)?;

    let config = match cli.workers {
        Some(hint) => PoolConfig::new().with_concurrency_hint(Some(hint)),
        None => PoolConfig::from_env(),
    };
    let pool = Pool::new(config).context("failed to start pool")?;
    info!(size = pool.size(), tasks = requests.len(), "puzzle-pool {}", env!("CARGO_PKG_VERSION"));

    let handles = requests
        .into_iter()
        .map(|request| pool.submit(request, cli.priority))
        .collect::<Result<Vec<_>, _>>()?;

    // Results print in submission order; each line is one JSON document.
    let results = futures::future::join_all(handles).await;
    pool.terminate();

    let mut stdout = std::io::stdout().lock();
    let mut failures = 0;
    for result in results {
        match result {
            Ok(output) => writeln!(stdout, "{}", serde_json::to_string(&output)?)?,
            Err(e) => {
                failures += 1;
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} task(s) failed");
    }
    Ok(())
}
