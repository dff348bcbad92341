use crate::cascade::{CascadeConfig, detect_cascades};
use crate::flight::FlightId;
use crate::optimize::batch::{BatchOptimizer, DEFAULT_COST_PER_MIN, OptimizationSummary};
use crate::optimize::single::{OptimizationResult, Optimizer, SearchWindow};
use crate::predict::{HourlyMeanModel, Predictor};
use crate::report::{BatchDetailRow, format_minutes, format_money};
use crate::store::FlightStore;
use clap::Parser;
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::{Context, Editor, Helper, Highlighter, Hinter, Validator};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tabled::settings::Style;

mod cascade;
mod error;
mod flight;
mod optimize;
mod predict;
mod report;
mod store;

#[derive(Parser)]
struct Args {
    /// Path to the weekly flight CSV
    #[arg(short, long, value_name = "FILE", default_value = "data/bom_week_flights.csv")]
    data: PathBuf,

    /// Directory for persisted summary artifacts
    #[arg(short, long, value_name = "DIR", default_value = "outputs")]
    output: PathBuf,
}

#[derive(Helper, Hinter, Highlighter, Validator)]
pub struct CompleteHelper {
    pub commands: Vec<String>,
}

impl Completer for CompleteHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, _pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let mut candidates = Vec::new();

        for cmd in &self.commands {
            if cmd.starts_with(line) {
                candidates.push(Pair {
                    display: cmd.clone(),
                    replacement: format!("{} ", cmd),
                });
            }
        }

        Ok((0, candidates))
    }
}

fn paginate(content: String) {
    let mut pager = Command::new("less")
        .arg("-R")
        .stdin(Stdio::piped())
        .spawn()
        // Fallback to 'more' if 'less' isn't available
        .or_else(|_| Command::new("more").stdin(Stdio::piped()).spawn())
        .expect("Failed to spawn pager");

    let mut stdin = pager.stdin.take().expect("Failed to open stdin for pager");

    if let Err(e) = stdin.write_all(content.as_bytes()) {
        // Broken pipe is common if the user quits the pager early
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            eprintln!("Error writing to pager: {}", e);
        }
    }

    // Wait for the user to close the pager before returning to the ">> " prompt
    let _ = pager.wait();
}

fn print_table<T: tabled::Tabled>(rows: &[T]) {
    if rows.is_empty() {
        println!("Nothing to show.");
        return;
    }
    let mut table = tabled::Table::new(rows);
    table.with(Style::rounded());
    table.with(tabled::settings::Alignment::left());
    if rows.len() > 20 {
        paginate(table.to_string());
    } else {
        println!("{}", table);
    }
}

fn print_optimization(result: &OptimizationResult) {
    println!("Flight {} scheduled {}", result.flight, result.original_time);
    match result.recommended_time {
        Some(time) => {
            println!(
                "  recommended slot: {} ({} -> {}, saves {})",
                time.to_string().green(),
                format_minutes(result.original_delay),
                format_minutes(result.best_delay),
                format_minutes(result.improvement()).green(),
            );
        }
        None => println!(
            "  already optimal, predicted delay {}",
            format_minutes(result.original_delay)
        ),
    }
}

fn print_summary(summary: &OptimizationSummary) {
    println!("\n{}", "System-wide optimization summary".bold());
    println!("  Flights Optimized     {}", summary.flights_optimized);
    println!("  Total Delay BEFORE    {}", format_minutes(summary.total_delay_before));
    println!("  Total Delay AFTER     {}", format_minutes(summary.total_delay_after));
    println!(
        "  Total Minutes Saved   {}",
        format_minutes(summary.total_minutes_saved).green()
    );
    println!("  Mean Improvement      {:.2}%", summary.mean_improvement_pct);
    println!("  Estimated Cost BEFORE {}", format_money(summary.cost_before));
    println!("  Estimated Cost AFTER  {}", format_money(summary.cost_after));
    println!(
        "  Estimated Savings     {}\n",
        format_money(summary.cost_saved).green().bold()
    );
}

fn sample_ids(store: &FlightStore, n: usize, seed: Option<u64>) -> Vec<FlightId> {
    let ids = store.flight_ids();
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_rng(&mut rand::rng()),
    };
    ids.choose_multiple(&mut rng, n).cloned().collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let args = Args::parse();
    // A missing or malformed source is fatal; nothing runs on a partial dataset.
    let store = Arc::new(FlightStore::load_from_csv(&args.data)?);
    println!(
        "Analytics online. Loaded {} flights from {}",
        store.len(),
        args.data.display()
    );

    let model = Arc::new(HourlyMeanModel::fit(store.records()));
    let predictor = Arc::new(Predictor::new(store.clone(), model));
    let optimizer = Optimizer::new(predictor.clone(), SearchWindow::default());
    let batch_optimizer = BatchOptimizer::new(
        Optimizer::new(predictor.clone(), SearchWindow::default()),
        DEFAULT_COST_PER_MIN,
    );

    let config = rustyline::Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();

    let helper = CompleteHelper {
        commands: vec![
            "ls".to_string(),
            "cascades".to_string(),
            "hours".to_string(),
            "predict".to_string(),
            "optimize".to_string(),
            "batch".to_string(),
            "report".to_string(),
            "help".to_string(),
            "exit".to_string(),
        ],
    };

    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));

    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() { continue; }

                rl.add_history_entry(trimmed)?;

                let parts: Vec<&str> = trimmed.split_whitespace().collect();
                match parts[0] {
                    "ls" => {
                        let n = parts
                            .get(1)
                            .and_then(|s| s.parse::<usize>().ok())
                            .unwrap_or(store.len());
                        print_table(&store.records()[..n.min(store.len())]);
                    },
                    "cascades" => {
                        let mut config = CascadeConfig::default();
                        if let Some(threshold) = parts.get(1).and_then(|s| s.parse::<f64>().ok()) {
                            config.threshold_min = threshold;
                        }
                        let events = detect_cascades(store.records(), &config);
                        if events.is_empty() {
                            println!("No cascading flights above {} minutes.", config.threshold_min);
                        } else {
                            println!("{}", "Top knock-on delay offenders".bold());
                            print_table(&events);
                        }
                    },
                    "hours" => {
                        let n = parts
                            .get(2)
                            .and_then(|s| s.parse::<usize>().ok())
                            .unwrap_or(5);
                        match parts.get(1).copied() {
                            Some("busiest") => print_table(&store.busiest_hours(n)),
                            Some("best") => print_table(&store.best_hours(n)),
                            Some("avg") => print_table(&store.hourly_stats()),
                            _ => println!("Usage: hours <busiest|best|avg> [n]"),
                        }
                    },
                    "predict" => {
                        if let (Some(id), Some(hour)) = (
                            parts.get(1),
                            parts.get(2).and_then(|s| s.parse::<u32>().ok()),
                        ) {
                            match predictor.predict_for_hour(&Arc::from(*id), hour) {
                                Ok(delay) => println!(
                                    "Flight {} at {:02}:00 -> predicted delay {}",
                                    id,
                                    hour,
                                    format_minutes(delay)
                                ),
                                Err(e) => println!("{}", e.to_string().red()),
                            }
                        } else {
                            println!("Usage: predict <flight_id> <hour 0-23>");
                        }
                    },
                    "optimize" => {
                        if let Some(id) = parts.get(1) {
                            match optimizer.optimize(&Arc::from(*id)) {
                                Ok(result) => print_optimization(&result),
                                Err(e) => println!("{}", e.to_string().red()),
                            }
                        } else {
                            println!("Usage: optimize <flight_id>");
                        }
                    },
                    "batch" => {
                        let n = parts
                            .get(1)
                            .and_then(|s| s.parse::<usize>().ok())
                            .unwrap_or(25);
                        let seed = parts.get(2).and_then(|s| s.parse::<u64>().ok());
                        let sample = sample_ids(&store, n, seed);
                        let outcome = batch_optimizer.run(&sample);
                        let details: Vec<BatchDetailRow> =
                            outcome.results.iter().map(BatchDetailRow::from).collect();
                        print_table(&details);
                        print_summary(&outcome.summary);
                        report::write_artifacts(&args.output, &outcome)?;
                        println!("Artifacts written to {}", args.output.display());
                    },
                    "report" => {
                        match report::read_summary(&args.output)? {
                            Some(labels) => {
                                println!("{}", "Last persisted summary".bold());
                                for (label, value) in &labels {
                                    println!("  {:<22} {}", label, value);
                                }
                                if let Some(rows) = report::read_details(&args.output)? {
                                    print_table(&rows);
                                }
                            }
                            None => println!("No persisted summary found. Run 'batch' first."),
                        }
                    },
                    "help" | "?" => {
                        println!("\nAvailable Commands:");
                        println!("  ls [n]                       - List flight records (first n)");
                        println!("  cascades [threshold]         - Rank knock-on delay offenders (> threshold mins, default 30)");
                        println!("  hours <busiest|best|avg> [n] - Hourly traffic and delay views");
                        println!("  predict <id> <hour>          - Predicted delay if flight <id> departed at <hour>");
                        println!("  optimize <id>                - Search nearby slots for a cheaper departure");
                        println!("  batch [n] [seed]             - Optimize a sample of n flights and persist the summary");
                        println!("  report                       - Show the last persisted summary without recomputation");
                        println!("  help / ?                     - Show this help menu");
                        println!("  exit / quit                  - Exit\n");
                    },
                    "exit" | "quit" => break,
                    _ => println!("Unknown command: {}", parts[0]),
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            },
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            },
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}
