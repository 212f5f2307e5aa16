//! chansim command line interface.

use chansim_core::{
    compare_algorithms, format_comparison_table, format_table, load_dataset, run_simulation,
    CostModel, Request, SimConfig,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(
    name = "chansim",
    about = "Simulate memory-channel scheduling for batched LLM inference",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation and print its metrics
    Run {
        /// Path to the TOML config file
        #[arg(short, long)]
        config: PathBuf,
        /// Dataset TSV, overriding the config's [dataset] path
        #[arg(short, long)]
        dataset: Option<PathBuf>,
        /// Algorithm, overriding the config's choice
        #[arg(short, long)]
        algorithm: Option<String>,
        /// Directory to write snapshot CSVs into
        #[arg(short, long)]
        export_dir: Option<PathBuf>,
        /// Write the metrics as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run every algorithm on the same request stream and compare
    Compare {
        /// Path to the TOML config file
        #[arg(short, long)]
        config: PathBuf,
        /// Dataset TSV, overriding the config's [dataset] path
        #[arg(short, long)]
        dataset: Option<PathBuf>,
        /// Algorithms to compare (default: all)
        #[arg(short = 'A', long, value_delimiter = ',')]
        algorithms: Vec<String>,
        /// Write the metrics as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run one algorithm across several batch sizes
    Sweep {
        /// Path to the TOML config file
        #[arg(short, long)]
        config: PathBuf,
        /// Dataset TSV, overriding the config's [dataset] path
        #[arg(short, long)]
        dataset: Option<PathBuf>,
        /// Batch sizes to sweep (default: the config's batch size)
        #[arg(short, long, value_delimiter = ',')]
        batch_sizes: Vec<u32>,
        /// Write the metrics as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the available assignment algorithms
    ListAlgorithms,
}

fn load_config(path: &Path) -> SimConfig {
    match SimConfig::from_file(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn load_candidates(config: &SimConfig, dataset_override: Option<&Path>) -> Vec<Request> {
    let path = match dataset_override {
        Some(p) => p.to_path_buf(),
        None => match &config.dataset.path {
            Some(p) => PathBuf::from(p),
            None => {
                eprintln!("Error: no dataset given ([dataset] path in config, or --dataset)");
                process::exit(1);
            }
        },
    };
    match load_dataset(&path) {
        Ok((candidates, stats)) => {
            println!(
                "imported dataset {}: {} rows ({} excluded for zero output tokens)",
                config.dataset.name, stats.rows_kept, stats.rows_excluded,
            );
            println!(
                "average input tokens {:.1} / average output tokens {:.1}",
                stats.mean_input_tokens, stats.mean_output_tokens,
            );
            candidates
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap();
    if let Err(e) = std::fs::write(path, json) {
        eprintln!("Error: failed to write {}: {}", path.display(), e);
        process::exit(1);
    }
    println!("metrics written to {}", path.display());
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            dataset,
            algorithm,
            export_dir,
            output,
        } => {
            let mut config = load_config(&config);
            if let Some(algorithm) = algorithm {
                config.simulation.algorithm = algorithm;
            }
            let candidates = load_candidates(&config, dataset.as_deref());

            match CostModel::new(&config.model, &config.memory) {
                Ok(cost) => {
                    println!("available tiles per channel: {}", cost.tiles_per_channel())
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
            if let Some(dir) = &export_dir {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    eprintln!("Error: failed to create {}: {}", dir.display(), e);
                    process::exit(1);
                }
            }

            match run_simulation(config, candidates, export_dir.as_deref()) {
                Ok(metrics) => {
                    print!("{}", format_table(&metrics));
                    if let Some(path) = output {
                        write_json(&path, &metrics);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }

        Commands::Compare {
            config,
            dataset,
            algorithms,
            output,
        } => {
            let config = load_config(&config);
            let candidates = load_candidates(&config, dataset.as_deref());
            let names: Vec<&str> = if algorithms.is_empty() {
                chansim_algorithms::available_algorithms()
            } else {
                algorithms.iter().map(String::as_str).collect()
            };

            match compare_algorithms(&config, &candidates, &names) {
                Ok(results) => {
                    print!("{}", format_comparison_table(&results));
                    if let Some(path) = output {
                        write_json(&path, &results);
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            }
        }

        Commands::Sweep {
            config,
            dataset,
            batch_sizes,
            output,
        } => {
            let config = load_config(&config);
            let candidates = load_candidates(&config, dataset.as_deref());
            let sizes = if batch_sizes.is_empty() {
                vec![config.simulation.batch_size]
            } else {
                batch_sizes
            };

            let mut results = Vec::new();
            for &batch_size in &sizes {
                let mut run_config = config.clone();
                run_config.simulation.batch_size = batch_size;
                match run_simulation(run_config, candidates.clone(), None) {
                    Ok(metrics) => results.push(metrics),
                    Err(e) => eprintln!("batch size {}: simulation failed: {}", batch_size, e),
                }
            }
            if results.is_empty() {
                eprintln!("Error: every batch size failed");
                process::exit(1);
            }

            print!("{}", format_comparison_table(&results));
            if let Some(path) = output {
                write_json(&path, &results);
            }
        }

        Commands::ListAlgorithms => {
            for name in chansim_algorithms::available_algorithms() {
                let description = match name {
                    "rr" => "capacity-aware round-robin (first fit)",
                    "rrn" => "naive round-robin",
                    "clb" => "greedy load balancing",
                    _ => "",
                };
                println!("{:<6} {}", name, description);
            }
        }
    }
}
