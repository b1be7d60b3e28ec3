use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

use quadbin_instance::{QapInstance, QkpInstance, build_qap, build_qkp};
use quadbin_model::{ExhaustiveSampler, QuadraticModel, SampleSet, Sampler, SamplerConfig};

#[derive(Parser)]
#[command(name = "quadbin")]
#[command(about = "Build and sample quadratic binary models for QAP/QKP instances", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Problem {
    Qap,
    Qkp,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an instance file and print a summary
    Check {
        /// The instance file to check
        file: PathBuf,
        /// Problem family of the instance
        #[arg(short, long, value_enum, default_value = "qap")]
        problem: Problem,
    },
    /// Build the quadratic model and print it
    Build {
        /// The instance file to build from
        file: PathBuf,
        /// Problem family of the instance
        #[arg(short, long, value_enum, default_value = "qap")]
        problem: Problem,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Build the model, sample it exhaustively, and rank the results
    Solve {
        /// The instance file to solve
        file: PathBuf,
        /// Problem family of the instance
        #[arg(short, long, value_enum, default_value = "qap")]
        problem: Problem,
        /// Number of ranked samples to keep
        #[arg(long, default_value_t = 100)]
        reads: usize,
        /// Wall-clock budget in milliseconds
        #[arg(long, default_value_t = 60_000)]
        timeout_ms: u64,
        /// Write the ranked samples to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Solve every instance in a directory and export one CSV per instance
    Batch {
        /// Directory holding the instance files
        #[arg(long)]
        instance_dir: PathBuf,
        /// Directory receiving the CSV exports and the runtime log
        #[arg(long)]
        output_dir: PathBuf,
        /// Problem family of the instances
        #[arg(short, long, value_enum, default_value = "qap")]
        problem: Problem,
        /// Number of ranked samples to keep per instance
        #[arg(long, default_value_t = 100)]
        reads: usize,
        /// Wall-clock budget per instance in milliseconds
        #[arg(long, default_value_t = 60_000)]
        timeout_ms: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { file, problem } => check(&file, problem),
        Commands::Build { file, problem, format } => build(&file, problem, &format),
        Commands::Solve { file, problem, reads, timeout_ms, output } => {
            let config = SamplerConfig::default()
                .with_num_reads(reads)
                .with_timeout_ms(timeout_ms);
            solve(&file, problem, &config, output.as_deref());
        }
        Commands::Batch { instance_dir, output_dir, problem, reads, timeout_ms } => {
            let config = SamplerConfig::default()
                .with_num_reads(reads)
                .with_timeout_ms(timeout_ms);
            batch(&instance_dir, &output_dir, problem, &config);
        }
    }
}

fn check(file: &Path, problem: Problem) {
    match problem {
        Problem::Qap => match QapInstance::from_file(file) {
            Ok(instance) => {
                println!("✓ {} is a valid QAP instance", file.display());
                println!("  size: {}", instance.size);
                match instance.optimal {
                    Some(optimal) => println!("  known optimal: {}", optimal),
                    None => println!("  known optimal: (none)"),
                }
            }
            Err(e) => {
                eprintln!("✗ {} has errors:", file.display());
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        },
        Problem::Qkp => match QkpInstance::from_file(file) {
            Ok(instance) => {
                println!("✓ {} is a valid QKP instance", file.display());
                println!("  name: {}", instance.name);
                println!("  items: {}", instance.size);
                println!("  capacity: {}", instance.capacity);
            }
            Err(e) => {
                eprintln!("✗ {} has errors:", file.display());
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        },
    }
}

/// Flat, JSON-friendly rendering of a built model.
#[derive(serde::Serialize)]
struct ModelDump {
    instance: String,
    num_variables: usize,
    num_interactions: usize,
    num_constraints: usize,
    offset: f64,
    linear: Vec<(String, f64)>,
    quadratic: Vec<(String, String, f64)>,
}

impl ModelDump {
    fn new(instance: String, model: &QuadraticModel) -> Self {
        Self {
            instance,
            num_variables: model.num_variables(),
            num_interactions: model.num_interactions(),
            num_constraints: model.constraints().len(),
            offset: model.offset(),
            linear: model
                .linear()
                .iter()
                .map(|(v, &c)| (v.to_string(), c))
                .collect(),
            quadratic: model
                .quadratic_terms()
                .iter()
                .map(|(&(u, v), &c)| (u.to_string(), v.to_string(), c))
                .collect(),
        }
    }
}

fn load_model(file: &Path, problem: Problem) -> (String, QuadraticModel) {
    let result = match problem {
        Problem::Qap => QapInstance::from_file(file)
            .map_err(|e| e.to_string())
            .and_then(|instance| {
                build_qap(&instance).map_err(|e| e.to_string())
            })
            .map(|model| (instance_name(file), model)),
        Problem::Qkp => QkpInstance::from_file(file)
            .map_err(|e| e.to_string())
            .and_then(|instance| {
                let name = instance.name.clone();
                build_qkp(&instance)
                    .map(|model| (name, model))
                    .map_err(|e| e.to_string())
            }),
    };
    match result {
        Ok(named) => named,
        Err(e) => {
            eprintln!("Error building model from {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn instance_name(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

fn build(file: &Path, problem: Problem, format: &str) {
    let (name, model) = load_model(file, problem);
    let dump = ModelDump::new(name, &model);

    if format == "json" {
        match serde_json::to_string_pretty(&dump) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing model: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        println!("Instance: {}", dump.instance);
        println!("Variables: {}", dump.num_variables);
        println!("Interactions: {}", dump.num_interactions);
        println!("Constraints: {}", dump.num_constraints);
        println!("Offset: {:.2}", dump.offset);
        println!();
        println!("Linear terms:");
        for (variable, coefficient) in &dump.linear {
            println!("  {:12} {:14.2}", variable, coefficient);
        }
        println!();
        println!("Quadratic terms:");
        for (u, v, coefficient) in &dump.quadratic {
            println!("  {:12} {:12} {:14.2}", u, v, coefficient);
        }
    }
}

fn solve(file: &Path, problem: Problem, config: &SamplerConfig, output: Option<&Path>) {
    let (name, model) = load_model(file, problem);
    println!("Solving instance {}", name);

    let start = Instant::now();
    let results = match ExhaustiveSampler::new().sample(&model, config) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Sampling failed: {}", e);
            std::process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    match results.best() {
        Some(best) => {
            println!("Best energy: {:.2}", best.energy);
            let feasible = model.is_feasible(&best.assignment);
            println!("Feasible: {}", if feasible { "yes" } else { "no" });
            println!("Samples: {}", results.len());
            println!("RunTime: {:.3}(s)", elapsed.as_secs_f64());
        }
        None => {
            println!("No samples returned within the time budget.");
            std::process::exit(1);
        }
    }

    if let Some(path) = output {
        if let Err(e) = write_samples_csv(path, &model, &results) {
            eprintln!("Error writing {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!("Results written to {}", path.display());
    }
}

fn batch(instance_dir: &Path, output_dir: &Path, problem: Problem, config: &SamplerConfig) {
    let mut files: Vec<PathBuf> = match std::fs::read_dir(instance_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            eprintln!("Error reading {}: {}", instance_dir.display(), e);
            std::process::exit(1);
        }
    };
    files.sort();

    if let Err(e) = std::fs::create_dir_all(output_dir) {
        eprintln!("Error creating {}: {}", output_dir.display(), e);
        std::process::exit(1);
    }

    let mut runtime_log = String::new();
    let mut failures = 0;

    for file in &files {
        println!("Solving instance {}", instance_name(file));
        let start = Instant::now();

        let built = match problem {
            Problem::Qap => QapInstance::from_file(file)
                .map_err(|e| e.to_string())
                .and_then(|i| build_qap(&i).map_err(|e| e.to_string()))
                .map(|model| (instance_name(file), model)),
            Problem::Qkp => QkpInstance::from_file(file)
                .map_err(|e| e.to_string())
                .and_then(|i| {
                    let name = i.name.clone();
                    build_qkp(&i).map(|m| (name, m)).map_err(|e| e.to_string())
                }),
        };
        let (name, model) = match built {
            Ok(named) => named,
            Err(e) => {
                eprintln!("  skipped: {}", e);
                failures += 1;
                continue;
            }
        };

        let results = match ExhaustiveSampler::new().sample(&model, config) {
            Ok(results) => results,
            Err(e) => {
                eprintln!("  skipped: {}", e);
                failures += 1;
                continue;
            }
        };

        let csv_path = output_dir.join(format!("{}.csv", name));
        if let Err(e) = write_samples_csv(&csv_path, &model, &results) {
            eprintln!("  skipped: error writing {}: {}", csv_path.display(), e);
            failures += 1;
            continue;
        }

        let seconds = start.elapsed().as_secs_f64();
        runtime_log.push_str(&format!("{} RunTime: {}(s)\n", name, seconds));
        println!("RunTime: {:.3}(s)", seconds);
    }

    let log_path = output_dir.join("RunTime.txt");
    if let Err(e) = std::fs::write(&log_path, runtime_log) {
        eprintln!("Error writing {}: {}", log_path.display(), e);
        std::process::exit(1);
    }

    if failures > 0 {
        eprintln!("{} instance(s) failed", failures);
        std::process::exit(1);
    }
}

/// Ranked samples as CSV: energy, occurrence count, then one 0/1 column per
/// model variable in sorted variable order; rows sorted by ascending energy.
fn write_samples_csv(
    path: &Path,
    model: &QuadraticModel,
    results: &SampleSet,
) -> std::io::Result<()> {
    use std::io::Write;

    let variables: Vec<_> = model.variables().collect();
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);

    write!(out, "energy,num_occurrences")?;
    for variable in &variables {
        write!(out, ",{}", variable)?;
    }
    writeln!(out)?;

    for sample in results.iter() {
        write!(out, "{},{}", sample.energy, sample.num_occurrences)?;
        for variable in &variables {
            let bit = sample.assignment.get(variable).copied().unwrap_or(false);
            write!(out, ",{}", if bit { 1 } else { 0 })?;
        }
        writeln!(out)?;
    }
    out.flush()
}
