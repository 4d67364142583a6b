//! tablefusion CLI
//!
//! Command-line tool for inspecting, merging, transforming and exporting
//! tabular data files (CSV, Excel, JSON).

use clap::{Parser, Subcommand};
use fusion_core::{
    discover_files, export_to_path, read_path, AppConfig, FillSpec, JoinType, MergeMethod,
    MergeSpec, NumericFill, Session, Table, TransformStep,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fusion-cli")]
#[command(about = "Merge and transform tabular data files", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and display a single data file
    Inspect {
        /// Path to the file
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Merge data files and export the result
    Merge {
        /// Input files to merge, in order
        #[arg(short, long)]
        input: Vec<PathBuf>,

        /// Directories to scan for supported input files
        #[arg(short, long)]
        dir: Vec<PathBuf>,

        /// Merge method (append, join or smart)
        #[arg(short, long, default_value = "append")]
        method: String,

        /// Key column for join merges
        #[arg(short, long)]
        key: Option<String>,

        /// Join type (outer, inner or left)
        #[arg(long, default_value = "outer")]
        join_type: String,

        /// Match column names case-sensitively
        #[arg(long)]
        case_sensitive: bool,

        /// Fuzzy-match similarly named columns
        #[arg(long)]
        fuzzy: bool,

        /// Remove exactly-duplicated rows after merging
        #[arg(long)]
        dedup: bool,

        /// Fill missing numeric values (mean, median, mode or zero)
        #[arg(long)]
        fill: Option<String>,

        /// Output file; the extension selects the format (csv, xlsx, json)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Apply a transformation step file to a data file
    Transform {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file holding the step list
        #[arg(short, long)]
        steps: PathBuf,

        /// Output file; the extension selects the format
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List registered transformer plugins
    Plugins,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> fusion_core::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Inspect { file, limit } => cmd_inspect(&config, &file, limit),
        Commands::Merge {
            input,
            dir,
            method,
            key,
            join_type,
            case_sensitive,
            fuzzy,
            dedup,
            fill,
            output,
        } => cmd_merge(
            &config,
            &input,
            &dir,
            &method,
            key,
            &join_type,
            case_sensitive,
            fuzzy,
            dedup,
            fill,
            &output,
        ),
        Commands::Transform {
            input,
            steps,
            output,
        } => cmd_transform(&config, &input, &steps, &output),
        Commands::Plugins => cmd_plugins(&config),
    }
}

fn cmd_inspect(config: &AppConfig, file: &PathBuf, limit: usize) -> fusion_core::Result<()> {
    let (file_id, table) = read_path(file, &config.read_options())?;

    println!("File: {}", file_id);
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    for (idx, col) in table.columns.iter().enumerate() {
        let type_name = match table.infer_column_type(idx) {
            Some(t) => format!("{:?}", t).to_lowercase(),
            None => "empty".to_string(),
        };
        println!("  {} ({})", col.name, type_name);
    }
    println!();

    print_preview(&table, limit);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_merge(
    config: &AppConfig,
    input: &[PathBuf],
    dir: &[PathBuf],
    method: &str,
    key: Option<String>,
    join_type: &str,
    case_sensitive: bool,
    fuzzy: bool,
    dedup: bool,
    fill: Option<String>,
    output: &PathBuf,
) -> fusion_core::Result<()> {
    let method = match method.to_lowercase().as_str() {
        "append" => MergeMethod::Append,
        "join" => MergeMethod::Join,
        "smart" => MergeMethod::Smart,
        other => {
            return Err(fusion_core::Error::InvalidSpec(format!(
                "unknown merge method '{}', expected append, join or smart",
                other
            )))
        }
    };
    let join = match join_type.to_lowercase().as_str() {
        "outer" => JoinType::Outer,
        "inner" => JoinType::Inner,
        "left" => JoinType::Left,
        other => {
            return Err(fusion_core::Error::InvalidSpec(format!(
                "unknown join type '{}', expected outer, inner or left",
                other
            )))
        }
    };
    let fill = match fill.as_deref() {
        None => None,
        Some(name) => {
            let numeric = match name.to_lowercase().as_str() {
                "mean" => NumericFill::Mean,
                "median" => NumericFill::Median,
                "mode" => NumericFill::Mode,
                "zero" => NumericFill::Zero,
                other => {
                    return Err(fusion_core::Error::InvalidSpec(format!(
                        "unknown fill method '{}', expected mean, median, mode or zero",
                        other
                    )))
                }
            };
            Some(FillSpec {
                numeric,
                ..config.default_fill.clone()
            })
        }
    };

    // Explicit inputs first, then directory discoveries
    let mut paths: Vec<PathBuf> = input.to_vec();
    if !dir.is_empty() {
        paths.extend(discover_files(dir));
    }
    if paths.is_empty() {
        return Err(fusion_core::Error::InvalidSpec(
            "no input files; pass --input or --dir".to_string(),
        ));
    }

    let mut session = Session::new(config.clone());
    for path in &paths {
        let file_id = load_into_session(&mut session, path)?;
        println!("Loaded {} as '{}'", path.display(), file_id);
    }

    session.set_spec(MergeSpec {
        method,
        key,
        join,
        ignore_case: !case_sensitive,
        fuzzy_columns: fuzzy,
        dedup_rows: dedup,
        fill,
        fuzzy_threshold: config.fuzzy_threshold,
        smart_threshold: config.smart_threshold,
    });

    let merged = session.merge()?;
    println!();
    println!(
        "Merged {} files: {} rows, {} columns",
        paths.len(),
        merged.row_count(),
        merged.column_count()
    );

    export_to_path(merged, output)?;
    println!("Exported to {}", output.display());

    Ok(())
}

fn cmd_transform(
    config: &AppConfig,
    input: &PathBuf,
    steps_path: &PathBuf,
    output: &PathBuf,
) -> fusion_core::Result<()> {
    let steps_json = std::fs::read_to_string(steps_path)?;
    let steps: Vec<TransformStep> = serde_json::from_str(&steps_json)?;
    println!("Loaded {} transformation step(s) from {}", steps.len(), steps_path.display());

    let mut session = Session::new(config.clone());
    load_into_session(&mut session, input)?;
    session.merge()?;

    for step in steps {
        println!("  - {}", step.describe());
        session.add_step(step)?;
    }

    let merged = session
        .merged()
        .ok_or_else(|| fusion_core::Error::InvalidSpec("nothing merged".to_string()))?;
    println!(
        "Result: {} rows, {} columns",
        merged.current.row_count(),
        merged.current.column_count()
    );

    export_to_path(&merged.current, output)?;
    println!("Exported to {}", output.display());

    Ok(())
}

/// Read a file from disk into the session, returning its file id
fn load_into_session(session: &mut Session, path: &PathBuf) -> fusion_core::Result<String> {
    let format = fusion_core::FileFormat::from_path(path)?;
    let file_id = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let bytes = std::fs::read(path)?;
    session.load_file(&file_id, &bytes, format, None)?;
    Ok(file_id)
}

fn cmd_plugins(config: &AppConfig) -> fusion_core::Result<()> {
    let session = Session::new(config.clone());
    let registry = session.registry();

    if registry.is_empty() {
        println!("No transformers registered (plugins disabled in config).");
        return Ok(());
    }

    println!("Registered transformers ({}):", registry.len());
    println!();

    for transformer in registry.iter() {
        println!("{}", transformer.name());
        println!("  {}", transformer.description());
        for param in transformer.parameters() {
            let required = if param.required { "required" } else { "optional" };
            let mut detail = format!("{:?}", param.kind).to_lowercase();
            if param.column_options {
                detail.push_str(", column names");
            }
            if !param.options.is_empty() {
                let values: Vec<&str> =
                    param.options.iter().map(|o| o.value.as_str()).collect();
                detail.push_str(&format!(", one of: {}", values.join(", ")));
            }
            println!("    {} ({}; {})", param.name, required, detail);
        }
        println!();
    }

    Ok(())
}

/// Print the first rows of a table, tab-separated
fn print_preview(table: &Table, limit: usize) {
    let header = table.column_names().join("\t");
    println!("{}", header);
    println!("{}", "-".repeat(table.column_count() * 12));

    for row in table.rows.iter().take(limit) {
        let values: Vec<String> = row.iter().map(|c| c.render()).collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }
}
