use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use squid_bytecode::cli;
use squid_bytecode::domain::source_tree::Scope;
use squid_bytecode::logging::init_tracing;
use squid_bytecode::{AnalysisInput, AnalysisReport, EngineConfig, SquidEngine};
use std::path::{Path, PathBuf};

/// Structural analysis and design metrics for compiled class files.
#[derive(Parser, Debug)]
#[command(name = "squid")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Debug logging (overridden by SQUID_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Classpath {
    /// Directories or jars holding the classes to measure
    #[arg(long, required = true, num_args = 1..)]
    classes: Vec<PathBuf>,

    /// Directories or jars used only to resolve referenced classes
    #[arg(long, num_args = 1..)]
    libraries: Vec<PathBuf>,

    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Project key used for the synthesized source tree
    #[arg(long, default_value = "project")]
    project: String,

    /// Decode classes on the current thread only
    #[arg(long)]
    sequential: bool,

    /// Drop each class's own accessors from RFC
    #[arg(long)]
    rfc_exclude_accessors: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Measure classes and print per-class metrics with the project summary
    Analyze {
        #[command(flatten)]
        classpath: Classpath,

        /// Source tree JSON produced by the source scanner
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Only list classes whose key matches this regex
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print dependency edges at one granularity
    Edges {
        #[command(flatten)]
        classpath: Classpath,

        #[arg(long, value_enum, default_value_t = Level::Package)]
        level: Level,

        /// Only list edges touching a key that matches this regex
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print the LCOM4 blocks of one class
    Blocks {
        #[command(flatten)]
        classpath: Classpath,

        /// Internal class name, e.g. tags/impl/Todo
        class: String,
    },
    /// Print virtual-dispatch links found by the linker
    Overrides {
        #[command(flatten)]
        classpath: Classpath,

        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Level {
    Class,
    File,
    Package,
}

impl From<Level> for Scope {
    fn from(level: Level) -> Self {
        match level {
            Level::Class => Scope::Class,
            Level::File => Scope::File,
            Level::Package => Scope::Package,
        }
    }
}

fn run(classpath: &Classpath, tree: Option<&Path>) -> Result<AnalysisReport> {
    let mut config = EngineConfig::resolve(classpath.config.as_deref())?;
    if classpath.sequential {
        config.parallel = false;
    }
    if classpath.rfc_exclude_accessors {
        config.rfc_exclude_accessors = true;
    }
    let mut input = AnalysisInput::new(&classpath.project, classpath.classes.clone())
        .with_libraries(classpath.libraries.clone());
    if let Some(path) = tree {
        input = input.with_tree_file(path)?;
    }
    SquidEngine::new(config).analyze(&input)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Analyze {
            classpath,
            tree,
            json,
            filter,
        } => {
            let filter = cli::compile_filter(filter.as_deref())?;
            let report = run(&classpath, tree.as_deref())?;
            if json {
                cli::print_json(&report)?;
            } else {
                cli::print_class_metrics(&report, filter.as_ref());
            }
        }
        Command::Edges {
            classpath,
            level,
            filter,
        } => {
            let filter = cli::compile_filter(filter.as_deref())?;
            let report = run(&classpath, None)?;
            cli::print_edges(&report, level.into(), filter.as_ref());
        }
        Command::Blocks { classpath, class } => {
            let report = run(&classpath, None)?;
            cli::print_blocks(&report, &class)?;
        }
        Command::Overrides { classpath, filter } => {
            let filter = cli::compile_filter(filter.as_deref())?;
            let report = run(&classpath, None)?;
            cli::print_overrides(&report, filter.as_ref());
        }
    }

    Ok(())
}
