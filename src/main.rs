//! snag - track inline task annotations through version control.

use clap::{Parser, Subcommand};
use colored::Colorize;

use snag::{AppContext, Config, DoneOutcome, InitOptions, SnagError, TaskStore};

#[derive(Parser)]
#[command(name = "snag")]
#[command(version = "0.1.0")]
#[command(about = "Track source-code task annotations and sync them to your task manager", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the pending diff and stage new tasks (pre-commit hook)
    Commit {
        /// Diff the index instead of the working tree
        #[arg(short, long)]
        cached: bool,
    },

    /// Attach the just-created commit hash to staged tasks (post-commit hook)
    PostCommit,

    /// Deliver staged tasks and completions to the plugin (pre-push hook)
    Push,

    /// Print the staged tasks
    List {
        /// Print the current configuration instead
        #[arg(long)]
        config: bool,
    },

    /// Mark a task done; delivered to the plugin at next push
    Done {
        /// External task id
        id: String,
    },

    /// Initialise snag for this repository
    Init {
        /// Plugin to use, from ~/.snag/plugins
        #[arg(short, long)]
        plugin: String,

        /// Author identity; defaults to the version-control identity
        #[arg(long)]
        author: Option<String>,

        /// Interpreter command line for the plugin scripts; defaults to
        /// the plugin's interp file
        #[arg(short, long)]
        interpreter: Option<String>,

        /// Annotation marker token
        #[arg(long)]
        marker: Option<String>,
    },

    /// Delete all stored tasks
    Destroy {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "snag=debug,info"
    } else {
        "snag=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), err);
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> snag::Result<()> {
    let cwd = std::env::current_dir()?;
    let ctx = AppContext::discover(&cwd)?;

    match cli.command {
        Commands::Commit { cached } => run_commit(&ctx, cached),
        Commands::PostCommit => run_post_commit(&ctx),
        Commands::Push => run_push(&ctx),
        Commands::List { config } => run_list(&ctx, config),
        Commands::Done { id } => run_done(&ctx, &id),
        Commands::Init {
            plugin,
            author,
            interpreter,
            marker,
        } => run_init(
            &ctx,
            InitOptions {
                plugin,
                author,
                interpreter,
                marker,
            },
        ),
        Commands::Destroy { yes } => run_destroy(&ctx, yes),
    }
}

fn run_commit(ctx: &AppContext, cached: bool) -> snag::Result<()> {
    let summary = snag::commit(ctx, cached)?;

    for failure in &summary.parse_failures {
        eprintln!("{} {}", "Warning:".yellow(), failure);
    }
    for task in &summary.staged {
        println!("{} Staged {} as {}", "OK".cyan(), task, task.id);
    }
    if summary.staged.is_empty() {
        println!("No new tasks");
    }
    println!("Snag finished commit");
    Ok(())
}

fn run_post_commit(ctx: &AppContext) -> snag::Result<()> {
    let summary = snag::post_commit(ctx)?;

    if summary.updated > 0 {
        println!(
            "{} Attached {} to {} task(s)",
            "OK".cyan(),
            summary.hash,
            summary.updated
        );
    }
    println!("Snag finished post-commit");
    Ok(())
}

fn run_push(ctx: &AppContext) -> snag::Result<()> {
    let summary = snag::push(ctx)?;

    if summary.nothing_to_do {
        println!("No new tasks or done tasks");
        return Ok(());
    }

    for id in &summary.created {
        println!("{} Task {id} added", "OK".cyan());
    }
    for id in &summary.completed {
        println!("{} Task {id} marked as done", "OK".cyan());
    }
    for failure in &summary.failures {
        match &failure.task {
            Some(task) => eprintln!(
                "{} Failed to add task '{task}': {}",
                "Error:".red().bold(),
                failure.error
            ),
            None => eprintln!(
                "{} Failed to mark {} as done: {}",
                "Error:".red().bold(),
                failure.id,
                failure.error
            ),
        }
    }

    // Per-task failures are retained for the next push; the invocation
    // itself still succeeded with a consistently persisted store
    println!("Snag finished push");
    Ok(())
}

fn run_list(ctx: &AppContext, config: bool) -> snag::Result<()> {
    if config {
        let config = Config::load(&ctx.config_path())?;
        println!("{config}");
        return Ok(());
    }

    let store = TaskStore::load(&ctx.store_path())?;
    println!("{store}");
    Ok(())
}

fn run_done(ctx: &AppContext, id: &str) -> snag::Result<()> {
    match snag::mark_done(ctx, id)? {
        DoneOutcome::DroppedLocal => {
            println!("Task {id} was never pushed; dropped locally");
        }
        DoneOutcome::Queued => {
            println!("Task {id} will be marked done at next push");
        }
        DoneOutcome::AlreadyQueued => {
            println!("Task {id} is already queued");
        }
    }
    Ok(())
}

fn run_init(ctx: &AppContext, opts: InitOptions) -> snag::Result<()> {
    let summary = snag::init(ctx, opts)?;

    println!(
        "{} Initialised snag with plugin '{}'",
        "OK".cyan(),
        summary.config.plugin
    );
    println!("{}", summary.config);
    println!("{} hooks installed", ctx.vc().name_of_vc());
    println!("Done - please check the plugin is configured correctly");
    Ok(())
}

fn run_destroy(ctx: &AppContext, yes: bool) -> snag::Result<()> {
    if !yes {
        return Err(SnagError::store(
            "refusing to delete stored tasks without --yes",
        ));
    }

    let path = ctx.store_path();
    if path.exists() {
        std::fs::remove_file(&path)
            .map_err(|err| SnagError::store_with_path(format!("could not delete: {err}"), path))?;
        println!("Stored tasks deleted");
    } else {
        println!("No stored tasks to delete");
    }
    Ok(())
}
