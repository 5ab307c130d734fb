use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fintrack::cli::{
    handle_budget_command, handle_dashboard_command, handle_expense_command,
    handle_export_command, handle_extract_command, handle_goal_command, handle_import_command,
    handle_income_command, handle_insights_command, handle_quick_add_command,
    handle_report_command, handle_summary_command, handle_user_command, today, ExportFormat,
};
use fintrack::config::settings::LOG_ENV;
use fintrack::config::{FinancePaths, Settings, StoreBackend};
use fintrack::models::{FlowRange, SummaryPeriod};
use fintrack::reports::ReportFormat;
use fintrack::services::{QuickAddKind, UserService};
use fintrack::storage::{seed_demo, Storage};

#[derive(Parser)]
#[command(
    name = "fintrack",
    version,
    about = "Personal finance tracker for the terminal",
    long_about = "fintrack records expenses, income, monthly budgets and savings goals, \
                  and turns them into summaries, a dashboard and reports. Optional \
                  AI-generated insights come from a configurable text-generation service."
)]
struct Cli {
    /// Data directory (defaults to the platform config directory)
    #[arg(long, global = true, env = "FINTRACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init {
        /// Load a small demo data set (replaces existing records)
        #[arg(long)]
        demo: bool,

        /// Record store to use
        #[arg(long, value_enum)]
        backend: Option<StoreBackend>,
    },

    /// Show current configuration and paths
    Config,

    /// Income, expenses and budget usage for a period
    Summary {
        #[arg(short, long, value_enum, default_value_t)]
        period: SummaryPeriod,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Monthly metrics, cash flow and month-end conclusion
    #[command(alias = "dash")]
    Dashboard {
        #[arg(short, long, value_enum, default_value_t)]
        range: FlowRange,
    },

    /// Expense management commands
    #[command(subcommand)]
    Expense(fintrack::cli::ExpenseCommands),

    /// Income management commands
    #[command(subcommand)]
    Income(fintrack::cli::IncomeCommands),

    /// Record an expense or income dated today
    #[command(name = "quick-add", alias = "qa")]
    QuickAdd {
        #[arg(value_enum)]
        kind: QuickAddKind,

        /// Amount
        amount: String,

        /// Category (expense) or source (income)
        label: String,
    },

    /// Budget management commands
    #[command(subcommand)]
    Budget(fintrack::cli::BudgetCommands),

    /// Savings goal commands
    #[command(subcommand)]
    Goal(fintrack::cli::GoalCommands),

    /// Import records from a CSV file
    Import {
        /// Path to CSV file
        file: String,
    },

    /// AI-generated spending insights
    Insights,

    /// Extract transactions from a document with the text generator
    Extract {
        /// Path to a text document
        file: String,

        /// Save extracted transactions as expenses
        #[arg(long)]
        save: bool,
    },

    /// Comprehensive financial report
    Report {
        #[arg(short, long, value_enum, default_value_t)]
        period: SummaryPeriod,

        #[arg(short, long, value_enum, default_value_t)]
        format: ReportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the AI insights section
        #[arg(long)]
        no_ai: bool,
    },

    /// Export all of your data
    Export {
        /// Output file path
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t)]
        format: ExportFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// User profile commands
    #[command(subcommand)]
    User(fintrack::cli::UserCommands),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    // Initialize paths and settings
    let paths = match cli.data_dir {
        Some(dir) => FinancePaths::with_base_dir(dir),
        None => FinancePaths::new()?,
    };
    let mut settings = Settings::load_or_create(&paths)?.apply_env()?;

    if let Some(Commands::Init { demo, backend }) = &cli.command {
        if let Some(backend) = backend {
            settings.store_backend = *backend;
        }
        println!("Initializing fintrack at: {}", paths.base_dir().display());
        settings.save(&paths)?;

        let storage = Storage::open(paths.clone(), settings.store_backend)?;
        let user = UserService::new(&storage, settings.user_id).ensure_user(settings.currency)?;
        println!("Store backend: {}", settings.store_backend);
        println!("User: {}", user.username);

        if *demo {
            let seeded = seed_demo(storage.store(), settings.user_id, today())?;
            println!(
                "Loaded demo data: {} expenses, {} income, {} budget, {} savings goal",
                seeded.expenses, seeded.income, seeded.budgets, seeded.goals
            );
        }
        println!("Initialization complete!");
        return Ok(());
    }

    // Initialize storage
    let storage = Storage::open(paths.clone(), settings.store_backend)?;
    UserService::new(&storage, settings.user_id).ensure_user(settings.currency)?;

    match cli.command {
        Some(Commands::Init { .. }) => {}
        Some(Commands::Config) => {
            println!("fintrack Configuration");
            println!("======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Store backend:  {}", settings.store_backend);
            println!("  User id:        {}", settings.user_id);
            println!(
                "  Currency:       {} ({})",
                settings.currency.code(),
                settings.currency_symbol()
            );
            println!("  AI provider:    {}", settings.ai.provider);
            println!("  AI model:       {}", settings.ai.model);
            println!(
                "  AI key:         {}",
                if settings.ai_api_key().is_some() {
                    "set"
                } else {
                    "not set"
                }
            );
        }
        Some(Commands::Summary { period, json }) => {
            handle_summary_command(&storage, &settings, period, json)?;
        }
        Some(Commands::Dashboard { range }) => {
            handle_dashboard_command(&storage, &settings, range)?;
        }
        Some(Commands::Expense(cmd)) => {
            handle_expense_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Income(cmd)) => {
            handle_income_command(&storage, &settings, cmd)?;
        }
        Some(Commands::QuickAdd {
            kind,
            amount,
            label,
        }) => {
            handle_quick_add_command(&storage, &settings, kind, &amount, &label)?;
        }
        Some(Commands::Budget(cmd)) => {
            handle_budget_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Goal(cmd)) => {
            handle_goal_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Import { file }) => {
            handle_import_command(&storage, &settings, &file)?;
        }
        Some(Commands::Insights) => {
            handle_insights_command(&storage, &settings)?;
        }
        Some(Commands::Extract { file, save }) => {
            handle_extract_command(&storage, &settings, &file, save)?;
        }
        Some(Commands::Report {
            period,
            format,
            output,
            no_ai,
        }) => {
            handle_report_command(&storage, &settings, period, format, output, no_ai)?;
        }
        Some(Commands::Export {
            output,
            format,
            pretty,
        }) => {
            handle_export_command(&storage, &settings, output, format, pretty)?;
        }
        Some(Commands::User(cmd)) => {
            handle_user_command(&storage, &settings, cmd)?;
        }
        None => {
            println!("fintrack - personal finance tracker");
            println!();
            println!("Run 'fintrack --help' for usage information.");
            println!("Run 'fintrack init --demo' to try it with sample data.");
        }
    }

    Ok(())
}
