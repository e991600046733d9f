//! CLI definition and dispatch.

use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvLifecycleAdapter;
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{parse_date, validate_backtest_config, validate_strategy};
use crate::domain::error::TokensimError;
use crate::domain::strategy::{
    parse_take_profit_levels, EntryConditions, ExitConditions, PositionSizing, SizingMethod,
    StrategyDefinition,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::lifecycle_port::LifecyclePort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "tokensim", about = "Token lifecycle strategy backtester")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy file; defaults to the strategy sections of --config
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        /// Report path: `.csv` writes a trade ledger, anything else JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Show the discovery range of the configured data source
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run several strategies over the same window
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, required = true, num_args = 1..)]
        strategy: Vec<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(command: &Command) -> Result<(), TokensimError> {
    match command {
        Command::Backtest {
            config,
            strategy,
            output,
            dry_run,
        } => {
            if *dry_run {
                run_dry_run(config, strategy.as_deref())
            } else {
                run_backtest(config, strategy.as_deref(), output.as_deref())
            }
        }
        Command::Validate { strategy } => run_validate(strategy),
        Command::Info { config } => run_info(config),
        Command::Compare {
            config,
            strategy,
            output,
        } => run_compare(config, strategy, output.as_deref()),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TokensimError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, TokensimError> {
    let start_date = parse_date(
        adapter.get_string("backtest", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("backtest", "end_date").as_deref(),
        "end_date",
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 10_000.0),
    })
}

/// Assemble a strategy from `[strategy]`, `[entry]`, `[exit]` and `[sizing]`.
///
/// Only syntax is checked here; bounds are left to [`validate_strategy`] so
/// every violation can be reported at once.
pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<StrategyDefinition, TokensimError> {
    let name = adapter.get_string("strategy", "name").unwrap_or_default();
    let id = adapter
        .get_string("strategy", "id")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| slugify(&name));
    let description = adapter
        .get_string("strategy", "description")
        .unwrap_or_default();

    Ok(StrategyDefinition {
        id,
        name,
        description,
        entry: build_entry(adapter),
        exit: build_exit(adapter)?,
        sizing: build_sizing(adapter),
    })
}

fn build_entry(adapter: &dyn ConfigPort) -> EntryConditions {
    let double = |key: &str| adapter.get_optional_double("entry", key);
    let flag = |key: &str| adapter.get_optional_bool("entry", key);

    EntryConditions {
        min_risk_score: double("min_risk_score"),
        max_risk_score: double("max_risk_score"),
        min_liquidity: double("min_liquidity"),
        max_liquidity: double("max_liquidity"),
        min_holders: adapter.get_optional_uint("entry", "min_holders"),
        max_holders: adapter.get_optional_uint("entry", "max_holders"),
        min_top10_percent: double("min_top10_percent"),
        max_top10_percent: double("max_top10_percent"),
        require_mint_revoked: flag("require_mint_revoked"),
        require_freeze_revoked: flag("require_freeze_revoked"),
        require_lp_locked: flag("require_lp_locked"),
        require_socials: flag("require_socials"),
        require_twitter: flag("require_twitter"),
        require_telegram: flag("require_telegram"),
        require_website: flag("require_website"),
        min_smart_money_buys: adapter
            .get_optional_uint("entry", "min_smart_money_buys")
            .and_then(|v| u32::try_from(v).ok()),
        min_token_age_minutes: double("min_token_age_minutes"),
        max_token_age_minutes: double("max_token_age_minutes"),
    }
}

fn build_exit(adapter: &dyn ConfigPort) -> Result<ExitConditions, TokensimError> {
    let take_profit_levels = match adapter
        .get_string("exit", "take_profit")
        .filter(|s| !s.trim().is_empty())
    {
        Some(ladder) => {
            parse_take_profit_levels(&ladder).map_err(|e| TokensimError::ConfigInvalid {
                section: "exit".into(),
                key: "take_profit".into(),
                reason: e.to_string(),
            })?
        }
        None => Vec::new(),
    };

    let stop_loss_percent = adapter
        .get_string("exit", "stop_loss")
        .ok_or_else(|| TokensimError::ConfigMissing {
            section: "exit".into(),
            key: "stop_loss".into(),
        })?
        .trim()
        .parse::<f64>()
        .map_err(|_| TokensimError::ConfigInvalid {
            section: "exit".into(),
            key: "stop_loss".into(),
            reason: "expected a number".into(),
        })?;

    Ok(ExitConditions {
        take_profit_levels,
        stop_loss_percent,
        trailing_stop_percent: adapter.get_optional_double("exit", "trailing_stop"),
        trailing_stop_activation_percent: adapter
            .get_optional_double("exit", "trailing_stop_activation"),
        max_hold_time_hours: adapter.get_optional_double("exit", "max_hold_hours"),
        exit_on_rug_signal: adapter.get_bool("exit", "exit_on_rug", false),
    })
}

fn build_sizing(adapter: &dyn ConfigPort) -> PositionSizing {
    let method = adapter
        .get_string("sizing", "method")
        .map(|m| SizingMethod::parse(&m))
        .unwrap_or(SizingMethod::Fixed);

    PositionSizing {
        method,
        fixed_amount: adapter.get_optional_double("sizing", "fixed_amount"),
        percent_of_capital: adapter.get_optional_double("sizing", "percent_of_capital"),
        risk_percent: adapter.get_optional_double("sizing", "risk_percent"),
        max_position_size: adapter.get_optional_double("sizing", "max_position_size"),
        max_concurrent_positions: adapter
            .get_optional_uint("sizing", "max_concurrent_positions")
            .and_then(|v| usize::try_from(v).ok()),
    }
}

fn slugify(name: &str) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "strategy".to_string()
    } else {
        slug
    }
}

/// Build and validate a strategy, failing with every violation found.
pub fn load_strategy(adapter: &dyn ConfigPort) -> Result<StrategyDefinition, TokensimError> {
    let strategy = build_strategy(adapter)?;
    let violations = validate_strategy(&strategy);
    if !violations.is_empty() {
        return Err(TokensimError::StrategyInvalid { violations });
    }
    Ok(strategy)
}

/// `[backtest] records` selects a CSV file; otherwise `[sqlite] path`.
pub fn open_lifecycle_port(
    config: &dyn ConfigPort,
) -> Result<Box<dyn LifecyclePort>, TokensimError> {
    if let Some(path) = config
        .get_string("backtest", "records")
        .filter(|p| !p.trim().is_empty())
    {
        info!(path = %path, "reading lifecycle records from CSV");
        return Ok(Box::new(CsvLifecycleAdapter::new(PathBuf::from(path.trim()))));
    }

    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let adapter = SqliteAdapter::from_config(config)?;
        adapter.initialize_schema()?;
        info!("reading lifecycle records from SQLite");
        Ok(Box::new(adapter))
    }

    #[cfg(not(feature = "sqlite"))]
    {
        Err(TokensimError::ConfigMissing {
            section: "backtest".into(),
            key: "records".into(),
        })
    }
}

/// Pick a report writer from the output extension.
pub fn report_writer(output: &Path) -> Box<dyn ReportPort> {
    let is_csv = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvLedgerAdapter::new())
    } else {
        Box::new(JsonReportAdapter::new())
    }
}

fn resolve_strategy(
    config: &FileConfigAdapter,
    strategy_path: Option<&Path>,
) -> Result<StrategyDefinition, TokensimError> {
    match strategy_path {
        Some(path) => {
            eprintln!("Loading strategy from {}", path.display());
            load_strategy(&load_config(path)?)
        }
        None => load_strategy(config),
    }
}

fn run_backtest(
    config_path: &Path,
    strategy_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<(), TokensimError> {
    // Stage 1: load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;

    // Stage 2: strategy
    let strategy = resolve_strategy(&adapter, strategy_path)?;
    eprintln!("Loading strategy: {}", strategy.name);

    // Stage 3: data
    let bt_config = build_backtest_config(&adapter)?;
    let port = open_lifecycle_port(&adapter)?;
    let records = backtest_engine::fetch_window(port.as_ref(), &bt_config)?;
    if records.is_empty() {
        warn!("no lifecycle records in the backtest window");
        eprintln!(
            "warning: no lifecycle records between {} and {}",
            bt_config.start_date, bt_config.end_date
        );
    }

    // Stage 4: simulate and aggregate
    eprintln!(
        "Running backtest: {} records, {} to {}",
        records.len(),
        bt_config.start_date,
        bt_config.end_date
    );
    let result = backtest_engine::run_on_records(&records, &strategy, &bt_config);
    print_summary(&result);

    // Stage 5: report
    if let Some(output) = output_path {
        let output_str = output.to_string_lossy();
        report_writer(output).write(&result, &strategy, &output_str)?;
        eprintln!("\nReport written to: {}", output.display());
    }
    Ok(())
}

fn run_dry_run(config_path: &Path, strategy_path: Option<&Path>) -> Result<(), TokensimError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    eprintln!("Config validated successfully");

    let strategy = resolve_strategy(&adapter, strategy_path)?;
    print_strategy(&strategy);

    eprintln!("\nBacktest window:");
    eprintln!("  {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  initial capital: {:.2}", bt_config.initial_capital);
    match adapter.get_string("backtest", "records") {
        Some(path) => eprintln!("  records: {}", path.trim()),
        None => eprintln!(
            "  sqlite: {}",
            adapter.get_string("sqlite", "path").unwrap_or_default()
        ),
    }

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn run_validate(strategy_path: &Path) -> Result<(), TokensimError> {
    eprintln!("Validating strategy: {}", strategy_path.display());
    let adapter = load_config(strategy_path)?;
    let strategy = build_strategy(&adapter)?;

    let violations = validate_strategy(&strategy);
    if !violations.is_empty() {
        eprintln!("\nViolations:");
        for v in &violations {
            eprintln!("  - {v}");
        }
        return Err(TokensimError::StrategyInvalid { violations });
    }

    print_strategy(&strategy);
    eprintln!("\nStrategy configuration is valid.");
    Ok(())
}

fn run_info(config_path: &Path) -> Result<(), TokensimError> {
    let config = load_config(config_path)?;
    let port = open_lifecycle_port(&config)?;

    let window = build_backtest_config(&config).ok();

    match port.get_data_range()? {
        Some((first, last, count)) => {
            println!(
                "{} records, discovered {} to {}",
                count,
                format_unix(first),
                format_unix(last)
            );
            if let Some(bt_config) = window {
                let (start, end) = bt_config.window();
                let in_window = port.get_lifecycle_records(start, end)?.len();
                println!(
                    "{} records in {} to {}",
                    in_window, bt_config.start_date, bt_config.end_date
                );
            }
            Ok(())
        }
        None => {
            let (start, end) = window.map(|c| c.window()).unwrap_or((0, 0));
            Err(TokensimError::NoData { start, end })
        }
    }
}

fn run_compare(
    config_path: &Path,
    strategy_paths: &[PathBuf],
    output_path: Option<&Path>,
) -> Result<(), TokensimError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;

    let strategies = strategy_paths
        .iter()
        .map(|path| resolve_strategy(&adapter, Some(path.as_path())))
        .collect::<Result<Vec<_>, _>>()?;

    let port = open_lifecycle_port(&adapter)?;
    let records = backtest_engine::fetch_window(port.as_ref(), &bt_config)?;
    if records.is_empty() {
        warn!("no lifecycle records in the backtest window");
    }

    let results = backtest_engine::compare_strategies(&records, &strategies, &bt_config);

    eprintln!("\n=== Strategy Comparison ===");
    eprintln!(
        "  {:<24} {:>7} {:>9} {:>10} {:>9} {:>8}",
        "strategy", "trades", "win rate", "return", "max dd", "sharpe"
    );
    for result in &results {
        let r = &result.report;
        eprintln!(
            "  {:<24} {:>7} {:>8.1}% {:>9.2}% {:>8.1}% {:>8.2}",
            r.strategy_name,
            r.total_trades,
            r.win_rate,
            r.total_return_percent,
            r.max_drawdown,
            r.sharpe_ratio
        );
    }

    if let Some(output) = output_path {
        let runs: Vec<(BacktestResult, StrategyDefinition)> =
            results.into_iter().zip(strategies).collect();
        report_writer(output).write_many(&runs, &output.to_string_lossy())?;
        eprintln!("\nReports written next to: {}", output.display());
    }
    Ok(())
}

fn print_strategy(strategy: &StrategyDefinition) {
    eprintln!("\nStrategy: {} ({})", strategy.name, strategy.id);
    if !strategy.description.is_empty() {
        eprintln!("  {}", strategy.description);
    }
    eprintln!("  take profit:");
    for level in strategy.exit.sorted_take_profits() {
        eprintln!(
            "    +{}% -> sell {}%",
            level.percent_gain, level.sell_percent
        );
    }
    eprintln!("  stop loss:   {}%", strategy.exit.stop_loss_percent);
    if let Some(trail) = strategy.exit.trailing_stop_percent {
        eprintln!(
            "  trailing:    {}% (after +{}%)",
            trail,
            strategy.exit.trailing_stop_activation_percent.unwrap_or(0.0)
        );
    }
    if let Some(hours) = strategy.exit.max_hold_time_hours {
        eprintln!("  max hold:    {hours}h");
    }
    eprintln!("  sizing:      {}", strategy.sizing.method);
}

fn print_summary(result: &BacktestResult) {
    let m = &result.report;
    eprintln!("\n=== Results: {} ===", m.strategy_name);
    eprintln!("Final Capital:    {:.2}", m.final_capital);
    eprintln!("Total Return:     {:.2}%", m.total_return_percent);
    eprintln!("Total P&L:        {:.2}", m.total_profit_loss);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown);
    eprintln!("Total Trades:     {}", m.total_trades);
    eprintln!("Win Rate:         {:.1}%", m.win_rate);
    eprintln!("Profit Factor:    {:.2}", m.profit_factor);
    eprintln!("Avg Hold:         {:.1}h", m.average_hold_time_secs / 3600.0);

    if !m.exit_reasons.is_empty() {
        eprintln!("\n=== Exit Reasons ===");
        for (reason, count) in &m.exit_reasons {
            eprintln!("  {:<12} {}", reason.as_str(), count);
        }
    }
}

fn format_unix(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
