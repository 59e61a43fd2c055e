//! CLI definition and dispatch.

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use crate::adapters::csv_adapter::CsvTradeAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_store_adapter::JsonStoreAdapter;
use crate::adapters::text_report_adapter::{TextReportAdapter, fmt_money, fmt_profit_factor};
use crate::domain::account::Account;
use crate::domain::error::TradesyncError;
use crate::domain::journal::JournalNote;
use crate::domain::metrics::{self, Summary, r_multiple, trade_pnl};
use crate::domain::strategy::{Strategy, StrategyPerformance};
use crate::domain::trade::{Direction, Trade};
use crate::domain::weekly_bias::{self, BiasDirection, WeeklyBias};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::{JournalReport, ReportPort};
use crate::ports::store_port::StorePort;

#[derive(Parser, Debug)]
#[command(name = "tradesync", about = "Trading journal and performance analytics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a trade
    Log {
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        trade: TradeArgs,
    },
    /// List recent trades, newest first
    List {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        instrument: Option<String>,
        #[arg(long)]
        strategy: Option<String>,
        /// Only trades with pnl > 0
        #[arg(long)]
        winners: bool,
        /// Only trades with pnl <= 0 (breakeven counts as a loss)
        #[arg(long)]
        losers: bool,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Aggregate performance summary
    Summary {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        account: Option<String>,
    },
    /// Write a report file
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Export the trade list as CSV instead of a text report
        #[arg(long)]
        csv: bool,
    },
    /// Import trades from a CSV file
    Import {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        input: PathBuf,
    },
    /// List prop-firm accounts with their risk status
    Accounts {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Add a prop-firm account
    AddAccount {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        firm: String,
        #[arg(long, default_value_t = 100_000.0)]
        capital: f64,
        #[arg(long, default_value_t = 5.0)]
        max_daily_drawdown: f64,
        #[arg(long, default_value_t = 10.0)]
        max_overall_drawdown: f64,
        #[arg(long, default_value_t = 0.0)]
        profit_target: f64,
        #[arg(long, default_value_t = 0)]
        min_trading_days: u32,
    },
    /// List strategies with recomputed performance
    Strategies {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Add a strategy with its rules
    AddStrategy {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        created: String,
        /// Repeatable, in order
        #[arg(long = "rule")]
        rules: Vec<String>,
    },
    /// Weekly bias board
    Bias {
        #[arg(short, long)]
        config: PathBuf,
        #[command(subcommand)]
        action: BiasAction,
    },
    /// Daily journal notes
    Note {
        #[arg(short, long)]
        config: PathBuf,
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Sync with the journal backend
    Sync {
        #[arg(short, long)]
        config: PathBuf,
        /// Push local records instead of pulling
        #[arg(long)]
        push: bool,
    },
    /// Live price quotes
    Quotes {
        #[arg(short, long)]
        config: PathBuf,
        /// Symbols; falls back to [quotes] symbols in the config
        symbols: Vec<String>,
        /// Stream pushed updates instead of a one-shot lookup
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Args, Debug)]
pub struct TradeArgs {
    #[arg(long)]
    pub instrument: String,
    /// long/buy or short/sell
    #[arg(long)]
    pub direction: String,
    /// YYYY-MM-DD
    #[arg(long)]
    pub date: String,
    /// HH:MM, for time-of-day analytics
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub entry: Option<f64>,
    #[arg(long)]
    pub exit: Option<f64>,
    #[arg(long)]
    pub size: Option<f64>,
    #[arg(long)]
    pub fees: Option<f64>,
    #[arg(long)]
    pub risk: Option<f64>,
    /// Precomputed P&L, for trades logged without raw prices
    #[arg(long)]
    pub pnl: Option<f64>,
    #[arg(long)]
    pub account: Option<String>,
    #[arg(long)]
    pub strategy: Option<String>,
    #[arg(long)]
    pub emotion: Option<String>,
    #[arg(long)]
    pub stop_loss: Option<f64>,
    #[arg(long)]
    pub take_profit: Option<f64>,
    #[arg(long)]
    pub rationale: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum BiasAction {
    /// Record a bias for one instrument and week
    Add {
        #[arg(long)]
        instrument: String,
        /// Monday of the week, YYYY-MM-DD
        #[arg(long)]
        week_start: String,
        /// bullish, bearish or neutral
        #[arg(long)]
        bias: String,
        #[arg(long, default_value_t = 50)]
        confidence: u8,
        #[arg(long = "expecting")]
        expecting: Vec<String>,
        #[arg(long = "not-expecting")]
        not_expecting: Vec<String>,
        #[arg(long = "support")]
        support: Vec<String>,
        #[arg(long = "resistance")]
        resistance: Vec<String>,
        #[arg(long = "entry-zone")]
        entry_zones: Vec<String>,
        #[arg(long = "target")]
        targets: Vec<String>,
        #[arg(long)]
        invalidation: Option<String>,
    },
    /// List recorded biases, newest week first
    List,
    /// Show the bias covering an instrument on a date
    Show {
        #[arg(long)]
        instrument: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NoteAction {
    Add {
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        content: String,
    },
    List {
        /// Restrict to one day, YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Log { config, trade } => run_log(&config, &trade),
        Command::List {
            config,
            account,
            instrument,
            strategy,
            winners,
            losers,
            limit,
        } => run_list(
            &config,
            account.as_deref(),
            instrument.as_deref(),
            strategy.as_deref(),
            winners,
            losers,
            limit,
        ),
        Command::Summary { config, account } => run_summary(&config, account.as_deref()),
        Command::Report {
            config,
            output,
            csv,
        } => run_report(&config, output.as_ref(), csv),
        Command::Import { config, input } => run_import(&config, &input),
        Command::Accounts { config } => run_accounts(&config),
        Command::AddAccount {
            config,
            name,
            firm,
            capital,
            max_daily_drawdown,
            max_overall_drawdown,
            profit_target,
            min_trading_days,
        } => run_add_account(
            &config,
            name,
            firm,
            capital,
            max_daily_drawdown,
            max_overall_drawdown,
            profit_target,
            min_trading_days,
        ),
        Command::Strategies { config } => run_strategies(&config),
        Command::AddStrategy {
            config,
            name,
            created,
            rules,
        } => run_add_strategy(&config, name, &created, rules),
        Command::Bias { config, action } => run_bias(&config, action),
        Command::Note { config, action } => run_note(&config, action),
        Command::Sync { config, push } => run_sync(&config, push),
        Command::Quotes {
            config,
            symbols,
            watch,
        } => run_quotes(&config, symbols, watch),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TradesyncError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn open_store(config: &FileConfigAdapter) -> Result<JsonStoreAdapter, ExitCode> {
    JsonStoreAdapter::from_config(config).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn fail(err: &TradesyncError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// Read path for views: a store that fails to parse degrades to the empty
/// collection with a warning instead of taking the whole command down.
fn load_trades_lenient(store: &dyn StorePort) -> Vec<Trade> {
    match store.load_trades() {
        Ok(trades) => trades,
        Err(e) => {
            log::warn!("falling back to empty trade list: {e}");
            eprintln!("warning: {e} (showing empty journal)");
            Vec::new()
        }
    }
}

pub fn parse_date_arg(value: &str, field: &str) -> Result<NaiveDate, TradesyncError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| TradesyncError::InvalidInput {
        field: field.to_string(),
        reason: format!("{value:?} is not a YYYY-MM-DD date"),
    })
}

/// Form-level validation for `log`. Required fields and sign checks live
/// here; the metric engine itself stays lenient.
pub fn build_trade(args: &TradeArgs) -> Result<Trade, TradesyncError> {
    if args.instrument.trim().is_empty() {
        return Err(TradesyncError::InvalidInput {
            field: "instrument".into(),
            reason: "instrument is required".into(),
        });
    }
    let direction =
        Direction::from_str(&args.direction).map_err(|reason| TradesyncError::InvalidInput {
            field: "direction".into(),
            reason,
        })?;
    let date = parse_date_arg(&args.date, "date")?;

    let positive = |value: Option<f64>, field: &str| -> Result<(), TradesyncError> {
        match value {
            Some(v) if v <= 0.0 => Err(TradesyncError::InvalidInput {
                field: field.to_string(),
                reason: "must be positive".into(),
            }),
            _ => Ok(()),
        }
    };
    positive(args.entry, "entry")?;
    positive(args.exit, "exit")?;
    positive(args.size, "size")?;
    positive(args.risk, "risk")?;
    if args.fees.is_some_and(|f| f < 0.0) {
        return Err(TradesyncError::InvalidInput {
            field: "fees".into(),
            reason: "must be non-negative".into(),
        });
    }

    let mut trade = Trade::new(args.instrument.trim().to_uppercase(), direction, date);
    if let Some(time) = &args.time {
        let parsed =
            NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| TradesyncError::InvalidInput {
                field: "time".into(),
                reason: format!("{time:?} is not a HH:MM time"),
            })?;
        trade.entry_time = Some(date.and_time(parsed));
    }
    trade.entry_price = args.entry;
    trade.exit_price = args.exit;
    trade.size = args.size;
    trade.fees = args.fees.unwrap_or(0.0);
    trade.risk_amount = args.risk;
    trade.stop_loss = args.stop_loss;
    trade.take_profit = args.take_profit;
    trade.account = args.account.clone();
    trade.strategy_tag = args.strategy.clone();
    trade.pre_emotion = args.emotion.clone();
    trade.rationale = args.rationale.clone();

    // Persist a P&L alongside the raw prices, or the caller-provided one for
    // price-less records. Full precision; rounding is presentation-only.
    trade.stored_pnl = match args.pnl {
        Some(pnl) => Some(pnl),
        None if trade.entry_price.is_some()
            && trade.exit_price.is_some()
            && trade.size.is_some() =>
        {
            Some(trade_pnl(&trade))
        }
        None => None,
    };

    Ok(trade)
}

fn run_log(config_path: &PathBuf, args: &TradeArgs) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let trade = match build_trade(args) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    // Mutations never degrade: a corrupt store must not be silently replaced.
    let mut trades = match store.load_trades() {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    let pnl = trade_pnl(&trade);
    let r = r_multiple(&trade, pnl);
    trades.push(trade.clone());

    if let Err(e) = store.save_trades(&trades) {
        return fail(&e);
    }

    eprintln!(
        "Logged {} {} on {}: {} ({:.2}R)",
        trade.instrument,
        trade.direction,
        trade.date,
        fmt_money(pnl),
        r,
    );
    ExitCode::SUCCESS
}

#[allow(clippy::too_many_arguments)]
fn run_list(
    config_path: &PathBuf,
    account: Option<&str>,
    instrument: Option<&str>,
    strategy: Option<&str>,
    winners: bool,
    losers: bool,
    limit: usize,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mut trades = load_trades_lenient(&store);
    trades.retain(|t| {
        let pnl = trade_pnl(t);
        account.is_none_or(|a| t.account.as_deref() == Some(a))
            && instrument.is_none_or(|i| t.instrument.eq_ignore_ascii_case(i))
            && strategy.is_none_or(|s| t.strategy_tag.as_deref() == Some(s))
            && (!winners || pnl > 0.0)
            && (!losers || pnl <= 0.0)
    });

    // Recent-trades order: date descending.
    trades.sort_by(|a, b| b.date.cmp(&a.date));
    trades.truncate(limit);

    if trades.is_empty() {
        eprintln!("No trades match.");
        return ExitCode::SUCCESS;
    }

    for trade in &trades {
        let pnl = trade_pnl(trade);
        let r = r_multiple(trade, pnl);
        println!(
            "{}  {:<8} {:<5} {:>12}  {:>6.2}R  {}",
            trade.date,
            trade.instrument,
            trade.direction,
            fmt_money(pnl),
            r,
            trade.strategy_tag.as_deref().unwrap_or("-"),
        );
    }
    eprintln!("{} trades shown", trades.len());
    ExitCode::SUCCESS
}

fn run_summary(config_path: &PathBuf, account: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mut trades = load_trades_lenient(&store);
    if let Some(account) = account {
        trades.retain(|t| t.account.as_deref() == Some(account));
    }
    // Streaks and drawdown are defined over date-ascending order.
    trades.sort_by_key(|t| t.date);

    let summary = Summary::aggregate(&trades);

    eprintln!("=== Aggregate Results ===");
    eprintln!("Total Trades:     {}", summary.total_trades);
    eprintln!(
        "Wins / Losses:    {} / {}",
        summary.winning_trades, summary.losing_trades
    );
    eprintln!("Win Rate:         {:.1}%", summary.win_rate);
    eprintln!("Total P&L:        {}", fmt_money(summary.total_pnl));
    eprintln!("Avg R-Multiple:   {:.2}R", summary.average_r_multiple);
    eprintln!(
        "Profit Factor:    {}",
        fmt_profit_factor(summary.profit_factor)
    );
    eprintln!("Best Trade:       {}", fmt_money(summary.best_trade));
    eprintln!("Worst Trade:      {}", fmt_money(summary.worst_trade));
    eprintln!("Max Win Streak:   {}", summary.max_win_streak);
    eprintln!("Max Loss Streak:  {}", summary.max_loss_streak);
    eprintln!("Volatility:       {:.2}", summary.volatility);

    // Drawdown needs a starting equity: the account's capital when one is
    // selected, otherwise an optional [journal] starting_equity.
    let start_equity = match account {
        Some(name) => {
            let accounts = store.load_accounts().unwrap_or_else(|e| {
                log::warn!("accounts unavailable: {e}");
                Vec::new()
            });
            accounts
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.capital_size)
                .unwrap_or(0.0)
        }
        None => config.get_double("journal", "starting_equity", 0.0),
    };
    if start_equity > 0.0 {
        let dd = metrics::max_drawdown(&trades, start_equity);
        eprintln!("Max Drawdown:     -{:.1}%", dd * 100.0);
    }

    let by_strategy = metrics::by_strategy(&trades);
    if !by_strategy.is_empty() {
        eprintln!("\n=== By Strategy ===");
        for (name, group) in &by_strategy {
            eprintln!(
                "  {}: {} trades, {:.1}% win rate, {}",
                name,
                group.total_trades,
                group.win_rate,
                fmt_money(group.total_pnl),
            );
        }
    }

    let by_instrument = metrics::by_instrument(&trades);
    if !by_instrument.is_empty() {
        eprintln!("\n=== By Instrument ===");
        for (name, group) in &by_instrument {
            eprintln!(
                "  {}: {} trades, {:.1}% win rate, {}",
                name,
                group.total_trades,
                group.win_rate,
                fmt_money(group.total_pnl),
            );
        }
    }

    let by_hour = metrics::by_hour(&trades);
    if !by_hour.is_empty() {
        eprintln!("\n=== By Hour of Entry ===");
        for (hour, group) in &by_hour {
            eprintln!(
                "  {:02}:00: {} trades, {}",
                hour,
                group.total_trades,
                fmt_money(group.total_pnl),
            );
        }
    }

    ExitCode::SUCCESS
}

fn run_report(config_path: &PathBuf, output: Option<&PathBuf>, csv: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let mut trades = load_trades_lenient(&store);
    trades.sort_by_key(|t| t.date);

    let summary = Summary::aggregate(&trades);
    let by_strategy = metrics::by_strategy(&trades);
    let by_instrument = metrics::by_instrument(&trades);
    let by_day = metrics::by_day(&trades);

    let mut listing = trades.clone();
    listing.sort_by(|a, b| b.date.cmp(&a.date));

    let report = JournalReport {
        summary: &summary,
        by_strategy: &by_strategy,
        by_instrument: &by_instrument,
        by_day: &by_day,
        trades: &listing,
    };

    let default_name = if csv { "trades.csv" } else { "report.txt" };
    let output = output
        .cloned()
        .unwrap_or_else(|| PathBuf::from(default_name));
    let output_str = output.display().to_string();

    let result = if csv {
        CsvTradeAdapter.write(&report, &output_str)
    } else {
        TextReportAdapter.write(&report, &output_str)
    };

    match result {
        Ok(()) => {
            eprintln!("Report written to: {output_str}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_import(config_path: &PathBuf, input: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let imported = match CsvTradeAdapter.import(input) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    let mut trades = match store.load_trades() {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };

    let count = imported.len();
    trades.extend(imported);
    if let Err(e) = store.save_trades(&trades) {
        return fail(&e);
    }

    eprintln!("Imported {count} trades from {}", input.display());
    ExitCode::SUCCESS
}

fn run_accounts(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let accounts = match store.load_accounts() {
        Ok(a) => a,
        Err(e) => {
            log::warn!("falling back to empty account list: {e}");
            eprintln!("warning: {e} (showing no accounts)");
            Vec::new()
        }
    };

    if accounts.is_empty() {
        eprintln!("No accounts recorded.");
        return ExitCode::SUCCESS;
    }

    for account in &accounts {
        println!(
            "{} ({}): balance ${:.2}, daily DD {:.1}%/{:.1}%, overall DD {:.1}%/{:.1}% [{}]",
            account.name,
            account.prop_firm,
            account.balance,
            account.daily_drawdown_pct(),
            account.max_daily_drawdown,
            account.overall_drawdown_pct(),
            account.max_overall_drawdown,
            account.risk_status().as_str(),
        );
    }
    ExitCode::SUCCESS
}

#[allow(clippy::too_many_arguments)]
fn run_add_account(
    config_path: &PathBuf,
    name: String,
    firm: String,
    capital: f64,
    max_daily_drawdown: f64,
    max_overall_drawdown: f64,
    profit_target: f64,
    min_trading_days: u32,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let account = match Account::new(
        name,
        firm,
        capital,
        max_daily_drawdown,
        max_overall_drawdown,
        profit_target,
        min_trading_days,
    ) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let mut accounts = match store.load_accounts() {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    if accounts.iter().any(|a| a.name == account.name) {
        return fail(&TradesyncError::InvalidInput {
            field: "name".into(),
            reason: format!("account {:?} already exists", account.name),
        });
    }

    let label = format!("{} ({})", account.name, account.prop_firm);
    accounts.push(account);
    if let Err(e) = store.save_accounts(&accounts) {
        return fail(&e);
    }
    eprintln!("Added account {label}");
    ExitCode::SUCCESS
}

fn run_strategies(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let strategies = match store.load_strategies() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("falling back to empty strategy list: {e}");
            eprintln!("warning: {e} (showing no strategies)");
            Vec::new()
        }
    };

    if strategies.is_empty() {
        eprintln!("No strategies recorded.");
        return ExitCode::SUCCESS;
    }

    let trades = load_trades_lenient(&store);

    for strategy in &strategies {
        let perf = StrategyPerformance::compute(&strategy.name, &trades);
        let s = &perf.summary;
        println!(
            "{}: {} trades, {:.1}% win rate, {}, {:.2}R avg, PF {}, max DD {:.1}%",
            strategy.name,
            s.total_trades,
            s.win_rate,
            fmt_money(s.total_pnl),
            s.average_r_multiple,
            fmt_profit_factor(s.profit_factor),
            perf.max_drawdown * 100.0,
        );
        for rule in &strategy.rules {
            println!("    - {rule}");
        }
        for trade in &perf.recent_trades {
            println!(
                "    {} {} {}",
                trade.date,
                trade.instrument,
                fmt_money(trade_pnl(trade))
            );
        }
    }
    ExitCode::SUCCESS
}

fn run_add_strategy(
    config_path: &PathBuf,
    name: String,
    created: &str,
    rules: Vec<String>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let created = match parse_date_arg(created, "created") {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let strategy = match Strategy::new(name, rules, created) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let mut strategies = match store.load_strategies() {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    if strategies.iter().any(|s| s.name == strategy.name) {
        return fail(&TradesyncError::InvalidInput {
            field: "name".into(),
            reason: format!("strategy {:?} already exists", strategy.name),
        });
    }

    let label = format!("{} with {} rules", strategy.name, strategy.rules.len());
    strategies.push(strategy);
    if let Err(e) = store.save_strategies(&strategies) {
        return fail(&e);
    }
    eprintln!("Added strategy {label}");
    ExitCode::SUCCESS
}

fn run_bias(config_path: &PathBuf, action: BiasAction) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match action {
        BiasAction::Add {
            instrument,
            week_start,
            bias,
            confidence,
            expecting,
            not_expecting,
            support,
            resistance,
            entry_zones,
            targets,
            invalidation,
        } => {
            let week_start = match parse_date_arg(&week_start, "week_start") {
                Ok(d) => d,
                Err(e) => return fail(&e),
            };
            let direction = match BiasDirection::from_str(&bias) {
                Ok(d) => d,
                Err(reason) => {
                    return fail(&TradesyncError::InvalidInput {
                        field: "bias".into(),
                        reason,
                    });
                }
            };

            let mut record = match WeeklyBias::new(
                instrument.trim().to_uppercase(),
                week_start,
                direction,
                confidence,
            ) {
                Ok(b) => b,
                Err(e) => return fail(&e),
            };
            record.expecting_scenarios = expecting;
            record.not_expecting_scenarios = not_expecting;
            record.key_levels.support = support;
            record.key_levels.resistance = resistance;
            record.trade_plan.entry_zones = entry_zones;
            record.trade_plan.targets = targets;
            record.trade_plan.invalidation = invalidation.unwrap_or_default();

            let mut biases = match store.load_weekly_biases() {
                Ok(b) => b,
                Err(e) => return fail(&e),
            };
            let label = format!(
                "{} bias for {} week of {}",
                record.overall_bias, record.instrument, record.week_start
            );
            biases.push(record);
            if let Err(e) = store.save_weekly_biases(&biases) {
                return fail(&e);
            }
            eprintln!("Recorded {label}");
            ExitCode::SUCCESS
        }
        BiasAction::List => {
            let mut biases = match store.load_weekly_biases() {
                Ok(b) => b,
                Err(e) => {
                    log::warn!("falling back to empty bias list: {e}");
                    eprintln!("warning: {e} (showing no biases)");
                    Vec::new()
                }
            };
            if biases.is_empty() {
                eprintln!("No weekly biases recorded.");
                return ExitCode::SUCCESS;
            }
            biases.sort_by(|a, b| b.week_start.cmp(&a.week_start));
            for bias in &biases {
                println!(
                    "{} week of {}: {} ({}% confidence)",
                    bias.instrument, bias.week_start, bias.overall_bias, bias.confidence
                );
            }
            ExitCode::SUCCESS
        }
        BiasAction::Show { instrument, date } => {
            let date = match parse_date_arg(&date, "date") {
                Ok(d) => d,
                Err(e) => return fail(&e),
            };
            let biases = match store.load_weekly_biases() {
                Ok(b) => b,
                Err(e) => return fail(&e),
            };

            match weekly_bias::for_date(&biases, &instrument.to_uppercase(), date) {
                Some(bias) => {
                    println!(
                        "{} week of {} to {}: {} ({}% confidence)",
                        bias.instrument,
                        bias.week_start,
                        bias.week_end,
                        bias.overall_bias,
                        bias.confidence
                    );
                    for s in &bias.expecting_scenarios {
                        println!("  expecting: {s}");
                    }
                    for s in &bias.not_expecting_scenarios {
                        println!("  not expecting: {s}");
                    }
                    for level in &bias.key_levels.support {
                        println!("  support: {level}");
                    }
                    for level in &bias.key_levels.resistance {
                        println!("  resistance: {level}");
                    }
                    if !bias.trade_plan.invalidation.is_empty() {
                        println!("  invalidation: {}", bias.trade_plan.invalidation);
                    }
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!("No bias covers {} on {}", instrument, date);
                    ExitCode::SUCCESS
                }
            }
        }
    }
}

fn run_note(config_path: &PathBuf, action: NoteAction) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let store = match open_store(&config) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match action {
        NoteAction::Add { date, content } => {
            let date = match parse_date_arg(&date, "date") {
                Ok(d) => d,
                Err(e) => return fail(&e),
            };
            let note = match JournalNote::new(date, content) {
                Ok(n) => n,
                Err(e) => return fail(&e),
            };

            let mut notes = match store.load_notes() {
                Ok(n) => n,
                Err(e) => return fail(&e),
            };
            let day = note.date;
            notes.push(note);
            if let Err(e) = store.save_notes(&notes) {
                return fail(&e);
            }
            eprintln!("Noted {day} entry");
            ExitCode::SUCCESS
        }
        NoteAction::List { date } => {
            let filter = match date.as_deref().map(|d| parse_date_arg(d, "date")) {
                Some(Ok(d)) => Some(d),
                Some(Err(e)) => return fail(&e),
                None => None,
            };

            let mut notes = match store.load_notes() {
                Ok(n) => n,
                Err(e) => {
                    log::warn!("falling back to empty note list: {e}");
                    eprintln!("warning: {e} (showing no notes)");
                    Vec::new()
                }
            };
            if let Some(day) = filter {
                notes.retain(|n| n.date == day);
            }
            notes.sort_by(|a, b| b.date.cmp(&a.date));

            if notes.is_empty() {
                eprintln!("No notes.");
                return ExitCode::SUCCESS;
            }
            for note in &notes {
                println!("{}  {}", note.date, note.content);
            }
            ExitCode::SUCCESS
        }
    }
}

fn run_sync(config_path: &PathBuf, push: bool) -> ExitCode {
    #[cfg(feature = "sync")]
    {
        use crate::adapters::backend_sync_adapter::BackendSyncAdapter;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        if !config.get_bool("backend", "enabled", true) {
            eprintln!("Backend sync is disabled in the config.");
            return ExitCode::SUCCESS;
        }

        let store = match open_store(&config) {
            Ok(s) => s,
            Err(code) => return code,
        };
        let backend = match BackendSyncAdapter::from_config(&config) {
            Ok(b) => b,
            Err(e) => return fail(&e),
        };

        if push {
            match backend.push_all(&store) {
                Ok(count) => {
                    eprintln!("Pushed {count} records");
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e),
            }
        } else {
            // Best effort: per-collection failures keep the local copy.
            let outcome = backend.pull_all(&store);
            eprintln!(
                "Pulled: {}",
                if outcome.pulled.is_empty() {
                    "nothing".to_string()
                } else {
                    outcome.pulled.join(", ")
                }
            );
            if !outcome.failed.is_empty() {
                eprintln!("Kept local (backend unavailable): {}", outcome.failed.join(", "));
            }
            ExitCode::SUCCESS
        }
    }

    #[cfg(not(feature = "sync"))]
    {
        let _ = (config_path, push);
        eprintln!("error: sync feature is required for sync");
        ExitCode::from(1)
    }
}

fn run_quotes(config_path: &PathBuf, symbols: Vec<String>, watch: bool) -> ExitCode {
    #[cfg(feature = "quotes")]
    {
        use crate::adapters::quote_client::{QuoteApi, QuoteEvent, QuoteStream};
        use crate::domain::metrics::unrealized_pnl;

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let symbols: Vec<String> = if symbols.is_empty() {
            config.get_list("quotes", "symbols")
        } else {
            symbols.iter().map(|s| s.to_uppercase()).collect()
        };
        if symbols.is_empty() {
            return fail(&TradesyncError::InvalidInput {
                field: "symbols".into(),
                reason: "no symbols given and none configured".into(),
            });
        }

        if watch {
            let mut stream = match QuoteStream::from_config(&config, symbols) {
                Ok(s) => s,
                Err(e) => return fail(&e),
            };
            eprintln!("Streaming quotes (ctrl-c to stop)...");
            loop {
                match stream.next_event() {
                    QuoteEvent::Quote(q) => {
                        println!("{}  bid {:.5}  ask {:.5}  mid {:.5}", q.symbol, q.bid, q.ask, q.mid);
                    }
                    QuoteEvent::Disconnected { reason } => {
                        eprintln!("Stream closed: {reason}");
                        return ExitCode::SUCCESS;
                    }
                }
            }
        }

        let api = match QuoteApi::from_config(&config) {
            Ok(a) => a,
            Err(e) => return fail(&e),
        };
        let quotes = match api.live_prices(&symbols) {
            Ok(q) => q,
            Err(e) => return fail(&e),
        };

        for quote in &quotes {
            println!(
                "{}  bid {:.5}  ask {:.5}  mid {:.5}",
                quote.symbol, quote.bid, quote.ask, quote.mid
            );
        }

        // Mark any open positions in the journal against the fresh mids.
        if let Ok(store) = open_store(&config) {
            let open_trades: Vec<Trade> = load_trades_lenient(&store)
                .into_iter()
                .filter(|t| t.is_open())
                .collect();
            for trade in &open_trades {
                if let Some(quote) = quotes.iter().find(|q| q.symbol == trade.instrument) {
                    eprintln!(
                        "  open {} {}: {}",
                        trade.instrument,
                        trade.direction,
                        fmt_money(unrealized_pnl(trade, quote.mid)),
                    );
                }
            }
        }

        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "quotes"))]
    {
        let _ = (config_path, symbols, watch);
        eprintln!("error: quotes feature is required for quotes");
        ExitCode::from(1)
    }
}
