use alloy::primitives::{Address, Bytes, B256};
use clap::{ArgAction, Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use tokenops_analysis::cost::{compare, totals, CostComparison, CostTotals};
use tokenops_analysis::describe::{describe_failure, DisplayUnits, EventView, ProjectionTable};
use tokenops_analysis::events::{DecodeFailure, DecodedEvent, EventCatalog, EventSummary};
use tokenops_analysis::units::{format_percent, format_units, ratio};
use tokenops_data::abi::load_abi;
use tokenops_data::reader::{lookback_start, ChainReader, TokenState, DEFAULT_LOOKBACK_BLOCKS};
use tokenops_data::{OperationCost, RawLogEntry};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

const RPC_URL_ENV: &str = "TOKEN_RPC_URL";
const TOKEN_ADDRESS_ENV: &str = "TOKEN_ADDRESS";

#[derive(Debug, Clone)]
struct AppContext {
    rpc_url: Option<String>,
    token_address: Option<String>,
}

impl AppContext {
    fn from_env() -> Self {
        Self {
            rpc_url: std::env::var(RPC_URL_ENV).ok(),
            token_address: std::env::var(TOKEN_ADDRESS_ENV).ok(),
        }
    }

    fn rpc_url(&self, command: &str) -> Result<&str> {
        self.rpc_url
            .as_deref()
            .ok_or_else(|| eyre!("{RPC_URL_ENV} is required for {command} command"))
    }

    fn token_address(&self) -> Result<Address> {
        let raw = self.token_address.as_deref().ok_or_else(|| {
            eyre!("{TOKEN_ADDRESS_ENV} is required for logs command; deploy the token first")
        })?;
        raw.parse()
            .wrap_err_with(|| format!("{TOKEN_ADDRESS_ENV} is not a valid address: {raw}"))
    }
}

#[derive(Parser, Debug)]
#[command(name = "tokenops")]
#[command(about = "Cost accounting and event inspection for a deployed token contract")]
#[command(version)]
struct Cli {
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare one batched call against the sequential calls it replaces.
    Compare(CompareArgs),
    /// Report gas and fees for a list of transactions.
    Costs(CostsArgs),
    /// Decode and summarize the token's recent event logs.
    Logs(LogsArgs),
    /// Decode a single raw log offline.
    Decode(DecodeArgs),
}

/// Arguments for the `compare` subcommand.
///
/// Figures are given either directly as `GAS[@PRICE]` or as transaction
/// hashes whose receipts are read over RPC.
#[derive(Args, Debug)]
struct CompareArgs {
    /// Batched call as GAS[@PRICE], e.g. 150000@20.
    #[arg(long)]
    batch: Option<OperationCost>,

    /// Sequential call as GAS[@PRICE]; repeat per call.
    #[arg(long)]
    sequential: Vec<OperationCost>,

    /// Hash of the batched transaction.
    #[arg(long)]
    batch_tx: Option<B256>,

    /// Hash of a sequential transaction; repeat per call, in execution order.
    #[arg(long)]
    sequential_tx: Vec<B256>,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct CostsArgs {
    /// Transaction hash; repeat per transaction.
    #[arg(long = "tx", required = true)]
    txs: Vec<B256>,
}

/// Display-unit overrides shared by log rendering commands.
#[derive(Args, Debug, Clone)]
struct UnitArgs {
    /// Decimal places of the token (default: read from the contract, else 18).
    #[arg(long)]
    decimals: Option<u8>,

    /// Token symbol (default: read from the contract, else CAMP).
    #[arg(long)]
    symbol: Option<String>,
}

impl UnitArgs {
    fn resolve(&self, state: Option<&TokenState>) -> DisplayUnits {
        let defaults = DisplayUnits::default();
        DisplayUnits {
            decimals: self
                .decimals
                .or(state.map(|state| state.decimals))
                .unwrap_or(defaults.decimals),
            symbol: self
                .symbol
                .clone()
                .or_else(|| state.map(|state| state.symbol.clone()))
                .unwrap_or(defaults.symbol),
        }
    }
}

#[derive(Args, Debug)]
struct LogsArgs {
    /// ABI JSON file (bare ABI array or compiler artifact).
    #[arg(long)]
    abi: PathBuf,

    /// Number of blocks to look back from the chain head.
    #[arg(long, default_value_t = DEFAULT_LOOKBACK_BLOCKS)]
    span: u64,

    #[command(flatten)]
    units: UnitArgs,

    /// Output format: table (default) or json.
    #[arg(long, default_value = "table")]
    output: String,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// ABI JSON file (bare ABI array or compiler artifact).
    #[arg(long)]
    abi: PathBuf,

    /// Log topic; repeat in order, selector first.
    #[arg(long = "topic")]
    topics: Vec<B256>,

    /// Non-indexed log data as hex.
    #[arg(long, default_value = "0x")]
    data: Bytes,

    #[command(flatten)]
    units: UnitArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet)?;

    let ctx = AppContext::from_env();

    match cli.command {
        Commands::Compare(args) => handle_compare(&ctx, args).await,
        Commands::Costs(args) => handle_costs(&ctx, args).await,
        Commands::Logs(args) => handle_logs(&ctx, args).await,
        Commands::Decode(args) => handle_decode(args),
    }
}

fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str()))
        .wrap_err("failed to initialize tracing filter")?;

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .wrap_err("failed to create progress style")?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn connected(reader: &Option<ChainReader>) -> Result<&ChainReader> {
    reader
        .as_ref()
        .ok_or_else(|| eyre!("RPC reader is not connected"))
}

async fn handle_compare(ctx: &AppContext, args: CompareArgs) -> Result<()> {
    if !args.sequential.is_empty() && !args.sequential_tx.is_empty() {
        return Err(eyre!(
            "use either --sequential figures or --sequential-tx hashes, not both"
        ));
    }

    let needs_rpc = args.batch_tx.is_some() || !args.sequential_tx.is_empty();
    let reader = if needs_rpc {
        Some(ChainReader::new(ctx.rpc_url("compare")?).await?)
    } else {
        None
    };

    let batch = match (args.batch, args.batch_tx) {
        (Some(_), Some(_)) => return Err(eyre!("use either --batch or --batch-tx, not both")),
        (Some(cost), None) => cost,
        (None, Some(hash)) => connected(&reader)?
            .fetch_cost(hash)
            .await
            .wrap_err("failed to read batched transaction cost")?,
        (None, None) => return Err(eyre!("one of --batch or --batch-tx is required")),
    };

    let sequential = if args.sequential_tx.is_empty() {
        args.sequential
    } else {
        connected(&reader)?
            .fetch_costs(&args.sequential_tx)
            .await
            .wrap_err("failed to read sequential transaction costs")?
    };

    if sequential.is_empty() {
        warn!("no sequential operations given; savings ratios are not applicable");
    }

    let comparison = compare(&batch, &sequential);

    match args.output.to_lowercase().as_str() {
        "table" => print_comparison_table(&comparison, &sequential),
        "json" => print_comparison_json(&comparison)?,
        _ => {
            return Err(eyre!(
                "unknown output format '{}'; use 'table' or 'json'",
                args.output
            ))
        }
    }

    info!(
        sequential_count = comparison.sequential_count,
        gas_saved = %comparison.gas_saved,
        fee_saved = %comparison.fee_saved,
        "compare command completed"
    );

    Ok(())
}

fn print_comparison_table(comparison: &CostComparison, sequential: &[OperationCost]) {
    if !sequential.is_empty() {
        let mut ops = Table::new();
        ops.load_preset(UTF8_BORDERS_ONLY);
        ops.set_header(vec!["Sequential #", "Gas Used", "Gas Price (wei)", "Fee (wei)"]);
        for (index, op) in sequential.iter().enumerate() {
            ops.add_row(vec![
                (index + 1).to_string(),
                op.gas_used().to_string(),
                op.effective_price().to_string(),
                op.fee().to_string(),
            ]);
        }
        println!("\n{ops}\n");
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Metric", "Batched", "Sequential", "Saved", "Efficiency"]);
    table.add_row(vec![
        "Gas".to_string(),
        comparison.batch_gas.to_string(),
        comparison.sequential_gas_total.to_string(),
        comparison.gas_saved.to_string(),
        comparison.gas_saved_ratio.to_string(),
    ]);
    table.add_row(vec![
        "Fee (wei)".to_string(),
        comparison.batch_fee.to_string(),
        comparison.sequential_fee_total.to_string(),
        comparison.fee_saved.to_string(),
        comparison.fee_saved_ratio.to_string(),
    ]);

    println!("{table}\n");
}

fn print_comparison_json(comparison: &CostComparison) -> Result<()> {
    #[derive(Serialize)]
    struct JsonComparison {
        batch_gas: String,
        batch_fee_wei: String,
        sequential_count: usize,
        sequential_gas_total: String,
        sequential_fee_total_wei: String,
        gas_saved: String,
        fee_saved_wei: String,
        gas_saved_ratio: Option<f64>,
        fee_saved_ratio: Option<f64>,
    }

    let output = JsonComparison {
        batch_gas: comparison.batch_gas.to_string(),
        batch_fee_wei: comparison.batch_fee.to_string(),
        sequential_count: comparison.sequential_count,
        sequential_gas_total: comparison.sequential_gas_total.to_string(),
        sequential_fee_total_wei: comparison.sequential_fee_total.to_string(),
        gas_saved: comparison.gas_saved.to_string(),
        fee_saved_wei: comparison.fee_saved.to_string(),
        gas_saved_ratio: comparison.gas_saved_ratio.value(),
        fee_saved_ratio: comparison.fee_saved_ratio.value(),
    };
    let json_str = serde_json::to_string_pretty(&output).wrap_err("failed to serialize JSON")?;
    println!("{json_str}");

    Ok(())
}

async fn handle_costs(ctx: &AppContext, args: CostsArgs) -> Result<()> {
    let reader = ChainReader::new(ctx.rpc_url("costs")?).await?;

    let pb = spinner("reading transaction receipts")?;
    let costs = reader
        .fetch_costs(&args.txs)
        .await
        .wrap_err("failed to read transaction costs")?;
    pb.finish_and_clear();

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Tx Hash", "Gas Used", "Gas Price (wei)", "Fee (wei)"]);
    for (hash, cost) in args.txs.iter().zip(&costs) {
        table.add_row(vec![
            truncate_hash(&format!("{hash:#x}")),
            cost.gas_used().to_string(),
            cost.effective_price().to_string(),
            cost.fee().to_string(),
        ]);
    }
    println!("\n{table}\n");

    let summary = totals(&costs);
    print_totals(&summary);

    info!(
        txs = summary.count,
        gas_total = %summary.gas_total,
        fee_total = %summary.fee_total,
        "costs command completed"
    );

    Ok(())
}

fn print_totals(summary: &CostTotals) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Transactions".to_string(), summary.count.to_string()]);
    table.add_row(vec!["Total Gas Used".to_string(), summary.gas_total.to_string()]);
    table.add_row(vec![
        "Average Gas Price (wei)".to_string(),
        summary.mean_price.to_string(),
    ]);
    table.add_row(vec!["Total Fee (wei)".to_string(), summary.fee_total.to_string()]);
    println!("{table}\n");
}

async fn handle_logs(ctx: &AppContext, args: LogsArgs) -> Result<()> {
    let token = ctx.token_address()?;
    let abi = load_abi(&args.abi)?;
    let catalog = EventCatalog::new(&abi);
    if catalog.is_empty() {
        warn!(abi = %args.abi.display(), "ABI declares no events; every log will count as unknown");
    }

    let reader = ChainReader::new(ctx.rpc_url("logs")?).await?;

    let pb = spinner("querying token logs")?;
    let latest_block = reader.latest_block().await?;
    let from_block = lookback_start(latest_block, args.span);
    let logs = reader.fetch_logs(token, from_block).await?;
    pb.set_message("reading token state");
    let state = match reader.token_state(token).await {
        Ok(state) => Some(state),
        Err(err) => {
            warn!(error = %err, "token state unavailable; using configured display units");
            None
        }
    };
    pb.finish_and_clear();

    let units = args.units.resolve(state.as_ref());
    let table = ProjectionTable::well_known();
    let (outcomes, summary) = catalog.classify(&logs);
    let rendered = render_logs(&table, &logs, outcomes, &units);

    match args.output.to_lowercase().as_str() {
        "table" => {
            println!(
                "Token {token:#x}: blocks {from_block}..={latest_block}, {} events\n",
                logs.len()
            );
            if logs.is_empty() {
                println!("No events found. Make sure you have executed some transactions.\n");
            }
            for (_, view) in &rendered {
                println!("{view}\n");
            }
            if !logs.is_empty() {
                print_summary_table(&summary);
            }
            if let Some(state) = &state {
                print_token_state(state, &units);
            }
        }
        "json" => print_logs_json(from_block, latest_block, &rendered, &summary, state.as_ref(), &units)?,
        _ => {
            return Err(eyre!(
                "unknown output format '{}'; use 'table' or 'json'",
                args.output
            ))
        }
    }

    info!(
        token = %token,
        from_block,
        latest_block,
        total_logs = summary.total_logs,
        decoded = summary.successfully_decoded,
        "logs command completed"
    );

    Ok(())
}

/// Renders every log from its decode outcome; undecodable logs get a failure view.
fn render_logs(
    table: &ProjectionTable,
    logs: &[RawLogEntry],
    outcomes: Vec<Result<DecodedEvent, DecodeFailure>>,
    units: &DisplayUnits,
) -> Vec<(Option<String>, EventView)> {
    logs.iter()
        .zip(outcomes)
        .map(|(entry, outcome)| match outcome {
            Ok(decoded) => {
                let view = table.describe(entry, &decoded, units);
                (Some(decoded.event_name), view)
            }
            Err(_) => (None, describe_failure(entry)),
        })
        .collect()
}

fn print_summary_table(summary: &EventSummary) {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Event", "Count"]);
    table.add_row(vec!["Total Events".to_string(), summary.total_logs.to_string()]);
    table.add_row(vec![
        "Successfully Decoded".to_string(),
        summary.successfully_decoded.to_string(),
    ]);
    for (event, count) in summary.counts() {
        table.add_row(vec![event.to_string(), count.to_string()]);
    }
    println!("{table}\n");
}

fn print_token_state(state: &TokenState, units: &DisplayUnits) {
    let utilization = ratio(state.total_supply, state.cap)
        .map(format_percent)
        .unwrap_or_else(|| "N/A".to_string());

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Contract State", "Value"]);
    table.add_row(vec![
        "Total Supply".to_string(),
        format!("{} {}", format_units(state.total_supply, units.decimals), units.symbol),
    ]);
    table.add_row(vec![
        "Token Cap".to_string(),
        format!("{} {}", format_units(state.cap, units.decimals), units.symbol),
    ]);
    table.add_row(vec![
        "Paused".to_string(),
        if state.paused { "Yes" } else { "No" }.to_string(),
    ]);
    table.add_row(vec!["Supply Utilization".to_string(), utilization]);
    println!("{table}\n");
}

fn print_logs_json(
    from_block: u64,
    latest_block: u64,
    rendered: &[(Option<String>, EventView)],
    summary: &EventSummary,
    state: Option<&TokenState>,
    units: &DisplayUnits,
) -> Result<()> {
    #[derive(Serialize)]
    struct JsonOutput {
        from_block: u64,
        latest_block: u64,
        events: Vec<JsonEvent>,
        summary: JsonSummary,
        token_state: Option<JsonTokenState>,
    }

    #[derive(Serialize)]
    struct JsonEvent {
        event: Option<String>,
        title: String,
        fields: Vec<JsonField>,
    }

    #[derive(Serialize)]
    struct JsonField {
        label: String,
        value: String,
    }

    #[derive(Serialize)]
    struct JsonSummary {
        total_logs: usize,
        successfully_decoded: usize,
        counts: Vec<JsonCount>,
    }

    #[derive(Serialize)]
    struct JsonCount {
        event: String,
        count: usize,
    }

    #[derive(Serialize)]
    struct JsonTokenState {
        total_supply: String,
        cap: String,
        paused: bool,
        decimals: u8,
        symbol: String,
        supply_utilization: Option<f64>,
    }

    let events = rendered
        .iter()
        .map(|(event, view)| JsonEvent {
            event: event.clone(),
            title: view.title.clone(),
            fields: view
                .lines
                .iter()
                .map(|(label, value)| JsonField {
                    label: label.clone(),
                    value: value.clone(),
                })
                .collect(),
        })
        .collect();

    let summary = JsonSummary {
        total_logs: summary.total_logs,
        successfully_decoded: summary.successfully_decoded,
        counts: summary
            .counts()
            .map(|(event, count)| JsonCount {
                event: event.to_string(),
                count,
            })
            .collect(),
    };

    let token_state = state.map(|state| JsonTokenState {
        total_supply: state.total_supply.to_string(),
        cap: state.cap.to_string(),
        paused: state.paused,
        decimals: units.decimals,
        symbol: units.symbol.clone(),
        supply_utilization: ratio(state.total_supply, state.cap),
    });

    let output = JsonOutput {
        from_block,
        latest_block,
        events,
        summary,
        token_state,
    };
    let json_str = serde_json::to_string_pretty(&output).wrap_err("failed to serialize JSON")?;
    println!("{json_str}");

    Ok(())
}

fn handle_decode(args: DecodeArgs) -> Result<()> {
    let abi = load_abi(&args.abi)?;
    let catalog = EventCatalog::new(&abi);
    let entry = RawLogEntry::new(args.topics, args.data);
    let units = args.units.resolve(None);

    match catalog.decode(&entry) {
        Ok(decoded) => {
            println!(
                "{}",
                ProjectionTable::well_known().describe(&entry, &decoded, &units)
            );
            info!(event = %decoded.event_name, "decode command completed");
        }
        Err(failure) => {
            println!("{}", describe_failure(&entry));
            println!("  Reason: {failure}");
            info!(%failure, "decode command completed without a match");
        }
    }

    Ok(())
}

/// Truncate a hex hash for compact table display.
fn truncate_hash(hash: &str) -> String {
    if hash.len() > 14 {
        format!("{}…{}", &hash[..8], &hash[hash.len() - 4..])
    } else {
        hash.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    #[test]
    fn cli_parses_offline_compare() {
        let cli = Cli::try_parse_from([
            "tokenops",
            "compare",
            "--batch",
            "150000@20",
            "--sequential",
            "60000@20",
            "--sequential",
            "60000@20",
        ])
        .unwrap();

        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.batch, Some(OperationCost::new(150_000, Some(20))));
                assert_eq!(args.sequential.len(), 2);
                assert_eq!(args.output, "table");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_negative_figures() {
        let err = Cli::try_parse_from(["tokenops", "compare", "--batch=-150000@20"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("must be non-negative"));

        let err = Cli::try_parse_from(["tokenops", "compare", "--sequential=60000@-20"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn render_logs_pairs_views_with_outcomes() {
        let abi = alloy::json_abi::JsonAbi::parse([
            "event Paused(address account)",
        ])
        .unwrap();
        let paused = RawLogEntry::new(
            vec![alloy::primitives::keccak256("Paused(address)")],
            Address::ZERO.into_word().to_vec(),
        )
        .with_provenance(7, B256::repeat_byte(0x07));
        let foreign = RawLogEntry::new(vec![B256::repeat_byte(0xee)], Bytes::new())
            .with_provenance(8, B256::repeat_byte(0x08));
        let logs = vec![paused, foreign];

        let (outcomes, summary) = EventCatalog::new(&abi).classify(&logs);
        let rendered = render_logs(
            &ProjectionTable::well_known(),
            &logs,
            outcomes,
            &DisplayUnits::default(),
        );

        assert_eq!(summary.total_logs, 2);
        assert_eq!(summary.successfully_decoded, 1);
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].0.as_deref(), Some("Paused"));
        assert_eq!(rendered[0].1.title, "[Block 7] Paused (tx: 0x07070707...)");
        assert_eq!(rendered[1].0, None);
        assert_eq!(rendered[1].1.title, "[Block 8] Unable to decode event");
    }

    #[test]
    fn unit_flags_override_contract_state() {
        let state = TokenState {
            total_supply: U256::from(1_u8),
            cap: U256::from(2_u8),
            paused: false,
            decimals: 6,
            symbol: "USDX".to_string(),
        };
        let flags = UnitArgs {
            decimals: None,
            symbol: Some("CAMP".to_string()),
        };

        let units = flags.resolve(Some(&state));
        assert_eq!(units.decimals, 6);
        assert_eq!(units.symbol, "CAMP");

        let fallback = UnitArgs {
            decimals: None,
            symbol: None,
        }
        .resolve(None);
        assert_eq!(fallback, DisplayUnits::default());
    }

    #[test]
    fn context_requires_configuration() {
        let ctx = AppContext {
            rpc_url: None,
            token_address: Some("not-an-address".to_string()),
        };
        assert!(ctx.rpc_url("logs").is_err());
        assert!(ctx.token_address().is_err());
    }

    #[test]
    fn truncates_long_hashes() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(truncate_hash(&hash), "0xababab…abab");
        assert_eq!(truncate_hash("0x1234"), "0x1234");
    }
}
