use anyhow::{bail, Context, Result};
use packdex_core::{
    count_by_rarity, openings_by_pack, CollectionStore, Event, EventBus, OpeningResult,
    PackSession, PurchaseOutcome, RarityTier, RevealPhase, RngState, SimulatedWallet,
    TransactionStatus, WalletSession,
};
use packdex_data::{open_session_parts, JsonFileStore, SessionOptions};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const FRAME_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Packs,
    Cards,
    Open,
    Stats,
    History,
    Transactions,
    Sync,
    Remove,
    Cui,
    Help,
}

impl Command {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "packs" | "ls" => Some(Self::Packs),
            "cards" => Some(Self::Cards),
            "open" => Some(Self::Open),
            "stats" | "progress" => Some(Self::Stats),
            "history" => Some(Self::History),
            "transactions" | "tx" => Some(Self::Transactions),
            "sync" => Some(Self::Sync),
            "remove" | "rm" => Some(Self::Remove),
            "cui" => Some(Self::Cui),
            "help" | "-h" | "--help" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    command: Command,
    target: Option<String>,
    seed: Option<u64>,
    wallet: Option<String>,
    assets: Option<PathBuf>,
    store: Option<PathBuf>,
    fast: bool,
    json: bool,
    count: usize,
    limit: usize,
}

fn parse_cli_options(args: &[String]) -> Result<CliOptions> {
    let mut options = CliOptions {
        command: Command::Help,
        target: None,
        seed: None,
        wallet: None,
        assets: None,
        store: None,
        fast: false,
        json: false,
        count: 1,
        limit: 20,
    };
    let mut command = None;
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = args[idx].as_str();
        let value = args.get(idx + 1);
        match arg {
            "--fast" => options.fast = true,
            "--json" => options.json = true,
            "--seed" | "--wallet" | "--assets" | "--store" | "--count" | "--limit"
            | "--pack" => {
                let Some(value) = value else {
                    bail!("{arg} needs a value");
                };
                match arg {
                    "--seed" => {
                        options.seed = Some(value.parse().with_context(|| format!("seed {value}"))?)
                    }
                    "--wallet" => options.wallet = Some(value.clone()),
                    "--assets" => options.assets = Some(PathBuf::from(value)),
                    "--store" => options.store = Some(PathBuf::from(value)),
                    "--count" => {
                        options.count = value.parse().with_context(|| format!("count {value}"))?
                    }
                    "--limit" => {
                        options.limit = value.parse().with_context(|| format!("limit {value}"))?
                    }
                    _ => options.target = Some(value.clone()),
                }
                idx += 1;
            }
            _ if command.is_none() => {
                command = Some(Command::parse(arg).with_context(|| format!("unknown command {arg}"))?);
            }
            _ if options.target.is_none() => options.target = Some(arg.to_string()),
            _ => bail!("unexpected argument {arg}"),
        }
        idx += 1;
    }
    options.command = command.unwrap_or(Command::Help);
    Ok(options)
}

type CliSession = PackSession<SimulatedWallet, JsonFileStore>;

fn build_session(options: &CliOptions) -> Result<CliSession> {
    let parts = open_session_parts(&SessionOptions {
        wallet: options.wallet.clone(),
        assets: options.assets.clone(),
        store: options.store.clone(),
    })?;
    Ok(PackSession::new(
        parts.assets.catalog,
        parts.assets.registry,
        parts.assets.config,
        parts.wallet,
        parts.store,
    ))
}

fn wallet_address(session: &CliSession) -> Result<String> {
    session
        .wallet()
        .public_key()
        .map(str::to_string)
        .context("wallet not connected")
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packdex_core=warn,packdex_data=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<()> {
    let options = parse_cli_options(args)?;
    match options.command {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Cui => {
            let launch = packdex_cui::LaunchOptions {
                seed: options.seed,
                wallet: options.wallet.clone(),
                assets: options.assets.clone(),
                store: options.store.clone(),
            };
            packdex_cui::run(launch).context("cui launch")
        }
        Command::Packs => {
            let session = build_session(&options)?;
            print_packs(&session);
            Ok(())
        }
        Command::Cards => {
            let session = build_session(&options)?;
            print_cards(&session, options.target.as_deref())
        }
        Command::Open => {
            let mut session = build_session(&options)?;
            run_open(&mut session, &options)
        }
        Command::Stats => {
            let session = build_session(&options)?;
            print_stats(&session, options.json)
        }
        Command::History => {
            let session = build_session(&options)?;
            print_history(&session, &options)
        }
        Command::Transactions => {
            let session = build_session(&options)?;
            print_transactions(&session)
        }
        Command::Sync => {
            let mut session = build_session(&options)?;
            let added = session.sync_collection()?;
            println!("synced {added} cards from opening history");
            Ok(())
        }
        Command::Remove => {
            let mut session = build_session(&options)?;
            remove_card(&mut session, options.target.as_deref())
        }
    }
}

fn remove_card(session: &mut CliSession, card_id: Option<&str>) -> Result<()> {
    let Some(card_id) = card_id else {
        bail!("remove needs a card id (see `packdex cards`)");
    };
    let wallet = wallet_address(session)?;
    if session.store_mut().remove_card(&wallet, card_id)? {
        println!("removed {card_id} from the album; `packdex sync` restores it from history");
    } else {
        println!("{card_id} is not in the album");
    }
    Ok(())
}

fn print_help() {
    println!("== PackDex ==");
    println!("usage: packdex <command> [target] [options]");
    println!();
    println!("commands:");
    println!("  packs                 list packs with price and card pool");
    println!("  cards [pack]          list catalog cards, optionally for one pack");
    println!("  open <pack>           buy and open a pack (--count N, --fast)");
    println!("  stats                 album completion per set and rarity (--json)");
    println!("  history [pack]        opening history grouped by pack (--limit N)");
    println!("  transactions          wallet transactions recorded for purchases");
    println!("  sync                  add cards from opening history missing in the album");
    println!("  remove <card>         drop a card from the album (history is kept)");
    println!("  cui                   launch the terminal album");
    println!();
    println!("options:");
    println!("  --seed N      deterministic draws");
    println!("  --wallet ADDR wallet address (env PACKDEX_WALLET)");
    println!("  --assets DIR  assets directory (env PACKDEX_ASSETS, default ./assets)");
    println!("  --store FILE  album file (env PACKDEX_STORE, default ~/.packdex_album.json)");
    println!("  --fast        skip the reveal animation");
    println!();
    println!("logging: set RUST_LOG, e.g. RUST_LOG=packdex_core=debug");
}

fn rarity_summary(counts: [usize; 4]) -> String {
    RarityTier::ALL
        .iter()
        .map(|tier| format!("{} {}", tier.symbol(), counts[tier.index()]))
        .collect::<Vec<_>>()
        .join("  ")
}

fn print_packs(session: &CliSession) {
    println!("== Packs ==");
    for pack in &session.registry().packs {
        let eligible = session.catalog().eligible_for(pack);
        let price = if pack.is_free() {
            "free".to_string()
        } else {
            format!("{:.2} SOL", pack.price_sol)
        };
        println!(
            "{:<30} {:<32} {:>9} | {:>3} cards | {}",
            pack.id,
            pack.name,
            price,
            eligible.len(),
            rarity_summary(count_by_rarity(&eligible))
        );
    }
}

fn print_cards(session: &CliSession, pack_id: Option<&str>) -> Result<()> {
    let cards = match pack_id {
        Some(id) => {
            let pack = session
                .registry()
                .pack(id)
                .with_context(|| format!("unknown pack {id}"))?;
            println!("== {} ==", pack.name);
            session.catalog().eligible_for(pack)
        }
        None => {
            println!("== Catalog ==");
            session.catalog().cards().to_vec()
        }
    };
    for card in &cards {
        println!(
            "{:<10} {:<5} {:<24} {:<10} {}",
            card.id,
            card.rarity.symbol(),
            card.name,
            card.element,
            card.pack
        );
    }
    println!("{} cards | {}", cards.len(), rarity_summary(count_by_rarity(&cards)));
    Ok(())
}

#[derive(Debug, Serialize)]
struct OpeningReport<'a> {
    pack_id: &'a str,
    card_id: &'a str,
    card_name: &'a str,
    rarity: &'a str,
    winning_position: usize,
    transaction_signature: Option<&'a str>,
}

fn run_open(session: &mut CliSession, options: &CliOptions) -> Result<()> {
    let Some(pack_id) = options.target.clone() else {
        bail!("open needs a pack id (see `packdex packs`)");
    };
    let mut rng = match options.seed {
        Some(seed) => RngState::from_seed(seed),
        None => RngState::from_entropy(),
    };
    if !options.json {
        println!("seed {}", rng.seed());
    }
    for _ in 0..options.count.max(1) {
        match session.purchase(&pack_id)? {
            PurchaseOutcome::Purchased(receipt) => {
                if !options.json {
                    println!(
                        "purchased {} for {} lamports ({})",
                        receipt.pack_id, receipt.lamports, receipt.signature
                    );
                }
            }
            PurchaseOutcome::Rejected => {
                println!("Transaction cancelled by user");
                return Ok(());
            }
        }
        let started = Instant::now();
        let winning_position = session
            .start_opening(&pack_id, &mut rng, started)?
            .winning_position;
        let result = if options.fast {
            let total = session.config().timing.total();
            session.tick(started + total)?;
            session.last_opened().cloned()
        } else {
            animate(session)?
        };
        let Some(result) = result else {
            bail!("opening of {pack_id} did not complete");
        };
        if options.json {
            print_report(&result, winning_position)?;
        } else {
            println!(
                "New Card Received: {} {} ({})",
                result.card.name,
                result.card.rarity.symbol(),
                result.card.rarity.label()
            );
        }
        drain_events(session.events_mut(), options.json);
    }
    Ok(())
}

/// Samples the reveal in real time, redrawing one status line per frame.
fn animate(session: &mut CliSession) -> Result<Option<OpeningResult>> {
    let mut stdout = io::stdout();
    let mut last_phase = None;
    while session.is_opening() {
        let Some(frame) = session.tick(Instant::now())? else {
            break;
        };
        let centered_name = session
            .active_controller()
            .and_then(|controller| controller.sequence().cards.get(frame.centered))
            .map(|card| format!("{} {}", card.name, card.rarity.symbol()));
        if let Some(name) = centered_name {
            write!(
                stdout,
                "\r{:>3.0}% [{:>2}] {:<32}",
                frame.progress * 100.0,
                frame.centered,
                name
            )?;
            stdout.flush()?;
        }
        if last_phase != Some(frame.phase) && frame.phase == RevealPhase::Revealed {
            writeln!(stdout)?;
        }
        last_phase = Some(frame.phase);
        if frame.completed {
            break;
        }
        std::thread::sleep(FRAME_INTERVAL);
    }
    Ok(session.last_opened().cloned())
}

fn print_report(result: &OpeningResult, winning_position: usize) -> Result<()> {
    let report = OpeningReport {
        pack_id: &result.pack_id,
        card_id: &result.card.id,
        card_name: &result.card.name,
        rarity: result.card.rarity.label(),
        winning_position,
        transaction_signature: result.transaction_signature.as_deref(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn drain_events(events: &mut EventBus, quiet: bool) {
    for event in events.drain() {
        if quiet {
            continue;
        }
        match event {
            Event::CardCollected {
                new_card: false, ..
            } => println!("event: duplicate card, album unchanged"),
            Event::MilestoneReached { total } => {
                println!("event: milestone reached, {total} cards collected")
            }
            _ => {}
        }
    }
}

fn print_stats(session: &CliSession, json: bool) -> Result<()> {
    let progress = session.progress()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
        return Ok(());
    }
    println!("== Album ==");
    println!(
        "{} / {} cards ({}%)",
        progress.total_collected, progress.catalog_size, progress.percent
    );
    println!("{}", rarity_summary(progress.by_rarity));
    println!("== Sets ==");
    for set in &progress.sets {
        println!(
            "{:<24} {:>3}/{:<3} {:>3}%",
            set.name, set.obtained, set.total, set.percent
        );
    }
    Ok(())
}

fn print_history(session: &CliSession, options: &CliOptions) -> Result<()> {
    let wallet = wallet_address(session)?;
    let grouped = openings_by_pack(session.store(), &wallet)?;
    if grouped.is_empty() {
        println!("no packs opened yet");
        return Ok(());
    }
    for (pack_id, rows) in grouped {
        if options.target.as_deref().is_some_and(|target| target != pack_id) {
            continue;
        }
        println!("== {pack_id} ({} opened) ==", rows.len());
        for row in rows.iter().take(options.limit) {
            println!(
                "#{:<5} {:<5} {:<24} {}",
                row.seq,
                row.rarity.symbol(),
                row.card_name,
                row.transaction_signature.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

fn print_transactions(session: &CliSession) -> Result<()> {
    let wallet = wallet_address(session)?;
    let rows = session.store().transactions(&wallet)?;
    println!("== Transactions ==");
    for row in &rows {
        let status = match row.status {
            TransactionStatus::Confirmed => "confirmed",
            TransactionStatus::Failed => "failed",
        };
        println!(
            "{:<40} {:<30} {:>12} lamports {:<9} {}",
            row.signature,
            row.pack_id,
            row.lamports,
            status,
            row.error.as_deref().unwrap_or("")
        );
    }
    println!("{} transactions", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_open_with_flags() {
        let options =
            parse_cli_options(&args(&["open", "a1-mewtwo", "--seed", "9", "--fast", "--count", "3"]))
                .expect("parse");
        assert_eq!(options.command, Command::Open);
        assert_eq!(options.target.as_deref(), Some("a1-mewtwo"));
        assert_eq!(options.seed, Some(9));
        assert!(options.fast);
        assert_eq!(options.count, 3);
    }

    #[test]
    fn pack_flag_sets_target() {
        let options = parse_cli_options(&args(&["history", "--pack", "promo-a"])).expect("parse");
        assert_eq!(options.command, Command::History);
        assert_eq!(options.target.as_deref(), Some("promo-a"));
    }

    #[test]
    fn remove_takes_a_card_id() {
        let options = parse_cli_options(&args(&["rm", "a1-001"])).expect("parse");
        assert_eq!(options.command, Command::Remove);
        assert_eq!(options.target.as_deref(), Some("a1-001"));
    }

    #[test]
    fn empty_args_show_help() {
        let options = parse_cli_options(&[]).expect("parse");
        assert_eq!(options.command, Command::Help);
    }

    #[test]
    fn rejects_unknown_command_and_bad_seed() {
        assert!(parse_cli_options(&args(&["shuffle"])).is_err());
        assert!(parse_cli_options(&args(&["open", "--seed", "x"])).is_err());
        assert!(parse_cli_options(&args(&["open", "--seed"])).is_err());
    }
}
