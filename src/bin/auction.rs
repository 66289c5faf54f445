//! Interactive call-auction book CLI.
//!
//! A REPL over a single book: rest orders, inspect the book, and resolve
//! the crossed region.
//!
//! Usage:
//!   cargo run --features cli --bin auction -- [--config book.toml]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use callbook::{BookConfig, DynOrderBook, OverlappedLevel, Price, Quantity, Sequence, Side};

#[derive(Parser)]
#[command(name = "auction")]
#[command(about = "Call-auction order book REPL")]
#[command(version)]
struct Cli {
    /// Path to a book config (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match BookConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {e}");
                process::exit(1);
            }
        },
        None => BookConfig::default(),
    };

    let mut book = match DynOrderBook::from_config(&config) {
        Ok(book) => book,
        Err(e) => {
            eprintln!("Error building book: {e}");
            process::exit(1);
        }
    };
    log::info!(
        "{} book ready, precision {}",
        config.book.backend,
        config.book.precision
    );

    if let Err(e) = repl(&mut book) {
        eprintln!("I/O error: {e}");
        process::exit(1);
    }
}

fn repl(book: &mut DynOrderBook) -> io::Result<()> {
    println!("Call Auction Book CLI v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for commands, 'quit' to exit.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut sequence: Sequence = 0;

    loop {
        print!("auction> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts.first().map(|s| s.to_lowercase());

        match cmd.as_deref() {
            Some("help" | "h" | "?") => print_help(),
            Some("quit" | "exit" | "q") => break,
            Some("book" | "b") => print_book(book),
            Some("overlap" | "o") => print_overlap(&book.overlapped_range()),
            Some("buy") => handle_order(book, Side::Buy, &parts[1..], &mut sequence),
            Some("sell") => handle_order(book, Side::Sell, &parts[1..], &mut sequence),
            Some("cancel" | "c") => handle_cancel(book, &parts[1..]),
            Some("clear") => {
                book.clear();
                println!("Book cleared.");
            }
            Some(cmd) => println!("Unknown command: '{cmd}'. Type 'help' for commands."),
            None => {}
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_help() {
    println!(
        r#"
Commands:
  buy <id> <price> <qty>        Rest a buy order
  sell <id> <price> <qty>       Rest a sell order
  cancel <id> <buy|sell> <price> Remove an order
  book                          Show order book
  overlap                       Resolve the crossed region
  clear                         Reset the book
  help                          Show this help
  quit                          Exit

Examples:
  buy b1 10.5 3
  sell s1 10.0 1
  cancel b1 buy 10.5
"#
    );
}

fn print_book(book: &DynOrderBook) {
    let snap = book.depth(10);

    println!();
    println!("              ORDER BOOK");
    println!("  ──────────────────────────────────────");

    if snap.asks.is_empty() && snap.bids.is_empty() {
        println!("  (empty)");
        println!();
        return;
    }

    // Asks (reversed - highest at top)
    for level in snap.asks.iter().rev() {
        println!(
            "  ASK {:>14.8}  {:>12.4}  ({} orders)",
            level.price, level.quantity, level.order_count
        );
    }

    match snap.spread() {
        Some(spread) if spread <= 0.0 => {
            println!("  ─────── crossed by {:.8} ───────", -spread);
        }
        Some(spread) => println!("  ─────── spread: {spread:.8} ───────"),
        None => println!("  ─────── (no spread) ───────"),
    }

    for level in &snap.bids {
        println!(
            "  BID {:>14.8}  {:>12.4}  ({} orders)",
            level.price, level.quantity, level.order_count
        );
    }

    println!();
}

fn print_overlap(curve: &[OverlappedLevel]) {
    if curve.is_empty() {
        println!("Book is not crossed.");
        return;
    }

    let best = clearing_candidate(curve);

    println!();
    println!(
        "  {:>14}  {:>10}  {:>10}  {:>10}  {:>10}",
        "Price", "Buy", "Sell", "Exec", "Surplus"
    );
    for (i, level) in curve.iter().enumerate() {
        let mark = if Some(i) == best { " <" } else { "" };
        println!(
            "  {:>14.8}  {:>10.4}  {:>10.4}  {:>10.4}  {:>10.4}{mark}",
            level.price, level.buy_total, level.sell_total, level.executions, level.surplus
        );
    }
    println!();
}

/// Most executions, then least surplus.
fn clearing_candidate(curve: &[OverlappedLevel]) -> Option<usize> {
    curve
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.executions
                .total_cmp(&b.executions)
                .then(b.surplus.total_cmp(&a.surplus))
        })
        .map(|(i, _)| i)
}

fn handle_order(book: &mut DynOrderBook, side: Side, args: &[&str], sequence: &mut Sequence) {
    if args.len() < 3 {
        println!("Usage: {} <id> <price> <qty>", side.to_string().to_lowercase());
        return;
    }

    let id = args[0];
    let Some(price) = parse_number(args[1]) else {
        println!("Invalid price: '{}'", args[1]);
        return;
    };
    let Some(qty) = parse_number(args[2]) else {
        println!("Invalid quantity: '{}'", args[2]);
        return;
    };

    *sequence += 1;
    match book.insert_order(id, side, *sequence, price, qty) {
        Ok(level) => println!(
            "Order {id}: {side} {qty} @ {:.8} (seq {}, {} at level)",
            level.price(),
            sequence,
            level.len()
        ),
        Err(e) => println!("Rejected: {e}"),
    }
}

fn handle_cancel(book: &mut DynOrderBook, args: &[&str]) {
    if args.len() < 3 {
        println!("Usage: cancel <id> <buy|sell> <price>");
        return;
    }

    let Some(side) = Side::parse(args[1]) else {
        println!("Invalid side: '{}'. Use buy or sell.", args[1]);
        return;
    };
    let Some(price) = parse_number(args[2]) else {
        println!("Invalid price: '{}'", args[2]);
        return;
    };

    match book.remove_order(args[0], side, price) {
        Ok(fragment) => println!("Cancelled order {} ({})", fragment.id, fragment.quantity),
        Err(e) => println!("Failed to cancel: {e}"),
    }
}

fn parse_number(s: &str) -> Option<Price> {
    let value: Quantity = s.parse().ok()?;
    value.is_finite().then_some(value)
}
