// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs;

// Use library instead of local modules
use data_access_agent::{
    render, AgentConfig, HistoryKind, HistoryProvider, PanelView, SessionState, StaticHistoryProvider,
};

/// Data Access AI Agent
#[derive(Parser, Debug)]
#[command(name = "data-agent", version, about = "Ask for a data view, S3 file or REST API")]
struct Cli {
    #[command(flatten)]
    config: AgentConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Route a single request and print the agent's answer
    Ask {
        /// The request, e.g. "create a view for interest income"
        text: Vec<String>,
    },
    /// Print the history table (views | apis)
    History { kind: HistoryKind },
    /// Write one history row to <NAME>.csv in the export directory
    Export { kind: HistoryKind, name: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_ui_mode(&cli.config)?,
        Command::Ask { text } => {
            cli.config.init_tracing();
            run_ask(&cli.config, &text.join(" "))?;
        }
        Command::History { kind } => {
            cli.config.init_tracing();
            run_history(kind)?;
        }
        Command::Export { kind, name } => {
            cli.config.init_tracing();
            run_export(&cli.config, kind, &name)?;
        }
    }

    Ok(())
}

fn run_ask(config: &AgentConfig, text: &str) -> Result<()> {
    let provider = StaticHistoryProvider::load().context("Failed to load history dataset")?;
    let router = config.router();

    let mut session = SessionState::new();
    session.ask(&router, text);

    let page = render(&session, &provider, Local::now().date_naive());

    if let Some(exchange) = &page.last_exchange {
        println!("You:   {}", exchange.request);
        println!("Agent: {}", exchange.response);
    }

    match &page.panel {
        Some(PanelView::Form(form)) => {
            println!("\n{}", form.heading);
            println!("{}", form.info);
            for group in &form.groups {
                let checked = group.boxes.iter().filter(|b| b.checked).count();
                println!("  {} ({}/{} checked)", group.title, checked, group.boxes.len());
            }
        }
        Some(PanelView::History(history)) => print_history(&history.heading, history.kind, &provider),
        None => {}
    }

    Ok(())
}

fn run_history(kind: HistoryKind) -> Result<()> {
    let provider = StaticHistoryProvider::load().context("Failed to load history dataset")?;
    print_history(kind.heading(), kind, &provider);
    Ok(())
}

fn print_history(heading: &str, kind: HistoryKind, provider: &dyn HistoryProvider) {
    let columns = kind.columns();

    println!("\n{}", heading);
    println!(
        "{:<32} {:<18} {:<18} {:<14}",
        columns[0], columns[1], columns[2], columns[3]
    );
    println!("{}", "─".repeat(84));
    for record in provider.records(kind) {
        println!(
            "{:<32} {:<18} {:<18} {:<14}",
            record.name, record.access_timestamp, record.accessed_by, record.business_date
        );
    }
}

fn run_export(config: &AgentConfig, kind: HistoryKind, name: &str) -> Result<()> {
    let provider = StaticHistoryProvider::load().context("Failed to load history dataset")?;
    let export = provider.export(kind, name)?;

    fs::create_dir_all(&config.export_dir)
        .with_context(|| format!("Failed to create export dir: {:?}", config.export_dir))?;
    let path = config.export_dir.join(&export.file_name);
    fs::write(&path, &export.body).with_context(|| format!("Failed to write {:?}", path))?;

    println!("✓ Exported {} ({} bytes)", path.display(), export.body.len());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AgentConfig) -> Result<()> {
    let provider = StaticHistoryProvider::load().context("Failed to load history dataset")?;

    let mut app = ui::App::new(config, Box::new(provider), Local::now().date_naive());
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AgentConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use one-shot mode: data-agent ask \"create a view\"");
    std::process::exit(1);
}
