//! mensa - today's canteen menu in the terminal
//!
//! Prints the menu of today (or the next serving day) for an eat-api canteen,
//! or shows it in a small live-updating terminal widget.

use std::io;
use std::panic;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use mensa_menu::app::App;
use mensa_menu::cache::{FetchOutcome, MenuCache};
use mensa_menu::cli::{Cli, OutputMode, StartupConfig};
use mensa_menu::config::Config;
use mensa_menu::data::{all_mensas, get_mensa_by_id, MenuDay};
use mensa_menu::refresh::{try_recv, RefreshHandle};
use mensa_menu::ui;

/// Installs the log subscriber on stderr
///
/// `RUST_LOG` wins over `default_filter`.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Sets up a panic hook that restores the terminal before printing the panic message.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

fn print_catalog() {
    for mensa in all_mensas() {
        println!(
            "{:<22} {:<24} ({:.4}, {:.4})",
            mensa.id, mensa.name, mensa.latitude, mensa.longitude
        );
    }
}

fn print_day(location: &str, day: &MenuDay) {
    let name = get_mensa_by_id(location).map_or(location, |m| m.name);
    let today = chrono::Local::now().date_naive();
    println!(
        "{}, {} ({})",
        name,
        ui::menu_widget::day_label(day.date, today),
        day.date.format("%Y-%m-%d")
    );

    for dish in &day.dishes {
        let mut line = format!("  {}", dish.name);
        if !dish.dish_type.is_empty() {
            line.push_str(&format!("  [{}]", dish.dish_type));
        }
        if let Some(price) = dish.prices.students.as_ref().and_then(|p| p.describe()) {
            line.push_str(&format!("  {}", price));
        }
        if !dish.labels.is_empty() {
            line.push_str(&format!("  {}", dish.labels.join(", ").to_lowercase()));
        }
        println!("{}", line);
    }
}

/// Fetches once and prints the result
async fn print_menu(
    cache: MenuCache,
    config: &Config,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cache.refresh(&config.location).await {
        FetchOutcome::Updated(day) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&day)?);
            } else {
                print_day(&config.location, &day);
            }
            Ok(ExitCode::SUCCESS)
        }
        FetchOutcome::NoMatchingDay => {
            eprintln!("No menu for {} for the rest of this week", config.location);
            Ok(ExitCode::FAILURE)
        }
        FetchOutcome::Failed(err) => {
            eprintln!("Could not fetch the menu for {}: {}", config.location, err);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Runs the terminal widget until the user quits
async fn run_tui(cache: MenuCache, config: &Config) -> Result<ExitCode, Box<dyn std::error::Error>> {
    setup_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cache.clone(), config.location.clone());
    app.request_refresh();
    let mut refresh = RefreshHandle::spawn(cache, config.location.clone(), config.refresh_config());

    loop {
        while let Some(message) = try_recv(&mut refresh) {
            app.handle_refresh_message(message);
        }
        app.sync_outcome();

        terminal.draw(|f| ui::render_menu(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }

    refresh.shutdown().await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(err) => {
            eprintln!("error: {}", err);
            return Ok(ExitCode::from(2));
        }
    };

    // Keep the widget's screen clean unless logging was asked for
    init_tracing(if startup.mode == OutputMode::Tui { "off" } else { "warn" });

    if startup.mode == OutputMode::List {
        print_catalog();
        return Ok(ExitCode::SUCCESS);
    }

    let config = startup.apply(Config::load(cli.config.as_deref())?.apply_env());
    tracing::debug!(?config, "configuration loaded");

    let cache = MenuCache::new(config.client()?);

    match startup.mode {
        OutputMode::Tui => run_tui(cache, &config).await,
        mode => print_menu(cache, &config, mode == OutputMode::Json).await,
    }
}
