use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use flume::Receiver;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use folio::conveyor::{Conveyor, ConveyorOptions, ConveyorTurn, DirectorySupply, HeadlessSurfaceFactory};
use folio::{ContentSupply, EventBus, ReaderEvent, Settings, SystemClock};

const CONSTRUCTION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "folio", about = "Headless paginated reading over a directory of chapters")]
struct Args {
    /// Directory of .html/.xhtml/.htm/.txt chapter files, read in name order
    book_dir: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    chapters_per_window: Option<usize>,

    #[arg(long)]
    width: Option<f32>,

    #[arg(long)]
    height: Option<f32>,

    #[arg(long)]
    font_size: Option<f32>,

    /// Page turns to perform
    #[arg(long, default_value_t = 20)]
    turns: usize,

    /// Turn pages backward from the last window
    #[arg(long)]
    backward: bool,

    #[arg(long)]
    diagnostics: bool,

    #[arg(long, default_value = "folio.log")]
    log_file: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let args = Args::parse();

    WriteLogger::init(
        args.log_level,
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("creating log file {:?}", args.log_file))?,
    )?;

    info!("Starting folio on {:?}", args.book_dir);
    if let Err(err) = run(&args) {
        error!("Application error: {err:?}");
        return Err(err);
    }
    info!("Shutting down folio");
    Ok(())
}

fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match args.config.clone().or_else(Settings::default_path) {
        Some(path) => Settings::load_or_create(&path)?,
        None => Settings::default(),
    };
    if let Some(n) = args.chapters_per_window {
        settings.chapters_per_window = n.clamp(1, folio::pagination::SEGMENT_CAPACITY);
    }
    if let Some(width) = args.width {
        settings.viewport_width = width;
    }
    if let Some(height) = args.height {
        settings.viewport_height = height;
    }
    if let Some(px) = args.font_size {
        settings.font_size = px;
    }
    settings.diagnostics |= args.diagnostics;
    Ok(settings)
}

fn run(args: &Args) -> Result<()> {
    let settings = load_settings(args)?;
    let supply = Arc::new(DirectorySupply::open(&args.book_dir, settings.chapters_per_window)?);
    let window_count = supply.window_count();

    let events = EventBus::new();
    let printer = events.subscribe();
    let factory = HeadlessSurfaceFactory {
        viewport_width: settings.viewport_width,
        viewport_height: settings.viewport_height,
    };
    let options = ConveyorOptions {
        initial_window: if args.backward {
            window_count.saturating_sub(1)
        } else {
            0
        },
        entry: None,
        defaults: settings.window_defaults(),
    };

    let mut conveyor = Conveyor::start(
        supply,
        factory,
        Arc::new(SystemClock),
        events,
        options,
    )?;
    if args.backward {
        if let Some(window) = conveyor.active_window_mut() {
            window.session_mut().go_to_page(isize::MAX, false);
        }
    }
    print_events(&printer)?;

    for _ in 0..args.turns {
        let turn = if args.backward {
            conveyor.prev_page()
        } else {
            conveyor.next_page()
        };
        conveyor.tick();
        if let ConveyorTurn::WindowPending { .. } = turn {
            conveyor.wait_for_construction(CONSTRUCTION_TIMEOUT);
        }
        print_events(&printer)?;

        if matches!(turn, ConveyorTurn::EndOfBook | ConveyorTurn::StartOfBook) {
            info!("Reached {turn:?}");
            break;
        }
    }

    conveyor.wait_for_construction(CONSTRUCTION_TIMEOUT);
    print_events(&printer)?;

    if let Some(snapshot) = conveyor.snapshot() {
        println!("{}", serde_json::to_string(&snapshot)?);
    }
    if let Some(position) = conveyor.current_position() {
        println!("{}", position.to_json()?);
    }
    Ok(())
}

fn print_events(events: &Receiver<ReaderEvent>) -> Result<()> {
    for event in events.try_iter() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
