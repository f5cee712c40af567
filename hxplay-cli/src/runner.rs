use std::{
    fmt::{Display, Formatter},
    io,
    sync::{Arc, Mutex},
    thread::sleep,
    time::Duration,
};

use clap::ArgMatches;
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use hxplay_lib::{
    diagnostics::{reporter::ReportFn, LogBuffer, Reporter},
    graph::{
        tree, Cuuid, Entry, EntryData, ManifestError, MemoryGraph, ResourceGraph, StreamSource,
    },
    playback::{
        ClockBackend, OutputBackend, PlaybackSettings, PlaybackState, PlaybackStatus, Player,
        RodioBackend,
    },
    resolve::Resolver,
    PlaybackError,
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::{controls, logging, ui};

const STATUS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum CliError {
    MissingArgument(&'static str),
    InvalidId(String),
    NoSuchEntry(Cuuid),
    Manifest { path: String, source: ManifestError },
    Settings { path: String, reason: String },
    Playback(PlaybackError),
    Terminal(io::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArgument(name) => write!(f, "missing argument {}", name),
            Self::InvalidId(text) => write!(f, "invalid entry id: {}", text),
            Self::NoSuchEntry(id) => write!(f, "no entry {}", id),
            Self::Manifest { path, source } => write!(f, "cannot load {}: {}", path, source),
            Self::Settings { path, reason } => {
                write!(f, "cannot read settings {}: {}", path, reason)
            }
            Self::Playback(err) => write!(f, "{}", err),
            Self::Terminal(err) => write!(f, "terminal error: {}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<PlaybackError> for CliError {
    fn from(value: PlaybackError) -> Self {
        Self::Playback(value)
    }
}

pub fn run(args: &ArgMatches, log_buffer: logging::LogLines) -> Result<i32, CliError> {
    match args.subcommand() {
        Some(("list", matches)) => list(matches),
        Some(("tree", matches)) => print_tree(matches),
        Some(("resolve", matches)) => resolve(matches),
        Some(("info", matches)) => info(matches),
        Some(("play", matches)) => play(matches, log_buffer),
        _ => Ok(2),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &'static str) -> Result<&'a String, CliError> {
    matches
        .get_one::<String>(name)
        .ok_or(CliError::MissingArgument(name))
}

fn load_graph(matches: &ArgMatches) -> Result<MemoryGraph, CliError> {
    let path = required(matches, "MANIFEST")?;
    MemoryGraph::load_manifest(path).map_err(|source| CliError::Manifest {
        path: path.clone(),
        source,
    })
}

fn entry_id(matches: &ArgMatches) -> Result<Cuuid, CliError> {
    let text = required(matches, "CUUID")?;
    Cuuid::parse_hex(text).ok_or_else(|| CliError::InvalidId(text.clone()))
}

fn list(matches: &ArgMatches) -> Result<i32, CliError> {
    let graph = load_graph(matches)?;
    if matches.get_flag("all") {
        for entry in graph.entries() {
            println!(
                "{}  {:<16} {}",
                entry.cuuid,
                entry.data.class_name(),
                entry.event_name().unwrap_or("")
            );
        }
    } else {
        for entry in graph.events() {
            println!("{}  {}", entry.cuuid, entry.event_name().unwrap_or(""));
        }
    }
    Ok(0)
}

fn print_tree(matches: &ArgMatches) -> Result<i32, CliError> {
    let graph = load_graph(matches)?;
    let root = entry_id(matches)?;
    for row in tree::walk(&graph, root) {
        println!(
            "{}{}  {}  {}",
            "  ".repeat(row.depth),
            row.label,
            row.class,
            row.info
        );
    }
    Ok(0)
}

fn resolve(matches: &ArgMatches) -> Result<i32, CliError> {
    let graph = load_graph(matches)?;
    let id = entry_id(matches)?;
    let resolution = Resolver::new(&graph).resolve_id(id);
    for stream in &resolution.streams {
        let info = stream.file.info;
        let location = match &stream.file.source {
            StreamSource::Inline(_) => "inline".to_string(),
            StreamSource::External(external) => {
                format!("{}@{}", external.filename, external.offset)
            }
        };
        println!(
            "{}  {}  {} Hz  {} ch  {} bytes  {}",
            stream.cuuid,
            info.format,
            info.sample_rate,
            info.channels,
            stream.file.size(),
            location
        );
    }
    if !resolution.success {
        return Err(PlaybackError::Unresolved(id).into());
    }
    Ok(0)
}

fn info(matches: &ArgMatches) -> Result<i32, CliError> {
    let graph = load_graph(matches)?;
    let id = entry_id(matches)?;
    let entry = graph
        .find(id)
        .ok_or(CliError::NoSuchEntry(id))?;
    for (label, value) in info_lines(entry) {
        println!("{:<10}{}", label, value);
    }
    Ok(0)
}

/// Label/value pairs describing one entry.
fn info_lines(entry: &Entry) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("cuuid", entry.cuuid.to_string()),
        ("class", format!("{} @ {:X}", entry.data.class_name(), entry.offset)),
    ];
    match &entry.data {
        EntryData::Event(event) => {
            lines.push(("name", event.name.clone()));
            lines.push(("link", event.link.to_string()));
        }
        EntryData::Wave(wave) => {
            lines.push(("default", wave.default.to_string()));
            for link in &wave.links {
                lines.push(("localized", format!("{} {}", link.link, link.language)));
            }
        }
        EntryData::Program(program) => {
            for link in &program.links {
                lines.push(("link", link.to_string()));
            }
        }
        EntryData::File(file) => {
            let storage = if file.is_external() { "external" } else { "internal" };
            lines.push(("storage", storage.to_string()));
            lines.push(("channels", file.info.channels.to_string()));
            lines.push(("format", file.info.format.to_string()));
            lines.push(("size", format!("{} bytes", file.size())));
            lines.push(("rate", format!("{} Hz", file.info.sample_rate)));
            if let StreamSource::External(external) = &file.source {
                lines.push(("file", external.filename.clone()));
                lines.push(("offset", format!("{:X}", external.offset)));
            }
        }
        EntryData::Other { .. } => {}
    }
    lines
}

fn playback_settings(matches: &ArgMatches) -> Result<PlaybackSettings, CliError> {
    let mut settings = match matches.get_one::<String>("settings") {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|err| CliError::Settings {
                path: path.clone(),
                reason: err.to_string(),
            })?;
            PlaybackSettings::from_json(&json).map_err(|err| CliError::Settings {
                path: path.clone(),
                reason: err.to_string(),
            })?
        }
        None => PlaybackSettings::default(),
    };

    if let Some(gain) = matches.get_one::<f32>("gain") {
        settings.gain = *gain;
    }
    if matches.get_flag("repeat") {
        settings.repeat = true;
    }
    if let Some(period) = matches.get_one::<usize>("period") {
        settings.set_period_frames(*period);
    }
    Ok(settings)
}

fn play(matches: &ArgMatches, log_buffer: logging::LogLines) -> Result<i32, CliError> {
    let graph = load_graph(matches)?;
    let id = entry_id(matches)?;
    let settings = playback_settings(matches)?;
    let quiet = matches.get_flag("quiet");

    let backend: Box<dyn OutputBackend> = if matches.get_flag("null-output") {
        Box::new(ClockBackend)
    } else {
        Box::new(RodioBackend::new(&settings))
    };
    let events = LogBuffer::new();
    let mut player = Player::with_backend(settings, backend).with_log_sink(Arc::new(events.clone()));

    let title = graph
        .find(id)
        .and_then(|entry| entry.event_name())
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string());
    info!("playing {}", title);

    if quiet {
        play_plain(&mut player, &graph, id, &events)?;
    } else {
        player.queue_id(&graph, id)?;
        play_interactive(&mut player, &graph, &title, &log_buffer)?;
    }
    Ok(0)
}

fn print_new_events(events: &LogBuffer, printed: &mut usize) {
    let entries = events.snapshot();
    for entry in entries.iter().skip(*printed) {
        println!("{}", entry);
    }
    *printed = entries.len();
}

/// Status line printer for the plain play loop. Skips the empty state.
fn status_printer() -> ReportFn {
    Arc::new(Mutex::new(|status: PlaybackStatus| {
        if status.state != PlaybackState::Empty {
            println!(
                "{} -{}",
                controls::counters(&status),
                controls::format_remaining(status.remaining_seconds())
            );
        }
    }))
}

/// Print engine events as they arrive, with a status line from a
/// [`Reporter`] once a second, until the queue runs out.
fn play_plain(
    player: &mut Player,
    graph: &dyn ResourceGraph,
    id: Cuuid,
    events: &LogBuffer,
) -> Result<(), CliError> {
    let mut printed = 0;
    let queued = player.queue_id(graph, id);
    print_new_events(events, &mut printed);
    queued?;

    let reporter = Reporter::new(player.session(), status_printer(), STATUS_INTERVAL);
    reporter.start();
    loop {
        let finished = player.poll() || player.is_finished();
        print_new_events(events, &mut printed);
        if finished {
            break;
        }
        sleep(Duration::from_millis(20));
    }
    reporter.stop();
    Ok(())
}

fn play_interactive(
    player: &mut Player,
    graph: &dyn ResourceGraph,
    title: &str,
    log_buffer: &logging::LogLines,
) -> Result<(), CliError> {
    let _raw_mode = RawModeGuard::enable().map_err(CliError::Terminal)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide).map_err(CliError::Terminal)?;
    let mut terminal =
        Terminal::new(CrosstermBackend::new(stdout)).map_err(CliError::Terminal)?;

    // UI / input loop. Stays open after the queue ends so it can be replayed.
    loop {
        player.poll();
        let status = player.status();
        let snapshot = controls::status_text(title, &status);
        let log_lines = logging::snapshot(log_buffer);
        ui::draw_status(&mut terminal, &snapshot, &status, &log_lines);

        if !controls::handle_key_event(player, graph) {
            break;
        }

        sleep(Duration::from_millis(50));
    }

    // Restore the terminal state before exiting.
    let _ = terminal.show_cursor();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show);
    Ok(())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
