//! `xwinctl` uses `libxwin` to inspect, place and watch the windows of an
//! [Extended Window Manager Hints (EWMH)](https://specifications.freedesktop.org/wm-spec/latest/)
//! compatible window manager. Every command works on the active window unless a window is given
//! with `--window`.
//!
//! ## Command line examples
//!
//! ### Show the window manager and the active window
//! ```bash
//! xwinctl info
//! ```
//!
//! ### Move a window
//! Center an 800x600 window on the point (960, 540). If the application only accepts other sizes
//! the window grows or shrinks around its center.
//! ```bash
//! xwinctl move 960 540 800 600 --gravity center --anchor center
//! ```
//!
//! ### Watch a window
//! Print property and configuration changes of the window until interrupted.
//! ```bash
//! xwinctl --window 0x1a00003 watch
//! ```
use std::{sync::Arc, thread, time::Duration};

use clap::{builder::PossibleValuesParser, crate_description, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use gory::*;
use libxwin::prelude::*;
use tracing::{debug, Level};
use witcher::prelude::*;
use x11rb::protocol::{xproto::ConnectionExt as _, Event};

fn cli() -> Command {
    let mode = || {
        Arg::new("mode")
            .help("Set, unset or toggle the state")
            .default_value("toggle")
            .value_parser(PossibleValuesParser::new(["set", "unset", "toggle"]))
    };
    Command::new("xwinctl")
        .about(crate_description!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .version(crate_version!())
        .arg(Arg::new("display").long("display").short('d').global(true).help("X11 display to connect to, e.g. :1"))
        .arg(
            Arg::new("window")
                .long("window")
                .short('w')
                .global(true)
                .value_parser(parse_window)
                .help("Window id in decimal or 0x prefixed hex, defaults to the active window"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log more, may be repeated"),
        )
        .subcommand(Command::new("info").visible_alias("i").about("Show window manager and window details"))
        .subcommand(Command::new("list").visible_alias("l").about("List out all managed windows"))
        .subcommand(Command::new("geometry").visible_alias("g").about("Show geometry, borders and size hints of a window"))
        .subcommand(
            Command::new("move")
                .visible_alias("m")
                .about("Move and resize a window, borders included")
                .allow_negative_numbers(true)
                .arg(Arg::new("X").required(true).value_parser(value_parser!(i32)))
                .arg(Arg::new("Y").required(true).value_parser(value_parser!(i32)))
                .arg(Arg::new("WIDTH").required(true).value_parser(value_parser!(u32)))
                .arg(Arg::new("HEIGHT").required(true).value_parser(value_parser!(u32)))
                .arg(
                    Arg::new("gravity")
                        .long("gravity")
                        .default_value("top-left")
                        .value_parser(value_parser!(Gravity))
                        .help("Point of the window X and Y refer to"),
                )
                .arg(
                    Arg::new("anchor")
                        .long("anchor")
                        .default_value("top-left")
                        .value_parser(value_parser!(Gravity))
                        .help("Point of the window that stays put when the size is constrained"),
                ),
        )
        .subcommand(Command::new("maximize").visible_alias("x").about("Maximize a window").arg(mode()))
        .subcommand(Command::new("shade").visible_alias("s").about("Shade a window").arg(mode()))
        .subcommand(Command::new("reset").visible_alias("r").about("Unmaximize and unshade a window"))
        .subcommand(Command::new("watch").about("Print property and configuration changes of a window"))
}

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));
    if let Err(err) = run(&matches) {
        eprintln!("{}: {:?}", "error".red(), err);
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();
}

fn run(matches: &ArgMatches) -> Result<()> {
    let display = matches.get_one::<String>("display").map(|x| x.as_str());
    let wm = WindowManager::connect_to(display).wrap("failed to connect to the X11 server")?;
    if let Some(("list", _)) = matches.subcommand() {
        return list(&wm);
    }
    let id = match matches.get_one::<u32>("window") {
        Some(id) => *id,
        None => wm.active_window_id().pass()?,
    };
    let win = Window::new(&wm, id);
    debug!("run: wm: {}, window: {}", wm.name(), id);

    match matches.subcommand() {
        Some(("info", _)) => info(&wm, &win),
        Some(("geometry", _)) => geometry(&win),
        Some(("move", sub)) => move_resize(&win, sub),
        Some(("maximize", sub)) => win.maximize(state_mode(sub)).wrap("failed to maximize window"),
        Some(("shade", sub)) => win.shade(state_mode(sub)).wrap("failed to shade window"),
        Some(("reset", _)) => win.reset().wrap("failed to reset window"),
        Some(("watch", _)) => watch(&wm, &win),
        _ => Ok(()),
    }
}

fn parse_window(val: &str) -> std::result::Result<u32, String> {
    let parsed = match val.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => val.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid window id {}: {}", val, e))
}

fn state_mode(matches: &ArgMatches) -> StateMode {
    match matches.get_one::<String>("mode").map(|x| x.as_str()) {
        Some("set") => StateMode::Set,
        Some("unset") => StateMode::Unset,
        _ => StateMode::Toggle,
    }
}

fn info(wm: &WindowManager, win: &Window) -> Result<()> {
    let caps = wm.capabilities();
    let size = wm.desktop_size().pass()?;
    println!("{}", "X11 Information".cyan());
    println!("{:-<72}", "");
    println!("{:<20}{}", "Window Manager:", wm.name());
    println!("{:<20}translate: {}, adjust borders: {}", "Capabilities:", caps.needs_translation, caps.needs_border_adjust);
    println!("{:<20}{}", "Root Window:", wm.root());
    println!("{:<20}{}x{}", "Desktop Size:", size.width, size.height);
    println!("{:<20}{}", "Work Area:", wm.workarea_geometry().pass()?);
    println!("{:<20}{}", "Viewport:", wm.viewport().pass()?);
    println!("{:<20}{} of {}", "Desktop:", wm.desktop().pass()?, wm.desktops().pass()?);
    println!();
    println!("{}", "Window".cyan());
    println!("{:-<72}", "");
    println!("{:<20}{}", "Id:", format!("0x{:08x}", win.id));
    println!("{:<20}{}", "Name:", win.name().pass()?);
    println!("{:<20}{}", "Class:", win.class_name().pass()?);
    println!("{:<20}{}", "Desktop:", win.desktop().pass()?);
    println!("{:<20}{}", "Type:", join(&win.types().pass()?));
    println!("{:<20}{}", "State:", join(&win.state().pass()?));
    if let Some(parent) = win.parent_id().pass()? {
        println!("{:<20}{}", "Transient For:", format!("0x{:08x}", parent));
    }
    println!("{:<20}{}", "Geometry:", win.geometry().pass()?);
    println!("{:<20}{}", "Borders:", win.borders().pass()?);
    Ok(())
}

fn list(wm: &WindowManager) -> Result<()> {
    let active = wm.active_window_id().ok();
    println!("{:<10} {:<3} {:<26} {:<8} {:<18} {}", "ID", "DSK", "GEOMETRY", "TYPE", "CLASS", "NAME");
    for win in wm.windows(|_| true).pass()? {
        let id = format!("{:<10}", format!("0x{:08x}", win.id));
        let id = if Some(win.id) == active { id.as_str().green().to_string() } else { id };
        let types = win.types().pass()?;
        println!(
            "{} {:<3} {:<26} {:<8} {:<18} {}",
            id,
            win.desktop().pass()?,
            win.geometry().pass()?.to_string(),
            types.first().map(|x| x.to_string()).unwrap_or_default(),
            win.class_name().pass()?,
            win.name().pass()?
        );
    }
    Ok(())
}

fn geometry(win: &Window) -> Result<()> {
    println!("{:<20}{}", "Geometry:", win.geometry().pass()?);
    println!("{:<20}{}", "Raw Geometry:", win.raw_geometry().pass()?);
    println!("{:<20}{}", "Borders:", win.borders().pass()?);
    match win.size_hints().pass()? {
        Some(hints) => println!("{:<20}{:?}", "Size Hints:", hints),
        None => println!("{:<20}{}", "Size Hints:", "none".yellow()),
    }
    Ok(())
}

fn move_resize(win: &Window, matches: &ArgMatches) -> Result<()> {
    let (x, y) = (get::<i32>(matches, "X"), get::<i32>(matches, "Y"));
    let (w, h) = (get::<u32>(matches, "WIDTH"), get::<u32>(matches, "HEIGHT"));
    let geometry = Geometry::new(x, y, w, h, get::<Gravity>(matches, "gravity"));
    let request = win.move_resize(&geometry, get::<Gravity>(matches, "anchor")).wrap("failed to move window")?;
    println!("{} {}", "Configured:".green(), request);
    Ok(())
}

fn watch(wm: &WindowManager, win: &Window) -> Result<()> {
    let conn = wm.conn().clone();
    let properties: XEventHandler = Arc::new(FnHandler::property_changes(move |event| {
        if let Event::PropertyNotify(e) = event {
            let name = conn.get_atom_name(e.atom)?.reply()?.name;
            println!("{} 0x{:08x} {}", "property:".cyan(), e.window, String::from_utf8_lossy(&name));
        }
        Ok(())
    }));
    let configures: XEventHandler = Arc::new(FnHandler::configure_changes(|event| {
        if let Event::ConfigureNotify(e) = event {
            let geometry = Geometry::from((e.x as i32, e.y as i32, e.width as u32, e.height as u32));
            println!("{} 0x{:08x} {}", "configure:".cyan(), e.window, geometry);
        }
        Ok(())
    }));
    win.listen(properties).pass()?;
    win.listen(configures).pass()?;

    println!("watching 0x{:08x}, press Ctrl+C to quit", win.id);
    while wm.dispatcher().state().pass()? != DispatcherState::Idle {
        thread::sleep(Duration::from_millis(250));
    }
    Ok(())
}

fn get<T: Clone + Default + Send + Sync + 'static>(matches: &ArgMatches, name: &str) -> T {
    matches.get_one::<T>(name).cloned().unwrap_or_default()
}

fn join<T: ToString>(values: &[T]) -> String {
    values.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", ")
}
