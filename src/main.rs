// Copyright (c) 2026 rezky_nightky

mod cell;
mod color;
mod config;
mod frame;
mod scene;
mod terminal;

use std::env;
use std::io;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rainpane::{
    GravityMode, Preset, RainOptions, Raster, Rgba, Simulator, MAX_BLUR_RADIUS,
};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::color::ColorMode;
use crate::config::{color_enabled_stdout, default_params_usage_for_help, Args};
use crate::frame::Frame;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> &'static str {
    env!("RAINPANE_BUILD")
}

fn git_sha() -> &'static str {
    env!("RAINPANE_GIT_SHA")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f32_range(name: &str, v: f32, min: f32, max: f32) -> f32 {
    require_f64_range(name, v as f64, min as f64, max as f64) as f32
}

fn require_u32_range(name: &str, v: u32, min: u32, max: u32) -> u32 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn detect_color_mode(args: &Args) -> ColorMode {
    match args.colormode {
        None => ColorMode::detect(),
        Some(bits) => ColorMode::from_bits(bits).unwrap_or_else(|| {
            eprintln!("invalid --colormode: {} (allowed: 0,16,8,256,24,32)", bits);
            std::process::exit(1);
        }),
    }
}

fn rain_options(args: &Args, fps: f64) -> RainOptions {
    RainOptions {
        opacity: require_f32_range("--opacity", args.opacity, 0.0, 1.0),
        blur_radius: require_u32_range("--blur", args.blur, 0, MAX_BLUR_RADIUS),
        gravity_enabled: !args.no_gravity,
        gravity_mode: if args.linear_gravity {
            GravityMode::Linear
        } else {
            GravityMode::NonLinear
        },
        collisions_enabled: !args.no_collisions,
        gravity_threshold: require_f32_range("--threshold", args.threshold, 0.0, 1000.0),
        gravity_angle: require_f32_range("--angle", args.angle, 0.0, 180.0).to_radians(),
        gravity_angle_variance: require_f32_range(
            "--angle-variance",
            args.angle_variance,
            0.0,
            1.0,
        ),
        reflection_scaledown_factor: require_f32_range("--scaledown", args.scaledown, 0.1, 100.0),
        reflection_map_width: args.map_size.width,
        reflection_map_height: args.map_size.height,
        fps: fps as f32,
        trail: args.trail.into(),
        reflection: args.reflection.into(),
        fill_color: args.fill_color.0,
        spawn_interval: Duration::from_millis(args.spawn_ms),
    }
}

fn rng_from(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(stream)),
        None => StdRng::from_os_rng(),
    }
}

/// Everything sized to the terminal: the glass the drops are drawn on and
/// the cell grid it is presented through.
struct Pane {
    glass: Raster,
    composed: Raster,
    frame: Frame,
}

fn setup_pane(
    sim: &mut Simulator,
    options: &RainOptions,
    scene_rng: &mut StdRng,
    cols: u16,
    rows: u16,
) -> io::Result<Pane> {
    let frame = Frame::new(cols.max(1), rows.max(1));
    let (w, h) = frame.pixel_size();
    let backdrop = scene::backdrop(w, h, scene_rng);
    sim.configure(w, h, options.clone(), &backdrop)
        .map_err(io::Error::other)?;
    debug!("pane {}x{} cells, {}x{} pixels", cols, rows, w, h);
    Ok(Pane {
        glass: Raster::new(w, h),
        composed: Raster::new(w, h),
        frame,
    })
}

fn main() -> io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    cmd = cmd.before_help(default_params_usage_for_help());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    cmd.build();
    if cmd.get_arguments().any(|a| a.get_id().as_str() == "help") {
        cmd = cmd.mut_arg("help", |a| a.help_heading("HELP"));
    }

    let matches = cmd.get_matches_from(env::args_os());
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Commit: {}", git_sha());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        return Ok(());
    }

    let fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let end_after = args.duration.and_then(|s| {
        if !s.is_finite() {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        (s > 0.0).then(|| Duration::from_secs_f64(require_f64_range("--duration", s, 0.1, 86400.0)))
    });
    let color_mode = detect_color_mode(&args);
    let options = rain_options(&args, fps);
    if let Err(e) = options.validate() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let presets: Vec<Preset> = args.presets();
    let mut sim = Simulator::new(rng_from(args.seed, 0));
    if let Err(e) = sim.load_presets(presets) {
        eprintln!("failed to apply --preset: {}", e);
        std::process::exit(1);
    }
    let mut scene_rng = rng_from(args.seed, 1);

    let mut term = Terminal::new()?;
    let (cols, rows) = term.size()?;
    let mut pane = setup_pane(&mut sim, &options, &mut scene_rng, cols, rows)?;
    info!(
        "raining on {}x{} cells in {} mode",
        cols,
        rows,
        color_mode.label()
    );

    let start_time = Instant::now();
    let end_time = end_after.map(|d| start_time + d);
    let target_period = Duration::from_secs_f64(1.0 / fps);
    let mut next_frame = Instant::now();
    let mut running = true;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        let mut pending_resize: Option<(u16, u16)> = None;

        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => pending_resize = Some((nw, nh)),
                    Event::Key(k) if k.kind == KeyEventKind::Press => match k.code {
                        KeyCode::Esc | KeyCode::Char('q') => running = false,
                        KeyCode::Char('p') => {
                            if sim.is_paused() {
                                sim.resume();
                            } else {
                                sim.pause();
                            }
                        }
                        KeyCode::Char(' ') => {
                            sim.reset();
                            pane.glass.fill(Rgba::TRANSPARENT);
                            pane.frame.mark_all_dirty();
                        }
                        _ => {}
                    },
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }
            let now = Instant::now();
            if now >= next_frame {
                break;
            }
            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            pane = setup_pane(&mut sim, &options, &mut scene_rng, nw, nh)?;
        }

        sim.step(start_time.elapsed(), &mut pane.glass)
            .map_err(io::Error::other)?;

        if let Some(background) = sim.background() {
            pane.composed.clone_from(background);
        }
        pane.composed.composite(&pane.glass, options.opacity);
        pane.frame.paint(&pane.composed, color_mode);
        if pane.frame.is_dirty_all() || !pane.frame.dirty_indices().is_empty() {
            term.draw(&mut pane.frame)?;
        }

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    debug!(
        "stopped after {:.1}s with {} drops",
        start_time.elapsed().as_secs_f64(),
        sim.drop_count()
    );
    Ok(())
}
