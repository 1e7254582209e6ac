//! cyfid - CyFi display daemon.
//!
//! Brings the command channel up first, plays the startup sequence while the
//! player comes up, then hands the display to the Mode Manager.

mod display;
mod gif_loader;
mod screens;
mod system;
mod volumio;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use cyfi_config::CyfiConfig;
use cyfi_core::{
    is_first_run, Animator, CommandServer, Dispatcher, FrameSink, ModeManager, PlaybackPolicy,
    PlayerControl, ReadinessFlags, SeenReadyMarker, StartupAssets, StartupSequence,
    StartupTiming, StateFeed, TcpProbe,
};

use crate::display::LogDisplay;
use crate::gif_loader::GifLoader;
use crate::screens::NowPlayingScreen;
use crate::system::HostShutdown;
use crate::volumio::VolumioClient;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the TOML configuration
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `logging.level` from the configuration
    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("cyfid: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    // Without RUST_LOG the logger passes everything and the level is gated
    // through log's max level, which is only known once the config is read.
    let env_filter = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();
    if !env_filter {
        log::set_max_level(log::LevelFilter::Info);
    }
    let config = CyfiConfig::load_or_default(&args.config);
    if !env_filter {
        let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
        match level.parse::<log::LevelFilter>() {
            Ok(filter) => log::set_max_level(filter),
            Err(_) => log::warn!("cyfid: Unknown log level '{}', keeping info", level),
        }
    }

    let display = Arc::new(LogDisplay::new(config.display.width, config.display.height));
    let sink: Arc<dyn FrameSink> = display.clone();
    let animator = Arc::new(Animator::new(Arc::new(GifLoader), sink.clone()));
    let flags = ReadinessFlags::new();

    let volumio = VolumioClient::new(&config.volumio)?;
    {
        let flags = flags.clone();
        volumio.subscribe(Box::new(move |state| flags.observe_state(state)));
    }
    volumio.start_polling(config.volumio.poll_interval());

    // Wake commands must be able to end the ready loop from the start
    let read_timeout = Duration::from_millis(config.command.read_timeout_ms);
    let server = CommandServer::start_with_timeout(
        &config.command.socket_path,
        Arc::new(Dispatcher::bootstrap(flags.clone())),
        read_timeout,
    )
    .context("Command channel unavailable")?;

    let assets = StartupAssets {
        logo: config.display.logo_path.clone(),
        connecting: config.display.connecting_path.clone(),
        connected: config.display.connected_path.clone(),
        loading: config.display.loading_path.clone(),
        ready_new: config.display.ready_new_path.clone(),
        ready: config.display.ready_path.clone(),
        ready_loop: config.display.ready_loop_path.clone(),
    };
    let timing = StartupTiming {
        logo_hold: Duration::from_secs(config.display.logo_secs),
        min_loading: Duration::from_secs(config.startup.min_loading_secs),
        connected_hold: Duration::from_secs(config.startup.connected_hold_secs),
        probe_interval: Duration::from_millis(config.startup.probe_interval_ms),
    };
    let marker = SeenReadyMarker::new(config.markers.seen_ready_path.clone());
    let mut startup = StartupSequence::new(animator, flags.clone(), assets, timing, marker);
    if is_first_run(
        &config.markers.netconfigured_path,
        &config.markers.network_config_dir,
    ) {
        startup = startup.with_network_wait(Arc::new(TcpProbe::new(
            config.network.probe_host.clone(),
            config.network.probe_port,
            config.network.probe_timeout(),
        )));
    }
    let outcome = startup.run();
    log::info!("cyfid: Startup finished ({:?})", outcome);

    let policy = PlaybackPolicy {
        show_now_playing_on_play: config.playback.show_now_playing_on_play,
        clock_on_stop: config.playback.clock_on_stop,
    };
    let now_playing = Arc::new(NowPlayingScreen::new(sink.clone()));
    let manager = ModeManager::with_screens(policy, |navigator| {
        screens::build(navigator, sink.clone(), &config.clock, now_playing.clone())
    });
    manager.add_mode_change_callback(|mode| {
        log::info!("cyfid: Mode is now {}", mode);
        Ok(())
    });
    {
        let manager = manager.clone();
        let now_playing = now_playing.clone();
        volumio.subscribe(Box::new(move |state| {
            now_playing.update(state);
            manager.process_state_change(state);
        }));
    }

    let current = volumio.current_state();
    if let Some(state) = &current {
        now_playing.update(state);
    }
    manager.enter_startup_mode(current.as_ref());

    let system = Arc::new(HostShutdown::new(
        config.system.shutdown_command.clone(),
        sink.clone(),
    ));
    let player: Arc<dyn PlayerControl> = volumio.clone();
    let server = server.replace(Arc::new(Dispatcher::full(
        flags,
        manager.clone(),
        player,
        system,
    )))?;
    log::info!("cyfid: Listening on {}", server.path().display());

    wait_for_termination()?;

    log::info!("cyfid: Shutting down");
    server.shutdown();
    manager.stop_active();
    volumio.stop();
    display.clear();
    Ok(())
}

/// Block until SIGINT or SIGTERM.
fn wait_for_termination() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create signal runtime")?;
    runtime.block_on(async {
        let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to wait for SIGINT")?,
            _ = term.recv() => {}
        }
        Ok::<(), anyhow::Error>(())
    })
}
