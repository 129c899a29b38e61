#![warn(clippy::pedantic)]

mod download;
pub mod global;
mod replay;
mod surface;

use anyhow::Result as AnyResult;
use pathdraw_core::clock::ManualClock;

/// Replay one script file and save everything it asks to export.
async fn run_script(path: &std::path::Path, output_dir: &std::path::Path) -> AnyResult<usize> {
    let source = std::fs::read_to_string(path)?;
    let script: replay::Script = toml::from_str(&source)?;

    let surface = surface::HeadlessSurface::new(script.surface.into());
    let clock = ManualClock::default();
    let mut engine = pathdraw_core::Engine::new(
        Box::new(surface.clone()),
        Box::new(clock.clone()),
        &global::config::Config::get().file.engine,
    );
    engine.attach_backend(global::geometry_module())?;

    replay::replay(&mut engine, &clock, &surface, &script)?;
    log::debug!(
        "{path:?}: {} paths, {} frames presented",
        engine.paths().len(),
        surface.frames()
    );

    let mut saved = 0;
    for &format in &script.exports {
        // Sequential on purpose: the engine rejects overlapping rasterizations.
        let blob = engine.download(format).await?;
        download::save(&blob, output_dir)?;
        saved += 1;
    }
    engine.teardown();
    Ok(saved)
}

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    // Args are a list of scripts to replay, plus `--write-config` to save the effective settings.
    let mut write_config = false;
    let mut scripts = Vec::<std::path::PathBuf>::new();
    for arg in std::env::args_os().skip(1) {
        if arg == "--write-config" {
            write_config = true;
        } else {
            scripts.push(arg.into());
        }
    }

    let config = global::config::Config::get();
    if config.did_fail_to_load() {
        log::info!("using default settings");
    }
    if write_config {
        match config.save() {
            Ok(path) => log::info!("wrote settings to {}", path.display()),
            Err(e) => log::warn!("Failed to save settings:\n{e:?}"),
        }
    }
    if scripts.is_empty() {
        return Ok(());
    }

    let output_dir = config.output_dir();
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    // Did we have at least one success?
    let mut had_success = false;
    for path in &scripts {
        match runtime.block_on(run_script(path, &output_dir)) {
            Ok(saved) => {
                log::info!("{path:?}: saved {saved} exports");
                had_success = true;
            }
            Err(e) => log::error!("failed to replay {path:?}: {e:#}"),
        }
    }
    if had_success {
        Ok(())
    } else {
        anyhow::bail!("no script replayed successfully")
    }
}
