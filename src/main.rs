mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use image_view_cache::{FilesystemImageStore, Frame, ViewerController, ViewerError};

use crate::cli::Cli;

fn report(frame: &Frame, total: usize, output: Option<&Path>) {
    println!(
        "[{}/{}] {} -> {}x{} at ({}, {})",
        frame.index + 1,
        total,
        frame.path.display(),
        frame.bitmap.width(),
        frame.bitmap.height(),
        frame.x,
        frame.y
    );

    if let Some(dir) = output {
        let name = frame
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}", frame.index));
        let dest = dir.join(format!("{:04}_{}.png", frame.index, name));
        if let Err(e) = frame.bitmap.pixels().save(&dest) {
            log::error!("Failed to write {}: {}", dest.display(), e);
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match cli.viewer_config() {
        Ok(c) => c,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &cli.output {
        if let Err(e) = std::fs::create_dir_all(dir) {
            log::error!("Failed to create {}: {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let mut viewer = ViewerController::new(FilesystemImageStore::new(), config);
    if let Err(e) = viewer.open_file(&cli.path) {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = viewer.resize(cli.width, cli.height) {
        log::error!("{}", e);
    }

    let total = viewer.image_set().len();
    let mut failures = 0;
    let mut handle = |result: Result<Frame, ViewerError>| match result {
        Ok(frame) => report(&frame, total, cli.output.as_deref()),
        Err(e) => {
            failures += 1;
            eprintln!("{}", e);
        }
    };

    handle(viewer.show_current());
    for _ in 0..cli.steps {
        if cli.reverse {
            handle(viewer.previous());
        } else {
            handle(viewer.next());
        }
    }

    println!("{}", viewer.memory_report());
    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
