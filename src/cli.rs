//! Headless command-line front end.
//!
//! `strata [IMAGE]` opens a document (or a blank canvas) and runs a
//! self-check pass over it; `--output` additionally flattens and writes the
//! result.  Exit status: 0 on success, 1 on any failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::error::EditorError;
use crate::io;
use crate::manager::LayerManager;
use crate::{log_err, log_info};

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Layered raster editing core")]
pub struct CliArgs {
    /// Image to open as the document background.  Omit for a blank canvas.
    pub input: Option<PathBuf>,

    /// Flatten the document and write it here before exiting.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Blank canvas width (ignored when an input image is given).
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Blank canvas height (ignored when an input image is given).
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Print the layer stack to stdout.
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(args: CliArgs) -> ExitCode {
    match run_inner(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("{}", e);
            eprintln!("strata: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_inner(args: &CliArgs) -> Result<(), EditorError> {
    let mgr = match &args.input {
        Some(path) => io::open_as_document(path)?,
        None => LayerManager::new(args.width, args.height)?,
    };
    log_info!(
        "Document ready: {}x{}, {} layer(s)",
        mgr.width(),
        mgr.height(),
        mgr.layer_count()
    );

    if args.verbose {
        for i in 0..mgr.layer_count() {
            if let Some(layer) = mgr.layer(i) {
                println!(
                    "  [{}] {:?} visible={} opacity={:.2} blend={}",
                    i,
                    layer.name,
                    layer.visible,
                    layer.opacity(),
                    layer.blend_mode.name()
                );
            }
        }
    }

    if let Some(out) = &args.output {
        io::export_flattened(&mgr, out)?;
    }
    Ok(())
}
