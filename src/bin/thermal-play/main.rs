mod args;
mod render;

use std::{fs, thread};

use anyhow::{Context, Result};
use thermal_view::{
    cli::{init_logging, load_config, progress_bar},
    RadiometricFiles, Session, ViewerError,
};
use tracing::warn;

use crate::{args::Args, render::write_view_png};

fn main() -> Result<()> {
    init_logging();
    let args = Args::from_cmd_line()?;

    let mut config = load_config(args.config.as_deref())?;
    if let Some(palette) = args.palette {
        config.palette = palette;
    }
    if let Some(unit) = args.unit {
        config.unit = unit;
    }
    let interval = config.tick_interval();

    let mut session = Session::new(config);
    session.open(&RadiometricFiles, &args.path)?;
    if let Some(unit) = args.unit {
        // the document may have fallen back to counts
        session.set_unit(unit)?;
    }
    if let Some(dir) = &args.output {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let total = args.frames.unwrap_or_else(|| session.frame_count());
    let bar = progress_bar(total as u64);
    let mut rendered = 0;
    session.toggle_play()?;
    while rendered < total {
        match session.tick() {
            Ok(t) if t.render.is_some() => {}
            Ok(_) => continue,
            Err(e @ ViewerError::Decode { .. }) => {
                warn!("{}", e);
                session.toggle_play()?;
                bar.inc(1);
                rendered += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
        if let Some(view) = session.view() {
            println!("{}", serde_json::to_string(&view.summary())?);
            if let Some(dir) = &args.output {
                let path = dir.join(format!("frame-{:05}.png", view.index));
                write_view_png(view, session.legend().gradient(), &path)?;
            }
        }
        bar.inc(1);
        rendered += 1;
        if args.realtime {
            thread::sleep(interval);
        }
    }
    bar.finish();

    eprintln!("Rendered {} frames", rendered);
    Ok(())
}
