mod args;

use anyhow::Result;
use thermal_view::{
    cli::{init_logging, Inflector},
    RadiometricFiles, Session, ViewerConfig,
};

use args::Args;

fn main() -> Result<()> {
    init_logging();
    let args = Args::from_cmd_line()?;

    let mut config = ViewerConfig {
        unit: args.unit,
        ..ViewerConfig::default()
    };
    if let Some(decimals) = args.decimals {
        config.pixel_decimals = decimals;
    }
    let mut session = Session::new(config);
    session.open(&RadiometricFiles, &args.path)?;
    session.set_unit(args.unit)?;
    session.seek(args.frame as f64)?;

    let raw = match session.raw_frame() {
        Some(raw) => raw,
        None => anyhow::bail!("nothing decoded"),
    };
    let stats = raw.stats();
    let unit = raw.unit();
    eprintln!(
        "{}: {}x{}, {} frames",
        args.path.display(),
        raw.width(),
        raw.height(),
        session.frame_count()
    );
    eprintln!("{}", session.frame_label());
    eprintln!(
        "{} range: {} .. {} {}",
        unit.to_string().to_title_case(),
        unit.format(stats.min, 2),
        unit.format(stats.max, 2),
        unit.label()
    );

    if args.metadata {
        let rows = session.metadata_rows();
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (label, value) in rows {
            println!("{:width$}  {}", label, value, width = width);
        }
    }

    // Frame coordinates: the canvas is the frame itself.
    let canvas = (raw.width(), raw.height());
    for &pixel in &args.pixels {
        let text = session.status_text(canvas, pixel);
        if text.is_empty() {
            println!("X:{} Y:{} | outside frame", pixel.0, pixel.1);
        } else {
            println!("{}", text);
        }
    }

    if let Some(path) = &args.csv {
        session.export_csv(path)?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
