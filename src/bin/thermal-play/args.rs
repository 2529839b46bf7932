use anyhow::Result;
use clap::value_t_or_exit;
use std::path::PathBuf;
use thermal_view::{arg, args_parser, opt, DisplayUnit, Palette};

pub struct Args {
    pub path: PathBuf,
    pub palette: Option<Palette>,
    pub unit: Option<DisplayUnit>,
    pub output: Option<PathBuf>,
    pub frames: Option<usize>,
    pub realtime: bool,
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermal-play")
            .about("Play a radiometric sequence headlessly, writing false-color frames.")
            .arg(
                opt!("palette")
                    .short("p")
                    .help("Palette name, e.g. jet, ironbow, lava, arctic"),
            )
            .arg(
                opt!("unit")
                    .short("u")
                    .help("Decode unit: counts, temperature or radiance"),
            )
            .arg(
                opt!("output")
                    .short("o")
                    .help("Directory to write one PNG per rendered frame"),
            )
            .arg(
                opt!("frames")
                    .short("n")
                    .help("Number of frames to render (default: one pass)"),
            )
            .arg(
                opt!("realtime")
                    .takes_value(false)
                    .help("Wait one tick interval between frames"),
            )
            .arg(opt!("config").short("c").help("Viewer config json"))
            .arg(
                arg!("path")
                    .required(true)
                    .help("FLIR jpeg, seq or exiftool json"),
            )
            .get_matches();

        let path = value_t_or_exit!(matches, "path", PathBuf);
        let palette = matches
            .is_present("palette")
            .then(|| value_t_or_exit!(matches, "palette", Palette));
        let unit = matches
            .is_present("unit")
            .then(|| value_t_or_exit!(matches, "unit", DisplayUnit));
        let output = matches.value_of("output").map(PathBuf::from);
        let frames = matches
            .is_present("frames")
            .then(|| value_t_or_exit!(matches, "frames", usize));
        let config = matches.value_of("config").map(PathBuf::from);

        Ok(Args {
            path,
            palette,
            unit,
            output,
            frames,
            realtime: matches.is_present("realtime"),
            config,
        })
    }
}
