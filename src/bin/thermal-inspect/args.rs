use anyhow::Result;
use clap::value_t_or_exit;
use std::path::PathBuf;
use thermal_view::{arg, args_parser, cli::parse_pixel, opt, DisplayUnit};

pub struct Args {
    pub path: PathBuf,
    pub frame: usize,
    pub unit: DisplayUnit,
    pub pixels: Vec<(i64, i64)>,
    pub csv: Option<PathBuf>,
    pub metadata: bool,
    pub decimals: Option<usize>,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermal-inspect")
            .setting(clap::AppSettings::AllowLeadingHyphen)
            .about("Decode one frame and report metadata and pixel values.")
            .arg(opt!("frame").short("f").help("Frame index (default: 0)"))
            .arg(
                opt!("unit")
                    .short("u")
                    .help("Decode unit: counts, temperature or radiance"),
            )
            .arg(
                opt!("pixel")
                    .short("x")
                    .multiple(true)
                    .number_of_values(1)
                    .help("Pixel to read as X,Y in frame coordinates"),
            )
            .arg(opt!("csv").help("Export the frame as comma-separated values"))
            .arg(
                opt!("metadata")
                    .short("m")
                    .takes_value(false)
                    .help("Print the metadata table"),
            )
            .arg(
                opt!("decimals")
                    .short("d")
                    .help("Decimals for pixel values (1 to 4)"),
            )
            .arg(
                arg!("path")
                    .required(true)
                    .help("FLIR jpeg, seq or exiftool json"),
            )
            .get_matches();

        let path = value_t_or_exit!(matches, "path", PathBuf);
        let frame = matches
            .is_present("frame")
            .then(|| value_t_or_exit!(matches, "frame", usize))
            .unwrap_or(0);
        let unit = matches
            .is_present("unit")
            .then(|| value_t_or_exit!(matches, "unit", DisplayUnit))
            .unwrap_or(DisplayUnit::Counts);
        let pixels = matches
            .values_of("pixel")
            .into_iter()
            .flatten()
            .map(parse_pixel)
            .collect::<Result<_>>()?;
        let decimals = matches
            .is_present("decimals")
            .then(|| value_t_or_exit!(matches, "decimals", usize));

        Ok(Args {
            path,
            frame,
            unit,
            pixels,
            csv: matches.value_of("csv").map(PathBuf::from),
            metadata: matches.is_present("metadata"),
            decimals,
        })
    }
}
