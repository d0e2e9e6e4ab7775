// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::{self, Read, Write};
use std::process;

use clap::{App, Arg, ArgMatches};
use failure::{format_err, Error, ResultExt};
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ColorType, ImageFormat, RgbImage};
use pamcarve::{CarveError, CarveObserver, Config, EnergyStroke, Priority, SeamCarver, SeamImage};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Reports progress through the log instead of a window.
struct LoggingObserver;

impl CarveObserver for LoggingObserver {
    fn image_changed(&mut self, image: &RgbImage) {
        debug!(width = image.width(), height = image.height(), "image changed");
    }

    fn operation_completed(&mut self, outcome: Result<(), &CarveError>) {
        if let Err(err) = outcome {
            warn!("operation failed: {}", err);
        }
    }

    fn seam_highlighted(&mut self, points: &[(u32, u32)]) {
        info!(pixels = points.len(), "seams selected");
    }
}

fn init_tracing(verbosity: u64) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pamcarve={},pnmcarve={}", level, level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn numeric(matches: &ArgMatches, name: &str) -> Result<Option<u32>, Error> {
    match matches.value_of(name) {
        None => Ok(None),
        Some(value) => Ok(Some(
            value
                .parse::<u32>()
                .with_context(|_| format!("--{} expects a whole number, got {:?}", name, value))?,
        )),
    }
}

// "x,y,width,height"
fn rectangle(text: &str, priority: Priority) -> Result<EnergyStroke, Error> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|_| format!("bad rectangle {:?}", text))?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(EnergyStroke::rectangle(*x, *y, *width, *height, priority)),
        _ => Err(format_err!("rectangle {:?} needs four values: x,y,width,height", text)),
    }
}

fn strokes(matches: &ArgMatches) -> Result<Vec<EnergyStroke>, Error> {
    let mut strokes = Vec::new();
    for (name, priority) in &[("keep", Priority::Keep), ("remove", Priority::Remove)] {
        if let Some(values) = matches.values_of(name) {
            for value in values {
                strokes.push(rectangle(value, *priority)?);
            }
        }
    }
    Ok(strokes)
}

fn read_image(path: &str) -> Result<RgbImage, Error> {
    let image = if path == "-" {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("could not read standard input")?;
        image::load_from_memory_with_format(&bytes, ImageFormat::Pnm)
            .context("standard input is not a portable anymap")?
    } else {
        image::open(path).with_context(|_| format!("could not read {}", path))?
    };
    Ok(image.to_rgb8())
}

fn write_image(image: &RgbImage, path: &str) -> Result<(), Error> {
    if path == "-" {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        PnmEncoder::new(&mut out)
            .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
            .encode(image.as_raw().as_slice(), image.width(), image.height(), ColorType::Rgb8)
            .context("could not write to standard output")?;
        out.flush().context("could not write to standard output")?;
    } else {
        image.save(path).with_context(|_| format!("could not write {}", path))?;
    }
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let input = matches.value_of("input").unwrap_or("-");
    let output = matches.value_of("output").unwrap_or("-");

    let defaults = Config::default();
    let config = Config {
        filter: matches.value_of("filter").unwrap_or("sobel").parse()?,
        cache_limit: numeric(matches, "cache-limit")?.unwrap_or(defaults.cache_limit),
        batch: numeric(matches, "batch")?.unwrap_or(defaults.batch),
    };

    let mut seams = SeamImage::new(read_image(input)?, &config)?;
    seams.subscribe(Box::new(LoggingObserver));

    let overlay = strokes(matches)?;
    if !overlay.is_empty() {
        seams.set_energy(overlay)?;
    }

    let (width, height) = seams.size();
    let newwidth = numeric(matches, "width")?.unwrap_or(width);
    let newheight = numeric(matches, "height")?.unwrap_or(height);
    SeamCarver::new(&mut seams, config.batch)
        .paint_seams(matches.is_present("paint-seams"))
        .resize(newwidth, newheight)?;

    if let Some(path) = matches.value_of("energy-map") {
        seams
            .energy_map_image()?
            .save(path)
            .with_context(|_| format!("could not write {}", path))?;
    }

    let stats = seams.cache_stats();
    info!(
        from = %format!("{}x{}", width, height),
        to = %format!("{}x{}", newwidth, newheight),
        refreshes = stats.refreshes,
        "carved"
    );
    write_image(seams.image(), output)
}

fn main() {
    let matches = App::new("pnmcarve")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Content-aware resizing by seam carving")
        .arg(
            Arg::with_name("input")
                .help("The image to resize, or - for a portable anymap on standard input")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .help("Where to write the result, or - for a portable pixmap on standard output")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("width")
                .long("width")
                .value_name("PIXELS")
                .help("The width to carve or grow to")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("height")
                .long("height")
                .value_name("PIXELS")
                .help("The height to carve or grow to")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("filter")
                .short("f")
                .long("filter")
                .help("The edge detector used for the energy map")
                .possible_values(&["sobel", "prewitt", "roberts"])
                .default_value("sobel"),
        )
        .arg(
            Arg::with_name("batch")
                .short("b")
                .long("batch")
                .value_name("SEAMS")
                .help("Seams removed or added per step")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("cache-limit")
                .long("cache-limit")
                .value_name("SEAMS")
                .help("The fewest seams to find whenever the cache is rebuilt")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("keep")
                .long("keep")
                .value_name("X,Y,W,H")
                .help("Protect a rectangle from carving")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1),
        )
        .arg(
            Arg::with_name("remove")
                .long("remove")
                .value_name("X,Y,W,H")
                .help("Carve through a rectangle first")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1),
        )
        .arg(
            Arg::with_name("energy-map")
                .long("energy-map")
                .value_name("FILE")
                .help("Also write the final energy map as a grayscale image")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("paint-seams")
                .long("paint-seams")
                .help("Log the seams chosen for every step"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("More logging; repeat for more"),
        )
        .get_matches();

    init_tracing(matches.occurrences_of("verbose"));

    if let Err(err) = run(&matches) {
        for cause in err.iter_chain() {
            error!("{}", cause);
        }
        process::exit(1);
    }
}
