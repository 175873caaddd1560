use rand::Rng;
use smlm_emitters::{CsvFormat, CsvOptions, EmitterSet, LooseEmitterSet, Scale, XyUnit};
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "emitters", about = "SMLM emitter sets inspection and export")]
struct Opt {
    /// Path to the emitters file (.csv, .csv.gz or .pkl)
    #[structopt(parse(from_os_str), required_unless = "simulate")]
    input: Option<PathBuf>,
    /// Coordinates unit (px or nm), overrides the unit of the emitters file
    #[structopt(short, long)]
    unit: Option<String>,
    /// Pixel size (2 or 3 values)
    #[structopt(long = "px-size")]
    px_size: Vec<f64>,
    /// First frame index
    #[structopt(short, long)]
    start: Option<i64>,
    /// Last frame index
    #[structopt(short, long)]
    end: Option<i64>,
    /// Display the number of emitters per frame
    #[structopt(long)]
    split: bool,
    /// Save the emitters to a pickle (.pkl) or CSV (.csv, .csv.gz) file
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// CSV export preset (challenge or plain)
    #[structopt(short, long)]
    preset: Option<String>,
    /// Comment added to the CSV header
    #[structopt(long)]
    comments: Option<String>,
    /// Simulates the given number of blinking emitters
    #[structopt(long)]
    simulate: Option<usize>,
    /// Number of frames of the simulation
    #[structopt(long, default_value = "100")]
    frames: usize,
    /// Field of view of the simulation
    #[structopt(long, default_value = "64")]
    extent: f64,
}

fn is_pickle(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "pkl")
}

fn load(path: &Path) -> Result<EmitterSet, smlm_emitters::Error> {
    Ok(if is_pickle(path) {
        EmitterSet::load_pickle(path)?
    } else {
        EmitterSet::read_csv_file(path)?
    })
}

/// Random blinks lowered to frames
fn simulate(
    num_emitters: usize,
    n_frames: usize,
    extent: f64,
) -> Result<EmitterSet, smlm_emitters::Error> {
    let mut rng = rand::thread_rng();
    let xyz: Vec<[f64; 3]> = (0..num_emitters)
        .map(|_| [rng.gen::<f64>() * extent, rng.gen::<f64>() * extent, 0f64])
        .collect();
    let intensity: Vec<f64> = (0..num_emitters)
        .map(|_| rng.gen_range(500f64..5000f64))
        .collect();
    let ontime: Vec<f64> = (0..num_emitters)
        .map(|_| -3f64 * (1f64 - rng.gen::<f64>()).ln())
        .collect();
    let t0: Vec<f64> = (0..num_emitters)
        .map(|_| rng.gen::<f64>() * n_frames as f64)
        .collect();
    let loose = LooseEmitterSet::new(xyz, intensity, ontime, t0, None, Some(XyUnit::Px))?;
    Ok(loose.return_emitterset()?)
}

fn save(em: &EmitterSet, path: &Path, opt: &Opt) -> Result<(), smlm_emitters::Error> {
    if is_pickle(path) {
        return Ok(em.save_pickle(path)?);
    }
    let mut options = CsvOptions::new();
    if let Some(comments) = &opt.comments {
        options = options.comments(comments.as_str());
    }
    let format = match &opt.preset {
        Some(preset) => CsvFormat::from(options).preset(preset.as_str()),
        None => CsvFormat::from(options),
    };
    Ok(em.write_csv_format_file(path, &format)?)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let mut em = match (opt.simulate, &opt.input) {
        (Some(n), _) => simulate(n, opt.frames, opt.extent)?,
        (None, Some(path)) => load(path)?,
        (None, None) => anyhow::bail!("either an input file or --simulate is required"),
    };
    if let Some(unit) = &opt.unit {
        em.set_xy_unit(Some(XyUnit::new(unit)?));
    }
    if !opt.px_size.is_empty() {
        em.set_px_size(Some(Scale::try_from(opt.px_size.as_slice())?));
    }
    if opt.start.is_some() || opt.end.is_some() {
        let (f0, f1) = em.frame_range().unwrap_or_default();
        em = em.get_subset_frame(opt.start.unwrap_or(f0), opt.end.unwrap_or(f1), None)?;
    }
    println!("{}", em);

    if opt.split {
        let first = em.frame_range().map(|(f0, _)| f0).unwrap_or_default();
        println!("{:>8} {:>8}", "FRAME", "#");
        for (k, frame) in em.split_in_frames(None, None).enumerate() {
            println!("{:>8} {:>8}", first + k as i64, frame.len());
        }
    }

    if let Some(path) = &opt.output {
        save(&em, path, &opt)?;
    }

    Ok(())
}
