use crate::cli::SpecularArgs;
use crate::config::SceneFile;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use gisim::engine::progress::ProgressReporter;
use gisim::workflows::specular;
use tracing::info;

pub fn run(args: SpecularArgs) -> Result<()> {
    if args.n_points < 2 {
        return Err(CliError::Argument(
            "the angle grid needs at least 2 points".into(),
        ));
    }
    if args.alpha_max <= args.alpha_min {
        return Err(CliError::Argument(format!(
            "empty angle range [{}, {}]",
            args.alpha_min, args.alpha_max
        )));
    }

    let scene = SceneFile::from_file(&args.scene)?;
    let sample = scene.sample.build()?;
    let beam = scene.beam.build();
    let options = scene.options();

    let step = (args.alpha_max - args.alpha_min) / (args.n_points - 1) as f64;
    let grid: Vec<f64> = (0..args.n_points)
        .map(|i| (args.alpha_min + i as f64 * step).to_radians())
        .collect();

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting reflectivity scan...");
    info!(n_points = args.n_points, "Invoking the specular workflow...");

    let result = specular::run(&sample, &beam, &grid, &options, &reporter)?;

    let mut writer = csv::Writer::from_path(&args.output)?;
    writer.write_record(["alpha_deg", "reflectivity"])?;
    for (alpha, r) in result.alpha_i.iter().zip(result.reflectivity.iter()) {
        writer.write_record([format!("{:.6}", alpha.to_degrees()), format!("{:.8e}", r)])?;
    }
    writer.flush()?;

    println!(
        "✓ Reflectivity curve ({} points) written to: {}",
        result.reflectivity.len(),
        args.output.display()
    );
    Ok(())
}
