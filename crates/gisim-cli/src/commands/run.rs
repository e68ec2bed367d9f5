use crate::cli::RunArgs;
use crate::config::SceneFile;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use gisim::engine::progress::ProgressReporter;
use gisim::engine::state::RunStatus;
use gisim::workflows::scatter;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    let scene = SceneFile::from_file(&args.scene)?;

    let sample = scene.sample.build()?;
    let beam = scene.beam.build();
    let detector = scene
        .detector
        .as_ref()
        .ok_or_else(|| {
            CliError::Config("the 'run' command requires a [detector] section".into())
        })?
        .build();

    let mut options = scene.options();
    if let Some(workers) = args.workers {
        options.n_workers = workers;
    }
    if let Some(subslices) = args.subslices {
        options.n_subslices = subslices;
    }
    if args.average_materials {
        options.use_average_materials = true;
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting scattering simulation...");
    info!("Invoking the scattering workflow...");

    let result = scatter::run(&sample, &beam, &detector, &options, &reporter)?;

    match result.status {
        RunStatus::Completed => {
            info!(
                "Workflow finished with {} intensities.",
                result.intensities.len()
            );
            write_intensity_table(&args.output, &detector, &result.intensities)?;
            println!(
                "✓ Intensity map ({} pixels) written to: {}",
                result.intensities.len(),
                args.output.display()
            );
            Ok(())
        }
        RunStatus::Failed { message } => {
            warn!("Workflow reported failure: {}", message);
            Err(CliError::Simulation(message))
        }
        other => Err(CliError::Simulation(format!(
            "unexpected final run status {other:?}"
        ))),
    }
}

fn write_intensity_table(
    path: &Path,
    detector: &gisim::core::instrument::SphericalDetector,
    intensities: &[f64],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["phi_deg", "alpha_deg", "intensity"])?;
    for i_alpha in 0..detector.n_alpha {
        for i_phi in 0..detector.n_phi {
            let (phi, alpha, _, _) = detector.bin(i_phi, i_alpha);
            let value = intensities[i_alpha * detector.n_phi + i_phi];
            writer.write_record([
                format!("{:.6}", phi.to_degrees()),
                format!("{:.6}", alpha.to_degrees()),
                format!("{:.8e}", value),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}
