use argh::FromArgs;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use falloff::image::{Image, ImageError, ImageSize};
use falloff::imgproc::{distance_transform::DistanceTransformExecutor, parallel::ExecutionStrategy};

const RAMP: &[u8] = b" .:-=+*#%@";

#[derive(FromArgs)]
/// Compute the distance field of a random mask and print a summary
struct Args {
    /// width of the mask in pixels
    #[argh(option, default = "256")]
    width: usize,

    /// height of the mask in pixels
    #[argh(option, default = "256")]
    height: usize,

    /// number of random feature pixels
    #[argh(option, short = 'n', default = "16")]
    features: usize,

    /// seed of the random generator
    #[argh(option, short = 's', default = "42")]
    seed: u64,

    /// worker threads, 0 uses the global pool and 1 runs serially
    #[argh(option, short = 't', default = "0")]
    threads: usize,

    /// print an ascii preview of the field
    #[argh(switch, short = 'p')]
    preview: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let size = ImageSize {
        width: args.width,
        height: args.height,
    };
    if size.width == 0 || size.height == 0 {
        return Err(format!("mask must not be empty, got {size}").into());
    }

    // scatter the feature pixels
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut mask = Image::<u8, 1>::from_size_val(size, 0)?;
    for _ in 0..args.features {
        let x = rng.random_range(0..size.width);
        let y = rng.random_range(0..size.height);
        mask.set_pixel(x, y, 0, 1)?;
    }

    let strategy = match args.threads {
        0 => ExecutionStrategy::Parallel,
        1 => ExecutionStrategy::Serial,
        n => ExecutionStrategy::Fixed(n),
    };

    let mut executor = DistanceTransformExecutor::with_strategy(strategy);
    let start = Instant::now();
    let field = executor.execute(&mask)?;
    log::info!(
        "distance field for {size} computed in {:?} on {} threads",
        start.elapsed(),
        strategy.num_threads()
    );

    let values = field.as_slice();
    let max = values.iter().copied().fold(0.0f32, f32::max);
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
    log::info!("max distance {max:.4}, mean distance {mean:.4}");

    if args.preview {
        let cols = size.width.min(64);
        let rows = size.height.min(32);
        for r in 0..rows {
            let line = (0..cols)
                .map(|c| -> Result<char, ImageError> {
                    let x = c * size.width / cols;
                    let y = r * size.height / rows;
                    let v = field.get_pixel(x, y, 0)?;
                    let t = if max > 0.0 { v / max } else { 0.0 };
                    let i = (t * (RAMP.len() - 1) as f32).round() as usize;
                    Ok(RAMP[i.min(RAMP.len() - 1)] as char)
                })
                .collect::<Result<String, _>>()?;
            println!("{line}");
        }
    }

    Ok(())
}
