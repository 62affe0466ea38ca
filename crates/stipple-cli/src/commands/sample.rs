//! Sample an image into a point cloud and report it

use anyhow::{bail, Result};
use stipple_sampler::{ColorBoost, SampleCache, Sampler};

pub struct SampleArgs {
    pub image: String,
    pub width: f32,
    pub gap: f32,
    pub boost_mult: f32,
    pub boost_gamma: f32,
    pub format: String,
}

pub fn run(args: SampleArgs) -> Result<()> {
    let sampler = Sampler::new(SampleCache::new()).with_boost(ColorBoost {
        mult: args.boost_mult,
        gamma: args.boost_gamma,
    });

    let width = (args.width.min(2000.0).floor() as u32).max(10);
    let image = sampler.prefetch(&args.image, width, args.gap);

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(image.as_ref())?);
        }
        "summary" => {
            println!("Source: {}", args.image);
            println!("Grid: {}x{}", image.width, image.height);
            println!("Points: {}", image.points.len());
            if let Some(err) = &image.error {
                println!("Error: {}", err);
            } else if image.points.is_empty() {
                println!("No pixels above the alpha cutoff; playback would fall back to the bitmap");
            }
        }
        other => bail!("unknown format '{}'; valid values: summary, json", other),
    }

    Ok(())
}
