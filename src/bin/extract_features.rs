use std::path::Path;
use std::time::Instant;

use clap::Parser;
use local_features::config::{ExtractorConfig, Method};
use local_features::data_loader::extract_folder;
use local_features::extraction::LocalFeatureExtractor;
use local_features::io::{object_from_json, object_to_json, write_extraction_report};

#[derive(Parser)]
#[command(version, about, author)]
struct LfrsCli {
    /// image folder, or exactly two image files for pair mode
    #[arg(required = true)]
    paths: Vec<String>,

    /// json config file; the flags below override its values
    #[arg(long)]
    config: Option<String>,

    /// extraction backend
    #[arg(value_enum, long)]
    method: Option<Method>,

    /// maximum keypoints per image
    #[arg(long)]
    n_features: Option<usize>,

    /// per-image summary output
    #[arg(long, default_value = "extraction_report.json")]
    report: String,

    /// dump keypoints/descriptors as json
    #[arg(long)]
    output: Option<String>,
}

fn main() {
    env_logger::init();
    let cli = LfrsCli::parse();

    let mut config: ExtractorConfig = match &cli.config {
        Some(path) => object_from_json(path).expect("failed to read config"),
        None => ExtractorConfig::default(),
    };
    if let Some(method) = cli.method {
        config.method = method;
    }
    if let Some(n_features) = cli.n_features {
        config.n_features = n_features;
    }

    let extractor = LocalFeatureExtractor::new(&config).expect("failed to build extractor");

    let now = Instant::now();
    let entries = match cli.paths.as_slice() {
        [folder] => extract_folder(&extractor, folder).expect("extraction failed"),
        [im0, im1] => {
            let pair = extractor
                .run(Path::new(im0), Path::new(im1))
                .expect("extraction failed");
            let [s0, s1] = pair.stems;
            let [f0, f1] = pair.features;
            vec![(s0, f0), (s1, f1)]
        }
        _ => {
            eprintln!("expected an image folder or exactly two image files");
            std::process::exit(1);
        }
    };
    let duration_sec = now.elapsed().as_secs_f64();
    println!("extracting features took {:.6} sec", duration_sec);
    println!("avg: {} sec", duration_sec / entries.len().max(1) as f64);
    for (stem, features) in &entries {
        println!(
            "{}: {} keypoints, descriptor dim {}",
            stem,
            features.len(),
            features.descriptors.dim()
        );
    }

    write_extraction_report(&cli.report, &config.method.to_string(), &entries)
        .expect("failed to write report");
    if let Some(output) = &cli.output {
        object_to_json(output, &entries).expect("failed to write features");
    }

    #[cfg(feature = "visualization")]
    {
        let recording = rerun::RecordingStreamBuilder::new("extraction")
            .save("extraction.rrd")
            .unwrap();
        local_features::visualization::log_image_features(&recording, "/cam0", &entries);
    }
}
