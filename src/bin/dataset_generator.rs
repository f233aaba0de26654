use std::path::Path;

use clap::{Parser, Subcommand};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic images with corner-rich shapes
    Generate {
        /// Output directory
        #[arg(short, long)]
        output: String,

        /// Number of images to generate
        #[arg(short, long, default_value = "20")]
        num_images: usize,

        /// Image width
        #[arg(long, default_value = "640")]
        width: u32,

        /// Image height
        #[arg(long, default_value = "480")]
        height: u32,

        /// Shapes per image
        #[arg(long, default_value = "12")]
        shapes: usize,

        /// Random seed
        #[arg(long, default_value = "7")]
        seed: u64,
    },
}

fn synthetic_image(rng: &mut ChaCha8Rng, width: u32, height: u32, shapes: usize) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([16]));
    for _ in 0..shapes {
        let x = rng.random_range(0..width.saturating_sub(40).max(1)) as i32;
        let y = rng.random_range(0..height.saturating_sub(40).max(1)) as i32;
        let w = rng.random_range(10..40);
        let h = rng.random_range(10..40);
        let shade = Luma([rng.random_range(96..=255u8)]);
        if rng.random_bool(0.7) {
            draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), shade);
        } else {
            draw_filled_circle_mut(&mut img, (x + 20, y + 20), (w / 2) as i32, shade);
        }
    }
    img
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    match args.command {
        Commands::Generate {
            output,
            num_images,
            width,
            height,
            shapes,
            seed,
        } => {
            std::fs::create_dir_all(&output).expect("failed to create output dir");
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for idx in 0..num_images {
                let img = synthetic_image(&mut rng, width, height, shapes);
                let path = Path::new(&output).join(format!("{:06}.png", idx));
                img.save(&path).expect("failed to save image");
                log::trace!("wrote {}", path.display());
            }
            println!("generated {} images in {}", num_images, output);
        }
    }
}
