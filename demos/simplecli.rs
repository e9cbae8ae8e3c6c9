#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]
#![warn(
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice
)]

use std::{fmt::Display, path::PathBuf};

use clap::{Parser, ValueEnum};
use pnnquant::{ColorSpace, ImagePipeline, PaletteSize};

#[derive(Copy, Clone, ValueEnum)]
enum CliColorSpace {
    Auto,
    Lab,
    Srgb,
}

impl From<CliColorSpace> for Option<ColorSpace> {
    fn from(value: CliColorSpace) -> Self {
        match value {
            CliColorSpace::Auto => None,
            CliColorSpace::Lab => Some(ColorSpace::Lab),
            CliColorSpace::Srgb => Some(ColorSpace::Srgb),
        }
    }
}

impl Display for CliColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CliColorSpace::Auto => "auto",
                CliColorSpace::Lab => "lab",
                CliColorSpace::Srgb => "srgb",
            }
        )
    }
}

#[derive(Parser)]
pub struct Options {
    #[arg(short, long, default_value_t = PaletteSize::default(), value_parser = parse_palette_size)]
    k: PaletteSize,

    #[arg(long, default_value_t = CliColorSpace::Auto)]
    colorspace: CliColorSpace,

    /// Turn off error diffusion and use the blue-noise pass instead.
    #[arg(long)]
    no_dither: bool,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long)]
    verbose: bool,

    input: PathBuf,

    output: PathBuf,
}

fn parse_palette_size(s: &str) -> Result<PaletteSize, String> {
    let value: u16 = s.parse().map_err(|e| format!("{e}"))?;
    value.try_into().map_err(|e| format!("{e}"))
}

fn main() {
    let Options {
        k,
        colorspace,
        no_dither,
        seed,
        verbose,
        input,
        output,
    } = Options::parse();

    macro_rules! log {
        ($name: literal, $val: expr) => {
            if verbose {
                let time = std::time::Instant::now();
                let value = $val;
                println!("{} took {}ms", $name, time.elapsed().as_millis());
                value
            } else {
                $val
            }
        };
    }

    let image = log!("read image", image::open(input).unwrap().into_rgba8());

    let mut pipeline = ImagePipeline::try_from(&image).unwrap();
    pipeline
        .palette_size(k)
        .colorspace(colorspace.into())
        .dither(!no_dither)
        .seed(seed);

    let image = log!("quantization and remapping", pipeline.quantized_rgbaimage());

    log!("write image", image.save(output).unwrap())
}
