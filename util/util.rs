#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use pnnquant::Pixel;

/// An image as ARGB pixels along with its dimensions.
pub struct ArgbImage {
    pub pixels: Vec<Pixel>,
    pub width: u32,
    pub height: u32,
}

pub fn to_argb(image: &image::RgbaImage) -> ArgbImage {
    let pixels = image
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            u32::from_be_bytes([a, r, g, b])
        })
        .collect();

    ArgbImage {
        pixels,
        width: image.width(),
        height: image.height(),
    }
}

pub fn load_images(images: &[PathBuf]) -> Vec<(String, ArgbImage)> {
    images
        .iter()
        .map(|path| {
            image::open(path).map(|image| {
                (
                    path.file_name().unwrap().to_owned().into_string().unwrap(),
                    to_argb(&image.into_rgba8()),
                )
            })
        })
        .collect::<Result<_, _>>()
        .expect("loaded each image")
}

pub fn load_image_dir(dir: impl AsRef<Path>) -> Vec<(String, ArgbImage)> {
    let mut paths = std::fs::read_dir(dir)
        .expect("read img directory")
        .collect::<Result<Vec<_>, _>>()
        .expect("read each file")
        .iter()
        .map(std::fs::DirEntry::path)
        .collect::<Vec<_>>();

    paths.sort();

    load_images(&paths)
}

pub const BENCHMARK_DIR: &str = "img/benchmark";

pub fn load_image_dir_relative_to_root(dir: impl AsRef<Path>) -> Vec<(String, ArgbImage)> {
    // assume current exe path is something like: target/build/deps/current_exe
    let exe = std::env::current_exe().unwrap();
    let root = exe
        .parent()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap();

    load_image_dir(root.join(dir.as_ref()))
}

static BENCHMARK_IMAGES: OnceLock<Vec<(String, ArgbImage)>> = OnceLock::new();

pub fn benchmark_images() -> &'static [(String, ArgbImage)] {
    BENCHMARK_IMAGES.get_or_init(|| load_image_dir_relative_to_root(BENCHMARK_DIR))
}
