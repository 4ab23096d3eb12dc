use argh::FromArgs;
use std::path::{Path, PathBuf};

use vips_bridge::{
    cache::{self, CacheOptions},
    Argument, Image, Output, VOption, Vips, VipsConfig, VipsError,
};

#[derive(FromArgs)]
/// Load an image, wrap it in a tile cache and save the result
struct Args {
    /// path to the input image
    #[argh(positional)]
    input: PathBuf,

    /// path to the output image, the suffix selects the format
    #[argh(positional)]
    output: PathBuf,

    /// maximum number of tiles to keep
    #[argh(option)]
    max_tiles: Option<i32>,

    /// tile width in pixels
    #[argh(option)]
    tile_width: Option<i32>,

    /// tile height in pixels
    #[argh(option)]
    tile_height: Option<i32>,
}

fn path_str(path: &Path) -> Result<&str, Box<dyn std::error::Error>> {
    path.to_str()
        .ok_or_else(|| format!("path is not valid UTF-8: {}", path.display()).into())
}

fn load(path: &Path) -> Result<Image, Box<dyn std::error::Error>> {
    let filename = path_str(path)?;
    let loader = Vips::foreign_find_load(filename)?;
    log::debug!("loading {filename} with {loader}");

    let mut image = None;
    vips_bridge::call(
        &loader,
        VOption::new()
            .set("filename", Argument::Str(filename))
            .out("out", Output::Image(&mut image)),
    )?;
    Ok(image.ok_or(VipsError::NullPointer("image"))?)
}

fn save(image: &Image, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let filename = path_str(path)?;
    let saver = Vips::foreign_find_save(filename)?;
    log::debug!("saving {filename} with {saver}");

    vips_bridge::call(
        &saver,
        VOption::new()
            .set("in", Argument::Image(image))
            .set("filename", Argument::Str(filename)),
    )?;
    Ok(())
}

fn run(args: &Args) -> Result<Image, Box<dyn std::error::Error>> {
    let image = load(&args.input)?;
    println!(
        "Input: {}x{} with {} bands",
        image.width()?,
        image.height()?,
        image.bands()?
    );

    let options = CacheOptions {
        max_tiles: args.max_tiles,
        tile_height: args.tile_height,
        tile_width: args.tile_width,
    };
    let cached = cache::cache(&image, &options)?;
    save(&cached, &args.output)?;

    Ok(cached)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    Vips::init(&VipsConfig::from_env())?;
    println!("libvips {}", Vips::version_string()?);

    run(&args)?;
    println!(
        "Wrote {} ({} cached operations)",
        args.output.display(),
        cache::size()?
    );

    Ok(())
}
