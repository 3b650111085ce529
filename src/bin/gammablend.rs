use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use gammablend::{
    Argb, BlendOpts, Compositor, MaskRef, PaintSource, PoolOpts, RasterMut, ScratchPool,
    TileBounds,
};

#[derive(Parser, Debug)]
#[command(name = "gammablend", version)]
struct Cli {
    /// Log pool and compositor events at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an anti-aliased disc over a gradient as a PNG.
    Disc(DiscArgs),
}

#[derive(Parser, Debug)]
struct DiscArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Image width.
    #[arg(long, default_value_t = 320)]
    width: u32,

    /// Image height.
    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Disc radius in pixels.
    #[arg(long, default_value_t = 90.0)]
    radius: f32,

    /// Disc color as `AARRGGBB` or `RRGGBB` hex.
    #[arg(long, default_value = "FFFF8040", value_parser = parse_argb)]
    color: Argb,

    /// Extra alpha applied to the disc, in `[0, 1]`.
    #[arg(long, default_value_t = 1.0)]
    opacity: f32,

    /// Supersampling factor per axis for the coverage mask.
    #[arg(long, default_value_t = 4)]
    samples: u32,

    /// Compositor options JSON.
    #[arg(long)]
    blend_opts: Option<PathBuf>,

    /// Print scratch pool counters as JSON after rendering.
    #[arg(long)]
    stats: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Disc(args) => cmd_disc(args),
    }
}

fn parse_argb(s: &str) -> Result<Argb, String> {
    let hex = s.trim_start_matches('#');
    let v = u32::from_str_radix(hex, 16).map_err(|e| format!("invalid color '{s}': {e}"))?;
    match hex.len() {
        6 => Ok(0xFF00_0000 | v),
        8 => Ok(v),
        _ => Err(format!("color '{s}' must have 6 or 8 hex digits")),
    }
}

fn read_blend_opts(path: Option<&Path>) -> anyhow::Result<BlendOpts> {
    let Some(path) = path else {
        return Ok(BlendOpts::default());
    };
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read blend options '{}'", path.display()))?;
    BlendOpts::from_json(&s).with_context(|| "parse blend options JSON")
}

fn gradient(width: u32, height: u32) -> Vec<Argb> {
    let mut px = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let r = x * 255 / width.max(1);
            let b = y * 255 / height.max(1);
            px.push(gammablend::pack_argb(255, r, 32, b));
        }
    }
    px
}

/// Coverage of the disc over its bounding tile, one byte per pixel, row-major.
///
/// Subsample hits for a row are accumulated in an `i32` scratch row, then scaled to bytes.
fn rasterize_disc(
    masks: &ScratchPool<u8>,
    rows: &ScratchPool<i32>,
    tile: TileBounds,
    (cx, cy, radius): (f32, f32, f32),
    samples: u32,
) -> (Box<[u8]>, gammablend::ScratchRef<u8>) {
    let mask_ref = masks.reference(0);
    let mut mask = mask_ref.acquire(tile.w as usize * tile.h as usize);

    let mut row_ref = rows.reference(64);
    let mut hits = row_ref.initial();
    hits = row_ref.grow(hits, 0, tile.w as usize);

    let n = samples.max(1);
    let step = 1.0 / n as f32;
    let r2 = radius * radius;
    for j in 0..tile.h {
        for sy in 0..n {
            let py = (tile.y + j) as f32 + (sy as f32 + 0.5) * step - cy;
            for (i, h) in hits[..tile.w as usize].iter_mut().enumerate() {
                for sx in 0..n {
                    let px = (tile.x + i as u32) as f32 + (sx as f32 + 0.5) * step - cx;
                    if px * px + py * py <= r2 {
                        *h += 1;
                    }
                }
            }
        }
        let row = &mut mask[(j * tile.w) as usize..((j + 1) * tile.w) as usize];
        for (m, h) in row.iter_mut().zip(hits.iter_mut()) {
            *m = ((*h as u32 * 255 + (n * n) / 2) / (n * n)).min(255) as u8;
            *h = 0;
        }
    }
    row_ref.release(hits, 0, tile.w as usize);
    (mask, mask_ref)
}

fn cmd_disc(args: DiscArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.width > 0 && args.height > 0,
        "image size must be non-zero"
    );
    let compositor = Compositor::new(read_blend_opts(args.blend_opts.as_deref())?)?;
    let masks = ScratchPool::<u8>::new("mask", PoolOpts::default())?;
    let rows = ScratchPool::<i32>::new("rows", PoolOpts::default())?;

    let (w, h) = (args.width, args.height);
    let mut pixels = gradient(w, h);
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let radius = args.radius.max(0.0);

    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil() as u32).min(w);
    let y1 = ((cy + radius).ceil() as u32).min(h);
    let tile = TileBounds::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0));

    if !tile.is_empty() {
        let (mask_buf, mut mask_ref) =
            rasterize_disc(&masks, &rows, tile, (cx, cy, radius), args.samples);
        {
            let mask = MaskRef::new(&mask_buf, 0, tile.w as usize, tile.w, tile.h)?;
            let mut dst = RasterMut::new(&mut pixels, w, h, w as usize)?;
            let ctx = compositor.context(args.opacity, PaintSource::Constant(args.color));
            compositor.compose(&ctx, &mut dst, None, Some(&mask), tile);
        }
        let used = tile.w as usize * tile.h as usize;
        mask_ref.release(mask_buf, 0, used);
    }

    let rgba: Vec<u8> = pixels
        .iter()
        .flat_map(|&p| {
            [
                gammablend::red(p) as u8,
                gammablend::green(p) as u8,
                gammablend::blue(p) as u8,
                gammablend::alpha(p) as u8,
            ]
        })
        .collect();
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        w,
        h,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    if args.stats {
        let stats = serde_json::json!({
            "mask": masks.stats(),
            "rows": rows.stats(),
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}
