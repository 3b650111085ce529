use super::*;

const BLACK: Argb = 0xFF00_0000;
const WHITE: Argb = 0xFFFF_FFFF;

fn noise(n: usize, seed: u32) -> Vec<u32> {
    let mut s = seed;
    (0..n)
        .map(|_| {
            s = s.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            s
        })
        .collect()
}

fn mask_bytes(n: usize, seed: u32) -> Vec<u8> {
    noise(n, seed)
        .into_iter()
        .enumerate()
        .map(|(i, v)| match i % 5 {
            0 => 0,
            1 => 255,
            _ => (v >> 24) as u8,
        })
        .collect()
}

fn constant_ctx(pixel: Argb, extra_alpha: f32) -> BlendingContext {
    let mut ctx = BlendingContext::new();
    ctx.init(extra_alpha, PaintSource::Constant(pixel));
    ctx
}

#[test]
fn zero_coverage_leaves_destination_unchanged() {
    let before = noise(8 * 4, 1);
    let mut data = before.clone();
    let mut dst = RasterMut::new(&mut data, 8, 4, 8).unwrap();
    let zeros = vec![0u8; 8 * 4];
    let mask = MaskRef::new(&zeros, 0, 8, 8, 4).unwrap();
    constant_ctx(WHITE, 1.0).compose(&mut dst, None, Some(&mask), TileBounds::new(0, 0, 8, 4));
    assert_eq!(data, before);
}

#[test]
fn zero_coverage_leaves_destination_unchanged_for_per_pixel_source() {
    let before = noise(8 * 4, 10);
    let src_pixels = noise(8 * 4, 11);
    let src = RasterRef::new(&src_pixels, 8, 4, 8).unwrap();
    let zeros = vec![0u8; 8 * 4];
    let mask = MaskRef::new(&zeros, 0, 8, 8, 4).unwrap();
    let mut ctx = BlendingContext::new();
    ctx.init(0.6, PaintSource::PerPixel);

    let mut data = before.clone();
    let mut dst = RasterMut::new(&mut data, 8, 4, 8).unwrap();
    ctx.compose(&mut dst, Some(&src), Some(&mask), TileBounds::new(0, 0, 8, 4));
    assert_eq!(data, before);
}

#[test]
fn opaque_constant_fill_and_full_mask_agree() {
    let ctx = constant_ctx(0xFF20_4060, 1.0);
    let bounds = TileBounds::new(1, 1, 5, 2);

    let mut filled = noise(8 * 4, 2);
    let mut expected = filled.clone();
    let mut dst = RasterMut::new(&mut filled, 8, 4, 8).unwrap();
    ctx.compose(&mut dst, None, None, bounds);

    let full = vec![255u8; 5 * 2];
    let mask = MaskRef::new(&full, 0, 5, 5, 2).unwrap();
    let mut masked = expected.clone();
    let mut dst = RasterMut::new(&mut masked, 8, 4, 8).unwrap();
    ctx.compose(&mut dst, None, Some(&mask), bounds);

    for y in 1..3 {
        for x in 1..6 {
            expected[y * 8 + x] = 0xFF20_4060;
        }
    }
    assert_eq!(filled, expected);
    assert_eq!(masked, expected);
}

#[test]
fn white_half_coverage_over_black_is_pinned() {
    let mut data = vec![BLACK; 4];
    let mut dst = RasterMut::new(&mut data, 4, 1, 4).unwrap();
    let cov = [128u8; 4];
    let mask = MaskRef::new(&cov, 0, 4, 4, 1).unwrap();
    constant_ctx(WHITE, 1.0).compose(&mut dst, None, Some(&mask), TileBounds::new(0, 0, 4, 1));
    assert_eq!(data, [0xFF8D_8D8D; 4]);
}

#[test]
fn blend_is_monotonic_in_coverage() {
    let cov: Vec<u8> = (0..=255).collect();
    let mask = MaskRef::new(&cov, 0, 256, 256, 1).unwrap();
    for (src, dst_pixel) in [(WHITE, BLACK), (BLACK, WHITE), (0xFFFF_8000, 0xFF00_40C0)] {
        let mut data = vec![dst_pixel; 256];
        let mut dst = RasterMut::new(&mut data, 256, 1, 256).unwrap();
        constant_ctx(src, 1.0).compose(&mut dst, None, Some(&mask), TileBounds::new(0, 0, 256, 1));

        let distance = |p: Argb| -> i32 {
            (0..4)
                .map(|k| (((p >> (8 * k)) & 0xFF) as i32 - ((dst_pixel >> (8 * k)) & 0xFF) as i32).abs())
                .sum()
        };
        for pair in data.windows(2) {
            assert!(distance(pair[1]) + 1 >= distance(pair[0]), "{pair:08x?}");
        }
        assert_eq!(data[0], dst_pixel);
        assert_eq!(data[255], src);
    }
}

#[test]
fn row_padding_and_outside_pixels_are_untouched() {
    const SENTINEL: Argb = 0x1234_5678;
    let mut data = vec![SENTINEL; 3 * 7];
    let mut dst = RasterMut::new(&mut data, 5, 3, 7).unwrap();
    let cov = [200u8; 15];
    let mask = MaskRef::new(&cov, 0, 5, 5, 3).unwrap();
    constant_ctx(0x80FF_0000, 1.0).compose(&mut dst, None, Some(&mask), TileBounds::new(0, 0, 5, 3));
    for y in 0..3 {
        assert!(data[y * 7..y * 7 + 5].iter().all(|&p| p != SENTINEL));
        assert_eq!(&data[y * 7 + 5..y * 7 + 7], &[SENTINEL; 2]);
    }
}

#[test]
#[should_panic(expected = "compose destination")]
fn tile_wider_than_destination_panics_before_touching_padding() {
    let mut data = vec![0x1234_5678; 2 * 7];
    let mut dst = RasterMut::new(&mut data, 5, 2, 7).unwrap();
    // x + w == 6 still fits the stride but not the width.
    constant_ctx(0xFFFF_0000, 1.0).compose(&mut dst, None, None, TileBounds::new(3, 0, 3, 2));
}

#[test]
#[should_panic(expected = "compose destination")]
fn parallel_compose_checks_tile_against_width() {
    let mut data = vec![0x1234_5678; 2 * 7];
    let mut dst = RasterMut::new(&mut data, 5, 2, 7).unwrap();
    let pool = build_thread_pool(Some(2)).unwrap();
    let ctx = constant_ctx(0xFFFF_0000, 1.0);
    compose_parallel(&pool, &ctx, &mut dst, None, None, TileBounds::new(3, 0, 3, 2));
}

#[test]
#[should_panic(expected = "compose source")]
fn tile_outside_source_panics() {
    let src_pixels = vec![WHITE; 4];
    let src = RasterRef::new(&src_pixels, 2, 2, 2).unwrap();
    let mut data = vec![BLACK; 16];
    let mut dst = RasterMut::new(&mut data, 4, 4, 4).unwrap();
    let mut ctx = BlendingContext::new();
    ctx.init(1.0, PaintSource::PerPixel);
    ctx.compose(&mut dst, Some(&src), None, TileBounds::new(1, 1, 2, 2));
}

#[test]
fn uniform_full_mask_fill_matches_per_pixel_path() {
    const SENTINEL: Argb = 0x1234_5678;
    let bounds = TileBounds::new(1, 1, 4, 2);
    let full = [255u8; 8];
    let mask = MaskRef::new(&full, 0, 4, 4, 2).unwrap();
    let before: Vec<u32> = noise(3 * 7, 9)
        .into_iter()
        .enumerate()
        .map(|(i, v)| if i % 7 >= 5 { SENTINEL } else { v })
        .collect();

    for ctx in [constant_ctx(0xFF20_4060, 1.0), constant_ctx(0xFF20_4060, 0.5)] {
        let mut filled = before.clone();
        let mut dst = RasterMut::new(&mut filled, 5, 3, 7).unwrap();
        ctx.compose(&mut dst, None, Some(&mask), bounds);

        let mut per_pixel = before.clone();
        for j in 0..2usize {
            let start = (1 + j) * 7 + 1;
            ctx.compose_row(&mut per_pixel[start..start + 4], None, Some(&full[j * 4..j * 4 + 4]));
        }

        assert_eq!(filled, per_pixel);
        for y in 0..3 {
            assert_eq!(&filled[y * 7 + 5..y * 7 + 7], &[SENTINEL; 2]);
        }
    }
}

#[test]
fn mask_is_tile_local() {
    let mut data = vec![BLACK; 4 * 4];
    let mut dst = RasterMut::new(&mut data, 4, 4, 4).unwrap();
    // Coverage only for the tile's first column.
    let cov = [255u8, 0, 255, 0];
    let mask = MaskRef::new(&cov, 0, 2, 2, 2).unwrap();
    constant_ctx(WHITE, 1.0).compose(&mut dst, None, Some(&mask), TileBounds::new(2, 1, 2, 2));
    let whites: Vec<usize> = (0..16).filter(|&i| data[i] == WHITE).collect();
    assert_eq!(whites, [6, 10]);
}

#[test]
fn per_pixel_source_skips_transparent_pixels() {
    let src_pixels = [0x00FF_FFFF, WHITE, 0x00AB_CDEF, 0xFF10_2030];
    let src = RasterRef::new(&src_pixels, 4, 1, 4).unwrap();
    let mut data = vec![0x8011_2233; 4];
    let mut dst = RasterMut::new(&mut data, 4, 1, 4).unwrap();
    let mut ctx = BlendingContext::new();
    ctx.init(1.0, PaintSource::PerPixel);
    ctx.compose(&mut dst, Some(&src), None, TileBounds::new(0, 0, 4, 1));
    assert_eq!(data, [0x8011_2233, WHITE, 0x8011_2233, 0xFF10_2030]);
}

#[test]
fn per_pixel_source_with_extra_alpha_blends() {
    let src_pixels = [WHITE; 3];
    let src = RasterRef::new(&src_pixels, 3, 1, 3).unwrap();
    let mut data = vec![BLACK; 3];
    let mut dst = RasterMut::new(&mut data, 3, 1, 3).unwrap();
    let mut ctx = BlendingContext::new();
    ctx.init(0.5, PaintSource::PerPixel);
    ctx.compose(&mut dst, Some(&src), None, TileBounds::new(0, 0, 3, 1));

    // Same effective source as a constant white folded with the same extra alpha.
    let mut expected = vec![BLACK; 3];
    let mut exp = RasterMut::new(&mut expected, 3, 1, 3).unwrap();
    constant_ctx(WHITE, 0.5).compose(&mut exp, None, None, TileBounds::new(0, 0, 3, 1));

    assert_eq!(data, expected);
    assert!(data.iter().all(|&p| p != WHITE && p != BLACK));
}

#[test]
fn noop_contexts_do_not_touch_destination() {
    let before = noise(16, 3);
    let mut data = before.clone();
    let mut dst = RasterMut::new(&mut data, 4, 4, 4).unwrap();
    let all = TileBounds::new(0, 0, 4, 4);

    constant_ctx(WHITE, 0.0).compose(&mut dst, None, None, all);
    constant_ctx(0x00FF_FFFF, 1.0).compose(&mut dst, None, None, all);
    let mut per_pixel = BlendingContext::new();
    per_pixel.init(1.0, PaintSource::PerPixel);
    per_pixel.compose(&mut dst, None, None, all);
    constant_ctx(WHITE, 1.0).compose(&mut dst, None, None, TileBounds::new(1, 1, 0, 3));

    assert_eq!(data, before);
}

#[test]
fn memoisation_does_not_change_output() {
    let (w, h) = (33u32, 9u32);
    let n = (w * h) as usize;
    // Runs of repeated pixels so the memo actually hits.
    let src_pixels: Vec<u32> = noise(n, 4).iter().map(|v| v & 0xFFF0_F0F0).collect();
    let src_pixels: Vec<u32> = (0..n).map(|i| src_pixels[i / 3 * 3]).collect();
    let cov: Vec<u8> = (0..n).map(|i| if i % 7 == 0 { 0 } else { 180 }).collect();
    let base: Vec<u32> = (0..n).map(|i| if i % 11 < 6 { BLACK } else { 0x40FF_8000 }).collect();

    let src = RasterRef::new(&src_pixels, w, h, w as usize).unwrap();
    let mask = MaskRef::new(&cov, 0, w as usize, w, h).unwrap();
    let bounds = TileBounds::new(0, 0, w, h);

    let run = |memoize: bool| {
        let mut data = base.clone();
        let mut dst = RasterMut::new(&mut data, w, h, w as usize).unwrap();
        let mut ctx = BlendingContext::with_opts(&BlendOpts {
            memoize_results: memoize,
            ..BlendOpts::default()
        });
        ctx.init(0.8, PaintSource::PerPixel);
        ctx.compose(&mut dst, Some(&src), Some(&mask), bounds);
        data
    };
    assert_eq!(run(true), run(false));
}

#[test]
fn parallel_compose_matches_sequential() {
    let (w, h, stride) = (37u32, 70u32, 40usize);
    let n = stride * h as usize;
    let src_pixels = noise(n, 5);
    let base = noise(n, 6);
    let cov = mask_bytes(30 * 60, 7);
    let src = RasterRef::new(&src_pixels, w, h, stride).unwrap();
    let mask = MaskRef::new(&cov, 0, 30, 30, 60).unwrap();
    let bounds = TileBounds::new(4, 5, 30, 60);
    let pool = build_thread_pool(Some(3)).unwrap();

    let mut per_pixel = BlendingContext::new();
    per_pixel.init(0.9, PaintSource::PerPixel);
    let contexts = [per_pixel, constant_ctx(0xC0FF_FFFF, 1.0), constant_ctx(WHITE, 1.0)];

    for ctx in &contexts {
        for use_mask in [true, false] {
            let mask = use_mask.then_some(&mask);
            let src = ctx.constant_pixel().is_none().then_some(&src);

            let mut seq = base.clone();
            let mut dst = RasterMut::new(&mut seq, w, h, stride).unwrap();
            ctx.compose(&mut dst, src, mask, bounds);

            let mut par = base.clone();
            let mut dst = RasterMut::new(&mut par, w, h, stride).unwrap();
            compose_parallel(&pool, ctx, &mut dst, src, mask, bounds);

            assert_eq!(seq, par);
            assert_ne!(seq, base);
        }
    }
}

#[test]
fn compositor_dispatch_is_transparent() {
    let opts = BlendOpts::from_json(r#"{"threading":{"parallel":true,"threads":2,"min_rows":4}}"#)
        .unwrap();
    let compositor = Compositor::new(opts).unwrap();
    let sequential = Compositor::new(BlendOpts::default()).unwrap();
    let cov = mask_bytes(16 * 8, 8);
    let mask = MaskRef::new(&cov, 0, 16, 16, 8).unwrap();

    for h in [2u32, 8] {
        let bounds = TileBounds::new(0, 0, 16, h);
        let ctx = compositor.context(0.7, PaintSource::Constant(0xFF33_99CC));

        let mut a = vec![0xFF10_1010; 16 * 8];
        let mut dst = RasterMut::new(&mut a, 16, 8, 16).unwrap();
        compositor.compose(&ctx, &mut dst, None, Some(&mask), bounds);

        let mut b = vec![0xFF10_1010; 16 * 8];
        let mut dst = RasterMut::new(&mut b, 16, 8, 16).unwrap();
        sequential.compose(&ctx, &mut dst, None, Some(&mask), bounds);

        assert_eq!(a, b);
    }
}

#[test]
fn thread_pool_rejects_zero_threads() {
    assert!(matches!(
        build_thread_pool(Some(0)),
        Err(GammablendError::Validation(_))
    ));
    assert!(Compositor::new(BlendOpts {
        threading: crate::foundation::config::BlendThreading {
            parallel: true,
            threads: Some(0),
            min_rows: 1,
        },
        ..BlendOpts::default()
    })
    .is_err());
}
