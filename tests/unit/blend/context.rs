use super::*;

#[test]
fn extra_alpha_is_quantised_and_clamped() {
    let mut ctx = BlendingContext::new();
    assert_eq!(ctx.init(1.0, PaintSource::PerPixel).extra_alpha(), 127);
    assert_eq!(ctx.init(0.5, PaintSource::PerPixel).extra_alpha(), 64);
    assert_eq!(ctx.init(0.0, PaintSource::PerPixel).extra_alpha(), 0);
    assert_eq!(ctx.init(7.5, PaintSource::PerPixel).extra_alpha(), 127);
    assert_eq!(ctx.init(-1.0, PaintSource::PerPixel).extra_alpha(), 0);
    assert_eq!(ctx.init(f32::NAN, PaintSource::PerPixel).extra_alpha(), 0);
}

#[test]
fn constant_source_folds_extra_alpha() {
    let mut ctx = BlendingContext::new();
    ctx.init(1.0, PaintSource::Constant(0xFF12_3456));
    assert_eq!(ctx.constant_pixel(), Some(0xFF12_3456));

    ctx.init(0.5, PaintSource::Constant(0xC812_3456));
    // div255(200 * 128) == 100
    assert_eq!(ctx.constant_pixel(), Some(0x6412_3456));
    assert!(!ctx.is_noop_constant());
}

#[test]
fn zero_extra_alpha_makes_constant_a_noop() {
    let mut ctx = BlendingContext::new();
    ctx.init(0.0, PaintSource::Constant(0xFFFF_FFFF));
    assert!(ctx.is_noop_constant());
    ctx.init(1.0, PaintSource::Constant(0x00FF_FFFF));
    assert!(ctx.is_noop_constant());
}

#[test]
fn per_pixel_source_clears_constant_state() {
    let mut ctx = BlendingContext::new();
    ctx.init(1.0, PaintSource::Constant(0xFF00_0000));
    ctx.init(1.0, PaintSource::PerPixel);
    assert_eq!(ctx.constant_pixel(), None);
    assert!(!ctx.is_noop_constant());
}

#[test]
fn memoisation_follows_opts() {
    let opts = BlendOpts {
        memoize_results: false,
        ..BlendOpts::default()
    };
    assert!(!BlendingContext::with_opts(&opts).memoize());
    assert!(BlendingContext::new().memoize());
}
