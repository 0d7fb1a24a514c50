use image::{Rgba, RgbaImage};
use strata::surface::PixelSurface;
use strata::EditorError;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[test]
fn zero_dimension_is_rejected() {
    assert!(matches!(
        PixelSurface::new(0, 10),
        Err(EditorError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        PixelSurface::new(10, 0),
        Err(EditorError::InvalidDimensions { .. })
    ));
}

#[test]
fn new_surface_is_transparent_and_uninitialized() {
    let surface = PixelSurface::new(4, 4).unwrap();
    assert!(!surface.is_initialized());
    assert_eq!(surface.pixel(0, 0), CLEAR);
    assert_eq!(surface.pixel(3, 3), CLEAR);
}

#[test]
fn draw_scope_closes_on_drop() {
    let mut surface = PixelSurface::new(4, 4).unwrap();
    let gen_before = surface.generation();
    {
        let mut scope = surface.begin_drawing();
        scope.put_pixel(1, 2, RED);
    }
    assert!(surface.is_initialized());
    assert_eq!(surface.generation(), gen_before + 1);
    assert_eq!(surface.pixel(1, 2), RED);
}

#[test]
fn out_of_bounds_writes_are_ignored() {
    let mut surface = PixelSurface::new(4, 4).unwrap();
    surface.begin_drawing().put_pixel(100, 100, RED);
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(surface.pixel(x, y), CLEAR);
        }
    }
}

#[test]
fn snapshot_is_top_left_origin() {
    // Paint the top-left pixel; the snapshot's first four bytes must be it,
    // regardless of the surface's internal row order.
    let mut surface = PixelSurface::new(3, 3).unwrap();
    surface.begin_drawing().put_pixel(0, 0, RED);
    let snap = surface.snapshot();
    assert_eq!(&snap.as_bytes()[..4], &[255, 0, 0, 255]);
}

#[test]
fn buffer_size_is_width_times_height_times_four() {
    // size arithmetic is done in usize so wide-and-tall dimensions cannot
    // wrap a 32-bit intermediate
    let surface = PixelSurface::new(4096, 2160).unwrap();
    let snap = surface.snapshot();
    assert_eq!(snap.memory_bytes(), 4096usize * 2160 * 4);
    assert_eq!(snap.as_bytes().len(), snap.memory_bytes());
}

#[test]
fn snapshot_restore_round_trips_exactly() {
    let mut surface = PixelSurface::new(8, 6).unwrap();
    {
        let mut scope = surface.begin_drawing();
        scope.put_pixel(0, 0, RED);
        scope.put_pixel(7, 5, BLUE);
        scope.put_pixel(3, 2, Rgba([1, 2, 3, 4]));
    }
    let snap = surface.snapshot();

    surface.begin_drawing().clear(Rgba([9, 9, 9, 9]));
    assert_ne!(surface.pixel(0, 0), RED);

    surface.restore(&snap).unwrap();
    assert_eq!(surface.snapshot(), snap);
    assert_eq!(surface.pixel(0, 0), RED);
    assert_eq!(surface.pixel(7, 5), BLUE);
}

#[test]
fn restore_rejects_mismatched_dimensions() {
    let small = PixelSurface::new(2, 2).unwrap();
    let snap = small.snapshot();
    let mut big = PixelSurface::new(4, 4).unwrap();
    assert!(matches!(
        big.restore(&snap),
        Err(EditorError::SnapshotMismatch { .. })
    ));
    // Nothing was written.
    assert_eq!(big.pixel(0, 0), CLEAR);
}

#[test]
fn clear_region_is_scissored() {
    let mut surface = PixelSurface::new(6, 6).unwrap();
    surface.begin_drawing().clear(RED);
    surface.begin_drawing().clear_region(2, 2, 4, 4);

    for y in 0..6 {
        for x in 0..6 {
            let inside = (2..4).contains(&x) && (2..4).contains(&y);
            let expect = if inside { CLEAR } else { RED };
            assert_eq!(surface.pixel(x, y), expect, "pixel ({x},{y})");
        }
    }
}

#[test]
fn copy_image_overwrites_blit_skips_transparent() {
    let mut surface = PixelSurface::new(4, 4).unwrap();
    surface.begin_drawing().clear(RED);

    let mut patch = RgbaImage::new(2, 2);
    patch.put_pixel(0, 0, BLUE);
    // (1, 0) stays fully transparent

    surface.begin_drawing().blit_image(0, 0, &patch);
    assert_eq!(surface.pixel(0, 0), BLUE);
    assert_eq!(surface.pixel(1, 0), RED); // transparent source skipped

    surface.begin_drawing().copy_image(0, 0, &patch);
    assert_eq!(surface.pixel(1, 0), CLEAR); // overwritten, alpha included
}

#[test]
fn extract_region_clamps_to_bounds() {
    let mut surface = PixelSurface::new(4, 4).unwrap();
    surface.begin_drawing().put_pixel(3, 3, BLUE);
    let region = surface.extract_region(3, 3, 10, 10);
    assert_eq!(region.dimensions(), (1, 1));
    assert_eq!(*region.get_pixel(0, 0), BLUE);
}

#[test]
fn duplicate_is_a_deep_copy() {
    let mut surface = PixelSurface::new(3, 3).unwrap();
    surface.begin_drawing().put_pixel(1, 1, RED);
    let copy = surface.duplicate();
    surface.begin_drawing().put_pixel(1, 1, BLUE);
    assert_eq!(copy.pixel(1, 1), RED);
    assert_eq!(surface.pixel(1, 1), BLUE);
}

#[test]
fn resize_without_rescale_clears_content() {
    let mut surface = PixelSurface::new(4, 4).unwrap();
    surface.begin_drawing().clear(RED);
    surface.resize(8, 8, false).unwrap();
    assert_eq!(surface.width(), 8);
    assert_eq!(surface.height(), 8);
    assert_eq!(surface.pixel(0, 0), CLEAR);
}

#[test]
fn resize_with_rescale_keeps_content() {
    let mut surface = PixelSurface::new(4, 4).unwrap();
    surface.begin_drawing().clear(RED);
    surface.resize(8, 8, true).unwrap();
    assert_eq!(surface.pixel(4, 4), RED);
}
