use pmbp::image::encode_colour;
use pmbp::lowlevel::{Grid, Mask, Node, Particle};
use pmbp::{ImageView, PmbpError, RgbaImage, State};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u32; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        PmbpError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u32; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        PmbpError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u32; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, PmbpError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn rgba_image_rejects_short_buffer() {
    let err = RgbaImage::new(vec![0; 5], 3, 2).err().unwrap();
    assert_eq!(err, PmbpError::BufferTooSmall { needed: 6, got: 5 });
    assert!(RgbaImage::filled(0, 2, 0).is_err());
}

#[test]
fn rgba_bytes_survive_packing() {
    let bytes: Vec<u8> = (0u8..24).collect();
    let img = RgbaImage::from_rgba8(&bytes, 3, 2).unwrap();
    assert_eq!(img.get(1, 0), Some(encode_colour(4, 5, 6, 7)));
    assert_eq!(img.to_rgba8(), bytes);
}

#[test]
fn node_extremes_break_ties_on_lowest_index() {
    let particle = |dx: f32, score: f32| Particle {
        state: State::from_data(vec![dx, 0.0]),
        score,
    };
    let node = Node::from_particles(vec![
        particle(0.0, 3.0),
        particle(1.0, 1.0),
        particle(2.0, 3.0),
        particle(3.0, 1.0),
    ]);

    assert_eq!(node.min_index(), 1);
    assert_eq!(node.max_index(), 0);
    assert_eq!(node.min_state().data, vec![1.0, 0.0]);
    assert_eq!(node.min_score(), 1.0);
    assert_eq!(node.max_score(), 3.0);
}

#[test]
fn mask_counts_and_ignores_outside_reads() {
    let mut mask = Mask::new(4, 2);
    mask.set(0, 0, true);
    mask.set(3, 1, true);
    assert_eq!(mask.count(true), 2);
    assert!((mask.percentage(true) - 25.0).abs() < 1e-6);
    assert!(!mask.get(4, 0));

    mask.set_all(false);
    assert_eq!(mask.count(false), 8);
}

#[test]
fn grid_is_row_major() {
    let grid = Grid::from_fn(3, 2, |x, y| x + 10 * y);
    let values: Vec<_> = grid.iter().copied().collect();
    assert_eq!(values, vec![0, 1, 2, 10, 11, 12]);
    assert_eq!(grid[(2, 1)], 12);
    assert!(grid.get(3, 0).is_none());
}
