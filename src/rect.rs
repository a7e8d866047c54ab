use nalgebra::Matrix1x4;
use num::Float;
use std::fmt::Debug;

/* ------------------------------------------------------------------------------
 * Type aliases
 * ------------------------------------------------------------------------------ */
/// `[center_x, center_y, aspect_ratio, height]`
pub type Xyah<T> = Matrix1x4<T>;

/// Smallest extent used wherever a height, width or union is a divisor.
pub const MIN_EXTENT: f64 = 1e-6;

#[inline(always)]
fn min_extent<T: Float>() -> T {
    T::from(MIN_EXTENT).unwrap_or_else(T::epsilon)
}

#[inline(always)]
fn half<T: Float>() -> T {
    (T::one() + T::one()).recip()
}

/* ------------------------------------------------------------------------------
 * Rect struct
 * ------------------------------------------------------------------------------ */
/// Axis-aligned box stored as `[left, top, width, height]`.
///
/// Boxes built from malformed corners (`x2 < x1` or `y2 < y1`) keep their
/// negative extent; every measure derived from them (area, IoU, `xyah`)
/// clamps the extent to zero instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Rect<T>
where
    T: Debug + Float,
{
    tlwh: Matrix1x4<T>,
}

impl<T> Rect<T>
where
    T: Clone + Debug + Float,
{
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            tlwh: Matrix1x4::new(x, y, width, height),
        }
    }

    /// Create Rect from [x1, y1, x2, y2] format
    pub fn from_xyxy(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Create Rect from [center_x, center_y, aspect_ratio, height] format
    pub fn from_xyah(xyah: &Xyah<T>) -> Self {
        let height = xyah[(0, 3)];
        let width = xyah[(0, 2)] * height;
        Self::new(
            xyah[(0, 0)] - width * half(),
            xyah[(0, 1)] - height * half(),
            width,
            height,
        )
    }

    #[inline(always)]
    pub fn x(&self) -> T {
        self.tlwh[(0, 0)]
    }

    #[inline(always)]
    pub fn y(&self) -> T {
        self.tlwh[(0, 1)]
    }

    #[inline(always)]
    pub fn width(&self) -> T {
        self.tlwh[(0, 2)]
    }

    #[inline(always)]
    pub fn height(&self) -> T {
        self.tlwh[(0, 3)]
    }

    #[inline(always)]
    fn clamped_width(&self) -> T {
        self.width().max(T::zero())
    }

    #[inline(always)]
    fn clamped_height(&self) -> T {
        self.height().max(T::zero())
    }

    pub fn area(&self) -> T {
        self.clamped_width() * self.clamped_height()
    }

    /// Intersection over union, always in `[0, 1]`.
    pub fn calc_iou(&self, other: &Rect<T>) -> T {
        let [ax1, ay1, ax2, ay2] = self.get_xyxy();
        let [bx1, by1, bx2, by2] = other.get_xyxy();

        let iw = (ax2.min(bx2) - ax1.max(bx1)).max(T::zero());
        let ih = (ay2.min(by2) - ay1.max(by1)).max(T::zero());
        let inter = iw * ih;
        let union = self.area() + other.area() - inter;

        (inter / union.max(min_extent())).min(T::one())
    }

    /// Get box as [center_x, center_y, aspect_ratio, height].
    pub fn get_xyah(&self) -> Xyah<T> {
        let width = self.clamped_width();
        let height = self.clamped_height();
        Matrix1x4::new(
            self.x() + width * half(),
            self.y() + height * half(),
            width / height.max(min_extent()),
            height,
        )
    }

    /// Get bounding box as [x1, y1, x2, y2] format
    pub fn get_xyxy(&self) -> [T; 4] {
        [
            self.x(),
            self.y(),
            self.x() + self.width(),
            self.y() + self.height(),
        ]
    }
}
