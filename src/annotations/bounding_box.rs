use thiserror::Error;

/// A set of custom errors for boxes whose corners are out of order.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidBoxError {
    #[error("invalid bounding box, value for left > value for right ({left} > {right})")]
    LeftExceedsRight { left: f64, right: f64 },
    #[error("invalid bounding box, value for top > value for bottom ({top} > {bottom})")]
    TopExceedsBottom { top: f64, bottom: f64 },
    #[error("invalid bounding box, non-finite coordinate in ({left}, {top}, {right}, {bottom})")]
    NonFinite {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
}

/// A struct representing a bounding box.
///
/// A bounding box is the rectangle a detection model draws around an object, together
/// with the category it believes the object belongs to. Models emit it as two corners;
/// downstream trackers want the top-left corner plus a size.
///
/// This project uses the standard convention of the left side of the image being x=0
/// and the top of the image being y=0.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
    category: String,
}

impl BoundingBox {
    /// Checks if a box has valid parameters before constructing.
    pub fn new(
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        category: String,
    ) -> Result<Self, InvalidBoxError> {
        if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
            Err(InvalidBoxError::NonFinite {
                left,
                top,
                right,
                bottom,
            })
        } else if left > right {
            Err(InvalidBoxError::LeftExceedsRight { left, right })
        } else if top > bottom {
            Err(InvalidBoxError::TopExceedsBottom { top, bottom })
        } else {
            Ok(BoundingBox {
                left,
                top,
                right,
                bottom,
                category,
            })
        }
    }

    /// Builds a box from an `[x1, y1, x2, y2]` model output row.
    pub fn from_xyxy(xyxy: [f32; 4], category: String) -> Result<Self, InvalidBoxError> {
        let [x1, y1, x2, y2] = xyxy.map(f64::from);
        Self::new(x1, y1, x2, y2, category)
    }

    pub fn into_category(self) -> String {
        self.category
    }
}

/// Geometry shared by every annotation that carries a box.
pub trait BoundingBoxGeometry {
    fn left(&self) -> f64;
    fn top(&self) -> f64;
    fn right(&self) -> f64;
    fn bottom(&self) -> f64;
    fn category(&self) -> &str;

    fn width(&self) -> f64 {
        self.right() - self.left()
    }

    fn height(&self) -> f64 {
        self.bottom() - self.top()
    }

    /// `(x, y, width, height)` with `x, y` the top-left corner.
    fn as_xywh(&self) -> [f64; 4] {
        [self.left(), self.top(), self.width(), self.height()]
    }
}

impl BoundingBoxGeometry for BoundingBox {
    fn left(&self) -> f64 {
        self.left
    }

    fn top(&self) -> f64 {
        self.top
    }

    fn right(&self) -> f64 {
        self.right
    }

    fn bottom(&self) -> f64 {
        self.bottom
    }

    fn category(&self) -> &str {
        &self.category
    }
}
