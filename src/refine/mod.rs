//! Sub-pixel peak refinement from 3x3 score neighborhoods.

pub(crate) mod quad1d;
pub(crate) mod quad2d;

pub(crate) use quad2d::{refine_subpixel_2d, INVALID_NEIGHBOR};
