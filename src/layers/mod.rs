pub mod traits;
pub mod dense;

pub use traits::Layer;
pub use dense::DenseLayer;
