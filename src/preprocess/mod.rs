pub mod label_encoder;
pub mod pca;
pub mod scaler;

pub use label_encoder::LabelEncoder;
pub use pca::{Pca, PcaProjection};
pub use scaler::StandardScaler;
