pub mod density;
pub mod neighbors;
pub mod projection;

pub use density::DensityWeightedSampler;
pub use neighbors::NeighborIndex;
pub use projection::NearestRealPointProjector;
