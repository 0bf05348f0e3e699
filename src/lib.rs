// Travel package optimizer: picks the cheapest flight + hotel (+ activities) for a trip

pub mod composer;
pub mod error;
pub mod normalizer;
pub mod offer;
pub mod optimizer;
pub mod provider;
pub mod stay;

// Re-export key types for convenience
pub use composer::{PackageComposer, PairCandidate, PairEvaluation, DEFAULT_MAX_ACTIVITIES};
pub use error::{OptimizerError, Result};
pub use normalizer::{OfferNormalizer, RawOffer};
pub use offer::{
    BestPackage, Currency, OfferKind, PackageCost, PriceUnit, PricedOffer, TripRequest,
};
pub use optimizer::{
    compute_best_package, OptimizationDiagnostics, OptimizationResult, OptimizerConfig,
    PackageAlternative, PackageOptimizer,
};
pub use stay::{price_stay, stay_duration, StayPricedHotel};
