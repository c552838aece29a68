//! Reviews and their aggregation

mod aggregator;
mod feedback;

pub use aggregator::{Audience, ReviewAggregator, ReviewSummary, ReviewView};
pub use feedback::{Recommendation, ReviewFeedback, SubScores};
