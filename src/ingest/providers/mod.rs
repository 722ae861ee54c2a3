pub mod community;
pub mod search;

pub use community::{CommunityPost, CommunitySource};
pub use search::{InterestSeries, SearchSource};
