pub mod remote;
pub mod traits;

pub use traits::{Brokerage, MarketDataProvider, NewsProvider, SearchWindow, SocialProvider};
