pub mod auction_clock;
pub mod bidding;
pub mod clock;
pub mod notifier;
pub mod profile;
pub mod recommender;
pub mod settlement;
pub mod similarity;

pub use auction_clock::{run_auction_scan, AuctionClock};
pub use bidding::{place_bid, BidAccepted, BidError, BidRejection};
pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::{LogNotifier, Notification, Notifier, WebhookNotifier};
pub use profile::{build_profile, TagProfile};
pub use recommender::{recommend, DEFAULT_MAX_RESULTS};
pub use settlement::{settle, Settlement, SettleSkip};
pub use similarity::cosine_similarity;
