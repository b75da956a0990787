mod customer;
mod order;
mod product;
mod review;

pub use customer::Customer;
pub use order::{Order, OrderItem};
pub use product::{Bid, NewProduct, Product, SellingType};
pub use review::{ProductReview, MAX_RATING};
