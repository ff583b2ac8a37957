//! Weak association match keys.
//!
//! Tables without declared foreign keys can still be related by name:
//! `app_role_user` and `app_user` share the `app_` module prefix, and once
//! it is stripped `role_user` and `user` can be compared to column names of
//! other tables. [`TableMatchKeys`] computes these normalized keys. Pairing
//! keys into association edges is left to the consumer.

mod inflection;
mod match_keys;

pub use inflection::singularize;
pub use match_keys::TableMatchKeys;
