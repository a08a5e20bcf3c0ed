//! Converts raw edge scores into a confidence using a logistic
//! [`ScoreCurve`], and classifies that confidence into [`MatchType`]
//! bands with a [`MatchThreshold`].

#[doc(hidden)]
pub mod curve;
#[doc(hidden)]
pub mod threshold;


#[doc(inline)]
pub use curve::ScoreCurve;
#[doc(inline)]
pub use threshold::{MatchClassification, MatchThreshold, MatchType};
