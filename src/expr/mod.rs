//! Expression evaluation using CEL (Common Expression Language).

mod cel;

pub use self::cel::InclusionPredicate;
