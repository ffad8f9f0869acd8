mod avl;
mod interval;

pub use avl::BalancedIndex;
pub use interval::IntervalIndex;
