pub mod arith;
pub mod rate;
pub mod record;
pub mod totals;
