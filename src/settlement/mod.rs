//! The settlement formula, its report, and the pipeline that ties the
//! stages together.

pub mod calculator;
pub mod pipeline;
pub mod report;
