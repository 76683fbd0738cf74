// Domain layer - Plain data shared by every other layer
pub mod measurement;
pub mod metric;
pub mod report;
