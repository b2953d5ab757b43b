pub mod answer;
pub mod keywords;
pub mod metric;
pub mod ranking;
pub mod relevance;
pub mod stats;
