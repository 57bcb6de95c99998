pub mod bar;
pub mod recommendation;
pub mod report;
