pub mod knn;
pub mod labels;
pub mod linear;
