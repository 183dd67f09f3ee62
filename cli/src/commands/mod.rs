pub mod archive;
pub mod join;
pub mod split;
