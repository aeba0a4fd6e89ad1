use lazy_static::lazy_static;
use tera::Tera;

pub mod blocks;
pub mod composer;
pub mod config;
pub mod error;
pub mod harvest;
pub mod models;
pub mod paths;
pub mod plan;
pub mod schematic;
pub mod sweep;
pub mod testbench;
pub mod verification;

pub use error::{Error, Result};

pub const BUILD_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/build");

lazy_static! {
    pub static ref TEMPLATES: Tera =
        match Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/*")) {
            Ok(t) => t,
            Err(e) => panic!("Error parsing templates: {e}"),
        };
}

#[inline]
pub(crate) fn clog2(x: usize) -> usize {
    (x as f64).log2().ceil() as usize
}

#[cfg(test)]
pub mod tests {
    use std::path::PathBuf;

    use super::BUILD_PATH;

    pub(crate) fn test_work_dir(name: &str) -> PathBuf {
        PathBuf::from(BUILD_PATH).join(name)
    }

    #[test]
    fn test_clog2() {
        assert_eq!(super::clog2(2), 1);
        assert_eq!(super::clog2(9), 4);
        assert_eq!(super::clog2(64), 6);
        assert_eq!(super::clog2(65), 7);
    }
}
