pub mod build;
pub mod html;
pub mod markdown;
pub mod paths;
#[cfg(feature = "devel")]
pub mod reload;
pub mod render;
pub mod site;
pub mod source;
pub mod traits;
pub mod tree;
