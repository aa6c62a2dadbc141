//! Template transforms.
//!
//! - **Backend**: [`Transformer`] trait, [`Template`] names, parameters
//! - **Native**: built-in renderers, split into `pages` (Markdown) and
//!   `menu` (site menu XML)
//! - **Xsltproc**: external XSLT processor over template files

pub mod backend;
pub mod menu;
pub mod native;
pub mod pages;
pub mod xsltproc;

pub use backend::{Params, Template, TransformError, TransformSource, Transformer};
pub use native::NativeTransformer;
pub use xsltproc::XsltprocTransformer;

use crate::config::{Engine, TransformConfig};

/// Build the engine selected by config.
pub fn from_config(config: &TransformConfig) -> Box<dyn Transformer> {
    match config.engine {
        Engine::Native => Box::new(NativeTransformer::new()),
        Engine::Xsltproc => Box::new(XsltprocTransformer::new(
            config.command.as_str(),
            config.templates_dir.as_path(),
        )),
    }
}
