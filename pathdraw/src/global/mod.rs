//! Global singletons.

pub mod config;

use pathdraw_core::backend::{BackendLoadError, GeometryModule};

/// The geometry backend, loaded once for the whole process and shared by every engine.
pub fn geometry_module() -> Result<&'static dyn GeometryModule, BackendLoadError> {
    static MODULE: std::sync::OnceLock<&'static dyn GeometryModule> = std::sync::OnceLock::new();
    Ok(*MODULE.get_or_init(|| {
        let module: &'static dyn GeometryModule = pathdraw_core::backend::svg_module();
        log::info!("loaded {} geometry backend", module.name());
        module
    }))
}
