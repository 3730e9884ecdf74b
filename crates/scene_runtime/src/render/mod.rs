//! Render world interface
//!
//! The runtime does not draw. It hands [`RenderProxy`] handles to a
//! [`RenderWorld`] while their owners are placed, and feeds them transform,
//! bounds and visibility updates.

mod headless;
pub mod lighting;
pub mod proxy;

pub use headless::HeadlessRenderWorld;
pub use lighting::{LightParams, LightType};
pub use proxy::{RenderProxy, RenderProxyKind, RenderProxyState};

use std::sync::Arc;

/// Renderer-side scene consumed by a world
pub trait RenderWorld {
    /// Start drawing a proxy
    fn add_renderable(&mut self, proxy: Arc<RenderProxy>);

    /// Stop drawing a proxy; returns false if it was not registered
    fn remove_renderable(&mut self, proxy: &Arc<RenderProxy>) -> bool;

    /// Number of registered proxies
    fn renderable_count(&self) -> usize;

    /// Number of registered proxies currently visible
    fn visible_count(&self) -> usize;

    /// True if this exact proxy is registered
    fn contains_renderable(&self, proxy: &RenderProxy) -> bool;
}
