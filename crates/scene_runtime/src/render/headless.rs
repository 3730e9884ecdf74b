//! Render world without a GPU

use super::{RenderProxy, RenderWorld};
use std::sync::Arc;

/// Render world that only records which proxies are registered
#[derive(Debug, Default)]
pub struct HeadlessRenderWorld {
    proxies: Vec<Arc<RenderProxy>>,
}

impl HeadlessRenderWorld {
    /// Create an empty render world
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered proxies
    pub fn proxies(&self) -> &[Arc<RenderProxy>] {
        &self.proxies
    }
}

impl RenderWorld for HeadlessRenderWorld {
    fn add_renderable(&mut self, proxy: Arc<RenderProxy>) {
        debug_assert!(!self.contains_renderable(&proxy), "render proxy {} added twice", proxy.id());
        self.proxies.push(proxy);
    }

    fn remove_renderable(&mut self, proxy: &Arc<RenderProxy>) -> bool {
        match self.proxies.iter().position(|p| Arc::ptr_eq(p, proxy)) {
            Some(index) => {
                self.proxies.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn renderable_count(&self) -> usize {
        self.proxies.len()
    }

    fn visible_count(&self) -> usize {
        self.proxies.iter().filter(|p| p.is_visible()).count()
    }

    fn contains_renderable(&self, proxy: &RenderProxy) -> bool {
        self.proxies.iter().any(|p| std::ptr::eq(Arc::as_ptr(p), proxy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderProxyKind;

    #[test]
    fn test_add_remove_and_visibility() {
        let mut world = HeadlessRenderWorld::new();
        let a = RenderProxy::new(RenderProxyKind::Mesh {
            mesh: "a".to_string(),
            cast_shadows: true,
        });
        let b = RenderProxy::new(RenderProxyKind::Mesh {
            mesh: "b".to_string(),
            cast_shadows: false,
        });
        world.add_renderable(Arc::clone(&a));
        world.add_renderable(Arc::clone(&b));
        b.set_visible(false);

        assert_eq!(world.renderable_count(), 2);
        assert_eq!(world.visible_count(), 1);
        assert!(world.remove_renderable(&a));
        assert!(!world.contains_renderable(&a));
        assert!(!world.remove_renderable(&a));
    }
}
