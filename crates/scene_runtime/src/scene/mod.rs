//! Scene spatial records
//!
//! A world keeps one bounding box per placed entity here so it can answer
//! "which entities are in this region" without walking every entity.

mod scene_graph;

pub use scene_graph::{SceneGraph, SimpleListGraph};
