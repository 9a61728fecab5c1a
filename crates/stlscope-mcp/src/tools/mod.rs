//! MCP tool request types for Stlscope
//!
//! One typed request per tool, deserialized from the tool arguments:
//! - Models (load_stl, get_model_info, remove_model, set_model_color,
//!   set_model_opacity, set_model_transform)
//! - Camera (set_camera, rotate_camera)
//! - Rendering (take_screenshot)
//! - Measurement (measure_distance)
//!
//! Tools without arguments (list_models, clear_all_models, reset_view) have no
//! request type.

pub mod camera;
pub mod measure;
pub mod model;
pub mod render;
