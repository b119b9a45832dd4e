//! Recipe Definition Module
//!
//! Data structures and YAML loading for recipes, the ordered lists of
//! steps whose parameters get validated.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (Step, Recipe)
//! - [`parser`]: YAML loading and saving
//! - [`validator`]: Definition checks run before declaration

pub mod model;
pub mod parser;
pub mod validator;

pub use model::{Recipe, Step};
pub use parser::{load_recipe, parse_recipe, save_recipe};
pub use validator::validate_recipe;
