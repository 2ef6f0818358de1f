//! Layered settings persistence for Horizon Lattice.
//!
//! This crate stores application preferences as `[section] / key=value`
//! text files and merges several of them into one view.
//!
//! # Building Blocks
//!
//! - [`HashTable`]: a generic open-addressing table with tombstones.
//! - [`Dict`]: a string-keyed table whose values are created and disposed
//!   through a [`ValuePolicy`], with a persistence mark on every entry.
//! - [`Section`]: a [`Dict`] of owned string values.
//! - [`Settings`]: named sections plus the text format parser and writer.
//! - [`Registry`]: [`Settings`] loaded from system-wide and per-user tiers.
//!
//! # Getting Started
//!
//! ```no_run
//! use horizon_lattice_registry::{Color, Registry};
//!
//! let mut registry = Registry::new("Viewer", "Acme");
//! registry.read();
//!
//! let background = registry.read_color("Colors", "background", Color::rgb(255, 255, 255));
//! registry.write_color("Colors", "background", background);
//! registry.write_bool("Window", "maximized", true);
//!
//! registry.write().ok();
//! ```
//!
//! Values written at runtime are marked and persisted to the per-user
//! application file; defaults loaded from other tiers never are.

mod atomic;
mod color;
mod dict;
mod error;
mod escape;
mod hash;
mod registry;
mod section;
mod settings;

pub use color::Color;
pub use dict::{Cloned, Dict, StringValue, ValuePolicy, hash_str};
pub use error::{RegistryError, RegistryResult};
pub use escape::{escape, escape_key, key_needs_quoting, needs_quoting, unescape};
pub use hash::HashTable;
pub use registry::{COMMON_FILE, FILE_EXTENSION, NativeRegistry, Registry, TOOLKIT_DIR, Tier};
pub use section::Section;
pub use settings::{SectionPolicy, Settings};
