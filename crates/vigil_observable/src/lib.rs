//! Transparent tracking wrappers, marking, and dependency tracking for Vigil.
//!
//! This crate provides:
//! - [`Value`] / [`ObjectRef`] - Values and the heap objects they refer to
//! - [`Class`] / [`ClassBuilder`] - Field layouts with single inheritance
//! - [`mark`] / [`get_marked`] / [`is_marked`] - The marking registry
//! - [`transform`] / [`Tracked`] - Tracking wrappers over eligible values
//! - [`get_origin`] - Recovering the raw target behind a wrapper
//! - [`track`] / [`Reaction`] / [`BatchScheduler`] - Dependency tracking and
//!   batched re-invocation of consumers
//! - [`watch`] / [`trigger`] - Direct notifier access
//!
//! # Example
//!
//! ```
//! use vigil_observable::{BatchScheduler, Class, Reaction, Value, transform};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let foo = Class::builder("Foo").observable("name", "").build();
//! let view = transform(&Value::from(foo.instantiate()));
//! let f = view.as_tracked().unwrap().clone();
//!
//! let scheduler = BatchScheduler::new();
//! let seen = Rc::new(Cell::new(0));
//! let (reader, s) = (f.clone(), Rc::clone(&seen));
//! let reaction = Reaction::new("label", scheduler.clone(), move || {
//!     let _ = reader.get("name");
//!     s.set(s.get() + 1);
//! });
//! reaction.run();
//!
//! f.set("name", "a").unwrap();
//! f.set("name", "b").unwrap();
//! scheduler.flush().unwrap();
//! assert_eq!(seen.get(), 2);
//! assert_eq!(f.get("name"), Value::from("b"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod change;
pub mod class;
pub mod marking;
pub mod object;
pub mod origin;
pub mod reaction;
pub mod scheduler;
pub mod tracked;
pub mod tracking;
pub mod transform;
pub mod value;
pub mod watch;

pub use class::{Class, ClassBuilder, ClassId};
pub use marking::{Markable, get_marked, is_marked, mark};
pub use object::{Instance, ObjectData, ObjectRef};
pub use origin::{get_origin, same_origin};
pub use reaction::{Reaction, ReactionId, WeakReaction};
pub use scheduler::{BatchScheduler, Scheduler};
pub use tracked::Tracked;
pub use tracking::{Dependencies, is_tracking, track, untracked, use_observe};
pub use transform::{
    can_be_notifiable, get_notifier, notifier_for, observable, transform, try_get_notifier,
};
pub use value::Value;
pub use watch::{trigger, watch};
