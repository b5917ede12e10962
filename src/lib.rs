pub mod action;
pub mod behavior;
pub mod character;
pub mod collision;
pub mod config;
pub mod controls;
pub mod detect;
pub mod entity;
pub mod event;
pub mod game;
pub mod geometry;
pub mod helpers;
pub mod interactable;
pub mod inventory;
pub mod level;
pub mod logging;
pub mod map;
pub mod resolve;
pub mod scene;

pub use collision::{classify, Collider, CollisionResult, Side, Sides};
pub use entity::{Collidable, Entities, EntityId, SceneObject};
pub use event::{Event, EventKind, ListenerError, ListenerId, ListenerOptions};
pub use game::{Game, GameMode};
pub use level::{Level, LevelBuilder, LevelFile};
pub use scene::{Scene, TickReport};
