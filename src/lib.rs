pub mod board;
pub mod config;
pub mod error;
pub mod events;
pub mod game;
pub mod moves;
pub mod piece;
pub mod rules;
