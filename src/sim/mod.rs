pub mod event;
pub mod maze;
pub mod scores;
pub mod step;
pub mod world;
